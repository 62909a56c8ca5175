use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub use charsheet_core::{
    AttrValue, Attributes, Constants, EffectHolder, Grants, HolderSource, RulesConfig, SourceTier,
};

/// Raw grammar strings for one holder, as authored in content data.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct HolderDef {
    pub activations: Vec<String>,
    pub effects: Vec<String>,
    pub grants: Grants,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceDef {
    pub tier: SourceTier,
    pub label: String,
    #[serde(default)]
    pub holder: HolderDef,
    #[serde(default)]
    pub parts: Vec<HolderDef>,
}

/// One creature to evaluate. Values are fixed-point integers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScenarioDef {
    #[serde(default)]
    pub attributes: BTreeMap<String, AttrValue>,
    #[serde(default)]
    pub constants: BTreeMap<String, AttrValue>,
    /// Fill in ability scores, derived keys and seeded fields before the
    /// explicit attributes are applied.
    #[serde(default = "default_seed")]
    pub seed: bool,
    #[serde(default)]
    pub sources: Vec<SourceDef>,
}

fn default_seed() -> bool {
    true
}

/// A compiled scenario, ready for `calculate_with`.
#[derive(Debug, Clone)]
pub struct Scenario {
    pub seed: bool,
    pub attributes: BTreeMap<String, AttrValue>,
    pub constants: Constants,
    pub sources: Vec<HolderSource>,
}

impl Scenario {
    pub fn initial_attributes(&self, rules: &RulesConfig) -> Attributes {
        if self.seed {
            rules.seed_attributes(&self.attributes)
        } else {
            self.attributes.iter().map(|(key, value)| (key.clone(), *value)).collect()
        }
    }
}
