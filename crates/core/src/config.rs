use crate::{scaled, AttrValue, Attributes, ABILITIES, SCALE, SKILLS};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DivisionPolicy {
    /// A zero divisor aborts the run with `EvalError::DivisionByZero`.
    #[default]
    Fail,
    /// A zero divisor yields the extreme value with the sign of the old value.
    Saturate,
}

/// `modifier = floor((score - base) / step)`, in whole units. `step` is
/// always positive.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(try_from = "RawModifierRule")]
pub struct ModifierRule {
    base: i64,
    step: i64,
}

#[derive(Deserialize)]
struct RawModifierRule {
    base: i64,
    step: i64,
}

impl TryFrom<RawModifierRule> for ModifierRule {
    type Error = String;

    fn try_from(raw: RawModifierRule) -> Result<Self, Self::Error> {
        Self::new(raw.base, raw.step)
            .ok_or_else(|| format!("modifier step must be positive, got {}", raw.step))
    }
}

impl Default for ModifierRule {
    fn default() -> Self {
        Self { base: 10, step: 2 }
    }
}

impl ModifierRule {
    /// `None` when `step` is not positive.
    pub fn new(base: i64, step: i64) -> Option<Self> {
        (step > 0).then_some(Self { base, step })
    }

    pub fn base(&self) -> i64 {
        self.base
    }

    pub fn step(&self) -> i64 {
        self.step
    }

    /// `None` when the scaled result does not fit an `AttrValue`.
    pub fn modifier(&self, score: AttrValue) -> Option<AttrValue> {
        let scale = i128::from(SCALE);
        let offset = i128::from(score) - i128::from(self.base) * scale;
        let whole = offset.div_euclid(i128::from(self.step) * scale);
        AttrValue::try_from(whole * scale).ok()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RulesConfig {
    pub modifier: ModifierRule,
    pub division: DivisionPolicy,
    /// Non-ability fields seeded as zero so effects can target them.
    pub seeded_fields: Vec<String>,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            modifier: ModifierRule::default(),
            division: DivisionPolicy::Fail,
            seeded_fields: [
                "MAXHP",
                "AC",
                "INITIATIVE",
                "SPEED",
                "PROFICIENCY",
                "PASSIVE_PERCEPTION",
            ]
            .iter()
            .map(|field| field.to_string())
            .collect(),
        }
    }
}

impl RulesConfig {
    /// Builds a fresh working namespace: ability scores (10 when absent),
    /// every derived key and seeded field at zero, then any extra keys from
    /// `scores` verbatim.
    pub fn seed_attributes(&self, scores: &BTreeMap<String, AttrValue>) -> Attributes {
        let mut attributes = Attributes::new();
        for ability in ABILITIES {
            let score = scores.get(ability.key).copied().unwrap_or(scaled(10));
            attributes.insert(ability.key, score);
            attributes.insert(ability.modifier_key(), 0);
            attributes.insert(ability.save_key(), 0);
        }
        for skill in SKILLS {
            attributes.insert(skill.key, 0);
        }
        for field in &self.seeded_fields {
            attributes.insert(field.clone(), 0);
        }
        for (key, value) in scores {
            attributes.insert(key.clone(), *value);
        }
        attributes
    }
}
