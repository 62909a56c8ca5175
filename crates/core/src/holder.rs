use crate::{
    is_ability_key, scaled, Activation, Attributes, Constants, Effect, EffectTime, EvalError,
};
use serde::{Deserialize, Serialize};

pub const CLASS_LEVEL: &str = "CLASS_LEVEL";

/// Non-effect grant data carried alongside the effects. Interpreted by
/// other subsystems; the engine never looks at it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Grants {
    pub actions: Vec<String>,
    pub proficiencies: Vec<String>,
    pub resistances: Vec<String>,
    pub bonus_spells: Vec<String>,
}

/// Effects grouped by `EffectTime`, list order preserved inside each bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct TimeBuckets {
    buckets: [Vec<Effect>; 5],
}

impl TimeBuckets {
    fn push(&mut self, effect: Effect) {
        self.buckets[effect.time.index()].push(effect);
    }

    fn at(&self, time: EffectTime) -> &[Effect] {
        &self.buckets[time.index()]
    }

    fn len(&self) -> usize {
        self.buckets.iter().map(Vec::len).sum()
    }
}

/// An activation gate plus the effects it unlocks. Immutable once built;
/// share it behind an `Arc`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EffectHolder {
    activations: Vec<Activation>,
    ability_effects: TimeBuckets,
    normal_effects: TimeBuckets,
    grants: Grants,
}

impl EffectHolder {
    pub fn new(activations: Vec<Activation>, effects: Vec<Effect>, grants: Grants) -> Self {
        let mut ability_effects = TimeBuckets::default();
        let mut normal_effects = TimeBuckets::default();
        for effect in effects {
            if is_ability_key(&effect.key) {
                ability_effects.push(effect);
            } else {
                normal_effects.push(effect);
            }
        }
        Self {
            activations,
            ability_effects,
            normal_effects,
            grants,
        }
    }

    pub fn activations(&self) -> &[Activation] {
        &self.activations
    }

    pub fn ability_effects(&self, time: EffectTime) -> &[Effect] {
        self.ability_effects.at(time)
    }

    pub fn normal_effects(&self, time: EffectTime) -> &[Effect] {
        self.normal_effects.at(time)
    }

    pub fn grants(&self) -> &Grants {
        &self.grants
    }

    pub fn effect_count(&self) -> usize {
        self.ability_effects.len() + self.normal_effects.len()
    }

    /// Conjunction of all activations; vacuously true when there are none.
    pub fn is_active(
        &self,
        attributes: &Attributes,
        constants: &Constants,
    ) -> Result<bool, EvalError> {
        for activation in &self.activations {
            if !activation.check(attributes, constants)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Answers "is this available at class level N" without a creature.
    /// Only `CLASS_LEVEL` is visible; any lookup failure reads as inactive.
    pub fn is_active_at_level(&self, class_level: u32) -> bool {
        let constants: Constants = [(CLASS_LEVEL, scaled(class_level as i64))]
            .into_iter()
            .collect();
        match self.is_active(&Attributes::new(), &constants) {
            Ok(active) => active,
            Err(err) => {
                tracing::debug!(error = %err, class_level, "level check treated as inactive");
                false
            }
        }
    }
}
