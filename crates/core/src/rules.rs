use crate::{Attributes, EvalError, ModifierRule};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ability {
    pub key: &'static str,
    modifier: &'static str,
    save: &'static str,
}

impl Ability {
    const fn new(key: &'static str, modifier: &'static str, save: &'static str) -> Self {
        Self { key, modifier, save }
    }

    pub fn modifier_key(&self) -> &'static str {
        self.modifier
    }

    pub fn save_key(&self) -> &'static str {
        self.save
    }
}

pub const ABILITIES: [Ability; 6] = [
    Ability::new("STR", "STRMOD", "STRSAVE"),
    Ability::new("DEX", "DEXMOD", "DEXSAVE"),
    Ability::new("CON", "CONMOD", "CONSAVE"),
    Ability::new("INT", "INTMOD", "INTSAVE"),
    Ability::new("WIS", "WISMOD", "WISSAVE"),
    Ability::new("CHA", "CHAMOD", "CHASAVE"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Skill {
    pub key: &'static str,
    pub ability: &'static str,
}

pub const SKILLS: [Skill; 18] = [
    Skill { key: "ACROBATICS", ability: "DEX" },
    Skill { key: "ANIMAL_HANDLING", ability: "WIS" },
    Skill { key: "ARCANA", ability: "INT" },
    Skill { key: "ATHLETICS", ability: "STR" },
    Skill { key: "DECEPTION", ability: "CHA" },
    Skill { key: "HISTORY", ability: "INT" },
    Skill { key: "INSIGHT", ability: "WIS" },
    Skill { key: "INTIMIDATION", ability: "CHA" },
    Skill { key: "INVESTIGATION", ability: "INT" },
    Skill { key: "MEDICINE", ability: "WIS" },
    Skill { key: "NATURE", ability: "INT" },
    Skill { key: "PERCEPTION", ability: "WIS" },
    Skill { key: "PERFORMANCE", ability: "CHA" },
    Skill { key: "PERSUASION", ability: "CHA" },
    Skill { key: "RELIGION", ability: "INT" },
    Skill { key: "SLEIGHT_OF_HAND", ability: "DEX" },
    Skill { key: "STEALTH", ability: "DEX" },
    Skill { key: "SURVIVAL", ability: "WIS" },
];

pub fn ability(key: &str) -> Option<&'static Ability> {
    ABILITIES.iter().find(|ability| ability.key == key)
}

/// Keys written by the derive step between the two phases.
pub fn is_derived_key(key: &str) -> bool {
    ABILITIES
        .iter()
        .any(|ability| ability.modifier == key || ability.save == key)
        || SKILLS.iter().any(|skill| skill.key == key)
}

/// Ability-bucketed keys start with an ability abbreviation and are not
/// outputs of the derive step (`STRSAVE`, `INTIMIDATION`, ...).
pub fn is_ability_key(key: &str) -> bool {
    let prefix_matches = key
        .get(..3)
        .map(|prefix| ability(prefix).is_some())
        .unwrap_or(false);
    prefix_matches && !is_derived_key(key)
}

/// Writes every `MOD`/`SAVE` key from the final scores, then copies each
/// skill from its governing modifier.
pub fn derive_modifiers(
    attributes: &mut Attributes,
    rule: &ModifierRule,
) -> Result<(), EvalError> {
    for ability in ABILITIES {
        let score = attributes
            .get(ability.key)
            .ok_or_else(|| EvalError::unknown(ability.key))?;
        let modifier = rule.modifier(score).ok_or_else(|| EvalError::Overflow {
            key: ability.modifier.to_string(),
        })?;
        attributes.insert(ability.modifier, modifier);
        attributes.insert(ability.save, modifier);
    }
    for skill in SKILLS {
        let governing = self::ability(skill.ability)
            .and_then(|ability| attributes.get(ability.modifier))
            .ok_or_else(|| EvalError::unknown(skill.ability))?;
        attributes.insert(skill.key, governing);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partition_by_key_spelling() {
        assert!(is_ability_key("STR"));
        assert!(is_ability_key("DEX_MAX"));
        assert!(is_ability_key("CONSTITUTION"));
        assert!(!is_ability_key("STRMOD"));
        assert!(!is_ability_key("WISSAVE"));
        assert!(!is_ability_key("INTIMIDATION"));
        assert!(!is_ability_key("MAXHP"));
        assert!(!is_ability_key("AC"));
        assert!(!is_ability_key("str"));
    }

    #[test]
    fn derive_copies_modifiers_into_saves_and_skills() {
        let mut attributes: Attributes = ABILITIES
            .iter()
            .map(|ability| (ability.key, 1000))
            .collect();
        attributes.insert("DEX", 1600);
        attributes.insert("WIS", 800);
        derive_modifiers(&mut attributes, &ModifierRule::default()).expect("derive");
        assert_eq!(attributes.get("DEXMOD"), Some(300));
        assert_eq!(attributes.get("DEXSAVE"), Some(300));
        assert_eq!(attributes.get("STEALTH"), Some(300));
        assert_eq!(attributes.get("PERCEPTION"), Some(-100));
        assert_eq!(attributes.get("ATHLETICS"), Some(0));
    }

    #[test]
    fn derive_requires_every_score() {
        let mut attributes = Attributes::new();
        attributes.insert("STR", 1000);
        let err = derive_modifiers(&mut attributes, &ModifierRule::default())
            .expect_err("missing DEX");
        assert_eq!(err, EvalError::unknown("DEX"));
    }
}
