//! Phased evaluation of effect holders against one creature's attributes.
//!
//! A run selects active holders once against the initial snapshot, then
//! applies ability-score effects, derives modifiers, saves and skills from the
//! final scores, and finally applies every other effect.

use crate::{
    derive_modifiers, AttrValue, Attributes, Constants, Effect, EffectHolder, EffectTime,
    EvalError, RulesConfig,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Precedence of content sources, most specific to the character first.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SourceTier {
    SelfFeatures,
    Class,
    Subclass,
    Species,
    Subspecies,
}

/// A content entity's holder plus the holders of its sub-parts.
#[derive(Debug, Clone)]
pub struct HolderSource {
    pub tier: SourceTier,
    pub label: String,
    pub holder: Arc<EffectHolder>,
    pub parts: Vec<Arc<EffectHolder>>,
}

impl HolderSource {
    pub fn new(tier: SourceTier, label: impl Into<String>, holder: Arc<EffectHolder>) -> Self {
        Self {
            tier,
            label: label.into(),
            holder,
            parts: Vec::new(),
        }
    }

    pub fn with_part(mut self, part: Arc<EffectHolder>) -> Self {
        self.parts.push(part);
        self
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Ability,
    Normal,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ability => f.write_str("ability"),
            Self::Normal => f.write_str("normal"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceStep {
    pub label: String,
    pub phase: Phase,
    pub effect: Effect,
    pub before: AttrValue,
    pub after: AttrValue,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculationReport {
    pub attributes: Attributes,
    pub trace: Vec<TraceStep>,
}

#[derive(Debug, Clone, Copy)]
struct ActiveHolder<'a> {
    label: &'a str,
    part: Option<usize>,
    holder: &'a EffectHolder,
}

impl ActiveHolder<'_> {
    fn describe(&self) -> String {
        match self.part {
            Some(index) => format!("{}[{}]", self.label, index),
            None => self.label.to_string(),
        }
    }
}

/// One evaluation run. Owns its working attributes; constants and holders
/// are only borrowed.
#[derive(Debug)]
pub struct Calculation<'a> {
    rules: &'a RulesConfig,
    attributes: Attributes,
    constants: &'a Constants,
    active: Vec<ActiveHolder<'a>>,
    trace: Option<Vec<TraceStep>>,
}

impl<'a> Calculation<'a> {
    pub fn new(rules: &'a RulesConfig, attributes: Attributes, constants: &'a Constants) -> Self {
        Self {
            rules,
            attributes,
            constants,
            active: Vec::new(),
            trace: None,
        }
    }

    pub fn with_trace(mut self) -> Self {
        self.trace = Some(Vec::new());
        self
    }

    /// Records the active holders in precedence order. Gates are checked
    /// against the attributes as they are now, before any effect runs, and
    /// are not re-checked later in the run.
    pub fn select(&mut self, sources: &'a [HolderSource]) -> Result<(), EvalError> {
        let mut ordered: Vec<&'a HolderSource> = sources.iter().collect();
        ordered.sort_by_key(|source| source.tier);
        for source in ordered {
            if !source.holder.is_active(&self.attributes, self.constants)? {
                tracing::debug!(source = %source.label, tier = ?source.tier, "holder inactive");
                continue;
            }
            tracing::debug!(source = %source.label, tier = ?source.tier, "holder active");
            self.active.push(ActiveHolder {
                label: &source.label,
                part: None,
                holder: &source.holder,
            });
            for (index, part) in source.parts.iter().enumerate() {
                if part.is_active(&self.attributes, self.constants)? {
                    self.active.push(ActiveHolder {
                        label: &source.label,
                        part: Some(index),
                        holder: part,
                    });
                } else {
                    tracing::debug!(source = %source.label, part = index, "part inactive");
                }
            }
        }
        Ok(())
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    pub fn run(mut self) -> Result<CalculationReport, EvalError> {
        tracing::debug!(active = self.active.len(), "ability phase");
        self.apply_phase(Phase::Ability)?;
        derive_modifiers(&mut self.attributes, &self.rules.modifier)?;
        tracing::debug!(active = self.active.len(), "normal phase");
        self.apply_phase(Phase::Normal)?;
        Ok(CalculationReport {
            attributes: self.attributes,
            trace: self.trace.unwrap_or_default(),
        })
    }

    fn apply_phase(&mut self, phase: Phase) -> Result<(), EvalError> {
        for time in EffectTime::ALL {
            for active in &self.active {
                let effects = match phase {
                    Phase::Ability => active.holder.ability_effects(time),
                    Phase::Normal => active.holder.normal_effects(time),
                };
                for effect in effects {
                    let change = effect.apply_with(
                        &mut self.attributes,
                        self.constants,
                        self.rules.division,
                    )?;
                    tracing::trace!(
                        key = %effect.key,
                        before = change.before,
                        after = change.after,
                        "applied {}",
                        effect
                    );
                    if let Some(trace) = self.trace.as_mut() {
                        trace.push(TraceStep {
                            label: active.describe(),
                            phase,
                            effect: effect.clone(),
                            before: change.before,
                            after: change.after,
                        });
                    }
                }
            }
        }
        Ok(())
    }
}

/// Runs a full calculation with the default rules.
pub fn calculate(
    initial: Attributes,
    constants: &Constants,
    sources: &[HolderSource],
) -> Result<Attributes, EvalError> {
    calculate_with(&RulesConfig::default(), initial, constants, sources)
}

pub fn calculate_with(
    rules: &RulesConfig,
    initial: Attributes,
    constants: &Constants,
    sources: &[HolderSource],
) -> Result<Attributes, EvalError> {
    let mut calculation = Calculation::new(rules, initial, constants);
    calculation.select(sources)?;
    Ok(calculation.run()?.attributes)
}
