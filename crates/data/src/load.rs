use crate::effect_dsl::{compile_activation, compile_effect};
use crate::error::{SourceLocation, SyntaxError};
use crate::schema::{HolderDef, Scenario, ScenarioDef, SourceDef};
use anyhow::Context;
use charsheet_core::{EffectHolder, HolderSource, RulesConfig};
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// Compiles every expression of `def` and builds the holder. The first
/// failing expression aborts construction.
pub fn compile_holder(
    def: &HolderDef,
    location: &SourceLocation,
) -> Result<EffectHolder, SyntaxError> {
    let activations = def
        .activations
        .iter()
        .enumerate()
        .map(|(idx, text)| {
            compile_activation(text, &location.with_field(format!("activations[{idx}]")))
        })
        .collect::<Result<Vec<_>, _>>()?;
    let effects = def
        .effects
        .iter()
        .enumerate()
        .map(|(idx, text)| compile_effect(text, &location.with_field(format!("effects[{idx}]"))))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(EffectHolder::new(activations, effects, def.grants.clone()))
}

pub fn compile_source(def: &SourceDef, file: &str) -> Result<HolderSource, SyntaxError> {
    let location = SourceLocation::file(format!("{file}:{}", def.label));
    let holder = compile_holder(&def.holder, &location)?;
    let mut source = HolderSource::new(def.tier, def.label.clone(), Arc::new(holder));
    for (idx, part) in def.parts.iter().enumerate() {
        let location = SourceLocation::file(format!("{file}:{}.parts[{idx}]", def.label));
        source = source.with_part(Arc::new(compile_holder(part, &location)?));
    }
    Ok(source)
}

pub fn compile_scenario(def: &ScenarioDef, file: &str) -> Result<Scenario, SyntaxError> {
    let sources = def
        .sources
        .iter()
        .map(|source| compile_source(source, file))
        .collect::<Result<Vec<_>, _>>()?;
    tracing::debug!(file, sources = sources.len(), "compiled scenario");
    Ok(Scenario {
        seed: def.seed,
        attributes: def.attributes.clone(),
        constants: def
            .constants
            .iter()
            .map(|(key, value)| (key.clone(), *value))
            .collect(),
        sources,
    })
}

pub fn load_rules_config(path: &Path) -> anyhow::Result<RulesConfig> {
    load_json(path)
}

pub fn load_scenario(path: &Path) -> anyhow::Result<Scenario> {
    let def: ScenarioDef = load_json(path)?;
    let scenario = compile_scenario(&def, &path.display().to_string())
        .with_context(|| format!("compile {}", path.display()))?;
    Ok(scenario)
}

fn load_json<T: DeserializeOwned>(path: impl AsRef<Path>) -> anyhow::Result<T> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let value = serde_json::from_str(&raw).with_context(|| format!("parse {}", path.display()))?;
    Ok(value)
}
