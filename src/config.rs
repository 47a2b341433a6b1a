use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::graph::build::DEFAULT_ABBREVIATE_LENGTH;
use crate::graph::model::DEFAULT_DISPLAY_NODES;
use crate::graph::{GraphResult, RewriteSpec, StoreConfig, ValueNormalizer};
use crate::layout::{PhysicsConfig, StalenessPolicy};

pub const DEFAULT_MAX_LABEL_LENGTH: usize = 20;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    pub fold_case: bool,
    pub trim: bool,
    pub rewrites: Vec<RewriteSpec>,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            fold_case: false,
            trim: true,
            rewrites: Vec::new(),
        }
    }
}

impl NormalizerConfig {
    pub fn build(&self) -> GraphResult<ValueNormalizer> {
        ValueNormalizer::new()
            .with_trim(self.trim)
            .with_case_folding(self.fold_case)
            .with_rewrites(&self.rewrites)
    }
}

/// Engine settings. Every field is optional in the JSON file.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub normalizer: NormalizerConfig,
    pub physics: PhysicsConfig,
    pub abbreviate_length: usize,
    pub max_label_length: usize,
    pub default_display_nodes: usize,
    pub staleness: StalenessPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            normalizer: NormalizerConfig::default(),
            physics: PhysicsConfig::default(),
            abbreviate_length: DEFAULT_ABBREVIATE_LENGTH,
            max_label_length: DEFAULT_MAX_LABEL_LENGTH,
            default_display_nodes: DEFAULT_DISPLAY_NODES,
            staleness: StalenessPolicy::default(),
        }
    }
}

impl EngineConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("invalid config file {}", path.display()))
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw).context("config is not valid JSON")?;
        config
            .normalizer
            .build()
            .context("invalid normalizer rewrite")?;
        Ok(config)
    }

    pub fn store_config(&self) -> GraphResult<StoreConfig> {
        Ok(StoreConfig {
            normalizer: self.normalizer.build()?,
            abbreviate_length: self.abbreviate_length.max(1),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_gives_defaults() {
        let config = EngineConfig::parse("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.abbreviate_length, 40);
        assert_eq!(config.max_label_length, 20);
        assert_eq!(config.default_display_nodes, 500);
        assert_eq!(config.staleness, StalenessPolicy::Generation);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = EngineConfig::parse(
            r#"{
                "normalizer": { "fold_case": true, "rewrites": [{ "regex": "^www\\.", "replace_with": "" }] },
                "physics": { "intensity": 1.5 },
                "staleness": "heuristic"
            }"#,
        )
        .unwrap();

        assert!(config.normalizer.fold_case);
        assert!(config.normalizer.trim);
        assert_eq!(config.physics.intensity, 1.5);
        assert_eq!(config.physics.spread_force, PhysicsConfig::default().spread_force);
        assert_eq!(config.staleness, StalenessPolicy::Heuristic);

        let normalizer = config.store_config().unwrap().normalizer;
        assert_eq!(normalizer.normalize(" WWW.Example.com "), "example.com");
    }

    #[test]
    fn bad_rewrite_is_rejected_at_load() {
        let error = EngineConfig::parse(r#"{ "normalizer": { "rewrites": [{ "regex": "(", "replace_with": "" }] } }"#)
            .unwrap_err();
        assert!(format!("{error:#}").contains("invalid normalizer rewrite"));
    }
}
