use crate::error::MiningError;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct FileConfig {
    pub mining: Option<MiningFileConfig>,
}

/// `[mining]` table. Every key is optional; present keys override both the
/// advisor's recommendation and the command line.
#[derive(Debug, Deserialize, Default, Clone, PartialEq)]
#[serde(default)]
pub struct MiningFileConfig {
    pub min_support: Option<f64>,
    pub min_confidence: Option<f64>,
    pub min_lift: Option<f64>,
    pub max_itemset_length: Option<usize>,
    pub max_features_per_category: Option<usize>,
    pub min_category_frequency: Option<usize>,
    pub use_sampling: Option<bool>,
    pub sample_ratio: Option<f64>,
    pub sample_seed: Option<u64>,
    // Caps
    pub max_items: Option<usize>,
    pub max_itemsets: Option<usize>,
    pub max_rules: Option<usize>,
    pub item_prefilter: Option<bool>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        Self::parse(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    pub fn parse(content: &str) -> Result<Self, MiningError> {
        Ok(toml::from_str(content)?)
    }
}
