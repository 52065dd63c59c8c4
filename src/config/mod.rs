mod file_config;

pub use file_config::{FileConfig, MiningFileConfig};

use crate::advisor::recommend_params;
use crate::error::MiningError;
use crate::mining::{ItemsetLimits, MAX_ITEMSET_LENGTH};
use crate::rules::RuleLimits;
use serde::{Deserialize, Serialize};
use tracing::warn;

pub const DEFAULT_SAMPLE_SEED: u64 = 42;
pub const DEFAULT_MAX_ITEMS: usize = 200;
pub const DEFAULT_MAX_ITEMSETS: usize = 1000;
pub const DEFAULT_MAX_RULES: usize = 500;

/// Thresholds and caps for one mining invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MiningParams {
    pub min_support: f64,
    pub min_confidence: f64,
    pub min_lift: f64,
    /// Clamped to [`MAX_ITEMSET_LENGTH`].
    pub max_itemset_length: usize,
    pub max_features_per_category: usize,
    pub min_category_frequency: usize,
    pub use_sampling: bool,
    pub sample_ratio: f64,
    pub sample_seed: u64,
    pub max_items: usize,
    pub max_itemsets: usize,
    pub max_rules: usize,
    /// Drop items below `max(1.5 * min_support, 0.1)` before the search.
    pub item_prefilter: bool,
}

impl Default for MiningParams {
    fn default() -> Self {
        recommend_params(0)
    }
}

impl MiningParams {
    /// Checks every threshold and cap, returning the parameters actually used
    /// (itemset length clamped to the hard cap).
    pub fn validate(&self) -> Result<Self, MiningError> {
        fn invalid(message: String) -> Result<MiningParams, MiningError> {
            Err(MiningError::InvalidConfig(message))
        }

        if !(self.min_support > 0.0 && self.min_support <= 1.0) {
            return invalid(format!(
                "min_support must be in (0, 1], got {}",
                self.min_support
            ));
        }
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return invalid(format!(
                "min_confidence must be in [0, 1], got {}",
                self.min_confidence
            ));
        }
        if !(self.min_lift >= 0.0 && self.min_lift.is_finite()) {
            return invalid(format!("min_lift must be >= 0, got {}", self.min_lift));
        }
        if self.max_itemset_length == 0 {
            return invalid("max_itemset_length must be at least 1".to_string());
        }
        if self.max_features_per_category == 0 {
            return invalid("max_features_per_category must be at least 1".to_string());
        }
        if !(self.sample_ratio > 0.0 && self.sample_ratio <= 1.0) {
            return invalid(format!(
                "sample_ratio must be in (0, 1], got {}",
                self.sample_ratio
            ));
        }
        if self.max_items == 0 || self.max_itemsets == 0 || self.max_rules == 0 {
            return invalid("max_items, max_itemsets and max_rules must be at least 1".to_string());
        }

        let mut validated = self.clone();
        if validated.max_itemset_length > MAX_ITEMSET_LENGTH {
            warn!(
                "max_itemset_length {} exceeds the hard cap, using {}",
                validated.max_itemset_length, MAX_ITEMSET_LENGTH
            );
            validated.max_itemset_length = MAX_ITEMSET_LENGTH;
        }
        Ok(validated)
    }

    pub fn itemset_limits(&self) -> ItemsetLimits {
        ItemsetLimits {
            min_support: self.min_support,
            max_len: self.max_itemset_length,
            prefilter: self.item_prefilter,
            max_items: self.max_items,
            max_itemsets: self.max_itemsets,
        }
    }

    pub fn rule_limits(&self) -> RuleLimits {
        RuleLimits {
            min_confidence: self.min_confidence,
            min_lift: self.min_lift,
            max_rules: self.max_rules,
        }
    }
}

/// Values given on the command line. `None` leaves the advisor's value.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub min_support: Option<f64>,
    pub min_confidence: Option<f64>,
    pub min_lift: Option<f64>,
    pub max_itemset_length: Option<usize>,
    pub max_features_per_category: Option<usize>,
    pub min_category_frequency: Option<usize>,
    pub use_sampling: Option<bool>,
    pub sample_ratio: Option<f64>,
    pub sample_seed: Option<u64>,
}

/// Resolves the parameters for a batch of `record_count` records: the
/// advisor's recommendation, overridden by CLI values, overridden by TOML
/// values where present. The result is validated.
pub fn resolve_params(
    record_count: usize,
    cli: &CliOverrides,
    file_config: Option<FileConfig>,
) -> Result<MiningParams, MiningError> {
    let base = recommend_params(record_count);
    let file = file_config.and_then(|f| f.mining).unwrap_or_default();

    let params = MiningParams {
        min_support: file
            .min_support
            .or(cli.min_support)
            .unwrap_or(base.min_support),
        min_confidence: file
            .min_confidence
            .or(cli.min_confidence)
            .unwrap_or(base.min_confidence),
        min_lift: file.min_lift.or(cli.min_lift).unwrap_or(base.min_lift),
        max_itemset_length: file
            .max_itemset_length
            .or(cli.max_itemset_length)
            .unwrap_or(base.max_itemset_length),
        max_features_per_category: file
            .max_features_per_category
            .or(cli.max_features_per_category)
            .unwrap_or(base.max_features_per_category),
        min_category_frequency: file
            .min_category_frequency
            .or(cli.min_category_frequency)
            .unwrap_or(base.min_category_frequency),
        use_sampling: file
            .use_sampling
            .or(cli.use_sampling)
            .unwrap_or(base.use_sampling),
        sample_ratio: file
            .sample_ratio
            .or(cli.sample_ratio)
            .unwrap_or(base.sample_ratio),
        sample_seed: file
            .sample_seed
            .or(cli.sample_seed)
            .unwrap_or(base.sample_seed),
        max_items: file.max_items.unwrap_or(base.max_items),
        max_itemsets: file.max_itemsets.unwrap_or(base.max_itemsets),
        max_rules: file.max_rules.unwrap_or(base.max_rules),
        item_prefilter: file.item_prefilter.unwrap_or(base.item_prefilter),
    };

    params.validate()
}
