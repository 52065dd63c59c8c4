//! Picks mining parameters from the size of the batch.
//!
//! Larger batches get stricter thresholds, a smaller vocabulary and
//! eventually sampling, so that the itemset search stays bounded before it
//! starts. The recommendation is only a starting point; callers override
//! any field they like.

use crate::config::{
    MiningParams, DEFAULT_MAX_ITEMS, DEFAULT_MAX_ITEMSETS, DEFAULT_MAX_RULES, DEFAULT_SAMPLE_SEED,
};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SizeBand {
    /// Fewer than 100 records.
    Tiny,
    /// Fewer than 1,000 records.
    Small,
    /// Fewer than 5,000 records.
    Medium,
    /// Fewer than 10,000 records.
    Large,
    Huge,
}

impl SizeBand {
    pub fn for_record_count(record_count: usize) -> Self {
        match record_count {
            0..=99 => SizeBand::Tiny,
            100..=999 => SizeBand::Small,
            1_000..=4_999 => SizeBand::Medium,
            5_000..=9_999 => SizeBand::Large,
            _ => SizeBand::Huge,
        }
    }
}

/// Recommended parameters for mining `record_count` records.
pub fn recommend_params(record_count: usize) -> MiningParams {
    let band = SizeBand::for_record_count(record_count);
    let (min_support, min_confidence, min_lift) = match band {
        SizeBand::Tiny => (0.05, 0.5, 1.0),
        SizeBand::Small => (0.08, 0.55, 1.1),
        SizeBand::Medium => (0.1, 0.6, 1.2),
        SizeBand::Large => (0.12, 0.65, 1.2),
        SizeBand::Huge => (0.15, 0.7, 1.3),
    };
    let (max_itemset_length, max_features_per_category, min_category_frequency) = match band {
        SizeBand::Tiny => (3, 20, 2),
        SizeBand::Small => (3, 15, 3),
        SizeBand::Medium => (3, 10, 5),
        SizeBand::Large => (2, 10, 10),
        SizeBand::Huge => (2, 8, 20),
    };
    let (use_sampling, sample_ratio) = match band {
        SizeBand::Large => (true, 0.5),
        SizeBand::Huge => (true, 0.3),
        _ => (false, 1.0),
    };

    MiningParams {
        min_support,
        min_confidence,
        min_lift,
        max_itemset_length,
        max_features_per_category,
        min_category_frequency,
        use_sampling,
        sample_ratio,
        sample_seed: DEFAULT_SAMPLE_SEED,
        max_items: DEFAULT_MAX_ITEMS,
        max_itemsets: DEFAULT_MAX_ITEMSETS,
        max_rules: DEFAULT_MAX_RULES,
        item_prefilter: true,
    }
}
