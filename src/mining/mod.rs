//! Frequent itemset mining.
//!
//! The search algorithm sits behind [`ItemsetMiner`] so it can be swapped
//! without touching matrix preparation or rule generation. Every stage here
//! enforces a hard cap up front; nothing is detected and aborted mid-search.

mod apriori;
pub mod matrix;

pub use apriori::AprioriMiner;
pub use matrix::{ItemPruning, PruningStats, TransactionMatrix};

use crate::transactions::Transaction;
use serde::Serialize;
use tracing::{debug, info};

/// Itemsets longer than this are never searched, whatever the caller asks.
pub const MAX_ITEMSET_LENGTH: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrequentItemset {
    /// Tokens in ascending order.
    pub items: Vec<String>,
    pub count: usize,
    pub support: f64,
}

impl FrequentItemset {
    pub fn new(mut items: Vec<String>, count: usize, support: f64) -> Self {
        items.sort();
        Self {
            items,
            count,
            support,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// A frequent itemset search over a prepared boolean matrix.
pub trait ItemsetMiner: Send + Sync {
    fn name(&self) -> &'static str;

    /// Returns every itemset of at most `max_len` items whose support is at
    /// least `min_support`. Nothing frequent yields an empty vector.
    fn mine(
        &self,
        matrix: &TransactionMatrix,
        min_support: f64,
        max_len: usize,
    ) -> Vec<FrequentItemset>;
}

/// Parameters of the itemset stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ItemsetLimits {
    pub min_support: f64,
    pub max_len: usize,
    pub prefilter: bool,
    pub max_items: usize,
    pub max_itemsets: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ItemsetStats {
    #[serde(flatten)]
    pub items: PruningStats,
    pub itemsets_found: usize,
    pub itemsets_kept: usize,
}

/// Encodes transactions, prunes items, searches and caps the result.
///
/// The returned itemsets are ordered by support, descending; ties keep the
/// miner's discovery order.
pub fn mine_itemsets(
    transactions: &[Transaction],
    limits: &ItemsetLimits,
    miner: &dyn ItemsetMiner,
) -> (Vec<FrequentItemset>, ItemsetStats) {
    let matrix = TransactionMatrix::encode(transactions);
    let (matrix, item_stats) = matrix::prune_items(
        &matrix,
        &ItemPruning {
            min_support: limits.min_support,
            prefilter: limits.prefilter,
            max_items: limits.max_items,
        },
    );
    debug!(
        "Items: {} observed, {} after pre-filter, {} mined",
        item_stats.observed_items, item_stats.after_prefilter, item_stats.mined_items
    );

    let max_len = limits.max_len.min(MAX_ITEMSET_LENGTH);
    let mut itemsets = miner.mine(&matrix, limits.min_support, max_len);
    let itemsets_found = itemsets.len();

    itemsets.sort_by(|a, b| b.support.total_cmp(&a.support));
    if itemsets.len() > limits.max_itemsets {
        info!(
            "Itemset cap reached: keeping {} of {} itemsets",
            limits.max_itemsets, itemsets_found
        );
        itemsets.truncate(limits.max_itemsets);
    }

    info!(
        "{} found {} frequent itemsets over {} items",
        miner.name(),
        itemsets.len(),
        matrix.item_count()
    );

    let stats = ItemsetStats {
        items: item_stats,
        itemsets_found,
        itemsets_kept: itemsets.len(),
    };
    (itemsets, stats)
}
