//! Boolean transaction x item matrix, stored column-wise as bitsets.

use crate::transactions::Transaction;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

/// Transactions (rows) a bitset can hold per word.
const WORD_BITS: usize = 64;

/// Set of transaction indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitset {
    words: Vec<u64>,
}

impl Bitset {
    pub fn new(len: usize) -> Self {
        Self {
            words: vec![0; len.div_ceil(WORD_BITS)],
        }
    }

    pub fn insert(&mut self, index: usize) {
        self.words[index / WORD_BITS] |= 1u64 << (index % WORD_BITS);
    }

    pub fn contains(&self, index: usize) -> bool {
        self.words
            .get(index / WORD_BITS)
            .is_some_and(|w| w & (1u64 << (index % WORD_BITS)) != 0)
    }

    pub fn count(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    pub fn intersect(&self, other: &Bitset) -> Bitset {
        Bitset {
            words: self
                .words
                .iter()
                .zip(&other.words)
                .map(|(a, b)| a & b)
                .collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TransactionMatrix {
    items: Vec<String>,
    columns: Vec<Bitset>,
    transaction_count: usize,
}

impl TransactionMatrix {
    /// One column per distinct token across all transactions, in first-seen
    /// order.
    pub fn encode(transactions: &[Transaction]) -> Self {
        let transaction_count = transactions.len();
        let mut index: HashMap<&str, usize> = HashMap::new();
        let mut items: Vec<String> = Vec::new();
        let mut columns: Vec<Bitset> = Vec::new();

        for (row, transaction) in transactions.iter().enumerate() {
            for token in transaction {
                let column = *index.entry(token.as_str()).or_insert_with(|| {
                    items.push(token.clone());
                    columns.push(Bitset::new(transaction_count));
                    items.len() - 1
                });
                columns[column].insert(row);
            }
        }

        Self {
            items,
            columns,
            transaction_count,
        }
    }

    pub fn items(&self) -> &[String] {
        &self.items
    }

    pub fn item(&self, column: usize) -> &str {
        &self.items[column]
    }

    pub fn column(&self, column: usize) -> &Bitset {
        &self.columns[column]
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn transaction_count(&self) -> usize {
        self.transaction_count
    }

    /// Fraction of transactions containing each item, per column.
    pub fn item_supports(&self) -> Vec<f64> {
        if self.transaction_count == 0 {
            return vec![0.0; self.items.len()];
        }
        let total = self.transaction_count as f64;
        self.columns
            .par_iter()
            .map(|column| column.count() as f64 / total)
            .collect()
    }

    /// Keeps the given columns, in the given order.
    pub fn select(&self, columns: &[usize]) -> Self {
        Self {
            items: columns.iter().map(|c| self.items[*c].clone()).collect(),
            columns: columns.iter().map(|c| self.columns[*c].clone()).collect(),
            transaction_count: self.transaction_count,
        }
    }
}

/// Bounds applied to the matrix before the itemset search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ItemPruning {
    pub min_support: f64,
    /// Drop items below `max(1.5 * min_support, 0.1)` before searching.
    pub prefilter: bool,
    pub max_items: usize,
}

impl ItemPruning {
    pub fn prefilter_floor(&self) -> f64 {
        (1.5 * self.min_support).max(0.1)
    }
}

/// Item counts at each pruning stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PruningStats {
    pub observed_items: usize,
    pub after_prefilter: usize,
    pub mined_items: usize,
}

/// Applies the lossy item pre-filter, then the item-count cap (most frequent
/// first, ties in first-seen order). Surviving columns keep their original
/// relative order.
pub fn prune_items(matrix: &TransactionMatrix, pruning: &ItemPruning) -> (TransactionMatrix, PruningStats) {
    let supports = matrix.item_supports();
    let floor = if pruning.prefilter {
        pruning.prefilter_floor()
    } else {
        0.0
    };

    let mut kept: Vec<usize> = (0..matrix.item_count())
        .filter(|c| supports[*c] + f64::EPSILON >= floor)
        .collect();
    let after_prefilter = kept.len();

    if kept.len() > pruning.max_items {
        kept.sort_by(|a, b| supports[*b].total_cmp(&supports[*a]).then(a.cmp(b)));
        kept.truncate(pruning.max_items);
        kept.sort_unstable();
        debug!(
            "Item cap reached: {} items reduced to {}",
            after_prefilter, pruning.max_items
        );
    }

    let stats = PruningStats {
        observed_items: matrix.item_count(),
        after_prefilter,
        mined_items: kept.len(),
    };
    (matrix.select(&kept), stats)
}
