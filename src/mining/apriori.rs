//! Level-wise (Apriori) frequent itemset search over a bitset matrix.

use super::matrix::{Bitset, TransactionMatrix};
use super::{FrequentItemset, ItemsetMiner};
use rayon::prelude::*;
use std::collections::HashSet;
use tracing::debug;

/// Tolerance for comparing supports against the threshold.
const SUPPORT_EPSILON: f64 = 1e-12;

/// Breadth-first Apriori: frequent k-itemsets are joined on their shared
/// (k-1)-prefix, candidates with an infrequent k-subset are pruned, and the
/// rest are counted by intersecting transaction bitsets.
#[derive(Debug, Clone, Copy, Default)]
pub struct AprioriMiner;

/// A frequent itemset of the current level: sorted column indices and the
/// transactions containing all of them.
struct LevelEntry {
    columns: Vec<usize>,
    rows: Bitset,
}

impl ItemsetMiner for AprioriMiner {
    fn name(&self) -> &'static str {
        "apriori"
    }

    fn mine(
        &self,
        matrix: &TransactionMatrix,
        min_support: f64,
        max_len: usize,
    ) -> Vec<FrequentItemset> {
        let total = matrix.transaction_count();
        if total == 0 || matrix.item_count() == 0 || max_len == 0 {
            return Vec::new();
        }
        let is_frequent = |count: usize| count as f64 / total as f64 + SUPPORT_EPSILON >= min_support;

        let mut found: Vec<FrequentItemset> = Vec::new();
        let mut level: Vec<LevelEntry> = (0..matrix.item_count())
            .filter_map(|column| {
                let rows = matrix.column(column).clone();
                is_frequent(rows.count()).then(|| LevelEntry {
                    columns: vec![column],
                    rows,
                })
            })
            .collect();

        let mut size = 1;
        loop {
            debug!("Apriori level {}: {} frequent itemsets", size, level.len());
            found.extend(level.iter().map(|entry| to_itemset(matrix, entry, total)));
            if size >= max_len || level.len() < 2 {
                break;
            }
            level = next_level(&level, &is_frequent);
            size += 1;
        }

        found
    }
}

/// Joins the frequent itemsets of one level into the frequent itemsets of the
/// next. `level` is sorted lexicographically by column indices, which the
/// join preserves.
fn next_level(level: &[LevelEntry], is_frequent: &(dyn Fn(usize) -> bool + Sync)) -> Vec<LevelEntry> {
    let known: HashSet<&[usize]> = level.iter().map(|e| e.columns.as_slice()).collect();
    let prefix_len = level[0].columns.len() - 1;

    let mut candidates: Vec<(usize, usize)> = Vec::new();
    for (i, left) in level.iter().enumerate() {
        for (j, right) in level.iter().enumerate().skip(i + 1) {
            if left.columns[..prefix_len] != right.columns[..prefix_len] {
                break;
            }
            let mut joined = left.columns.clone();
            joined.push(right.columns[prefix_len]);
            if all_subsets_known(&joined, &known) {
                candidates.push((i, j));
            }
        }
    }

    candidates
        .par_iter()
        .filter_map(|(i, j)| {
            let left = &level[*i];
            let right = &level[*j];
            let rows = left.rows.intersect(&right.rows);
            if !is_frequent(rows.count()) {
                return None;
            }
            let mut columns = left.columns.clone();
            columns.push(right.columns[prefix_len]);
            Some(LevelEntry { columns, rows })
        })
        .collect()
}

/// Every subset obtained by dropping one element must be frequent.
fn all_subsets_known(candidate: &[usize], known: &HashSet<&[usize]>) -> bool {
    (0..candidate.len()).all(|skip| {
        let subset: Vec<usize> = candidate
            .iter()
            .enumerate()
            .filter(|(index, _)| *index != skip)
            .map(|(_, column)| *column)
            .collect();
        known.contains(subset.as_slice())
    })
}

fn to_itemset(matrix: &TransactionMatrix, entry: &LevelEntry, total: usize) -> FrequentItemset {
    let count = entry.rows.count();
    FrequentItemset::new(
        entry
            .columns
            .iter()
            .map(|c| matrix.item(*c).to_string())
            .collect(),
        count,
        count as f64 / total as f64,
    )
}
