//! The mining pipeline: records in, immutable [`MiningResult`] out.
//!
//! An [`Engine`] couples a platform's [`FeatureExtractor`] with an
//! [`ItemsetMiner`]. It holds no per-invocation state, so one engine can
//! serve concurrent calls and every call produces an independent result.

use crate::config::MiningParams;
use crate::error::MiningError;
use crate::features::{build_feature_table, Category, FeatureExtractor, FeatureRow, Platform};
use crate::mining::{mine_itemsets, AprioriMiner, FrequentItemset, ItemsetMiner, ItemsetStats};
use crate::query::{self, Predictor};
use crate::records::RawRecord;
use crate::rules::{generate_rules, AssociationRule};
use crate::transactions::{build_transactions, Transaction};
use crate::vocabulary::Vocabulary;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Counts describing one invocation, for logs and reports.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MiningSummary {
    pub platform: Platform,
    pub record_count: usize,
    /// Records left after sampling.
    pub sampled_count: usize,
    pub transaction_count: usize,
    pub avg_transaction_len: f64,
    /// Retained vocabulary size per category.
    pub vocabulary: BTreeMap<Category, usize>,
    #[serde(flatten)]
    pub itemsets: ItemsetStats,
    pub rules_found: usize,
    pub rule_count: usize,
    pub skipped_partitions: usize,
    /// Fraction of sampled records for which each target holds.
    pub target_prevalence: BTreeMap<String, f64>,
    pub rules_per_target: BTreeMap<String, usize>,
}

/// Everything one invocation computed. Never mutated after creation.
#[derive(Debug, Clone, Serialize)]
pub struct MiningResult {
    pub platform: Platform,
    pub params: MiningParams,
    pub feature_table: Vec<FeatureRow>,
    pub vocabulary: Vocabulary,
    pub transactions: Vec<Transaction>,
    pub frequent_itemsets: Vec<FrequentItemset>,
    /// Ordered by confidence, then antecedent length, both descending.
    pub rules: Vec<AssociationRule>,
    pub rules_by_target: BTreeMap<String, Vec<AssociationRule>>,
    /// Every label the platform can produce, in definition order.
    pub target_labels: Vec<String>,
    pub summary: MiningSummary,
}

impl MiningResult {
    /// Up to `top_n` rules predicting exactly `targets`, without any target
    /// label in the antecedent.
    pub fn get_rules_for_targets(&self, targets: &[String], top_n: usize) -> Vec<&AssociationRule> {
        query::rules_for_targets(&self.rules, &self.target_labels, targets, top_n)
    }

    pub fn top_predictors(&self, target: &str, top_n: usize) -> Vec<Predictor> {
        query::top_predictors(&self.rules, &self.target_labels, target, top_n)
    }
}

/// Outcome of a successful invocation. Configuration errors are reported
/// separately as [`MiningError`] before anything runs.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MiningOutcome {
    Success(MiningResult),
    /// Nothing met the thresholds. The earlier stages are still available.
    Empty(MiningResult),
    /// Some rules could not be evaluated. Everything that could is kept.
    Degraded {
        reason: String,
        partial: MiningResult,
    },
}

impl MiningOutcome {
    pub fn result(&self) -> &MiningResult {
        match self {
            MiningOutcome::Success(result) | MiningOutcome::Empty(result) => result,
            MiningOutcome::Degraded { partial, .. } => partial,
        }
    }

    pub fn into_result(self) -> MiningResult {
        match self {
            MiningOutcome::Success(result) | MiningOutcome::Empty(result) => result,
            MiningOutcome::Degraded { partial, .. } => partial,
        }
    }

    pub fn rules(&self) -> &[AssociationRule] {
        &self.result().rules
    }

    pub fn is_success(&self) -> bool {
        matches!(self, MiningOutcome::Success(_))
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, MiningOutcome::Empty(_))
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, MiningOutcome::Degraded { .. })
    }

    pub fn get_rules_for_targets(&self, targets: &[String], top_n: usize) -> Vec<&AssociationRule> {
        self.result().get_rules_for_targets(targets, top_n)
    }
}

pub struct Engine {
    extractor: Box<dyn FeatureExtractor>,
    miner: Box<dyn ItemsetMiner>,
}

impl Engine {
    pub fn new(platform: Platform) -> Self {
        Self::with_extractor(platform.extractor())
    }

    pub fn with_extractor(extractor: Box<dyn FeatureExtractor>) -> Self {
        Self {
            extractor,
            miner: Box::new(AprioriMiner),
        }
    }

    /// Replaces the itemset search algorithm.
    pub fn with_miner(mut self, miner: Box<dyn ItemsetMiner>) -> Self {
        self.miner = miner;
        self
    }

    pub fn platform(&self) -> Platform {
        self.extractor.platform()
    }

    /// Runs the whole pipeline over `records`.
    ///
    /// Parameters are validated before any record is touched. Identical
    /// records and parameters always give an identical result.
    pub fn mine(
        &self,
        records: &[RawRecord],
        params: &MiningParams,
    ) -> Result<MiningOutcome, MiningError> {
        let params = params.validate()?;
        let platform = self.extractor.platform();
        info!(
            "Mining {} {} records with {}",
            records.len(),
            platform,
            self.miner.name()
        );

        let sampled = sample_records(records, &params);
        let feature_table = build_feature_table(self.extractor.as_ref(), &sampled);
        let target_labels = self.extractor.target_labels();

        let vocabulary = Vocabulary::fit(
            &feature_table,
            params.min_category_frequency,
            params.max_features_per_category,
        );
        let transactions = build_transactions(&feature_table, &vocabulary);

        let (frequent_itemsets, itemset_stats) =
            mine_itemsets(&transactions, &params.itemset_limits(), self.miner.as_ref());
        let generation = generate_rules(&frequent_itemsets, &params.rule_limits());
        let rules_by_target = query::index_by_target(&generation.rules, &target_labels);

        let summary = MiningSummary {
            platform,
            record_count: records.len(),
            sampled_count: sampled.len(),
            transaction_count: transactions.len(),
            avg_transaction_len: average_len(&transactions),
            vocabulary: vocabulary.sizes(),
            itemsets: itemset_stats,
            rules_found: generation.rules_found,
            rule_count: generation.rules.len(),
            skipped_partitions: generation.skipped_partitions,
            target_prevalence: target_prevalence(&feature_table, &target_labels),
            rules_per_target: rules_by_target
                .iter()
                .map(|(target, rules)| (target.clone(), rules.len()))
                .collect(),
        };
        info!(
            "Mined {} itemsets and {} rules from {} transactions",
            summary.itemsets.itemsets_kept, summary.rule_count, summary.transaction_count
        );

        let result = MiningResult {
            platform,
            params,
            feature_table,
            vocabulary,
            transactions,
            frequent_itemsets,
            rules: generation.rules,
            rules_by_target,
            target_labels,
            summary,
        };

        Ok(classify(result))
    }
}

fn classify(result: MiningResult) -> MiningOutcome {
    let skipped = result.summary.skipped_partitions;
    if skipped > 0 {
        let reason = format!(
            "{} rule partitions skipped for missing subset supports",
            skipped
        );
        warn!("{}", reason);
        MiningOutcome::Degraded {
            reason,
            partial: result,
        }
    } else if result.rules.is_empty() {
        info!("No rules met the thresholds");
        MiningOutcome::Empty(result)
    } else {
        MiningOutcome::Success(result)
    }
}

/// Seeded sample without replacement, keeping the original record order.
fn sample_records(records: &[RawRecord], params: &MiningParams) -> Vec<RawRecord> {
    if !params.use_sampling || params.sample_ratio >= 1.0 || records.is_empty() {
        return records.to_vec();
    }

    let amount = ((records.len() as f64 * params.sample_ratio).round() as usize)
        .clamp(1, records.len());
    let mut rng = StdRng::seed_from_u64(params.sample_seed);
    let mut indices = rand::seq::index::sample(&mut rng, records.len(), amount).into_vec();
    indices.sort_unstable();

    debug!(
        "Sampled {} of {} records (seed {})",
        amount,
        records.len(),
        params.sample_seed
    );
    indices.into_iter().map(|i| records[i].clone()).collect()
}

fn average_len(transactions: &[Transaction]) -> f64 {
    if transactions.is_empty() {
        return 0.0;
    }
    transactions.iter().map(|t| t.len()).sum::<usize>() as f64 / transactions.len() as f64
}

fn target_prevalence(rows: &[FeatureRow], labels: &[String]) -> BTreeMap<String, f64> {
    labels
        .iter()
        .map(|label| {
            let holding = rows
                .iter()
                .filter(|row| row.target(label).unwrap_or(false))
                .count();
            let prevalence = if rows.is_empty() {
                0.0
            } else {
                holding as f64 / rows.len() as f64
            };
            (label.clone(), prevalence)
        })
        .collect()
}

/// Mines one batch of `platform` records with the default miner.
pub fn mine(
    platform: Platform,
    records: &[RawRecord],
    params: &MiningParams,
) -> Result<MiningOutcome, MiningError> {
    Engine::new(platform).mine(records, params)
}

/// Rules predicting exactly `targets`. Asking an outcome with no rules gives
/// an empty list.
pub fn get_rules_for_targets<'a>(
    outcome: &'a MiningOutcome,
    targets: &[String],
    top_n: usize,
) -> Vec<&'a AssociationRule> {
    outcome.get_rules_for_targets(targets, top_n)
}

/// Mines independent batches in parallel. Results come back in batch order.
pub fn mine_batches(
    platform: Platform,
    batches: &[Vec<RawRecord>],
    params: &MiningParams,
) -> Vec<Result<MiningOutcome, MiningError>> {
    let engine = Engine::new(platform);
    batches
        .par_iter()
        .map(|records| engine.mine(records, params))
        .collect()
}
