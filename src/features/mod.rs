//! Record preprocessing: raw records to feature rows.
//!
//! Each platform supplies a [`FeatureExtractor`] that turns one record into
//! categorical tokens, high-cardinality entity tokens and numeric metrics.
//! Target labels depend on the whole batch (quantile thresholds), so they are
//! computed afterwards by [`build_feature_table`] from the extractor's
//! [`TargetDefinition`]s.

pub mod buckets;
mod post;
mod video;

pub use post::PostExtractor;
pub use video::VideoExtractor;

use crate::records::RawRecord;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Source platform of a record batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// LinkedIn-style posts.
    #[value(name = "linkedin")]
    LinkedIn,
    /// TikTok-style videos.
    #[value(name = "tiktok")]
    TikTok,
}

impl Platform {
    pub fn extractor(&self) -> Box<dyn FeatureExtractor> {
        match self {
            Platform::LinkedIn => Box::new(PostExtractor),
            Platform::TikTok => Box::new(VideoExtractor),
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Platform::LinkedIn => write!(f, "linkedin"),
            Platform::TikTok => write!(f, "tiktok"),
        }
    }
}

/// High-cardinality token families bounded by the vocabulary filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Author,
    Hashtag,
    Mention,
    Music,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Author,
        Category::Hashtag,
        Category::Mention,
        Category::Music,
    ];

    /// Maximum number of tokens of this category a single transaction carries.
    pub fn per_record_limit(&self) -> usize {
        match self {
            Category::Author => 1,
            Category::Hashtag => 3,
            Category::Mention => 2,
            Category::Music => 1,
        }
    }

    pub fn token_prefix(&self) -> &'static str {
        match self {
            Category::Author => "author_",
            Category::Hashtag => "hashtag_",
            Category::Mention => "mention_",
            Category::Music => "music_",
        }
    }

    /// Builds the transaction token for an entity name, `None` if the name
    /// normalizes to nothing.
    pub fn token(&self, name: &str) -> Option<String> {
        buckets::slug(name).map(|slug| format!("{}{}", self.token_prefix(), slug))
    }
}

/// How a boolean target label is derived from the batch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TargetRule {
    /// Metric at or above the given quantile of the current batch.
    Quantile { metric: &'static str, quantile: f64 },
    /// Metric strictly positive (presence flags).
    Flag { metric: &'static str },
    /// Both previously defined labels hold.
    Both(&'static str, &'static str),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetDefinition {
    pub label: &'static str,
    pub rule: TargetRule,
}

impl TargetDefinition {
    pub const fn quantile(label: &'static str, metric: &'static str, quantile: f64) -> Self {
        Self {
            label,
            rule: TargetRule::Quantile { metric, quantile },
        }
    }

    pub const fn flag(label: &'static str, metric: &'static str) -> Self {
        Self {
            label,
            rule: TargetRule::Flag { metric },
        }
    }

    pub const fn both(label: &'static str, first: &'static str, second: &'static str) -> Self {
        Self {
            label,
            rule: TargetRule::Both(first, second),
        }
    }
}

/// One preprocessed record.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FeatureRow {
    /// Always-included categorical tokens, in extraction order.
    pub categorical: Vec<String>,
    /// Candidate high-cardinality tokens per category, in order of appearance.
    pub entities: BTreeMap<Category, Vec<String>>,
    pub metrics: BTreeMap<String, f64>,
    /// Target labels in definition order. Empty until the batch is labelled.
    pub targets: Vec<(String, bool)>,
}

impl FeatureRow {
    pub fn push_categorical(&mut self, token: impl Into<String>) {
        self.categorical.push(token.into());
    }

    /// Adds an entity token, ignoring names that normalize to nothing and
    /// duplicates within the row.
    pub fn push_entity(&mut self, category: Category, name: &str) {
        if let Some(token) = category.token(name) {
            let tokens = self.entities.entry(category).or_default();
            if !tokens.contains(&token) {
                tokens.push(token);
            }
        }
    }

    pub fn set_metric(&mut self, name: &str, value: f64) {
        self.metrics.insert(name.to_string(), value);
    }

    pub fn metric(&self, name: &str) -> f64 {
        self.metrics.get(name).copied().unwrap_or(0.0)
    }

    pub fn entity_tokens(&self, category: Category) -> &[String] {
        self.entities
            .get(&category)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn target(&self, label: &str) -> Option<bool> {
        self.targets
            .iter()
            .find(|(name, _)| name == label)
            .map(|(_, value)| *value)
    }

    /// Labels that hold for this row, in definition order.
    pub fn true_targets(&self) -> impl Iterator<Item = &str> {
        self.targets
            .iter()
            .filter(|(_, value)| *value)
            .map(|(name, _)| name.as_str())
    }
}

/// Platform-specific knowledge of a record shape.
pub trait FeatureExtractor: Send + Sync {
    fn platform(&self) -> Platform;

    /// Target labels this platform produces, in evaluation order.
    fn targets(&self) -> &'static [TargetDefinition];

    /// Maps one record to categorical tokens, entities and metrics. Must not
    /// fail: malformed or missing fields map to `unknown` buckets or zeros.
    fn extract(&self, record: &RawRecord) -> FeatureRow;

    fn target_labels(&self) -> Vec<String> {
        self.targets().iter().map(|t| t.label.to_string()).collect()
    }
}

/// Runs the extractor over every record and labels the batch.
pub fn build_feature_table(
    extractor: &dyn FeatureExtractor,
    records: &[RawRecord],
) -> Vec<FeatureRow> {
    let mut rows: Vec<FeatureRow> = records.iter().map(|r| extractor.extract(r)).collect();
    label_targets(&mut rows, extractor.targets());
    rows
}

/// Computes batch-relative target labels on every row.
///
/// A quantile target holds when the metric reaches the batch quantile, so a
/// batch where a metric is zero everywhere labels every row.
pub fn label_targets(rows: &mut [FeatureRow], definitions: &[TargetDefinition]) {
    let thresholds: Vec<Option<f64>> = definitions
        .iter()
        .map(|def| match def.rule {
            TargetRule::Quantile { metric, quantile: q } => {
                let values: Vec<f64> = rows.iter().map(|row| row.metric(metric)).collect();
                let threshold = quantile(&values, q);
                debug!(
                    "Target {} threshold: {} >= {:.4} (q={})",
                    def.label, metric, threshold, q
                );
                Some(threshold)
            }
            _ => None,
        })
        .collect();

    for row in rows.iter_mut() {
        row.targets.clear();
        for (def, threshold) in definitions.iter().zip(&thresholds) {
            let value = match (def.rule, threshold) {
                (TargetRule::Quantile { metric, .. }, Some(threshold)) => {
                    row.metric(metric) >= *threshold
                }
                (TargetRule::Flag { metric }, _) => row.metric(metric) > 0.0,
                (TargetRule::Both(first, second), _) => {
                    row.target(first).unwrap_or(false) && row.target(second).unwrap_or(false)
                }
                _ => false,
            };
            row.targets.push((def.label.to_string(), value));
        }
    }
}

/// Quantile with linear interpolation between closest ranks. Empty input
/// yields 0.
pub fn quantile(values: &[f64], q: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let position = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row_with(metric: &str, value: f64) -> FeatureRow {
        let mut row = FeatureRow::default();
        row.set_metric(metric, value);
        row
    }

    const DEFS: [TargetDefinition; 4] = [
        TargetDefinition::quantile("high_views", "views", 0.75),
        TargetDefinition::quantile("viral", "views", 0.9),
        TargetDefinition::flag("has_media", "media"),
        TargetDefinition::both("viral_with_media", "viral", "has_media"),
    ];

    // ==========================================================================
    // Quantile tests
    // ==========================================================================

    #[test]
    fn test_quantile_interpolates() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(quantile(&values, 0.5), 3.0);
        assert_eq!(quantile(&values, 0.75), 4.0);
        assert!((quantile(&values, 0.9) - 4.6).abs() < 1e-9);
        assert_eq!(quantile(&values, 1.0), 5.0);
    }

    #[test]
    fn test_quantile_unsorted_and_empty() {
        assert_eq!(quantile(&[5.0, 1.0, 3.0], 0.5), 3.0);
        assert_eq!(quantile(&[], 0.75), 0.0);
        assert_eq!(quantile(&[7.0], 0.9), 7.0);
    }

    // ==========================================================================
    // Labelling tests
    // ==========================================================================

    #[test]
    fn test_label_targets_quantiles() {
        let mut rows: Vec<FeatureRow> = (1..=10).map(|v| row_with("views", v as f64)).collect();
        label_targets(&mut rows, &DEFS);

        let high: Vec<bool> = rows
            .iter()
            .map(|r| r.target("high_views").unwrap())
            .collect();
        // q75 of 1..=10 is 7.75
        assert_eq!(high.iter().filter(|v| **v).count(), 3);
        assert!(rows[9].target("viral").unwrap());
        assert!(!rows[7].target("viral").unwrap());
    }

    #[test]
    fn test_label_targets_all_zero_metric_labels_everyone() {
        let mut rows: Vec<FeatureRow> = (0..5).map(|_| row_with("views", 0.0)).collect();
        label_targets(&mut rows, &DEFS);
        assert!(rows.iter().all(|r| r.target("high_views") == Some(true)));
        assert!(rows.iter().all(|r| r.target("viral") == Some(true)));
        assert!(rows.iter().all(|r| r.target("has_media") == Some(false)));
    }

    #[test]
    fn test_label_targets_zero_quantile_includes_zero_rows() {
        let mut rows: Vec<FeatureRow> = [0.0, 0.0, 0.0, 0.0, 5.0]
            .iter()
            .map(|v| row_with("views", *v))
            .collect();
        label_targets(&mut rows, &DEFS);
        // q75 of [0, 0, 0, 0, 5] is 0
        assert!(rows.iter().all(|r| r.target("high_views") == Some(true)));
    }

    #[test]
    fn test_label_targets_composite() {
        let mut rows: Vec<FeatureRow> = (1..=10).map(|v| row_with("views", v as f64)).collect();
        rows[9].set_metric("media", 1.0);
        rows[8].set_metric("media", 1.0);
        label_targets(&mut rows, &DEFS);

        assert!(rows[9].target("viral_with_media").unwrap());
        // has media but below the 90th percentile
        assert!(!rows[8].target("viral_with_media").unwrap());
        assert!(rows[8].target("has_media").unwrap());
    }

    #[test]
    fn test_true_targets_keep_definition_order() {
        let mut rows: Vec<FeatureRow> = (1..=10).map(|v| row_with("views", v as f64)).collect();
        rows[9].set_metric("media", 1.0);
        label_targets(&mut rows, &DEFS);

        let labels: Vec<&str> = rows[9].true_targets().collect();
        assert_eq!(
            labels,
            vec!["high_views", "viral", "has_media", "viral_with_media"]
        );
    }

    // ==========================================================================
    // Row helpers
    // ==========================================================================

    #[test]
    fn test_push_entity_dedupes_and_normalizes() {
        let mut row = FeatureRow::default();
        row.push_entity(Category::Hashtag, "AI");
        row.push_entity(Category::Hashtag, "ai");
        row.push_entity(Category::Hashtag, "   ");
        row.push_entity(Category::Author, "Jane Doe");

        assert_eq!(row.entity_tokens(Category::Hashtag), ["hashtag_ai"]);
        assert_eq!(row.entity_tokens(Category::Author), ["author_jane_doe"]);
        assert!(row.entity_tokens(Category::Music).is_empty());
    }

    #[test]
    fn test_platform_extractors() {
        assert_eq!(Platform::LinkedIn.extractor().platform(), Platform::LinkedIn);
        assert_eq!(Platform::TikTok.extractor().platform(), Platform::TikTok);
        assert_eq!(Platform::TikTok.to_string(), "tiktok");
    }
}
