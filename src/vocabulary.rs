//! Vocabulary filter for high-cardinality token families.
//!
//! Unbounded author/hashtag/mention/music vocabularies make the itemset
//! search intractable, so each category is reduced to the tokens that are
//! both frequent enough and among the most frequent of their category.

use crate::features::{Category, FeatureRow};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::debug;

/// Token with its row frequency, as retained by the filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VocabularyEntry {
    pub token: String,
    pub count: usize,
}

/// Retained tokens per category, ranked by frequency.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Vocabulary {
    entries: BTreeMap<Category, Vec<VocabularyEntry>>,
    #[serde(skip)]
    lookup: HashMap<Category, HashSet<String>>,
}

impl Vocabulary {
    /// Counts each category's tokens across rows (once per row), keeps those
    /// seen in at least `min_frequency` rows, then truncates to the
    /// `max_per_category` most frequent. Ties keep first-seen order.
    pub fn fit(rows: &[FeatureRow], min_frequency: usize, max_per_category: usize) -> Self {
        let mut vocabulary = Vocabulary::default();

        for category in Category::ALL {
            // token -> (count, first seen position)
            let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();
            let mut next_position = 0usize;
            for row in rows {
                for token in row.entity_tokens(category) {
                    let entry = counts.entry(token.as_str()).or_insert_with(|| {
                        next_position += 1;
                        (0, next_position)
                    });
                    entry.0 += 1;
                }
            }
            if counts.is_empty() {
                continue;
            }

            let observed = counts.len();
            let mut ranked: Vec<(&str, usize, usize)> = counts
                .into_iter()
                .filter(|(_, (count, _))| *count >= min_frequency)
                .map(|(token, (count, first_seen))| (token, count, first_seen))
                .collect();
            ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));
            ranked.truncate(max_per_category);

            debug!(
                "Vocabulary {:?}: {} observed, {} retained",
                category,
                observed,
                ranked.len()
            );

            let entries: Vec<VocabularyEntry> = ranked
                .into_iter()
                .map(|(token, count, _)| VocabularyEntry {
                    token: token.to_string(),
                    count,
                })
                .collect();
            vocabulary.lookup.insert(
                category,
                entries.iter().map(|e| e.token.clone()).collect(),
            );
            vocabulary.entries.insert(category, entries);
        }

        vocabulary
    }

    pub fn contains(&self, category: Category, token: &str) -> bool {
        self.lookup
            .get(&category)
            .is_some_and(|tokens| tokens.contains(token))
    }

    pub fn entries(&self, category: Category) -> &[VocabularyEntry] {
        self.entries
            .get(&category)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Number of retained tokens per category, for reporting.
    pub fn sizes(&self) -> BTreeMap<Category, usize> {
        Category::ALL
            .iter()
            .map(|c| (*c, self.entries(*c).len()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row_with_hashtags(tags: &[&str]) -> FeatureRow {
        let mut row = FeatureRow::default();
        for tag in tags {
            row.push_entity(Category::Hashtag, tag);
        }
        row
    }

    fn tokens(vocabulary: &Vocabulary, category: Category) -> Vec<&str> {
        vocabulary
            .entries(category)
            .iter()
            .map(|e| e.token.as_str())
            .collect()
    }

    #[test]
    fn test_min_frequency_filters_rare_tokens() {
        let rows = vec![
            row_with_hashtags(&["rust", "ai"]),
            row_with_hashtags(&["rust"]),
            row_with_hashtags(&["rust", "go"]),
            row_with_hashtags(&["ai"]),
        ];
        let vocabulary = Vocabulary::fit(&rows, 2, 10);

        assert_eq!(
            tokens(&vocabulary, Category::Hashtag),
            vec!["hashtag_rust", "hashtag_ai"]
        );
        assert!(vocabulary.contains(Category::Hashtag, "hashtag_ai"));
        assert!(!vocabulary.contains(Category::Hashtag, "hashtag_go"));
        assert_eq!(vocabulary.entries(Category::Hashtag)[0].count, 3);
    }

    #[test]
    fn test_cap_keeps_most_frequent() {
        let rows = vec![
            row_with_hashtags(&["a", "b", "c"]),
            row_with_hashtags(&["b", "c"]),
            row_with_hashtags(&["c"]),
        ];
        let vocabulary = Vocabulary::fit(&rows, 1, 2);
        assert_eq!(
            tokens(&vocabulary, Category::Hashtag),
            vec!["hashtag_c", "hashtag_b"]
        );
    }

    #[test]
    fn test_ties_keep_first_seen_order() {
        let rows = vec![
            row_with_hashtags(&["zeta", "alpha"]),
            row_with_hashtags(&["mid"]),
            row_with_hashtags(&["alpha", "zeta", "mid"]),
        ];
        let vocabulary = Vocabulary::fit(&rows, 1, 2);
        assert_eq!(
            tokens(&vocabulary, Category::Hashtag),
            vec!["hashtag_zeta", "hashtag_alpha"]
        );
    }

    #[test]
    fn test_categories_are_independent() {
        let mut row = row_with_hashtags(&["rust"]);
        row.push_entity(Category::Author, "Jane");
        let rows = vec![row.clone(), row];
        let vocabulary = Vocabulary::fit(&rows, 2, 5);

        assert!(vocabulary.contains(Category::Author, "author_jane"));
        assert!(!vocabulary.contains(Category::Hashtag, "author_jane"));
        assert!(vocabulary.entries(Category::Music).is_empty());

        let sizes = vocabulary.sizes();
        assert_eq!(sizes[&Category::Author], 1);
        assert_eq!(sizes[&Category::Hashtag], 1);
        assert_eq!(sizes[&Category::Mention], 0);
    }

    #[test]
    fn test_empty_rows() {
        let vocabulary = Vocabulary::fit(&[], 1, 5);
        assert!(Category::ALL
            .iter()
            .all(|c| vocabulary.entries(*c).is_empty()));
    }
}
