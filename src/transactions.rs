//! Feature rows to transactions (token sets) for itemset mining.

use crate::features::{Category, FeatureRow};
use crate::vocabulary::Vocabulary;

/// Ordered, duplicate-free token set for one record.
pub type Transaction = Vec<String>;

/// Builds one transaction per row: the row's categorical tokens, then up to
/// [`Category::per_record_limit`] entity tokens per category that survived
/// the vocabulary filter, then one token per true target label.
///
/// The per-record limit applies to the row's first tokens before the
/// vocabulary restriction, so a record whose first hashtags are all rare
/// contributes none.
pub fn build_transaction(row: &FeatureRow, vocabulary: &Vocabulary) -> Transaction {
    let mut transaction: Transaction = Vec::with_capacity(row.categorical.len() + 8);
    let mut push = |token: &str| {
        if !transaction.iter().any(|t| t == token) {
            transaction.push(token.to_string());
        }
    };

    for token in &row.categorical {
        push(token.as_str());
    }
    for category in Category::ALL {
        row.entity_tokens(category)
            .iter()
            .take(category.per_record_limit())
            .filter(|token| vocabulary.contains(category, token.as_str()))
            .for_each(|token| push(token.as_str()));
    }
    for label in row.true_targets() {
        push(label);
    }

    transaction
}

pub fn build_transactions(rows: &[FeatureRow], vocabulary: &Vocabulary) -> Vec<Transaction> {
    rows.iter()
        .map(|row| build_transaction(row, vocabulary))
        .collect()
}
