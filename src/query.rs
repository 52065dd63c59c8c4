//! Lookups over an already computed rule list. Nothing here mines.

use crate::rules::AssociationRule;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Rules whose consequent is exactly `targets` (as a set) and whose
/// antecedent mentions no known target label, in rule-list order, at most
/// `top_n` of them.
pub fn rules_for_targets<'a>(
    rules: &'a [AssociationRule],
    known_targets: &[String],
    targets: &[String],
    top_n: usize,
) -> Vec<&'a AssociationRule> {
    let wanted: BTreeSet<&str> = targets.iter().map(|t| t.as_str()).collect();
    if wanted.is_empty() {
        return Vec::new();
    }
    let known: BTreeSet<&str> = known_targets.iter().map(|t| t.as_str()).collect();

    rules
        .iter()
        .filter(|rule| {
            rule.consequent.len() == wanted.len()
                && rule.consequent.iter().all(|c| wanted.contains(c.as_str()))
        })
        .filter(|rule| !rule.antecedent.iter().any(|a| known.contains(a.as_str())))
        .take(top_n)
        .collect()
}

/// For every known label, the rules predicting that label alone.
pub fn index_by_target(
    rules: &[AssociationRule],
    known_targets: &[String],
) -> BTreeMap<String, Vec<AssociationRule>> {
    known_targets
        .iter()
        .map(|target| {
            let matching = rules_for_targets(rules, known_targets, std::slice::from_ref(target), usize::MAX)
                .into_iter()
                .cloned()
                .collect();
            (target.clone(), matching)
        })
        .collect()
}

/// An antecedent token and how strongly it predicts a target.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Predictor {
    pub token: String,
    /// Number of target rules whose antecedent contains the token.
    pub rule_count: usize,
    pub best_confidence: f64,
    pub best_lift: f64,
}

/// Antecedent tokens of the rules predicting `target`, ranked by the number
/// of rules they appear in, then by best confidence. Ties keep first
/// appearance in rule order.
pub fn top_predictors(
    rules: &[AssociationRule],
    known_targets: &[String],
    target: &str,
    top_n: usize,
) -> Vec<Predictor> {
    let mut by_token: HashMap<&str, usize> = HashMap::new();
    let mut predictors: Vec<Predictor> = Vec::new();

    for rule in rules_for_targets(rules, known_targets, &[target.to_string()], usize::MAX) {
        for token in &rule.antecedent {
            let index = *by_token.entry(token.as_str()).or_insert_with(|| {
                predictors.push(Predictor {
                    token: token.clone(),
                    rule_count: 0,
                    best_confidence: 0.0,
                    best_lift: 0.0,
                });
                predictors.len() - 1
            });
            let predictor = &mut predictors[index];
            predictor.rule_count += 1;
            predictor.best_confidence = predictor.best_confidence.max(rule.confidence);
            predictor.best_lift = predictor.best_lift.max(rule.lift);
        }
    }

    predictors.sort_by(|a, b| {
        b.rule_count
            .cmp(&a.rule_count)
            .then(b.best_confidence.total_cmp(&a.best_confidence))
    });
    predictors.truncate(top_n);
    predictors
}
