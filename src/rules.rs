//! Association rules derived from frequent itemsets.

use crate::mining::{FrequentItemset, MAX_ITEMSET_LENGTH};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::{debug, info, warn};

const THRESHOLD_EPSILON: f64 = 1e-12;

/// `antecedent => consequent`, both taken from one frequent itemset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssociationRule {
    pub antecedent: Vec<String>,
    pub consequent: Vec<String>,
    /// Support of the whole itemset.
    pub support: f64,
    pub confidence: f64,
    pub lift: f64,
    /// Human readable form, e.g. `{few_hashtags, weekday} => {viral}`.
    pub rule: String,
    pub num_antecedents: usize,
}

impl AssociationRule {
    pub fn new(
        antecedent: Vec<String>,
        consequent: Vec<String>,
        support: f64,
        confidence: f64,
        lift: f64,
    ) -> Self {
        let rule = format!(
            "{{{}}} => {{{}}}",
            antecedent.join(", "),
            consequent.join(", ")
        );
        let num_antecedents = antecedent.len();
        Self {
            antecedent,
            consequent,
            support,
            confidence,
            lift,
            rule,
            num_antecedents,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RuleLimits {
    pub min_confidence: f64,
    pub min_lift: f64,
    pub max_rules: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleGeneration {
    pub rules: Vec<AssociationRule>,
    /// Rules meeting both thresholds, before the cap.
    pub rules_found: usize,
    /// Partitions that could not be scored because the support of one side
    /// was not among the itemsets.
    pub skipped_partitions: usize,
}

/// Ordering contract of rule lists: confidence descending, then more
/// specific (longer) antecedents first. Further ties keep generation order.
pub fn rule_order(a: &AssociationRule, b: &AssociationRule) -> Ordering {
    b.confidence
        .total_cmp(&a.confidence)
        .then(b.antecedent.len().cmp(&a.antecedent.len()))
}

/// Enumerates every non-trivial antecedent/consequent split of each itemset
/// with at least two items and keeps the rules meeting both thresholds. When
/// more than `max_rules` qualify, the most confident are kept. Itemsets longer
/// than [`MAX_ITEMSET_LENGTH`] are ignored.
pub fn generate_rules(itemsets: &[FrequentItemset], limits: &RuleLimits) -> RuleGeneration {
    let supports: HashMap<&[String], f64> = itemsets
        .iter()
        .map(|i| (i.items.as_slice(), i.support))
        .collect();

    let mut rules = Vec::new();
    let mut skipped_partitions = 0usize;

    let oversized = itemsets
        .iter()
        .filter(|i| i.len() > MAX_ITEMSET_LENGTH)
        .count();
    if oversized > 0 {
        warn!(
            "Ignoring {} itemsets longer than {} items",
            oversized, MAX_ITEMSET_LENGTH
        );
    }

    for itemset in itemsets
        .iter()
        .filter(|i| i.len() >= 2 && i.len() <= MAX_ITEMSET_LENGTH)
    {
        let n = itemset.len();
        for mask in 1..(1u32 << n) - 1 {
            let (antecedent, consequent): (Vec<_>, Vec<_>) = itemset
                .items
                .iter()
                .enumerate()
                .partition(|(index, _)| mask & (1 << index) != 0);
            let antecedent: Vec<String> = antecedent.into_iter().map(|(_, t)| t.clone()).collect();
            let consequent: Vec<String> = consequent.into_iter().map(|(_, t)| t.clone()).collect();

            let (Some(antecedent_support), Some(consequent_support)) = (
                supports.get(antecedent.as_slice()),
                supports.get(consequent.as_slice()),
            ) else {
                skipped_partitions += 1;
                continue;
            };
            if *antecedent_support <= 0.0 || *consequent_support <= 0.0 {
                skipped_partitions += 1;
                continue;
            }

            let confidence = (itemset.support / antecedent_support).min(1.0);
            let lift = confidence / consequent_support;
            if confidence + THRESHOLD_EPSILON >= limits.min_confidence
                && lift + THRESHOLD_EPSILON >= limits.min_lift
            {
                rules.push(AssociationRule::new(
                    antecedent,
                    consequent,
                    itemset.support,
                    confidence,
                    lift,
                ));
            }
        }
    }

    let rules_found = rules.len();
    if rules.len() > limits.max_rules {
        info!(
            "Rule cap reached: keeping {} of {} rules",
            limits.max_rules, rules_found
        );
        rules.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        rules.truncate(limits.max_rules);
    }
    rules.sort_by(rule_order);

    if skipped_partitions > 0 {
        debug!(
            "{} rule partitions skipped for missing supports",
            skipped_partitions
        );
    }

    RuleGeneration {
        rules,
        rules_found,
        skipped_partitions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mining::{AprioriMiner, ItemsetMiner, TransactionMatrix};
    use crate::transactions::Transaction;

    fn tx(tokens: &[&str]) -> Transaction {
        tokens.iter().map(|t| t.to_string()).collect()
    }

    fn itemset(items: &[&str], support: f64) -> FrequentItemset {
        FrequentItemset::new(
            items.iter().map(|s| s.to_string()).collect(),
            0,
            support,
        )
    }

    fn open_limits() -> RuleLimits {
        RuleLimits {
            min_confidence: 0.0,
            min_lift: 0.0,
            max_rules: 10_000,
        }
    }

    fn scenario_a() -> Vec<Transaction> {
        vec![
            tx(&["weekday", "few_hashtags", "viral"]),
            tx(&["weekday", "few_hashtags", "viral"]),
            tx(&["weekend", "many_hashtags"]),
            tx(&["weekend", "many_hashtags"]),
        ]
    }

    // ==========================================================================
    // Scenario tests
    // ==========================================================================

    #[test]
    fn test_scenario_weekday_few_hashtags_predicts_viral() {
        let matrix = TransactionMatrix::encode(&scenario_a());
        let itemsets = AprioriMiner.mine(&matrix, 0.5, 3);
        let generation = generate_rules(
            &itemsets,
            &RuleLimits {
                min_confidence: 0.5,
                min_lift: 1.0,
                max_rules: 100,
            },
        );

        let rule = generation
            .rules
            .iter()
            .find(|r| r.antecedent == ["few_hashtags", "weekday"] && r.consequent == ["viral"])
            .expect("rule should be generated");
        assert!((rule.support - 0.5).abs() < 1e-12);
        assert!((rule.confidence - 1.0).abs() < 1e-12);
        assert!((rule.lift - 2.0).abs() < 1e-12);
        assert_eq!(rule.num_antecedents, 2);
        assert_eq!(rule.rule, "{few_hashtags, weekday} => {viral}");
        assert_eq!(generation.skipped_partitions, 0);
    }

    // ==========================================================================
    // Property tests
    // ==========================================================================

    #[test]
    fn test_rule_invariants() {
        let transactions = vec![
            tx(&["a", "b", "c"]),
            tx(&["a", "b"]),
            tx(&["a", "c"]),
            tx(&["b", "c"]),
            tx(&["a", "b", "c"]),
            tx(&["c"]),
        ];
        let matrix = TransactionMatrix::encode(&transactions);
        let itemsets = AprioriMiner.mine(&matrix, 0.1, 3);
        let supports: HashMap<Vec<String>, f64> = itemsets
            .iter()
            .map(|i| (i.items.clone(), i.support))
            .collect();
        let generation = generate_rules(&itemsets, &open_limits());

        assert!(!generation.rules.is_empty());
        for rule in &generation.rules {
            assert!(rule.antecedent.iter().all(|t| !rule.consequent.contains(t)));
            assert!((0.0..=1.0).contains(&rule.support));
            assert!((0.0..=1.0).contains(&rule.confidence));
            assert!(rule.lift >= 0.0);

            let mut union = rule.antecedent.clone();
            union.extend(rule.consequent.iter().cloned());
            union.sort();
            let expected = supports[&union] / supports[&rule.antecedent];
            assert!((rule.confidence - expected).abs() < 1e-9);
            assert!((rule.lift - rule.confidence / supports[&rule.consequent]).abs() < 1e-9);
        }
    }

    #[test]
    fn test_partitions_per_itemset() {
        let itemsets = vec![
            itemset(&["a"], 0.5),
            itemset(&["b"], 0.5),
            itemset(&["c"], 0.5),
            itemset(&["a", "b"], 0.5),
            itemset(&["a", "c"], 0.5),
            itemset(&["b", "c"], 0.5),
            itemset(&["a", "b", "c"], 0.5),
        ];
        let generation = generate_rules(&itemsets, &open_limits());
        // 3 pairs x 2 + 1 triple x 6
        assert_eq!(generation.rules.len(), 12);
    }

    #[test]
    fn test_ordering_confidence_then_specificity() {
        let itemsets = vec![
            itemset(&["a"], 0.5),
            itemset(&["b"], 0.5),
            itemset(&["t"], 0.4),
            itemset(&["a", "t"], 0.4),
            itemset(&["a", "b"], 0.5),
            itemset(&["a", "b", "t"], 0.4),
        ];
        let generation = generate_rules(&itemsets, &open_limits());
        let rules = &generation.rules;

        assert!(rules.windows(2).all(|w| rule_order(&w[0], &w[1]) != Ordering::Greater));
        // {a, b} => {t} and {a} => {t} share confidence 0.8; the longer one comes first
        let pos_ab = rules
            .iter()
            .position(|r| r.antecedent == ["a", "b"] && r.consequent == ["t"])
            .unwrap();
        let pos_a = rules
            .iter()
            .position(|r| r.antecedent == ["a"] && r.consequent == ["t"])
            .unwrap();
        assert!(pos_ab < pos_a);
    }

    #[test]
    fn test_thresholds_filter() {
        let itemsets = vec![
            itemset(&["a"], 0.8),
            itemset(&["b"], 0.5),
            itemset(&["a", "b"], 0.4),
        ];
        // a => b: conf 0.5, lift 1.0; b => a: conf 0.8, lift 1.0
        let generation = generate_rules(
            &itemsets,
            &RuleLimits {
                min_confidence: 0.6,
                min_lift: 1.0,
                max_rules: 10,
            },
        );
        assert_eq!(generation.rules.len(), 1);
        assert_eq!(generation.rules[0].antecedent, ["b"]);

        let strict_lift = generate_rules(
            &itemsets,
            &RuleLimits {
                min_confidence: 0.0,
                min_lift: 1.1,
                max_rules: 10,
            },
        );
        assert!(strict_lift.rules.is_empty());
    }

    #[test]
    fn test_rule_cap_keeps_most_confident() {
        let itemsets = vec![
            itemset(&["a"], 0.8),
            itemset(&["b"], 0.5),
            itemset(&["a", "b"], 0.4),
        ];
        let generation = generate_rules(
            &itemsets,
            &RuleLimits {
                min_confidence: 0.0,
                min_lift: 0.0,
                max_rules: 1,
            },
        );
        assert_eq!(generation.rules_found, 2);
        assert_eq!(generation.rules.len(), 1);
        assert!((generation.rules[0].confidence - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_missing_subset_support_is_skipped() {
        let itemsets = vec![itemset(&["a"], 0.6), itemset(&["a", "b"], 0.5)];
        let generation = generate_rules(&itemsets, &open_limits());

        // b => a cannot be scored without support(b), and a => b lacks it as consequent
        assert!(generation.rules.is_empty());
        assert_eq!(generation.skipped_partitions, 2);
    }

    #[test]
    fn test_oversized_itemsets_are_ignored() {
        let names: Vec<String> = (0..40).map(|i| format!("t{:02}", i)).collect();
        let mut itemsets: Vec<FrequentItemset> = names
            .iter()
            .map(|n| itemset(&[n.as_str()], 0.5))
            .collect();
        itemsets.push(itemset(&["t00", "t01"], 0.5));
        itemsets.push(FrequentItemset::new(names.clone(), 0, 0.5));

        let generation = generate_rules(&itemsets, &open_limits());
        assert_eq!(generation.rules.len(), 2);
        assert!(generation.rules.iter().all(|r| r.antecedent.len() == 1));
        assert_eq!(generation.skipped_partitions, 0);
    }

    #[test]
    fn test_no_itemsets_no_rules() {
        let generation = generate_rules(&[], &open_limits());
        assert!(generation.rules.is_empty());
        assert_eq!(generation.rules_found, 0);
    }
}
