//! JSON report of a mining outcome, written to a flat file.

use crate::config::MiningParams;
use crate::engine::{MiningOutcome, MiningSummary};
use crate::error::MiningError;
use crate::query::Predictor;
use crate::rules::AssociationRule;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

const PREDICTORS_PER_TARGET: usize = 10;

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Success,
    Empty,
    Degraded,
}

/// Serializable view over an outcome. Feature rows and transactions are left
/// out; they are rebuilt from the input whenever needed.
#[derive(Debug, Serialize)]
pub struct MiningReport<'a> {
    pub generated_at: String,
    pub status: ReportStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'a str>,
    pub params: &'a MiningParams,
    pub summary: &'a MiningSummary,
    pub rules: &'a [AssociationRule],
    pub rules_by_target: &'a BTreeMap<String, Vec<AssociationRule>>,
    pub top_predictors: BTreeMap<String, Vec<Predictor>>,
}

impl<'a> MiningReport<'a> {
    pub fn new(outcome: &'a MiningOutcome) -> Self {
        let (status, reason) = match outcome {
            MiningOutcome::Success(_) => (ReportStatus::Success, None),
            MiningOutcome::Empty(_) => (ReportStatus::Empty, None),
            MiningOutcome::Degraded { reason, .. } => {
                (ReportStatus::Degraded, Some(reason.as_str()))
            }
        };
        let result = outcome.result();
        let top_predictors = result
            .target_labels
            .iter()
            .map(|target| {
                (
                    target.clone(),
                    result.top_predictors(target, PREDICTORS_PER_TARGET),
                )
            })
            .filter(|(_, predictors)| !predictors.is_empty())
            .collect();

        Self {
            generated_at: chrono::Utc::now().to_rfc3339(),
            status,
            reason,
            params: &result.params,
            summary: &result.summary,
            rules: &result.rules,
            rules_by_target: &result.rules_by_target,
            top_predictors,
        }
    }

    pub fn to_json(&self) -> Result<String, MiningError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

pub fn write_report(outcome: &MiningOutcome, path: &Path) -> Result<(), MiningError> {
    let report = MiningReport::new(outcome);
    std::fs::write(path, report.to_json()?)?;
    info!(
        "Wrote report with {} rules to {:?}",
        report.rules.len(),
        path
    );
    Ok(())
}
