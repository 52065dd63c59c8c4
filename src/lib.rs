//! Engagement pattern miner.
//!
//! Turns social media engagement records into transactions and mines
//! association rules that predict high-engagement outcomes.

pub mod advisor;
pub mod config;
pub mod engine;
pub mod error;
pub mod features;
pub mod mining;
pub mod query;
pub mod records;
pub mod report;
pub mod rules;
pub mod transactions;
pub mod vocabulary;

// Re-export commonly used types for convenience
pub use advisor::recommend_params;
pub use config::{resolve_params, CliOverrides, FileConfig, MiningParams};
pub use engine::{get_rules_for_targets, mine, mine_batches, Engine, MiningOutcome, MiningResult};
pub use error::MiningError;
pub use features::{FeatureExtractor, Platform};
pub use mining::{AprioriMiner, ItemsetMiner};
pub use records::{load_records, parse_records, RawRecord};
pub use rules::AssociationRule;
