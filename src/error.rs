//! Error types for the mining pipeline.
//!
//! Malformed record fields never show up here: extractors recover from them
//! locally by falling back to `unknown` buckets. Empty or partial mining
//! outcomes are not errors either, see [`crate::engine::MiningOutcome`].

use thiserror::Error;

/// Errors that can abort a mining invocation or its surrounding I/O.
#[derive(Debug, Error)]
pub enum MiningError {
    /// Parameters were rejected before any record was processed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid record at line {line}: {message}")]
    InvalidRecord { line: usize, message: String },
}
