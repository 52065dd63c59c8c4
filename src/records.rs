//! Raw engagement records as delivered by the scraping clients.
//!
//! Records are kept as untyped JSON so that a missing key, a `null` or a
//! value of the wrong type never fails the pipeline. Field access goes
//! through the lenient helpers below.

use crate::error::MiningError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRecord(Value);

impl RawRecord {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn value(&self) -> &Value {
        &self.0
    }

    /// Walks a dotted path (`"stats.total_reactions"`) through nested objects.
    pub fn get(&self, path: &str) -> Option<&Value> {
        path.split('.')
            .try_fold(&self.0, |current, key| current.get(key))
            .filter(|v| !v.is_null())
    }

    /// String value at `path`, trimmed. Numbers and booleans are stringified.
    pub fn str_at(&self, path: &str) -> Option<String> {
        let text = match self.get(path)? {
            Value::String(s) => s.trim().to_string(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            _ => return None,
        };
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }

    /// Numeric value at `path`. Numeric strings ("1,204" included) are parsed,
    /// anything else yields `None`.
    pub fn f64_at(&self, path: &str) -> Option<f64> {
        let number = match self.get(path)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().replace(',', "").parse::<f64>().ok(),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }?;
        number.is_finite().then_some(number)
    }

    /// Numeric value at `path`, or 0.0 when missing or malformed.
    pub fn metric(&self, path: &str) -> f64 {
        self.f64_at(path).unwrap_or(0.0).max(0.0)
    }

    pub fn bool_at(&self, path: &str) -> Option<bool> {
        match self.get(path)? {
            Value::Bool(b) => Some(*b),
            Value::Number(n) => n.as_f64().map(|v| v != 0.0),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "1" => Some(true),
                "false" | "no" | "0" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    /// Whether `path` holds something non-empty: a non-blank string, a
    /// non-empty array or object, a number or `true`.
    pub fn is_present(&self, path: &str) -> bool {
        match self.get(path) {
            None => false,
            Some(Value::String(s)) => !s.trim().is_empty(),
            Some(Value::Array(a)) => !a.is_empty(),
            Some(Value::Object(o)) => !o.is_empty(),
            Some(Value::Bool(b)) => *b,
            Some(_) => true,
        }
    }
}

impl From<Value> for RawRecord {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// Parses records from either a JSON array or newline-delimited JSON.
pub fn parse_records(content: &str) -> Result<Vec<RawRecord>, MiningError> {
    let trimmed = content.trim_start();
    if trimmed.starts_with('[') {
        let values: Vec<Value> = serde_json::from_str(trimmed)?;
        return Ok(values.into_iter().map(RawRecord::from).collect());
    }

    let mut records = Vec::new();
    for (index, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let value: Value =
            serde_json::from_str(line).map_err(|e| MiningError::InvalidRecord {
                line: index + 1,
                message: e.to_string(),
            })?;
        records.push(RawRecord::from(value));
    }
    Ok(records)
}

pub fn load_records(path: &Path) -> Result<Vec<RawRecord>, MiningError> {
    let content = std::fs::read_to_string(path)?;
    parse_records(&content)
}
