//! Core data models for the company-facts pipeline.
//!
//! Raw types mirror the bulk archive's per-filer JSON files. Normalized types
//! are what the transform emits and what the stores persist.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use crate::error::TransformError;

/// Width of a zero-padded CIK.
pub const CIK_WIDTH: usize = 10;

/// One filer's document as found in the bulk archive.
///
/// `cik` is kept as a raw JSON value because the archive has shipped it both
/// as a string and as a number. `facts` maps taxonomy names (`us-gaap`,
/// `ifrs-full`, `dei`, ...) to concept tables; which one is consulted is
/// decided by the transform.
#[derive(Debug, Clone, Deserialize)]
pub struct RawDocument {
    #[serde(default)]
    pub cik: Option<Value>,
    #[serde(rename = "entityName", default)]
    pub entity_name: Option<String>,
    #[serde(default)]
    pub facts: Map<String, Value>,
}

impl RawDocument {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, TransformError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// A concept's facts grouped by unit of measure (`USD`, `shares`, `EUR`, ...).
///
/// Unit keys keep their source order.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConceptBlock {
    #[serde(default)]
    pub units: Map<String, Value>,
}

impl ConceptBlock {
    /// The first unit key and its raw fact list. Later units are ignored.
    pub fn first_unit(&self) -> Option<(&str, &Value)> {
        self.units.iter().next().map(|(k, v)| (k.as_str(), v))
    }
}

/// A single reported value as it appears in the archive.
///
/// Fields are held as raw JSON and absent ones read as `null`. Only `end` is
/// checked on every fact; the rest are typed by the normalizer, and only for
/// facts it keeps, so a stray value on a discarded row is harmless.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct RawFact {
    #[serde(default)]
    pub end: Value,
    #[serde(default)]
    pub val: Value,
    #[serde(default)]
    pub form: Value,
    #[serde(default)]
    pub accn: Value,
    #[serde(default)]
    pub fp: Value,
    #[serde(default)]
    pub filed: Value,
}

/// A fact that survived filtering, tagged with its unit.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct NormalizedFact {
    pub end: String,
    pub val: Number,
    pub form: String,
    pub accn: String,
    /// Fiscal period (`FY`, `Q1`, ...). Some older filings leave it null.
    pub fp: Option<String>,
    pub filed: String,
    pub unit: String,
}

/// The transformed, flattened form of a filer's document.
///
/// Serializes as `{"cik": ..., "entityName": ..., "<Concept>": [...], ...}`.
/// Concepts are keyed in sorted order so output is byte-stable.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct NormalizedDocument {
    pub cik: String,
    #[serde(rename = "entityName")]
    pub entity_name: String,
    #[serde(flatten)]
    pub concepts: BTreeMap<String, Vec<NormalizedFact>>,
}

impl NormalizedDocument {
    /// Number of top-level keys in the serialized form.
    pub fn key_count(&self) -> usize {
        2 + self.concepts.len()
    }

    pub fn fact_count(&self) -> usize {
        self.concepts.values().map(Vec::len).sum()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }
}

/// Left-pad a CIK with zeros to [`CIK_WIDTH`] characters.
///
/// Inputs already at or beyond the width are returned unchanged.
pub fn pad_cik(raw: &str) -> String {
    format!("{:0>width$}", raw, width = CIK_WIDTH)
}

/// Read a CIK from its raw JSON value and pad it.
pub fn normalize_cik(value: &Value) -> Result<String, TransformError> {
    let raw = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) if n.is_u64() => n.to_string(),
        other => return Err(TransformError::InvalidCik(other.to_string())),
    };
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(TransformError::InvalidCik(raw));
    }
    Ok(pad_cik(&raw))
}
