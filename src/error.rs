//! Error types for the transform pipeline and source acquisition.
//!
//! Per-document failures are [`TransformError`]s: the batch driver records
//! them against the file name and moves on. [`AcquireError`] is fatal for the
//! command that raised it.

use std::path::PathBuf;

use thiserror::Error;

/// A raw document could not be turned into a normalized one.
#[derive(Error, Debug)]
pub enum TransformError {
    /// The document is not valid JSON or does not have the company-facts shape.
    #[error("malformed document: {0}")]
    Malformed(#[from] serde_json::Error),

    /// A required field is absent.
    #[error("missing field `{field}`{}", concept_suffix(.concept))]
    MissingField {
        field: &'static str,
        concept: Option<String>,
    },

    /// A field the normalizer needs holds the wrong JSON type.
    #[error("field `{field}` has the wrong type in concept `{concept}`")]
    InvalidField {
        field: &'static str,
        concept: String,
    },

    /// A date field is not an ISO-8601 calendar date.
    #[error("malformed date {value:?} in concept `{concept}`")]
    MalformedDate { concept: String, value: String },

    /// A taxonomy namespace is present but is not an object.
    #[error("taxonomy `{0}` is not an object")]
    TaxonomyShape(String),

    /// A concept block is not `{ "units": { ... } }`.
    #[error("concept `{0}` has no units")]
    NoUnits(String),

    /// The `cik` field is neither a digit string nor a non-negative integer.
    #[error("invalid cik {0:?}")]
    InvalidCik(String),
}

fn concept_suffix(concept: &Option<String>) -> String {
    match concept {
        Some(c) => format!(" in concept `{}`", c),
        None => String::new(),
    }
}

/// Downloading or unpacking the bulk archive failed.
#[derive(Error, Debug)]
pub enum AcquireError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("archive entry has an unsafe path: {0}")]
    UnsafeEntry(String),

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl AcquireError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AcquireError::Io {
            path: path.into(),
            source,
        }
    }
}
