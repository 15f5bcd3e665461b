//! Per-fact inclusion rule.
//!
//! A fact is kept when its period ends strictly after the threshold date and
//! it was reported on one of the accepted form types.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde_json::Value;

use crate::error::TransformError;
use crate::models::{NormalizedFact, RawFact};

/// Annual and quarterly reports for domestic and foreign filers.
pub const CANONICAL_FORMS: [&str; 4] = ["10-K", "10-Q", "20-F", "6-K"];

/// Domestic-only set used by the first version of the pipeline.
pub const LEGACY_FORMS: [&str; 2] = ["10-K", "10-Q"];

/// Set of accepted filing form types. Matching is exact and case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormSet(BTreeSet<String>);

impl FormSet {
    pub fn new<I, S>(forms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(forms.into_iter().map(Into::into).collect())
    }

    pub fn canonical() -> Self {
        Self::new(CANONICAL_FORMS)
    }

    pub fn legacy() -> Self {
        Self::new(LEGACY_FORMS)
    }

    pub fn contains(&self, form: &str) -> bool {
        self.0.contains(form)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl Default for FormSet {
    fn default() -> Self {
        Self::canonical()
    }
}

/// Parameters of the per-fact rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FactFilter {
    /// Facts must end strictly after this date.
    pub threshold: NaiveDate,
    pub forms: FormSet,
}

impl FactFilter {
    pub fn new(threshold: NaiveDate, forms: FormSet) -> Self {
        Self { threshold, forms }
    }
}

/// Parse an ISO-8601 calendar date (`YYYY-MM-DD`).
pub fn parse_date(concept: &str, value: &str) -> Result<NaiveDate, TransformError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| TransformError::MalformedDate {
        concept: concept.to_string(),
        value: value.to_string(),
    })
}

/// Apply the inclusion rule to one fact.
///
/// Returns `Ok(None)` for facts that are filtered out. A `form` that is not a
/// string is never accepted. `val`, `accn` and `filed` are only required on
/// facts that are kept; `fp` may be null.
pub fn normalize_fact(
    concept: &str,
    fact: &RawFact,
    unit: &str,
    filter: &FactFilter,
) -> Result<Option<NormalizedFact>, TransformError> {
    let end = required_str(concept, "end", &fact.end)?;
    if parse_date(concept, end)? <= filter.threshold {
        return Ok(None);
    }
    let form = match fact.form.as_str() {
        Some(form) if filter.forms.contains(form) => form,
        _ => return Ok(None),
    };

    let val = match &fact.val {
        Value::Number(n) => n.clone(),
        Value::Null => return Err(missing(concept, "val")),
        _ => return Err(wrong_type(concept, "val")),
    };
    let fp = match &fact.fp {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        _ => return Err(wrong_type(concept, "fp")),
    };

    Ok(Some(NormalizedFact {
        end: end.to_string(),
        val,
        form: form.to_string(),
        accn: required_str(concept, "accn", &fact.accn)?.to_string(),
        fp,
        filed: required_str(concept, "filed", &fact.filed)?.to_string(),
        unit: unit.to_string(),
    }))
}

/// Read a string field, treating `null` as missing.
pub(crate) fn required_str<'a>(
    concept: &str,
    field: &'static str,
    value: &'a Value,
) -> Result<&'a str, TransformError> {
    match value {
        Value::String(s) => Ok(s),
        Value::Null => Err(missing(concept, field)),
        _ => Err(wrong_type(concept, field)),
    }
}

fn missing(concept: &str, field: &'static str) -> TransformError {
    TransformError::MissingField {
        field,
        concept: Some(concept.to_string()),
    }
}

fn wrong_type(concept: &str, field: &'static str) -> TransformError {
    TransformError::InvalidField {
        field,
        concept: concept.to_string(),
    }
}
