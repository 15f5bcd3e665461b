//! Document-level transform: taxonomy selection and the keep/drop rule.
//!
//! [`transform_document`] is pure. It never touches the filesystem and the
//! same input with the same [`TransformParams`] always yields the same output.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::TransformError;
use crate::models::{normalize_cik, ConceptBlock, NormalizedDocument, RawDocument};
use crate::normalize::FactFilter;
use crate::reduce::reduce_concept;

pub const IFRS_FULL: &str = "ifrs-full";
pub const US_GAAP: &str = "us-gaap";

/// Which taxonomy namespace to read, in order of preference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaxonomyPreference {
    pub preferred: String,
    pub fallback: String,
}

impl Default for TaxonomyPreference {
    fn default() -> Self {
        Self {
            preferred: IFRS_FULL.to_string(),
            fallback: US_GAAP.to_string(),
        }
    }
}

/// Everything the transform needs besides the document itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformParams {
    pub filter: FactFilter,
    /// A document is kept only when its key count (`cik`, `entityName`,
    /// plus one per surviving concept) is strictly greater than this.
    pub min_keys: usize,
    pub taxonomy: TaxonomyPreference,
}

/// Outcome of transforming one document.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Kept(NormalizedDocument),
    /// Parsed fine but did not carry enough concepts.
    Dropped { cik: String, key_count: usize },
}

/// Transform a raw document, returning `None` when it should be dropped.
pub fn transform_document(
    raw: &RawDocument,
    params: &TransformParams,
) -> Result<Option<NormalizedDocument>, TransformError> {
    match transform_with_outcome(raw, params)? {
        Outcome::Kept(doc) => Ok(Some(doc)),
        Outcome::Dropped { .. } => Ok(None),
    }
}

/// Like [`transform_document`] but reports why a document was dropped.
pub fn transform_with_outcome(
    raw: &RawDocument,
    params: &TransformParams,
) -> Result<Outcome, TransformError> {
    let cik_value = raw.cik.as_ref().ok_or(TransformError::MissingField {
        field: "cik",
        concept: None,
    })?;
    let cik = normalize_cik(cik_value)?;
    let entity_name = raw
        .entity_name
        .clone()
        .ok_or(TransformError::MissingField {
            field: "entityName",
            concept: None,
        })?;

    let concepts = select_taxonomy(&raw.facts, &params.taxonomy)?;
    let mut reduced = BTreeMap::new();
    if let Some(concepts) = concepts {
        for (name, value) in concepts {
            let block = ConceptBlock::deserialize(value)?;
            let facts = reduce_concept(name, &block, &params.filter)?;
            if !facts.is_empty() {
                reduced.insert(name.clone(), facts);
            }
        }
    }

    let doc = NormalizedDocument {
        cik,
        entity_name,
        concepts: reduced,
    };
    if doc.key_count() > params.min_keys {
        Ok(Outcome::Kept(doc))
    } else {
        Ok(Outcome::Dropped {
            key_count: doc.key_count(),
            cik: doc.cik,
        })
    }
}

/// Parse and transform a document from its raw bytes.
pub fn transform_bytes(
    bytes: &[u8],
    params: &TransformParams,
) -> Result<Outcome, TransformError> {
    let raw = RawDocument::from_slice(bytes)?;
    transform_with_outcome(&raw, params)
}

/// Pick the concept table to read.
///
/// The preferred namespace wins when it is present and non-empty; otherwise
/// the fallback is used. `None` means neither is usable.
fn select_taxonomy<'a>(
    facts: &'a Map<String, Value>,
    pref: &TaxonomyPreference,
) -> Result<Option<&'a Map<String, Value>>, TransformError> {
    for name in [&pref.preferred, &pref.fallback] {
        match facts.get(name.as_str()) {
            None | Some(Value::Null) => continue,
            Some(Value::Object(concepts)) if concepts.is_empty() => continue,
            Some(Value::Object(concepts)) => return Ok(Some(concepts)),
            Some(_) => return Err(TransformError::TaxonomyShape(name.clone())),
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::FormSet;
    use chrono::NaiveDate;
    use serde_json::json;

    fn params(threshold: &str) -> TransformParams {
        TransformParams {
            filter: FactFilter::new(
                NaiveDate::parse_from_str(threshold, "%Y-%m-%d").unwrap(),
                FormSet::legacy(),
            ),
            min_keys: 2,
            taxonomy: TaxonomyPreference::default(),
        }
    }

    fn fact(end: &str, val: i64, form: &str) -> Value {
        json!({
            "end": end, "val": val, "form": form,
            "accn": "0000320193-21-000010", "fp": "Q1", "filed": "2021-08-01"
        })
    }

    fn scenario_doc() -> RawDocument {
        serde_json::from_value(json!({
            "cik": "320193",
            "entityName": "Apple Inc.",
            "facts": { "us-gaap": { "Assets": { "label": "Assets", "units": { "USD": [
                fact("2020-01-01", 100, "10-K"),
                fact("2020-01-01", 200, "10-Q"),
                fact("2021-06-30", 300, "10-K"),
            ]}}}}
        }))
        .unwrap()
    }

    #[test]
    fn test_scenario_keeps_first_and_later_fact() {
        let doc = transform_document(&scenario_doc(), &params("2019-12-31"))
            .unwrap()
            .expect("document should be kept");
        assert_eq!(doc.cik, "0000320193");
        assert_eq!(doc.entity_name, "Apple Inc.");
        assert_eq!(doc.key_count(), 3);
        let assets = &doc.concepts["Assets"];
        assert_eq!(assets.len(), 2);
        assert_eq!(assets[0].val.as_i64(), Some(100));
        assert_eq!(assets[0].end, "2020-01-01");
        assert_eq!(assets[1].val.as_i64(), Some(300));
        assert_eq!(assets[1].end, "2021-06-30");
    }

    #[test]
    fn test_scenario_late_threshold_drops_document() {
        let out = transform_with_outcome(&scenario_doc(), &params("2022-01-01")).unwrap();
        assert_eq!(
            out,
            Outcome::Dropped {
                cik: "0000320193".to_string(),
                key_count: 2
            }
        );
        assert!(transform_document(&scenario_doc(), &params("2022-01-01"))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_missing_taxonomies_always_dropped() {
        let raw: RawDocument = serde_json::from_value(json!({
            "cik": 1750, "entityName": "AAR CORP", "facts": { "dei": {} }
        }))
        .unwrap();
        for threshold in ["1900-01-01", "2019-12-31", "2100-01-01"] {
            assert!(transform_document(&raw, &params(threshold)).unwrap().is_none());
        }
    }

    #[test]
    fn test_empty_concepts_are_omitted() {
        let raw: RawDocument = serde_json::from_value(json!({
            "cik": "1", "entityName": "X",
            "facts": { "us-gaap": {
                "Assets": { "units": { "USD": [fact("2021-06-30", 1, "10-K")] } },
                "Liabilities": { "units": { "USD": [fact("2015-06-30", 1, "10-K")] } },
            }}
        }))
        .unwrap();
        let doc = transform_document(&raw, &params("2019-12-31")).unwrap().unwrap();
        assert!(doc.concepts.contains_key("Assets"));
        assert!(!doc.concepts.contains_key("Liabilities"));
    }

    #[test]
    fn test_prefers_ifrs_over_us_gaap() {
        let raw: RawDocument = serde_json::from_value(json!({
            "cik": "2", "entityName": "Foreign Filer",
            "facts": {
                "us-gaap": { "Assets": { "units": { "USD": [fact("2021-06-30", 1, "10-K")] } } },
                "ifrs-full": { "Revenue": { "units": { "EUR": [fact("2021-06-30", 2, "10-K")] } } },
            }
        }))
        .unwrap();
        let doc = transform_document(&raw, &params("2019-12-31")).unwrap().unwrap();
        assert!(doc.concepts.contains_key("Revenue"));
        assert!(!doc.concepts.contains_key("Assets"));
        assert_eq!(doc.concepts["Revenue"][0].unit, "EUR");
    }

    #[test]
    fn test_empty_preferred_falls_back() {
        let raw: RawDocument = serde_json::from_value(json!({
            "cik": "3", "entityName": "Y",
            "facts": {
                "ifrs-full": {},
                "us-gaap": { "Assets": { "units": { "USD": [fact("2021-06-30", 1, "10-K")] } } },
            }
        }))
        .unwrap();
        let doc = transform_document(&raw, &params("2019-12-31")).unwrap().unwrap();
        assert!(doc.concepts.contains_key("Assets"));
    }

    #[test]
    fn test_min_keys_is_configurable() {
        let mut p = params("2019-12-31");
        p.min_keys = 3;
        assert!(transform_document(&scenario_doc(), &p).unwrap().is_none());
        p.min_keys = 0;
        assert!(transform_document(&scenario_doc(), &p).unwrap().is_some());
    }

    #[test]
    fn test_missing_identity_fields_are_errors() {
        let raw: RawDocument =
            serde_json::from_value(json!({ "entityName": "Z", "facts": {} })).unwrap();
        let err = transform_document(&raw, &params("2019-12-31")).unwrap_err();
        assert!(matches!(err, TransformError::MissingField { field: "cik", .. }));

        let raw: RawDocument = serde_json::from_value(json!({ "cik": "4", "facts": {} })).unwrap();
        let err = transform_document(&raw, &params("2019-12-31")).unwrap_err();
        assert!(matches!(
            err,
            TransformError::MissingField { field: "entityName", .. }
        ));
    }

    #[test]
    fn test_non_object_taxonomy_is_an_error() {
        let raw: RawDocument = serde_json::from_value(json!({
            "cik": "5", "entityName": "W", "facts": { "ifrs-full": [1, 2, 3] }
        }))
        .unwrap();
        let err = transform_document(&raw, &params("2019-12-31")).unwrap_err();
        assert!(matches!(err, TransformError::TaxonomyShape(_)));
    }

    #[test]
    fn test_malformed_json_bytes() {
        let err = transform_bytes(b"{ not json", &params("2019-12-31")).unwrap_err();
        assert!(matches!(err, TransformError::Malformed(_)));
    }

    #[test]
    fn test_deterministic() {
        let p = params("2019-12-31");
        let a = transform_document(&scenario_doc(), &p).unwrap();
        let b = transform_document(&scenario_doc(), &p).unwrap();
        assert_eq!(a, b);
        assert_eq!(
            a.unwrap().to_json().unwrap(),
            b.unwrap().to_json().unwrap()
        );
    }

    #[test]
    fn test_odd_fields_do_not_sink_other_concepts() {
        let raw: RawDocument = serde_json::from_value(json!({
            "cik": "320193",
            "entityName": "Apple Inc.",
            "facts": { "us-gaap": {
                "Assets": { "units": { "USD": [fact("2021-06-30", 300, "10-K")] } },
                "Odd": { "units": { "USD": [
                    {"end": "2010-03-31", "val": 1, "form": "8-K", "fp": 3},
                    {"end": "2021-06-30", "val": 2, "form": "10-Q",
                     "accn": "0000320193-21-000010", "fp": null, "filed": "2021-08-01"}
                ]}}
            }}
        }))
        .unwrap();

        let doc = transform_document(&raw, &params("2019-12-31"))
            .unwrap()
            .expect("document should be kept");
        assert_eq!(doc.concepts["Assets"].len(), 1);
        assert_eq!(doc.concepts["Odd"][0].fp, None);
        assert_eq!(doc.concepts["Odd"][0].val.as_i64(), Some(2));
    }
}
