//! Per-concept reduction: unit selection, de-duplication, filtering.

use std::collections::HashSet;

use serde::Deserialize;

use crate::error::TransformError;
use crate::models::{ConceptBlock, NormalizedFact, RawFact};
use crate::normalize::{normalize_fact, required_str, FactFilter};

/// Reduce one concept's raw facts to the ordered list that survives.
///
/// Only the first unit is read. Facts are de-duplicated by period end on
/// first occurrence: once an `end` date has been seen, every later fact with
/// the same date is skipped, whether or not the first one passed the filter.
pub fn reduce_concept(
    concept: &str,
    block: &ConceptBlock,
    filter: &FactFilter,
) -> Result<Vec<NormalizedFact>, TransformError> {
    let (unit, raw_facts) = block
        .first_unit()
        .ok_or_else(|| TransformError::NoUnits(concept.to_string()))?;
    let facts = Vec::<RawFact>::deserialize(raw_facts)?;

    let mut seen_ends: HashSet<&str> = HashSet::with_capacity(facts.len());
    let mut kept = Vec::new();

    for fact in &facts {
        let end = required_str(concept, "end", &fact.end)?;
        if !seen_ends.insert(end) {
            continue;
        }
        if let Some(normalized) = normalize_fact(concept, fact, unit, filter)? {
            kept.push(normalized);
        }
    }

    Ok(kept)
}
