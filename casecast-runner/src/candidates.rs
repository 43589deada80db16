//! Candidate regressor discovery.

use casecast_core::data::oxcgrt::{IDENTIFIER_COLUMNS, OUTCOME_COLUMNS};
use casecast_core::data::Dataset;

/// Whether `column` can never be a regressor: the date, the target, any
/// outcome derived from it, or a row identifier.
pub fn is_excluded(column: &str) -> bool {
    OUTCOME_COLUMNS.contains(&column) || IDENTIFIER_COLUMNS.contains(&column)
}

/// Every dataset column that may serve as a regressor, in file order.
pub fn candidate_columns(dataset: &Dataset) -> Vec<String> {
    dataset
        .value_columns()
        .iter()
        .filter(|c| !is_excluded(c))
        .cloned()
        .collect()
}

/// The configured candidates, or all of them when none are configured.
pub fn resolve_candidates(dataset: &Dataset, configured: Option<&[String]>) -> Vec<String> {
    match configured {
        Some(list) => list.to_vec(),
        None => candidate_columns(dataset),
    }
}
