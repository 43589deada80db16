use std::path::PathBuf;
use thiserror::Error;

use crate::domain::TableError;

/// Errors from dataset ingest and reshaping.
///
/// Displayable as-is; each variant names the file, column, or partition at fault.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("dataset has no column '{0}'")]
    MissingColumn(String),

    #[error("no rows for {partition}")]
    EmptyPartition { partition: String },

    #[error("invalid series: {0}")]
    Table(#[from] TableError),
}
