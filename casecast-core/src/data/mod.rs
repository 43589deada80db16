//! Dataset ingest and per-partition reshaping.

pub mod error;
pub mod oxcgrt;
pub mod partition;
pub mod series;
pub mod wrangle;

pub use error::DataError;
pub use oxcgrt::{Dataset, DatasetRow, Jurisdiction};
pub use partition::Partition;
pub use series::{build_series, Target};
