//! Casecast Runner: regressor selection, forecast pipeline, configuration, export.
//!
//! This crate builds on `casecast-core` to provide:
//! - TOML run configuration with validation and a content hash
//! - Candidate regressor discovery
//! - Greedy forward regressor selection with a full trial log
//! - The forecast pipeline producing dated prediction records
//! - JSON/CSV export and logging setup
//! - Deterministic synthetic data for tests and benchmarks

pub mod candidates;
pub mod config;
pub mod export;
pub mod logging;
pub mod predict;
pub mod selection;
pub mod synthetic;
pub mod trial;

pub use candidates::{candidate_columns, resolve_candidates};
pub use config::{ConfigError, ForecastSection, RunConfig, SelectionConfig};
pub use export::{SelectionReport, SCHEMA_VERSION};
pub use predict::{
    chart_title, forecast_table, run_forecast, select_and_forecast, ForecastPoint,
    ForecastResult, PipelineError, PredictionRecord, SelectedForecast,
};
pub use selection::{RegressorSelector, SelectionError, SelectionOutcome, TiePolicy};
pub use trial::{TrialLog, TrialRecord};
