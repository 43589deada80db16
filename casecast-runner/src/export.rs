//! Export: JSON and CSV renderings of forecasts and selection results.
//!
//! - **Predictions JSON**: the `[{id, date, prediction}, ...]` record list
//! - **Trials CSV**: one row per scored candidate
//! - **Selection report JSON**: keepers, trial log, and provenance hashes,
//!   with a `schema_version` field; newer versions are rejected on import
//!
//! Everything is returned as a string; callers decide where it goes.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::config::RunConfig;
use crate::predict::PredictionRecord;
use crate::selection::SelectionOutcome;
use crate::trial::TrialRecord;

/// Current schema version of [`SelectionReport`].
pub const SCHEMA_VERSION: u32 = 1;

/// Persistable summary of one selection run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionReport {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub config_hash: String,
    pub input_hash: String,
    pub keepers: Vec<String>,
    pub best_error: Option<f64>,
    pub passes: usize,
    pub trials: Vec<TrialRecord>,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

impl SelectionReport {
    pub fn new(config: &RunConfig, outcome: &SelectionOutcome) -> Result<Self> {
        Ok(Self {
            schema_version: SCHEMA_VERSION,
            config_hash: config.config_hash().context("failed to hash run config")?,
            input_hash: outcome.input_hash.clone(),
            keepers: outcome.keepers.clone(),
            best_error: outcome.best_error(),
            passes: outcome.passes,
            trials: outcome.trials.records().to_vec(),
        })
    }
}

// ─── JSON export ────────────────────────────────────────────────────

/// Serialize prediction records as a compact JSON array.
pub fn export_predictions_json(records: &[PredictionRecord]) -> Result<String> {
    serde_json::to_string(records).context("failed to serialize predictions to JSON")
}

/// Serialize a selection report to pretty JSON.
pub fn export_report_json(report: &SelectionReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("failed to serialize SelectionReport to JSON")
}

/// Deserialize a selection report, rejecting unknown schema versions.
pub fn import_report_json(json: &str) -> Result<SelectionReport> {
    let report: SelectionReport =
        serde_json::from_str(json).context("failed to deserialize SelectionReport from JSON")?;
    if report.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            report.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(report)
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Export the trial log as CSV.
///
/// Columns: pass, candidate, regressors (`|`-joined), error, improved
pub fn export_trials_csv(trials: &[TrialRecord]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["pass", "candidate", "regressors", "error", "improved"])?;
    for t in trials {
        wtr.write_record([
            &t.pass.to_string(),
            &t.candidate,
            &t.regressors.join("|"),
            &format!("{:.6}", t.error),
            &t.improved.to_string(),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Export prediction records as CSV with id, date, prediction columns.
pub fn export_predictions_csv(records: &[PredictionRecord]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    for r in records {
        wtr.serialize(r)?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}
