//! Forecast pipeline: dataset → partition series → fitted model → prediction records.
//!
//! Two entry points:
//! - `run_forecast()`: forecasts with the configured regressors.
//! - `select_and_forecast()`: runs regressor selection first and forecasts with
//!   the selected keepers.
//!
//! Predictions cover the history plus `days_ahead` future days. Future
//! regressor values hold their last observed value. Only the last
//! `days_ahead + 7` points are emitted, so the output overlaps the final
//! observed week.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use casecast_core::data::wrangle::rolling_mean;
use casecast_core::data::{build_series, DataError, Dataset, Partition, Target};
use casecast_core::domain::{Column, FutureFrame, ObservationTable, TableError};
use casecast_core::fingerprint::table_hash;
use casecast_core::forecast::{fit_predict, ForecastError, ForecasterFactory};

use crate::candidates::resolve_candidates;
use crate::config::{ConfigError, ForecastSection, RunConfig};
use crate::selection::{RegressorSelector, SelectionError, SelectionOutcome};

/// Date layout of emitted prediction records.
pub const RECORD_DATE_FORMAT: &str = "%m-%d-%Y";

/// Observed days kept in front of the forecast horizon.
pub const OVERLAP_DAYS: usize = 7;

/// Errors from the forecast pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] DataError),
    #[error("table error: {0}")]
    Table(#[from] TableError),
    #[error("forecast error: {0}")]
    Forecast(#[from] ForecastError),
    #[error("selection error: {0}")]
    Selection(#[from] SelectionError),
    #[error("prediction for {date} is not finite")]
    NonFinitePrediction { date: NaiveDate },
}

/// One emitted prediction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub id: usize,
    /// `MM-DD-YYYY`.
    pub date: String,
    pub prediction: i64,
}

/// One point of the (possibly smoothed) predicted series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// Output of one forecast run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    pub title: String,
    /// Axis label for the predicted values: `Cases` or `Deaths`.
    pub y_label: String,
    pub partition: Partition,
    pub target: Target,
    pub regressors: Vec<String>,
    pub points: Vec<ForecastPoint>,
    pub records: Vec<PredictionRecord>,
    /// Hash of the observation table the model was fitted on.
    pub input_hash: String,
}

/// Selection outcome plus the forecast made with its keepers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectedForecast {
    pub selection: SelectionOutcome,
    pub forecast: ForecastResult,
}

/// Chart title for a forecast.
pub fn chart_title(
    target: Target,
    rolling_mean: bool,
    days_ahead: usize,
    partition: &Partition,
) -> String {
    let average = if rolling_mean {
        "7-Day Rolling Average".to_string()
    } else {
        format!("Daily {}", target.label())
    };
    match &partition.region {
        Some(region) => format!(
            "{average}: {days_ahead} Day Prediction for {region}, {}",
            partition.country
        ),
        None => format!(
            "{average}: {days_ahead} Day Prediction for {}",
            partition.country
        ),
    }
}

/// Forecast the configured partition with the configured regressors.
pub fn run_forecast(
    dataset: &Dataset,
    config: &RunConfig,
    factory: &dyn ForecasterFactory,
) -> Result<ForecastResult, PipelineError> {
    config.validate()?;
    let partition = config.partition();
    let table = build_series(
        dataset,
        &partition,
        config.forecast.target,
        &config.forecast.regressors,
    )?;
    forecast_table(
        &table,
        &partition,
        &config.forecast,
        &config.forecast.regressors,
        factory,
    )
}

/// Select regressors for the configured partition, then forecast with them.
pub fn select_and_forecast(
    dataset: &Dataset,
    config: &RunConfig,
    factory: &dyn ForecasterFactory,
) -> Result<SelectedForecast, PipelineError> {
    config.validate()?;
    let partition = config.partition();
    let candidates = resolve_candidates(dataset, config.selection.candidates.as_deref());
    let table = build_series(dataset, &partition, config.forecast.target, &candidates)?;

    let selection = RegressorSelector::from_config(factory, &config.selection).select(
        &table,
        &config.selection.split_rule(),
        &candidates,
    )?;
    info!(
        partition = %partition,
        keepers = ?selection.keepers,
        "selected regressors"
    );

    let forecast = forecast_table(
        &table,
        &partition,
        &config.forecast,
        &selection.keepers,
        factory,
    )?;
    Ok(SelectedForecast {
        selection,
        forecast,
    })
}

/// Fit on the whole of `table` and forecast `section.days_ahead` days past it.
pub fn forecast_table(
    table: &ObservationTable,
    partition: &Partition,
    section: &ForecastSection,
    regressors: &[String],
    factory: &dyn ForecasterFactory,
) -> Result<ForecastResult, PipelineError> {
    let future = extend_future(table, regressors, section.days_ahead)?;
    let yhat = fit_predict(factory, table, regressors, &future)?;

    let values: Vec<f64> = if section.rolling_mean {
        rolling_mean(&yhat, section.rolling_window)
            .into_iter()
            .zip(&yhat)
            .map(|(smoothed, &raw)| smoothed.unwrap_or(raw))
            .collect()
    } else {
        yhat
    };

    let keep = (section.days_ahead + OVERLAP_DAYS).min(values.len());
    let start = values.len() - keep;
    let points: Vec<ForecastPoint> = future.dates()[start..]
        .iter()
        .zip(&values[start..])
        .map(|(&date, &value)| ForecastPoint { date, value })
        .collect();

    let records = points
        .iter()
        .enumerate()
        .map(|(id, p)| {
            if !p.value.is_finite() {
                return Err(PipelineError::NonFinitePrediction { date: p.date });
            }
            Ok(PredictionRecord {
                id,
                date: p.date.format(RECORD_DATE_FORMAT).to_string(),
                prediction: p.value.round() as i64,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    info!(
        partition = %partition,
        target = table.target_name(),
        regressors = regressors.len(),
        points = records.len(),
        "forecast complete"
    );

    Ok(ForecastResult {
        title: chart_title(
            section.target,
            section.rolling_mean,
            section.days_ahead,
            partition,
        ),
        y_label: section.target.label().to_string(),
        partition: partition.clone(),
        target: section.target,
        regressors: regressors.to_vec(),
        points,
        records,
        input_hash: table_hash(table),
    })
}

/// History dates plus `days_ahead` daily dates; each regressor holds its last
/// observed value over the extension.
fn extend_future(
    table: &ObservationTable,
    regressors: &[String],
    days_ahead: usize,
) -> Result<FutureFrame, TableError> {
    let last = table.last_date().ok_or(TableError::Empty)?;
    let mut dates = table.dates().to_vec();
    dates.extend((1..=days_ahead).map(|d| last + Duration::days(d as i64)));

    let columns = regressors
        .iter()
        .map(|name| {
            let values = table
                .column(name)
                .ok_or_else(|| TableError::MissingColumn(name.clone()))?;
            let held = values.last().copied().unwrap_or(0.0);
            let mut extended = values.to_vec();
            extended.resize(values.len() + days_ahead, held);
            Ok(Column::new(name.clone(), extended))
        })
        .collect::<Result<Vec<_>, TableError>>()?;

    FutureFrame::new(dates, columns)
}
