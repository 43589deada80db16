//! Partition series builder: dataset rows → observation table.
//!
//! For one partition:
//! 1. rows are ordered by date (a repeated date keeps its first row);
//! 2. confirmed cases/deaths are forward-filled;
//! 3. the target is either the filled cumulative count or its day-over-day
//!    difference (new cases/deaths, first day 0);
//! 4. each regressor column is forward-filled and remaining gaps set to 0.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::error::DataError;
use super::oxcgrt::{Dataset, DatasetRow, CONFIRMED_CASES, CONFIRMED_DEATHS, NEW_CASES, NEW_DEATHS};
use super::partition::Partition;
use super::wrangle::{fill_missing, forward_fill, running_difference};
use crate::domain::{Column, ObservationTable};

/// Which outcome to forecast.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Target {
    #[default]
    NewCases,
    NewDeaths,
    ConfirmedCases,
    ConfirmedDeaths,
}

impl Target {
    /// Column name of the target in the observation table.
    pub fn column_name(&self) -> &'static str {
        match self {
            Self::NewCases => NEW_CASES,
            Self::NewDeaths => NEW_DEATHS,
            Self::ConfirmedCases => CONFIRMED_CASES,
            Self::ConfirmedDeaths => CONFIRMED_DEATHS,
        }
    }

    /// The cumulative dataset column the target is derived from.
    pub fn source_column(&self) -> &'static str {
        match self {
            Self::NewCases | Self::ConfirmedCases => CONFIRMED_CASES,
            Self::NewDeaths | Self::ConfirmedDeaths => CONFIRMED_DEATHS,
        }
    }

    pub fn is_cumulative(&self) -> bool {
        matches!(self, Self::ConfirmedCases | Self::ConfirmedDeaths)
    }

    /// Human label: `Cases` or `Deaths`.
    pub fn label(&self) -> &'static str {
        match self {
            Self::NewCases | Self::ConfirmedCases => "Cases",
            Self::NewDeaths | Self::ConfirmedDeaths => "Deaths",
        }
    }
}

/// Build the observation table of `partition` for `target` with the named
/// regressor columns.
pub fn build_series(
    dataset: &Dataset,
    partition: &Partition,
    target: Target,
    regressors: &[String],
) -> Result<ObservationTable, DataError> {
    let source = dataset
        .value_index(target.source_column())
        .ok_or_else(|| DataError::MissingColumn(target.source_column().to_string()))?;
    let regressor_indices = regressors
        .iter()
        .map(|name| {
            dataset
                .value_index(name)
                .ok_or_else(|| DataError::MissingColumn(name.clone()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let rows = partition_rows(dataset, partition);
    if rows.is_empty() {
        return Err(DataError::EmptyPartition {
            partition: partition.to_string(),
        });
    }

    let dates = rows.iter().map(|r| r.date).collect();

    let counts = forward_fill(&rows.iter().map(|r| r.values[source]).collect::<Vec<_>>());
    let target_values = if target.is_cumulative() {
        fill_missing(&counts, 0.0)
    } else {
        running_difference(&counts)
    };

    let columns = regressors
        .iter()
        .zip(&regressor_indices)
        .map(|(name, &idx)| {
            let raw: Vec<Option<f64>> = rows.iter().map(|r| r.values[idx]).collect();
            Column::new(name.clone(), fill_missing(&forward_fill(&raw), 0.0))
        })
        .collect();

    let table = ObservationTable::new(dates, target.column_name(), target_values, columns)?;
    debug!(
        partition = %partition,
        rows = table.len(),
        regressors = regressors.len(),
        "built partition series"
    );
    Ok(table)
}

/// Rows of one partition, date-ordered, one per date.
fn partition_rows<'a>(dataset: &'a Dataset, partition: &Partition) -> Vec<&'a DatasetRow> {
    let mut rows: Vec<&DatasetRow> = dataset.rows().iter().filter(|r| partition.matches(r)).collect();
    rows.sort_by_key(|r| r.date);

    let before = rows.len();
    rows.dedup_by_key(|r| r.date);
    if rows.len() != before {
        warn!(
            partition = %partition,
            dropped = before - rows.len(),
            "dropped rows with repeated dates"
        );
    }
    rows
}
