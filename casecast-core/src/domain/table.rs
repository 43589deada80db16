//! Observation tables and future frames.
//!
//! An observation table is a columnar daily series: one date axis, one target
//! column, and any number of named numeric regressor columns. Dates are unique
//! and strictly increasing; every column has exactly one value per date.
//!
//! A future frame is the same shape without the target. Forecasters predict
//! over future frames.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A named numeric column aligned to a table's date axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub values: Vec<f64>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }
}

/// Structural errors raised when building or slicing tables.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TableError {
    #[error("dates must be strictly increasing: {previous} is followed by {next}")]
    UnorderedDates { previous: NaiveDate, next: NaiveDate },

    #[error("column '{column}' has {actual} values, expected {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },

    #[error("duplicate column '{0}'")]
    DuplicateColumn(String),

    #[error("missing column '{0}'")]
    MissingColumn(String),

    #[error("table has no rows")]
    Empty,
}

/// Daily target series with named regressor columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationTable {
    dates: Vec<NaiveDate>,
    target_name: String,
    target: Vec<f64>,
    columns: Vec<Column>,
}

impl ObservationTable {
    /// Build a table, validating date order and column lengths.
    pub fn new(
        dates: Vec<NaiveDate>,
        target_name: impl Into<String>,
        target: Vec<f64>,
        columns: Vec<Column>,
    ) -> Result<Self, TableError> {
        let target_name = target_name.into();
        validate_dates(&dates)?;
        check_length(&target_name, dates.len(), target.len())?;
        validate_columns(dates.len(), &columns)?;
        if columns.iter().any(|c| c.name == target_name) {
            return Err(TableError::DuplicateColumn(target_name));
        }

        Ok(Self {
            dates,
            target_name,
            target,
            columns,
        })
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.dates.first().copied()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    /// Name of the target column (e.g. `NewCases`).
    pub fn target_name(&self) -> &str {
        &self.target_name
    }

    pub fn target(&self) -> &[f64] {
        &self.target
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Regressor column names in table order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
    }

    /// Append a regressor column.
    pub fn with_column(mut self, column: Column) -> Result<Self, TableError> {
        if column.name == self.target_name || self.has_column(&column.name) {
            return Err(TableError::DuplicateColumn(column.name));
        }
        check_length(&column.name, self.dates.len(), column.values.len())?;
        self.columns.push(column);
        Ok(self)
    }

    /// Rows `[start, end)`, clamped to the table bounds.
    pub fn slice(&self, start: usize, end: usize) -> Self {
        let end = end.min(self.dates.len());
        let start = start.min(end);

        Self {
            dates: self.dates[start..end].to_vec(),
            target_name: self.target_name.clone(),
            target: self.target[start..end].to_vec(),
            columns: self
                .columns
                .iter()
                .map(|c| Column::new(c.name.clone(), c.values[start..end].to_vec()))
                .collect(),
        }
    }

    /// Index of the first row whose date is on or after `date`.
    pub fn partition_point(&self, date: NaiveDate) -> usize {
        self.dates.partition_point(|d| *d < date)
    }

    /// Keep only the named regressor columns, in the given order.
    pub fn select(&self, names: &[String]) -> Result<Self, TableError> {
        Ok(Self {
            dates: self.dates.clone(),
            target_name: self.target_name.clone(),
            target: self.target.clone(),
            columns: self.pick_columns(names)?,
        })
    }

    /// The table's dates and the named regressor columns, without the target.
    pub fn future_frame(&self, names: &[String]) -> Result<FutureFrame, TableError> {
        FutureFrame::new(self.dates.clone(), self.pick_columns(names)?)
    }

    fn pick_columns(&self, names: &[String]) -> Result<Vec<Column>, TableError> {
        names
            .iter()
            .map(|name| {
                self.column(name)
                    .map(|values| Column::new(name.clone(), values.to_vec()))
                    .ok_or_else(|| TableError::MissingColumn(name.clone()))
            })
            .collect()
    }
}

/// Dates plus known regressor values, without a target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FutureFrame {
    dates: Vec<NaiveDate>,
    columns: Vec<Column>,
}

impl FutureFrame {
    pub fn new(dates: Vec<NaiveDate>, columns: Vec<Column>) -> Result<Self, TableError> {
        validate_dates(&dates)?;
        validate_columns(dates.len(), &columns)?;
        Ok(Self { dates, columns })
    }

    /// A frame with dates only.
    pub fn from_dates(dates: Vec<NaiveDate>) -> Result<Self, TableError> {
        Self::new(dates, Vec::new())
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
    }
}

fn validate_dates(dates: &[NaiveDate]) -> Result<(), TableError> {
    for pair in dates.windows(2) {
        if pair[1] <= pair[0] {
            return Err(TableError::UnorderedDates {
                previous: pair[0],
                next: pair[1],
            });
        }
    }
    Ok(())
}

fn validate_columns(expected: usize, columns: &[Column]) -> Result<(), TableError> {
    for (i, column) in columns.iter().enumerate() {
        check_length(&column.name, expected, column.values.len())?;
        if columns[..i].iter().any(|c| c.name == column.name) {
            return Err(TableError::DuplicateColumn(column.name.clone()));
        }
    }
    Ok(())
}

fn check_length(column: &str, expected: usize, actual: usize) -> Result<(), TableError> {
    if expected != actual {
        return Err(TableError::LengthMismatch {
            column: column.to_string(),
            expected,
            actual,
        });
    }
    Ok(())
}
