//! Forecasting seam.
//!
//! The selector and the forecast pipeline only talk to [`Forecaster`] and
//! [`ForecasterFactory`]. A factory builds one fresh, unfitted forecaster per
//! trial; hyperparameters live in the factory, not in the callers.
//!
//! [`ModelConfig`] is the factory for the bundled [`SeasonalRegression`]
//! baseline. Other models plug in by implementing both traits.

pub mod calendar;
pub mod config;
pub mod regression;

pub use calendar::{holidays_in_year, is_holiday};
pub use config::{Growth, HolidayCalendar, ModelConfig, SeasonalityMode};
pub use regression::SeasonalRegression;

use thiserror::Error;

use crate::domain::{FutureFrame, ObservationTable};

/// Failures from fitting or predicting.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ForecastError {
    #[error("cannot fit on an empty history")]
    EmptyHistory,

    #[error("regressor '{0}' is not present")]
    MissingRegressor(String),

    #[error("non-finite value in '{column}' at row {row}")]
    NonFinite { column: String, row: usize },

    #[error("model did not converge: design matrix is singular")]
    Singular,

    #[error("predict called before fit")]
    NotFitted,

    #[error("forecaster returned {actual} predictions for {expected} dates")]
    WrongLength { expected: usize, actual: usize },

    #[error("{0}")]
    Other(String),
}

/// A fit-then-predict time-series model.
///
/// Implementations must be deterministic: the same history, regressors, and
/// future frame give the same predictions.
pub trait Forecaster: Send {
    /// Short model name for logs.
    fn name(&self) -> &str;

    /// Fit on `history` using the named columns as extra regressors.
    fn fit(&mut self, history: &ObservationTable, regressors: &[String])
        -> Result<(), ForecastError>;

    /// One prediction per date of `future`. `future` must carry every regressor
    /// used in `fit`.
    fn predict(&self, future: &FutureFrame) -> Result<Vec<f64>, ForecastError>;
}

/// Builds fresh, unfitted forecasters.
pub trait ForecasterFactory: Send + Sync {
    fn build(&self) -> Box<dyn Forecaster>;
}

/// Fit a fresh model from `factory` and predict over `future`, checking the
/// prediction count.
pub fn fit_predict(
    factory: &dyn ForecasterFactory,
    history: &ObservationTable,
    regressors: &[String],
    future: &FutureFrame,
) -> Result<Vec<f64>, ForecastError> {
    let mut model = factory.build();
    model.fit(history, regressors)?;
    let predictions = model.predict(future)?;
    if predictions.len() != future.len() {
        return Err(ForecastError::WrongLength {
            expected: future.len(),
            actual: predictions.len(),
        });
    }
    Ok(predictions)
}
