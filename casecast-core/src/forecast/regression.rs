//! Seasonal regression baseline forecaster.
//!
//! An additive model fitted by ridge least squares:
//!
//! ```text
//! y(t) = intercept + trend·t + weekday(t) + yearly(t) + holiday(t) + Σ βᵢ·zᵢ(t)
//! ```
//!
//! where `t` is time scaled to `[0, 1]` over the history, `weekday` is six
//! day-of-week dummies (Monday is the baseline), `yearly` is a Fourier series
//! over the day of year, and `zᵢ` are the standardized extra regressors.
//!
//! In multiplicative mode the model is fitted on `ln(1 + y)` so that every
//! component scales the level instead of shifting it.

use chrono::{Datelike, NaiveDate};
use linfa::traits::Fit;
use linfa::DatasetBase;
use linfa_linear::LinearRegression;
use ndarray::{concatenate, s, Array1, Array2, Axis};
use std::f64::consts::PI;

use super::calendar::is_holiday;
use super::config::{Growth, ModelConfig, SeasonalityMode};
use super::{ForecastError, Forecaster};
use crate::domain::{FutureFrame, ObservationTable};

const YEAR_DAYS: f64 = 365.25;

/// Mean/std used to standardize one regressor.
#[derive(Debug, Clone, PartialEq)]
struct Scale {
    name: String,
    mean: f64,
    std: f64,
}

impl Scale {
    fn fit(name: &str, values: &[f64]) -> Self {
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        let std = if var > 0.0 { var.sqrt() } else { 1.0 };
        Self {
            name: name.to_string(),
            mean,
            std,
        }
    }

    fn apply(&self, value: f64) -> f64 {
        (value - self.mean) / self.std
    }
}

#[derive(Debug, Clone)]
struct Fitted {
    origin: NaiveDate,
    span_days: f64,
    scales: Vec<Scale>,
    coefficients: Array1<f64>,
}

/// Ridge-regression forecaster with trend, weekly, yearly, and holiday terms.
#[derive(Debug, Clone)]
pub struct SeasonalRegression {
    config: ModelConfig,
    fitted: Option<Fitted>,
}

impl SeasonalRegression {
    pub fn new(config: ModelConfig) -> Self {
        Self {
            config,
            fitted: None,
        }
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }

    /// Fitted coefficients in design order, if fitted.
    pub fn coefficients(&self) -> Option<&[f64]> {
        self.fitted.as_ref().and_then(|f| f.coefficients.as_slice())
    }

    /// Number of design columns for `regressors` extra regressors.
    fn width(&self, regressors: usize) -> usize {
        let mut width = 1 + regressors;
        if self.config.growth == Growth::Linear {
            width += 1;
        }
        if self.config.weekly_seasonality {
            width += 6;
        }
        if self.config.yearly_seasonality {
            width += 2 * self.config.yearly_fourier_order;
        }
        if self.config.holidays.is_active() {
            width += 1;
        }
        width
    }

    fn push_features(
        &self,
        row: &mut Vec<f64>,
        date: NaiveDate,
        origin: NaiveDate,
        span_days: f64,
        regressors: impl Iterator<Item = f64>,
    ) {
        row.push(1.0);

        if self.config.growth == Growth::Linear {
            row.push((date - origin).num_days() as f64 / span_days);
        }

        if self.config.weekly_seasonality {
            let weekday = date.weekday().num_days_from_monday();
            row.extend((1..7).map(|d| if weekday == d { 1.0 } else { 0.0 }));
        }

        if self.config.yearly_seasonality {
            let phase = 2.0 * PI * f64::from(date.ordinal0()) / YEAR_DAYS;
            for k in 1..=self.config.yearly_fourier_order {
                let angle = phase * k as f64;
                row.push(angle.sin());
                row.push(angle.cos());
            }
        }

        if self.config.holidays.is_active() {
            row.push(if is_holiday(self.config.holidays, date) {
                1.0
            } else {
                0.0
            });
        }

        row.extend(regressors);
    }

    /// One design row per date, regressors standardized by `scales`.
    fn design(
        &self,
        dates: &[NaiveDate],
        origin: NaiveDate,
        span_days: f64,
        scales: &[Scale],
        columns: &[&[f64]],
    ) -> Result<Array2<f64>, ForecastError> {
        let width = self.width(scales.len());
        let mut flat = Vec::with_capacity(dates.len() * width);
        for (i, &date) in dates.iter().enumerate() {
            let z = scales.iter().zip(columns).map(|(s, c)| s.apply(c[i]));
            self.push_features(&mut flat, date, origin, span_days, z);
        }
        Array2::from_shape_vec((dates.len(), width), flat)
            .map_err(|e| ForecastError::Other(e.to_string()))
    }

    fn to_model_space(&self, y: f64) -> f64 {
        match self.config.seasonality_mode {
            SeasonalityMode::Additive => y,
            SeasonalityMode::Multiplicative => y.max(0.0).ln_1p(),
        }
    }

    fn from_model_space(&self, z: f64) -> f64 {
        match self.config.seasonality_mode {
            SeasonalityMode::Additive => z,
            SeasonalityMode::Multiplicative => z.exp_m1(),
        }
    }
}

/// Least squares with an L2 penalty of `ridge * n` on every column but the
/// first (the intercept).
///
/// The penalty enters as `sqrt(ridge * n)`-scaled identity rows with zero
/// targets stacked under the design, which leaves an ordinary least-squares
/// problem for `LinearRegression`.
fn ridge_fit(
    design: &Array2<f64>,
    y: &Array1<f64>,
    ridge: f64,
) -> Result<Array1<f64>, ForecastError> {
    let (n, p) = design.dim();
    let weight = (ridge.max(0.0) * n as f64).sqrt();

    let (records, targets) = if weight > 0.0 && p > 1 {
        let penalty = Array2::<f64>::eye(p).slice(s![1.., ..]).mapv(|v| v * weight);
        let zeros = Array1::<f64>::zeros(p - 1);
        let records = concatenate(Axis(0), &[design.view(), penalty.view()])
            .map_err(|e| ForecastError::Other(e.to_string()))?;
        let targets = concatenate(Axis(0), &[y.view(), zeros.view()])
            .map_err(|e| ForecastError::Other(e.to_string()))?;
        (records, targets)
    } else {
        (design.clone(), y.clone())
    };

    let fitted = LinearRegression::new()
        .with_intercept(false)
        .fit(&DatasetBase::new(records, targets))
        .map_err(|_| ForecastError::Singular)?;
    let coefficients = fitted.params().to_owned();
    if coefficients.iter().all(|b| b.is_finite()) {
        Ok(coefficients)
    } else {
        Err(ForecastError::Singular)
    }
}

fn check_finite(column: &str, values: &[f64]) -> Result<(), ForecastError> {
    match values.iter().position(|v| !v.is_finite()) {
        Some(row) => Err(ForecastError::NonFinite {
            column: column.to_string(),
            row,
        }),
        None => Ok(()),
    }
}

impl Forecaster for SeasonalRegression {
    fn name(&self) -> &str {
        "seasonal_regression"
    }

    fn fit(
        &mut self,
        history: &ObservationTable,
        regressors: &[String],
    ) -> Result<(), ForecastError> {
        let (origin, last) = match (history.first_date(), history.last_date()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Err(ForecastError::EmptyHistory),
        };
        check_finite(history.target_name(), history.target())?;

        let mut columns = Vec::with_capacity(regressors.len());
        for name in regressors {
            let values = history
                .column(name)
                .ok_or_else(|| ForecastError::MissingRegressor(name.clone()))?;
            check_finite(name, values)?;
            columns.push(values);
        }
        let scales: Vec<Scale> = regressors
            .iter()
            .zip(&columns)
            .map(|(name, values)| Scale::fit(name, values))
            .collect();

        let span_days = ((last - origin).num_days() as f64).max(1.0);
        let design = self.design(history.dates(), origin, span_days, &scales, &columns)?;
        let y: Array1<f64> = history
            .target()
            .iter()
            .map(|&v| self.to_model_space(v))
            .collect();

        let coefficients = ridge_fit(&design, &y, self.config.ridge)?;

        self.fitted = Some(Fitted {
            origin,
            span_days,
            scales,
            coefficients,
        });
        Ok(())
    }

    fn predict(&self, future: &FutureFrame) -> Result<Vec<f64>, ForecastError> {
        let fitted = self.fitted.as_ref().ok_or(ForecastError::NotFitted)?;

        let mut columns = Vec::with_capacity(fitted.scales.len());
        for scale in &fitted.scales {
            let values = future
                .column(&scale.name)
                .ok_or_else(|| ForecastError::MissingRegressor(scale.name.clone()))?;
            check_finite(&scale.name, values)?;
            columns.push(values);
        }

        let design = self.design(
            future.dates(),
            fitted.origin,
            fitted.span_days,
            &fitted.scales,
            &columns,
        )?;
        Ok(design
            .dot(&fitted.coefficients)
            .iter()
            .map(|&level| self.from_model_space(level))
            .collect())
    }
}
