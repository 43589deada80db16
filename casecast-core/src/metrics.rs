//! Forecast error metric.
//!
//! Mean percentage error with an additive offset of Euler's number in the
//! denominator, so zero-valued actuals (days without new cases) stay finite:
//!
//! ```text
//! MPE = mean( |y_i - yhat_i| / (y_i + e) )
//! ```
//!
//! This is not standard MAPE. The `+ e` offset is part of the score and must
//! not be dropped, or trial scores stop being comparable across runs.

use std::f64::consts::E;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MetricError {
    #[error("cannot score an empty series")]
    Empty,

    #[error("length mismatch: {actual} actual values vs {predicted} predictions")]
    LengthMismatch { actual: usize, predicted: usize },

    #[error("error score is not finite ({0})")]
    NonFinite(f64),
}

/// Mean percentage error between `actual` and `predicted`.
pub fn mean_percent_error(actual: &[f64], predicted: &[f64]) -> Result<f64, MetricError> {
    if actual.len() != predicted.len() {
        return Err(MetricError::LengthMismatch {
            actual: actual.len(),
            predicted: predicted.len(),
        });
    }
    if actual.is_empty() {
        return Err(MetricError::Empty);
    }

    let total: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(y, yhat)| (y - yhat).abs() / (y + E))
        .sum();
    let score = total / actual.len() as f64;

    if !score.is_finite() {
        return Err(MetricError::NonFinite(score));
    }
    Ok(score)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perfect_forecast_scores_zero() {
        let y = [3.0, 5.0, 8.0];
        assert_eq!(mean_percent_error(&y, &y).unwrap(), 0.0);
    }

    #[test]
    fn zero_actuals_use_euler_offset() {
        let score = mean_percent_error(&[0.0, 0.0], &[E, 2.0 * E]).unwrap();
        assert!((score - 1.5).abs() < 1e-12);
    }

    #[test]
    fn matches_hand_computation() {
        let actual = [10.0, 20.0];
        let predicted = [12.0, 15.0];
        let expected = ((2.0 / (10.0 + E)) + (5.0 / (20.0 + E))) / 2.0;
        let score = mean_percent_error(&actual, &predicted).unwrap();
        assert!((score - expected).abs() < 1e-12);
    }

    #[test]
    fn error_is_symmetric_in_sign_of_miss() {
        let over = mean_percent_error(&[10.0], &[13.0]).unwrap();
        let under = mean_percent_error(&[10.0], &[7.0]).unwrap();
        assert!((over - under).abs() < 1e-12);
    }

    #[test]
    fn rejects_empty_and_mismatched() {
        assert_eq!(mean_percent_error(&[], &[]), Err(MetricError::Empty));
        assert_eq!(
            mean_percent_error(&[1.0], &[1.0, 2.0]),
            Err(MetricError::LengthMismatch {
                actual: 1,
                predicted: 2
            })
        );
    }

    #[test]
    fn rejects_nan_predictions() {
        let err = mean_percent_error(&[1.0, 2.0], &[f64::NAN, 2.0]).unwrap_err();
        assert!(matches!(err, MetricError::NonFinite(_)));
    }
}
