//! Model hyperparameters.
//!
//! Defaults reproduce the settings every forecast in this project has used:
//! multiplicative seasonality, weekly seasonality only, and linear growth.
//! Holidays follow the forecast country unless set explicitly.

use serde::{Deserialize, Serialize};

use super::regression::SeasonalRegression;
use super::{Forecaster, ForecasterFactory};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeasonalityMode {
    Additive,
    #[default]
    Multiplicative,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Growth {
    #[default]
    Linear,
    /// No trend term.
    Flat,
}

/// Public-holiday calendar used for the holiday effect.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HolidayCalendar {
    /// Pick the calendar from the forecast country, see [`HolidayCalendar::resolve`].
    /// Left unresolved, no holiday term is fitted.
    #[default]
    #[serde(rename = "auto")]
    Auto,
    #[serde(rename = "none")]
    None,
    #[serde(rename = "US")]
    UnitedStates,
}

impl HolidayCalendar {
    /// Calendar for a dataset country name; `None` when unsupported.
    pub fn for_country_name(name: &str) -> Self {
        match name {
            "United States" | "US" | "USA" => Self::UnitedStates,
            _ => Self::None,
        }
    }

    /// Replace `Auto` with the calendar of `country`. Explicit choices stay.
    pub fn resolve(self, country: &str) -> Self {
        match self {
            Self::Auto => Self::for_country_name(country),
            other => other,
        }
    }

    /// Whether the calendar contributes a holiday term.
    pub fn is_active(self) -> bool {
        matches!(self, Self::UnitedStates)
    }
}

/// Model settings. Unknown keys are rejected, so options the model does not
/// support (such as sub-daily seasonality) fail to parse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ModelConfig {
    pub seasonality_mode: SeasonalityMode,
    pub weekly_seasonality: bool,
    pub yearly_seasonality: bool,
    pub growth: Growth,
    pub holidays: HolidayCalendar,
    /// Fourier order of the yearly terms.
    pub yearly_fourier_order: usize,
    /// Ridge penalty per observation on all non-intercept coefficients.
    pub ridge: f64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            seasonality_mode: SeasonalityMode::Multiplicative,
            weekly_seasonality: true,
            yearly_seasonality: false,
            growth: Growth::Linear,
            holidays: HolidayCalendar::Auto,
            yearly_fourier_order: 3,
            ridge: 1e-6,
        }
    }
}

impl ForecasterFactory for ModelConfig {
    fn build(&self) -> Box<dyn Forecaster> {
        Box::new(SeasonalRegression::new(self.clone()))
    }
}
