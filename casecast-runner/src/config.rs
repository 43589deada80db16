//! Serializable run configuration.
//!
//! A run is described by three TOML tables, every field optional:
//!
//! ```toml
//! [forecast]
//! country = "United States"
//! region = "Washington"
//! target = "NewCases"
//! days_ahead = 30
//! rolling_mean = false
//!
//! [model]
//! seasonality_mode = "multiplicative"
//! holidays = "auto"   # "US" | "none"; "auto" follows the country
//!
//! [selection]
//! holdout_days = 30
//! parallel = false
//! tie_policy = "first_seen"
//! candidates = ["C1_School closing", "C6_Stay at home requirements"]
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use casecast_core::data::{Partition, Target};
use casecast_core::domain::SplitRule;
use casecast_core::forecast::ModelConfig;

use crate::selection::TiePolicy;

/// Errors from loading or validating a [`RunConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Everything needed to reproduce one forecast or selection run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub forecast: ForecastSection,
    pub model: ModelConfig,
    pub selection: SelectionConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        let mut config = Self {
            forecast: ForecastSection::default(),
            model: ModelConfig::default(),
            selection: SelectionConfig::default(),
        };
        config.resolve_holidays();
        config
    }
}

/// What to forecast and how to post-process it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastSection {
    pub country: String,
    /// Region within the country; national totals when absent.
    pub region: Option<String>,
    pub target: Target,
    pub days_ahead: usize,
    /// Smooth the predicted series with a trailing mean before export.
    pub rolling_mean: bool,
    pub rolling_window: usize,
    /// Regressors for a plain forecast. Ignored by `select_and_forecast`,
    /// which uses the selected keepers instead.
    pub regressors: Vec<String>,
}

impl Default for ForecastSection {
    fn default() -> Self {
        Self {
            country: "United States".to_string(),
            region: None,
            target: Target::NewCases,
            days_ahead: 30,
            rolling_mean: false,
            rolling_window: 7,
            regressors: Vec::new(),
        }
    }
}

/// Regressor selection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// Trailing rows held out for scoring.
    pub holdout_days: usize,
    /// Score the candidates of one pass concurrently.
    pub parallel: bool,
    pub tie_policy: TiePolicy,
    /// Columns to consider. All non-outcome dataset columns when absent.
    pub candidates: Option<Vec<String>>,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            holdout_days: 30,
            parallel: false,
            tie_policy: TiePolicy::FirstSeen,
            candidates: None,
        }
    }
}

impl SelectionConfig {
    pub fn split_rule(&self) -> SplitRule {
        SplitRule::Holdout {
            days: self.holdout_days,
        }
    }
}

impl RunConfig {
    /// Load and validate a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let mut config: Self = toml::from_str(content)?;
        config.resolve_holidays();
        config.validate()?;
        Ok(config)
    }

    /// Turn an `auto` holiday calendar into the forecast country's calendar.
    ///
    /// Holidays are only modelled for countries with a built-in calendar.
    pub fn resolve_holidays(&mut self) {
        self.model.holidays = self.model.holidays.resolve(&self.forecast.country);
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let f = &self.forecast;
        if f.country.trim().is_empty() {
            return Err(ConfigError::Invalid("country must not be empty".into()));
        }
        if f.region.as_deref().is_some_and(|r| r.trim().is_empty()) {
            return Err(ConfigError::Invalid(
                "region must be omitted rather than empty".into(),
            ));
        }
        if f.days_ahead == 0 {
            return Err(ConfigError::Invalid("days_ahead must be positive".into()));
        }
        if f.rolling_window == 0 {
            return Err(ConfigError::Invalid("rolling_window must be positive".into()));
        }
        if self.selection.holdout_days == 0 {
            return Err(ConfigError::Invalid("holdout_days must be positive".into()));
        }
        if !(self.model.ridge.is_finite() && self.model.ridge >= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "ridge must be a non-negative number, got {}",
                self.model.ridge
            )));
        }
        Ok(())
    }

    /// Country/region partition the run forecasts.
    pub fn partition(&self) -> Partition {
        match &self.forecast.region {
            Some(region) => Partition::regional(&self.forecast.country, region),
            None => Partition::national(&self.forecast.country),
        }
    }

    /// Deterministic BLAKE3 hash of the canonical JSON form.
    ///
    /// Two runs with identical configs share a hash.
    pub fn config_hash(&self) -> Result<String, ConfigError> {
        let json = serde_json::to_string(self)?;
        Ok(blake3::hash(json.as_bytes()).to_hex().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use casecast_core::forecast::{HolidayCalendar, SeasonalityMode};

    #[test]
    fn empty_toml_gives_defaults() {
        let config = RunConfig::from_toml("").unwrap();
        assert_eq!(config, RunConfig::default());
        assert_eq!(config.forecast.country, "United States");
        assert_eq!(config.forecast.days_ahead, 30);
        assert!(!config.forecast.rolling_mean);
        assert_eq!(config.selection.holdout_days, 30);
        assert_eq!(config.selection.tie_policy, TiePolicy::FirstSeen);
        assert!(config.selection.candidates.is_none());
        assert_eq!(config.model.seasonality_mode, SeasonalityMode::Multiplicative);
    }

    #[test]
    fn full_toml_round_trips_fields() {
        let config = RunConfig::from_toml(
            r#"
[forecast]
country = "Italy"
region = "Lazio"
target = "NewDeaths"
days_ahead = 14
rolling_mean = true

[model]
seasonality_mode = "additive"
holidays = "none"

[selection]
holdout_days = 10
parallel = true
tie_policy = "last_seen"
candidates = ["C1_School closing"]
"#,
        )
        .unwrap();

        assert_eq!(config.forecast.target, Target::NewDeaths);
        assert_eq!(config.forecast.days_ahead, 14);
        assert_eq!(config.model.holidays, HolidayCalendar::None);
        assert!(config.selection.parallel);
        assert_eq!(config.selection.tie_policy, TiePolicy::LastSeen);
        assert_eq!(
            config.selection.candidates,
            Some(vec!["C1_School closing".to_string()])
        );
        assert_eq!(config.partition(), Partition::regional("Italy", "Lazio"));
    }

    #[test]
    fn holidays_follow_country_unless_set() {
        assert_eq!(
            RunConfig::default().model.holidays,
            HolidayCalendar::UnitedStates
        );

        let italy = RunConfig::from_toml("[forecast]\ncountry = \"Italy\"\n").unwrap();
        assert_eq!(italy.model.holidays, HolidayCalendar::None);

        let forced = RunConfig::from_toml(
            "[forecast]\ncountry = \"Italy\"\n\n[model]\nholidays = \"US\"\n",
        )
        .unwrap();
        assert_eq!(forced.model.holidays, HolidayCalendar::UnitedStates);
    }

    #[test]
    fn unknown_model_key_is_a_parse_error() {
        let err = RunConfig::from_toml("[model]\ndaily_seasonality = true\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn zero_horizon_is_rejected() {
        let err = RunConfig::from_toml("[forecast]\ndays_ahead = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(msg) if msg.contains("days_ahead")));
    }

    #[test]
    fn zero_holdout_is_rejected() {
        let err = RunConfig::from_toml("[selection]\nholdout_days = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(msg) if msg.contains("holdout_days")));
    }

    #[test]
    fn unknown_target_is_a_parse_error() {
        let err = RunConfig::from_toml("[forecast]\ntarget = \"Recovered\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn config_hash_is_deterministic_and_sensitive() {
        let a = RunConfig::default();
        let mut b = RunConfig::default();
        assert_eq!(a.config_hash().unwrap(), b.config_hash().unwrap());
        assert_eq!(a.config_hash().unwrap().len(), 64);

        b.forecast.days_ahead = 7;
        assert_ne!(a.config_hash().unwrap(), b.config_hash().unwrap());
    }

    #[test]
    fn national_partition_without_region() {
        assert_eq!(
            RunConfig::default().partition(),
            Partition::national("United States")
        );
    }
}
