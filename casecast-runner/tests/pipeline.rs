//! End-to-end tests: config file → dataset → selection → forecast → export.

use std::path::PathBuf;

use casecast_core::data::Dataset;
use casecast_core::forecast::{HolidayCalendar, ModelConfig, SeasonalityMode};
use casecast_runner::export::{
    export_predictions_json, export_report_json, export_trials_csv, import_report_json,
};
use casecast_runner::synthetic::{synthetic_dataset, SyntheticConfig, STRONG_DRIVER};
use casecast_runner::{
    run_forecast, select_and_forecast, ConfigError, PipelineError, RunConfig, SelectionReport,
};

fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../casecast-core/tests/fixtures/oxcgrt_sample.csv")
}

fn write_config(dir: &tempfile::TempDir, toml: &str) -> PathBuf {
    let path = dir.path().join("run.toml");
    std::fs::write(&path, toml).unwrap();
    path
}

#[test]
fn config_file_drives_fixture_forecast() {
    let temp_dir = tempfile::tempdir().unwrap();
    let path = write_config(
        &temp_dir,
        r#"
[forecast]
country = "Italy"
days_ahead = 10
regressors = ["C1_School closing"]
"#,
    );
    let config = RunConfig::from_file(&path).unwrap();
    let dataset = Dataset::from_path(&fixture_path()).unwrap();

    let result = run_forecast(&dataset, &config, &config.model).unwrap();

    assert_eq!(result.records.len(), 17);
    assert_eq!(result.title, "Daily Cases: 10 Day Prediction for Italy");
    assert_eq!(result.y_label, "Cases");
    // Fixture ends 2020-02-14; the horizon runs to 2020-02-24.
    assert_eq!(result.records.last().unwrap().date, "02-24-2020");
    assert_eq!(result.records[0].date, "02-08-2020");
    assert!(result.records.iter().enumerate().all(|(i, r)| r.id == i));

    let json = export_predictions_json(&result.records).unwrap();
    assert!(json.starts_with(r#"[{"id":0,"date":"02-08-2020","prediction":"#));
}

#[test]
fn regional_forecast_uses_region_in_title() {
    let config = RunConfig::from_toml(
        r#"
[forecast]
country = "United States"
region = "Washington"
days_ahead = 5
rolling_mean = true
"#,
    )
    .unwrap();
    let dataset = Dataset::from_path(&fixture_path()).unwrap();
    let result = run_forecast(&dataset, &config, &config.model).unwrap();

    assert_eq!(
        result.title,
        "7-Day Rolling Average: 5 Day Prediction for Washington, United States"
    );
    assert_eq!(result.records.len(), 12);
}

#[test]
fn unknown_country_is_a_data_error() {
    let config = RunConfig::from_toml("[forecast]\ncountry = \"Atlantis\"\n").unwrap();
    let dataset = Dataset::from_path(&fixture_path()).unwrap();
    let err = run_forecast(&dataset, &config, &config.model).unwrap_err();
    assert!(matches!(err, PipelineError::Data(_)));
    assert!(err.to_string().contains("Atlantis"));
}

#[test]
fn invalid_config_file_is_rejected() {
    let temp_dir = tempfile::tempdir().unwrap();
    let path = write_config(&temp_dir, "[selection]\nholdout_days = 0\n");
    assert!(matches!(
        RunConfig::from_file(&path),
        Err(ConfigError::Invalid(_))
    ));
    assert!(matches!(
        RunConfig::from_file(&temp_dir.path().join("absent.toml")),
        Err(ConfigError::Io { .. })
    ));
}

#[test]
fn select_then_forecast_on_synthetic_dataset() {
    let dataset = synthetic_dataset("Testland", &SyntheticConfig::default());
    let mut config = RunConfig::from_toml(
        r#"
[forecast]
country = "Testland"
days_ahead = 14

[model]
seasonality_mode = "additive"
holidays = "none"

[selection]
holdout_days = 14
"#,
    )
    .unwrap();
    config.selection.parallel = true;

    let selected = select_and_forecast(&dataset, &config, &config.model).unwrap();

    assert_eq!(selected.selection.keepers[0], STRONG_DRIVER);
    assert_eq!(selected.forecast.regressors, selected.selection.keepers);
    assert_eq!(selected.forecast.records.len(), 21);

    let report = SelectionReport::new(&config, &selected.selection).unwrap();
    let restored = import_report_json(&export_report_json(&report).unwrap()).unwrap();
    assert_eq!(restored.keepers, selected.selection.keepers);
    assert_eq!(restored.config_hash, config.config_hash().unwrap());

    let csv = export_trials_csv(selected.selection.trials.records()).unwrap();
    assert_eq!(csv.lines().count(), selected.selection.trials.len() + 1);
}

#[test]
fn configured_candidates_limit_the_search() {
    let dataset = synthetic_dataset("Testland", &SyntheticConfig::default());
    let mut config = RunConfig::default();
    config.forecast.country = "Testland".into();
    config.model = ModelConfig {
        seasonality_mode: SeasonalityMode::Additive,
        holidays: HolidayCalendar::None,
        ..ModelConfig::default()
    };
    config.selection.candidates = Some(vec!["noise_c".into()]);

    let selected = select_and_forecast(&dataset, &config, &config.model).unwrap();
    assert_eq!(selected.selection.keepers, vec!["noise_c".to_string()]);
    assert_eq!(selected.selection.trials.len(), 1);
}

#[test]
fn unknown_candidate_surfaces_as_data_error() {
    let dataset = synthetic_dataset("Testland", &SyntheticConfig::default());
    let mut config = RunConfig::default();
    config.forecast.country = "Testland".into();
    config.selection.candidates = Some(vec!["H7_Vaccination policy".into()]);

    let err = select_and_forecast(&dataset, &config, &config.model).unwrap_err();
    assert!(matches!(err, PipelineError::Data(_)));
}
