//! Greedy forward selection of regressors.
//!
//! Starting from no regressors, each outer pass tries every remaining
//! candidate on top of the current keepers: fit on the training split,
//! predict the test split (with its actual regressor values), and score the
//! prediction with [`mean_percent_error`]. Every trial is logged.
//!
//! A trial improves when its error is a new minimum across *all* trials so
//! far, not only those of the current pass. After a pass, the last improving
//! candidate joins the keepers. A pass without any improvement ends the search,
//! even if candidates remain.
//!
//! In parallel mode the trials of one pass are scored concurrently; minimum
//! tracking still runs afterwards in candidate order, so both modes give the
//! same keepers and the same trial log.

use std::collections::HashSet;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info};

use casecast_core::domain::{ObservationTable, SplitRule, SplitSide, TableError, TrainTestSplit};
use casecast_core::fingerprint::tables_hash;
use casecast_core::forecast::{fit_predict, ForecastError, ForecasterFactory};
use casecast_core::metrics::{mean_percent_error, MetricError};

use crate::config::SelectionConfig;
use crate::trial::{TrialLog, TrialRecord};

/// How a trial that exactly ties the global minimum is treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TiePolicy {
    /// Only a strictly lower error improves, so the first of tied candidates wins.
    #[default]
    FirstSeen,
    /// An equal error also improves, so the last of tied candidates wins.
    LastSeen,
}

impl TiePolicy {
    /// Whether `error` sets a new minimum given the minimum so far.
    pub fn improves(&self, error: f64, global_min: Option<f64>) -> bool {
        match (self, global_min) {
            (_, None) => true,
            (Self::FirstSeen, Some(min)) => error < min,
            (Self::LastSeen, Some(min)) => error <= min,
        }
    }
}

/// Errors from a selection search. None are skipped silently.
#[derive(Debug, Error)]
pub enum SelectionError {
    #[error("candidate column '{column}' is not in the table")]
    MissingColumn { column: String },

    #[error("{side} split is empty")]
    EmptySplit { side: SplitSide },

    #[error("candidate '{0}' is listed more than once")]
    DuplicateCandidate(String),

    #[error("pass {pass}, candidate '{candidate}': model failed: {source}")]
    ModelFit {
        pass: usize,
        candidate: String,
        #[source]
        source: ForecastError,
    },

    #[error("pass {pass}, candidate '{candidate}': could not score forecast: {source}")]
    Metric {
        pass: usize,
        candidate: String,
        #[source]
        source: MetricError,
    },
}

/// Result of a selection search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionOutcome {
    /// Selected regressors, in the order they were added.
    pub keepers: Vec<String>,
    pub trials: TrialLog,
    /// Outer passes that scored at least one trial.
    pub passes: usize,
    /// Hash of the training and test tables the search ran on.
    pub input_hash: String,
}

impl SelectionOutcome {
    /// Error of the final keeper set, if any trial ran.
    pub fn best_error(&self) -> Option<f64> {
        self.trials.global_min()
    }
}

/// Greedy forward-selection driver.
///
/// Borrows the model factory; a fresh forecaster is built for every trial.
pub struct RegressorSelector<'a> {
    factory: &'a dyn ForecasterFactory,
    parallel: bool,
    tie_policy: TiePolicy,
}

enum TrialFailure {
    Model(ForecastError),
    Metric(MetricError),
}

impl<'a> RegressorSelector<'a> {
    /// Sequential selector with the default tie policy.
    pub fn new(factory: &'a dyn ForecasterFactory) -> Self {
        Self {
            factory,
            parallel: false,
            tie_policy: TiePolicy::default(),
        }
    }

    /// Selector configured from a `[selection]` table.
    pub fn from_config(factory: &'a dyn ForecasterFactory, config: &SelectionConfig) -> Self {
        Self::new(factory)
            .with_parallelism(config.parallel)
            .with_tie_policy(config.tie_policy)
    }

    /// Enables or disables scoring the candidates of a pass in parallel.
    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_tie_policy(mut self, tie_policy: TiePolicy) -> Self {
        self.tie_policy = tie_policy;
        self
    }

    /// Split `table` by `rule`, then search.
    pub fn select(
        &self,
        table: &ObservationTable,
        rule: &SplitRule,
        candidates: &[String],
    ) -> Result<SelectionOutcome, SelectionError> {
        self.select_split(&rule.apply(table), candidates)
    }

    /// Search over an existing split.
    pub fn select_split(
        &self,
        split: &TrainTestSplit,
        candidates: &[String],
    ) -> Result<SelectionOutcome, SelectionError> {
        let result = self.search(split, candidates);
        if let Err(e) = &result {
            error!(error = %e, "regressor selection failed");
        }
        result
    }

    fn search(
        &self,
        split: &TrainTestSplit,
        candidates: &[String],
    ) -> Result<SelectionOutcome, SelectionError> {
        validate_candidates(split.train(), candidates)?;

        let input_hash = tables_hash(&[split.train(), split.test()]);
        let mut keepers: Vec<String> = Vec::new();
        let mut trials = TrialLog::new();
        let mut passes = 0;

        if candidates.is_empty() {
            return Ok(SelectionOutcome {
                keepers,
                trials,
                passes,
                input_hash,
            });
        }
        if let Some(side) = split.empty_side() {
            return Err(SelectionError::EmptySplit { side });
        }

        let mut remaining: Vec<String> = candidates.to_vec();
        while !remaining.is_empty() {
            passes += 1;
            let pass = passes;
            info!(pass, keepers = ?keepers, remaining = remaining.len(), "selection pass");

            let errors = self.score_pass(split, &keepers, &remaining, pass)?;

            let mut best: Option<usize> = None;
            for (idx, (candidate, error)) in remaining.iter().zip(errors).enumerate() {
                let improved = self.tie_policy.improves(error, trials.global_min());
                debug!(pass, candidate = %candidate, error, improved, "trial scored");

                let mut regressors = keepers.clone();
                regressors.push(candidate.clone());
                trials.push(TrialRecord {
                    pass,
                    candidate: candidate.clone(),
                    regressors,
                    error,
                    improved,
                });
                if improved {
                    best = Some(idx);
                }
            }

            match best {
                Some(idx) => {
                    let chosen = remaining.remove(idx);
                    info!(pass, regressor = %chosen, error = trials.global_min(), "kept regressor");
                    keepers.push(chosen);
                }
                None => {
                    info!(pass, "no improvement, stopping");
                    break;
                }
            }
        }

        info!(keepers = ?keepers, trials = trials.len(), passes, "selection finished");
        Ok(SelectionOutcome {
            keepers,
            trials,
            passes,
            input_hash,
        })
    }

    /// Errors of every remaining candidate on top of `keepers`, in order.
    ///
    /// Fails with the first failing candidate in encounter order, in both modes.
    fn score_pass(
        &self,
        split: &TrainTestSplit,
        keepers: &[String],
        remaining: &[String],
        pass: usize,
    ) -> Result<Vec<f64>, SelectionError> {
        let run = |candidate: &String| {
            self.score_trial(split, keepers, candidate)
                .map_err(|failure| match failure {
                    TrialFailure::Model(source) => SelectionError::ModelFit {
                        pass,
                        candidate: candidate.clone(),
                        source,
                    },
                    TrialFailure::Metric(source) => SelectionError::Metric {
                        pass,
                        candidate: candidate.clone(),
                        source,
                    },
                })
        };

        if self.parallel {
            remaining
                .par_iter()
                .map(run)
                .collect::<Vec<_>>()
                .into_iter()
                .collect()
        } else {
            remaining.iter().map(run).collect()
        }
    }

    fn score_trial(
        &self,
        split: &TrainTestSplit,
        keepers: &[String],
        candidate: &str,
    ) -> Result<f64, TrialFailure> {
        let mut regressors = keepers.to_vec();
        regressors.push(candidate.to_string());

        let future = split
            .test()
            .future_frame(&regressors)
            .map_err(|e| TrialFailure::Model(table_to_forecast_error(e)))?;
        let predictions = fit_predict(self.factory, split.train(), &regressors, &future)
            .map_err(TrialFailure::Model)?;
        mean_percent_error(split.test().target(), &predictions).map_err(TrialFailure::Metric)
    }
}

fn table_to_forecast_error(e: TableError) -> ForecastError {
    match e {
        TableError::MissingColumn(name) => ForecastError::MissingRegressor(name),
        other => ForecastError::Other(other.to_string()),
    }
}

fn validate_candidates(
    table: &ObservationTable,
    candidates: &[String],
) -> Result<(), SelectionError> {
    let mut seen = HashSet::with_capacity(candidates.len());
    for candidate in candidates {
        if !table.has_column(candidate) {
            return Err(SelectionError::MissingColumn {
                column: candidate.clone(),
            });
        }
        if !seen.insert(candidate.as_str()) {
            return Err(SelectionError::DuplicateCandidate(candidate.clone()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use casecast_core::domain::{Column, FutureFrame};
    use casecast_core::forecast::Forecaster;
    use chrono::{Duration, NaiveDate};

    /// Predicts a constant per regressor count, so every trial of a pass ties.
    struct ConstantModel {
        level: f64,
    }

    impl Forecaster for ConstantModel {
        fn name(&self) -> &str {
            "constant"
        }

        fn fit(
            &mut self,
            _history: &ObservationTable,
            regressors: &[String],
        ) -> Result<(), ForecastError> {
            self.level = regressors.len() as f64;
            Ok(())
        }

        fn predict(&self, future: &FutureFrame) -> Result<Vec<f64>, ForecastError> {
            Ok(vec![self.level; future.len()])
        }
    }

    struct ConstantFactory;

    impl ForecasterFactory for ConstantFactory {
        fn build(&self) -> Box<dyn Forecaster> {
            Box::new(ConstantModel { level: 0.0 })
        }
    }

    fn table() -> ObservationTable {
        let start = NaiveDate::from_ymd_opt(2020, 4, 1).unwrap();
        let n = 10;
        let dates = (0..n).map(|i| start + Duration::days(i)).collect();
        let columns = ["A", "B", "C"]
            .iter()
            .map(|name| Column::new(*name, vec![1.0; n as usize]))
            .collect();
        ObservationTable::new(dates, "y", vec![0.0; n as usize], columns).unwrap()
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn tie_policy_comparisons() {
        assert!(TiePolicy::FirstSeen.improves(1.0, None));
        assert!(!TiePolicy::FirstSeen.improves(1.0, Some(1.0)));
        assert!(TiePolicy::LastSeen.improves(1.0, Some(1.0)));
        assert!(!TiePolicy::LastSeen.improves(1.1, Some(1.0)));
    }

    #[test]
    fn first_seen_keeps_first_of_tied_candidates() {
        let factory = ConstantFactory;
        let outcome = RegressorSelector::new(&factory)
            .select(&table(), &SplitRule::Holdout { days: 3 }, &names(&["A", "B", "C"]))
            .unwrap();
        // Pass 1: all tie, A wins. Pass 2: errors grow with more regressors.
        assert_eq!(outcome.keepers, names(&["A"]));
        assert_eq!(outcome.passes, 2);
        assert_eq!(outcome.trials.len(), 5);
    }

    #[test]
    fn last_seen_keeps_last_of_tied_candidates() {
        let factory = ConstantFactory;
        let outcome = RegressorSelector::new(&factory)
            .with_tie_policy(TiePolicy::LastSeen)
            .select(&table(), &SplitRule::Holdout { days: 3 }, &names(&["A", "B", "C"]))
            .unwrap();
        assert_eq!(outcome.keepers, names(&["C"]));
    }

    #[test]
    fn missing_and_duplicate_candidates_are_rejected() {
        let factory = ConstantFactory;
        let selector = RegressorSelector::new(&factory);
        let rule = SplitRule::Holdout { days: 3 };

        let err = selector.select(&table(), &rule, &names(&["A", "Z"])).unwrap_err();
        assert!(matches!(err, SelectionError::MissingColumn { column } if column == "Z"));

        let err = selector.select(&table(), &rule, &names(&["A", "A"])).unwrap_err();
        assert!(matches!(err, SelectionError::DuplicateCandidate(c) if c == "A"));

        let err = selector.select(&table(), &rule, &names(&["y"])).unwrap_err();
        assert!(matches!(err, SelectionError::MissingColumn { .. }));
    }

    #[test]
    fn empty_sides_are_rejected() {
        let factory = ConstantFactory;
        let selector = RegressorSelector::new(&factory);

        let err = selector
            .select(&table(), &SplitRule::Holdout { days: 10 }, &names(&["A"]))
            .unwrap_err();
        assert!(matches!(err, SelectionError::EmptySplit { side: SplitSide::Train }));

        let cutoff = NaiveDate::from_ymd_opt(2021, 1, 1).unwrap();
        let err = selector
            .select(&table(), &SplitRule::Cutoff { date: cutoff }, &names(&["A"]))
            .unwrap_err();
        assert!(matches!(err, SelectionError::EmptySplit { side: SplitSide::Test }));
        assert_eq!(err.to_string(), "test split is empty");
    }
}
