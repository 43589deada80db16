//! Append-only log of every candidate evaluation in a selection search.

use serde::{Deserialize, Serialize};

/// One scored candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialRecord {
    /// 1-based outer pass number.
    pub pass: usize,
    /// The candidate tried on top of the keepers.
    pub candidate: String,
    /// Keepers at the time plus `candidate`, in order.
    pub regressors: Vec<String>,
    /// Mean percent error on the test split.
    pub error: f64,
    /// Whether this trial set a new global minimum.
    pub improved: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrialLog {
    records: Vec<TrialRecord>,
}

impl TrialLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: TrialRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[TrialRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Lowest error logged so far.
    pub fn global_min(&self) -> Option<f64> {
        self.records.iter().map(|r| r.error).reduce(f64::min)
    }

    /// Global minimum after each trial, in log order.
    pub fn running_minimum(&self) -> Vec<f64> {
        let mut min = f64::INFINITY;
        self.records
            .iter()
            .map(|r| {
                min = min.min(r.error);
                min
            })
            .collect()
    }

    /// The last trial that set a new global minimum.
    pub fn best_record(&self) -> Option<&TrialRecord> {
        self.records.iter().rev().find(|r| r.improved)
    }

    /// Trials of one pass.
    pub fn pass(&self, pass: usize) -> impl Iterator<Item = &TrialRecord> {
        self.records.iter().filter(move |r| r.pass == pass)
    }
}
