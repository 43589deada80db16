//! Train/test splitting of an observation table.
//!
//! A split is a training prefix and a test suffix partitioned by a cutoff date:
//! rows dated before the cutoff train, the rest test. The two sides are
//! disjoint and together cover the whole table.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::table::ObservationTable;

/// How to place the cutoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SplitRule {
    /// Rows dated before `date` train, the rest test.
    Cutoff { date: NaiveDate },
    /// The last `days` rows test, the rest train.
    Holdout { days: usize },
}

impl SplitRule {
    pub fn apply(&self, table: &ObservationTable) -> TrainTestSplit {
        match *self {
            Self::Cutoff { date } => TrainTestSplit::at_cutoff(table, date),
            Self::Holdout { days } => TrainTestSplit::holdout(table, days),
        }
    }
}

/// Which side of a split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SplitSide {
    Train,
    Test,
}

impl std::fmt::Display for SplitSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Train => f.write_str("training"),
            Self::Test => f.write_str("test"),
        }
    }
}

/// Training prefix and test suffix of one table.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainTestSplit {
    cutoff: NaiveDate,
    train: ObservationTable,
    test: ObservationTable,
}

impl TrainTestSplit {
    /// Split at `cutoff`. Either side may come out empty.
    pub fn at_cutoff(table: &ObservationTable, cutoff: NaiveDate) -> Self {
        let at = table.partition_point(cutoff);
        Self {
            cutoff,
            train: table.slice(0, at),
            test: table.slice(at, table.len()),
        }
    }

    /// Hold out the last `days` rows for testing.
    ///
    /// `days == 0` yields an empty test side; `days >= len` an empty training
    /// side. An empty table splits into two empty sides at `NaiveDate::MIN`.
    pub fn holdout(table: &ObservationTable, days: usize) -> Self {
        let (first, last) = match (table.first_date(), table.last_date()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Self::at_cutoff(table, NaiveDate::MIN),
        };

        let cutoff = if days == 0 {
            last + chrono::Duration::days(1)
        } else if days >= table.len() {
            first
        } else {
            table.dates()[table.len() - days]
        };

        Self::at_cutoff(table, cutoff)
    }

    pub fn cutoff(&self) -> NaiveDate {
        self.cutoff
    }

    pub fn train(&self) -> &ObservationTable {
        &self.train
    }

    pub fn test(&self) -> &ObservationTable {
        &self.test
    }

    /// The first empty side, if any.
    pub fn empty_side(&self) -> Option<SplitSide> {
        if self.train.is_empty() {
            Some(SplitSide::Train)
        } else if self.test.is_empty() {
            Some(SplitSide::Test)
        } else {
            None
        }
    }
}
