//! Domain types: observation tables, future frames, and train/test splits.

pub mod split;
pub mod table;

pub use split::{SplitRule, SplitSide, TrainTestSplit};
pub use table::{Column, FutureFrame, ObservationTable, TableError};
