//! Country/region partitions of the dataset.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::oxcgrt::{DatasetRow, Jurisdiction};

/// One forecastable series: a country's national totals, or one of its regions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Partition {
    pub country: String,
    pub region: Option<String>,
}

impl Partition {
    pub fn national(country: impl Into<String>) -> Self {
        Self {
            country: country.into(),
            region: None,
        }
    }

    pub fn regional(country: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            country: country.into(),
            region: Some(region.into()),
        }
    }

    /// Whether `row` belongs to this partition.
    ///
    /// Without a region only `NAT_TOTAL` rows match; with one, only the
    /// `STATE_TOTAL` rows of that region.
    pub fn matches(&self, row: &DatasetRow) -> bool {
        if row.country != self.country {
            return false;
        }
        match &self.region {
            None => row.jurisdiction == Jurisdiction::National,
            Some(region) => {
                row.jurisdiction == Jurisdiction::State && row.region.as_deref() == Some(region)
            }
        }
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.region {
            Some(region) => write!(f, "{region}, {}", self.country),
            None => f.write_str(&self.country),
        }
    }
}
