//! Synthetic data for tests and benchmarks.
//!
//! Produces a daily new-case series driven by three policy-like columns:
//! - `driver_a`: strong effect, cycles through levels 0..=3 every 12 days
//! - `driver_b`: weak effect, random step levels
//! - `noise_c`: no effect, random levels
//!
//! The series is deterministic for a given seed and clearly fake.

use chrono::{Datelike, Duration, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use casecast_core::data::oxcgrt::{CONFIRMED_CASES, CONFIRMED_DEATHS};
use casecast_core::data::{Dataset, DatasetRow, Jurisdiction};
use casecast_core::domain::{Column, ObservationTable, TableError};

pub const STRONG_DRIVER: &str = "driver_a";
pub const WEAK_DRIVER: &str = "driver_b";
pub const NOISE_COLUMN: &str = "noise_c";

const BASE_LEVEL: f64 = 200.0;
const STRONG_EFFECT: f64 = 40.0;
const WEAK_EFFECT: f64 = 5.0;
const WEEKLY: [f64; 7] = [4.0, 2.0, 0.0, 0.0, 1.0, -6.0, -10.0];

#[derive(Debug, Clone)]
pub struct SyntheticConfig {
    pub start: NaiveDate,
    pub days: usize,
    pub seed: u64,
    /// Half-width of the uniform noise added to each day.
    pub noise: f64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            start: NaiveDate::from_ymd_opt(2020, 3, 1).unwrap_or_default(),
            days: 90,
            seed: 42,
            noise: 3.0,
        }
    }
}

/// The regressor names in column order.
pub fn driver_names() -> Vec<String> {
    [STRONG_DRIVER, WEAK_DRIVER, NOISE_COLUMN]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

struct Series {
    dates: Vec<NaiveDate>,
    target: Vec<f64>,
    drivers: [Vec<f64>; 3],
}

fn generate(config: &SyntheticConfig) -> Series {
    let mut rng = StdRng::seed_from_u64(config.seed);

    let mut weak_level = 0.0;
    let mut series = Series {
        dates: Vec::with_capacity(config.days),
        target: Vec::with_capacity(config.days),
        drivers: Default::default(),
    };

    for i in 0..config.days {
        let strong = ((i / 12) % 4) as f64;
        if i % 9 == 0 {
            weak_level = f64::from(rng.gen_range(0u8..=3));
        }
        let noise_level = f64::from(rng.gen_range(0u8..=3));
        let jitter = if config.noise > 0.0 {
            rng.gen_range(-config.noise..config.noise)
        } else {
            0.0
        };

        let date = config.start + Duration::days(i as i64);
        let weekly = WEEKLY[date.weekday().num_days_from_monday() as usize];
        let value = BASE_LEVEL + weekly + STRONG_EFFECT * strong + WEAK_EFFECT * weak_level + jitter;

        series.dates.push(date);
        series.target.push(value.round());
        series.drivers[0].push(strong);
        series.drivers[1].push(weak_level);
        series.drivers[2].push(noise_level);
    }
    series
}

/// A `NewCases` observation table with the three driver columns.
pub fn synthetic_table(config: &SyntheticConfig) -> Result<ObservationTable, TableError> {
    let series = generate(config);
    let columns = driver_names()
        .into_iter()
        .zip(series.drivers)
        .map(|(name, values)| Column::new(name, values))
        .collect();
    ObservationTable::new(series.dates, "NewCases", series.target, columns)
}

/// A one-country dataset whose confirmed cases accumulate the synthetic series.
///
/// Building the `NewCases` series of `country` from it gives the synthetic
/// target back, except the first day, which is 0.
pub fn synthetic_dataset(country: &str, config: &SyntheticConfig) -> Dataset {
    let series = generate(config);
    let mut value_columns = driver_names();
    value_columns.push(CONFIRMED_CASES.to_string());
    value_columns.push(CONFIRMED_DEATHS.to_string());

    let mut cases = 0.0;
    let rows = series
        .dates
        .iter()
        .enumerate()
        .map(|(i, &date)| {
            if i > 0 {
                cases += series.target[i];
            }
            let mut values: Vec<Option<f64>> =
                series.drivers.iter().map(|d| Some(d[i])).collect();
            values.push(Some(cases));
            values.push(Some((cases / 50.0).floor()));
            DatasetRow {
                country: country.to_string(),
                region: None,
                jurisdiction: Jurisdiction::National,
                date,
                values,
            }
        })
        .collect();

    Dataset::new(value_columns, rows)
}
