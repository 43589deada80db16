//! OxCGRT dataset ingest.
//!
//! Parses the Oxford COVID-19 Government Response Tracker CSV layout from an
//! already-obtained byte stream or local file. The file is ISO-8859-1 encoded;
//! every byte is decoded as the Latin-1 code point of the same value.
//!
//! Identifier columns (`CountryName`, `RegionName`, `Jurisdiction`, `Date`, and
//! the code columns) are parsed into typed fields. Every other column is kept
//! as an optional numeric value keyed by its header. Empty or non-numeric
//! cells are missing values.
//!
//! Rows that cannot be decoded (bad date, unknown jurisdiction) are skipped
//! with a warning, matching how the upstream file is usually consumed.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{debug, warn};

use super::error::DataError;

pub const COUNTRY_NAME: &str = "CountryName";
pub const COUNTRY_CODE: &str = "CountryCode";
pub const REGION_NAME: &str = "RegionName";
pub const REGION_CODE: &str = "RegionCode";
pub const JURISDICTION: &str = "Jurisdiction";
pub const DATE: &str = "Date";

pub const CONFIRMED_CASES: &str = "ConfirmedCases";
pub const CONFIRMED_DEATHS: &str = "ConfirmedDeaths";
pub const NEW_CASES: &str = "NewCases";
pub const NEW_DEATHS: &str = "NewDeaths";

/// Columns parsed into typed row fields rather than kept as values.
pub const IDENTIFIER_COLUMNS: [&str; 6] = [
    COUNTRY_NAME,
    COUNTRY_CODE,
    REGION_NAME,
    REGION_CODE,
    JURISDICTION,
    DATE,
];

/// Outcome columns: the target and everything derived from it.
/// `ds` and `y` are the conventional forecaster names for date and target.
pub const OUTCOME_COLUMNS: [&str; 6] = [
    "ds",
    "y",
    NEW_CASES,
    NEW_DEATHS,
    CONFIRMED_CASES,
    CONFIRMED_DEATHS,
];

const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

/// Aggregation level of a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Jurisdiction {
    /// `NAT_TOTAL`: whole-country totals.
    National,
    /// `STATE_TOTAL`: one region (state/province) of a country.
    State,
}

impl Jurisdiction {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "NAT_TOTAL" => Some(Self::National),
            "STATE_TOTAL" => Some(Self::State),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::National => "NAT_TOTAL",
            Self::State => "STATE_TOTAL",
        }
    }
}

/// One parsed dataset row.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetRow {
    pub country: String,
    pub region: Option<String>,
    pub jurisdiction: Jurisdiction,
    pub date: NaiveDate,
    /// One entry per [`Dataset::value_columns`] entry.
    pub values: Vec<Option<f64>>,
}

/// Parsed OxCGRT rows plus the shared value-column header.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    value_columns: Vec<String>,
    rows: Vec<DatasetRow>,
    skipped_rows: usize,
}

impl Dataset {
    /// Build a dataset from already-parsed rows.
    ///
    /// Each row's `values` is padded with missing values (or truncated) to the
    /// header width. Confirmed counts on 2020-01-01 are seeded like a parsed file.
    pub fn new(value_columns: Vec<String>, mut rows: Vec<DatasetRow>) -> Self {
        for row in &mut rows {
            row.values.resize(value_columns.len(), None);
        }
        let mut dataset = Self {
            value_columns,
            rows,
            skipped_rows: 0,
        };
        dataset.seed_initial_counts();
        dataset
    }

    /// Parse a dataset from a local CSV file.
    pub fn from_path(path: &Path) -> Result<Self, DataError> {
        let file = File::open(path).map_err(|source| DataError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(BufReader::new(file))
    }

    /// Parse a dataset from any CSV byte stream.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, DataError> {
        let mut csv = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(reader);

        let headers: Vec<String> = csv
            .byte_headers()?
            .iter()
            .enumerate()
            .map(|(i, raw)| {
                let raw = if i == 0 {
                    raw.strip_prefix(&UTF8_BOM[..]).unwrap_or(raw)
                } else {
                    raw
                };
                decode_latin1(raw).trim().to_string()
            })
            .collect();

        let layout = Layout::resolve(&headers)?;
        let value_columns: Vec<String> = layout
            .value_indices
            .iter()
            .map(|&i| headers[i].clone())
            .collect();

        let mut rows = Vec::new();
        let mut skipped_rows = 0;
        let mut record = csv::ByteRecord::new();
        let mut line = 1usize;

        while csv.read_byte_record(&mut record)? {
            line += 1;
            match layout.parse_row(&record) {
                Some(row) => rows.push(row),
                None => {
                    skipped_rows += 1;
                    warn!(line, "skipping undecodable dataset row");
                }
            }
        }

        debug!(
            rows = rows.len(),
            skipped_rows,
            value_columns = value_columns.len(),
            "parsed OxCGRT dataset"
        );

        let mut dataset = Self {
            value_columns,
            rows,
            skipped_rows,
        };
        dataset.seed_initial_counts();
        Ok(dataset)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Headers of the non-identifier columns, in file order.
    pub fn value_columns(&self) -> &[String] {
        &self.value_columns
    }

    pub fn rows(&self) -> &[DatasetRow] {
        &self.rows
    }

    /// Rows dropped during parsing.
    pub fn skipped_rows(&self) -> usize {
        self.skipped_rows
    }

    pub fn value_index(&self, column: &str) -> Option<usize> {
        self.value_columns.iter().position(|c| c == column)
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.value_index(column).is_some()
    }

    /// Sorted distinct country names.
    pub fn countries(&self) -> Vec<&str> {
        self.rows
            .iter()
            .map(|r| r.country.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Sorted distinct region names of a country.
    pub fn regions(&self, country: &str) -> Vec<&str> {
        self.rows
            .iter()
            .filter(|r| r.country == country)
            .filter_map(|r| r.region.as_deref())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Seed missing confirmed counts on 2020-01-01 with zero, so the
    /// forward fill that follows has a starting value for every series.
    fn seed_initial_counts(&mut self) {
        let Some(first_day) = NaiveDate::from_ymd_opt(2020, 1, 1) else {
            return;
        };
        let indices: Vec<usize> = [CONFIRMED_CASES, CONFIRMED_DEATHS]
            .iter()
            .filter_map(|c| self.value_index(c))
            .collect();

        for row in self.rows.iter_mut().filter(|r| r.date == first_day) {
            for &i in &indices {
                if row.values[i].is_none() {
                    row.values[i] = Some(0.0);
                }
            }
        }
    }
}

/// Column positions resolved from the header row.
struct Layout {
    country: usize,
    region: usize,
    jurisdiction: Option<usize>,
    date: usize,
    value_indices: Vec<usize>,
}

impl Layout {
    fn resolve(headers: &[String]) -> Result<Self, DataError> {
        let find = |name: &str| headers.iter().position(|h| h == name);
        let require =
            |name: &str| find(name).ok_or_else(|| DataError::MissingColumn(name.to_string()));

        Ok(Self {
            country: require(COUNTRY_NAME)?,
            region: require(REGION_NAME)?,
            jurisdiction: find(JURISDICTION),
            date: require(DATE)?,
            value_indices: (0..headers.len())
                .filter(|&i| !IDENTIFIER_COLUMNS.contains(&headers[i].as_str()))
                .collect(),
        })
    }

    fn parse_row(&self, record: &csv::ByteRecord) -> Option<DatasetRow> {
        let field = |i: usize| record.get(i).map(decode_latin1).unwrap_or_default();

        let country = field(self.country).trim().to_string();
        if country.is_empty() {
            return None;
        }

        let region = Some(field(self.region).trim().to_string()).filter(|r| !r.is_empty());

        // Older extracts have no Jurisdiction column; infer from the region.
        let jurisdiction = match self.jurisdiction {
            Some(i) => Jurisdiction::parse(&field(i))?,
            None if region.is_some() => Jurisdiction::State,
            None => Jurisdiction::National,
        };

        let date = parse_date(&field(self.date))?;

        let values = self
            .value_indices
            .iter()
            .map(|&i| parse_value(&field(i)))
            .collect();

        Some(DatasetRow {
            country,
            region,
            jurisdiction,
            date,
            values,
        })
    }
}

fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

/// Accepts `YYYYMMDD` (the published layout) and `YYYY-MM-DD`.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y%m%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"))
        .ok()
}

fn parse_value(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
CountryName,CountryCode,RegionName,RegionCode,Jurisdiction,Date,C1_School closing,ConfirmedCases,ConfirmedDeaths,StringencyIndex
Aruba,ABW,,,NAT_TOTAL,20200101,0,,,0
Aruba,ABW,,,NAT_TOTAL,20200102,1,2,0,11.11
United States,USA,Washington,US_WA,STATE_TOTAL,20200101,0,,,0
United States,USA,Washington,US_WA,STATE_TOTAL,2020-01-02,,1,,
";

    fn parse(text: &str) -> Dataset {
        Dataset::from_reader(text.as_bytes()).unwrap()
    }

    #[test]
    fn splits_identifier_and_value_columns() {
        let ds = parse(SAMPLE);
        assert_eq!(
            ds.value_columns(),
            &[
                "C1_School closing".to_string(),
                "ConfirmedCases".to_string(),
                "ConfirmedDeaths".to_string(),
                "StringencyIndex".to_string(),
            ]
        );
        assert_eq!(ds.len(), 4);
        assert_eq!(ds.skipped_rows(), 0);
    }

    #[test]
    fn parses_both_date_layouts() {
        let ds = parse(SAMPLE);
        assert_eq!(ds.rows()[1].date, NaiveDate::from_ymd_opt(2020, 1, 2).unwrap());
        assert_eq!(ds.rows()[3].date, NaiveDate::from_ymd_opt(2020, 1, 2).unwrap());
    }

    #[test]
    fn empty_region_is_none() {
        let ds = parse(SAMPLE);
        assert_eq!(ds.rows()[0].region, None);
        assert_eq!(ds.rows()[2].region.as_deref(), Some("Washington"));
        assert_eq!(ds.rows()[2].jurisdiction, Jurisdiction::State);
    }

    #[test]
    fn seeds_confirmed_counts_on_first_day() {
        let ds = parse(SAMPLE);
        let cases = ds.value_index(CONFIRMED_CASES).unwrap();
        let deaths = ds.value_index(CONFIRMED_DEATHS).unwrap();
        assert_eq!(ds.rows()[0].values[cases], Some(0.0));
        assert_eq!(ds.rows()[0].values[deaths], Some(0.0));
        // Later days stay missing.
        assert_eq!(ds.rows()[3].values[deaths], None);
    }

    #[test]
    fn missing_required_column_is_an_error() {
        let err = Dataset::from_reader("CountryName,RegionName\nAruba,\n".as_bytes()).unwrap_err();
        assert!(matches!(err, DataError::MissingColumn(c) if c == DATE));
    }

    #[test]
    fn undecodable_rows_are_skipped() {
        let text = "\
CountryName,RegionName,Jurisdiction,Date,ConfirmedCases
Aruba,,NAT_TOTAL,notadate,1
Aruba,,CITY_TOTAL,20200105,1
Aruba,,NAT_TOTAL,20200106,3
";
        let ds = parse(text);
        assert_eq!(ds.len(), 1);
        assert_eq!(ds.skipped_rows(), 2);
    }

    #[test]
    fn infers_jurisdiction_without_column() {
        let text = "\
CountryName,RegionName,Date,ConfirmedCases
Brazil,,20200301,2
Brazil,Acre,20200301,0
";
        let ds = parse(text);
        assert_eq!(ds.rows()[0].jurisdiction, Jurisdiction::National);
        assert_eq!(ds.rows()[1].jurisdiction, Jurisdiction::State);
    }

    #[test]
    fn decodes_latin1_names() {
        let mut bytes = b"CountryName,RegionName,Date,ConfirmedCases\n".to_vec();
        bytes.extend_from_slice(b"Cura\xE7ao,,20200301,0\n");
        let ds = Dataset::from_reader(bytes.as_slice()).unwrap();
        assert_eq!(ds.rows()[0].country, "Curaçao");
    }

    #[test]
    fn strips_utf8_bom_from_first_header() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice(b"CountryName,RegionName,Date\nChad,,20200301\n");
        let ds = Dataset::from_reader(bytes.as_slice()).unwrap();
        assert_eq!(ds.len(), 1);
    }

    #[test]
    fn lists_countries_and_regions() {
        let ds = parse(SAMPLE);
        assert_eq!(ds.countries(), vec!["Aruba", "United States"]);
        assert_eq!(ds.regions("United States"), vec!["Washington"]);
        assert!(ds.regions("Aruba").is_empty());
    }

    #[test]
    fn new_pads_short_value_rows() {
        let ds = Dataset::new(
            vec!["a".into(), "b".into()],
            vec![DatasetRow {
                country: "Chad".into(),
                region: None,
                jurisdiction: Jurisdiction::National,
                date: NaiveDate::from_ymd_opt(2020, 3, 1).unwrap(),
                values: vec![Some(1.0)],
            }],
        );
        assert_eq!(ds.rows()[0].values, vec![Some(1.0), None]);
    }
}
