//! Quarterly market data handling for forecasting

use crate::error::{ForecastError, Result};
use polars::prelude::*;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::fs::File;
use std::path::Path;
use std::str::FromStr;

/// A calendar quarter, e.g. `2023Q4`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Quarter {
    year: i32,
    quarter: u8,
}

impl Quarter {
    /// Create a new quarter. The quarter number must be 1-4.
    pub fn new(year: i32, quarter: u8) -> Result<Self> {
        if !(1..=4).contains(&quarter) {
            return Err(ForecastError::InvalidParameter(format!(
                "Quarter must be 1-4, got {}",
                quarter
            )));
        }
        Ok(Self { year, quarter })
    }

    /// Year of this quarter
    pub fn year(&self) -> i32 {
        self.year
    }

    /// Quarter of year (1-4)
    pub fn of_year(&self) -> u8 {
        self.quarter
    }

    /// The next quarter
    pub fn succ(&self) -> Quarter {
        if self.quarter == 4 {
            Quarter {
                year: self.year + 1,
                quarter: 1,
            }
        } else {
            Quarter {
                year: self.year,
                quarter: self.quarter + 1,
            }
        }
    }

    /// First month of this quarter (1-12)
    pub fn first_month(&self) -> u32 {
        (self.quarter as u32 - 1) * 3 + 1
    }

    /// Generate `horizon` consecutive quarters starting after `self`
    pub fn following(&self, horizon: usize) -> Vec<Quarter> {
        let mut quarters = Vec::with_capacity(horizon);
        let mut current = self.succ();
        for _ in 0..horizon {
            quarters.push(current);
            current = current.succ();
        }
        quarters
    }
}

impl fmt::Display for Quarter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}Q{}", self.year, self.quarter)
    }
}

impl FromStr for Quarter {
    type Err = ForecastError;

    /// Parse from `2023Q4` or `2023-Q4`
    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.replace("-Q", "Q").replace("-q", "Q");
        let (year_part, quarter_part) = normalized.split_once(['Q', 'q']).ok_or_else(|| {
            ForecastError::DataError(format!("Invalid quarter format: '{}'", s))
        })?;

        let year: i32 = year_part
            .trim()
            .parse()
            .map_err(|_| ForecastError::DataError(format!("Invalid year in quarter: '{}'", s)))?;
        let quarter: u8 = quarter_part
            .trim()
            .parse()
            .map_err(|_| ForecastError::DataError(format!("Invalid quarter number: '{}'", s)))?;

        Quarter::new(year, quarter)
    }
}

impl Serialize for Quarter {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Quarter {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(D::Error::custom)
    }
}

/// Ordered quarterly time series of a single market variable
#[derive(Debug, Clone, PartialEq)]
pub struct QuarterlySeries {
    quarters: Vec<Quarter>,
    values: Vec<f64>,
}

impl QuarterlySeries {
    /// Create a new series. Quarters and values must have the same length.
    pub fn new(quarters: Vec<Quarter>, values: Vec<f64>) -> Result<Self> {
        if quarters.len() != values.len() {
            return Err(ForecastError::DataError(format!(
                "Quarters length ({}) doesn't match values length ({})",
                quarters.len(),
                values.len()
            )));
        }
        Ok(Self { quarters, values })
    }

    /// Build a series from a starting quarter and consecutive values
    pub fn from_start(start: Quarter, values: Vec<f64>) -> Self {
        let mut quarters = Vec::with_capacity(values.len());
        let mut current = start;
        for _ in 0..values.len() {
            quarters.push(current);
            current = current.succ();
        }
        Self { quarters, values }
    }

    /// Get the quarters
    pub fn quarters(&self) -> &[Quarter] {
        &self.quarters
    }

    /// Get the values
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Last observed quarter, if any
    pub fn last_quarter(&self) -> Option<Quarter> {
        self.quarters.last().copied()
    }

    /// Last observed value, if any
    pub fn last_value(&self) -> Option<f64> {
        self.values.last().copied()
    }

    /// Check if the series is empty
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Get the length of the series
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Get a slice of the series from start to end index
    pub fn slice(&self, start: usize, end: Option<usize>) -> Result<Self> {
        let end = end.unwrap_or(self.len());
        if start > end || end > self.len() {
            return Err(ForecastError::DataError(format!(
                "Invalid slice range {}..{} for series of length {}",
                start,
                end,
                self.len()
            )));
        }
        Ok(Self {
            quarters: self.quarters[start..end].to_vec(),
            values: self.values[start..end].to_vec(),
        })
    }

    /// Split into training head and test tail
    pub fn train_test_split(&self, test_ratio: f64) -> Result<(Self, Self)> {
        if test_ratio <= 0.0 || test_ratio >= 1.0 {
            return Err(ForecastError::InvalidParameter(
                "Test ratio must be between 0 and 1".to_string(),
            ));
        }
        let test_size = ((self.len() as f64) * test_ratio).round() as usize;
        let train_size = self.len().saturating_sub(test_size.max(1));
        Ok((self.slice(0, Some(train_size))?, self.slice(train_size, None)?))
    }

    /// Calculate the mean of the values
    pub fn mean(&self) -> Result<f64> {
        if self.values.is_empty() {
            return Err(ForecastError::DataError("Empty series".to_string()));
        }
        Ok(self.values.iter().sum::<f64>() / self.values.len() as f64)
    }

    /// Calculate the standard deviation of the values
    pub fn std_dev(&self) -> Result<f64> {
        let mean = self.mean()?;
        let variance = self
            .values
            .iter()
            .map(|v| (v - mean).powi(2))
            .sum::<f64>()
            / self.values.len() as f64;
        Ok(variance.sqrt())
    }
}

/// One aggregated quarterly market observation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuarterRecord {
    /// Quarter label
    pub quarter: Quarter,
    /// Total active listings in the snapshot
    pub total_listings: f64,
    /// Average nightly price after outlier removal
    pub avg_price: f64,
    /// Occupancy rate derived from availability (0-1)
    pub occupancy_rate: f64,
    /// Reviews in the last twelve months per listing
    pub reviews_per_listing: f64,
}

/// Aggregated multivariate quarterly market history
#[derive(Debug, Clone)]
pub struct MarketHistory {
    records: Vec<QuarterRecord>,
}

impl MarketHistory {
    /// Create a history from quarterly records, sorted by quarter
    pub fn new(mut records: Vec<QuarterRecord>) -> Result<Self> {
        if records.is_empty() {
            return Err(ForecastError::DataError(
                "Market history requires at least one quarter".to_string(),
            ));
        }
        records.sort_by_key(|r| r.quarter);
        Ok(Self { records })
    }

    /// Built-in LA market history used when no data directory is configured.
    /// Quarterly listing totals from the 2022Q4-2023Q3 snapshots.
    pub fn sample() -> Self {
        let quarters = [
            (2022, 4, 40438.0, 214.6, 0.52, 7.9),
            (2023, 1, 42451.0, 219.8, 0.54, 8.3),
            (2023, 2, 44464.0, 227.4, 0.57, 8.8),
            (2023, 3, 44594.0, 231.1, 0.59, 9.1),
        ];
        let records = quarters
            .iter()
            .map(|&(year, q, listings, price, occ, reviews)| QuarterRecord {
                quarter: Quarter { year, quarter: q },
                total_listings: listings,
                avg_price: price,
                occupancy_rate: occ,
                reviews_per_listing: reviews,
            })
            .collect();
        Self { records }
    }

    /// Load aggregated history from a JSON snapshot file
    pub fn from_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let records: Vec<QuarterRecord> = serde_json::from_reader(file)?;
        Self::new(records)
    }

    /// The underlying quarterly records
    pub fn records(&self) -> &[QuarterRecord] {
        &self.records
    }

    /// Number of observed quarters
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the history is empty
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Last observed quarter
    pub fn last_quarter(&self) -> Quarter {
        self.records.last().map(|r| r.quarter).unwrap_or(Quarter {
            year: 2023,
            quarter: 3,
        })
    }

    fn series_of<F: Fn(&QuarterRecord) -> f64>(&self, f: F) -> QuarterlySeries {
        QuarterlySeries {
            quarters: self.records.iter().map(|r| r.quarter).collect(),
            values: self.records.iter().map(f).collect(),
        }
    }

    /// Listing volume series
    pub fn volume(&self) -> QuarterlySeries {
        self.series_of(|r| r.total_listings)
    }

    /// Average nightly price series
    pub fn avg_price(&self) -> QuarterlySeries {
        self.series_of(|r| r.avg_price)
    }

    /// Occupancy rate series
    pub fn occupancy(&self) -> QuarterlySeries {
        self.series_of(|r| r.occupancy_rate)
    }

    /// Reviews per listing series
    pub fn reviews_per_listing(&self) -> QuarterlySeries {
        self.series_of(|r| r.reviews_per_listing)
    }
}

/// Loader that aggregates raw quarterly listings snapshots
#[derive(Debug)]
pub struct SnapshotLoader;

impl SnapshotLoader {
    /// Load a directory of `<quarter>.csv` snapshot files (e.g. `2023Q1.csv`)
    pub fn from_dir<P: AsRef<Path>>(dir: P) -> Result<MarketHistory> {
        let mut records = Vec::new();

        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("csv") {
                continue;
            }
            let stem = match path.file_stem().and_then(|s| s.to_str()) {
                Some(s) => s,
                None => continue,
            };
            let quarter: Quarter = match stem.parse() {
                Ok(q) => q,
                Err(_) => {
                    tracing::warn!(file = %path.display(), "Skipping snapshot with unrecognized quarter label");
                    continue;
                }
            };
            records.push(Self::load_snapshot(&path, quarter)?);
        }

        if records.is_empty() {
            return Err(ForecastError::DataError(
                "No quarterly snapshot files found".to_string(),
            ));
        }
        MarketHistory::new(records)
    }

    /// Aggregate a single raw listings CSV into one quarterly record
    pub fn load_snapshot<P: AsRef<Path>>(path: P, quarter: Quarter) -> Result<QuarterRecord> {
        let file = File::open(path)?;
        let df = CsvReader::new(file)
            .infer_schema(None)
            .has_header(true)
            .finish()?;

        let total_listings = df.height() as f64;
        if df.height() == 0 {
            return Err(ForecastError::DataError(format!(
                "Snapshot for {} contains no listings",
                quarter
            )));
        }

        let prices = Self::column_as_f64(&df, "price")?;
        let avg_price = Self::mean_below_p99(&prices);

        let availability = Self::column_as_f64(&df, "availability_365").unwrap_or_default();
        let occupancy_rate = if availability.is_empty() {
            0.0
        } else {
            let avg_availability =
                availability.iter().sum::<f64>() / availability.len() as f64;
            1.0 - (avg_availability / 365.0)
        };

        let reviews = Self::column_as_f64(&df, "number_of_reviews_ltm").unwrap_or_default();
        let reviews_per_listing = reviews.iter().sum::<f64>() / total_listings;

        Ok(QuarterRecord {
            quarter,
            total_listings,
            avg_price,
            occupancy_rate,
            reviews_per_listing,
        })
    }

    /// Mean after dropping values above the 99th percentile
    fn mean_below_p99(values: &[f64]) -> f64 {
        if values.is_empty() {
            return 0.0;
        }
        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        let cutoff_idx = ((sorted.len() as f64) * 0.99).floor() as usize;
        let cutoff = sorted[cutoff_idx.min(sorted.len() - 1)];

        let kept: Vec<f64> = values.iter().copied().filter(|v| *v <= cutoff).collect();
        if kept.is_empty() {
            return 0.0;
        }
        kept.iter().sum::<f64>() / kept.len() as f64
    }

    /// Helper method to get a column as f64 values
    fn column_as_f64(df: &DataFrame, column_name: &str) -> Result<Vec<f64>> {
        let col = df.column(column_name).map_err(|e| {
            ForecastError::DataError(format!("Column '{}' not found: {}", column_name, e))
        })?;

        match col.dtype() {
            DataType::Float64 => Ok(col.f64()?.into_iter().flatten().collect()),
            DataType::Float32 => Ok(col
                .f32()?
                .into_iter()
                .flatten()
                .map(|v| v as f64)
                .collect()),
            DataType::Int64 => Ok(col
                .i64()?
                .into_iter()
                .flatten()
                .map(|v| v as f64)
                .collect()),
            DataType::Int32 => Ok(col
                .i32()?
                .into_iter()
                .flatten()
                .map(|v| v as f64)
                .collect()),
            DataType::UInt64 => Ok(col
                .u64()?
                .into_iter()
                .flatten()
                .map(|v| v as f64)
                .collect()),
            DataType::UInt32 => Ok(col
                .u32()?
                .into_iter()
                .flatten()
                .map(|v| v as f64)
                .collect()),
            _ => Err(ForecastError::DataError(format!(
                "Column '{}' cannot be converted to f64",
                column_name
            ))),
        }
    }
}
