//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during preprocessing and forecasting
//! - exported to JSON/CSV
//! - reloaded later by `sf show`

use std::fmt;
use std::path::PathBuf;

use chrono::{Datelike, Months, NaiveDate};
use clap::ValueEnum;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A calendar month, written `YYYY-MM`.
///
/// Backed by the first day of the month so ordering and month arithmetic come
/// from `chrono`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth(NaiveDate);

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(Self)
    }

    /// Parse a strict `YYYY-MM` string (surrounding whitespace is ignored).
    pub fn parse(s: &str) -> Result<Self, String> {
        let s = s.trim();
        let bytes = s.as_bytes();
        let shape_ok = bytes.len() == 7
            && bytes[4] == b'-'
            && bytes[..4].iter().all(u8::is_ascii_digit)
            && bytes[5..].iter().all(u8::is_ascii_digit);
        if !shape_ok {
            return Err(format!("Invalid month '{s}'. Expected YYYY-MM."));
        }

        NaiveDate::parse_from_str(&format!("{s}-01"), "%Y-%m-%d")
            .map(Self)
            .map_err(|_| format!("Invalid month '{s}'. Expected YYYY-MM."))
    }

    pub fn year(self) -> i32 {
        self.0.year()
    }

    pub fn month(self) -> u32 {
        self.0.month()
    }

    /// Signed number of months from `origin` to `self`.
    pub fn months_since(self, origin: YearMonth) -> i64 {
        i64::from(self.year() - origin.year()) * 12 + i64::from(self.month()) - i64::from(origin.month())
    }

    /// `self + n` months; `None` past chrono's supported range.
    pub fn add_months(self, n: u32) -> Option<Self> {
        self.0.checked_add_months(Months::new(n)).map(Self)
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m"))
    }
}

impl Serialize for YearMonth {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for YearMonth {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// One validated CSV row.
#[derive(Debug, Clone, PartialEq)]
pub struct SalesRecord {
    pub month: YearMonth,
    pub product: String,
    pub quantity_sold: f64,
}

/// Model-ready view of a `SalesRecord` (same index, same order).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EncodedRecord {
    pub month_offset: u32,
    pub product_id: usize,
    pub normalized_quantity: f64,
}

/// One supervised training pair: `window_size` steps of context and the
/// normalized quantity that follows them.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowSample {
    /// `(month_offset, product_id)` per step.
    pub history: Vec<(u32, usize)>,
    pub target: f64,
}

/// A single forecast value for a calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub calendar_month: YearMonth,
    pub predicted_quantity: i64,
}

/// Observed quantity for a calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActualPoint {
    pub calendar_month: YearMonth,
    pub quantity: f64,
}

/// Forecast output for one product: what was sold and what is predicted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductForecast {
    pub product: String,
    pub actuals: Vec<ActualPoint>,
    pub predictions: Vec<ForecastPoint>,
}

/// How many future points are produced per product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ForecastMode {
    /// One inference per product, paired with the first future month.
    ///
    /// `window_size` future labels are generated but only the first is used.
    Single,
    /// Shift the offset window forward one month per step and run one
    /// inference per step, for `horizon` steps.
    Rolling,
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults and `SF_*` variables).
#[derive(Debug, Clone)]
pub struct ForecastConfig {
    pub csv_path: PathBuf,
    pub window_size: usize,

    pub epochs: usize,
    pub validation_split: f64,
    pub batch_size: usize,
    pub hidden_units: usize,
    pub learning_rate: f64,
    pub seed: u64,

    pub mode: ForecastMode,
    /// Number of future months per product in `rolling` mode.
    pub horizon: usize,

    /// Number of trailing actual months shown per product in reports.
    pub show_actuals: usize,

    pub export_csv: Option<PathBuf>,
    pub export_json: Option<PathBuf>,
    pub save_model: Option<PathBuf>,
    pub load_model: Option<PathBuf>,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            csv_path: PathBuf::new(),
            window_size: 6,
            epochs: 50,
            validation_split: 0.2,
            batch_size: 32,
            hidden_units: 16,
            learning_rate: 0.01,
            seed: 42,
            mode: ForecastMode::Single,
            horizon: 1,
            show_actuals: 12,
            export_csv: None,
            export_json: None,
            save_model: None,
            load_model: None,
        }
    }
}
