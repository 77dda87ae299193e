//! CSV ingest and validation.
//!
//! This module is responsible for turning a monthly sales CSV into a clean,
//! ordered list of `SalesRecord`s.
//!
//! Design goals:
//! - **Strict schema** for required columns (clear errors + exit code 2)
//! - **Row-level validation** (drop bad rows, but report what happened)
//! - **Input order preserved** (rows are never sorted)
//! - **Separation of concerns**: no preprocessing here

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;

use crate::domain::{SalesRecord, YearMonth};
use crate::error::AppError;

/// Columns every input file must have (matched case-insensitively).
pub const REQUIRED_COLUMNS: [&str; 3] = ["sales_date", "product_description", "quantity_sold"];

/// Summary stats about the rows actually used.
#[derive(Debug, Clone)]
pub struct DatasetStats {
    pub n_rows: usize,
    pub n_products: usize,
    pub month_min: YearMonth,
    pub month_max: YearMonth,
    pub quantity_min: f64,
    pub quantity_max: f64,
}

/// A row-level error encountered during ingest.
#[derive(Debug, Clone)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Ingest output: validated records + stats + dropped rows.
#[derive(Debug, Clone)]
pub struct IngestedData {
    pub records: Vec<SalesRecord>,
    pub stats: DatasetStats,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
    pub rows_used: usize,
}

/// Load and validate a sales CSV file.
pub fn load_sales_csv(path: &Path) -> Result<IngestedData, AppError> {
    ensure_csv_extension(path)?;

    let file = File::open(path)
        .map_err(|e| AppError::input(format!("Failed to open CSV '{}': {e}", path.display())))?;

    let data = read_sales(file)?;
    log::info!(
        "Loaded '{}': {} of {} rows used.",
        path.display(),
        data.rows_used,
        data.rows_read
    );
    Ok(data)
}

/// Validate sales rows from any reader.
pub fn read_sales<R: Read>(input: R) -> Result<IngestedData, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input);

    let headers = reader
        .headers()
        .map_err(|e| AppError::input(format!("Failed to read CSV headers: {e}")))?
        .clone();

    let header_map = build_header_map(&headers);
    ensure_required_columns_exist(&header_map)?;

    let mut records = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // +2: 1-based lines, plus the header line.
        let line = idx + 2;
        rows_read += 1;

        let parsed = result
            .map_err(|e| format!("CSV parse error: {e}"))
            .and_then(|record| parse_row(&record, &header_map));

        match parsed {
            Ok(row) => records.push(row),
            Err(message) => {
                log::debug!("Dropping line {line}: {message}");
                row_errors.push(RowError { line, message });
            }
        }
    }

    let rows_used = records.len();
    let stats = compute_stats(&records)
        .ok_or_else(|| AppError::no_data("No valid rows remain after validation."))?;

    if !row_errors.is_empty() {
        log::warn!("Dropped {} invalid row(s).", row_errors.len());
    }

    Ok(IngestedData {
        records,
        stats,
        row_errors,
        rows_read,
        rows_used,
    })
}

fn ensure_csv_extension(path: &Path) -> Result<(), AppError> {
    let is_csv = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"));
    if is_csv {
        Ok(())
    } else {
        Err(AppError::input(format!(
            "'{}' is not a CSV file (expected a .csv extension).",
            path.display()
        )))
    }
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    let mut map = HashMap::new();
    for (idx, name) in headers.iter().enumerate() {
        // First occurrence wins for duplicated headers.
        map.entry(normalize_header_name(name)).or_insert(idx);
    }
    map
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports often prefix the first header with a UTF-8 BOM.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn ensure_required_columns_exist(header_map: &HashMap<String, usize>) -> Result<(), AppError> {
    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|c| !header_map.contains_key(*c))
        .collect();
    if missing.is_empty() {
        return Ok(());
    }
    let list = missing.iter().map(|c| format!("`{c}`")).collect::<Vec<_>>().join(", ");
    Err(AppError::input(format!("Missing required column(s): {list}")))
}

fn parse_row(record: &StringRecord, header_map: &HashMap<String, usize>) -> Result<SalesRecord, String> {
    let month = YearMonth::parse(get_required(record, header_map, "sales_date")?)?;
    let product = get_required(record, header_map, "product_description")?.to_string();
    let quantity_sold = parse_quantity(get_required(record, header_map, "quantity_sold")?)?;

    Ok(SalesRecord {
        month,
        product,
        quantity_sold,
    })
}

fn get_required<'a>(
    record: &'a StringRecord,
    header_map: &HashMap<String, usize>,
    name: &str,
) -> Result<&'a str, String> {
    let idx = header_map
        .get(name)
        .ok_or_else(|| format!("Missing required column: `{name}`"))?;
    record
        .get(*idx)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("Missing required value: `{name}`"))
}

/// Parse a quantity that may arrive as a quoted string (`"12"`, `' 7.5 '`).
fn parse_quantity(s: &str) -> Result<f64, String> {
    let cleaned = s
        .trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .trim();
    let v = cleaned
        .parse::<f64>()
        .map_err(|_| format!("Invalid `quantity_sold` '{s}'."))?;
    if v.is_finite() {
        Ok(v)
    } else {
        Err(format!("Non-finite `quantity_sold` '{s}'."))
    }
}

fn compute_stats(records: &[SalesRecord]) -> Option<DatasetStats> {
    let month_min = records.iter().map(|r| r.month).min()?;
    let month_max = records.iter().map(|r| r.month).max()?;

    let mut quantity_min = f64::INFINITY;
    let mut quantity_max = f64::NEG_INFINITY;
    for r in records {
        quantity_min = quantity_min.min(r.quantity_sold);
        quantity_max = quantity_max.max(r.quantity_sold);
    }

    let n_products = records.iter().map(|r| r.product.as_str()).collect::<HashSet<_>>().len();

    Some(DatasetStats {
        n_rows: records.len(),
        n_products,
        month_min,
        month_max,
        quantity_min,
        quantity_max,
    })
}
