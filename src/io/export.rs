//! Export actual and predicted quantities to CSV.
//!
//! One row per point, long format, so the file drops straight into a
//! spreadsheet pivot or a plotting script:
//!
//! ```text
//! product,month,kind,quantity
//! Widget,2023-07,actual,40
//! Widget,2023-09,predicted,45
//! ```

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::domain::ProductForecast;
use crate::error::AppError;

/// Write forecasts to a CSV file.
pub fn write_forecasts_csv(path: &Path, forecasts: &[ProductForecast]) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::io(format!("Failed to create export CSV '{}': {e}", path.display())))?;
    write_forecasts(file, forecasts)
}

/// Write forecasts as CSV to any writer.
pub fn write_forecasts<W: Write>(out: W, forecasts: &[ProductForecast]) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_writer(out);

    writer
        .write_record(["product", "month", "kind", "quantity"])
        .map_err(|e| AppError::io(format!("Failed to write export CSV header: {e}")))?;

    for f in forecasts {
        for a in &f.actuals {
            let month = a.calendar_month.to_string();
            let quantity = a.quantity.to_string();
            writer
                .write_record([f.product.as_str(), month.as_str(), "actual", quantity.as_str()])
                .map_err(|e| AppError::io(format!("Failed to write export CSV row: {e}")))?;
        }
        for p in &f.predictions {
            let month = p.calendar_month.to_string();
            let quantity = p.predicted_quantity.to_string();
            writer
                .write_record([f.product.as_str(), month.as_str(), "predicted", quantity.as_str()])
                .map_err(|e| AppError::io(format!("Failed to write export CSV row: {e}")))?;
        }
    }

    writer
        .flush()
        .map_err(|e| AppError::io(format!("Failed to flush export CSV: {e}")))?;
    Ok(())
}
