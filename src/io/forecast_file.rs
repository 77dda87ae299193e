//! Read/write forecast JSON files.
//!
//! A forecast file is the portable result of one `sf forecast` run:
//! - run metadata (source file, window size, forecast mode)
//! - the preprocessing state needed to interpret it (scale, product order)
//! - per-product actual and predicted series
//! - the training loss history, when the model was trained in that run
//!
//! `sf show` reads it back and prints the same tables as the original run.

use std::fs::File;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::{ForecastMode, ProductForecast, YearMonth};
use crate::error::AppError;
use crate::models::TrainingHistory;
use crate::prep::{ProductEncoding, QuantityScale};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastFile {
    pub tool: String,
    pub source: String,
    pub window_size: usize,
    pub mode: ForecastMode,
    pub scale: QuantityScale,
    pub origin: YearMonth,
    pub last_month: YearMonth,
    pub products: ProductEncoding,
    pub forecasts: Vec<ProductForecast>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub training: Option<TrainingHistory>,
}

/// Write a forecast JSON file.
pub fn write_forecast_json(path: &Path, forecast: &ForecastFile) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::io(format!("Failed to create forecast JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(file, forecast)
        .map_err(|e| AppError::io(format!("Failed to write forecast JSON: {e}")))?;
    Ok(())
}

/// Read a forecast JSON file.
pub fn read_forecast_json(path: &Path) -> Result<ForecastFile, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::io(format!("Failed to open forecast JSON '{}': {e}", path.display())))?;
    let forecast: ForecastFile = serde_json::from_reader(file)
        .map_err(|e| AppError::input(format!("Invalid forecast JSON: {e}")))?;
    Ok(forecast)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_training_section_is_allowed() {
        let json = r#"{
            "tool": "sf",
            "source": "sales.csv",
            "window_size": 6,
            "mode": "single",
            "scale": { "min": 10.0, "max": 80.0 },
            "origin": "2023-01",
            "last_month": "2023-08",
            "products": ["A"],
            "forecasts": [
                {
                    "product": "A",
                    "actuals": [{ "calendar_month": "2023-08", "quantity": 80.0 }],
                    "predictions": [{ "calendar_month": "2023-09", "predicted_quantity": 45 }]
                }
            ]
        }"#;

        let file: ForecastFile = serde_json::from_str(json).unwrap();
        assert!(file.training.is_none());
        assert_eq!(file.products.id_of("A"), Some(0));
        assert_eq!(file.forecasts[0].predictions[0].predicted_quantity, 45);
        assert_eq!(file.last_month.to_string(), "2023-08");
    }

    #[test]
    fn bad_month_is_rejected() {
        let json = r#"{ "calendar_month": "2023-9", "predicted_quantity": 1 }"#;
        assert!(serde_json::from_str::<crate::domain::ForecastPoint>(json).is_err());
    }
}
