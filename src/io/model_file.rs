//! Save and load trained models.
//!
//! The file wraps the model with the preprocessing facts it was trained
//! against. Loading checks them, so a model is never silently applied to data
//! with a different window size or product order.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::{RecurrentRegressor, Regressor};
use crate::prep::{PreparedData, ProductEncoding};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelFile {
    pub tool: String,
    pub window_size: usize,
    pub products: ProductEncoding,
    pub model: RecurrentRegressor,
}

impl ModelFile {
    pub fn new(model: RecurrentRegressor, prepared: &PreparedData) -> Self {
        Self {
            tool: "sf".to_string(),
            window_size: model.window_size(),
            products: prepared.encoding.clone(),
            model,
        }
    }

    /// Check the saved model against freshly prepared data.
    pub fn check_compatible(&self, prepared: &PreparedData) -> Result<(), AppError> {
        if self.window_size != prepared.window_size || self.model.window_size() != prepared.window_size {
            return Err(AppError::input(format!(
                "Saved model uses window size {}, but the run uses {}.",
                self.window_size, prepared.window_size
            )));
        }
        for (id, label) in prepared.encoding.iter() {
            if self.products.id_of(label) != Some(id) {
                return Err(AppError::input(format!(
                    "Product '{label}' has a different ID than in the saved model."
                )));
            }
        }
        Ok(())
    }
}

pub fn write_model_json(path: &Path, model: &ModelFile) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::io(format!("Failed to create model JSON '{}': {e}", path.display())))?;
    serde_json::to_writer(file, model).map_err(|e| AppError::io(format!("Failed to write model JSON: {e}")))?;
    Ok(())
}

pub fn read_model_json(path: &Path) -> Result<ModelFile, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::io(format!("Failed to open model JSON '{}': {e}", path.display())))?;
    read_model(file)
}

/// Parse a model file and check the model is internally consistent.
pub fn read_model<R: Read>(input: R) -> Result<ModelFile, AppError> {
    let file: ModelFile =
        serde_json::from_reader(input).map_err(|e| AppError::input(format!("Invalid model JSON: {e}")))?;
    file.model.validate()?;
    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{SalesRecord, YearMonth};
    use crate::error::ErrorKind;
    use crate::prep::prepare;

    fn prepared(products: &[&str], window: usize) -> PreparedData {
        let records: Vec<SalesRecord> = products
            .iter()
            .enumerate()
            .map(|(i, p)| SalesRecord {
                month: YearMonth::new(2023, 1 + i as u32).unwrap(),
                product: p.to_string(),
                quantity_sold: i as f64,
            })
            .collect();
        prepare(&records, window).unwrap()
    }

    #[test]
    fn compatible_with_same_shape() {
        let data = prepared(&["a", "b"], 2);
        let file = ModelFile::new(RecurrentRegressor::new(2, 3, 1).unwrap(), &data);
        assert!(file.check_compatible(&data).is_ok());

        // A subset of the saved products keeps the same IDs.
        assert!(file.check_compatible(&prepared(&["a"], 2)).is_ok());
    }

    #[test]
    fn rejects_other_window_or_order() {
        let data = prepared(&["a", "b"], 2);
        let file = ModelFile::new(RecurrentRegressor::new(2, 3, 1).unwrap(), &data);
        assert!(file.check_compatible(&prepared(&["a", "b"], 3)).is_err());
        assert!(file.check_compatible(&prepared(&["b", "a"], 2)).is_err());
    }

    #[test]
    fn edited_model_file_is_rejected() {
        let data = prepared(&["a", "b"], 2);
        let file = ModelFile::new(RecurrentRegressor::new(2, 3, 1).unwrap(), &data);
        let json = serde_json::to_vec(&file).unwrap();
        assert!(read_model(json.as_slice()).is_ok());

        let mut value: serde_json::Value = serde_json::from_slice(&json).unwrap();
        value["model"]["hidden_units"] = 7.into();
        let err = read_model(value.to_string().as_bytes()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InputFormat);

        let mut value: serde_json::Value = serde_json::from_slice(&json).unwrap();
        value["model"]["scaling"]["mean"] = serde_json::json!([0.0]);
        assert!(read_model(value.to_string().as_bytes()).is_err());
    }
}
