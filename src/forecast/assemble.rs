//! Inference-time assembly: synthetic future windows → per-product forecasts.

use crate::domain::{ActualPoint, ForecastMode, ForecastPoint, ProductForecast, SalesRecord, YearMonth};
use crate::error::AppError;
use crate::forecast::calendar::future_months;
use crate::models::{Regressor, TensorPool};
use crate::prep::{PreparedData, QuantityScale, histories_to_tensor};

/// What to forecast for each product.
#[derive(Debug, Clone, Copy)]
pub struct ForecastPlan {
    pub mode: ForecastMode,
    /// Steps per product in `rolling` mode (ignored in `single` mode).
    pub horizon: usize,
}

impl ForecastPlan {
    pub fn steps(&self) -> usize {
        match self.mode {
            ForecastMode::Single => 1,
            ForecastMode::Rolling => self.horizon.max(1),
        }
    }
}

/// Input window for a product: the `window_size` offsets following
/// `last_offset`, shifted `shift` months further out.
pub fn future_window(last_offset: u32, product_id: usize, window_size: usize, shift: usize) -> Vec<(u32, usize)> {
    let first = u64::from(last_offset) + 1 + shift as u64;
    (0..window_size as u64)
        .map(|i| ((first + i).min(u64::from(u32::MAX)) as u32, product_id))
        .collect()
}

/// Map a normalized model output back to a calendar forecast point.
pub fn to_forecast_point(value: f64, scale: &QuantityScale, month: YearMonth) -> ForecastPoint {
    ForecastPoint {
        calendar_month: month,
        predicted_quantity: scale.denormalize(value),
    }
}

/// Forecast every product, in encoder order.
pub fn forecast_products<M: Regressor + ?Sized>(
    model: &M,
    prepared: &PreparedData,
    records: &[SalesRecord],
    plan: ForecastPlan,
    pool: &TensorPool,
) -> Result<Vec<ProductForecast>, AppError> {
    prepared
        .encoding
        .iter()
        .map(|(_, label)| forecast_product(model, prepared, records, label, plan, pool))
        .collect()
}

/// Forecast a single product by label.
///
/// One inference call per step. Each call's input buffer comes from `pool`
/// and is released as soon as the prediction has been read, or when an error
/// leaves this function.
pub fn forecast_product<M: Regressor + ?Sized>(
    model: &M,
    prepared: &PreparedData,
    records: &[SalesRecord],
    product: &str,
    plan: ForecastPlan,
    pool: &TensorPool,
) -> Result<ProductForecast, AppError> {
    let window_size = prepared.window_size;
    if model.window_size() != window_size {
        return Err(AppError::training(format!(
            "Model window size {} does not match data window size {window_size}.",
            model.window_size()
        )));
    }

    let product_id = prepared
        .encoding
        .id_of(product)
        .ok_or_else(|| AppError::training(format!("Unknown product '{product}'.")))?;

    let steps = plan.steps();
    // Single mode still generates a full window of labels; only the first is used.
    let months = future_months(prepared.last_month, window_size.max(steps));
    if months.len() < steps {
        return Err(AppError::training(format!(
            "Cannot generate {steps} calendar months after {}.",
            prepared.last_month
        )));
    }

    let mut predictions = Vec::with_capacity(steps);
    for (shift, &month) in months.iter().take(steps).enumerate() {
        let history = future_window(prepared.last_offset, product_id, window_size, shift);
        let input = pool.acquire(histories_to_tensor([history.as_slice()], window_size)?);
        let output = model.predict(&input)?;
        drop(input);

        let value = output
            .data()
            .first()
            .copied()
            .ok_or_else(|| AppError::training("Model returned an empty prediction."))?;
        predictions.push(to_forecast_point(value, &prepared.scale, month));
    }

    log::debug!(
        "{product}: {} prediction(s) after offset {}",
        predictions.len(),
        prepared.last_offset
    );

    let actuals = records
        .iter()
        .filter(|r| r.product == product)
        .map(|r| ActualPoint {
            calendar_month: r.month,
            quantity: r.quantity_sold,
        })
        .collect();

    Ok(ProductForecast {
        product: product.to_string(),
        actuals,
        predictions,
    })
}
