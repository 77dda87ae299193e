//! Sliding-window training pairs.
//!
//! The window runs over the encoded rows in input order (all products in one
//! stream, no re-sorting). Each sample's features are the `(month_offset,
//! product_id)` pairs of `window_size` consecutive rows; its target is the
//! normalized quantity of the row right after the window. Past quantities are
//! not part of the features.

use crate::domain::{EncodedRecord, WindowSample};
use crate::error::AppError;
use crate::models::{FEATURES_PER_STEP, Tensor};

/// Build `records.len() - window_size` samples.
///
/// Returns an empty vector when there are not more rows than `window_size`
/// (or when `window_size` is 0); that is not an error at this level.
pub fn build_windows(records: &[EncodedRecord], window_size: usize) -> Vec<WindowSample> {
    if window_size == 0 || records.len() <= window_size {
        return Vec::new();
    }

    records
        .windows(window_size + 1)
        .map(|w| {
            let (history, next) = w.split_at(window_size);
            WindowSample {
                history: history.iter().map(|r| (r.month_offset, r.product_id)).collect(),
                target: next[0].normalized_quantity,
            }
        })
        .collect()
}

/// Flatten one history into `[window_size * 2]` feature values.
pub fn history_features(history: &[(u32, usize)]) -> Vec<f64> {
    let mut out = Vec::with_capacity(history.len() * FEATURES_PER_STEP);
    for &(offset, product_id) in history {
        out.push(f64::from(offset));
        out.push(product_id as f64);
    }
    out
}

/// Pack histories into a `[batch, window_size, 2]` input tensor.
pub fn histories_to_tensor<'a, I>(histories: I, window_size: usize) -> Result<Tensor, AppError>
where
    I: IntoIterator<Item = &'a [(u32, usize)]>,
{
    let mut data = Vec::new();
    let mut batch = 0usize;
    for history in histories {
        if history.len() != window_size {
            return Err(AppError::training(format!(
                "Window has {} steps, expected {window_size}.",
                history.len()
            )));
        }
        data.extend(history_features(history));
        batch += 1;
    }
    Tensor::from_vec(vec![batch, window_size, FEATURES_PER_STEP], data)
}

/// Pack samples into the model's `([batch, window_size, 2], [batch, 1])` pair.
pub fn samples_to_tensors(samples: &[WindowSample], window_size: usize) -> Result<(Tensor, Tensor), AppError> {
    let inputs = histories_to_tensor(samples.iter().map(|s| s.history.as_slice()), window_size)?;
    let targets = Tensor::from_vec(
        vec![samples.len(), 1],
        samples.iter().map(|s| s.target).collect(),
    )?;
    Ok((inputs, targets))
}
