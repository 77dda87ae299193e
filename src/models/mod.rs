//! Regression model collaborator.
//!
//! The forecasting core only relies on the `Regressor` contract:
//!
//! - `fit` on `[batch, window, 2]` inputs and `[batch, 1]` targets
//! - `predict` on `[batch, window, 2]` inputs, returning `[batch, 1]`
//!
//! `RecurrentRegressor` is the bundled implementation; anything meeting the
//! same shape contract can replace it.

pub mod adam;
pub mod rnn;
pub mod tensor;

pub use rnn::*;
pub use tensor::*;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Features per time step: month offset and product ID.
pub const FEATURES_PER_STEP: usize = 2;

/// Training hyper-parameters passed to `Regressor::fit`.
#[derive(Debug, Clone)]
pub struct TrainOptions {
    pub epochs: usize,
    /// Fraction of samples (taken from the end) held out for validation.
    pub validation_split: f64,
    pub batch_size: usize,
    pub learning_rate: f64,
    /// Seed for batch shuffling.
    pub seed: u64,
}

/// Loss after one epoch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpochReport {
    /// 1-based.
    pub epoch: usize,
    /// Mean squared error over the training batches of this epoch.
    pub loss: f64,
    /// Mean squared error on the held-out samples, if any.
    pub val_loss: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrainingHistory {
    pub train_samples: usize,
    pub val_samples: usize,
    pub epochs: Vec<EpochReport>,
}

impl TrainingHistory {
    pub fn last(&self) -> Option<&EpochReport> {
        self.epochs.last()
    }
}

pub trait Regressor {
    /// Number of time steps each input window must have.
    fn window_size(&self) -> usize;

    /// Fit the model. `progress` is called once per finished epoch.
    fn fit(
        &mut self,
        inputs: &Tensor,
        targets: &Tensor,
        options: &TrainOptions,
        progress: &mut dyn FnMut(&EpochReport),
    ) -> Result<TrainingHistory, AppError>;

    /// Predict one normalized value per batch entry.
    fn predict(&self, inputs: &Tensor) -> Result<Tensor, AppError>;
}
