//! Single-layer recurrent regressor (Elman RNN with a linear read-out).
//!
//! ```text
//! h_t = tanh(Wx x_t + Wh h_{t-1} + b)      t = 1..window
//! y   = wy · h_window + by
//! ```
//!
//! Trained with mean squared error, backpropagation through time and Adam.
//! Inputs are standardized per feature with statistics taken from the
//! training split, so raw month offsets and product IDs can be fed as-is.
//!
//! Per-sample gradients in a mini-batch are computed in parallel with rayon,
//! then summed in sample order: the result does not depend on thread
//! scheduling, so a fixed seed reproduces the same model.

use nalgebra::{DMatrix, DVector};
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::adam::AdamState;
use crate::models::{EpochReport, FEATURES_PER_STEP, Regressor, Tensor, TrainOptions, TrainingHistory};

/// Global gradient-norm cap per update.
const MAX_GRAD_NORM: f64 = 1.0;

/// Lower bound for a feature's standard deviation.
const MIN_FEATURE_STD: f64 = 1e-8;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct RnnParams {
    wx: DMatrix<f64>,
    wh: DMatrix<f64>,
    bh: DVector<f64>,
    wy: DVector<f64>,
    by: f64,
}

impl RnnParams {
    fn zeros(hidden: usize) -> Self {
        Self {
            wx: DMatrix::zeros(hidden, FEATURES_PER_STEP),
            wh: DMatrix::zeros(hidden, hidden),
            bh: DVector::zeros(hidden),
            wy: DVector::zeros(hidden),
            by: 0.0,
        }
    }

    fn slices(&self) -> [&[f64]; 5] {
        [
            self.wx.as_slice(),
            self.wh.as_slice(),
            self.bh.as_slice(),
            self.wy.as_slice(),
            std::slice::from_ref(&self.by),
        ]
    }

    fn slices_mut(&mut self) -> [&mut [f64]; 5] {
        [
            self.wx.as_mut_slice(),
            self.wh.as_mut_slice(),
            self.bh.as_mut_slice(),
            self.wy.as_mut_slice(),
            std::slice::from_mut(&mut self.by),
        ]
    }

    fn add_assign(&mut self, other: &Self) {
        self.wx += &other.wx;
        self.wh += &other.wh;
        self.bh += &other.bh;
        self.wy += &other.wy;
        self.by += other.by;
    }

    fn scale(&mut self, k: f64) {
        self.wx *= k;
        self.wh *= k;
        self.bh *= k;
        self.wy *= k;
        self.by *= k;
    }

    fn norm(&self) -> f64 {
        self.slices()
            .iter()
            .flat_map(|s| s.iter())
            .map(|v| v * v)
            .sum::<f64>()
            .sqrt()
    }
}

/// Per-feature standardization `(x - mean) / std`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct FeatureScaling {
    mean: Vec<f64>,
    std: Vec<f64>,
}

impl FeatureScaling {
    fn identity() -> Self {
        Self {
            mean: vec![0.0; FEATURES_PER_STEP],
            std: vec![1.0; FEATURES_PER_STEP],
        }
    }

    /// Statistics over every time step of the selected batch entries.
    fn fit(inputs: &Tensor, rows: &[usize]) -> Self {
        let mut sum = vec![0.0; FEATURES_PER_STEP];
        let mut sum_sq = vec![0.0; FEATURES_PER_STEP];
        let mut count = 0usize;

        for &b in rows {
            for step in inputs.row(b).chunks(FEATURES_PER_STEP) {
                for (j, &v) in step.iter().enumerate() {
                    sum[j] += v;
                    sum_sq[j] += v * v;
                }
                count += 1;
            }
        }

        if count == 0 {
            return Self::identity();
        }

        let n = count as f64;
        let mean: Vec<f64> = sum.iter().map(|s| s / n).collect();
        let std = sum_sq
            .iter()
            .zip(&mean)
            .map(|(sq, m)| (sq / n - m * m).max(0.0).sqrt().max(MIN_FEATURE_STD))
            .collect();
        Self { mean, std }
    }

    fn apply(&self, feature: usize, v: f64) -> f64 {
        (v - self.mean[feature]) / self.std[feature]
    }
}

/// The bundled `Regressor`: a small recurrent network over `(offset, id)` steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurrentRegressor {
    window_size: usize,
    hidden_units: usize,
    params: RnnParams,
    scaling: FeatureScaling,
}

impl RecurrentRegressor {
    /// Randomly initialized model; `seed` makes the initialization reproducible.
    pub fn new(window_size: usize, hidden_units: usize, seed: u64) -> Result<Self, AppError> {
        if window_size == 0 {
            return Err(AppError::input("Window size must be > 0."));
        }
        if hidden_units == 0 {
            return Err(AppError::input("Hidden units must be > 0."));
        }

        let mut rng = StdRng::seed_from_u64(seed);
        let normal = Normal::new(0.0, 1.0)
            .map_err(|e| AppError::training(format!("Weight initialization error: {e}")))?;

        let input_scale = (1.0 / FEATURES_PER_STEP as f64).sqrt();
        let hidden_scale = (1.0 / hidden_units as f64).sqrt();

        let mut params = RnnParams::zeros(hidden_units);
        params.wx = DMatrix::from_fn(hidden_units, FEATURES_PER_STEP, |_, _| {
            normal.sample(&mut rng) * input_scale
        });
        // Keep the recurrent weights small so early activations do not saturate.
        params.wh = DMatrix::from_fn(hidden_units, hidden_units, |_, _| {
            normal.sample(&mut rng) * hidden_scale * 0.5
        });
        params.wy = DVector::from_fn(hidden_units, |_, _| normal.sample(&mut rng) * hidden_scale);

        Ok(Self {
            window_size,
            hidden_units,
            params,
            scaling: FeatureScaling::identity(),
        })
    }

    pub fn hidden_units(&self) -> usize {
        self.hidden_units
    }

    /// Check that weights and feature scaling agree with the declared sizes.
    ///
    /// Deserialized models only carry what the file says; run this before
    /// using one.
    pub fn validate(&self) -> Result<(), AppError> {
        let h = self.hidden_units;
        if self.window_size == 0 || h == 0 {
            return Err(AppError::input("Model window size and hidden units must be > 0."));
        }

        let p = &self.params;
        let weights_ok = p.wx.shape() == (h, FEATURES_PER_STEP)
            && p.wh.shape() == (h, h)
            && p.bh.len() == h
            && p.wy.len() == h;
        if !weights_ok {
            return Err(AppError::input(format!(
                "Model weights do not match {h} hidden units (wx {:?}, wh {:?}, bh {}, wy {}).",
                p.wx.shape(),
                p.wh.shape(),
                p.bh.len(),
                p.wy.len()
            )));
        }

        let s = &self.scaling;
        if s.mean.len() != FEATURES_PER_STEP || s.std.len() != FEATURES_PER_STEP {
            return Err(AppError::input(format!(
                "Model feature scaling must have {FEATURES_PER_STEP} entries (mean {}, std {}).",
                s.mean.len(),
                s.std.len()
            )));
        }
        if s.std.iter().any(|v| !(v.is_finite() && *v > 0.0)) {
            return Err(AppError::input("Model feature scaling has a non-positive std."));
        }

        Ok(())
    }

    /// Check a `[batch, window, 2]` input and return its batch size.
    fn check_input(&self, inputs: &Tensor) -> Result<usize, AppError> {
        match inputs.shape() {
            &[batch, steps, feats] if steps == self.window_size && feats == FEATURES_PER_STEP => Ok(batch),
            shape => Err(AppError::training(format!(
                "Model expects input shape [batch, {}, {FEATURES_PER_STEP}], got {shape:?}.",
                self.window_size
            ))),
        }
    }

    fn step_inputs(&self, row: &[f64]) -> Vec<DVector<f64>> {
        row.chunks(FEATURES_PER_STEP)
            .map(|step| {
                DVector::from_iterator(
                    FEATURES_PER_STEP,
                    step.iter().enumerate().map(|(j, &v)| self.scaling.apply(j, v)),
                )
            })
            .collect()
    }

    /// Hidden states (including the zero initial state) and the output.
    fn forward(&self, xs: &[DVector<f64>]) -> (Vec<DVector<f64>>, f64) {
        let p = &self.params;
        let mut hs = Vec::with_capacity(xs.len() + 1);
        let mut h = DVector::zeros(self.hidden_units);
        hs.push(h.clone());
        for x in xs {
            h = (&p.wx * x + &p.wh * &h + &p.bh).map(f64::tanh);
            hs.push(h.clone());
        }
        let y = p.wy.dot(&h) + p.by;
        (hs, y)
    }

    fn predict_row(&self, row: &[f64]) -> f64 {
        let xs = self.step_inputs(row);
        self.forward(&xs).1
    }

    /// Gradient of the squared error for one sample, plus that error.
    fn sample_gradient(&self, row: &[f64], target: f64) -> (RnnParams, f64) {
        let p = &self.params;
        let xs = self.step_inputs(row);
        let (hs, y) = self.forward(&xs);

        let err = y - target;
        let dy = 2.0 * err;

        let mut g = RnnParams::zeros(self.hidden_units);
        g.wy = &hs[xs.len()] * dy;
        g.by = dy;

        let mut dh: DVector<f64> = &p.wy * dy;
        for t in (0..xs.len()).rev() {
            let h = &hs[t + 1];
            let da = dh.component_mul(&h.map(|v| 1.0 - v * v));
            g.wx += &da * xs[t].transpose();
            g.wh += &da * hs[t].transpose();
            g.bh += &da;
            dh = p.wh.transpose() * &da;
        }

        (g, err * err)
    }

    /// Mean gradient over `batch` and the summed squared error.
    fn batch_gradient(&self, inputs: &Tensor, targets: &Tensor, batch: &[usize]) -> (RnnParams, f64) {
        let per_sample: Vec<(RnnParams, f64)> = batch
            .par_iter()
            .map(|&i| self.sample_gradient(inputs.row(i), targets.data()[i]))
            .collect();

        let mut grad = RnnParams::zeros(self.hidden_units);
        let mut loss = 0.0;
        for (g, l) in &per_sample {
            grad.add_assign(g);
            loss += l;
        }
        grad.scale(1.0 / batch.len() as f64);
        (grad, loss)
    }

    fn mean_loss(&self, inputs: &Tensor, targets: &Tensor, rows: std::ops::Range<usize>) -> f64 {
        let n = rows.len();
        let total: f64 = rows
            .map(|i| {
                let err = self.predict_row(inputs.row(i)) - targets.data()[i];
                err * err
            })
            .sum();
        total / n as f64
    }
}

impl Regressor for RecurrentRegressor {
    fn window_size(&self) -> usize {
        self.window_size
    }

    fn fit(
        &mut self,
        inputs: &Tensor,
        targets: &Tensor,
        options: &TrainOptions,
        progress: &mut dyn FnMut(&EpochReport),
    ) -> Result<TrainingHistory, AppError> {
        let n = self.check_input(inputs)?;
        if targets.shape() != [n, 1] {
            return Err(AppError::training(format!(
                "Targets must have shape [{n}, 1], got {:?}.",
                targets.shape()
            )));
        }
        if n == 0 {
            return Err(AppError::training(format!(
                "No training windows: need more than {} rows.",
                self.window_size
            )));
        }
        if options.batch_size == 0 {
            return Err(AppError::training("Batch size must be > 0."));
        }

        let n_val = ((n as f64) * options.validation_split.clamp(0.0, 1.0)).floor() as usize;
        let n_train = n - n_val;
        if n_train == 0 {
            return Err(AppError::training(format!(
                "Validation split {} leaves no training samples (n={n}).",
                options.validation_split
            )));
        }

        let mut order: Vec<usize> = (0..n_train).collect();
        self.scaling = FeatureScaling::fit(inputs, &order);

        let mut adam: Vec<AdamState> = self.params.slices().iter().map(|s| AdamState::new(s.len())).collect();
        let mut rng = StdRng::seed_from_u64(options.seed);
        let mut step = 0i32;

        let mut history = TrainingHistory {
            train_samples: n_train,
            val_samples: n_val,
            epochs: Vec::with_capacity(options.epochs),
        };

        for epoch in 1..=options.epochs {
            order.shuffle(&mut rng);

            let mut loss_sum = 0.0;
            for batch in order.chunks(options.batch_size) {
                let (mut grad, batch_loss) = self.batch_gradient(inputs, targets, batch);
                loss_sum += batch_loss;

                let norm = grad.norm();
                if norm > MAX_GRAD_NORM {
                    grad.scale(MAX_GRAD_NORM / norm);
                }

                step = step.saturating_add(1);
                for ((param, g), state) in self
                    .params
                    .slices_mut()
                    .into_iter()
                    .zip(grad.slices())
                    .zip(adam.iter_mut())
                {
                    state.update(param, g, options.learning_rate, step);
                }
            }

            let loss = loss_sum / n_train as f64;
            let val_loss = (n_val > 0).then(|| self.mean_loss(inputs, targets, n_train..n));
            if !loss.is_finite() || val_loss.is_some_and(|v| !v.is_finite()) {
                return Err(AppError::training(format!(
                    "Training diverged at epoch {epoch} (non-finite loss)."
                )));
            }

            let report = EpochReport { epoch, loss, val_loss };
            progress(&report);
            history.epochs.push(report);
        }

        Ok(history)
    }

    fn predict(&self, inputs: &Tensor) -> Result<Tensor, AppError> {
        let n = self.check_input(inputs)?;
        let mut out = Vec::with_capacity(n);
        for b in 0..n {
            let y = self.predict_row(inputs.row(b));
            if !y.is_finite() {
                return Err(AppError::training("Model produced a non-finite prediction."));
            }
            out.push(y);
        }
        Tensor::from_vec(vec![n, 1], out)
    }
}
