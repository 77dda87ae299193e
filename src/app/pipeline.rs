//! Shared "forecast pipeline" logic used by the `forecast` and `inspect` commands.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! CSV ingest -> preprocessing -> training (or model load) -> per-product forecasts
//!
//! The command handlers can then focus on presentation and exports.

use crate::domain::{ForecastConfig, ProductForecast};
use crate::error::AppError;
use crate::forecast::{ForecastPlan, forecast_products};
use crate::io::ingest::{IngestedData, load_sales_csv};
use crate::io::{ForecastFile, ModelFile, read_model_json, write_model_json};
use crate::models::{EpochReport, RecurrentRegressor, Regressor, TensorPool, TrainOptions, TrainingHistory};
use crate::prep::{PreparedData, prepare, samples_to_tensors};

/// Outputs of the load + preprocess stage.
#[derive(Debug, Clone)]
pub struct PreparedRun {
    pub ingest: IngestedData,
    pub prepared: PreparedData,
}

/// All computed outputs of a single `sf forecast` run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub ingest: IngestedData,
    pub prepared: PreparedData,
    pub model: RecurrentRegressor,
    /// `None` when the model was loaded instead of trained.
    pub training: Option<TrainingHistory>,
    pub forecasts: Vec<ProductForecast>,
}

impl RunOutput {
    /// Portable snapshot of this run for `--export-json`.
    pub fn to_forecast_file(&self, config: &ForecastConfig) -> ForecastFile {
        ForecastFile {
            tool: "sf".to_string(),
            source: config.csv_path.display().to_string(),
            window_size: self.prepared.window_size,
            mode: config.mode,
            scale: self.prepared.scale,
            origin: self.prepared.origin,
            last_month: self.prepared.last_month,
            products: self.prepared.encoding.clone(),
            forecasts: self.forecasts.clone(),
            training: self.training.clone(),
        }
    }
}

/// Load the CSV and run preprocessing.
pub fn run_prepare(config: &ForecastConfig) -> Result<PreparedRun, AppError> {
    let ingest = load_sales_csv(&config.csv_path)?;
    let prepared = prepare(&ingest.records, config.window_size)?;
    Ok(PreparedRun { ingest, prepared })
}

/// Execute the full forecasting pipeline and return the computed outputs.
pub fn run_forecast(config: &ForecastConfig) -> Result<RunOutput, AppError> {
    let PreparedRun { ingest, prepared } = run_prepare(config)?;

    let (model, training) = match &config.load_model {
        Some(path) => {
            let file = read_model_json(path)?;
            file.check_compatible(&prepared)?;
            log::info!("Loaded model from {}", path.display());
            (file.model, None)
        }
        None => {
            let (model, history) = train(config, &prepared).map_err(AppError::into_training)?;
            (model, Some(history))
        }
    };

    if let Some(path) = &config.save_model {
        write_model_json(path, &ModelFile::new(model.clone(), &prepared))?;
        log::info!("Saved model to {}", path.display());
    }

    let plan = ForecastPlan {
        mode: config.mode,
        horizon: config.horizon,
    };
    let pool = TensorPool::new();
    let forecasts = forecast_products(&model, &prepared, &ingest.records, plan, &pool)
        .map_err(AppError::into_training)?;
    log::debug!(
        "Inference buffers: acquired={} peak={} live={}",
        pool.total_acquired(),
        pool.peak(),
        pool.live()
    );

    Ok(RunOutput {
        ingest,
        prepared,
        model,
        training,
        forecasts,
    })
}

/// Build and fit a fresh model on the prepared windows.
pub fn train(
    config: &ForecastConfig,
    prepared: &PreparedData,
) -> Result<(RecurrentRegressor, TrainingHistory), AppError> {
    let (inputs, targets) = samples_to_tensors(&prepared.samples, prepared.window_size)?;
    let mut model = RecurrentRegressor::new(prepared.window_size, config.hidden_units, config.seed)?;

    let options = TrainOptions {
        epochs: config.epochs,
        validation_split: config.validation_split,
        batch_size: config.batch_size,
        learning_rate: config.learning_rate,
        seed: config.seed,
    };

    let total = config.epochs;
    let mut progress = |report: &EpochReport| log_epoch(report, total);
    let history = model.fit(&inputs, &targets, &options, &mut progress)?;
    Ok((model, history))
}

fn log_epoch(report: &EpochReport, total: usize) {
    let every = (total / 10).max(1);
    let line = match report.val_loss {
        Some(v) => format!("epoch {}/{total}: loss={:.6} val_loss={v:.6}", report.epoch, report.loss),
        None => format!("epoch {}/{total}: loss={:.6}", report.epoch, report.loss),
    };
    if report.epoch % every == 0 || report.epoch == total {
        log::info!("{line}");
    } else {
        log::debug!("{line}");
    }
}
