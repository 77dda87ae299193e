//! Command-line parsing for the monthly sales forecaster.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the preprocessing/model code. Every option can also be set
//! through an `SF_*` environment variable (or a `.env` file).

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

use crate::domain::ForecastMode;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "sf", version, about = "Monthly per-product sales forecaster (recurrent network)")]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug). `RUST_LOG` takes precedence.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Train on a sales CSV and print next-month forecasts per product.
    Forecast(ForecastArgs),
    /// Load and preprocess a sales CSV without training.
    Inspect(InspectArgs),
    /// Print a forecast JSON written by `sf forecast --export-json`.
    Show(ShowArgs),
}

/// Options shared by `forecast` and `inspect`.
#[derive(Debug, Parser, Clone)]
pub struct DataArgs {
    /// Sales CSV with columns sales_date (YYYY-MM), product_description, quantity_sold.
    #[arg(long, value_name = "CSV", env = "SF_CSV")]
    pub csv: PathBuf,

    /// Number of past records per training window.
    #[arg(short = 'w', long, default_value_t = 6, env = "SF_WINDOW")]
    pub window: usize,
}

#[derive(Debug, Parser, Clone)]
pub struct ForecastArgs {
    #[command(flatten)]
    pub data: DataArgs,

    /// Training epochs.
    #[arg(short = 'e', long, default_value_t = 50, env = "SF_EPOCHS")]
    pub epochs: usize,

    /// Fraction of windows (taken from the end) held out for validation.
    #[arg(long, default_value_t = 0.2, env = "SF_VALIDATION_SPLIT")]
    pub validation_split: f64,

    /// Mini-batch size.
    #[arg(short = 'b', long, default_value_t = 32, env = "SF_BATCH_SIZE")]
    pub batch_size: usize,

    /// Recurrent hidden units.
    #[arg(long, default_value_t = 16, env = "SF_HIDDEN")]
    pub hidden: usize,

    /// Adam learning rate.
    #[arg(long, default_value_t = 0.01, env = "SF_LEARNING_RATE")]
    pub learning_rate: f64,

    /// Seed for weight initialization and batch shuffling.
    #[arg(long, default_value_t = 42, env = "SF_SEED")]
    pub seed: u64,

    /// Forecast mode.
    #[arg(long, value_enum, default_value_t = ForecastMode::Single, env = "SF_MODE")]
    pub mode: ForecastMode,

    /// Future months per product (rolling mode only).
    #[arg(long, default_value_t = 1, env = "SF_HORIZON")]
    pub horizon: usize,

    /// Trailing actual months shown per product (0 = all).
    #[arg(long, default_value_t = 12)]
    pub show_actuals: usize,

    /// Export actual and predicted rows to CSV.
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Export the full forecast (with preprocessing state) to JSON.
    #[arg(long = "export-json")]
    pub export_json: Option<PathBuf>,

    /// Save the trained model to JSON.
    #[arg(long = "save-model")]
    pub save_model: Option<PathBuf>,

    /// Skip training and use a model saved with `--save-model`.
    #[arg(long = "load-model", conflicts_with = "save_model")]
    pub load_model: Option<PathBuf>,
}

#[derive(Debug, Parser, Clone)]
pub struct InspectArgs {
    #[command(flatten)]
    pub data: DataArgs,

    /// Number of training windows to print.
    #[arg(long, default_value_t = 5)]
    pub windows: usize,
}

/// Options for printing a saved forecast.
#[derive(Debug, Parser)]
pub struct ShowArgs {
    /// Forecast JSON produced by `sf forecast --export-json`.
    #[arg(value_name = "JSON")]
    pub file: PathBuf,

    /// Trailing actual months shown per product (0 = all).
    #[arg(long, default_value_t = 12)]
    pub show_actuals: usize,
}
