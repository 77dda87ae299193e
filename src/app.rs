//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments (plus `.env` / `SF_*` variables)
//! - sets up logging
//! - loads and preprocesses the sales CSV
//! - trains the recurrent model and forecasts each product
//! - prints reports and writes optional exports

use clap::Parser;
use env_logger::Env;

use crate::cli::{Command, DataArgs, ForecastArgs, InspectArgs, ShowArgs};
use crate::domain::ForecastConfig;
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `sf` binary.
pub fn run() -> Result<(), AppError> {
    dotenvy::dotenv().ok();

    // We want `sf sales.csv` to behave like `sf forecast --csv sales.csv`.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);
    init_logging(cli.verbose);

    match cli.command {
        Command::Forecast(args) => handle_forecast(&args),
        Command::Inspect(args) => handle_inspect(&args),
        Command::Show(args) => handle_show(&args),
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let _ = env_logger::Builder::from_env(Env::default().default_filter_or(level))
        .format_timestamp(None)
        .try_init();
}

fn handle_forecast(args: &ForecastArgs) -> Result<(), AppError> {
    let config = forecast_config_from_args(args)?;
    let run = pipeline::run_forecast(&config)?;

    let source = config.csv_path.display().to_string();
    println!("{}", crate::report::format_ingest_summary(&source, &run.ingest));
    match &run.training {
        Some(history) => println!("{}", crate::report::format_training(history)),
        None => println!("\nTraining: skipped (model loaded)"),
    }
    println!("{}", crate::report::format_forecasts(&run.forecasts, config.show_actuals));

    // Optional exports.
    if let Some(path) = &config.export_csv {
        crate::io::export::write_forecasts_csv(path, &run.forecasts)?;
        log::info!("Wrote forecast CSV to {}", path.display());
    }
    if let Some(path) = &config.export_json {
        crate::io::forecast_file::write_forecast_json(path, &run.to_forecast_file(&config))?;
        log::info!("Wrote forecast JSON to {}", path.display());
    }

    Ok(())
}

fn handle_inspect(args: &InspectArgs) -> Result<(), AppError> {
    let config = data_config_from_args(&args.data)?;
    let prepared = pipeline::run_prepare(&config)?;

    let source = config.csv_path.display().to_string();
    println!("{}", crate::report::format_ingest_summary(&source, &prepared.ingest));
    println!(
        "{}",
        crate::report::format_preprocessing(&prepared.prepared, args.windows)
    );
    Ok(())
}

fn handle_show(args: &ShowArgs) -> Result<(), AppError> {
    let file = crate::io::forecast_file::read_forecast_json(&args.file)?;

    println!("{}", crate::report::format_forecast_file_header(&file));
    if let Some(history) = &file.training {
        println!("{}", crate::report::format_training(history));
    }
    println!("{}", crate::report::format_forecasts(&file.forecasts, args.show_actuals));
    Ok(())
}

/// Build the pipeline config for `inspect` (training options stay at defaults).
pub fn data_config_from_args(args: &DataArgs) -> Result<ForecastConfig, AppError> {
    if args.window == 0 {
        return Err(AppError::input("--window must be at least 1."));
    }
    Ok(ForecastConfig {
        csv_path: args.csv.clone(),
        window_size: args.window,
        ..ForecastConfig::default()
    })
}

pub fn forecast_config_from_args(args: &ForecastArgs) -> Result<ForecastConfig, AppError> {
    let base = data_config_from_args(&args.data)?;

    if args.epochs == 0 {
        return Err(AppError::input("--epochs must be at least 1."));
    }
    if !(0.0..1.0).contains(&args.validation_split) {
        return Err(AppError::input("--validation-split must be in [0, 1)."));
    }
    if args.batch_size == 0 {
        return Err(AppError::input("--batch-size must be at least 1."));
    }
    if args.hidden == 0 {
        return Err(AppError::input("--hidden must be at least 1."));
    }
    if !(args.learning_rate.is_finite() && args.learning_rate > 0.0) {
        return Err(AppError::input("--learning-rate must be a positive number."));
    }
    if args.horizon == 0 {
        return Err(AppError::input("--horizon must be at least 1."));
    }

    Ok(ForecastConfig {
        epochs: args.epochs,
        validation_split: args.validation_split,
        batch_size: args.batch_size,
        hidden_units: args.hidden,
        learning_rate: args.learning_rate,
        seed: args.seed,
        mode: args.mode,
        horizon: args.horizon,
        show_actuals: args.show_actuals,
        export_csv: args.export.clone(),
        export_json: args.export_json.clone(),
        save_model: args.save_model.clone(),
        load_model: args.load_model.clone(),
        ..base
    })
}

/// Rewrite argv so a bare CSV path runs a forecast.
///
/// Rules:
/// - `sf sales.csv ...`            -> `sf forecast --csv sales.csv ...`
/// - `sf -v sales.csv ...`         -> `sf -v forecast --csv sales.csv ...`
/// - subcommands, help and version -> unchanged
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(pos) = argv
        .iter()
        .skip(1)
        .position(|a| !a.starts_with('-'))
        .map(|i| i + 1)
    else {
        return argv;
    };

    let is_subcommand = matches!(argv[pos].as_str(), "forecast" | "inspect" | "show" | "help");
    if is_subcommand || !argv[pos].to_ascii_lowercase().ends_with(".csv") {
        return argv;
    }

    argv.insert(pos, "--csv".to_string());
    argv.insert(pos, "forecast".to_string());
    argv
}
