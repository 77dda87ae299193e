use std::fs;
use std::path::PathBuf;

use sales_forecast::app::pipeline::{run_forecast, run_prepare};
use sales_forecast::domain::{ForecastConfig, ForecastMode, YearMonth};
use sales_forecast::io::{read_forecast_json, write_forecast_json, write_forecasts_csv};

/// Per-test scratch directory under the system temp dir.
fn scratch(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("sf-it-{}-{name}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn write_sales_csv(dir: &PathBuf) -> PathBuf {
    let mut csv = String::from("sales_date,product_description,quantity_sold\n");
    for m in 1..=12 {
        csv.push_str(&format!("2023-{m:02},Widget,{}\n", 10 + 5 * m));
        csv.push_str(&format!("2023-{m:02},Gadget,{}\n", 200 - 3 * m));
    }
    csv.push_str("2023-13,Widget,1\n");
    let path = dir.join("sales.csv");
    fs::write(&path, csv).unwrap();
    path
}

fn quick_config(csv_path: PathBuf) -> ForecastConfig {
    ForecastConfig {
        csv_path,
        window_size: 3,
        epochs: 5,
        batch_size: 8,
        hidden_units: 4,
        ..ForecastConfig::default()
    }
}

#[test]
fn forecast_end_to_end() {
    let dir = scratch("e2e");
    let config = quick_config(write_sales_csv(&dir));

    let run = run_forecast(&config).unwrap();
    assert_eq!(run.ingest.rows_read, 25);
    assert_eq!(run.ingest.rows_used, 24);
    assert_eq!(run.ingest.row_errors.len(), 1);
    assert_eq!(run.prepared.samples.len(), 21);

    let history = run.training.as_ref().unwrap();
    assert_eq!(history.epochs.len(), 5);
    assert_eq!(history.train_samples + history.val_samples, 21);

    // Encoder order, one prediction each, dated the month after the data.
    let products: Vec<&str> = run.forecasts.iter().map(|f| f.product.as_str()).collect();
    assert_eq!(products, ["Widget", "Gadget"]);
    for f in &run.forecasts {
        assert_eq!(f.actuals.len(), 12);
        assert_eq!(f.predictions.len(), 1);
        assert_eq!(f.predictions[0].calendar_month, YearMonth::new(2024, 1).unwrap());
    }

    let json_path = dir.join("forecast.json");
    write_forecast_json(&json_path, &run.to_forecast_file(&config)).unwrap();
    let file = read_forecast_json(&json_path).unwrap();
    assert_eq!(file.forecasts, run.forecasts);
    assert_eq!(file.window_size, 3);

    let csv_path = dir.join("forecast.csv");
    write_forecasts_csv(&csv_path, &run.forecasts).unwrap();
    let exported = fs::read_to_string(&csv_path).unwrap();
    assert_eq!(exported.lines().count(), 1 + 2 * (12 + 1));
    assert!(exported.contains("Gadget,2024-01,predicted,"));

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn rolling_mode_and_saved_model() {
    let dir = scratch("rolling");
    let model_path = dir.join("model.json");
    let config = ForecastConfig {
        mode: ForecastMode::Rolling,
        horizon: 4,
        save_model: Some(model_path.clone()),
        ..quick_config(write_sales_csv(&dir))
    };

    let trained = run_forecast(&config).unwrap();
    let months: Vec<String> = trained.forecasts[0]
        .predictions
        .iter()
        .map(|p| p.calendar_month.to_string())
        .collect();
    assert_eq!(months, ["2024-01", "2024-02", "2024-03", "2024-04"]);

    let reload = ForecastConfig {
        save_model: None,
        load_model: Some(model_path),
        ..config
    };
    let loaded = run_forecast(&reload).unwrap();
    assert!(loaded.training.is_none());
    assert_eq!(loaded.forecasts, trained.forecasts);

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn corrupt_saved_model_is_an_error() {
    let dir = scratch("corrupt");
    let model_path = dir.join("model.json");
    let config = ForecastConfig {
        save_model: Some(model_path.clone()),
        ..quick_config(write_sales_csv(&dir))
    };
    run_forecast(&config).unwrap();

    let mut value: serde_json::Value = serde_json::from_slice(&fs::read(&model_path).unwrap()).unwrap();
    value["model"]["hidden_units"] = 7.into();
    fs::write(&model_path, value.to_string()).unwrap();

    let reload = ForecastConfig {
        save_model: None,
        load_model: Some(model_path),
        ..config
    };
    let err = run_forecast(&reload).unwrap_err();
    assert_eq!(err.exit_code(), 2);

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn exit_codes_by_failure_kind() {
    let dir = scratch("errors");

    let only_bad = dir.join("bad.csv");
    fs::write(&only_bad, "sales_date,product_description,quantity_sold\n2023/01,A,1\n").unwrap();
    let err = run_prepare(&quick_config(only_bad)).unwrap_err();
    assert_eq!(err.exit_code(), 3);

    let no_columns = dir.join("cols.csv");
    fs::write(&no_columns, "month,item\n2023-01,A\n").unwrap();
    let err = run_prepare(&quick_config(no_columns)).unwrap_err();
    assert_eq!(err.exit_code(), 2);

    // Fewer records than the window leaves nothing to train on.
    let tiny = dir.join("tiny.csv");
    fs::write(&tiny, "sales_date,product_description,quantity_sold\n2023-01,A,1\n2023-02,A,2\n").unwrap();
    let err = run_forecast(&quick_config(tiny)).unwrap_err();
    assert_eq!(err.exit_code(), 4);

    fs::remove_dir_all(&dir).ok();
}
