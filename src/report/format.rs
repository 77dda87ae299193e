//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - preprocessing/model code stays free of presentation
//! - output changes are localized (the tests below pin the table layout)

use crate::domain::ProductForecast;
use crate::io::ingest::IngestedData;
use crate::io::ForecastFile;
use crate::models::TrainingHistory;
use crate::prep::PreparedData;

/// Rows shown per section of the row-error list.
const MAX_ROW_ERRORS: usize = 5;

/// Loss history rows shown before thinning kicks in.
const MAX_HISTORY_ROWS: usize = 10;

/// Dataset overview: rows used/dropped, months, quantities.
pub fn format_ingest_summary(source: &str, ingest: &IngestedData) -> String {
    let mut out = String::new();
    let stats = &ingest.stats;

    out.push_str("=== sf - monthly sales forecast ===\n");
    out.push_str(&format!("Source: {source}\n"));
    out.push_str(&format!(
        "Rows: read={} | used={} | dropped={}\n",
        ingest.rows_read,
        ingest.rows_used,
        ingest.row_errors.len()
    ));
    out.push_str(&format!(
        "Months: [{}, {}] | products={} | quantity=[{}, {}]\n",
        stats.month_min, stats.month_max, stats.n_products, stats.quantity_min, stats.quantity_max
    ));

    for e in ingest.row_errors.iter().take(MAX_ROW_ERRORS) {
        out.push_str(&format!("  line {}: {}\n", e.line, e.message));
    }
    if ingest.row_errors.len() > MAX_ROW_ERRORS {
        out.push_str(&format!(
            "  ... {} more dropped row(s)\n",
            ingest.row_errors.len() - MAX_ROW_ERRORS
        ));
    }

    out
}

/// Preprocessing state: product IDs, quantity scale, training windows.
pub fn format_preprocessing(prepared: &PreparedData, show_windows: usize) -> String {
    let mut out = String::new();

    out.push_str("\nProducts:\n");
    out.push_str(&format!("{:>4} {}\n", "id", "product"));
    for (id, label) in prepared.encoding.iter() {
        out.push_str(&format!("{id:>4} {}\n", truncate(label, 40)));
    }

    out.push_str(&format!(
        "\nScale: min={} max={}{}\n",
        prepared.scale.min,
        prepared.scale.max,
        if prepared.scale.is_degenerate() { " (constant series)" } else { "" }
    ));
    out.push_str(&format!(
        "Offsets: 0 = {} .. {} = {}\n",
        prepared.origin, prepared.last_offset, prepared.last_month
    ));
    out.push_str(&format!(
        "Windows: {} (size {})\n",
        prepared.samples.len(),
        prepared.window_size
    ));

    for (i, sample) in prepared.samples.iter().take(show_windows).enumerate() {
        let steps: Vec<String> = sample
            .history
            .iter()
            .map(|(offset, id)| format!("({offset},{id})"))
            .collect();
        out.push_str(&format!("  #{i:<3} {} -> {:.4}\n", steps.join(" "), sample.target));
    }

    out
}

/// Training outcome: sample split and loss curve.
pub fn format_training(history: &TrainingHistory) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "\nTraining: epochs={} | train={} | validation={}\n",
        history.epochs.len(),
        history.train_samples,
        history.val_samples
    ));

    let Some(last) = history.last() else {
        return out;
    };

    out.push_str(&format!("{:>6} {:>12} {:>12}\n", "epoch", "loss", "val_loss"));
    let every = (history.epochs.len() / MAX_HISTORY_ROWS).max(1);
    for r in &history.epochs {
        if r.epoch % every != 0 && r.epoch != last.epoch && r.epoch != 1 {
            continue;
        }
        let val = r.val_loss.map(|v| format!("{v:.6}")).unwrap_or_else(|| "-".to_string());
        out.push_str(&format!("{:>6} {:>12.6} {:>12}\n", r.epoch, r.loss, val));
    }

    out.push_str(&format!("Final loss: {:.6}", last.loss));
    if let Some(v) = last.val_loss {
        out.push_str(&format!(" | val_loss: {v:.6}"));
    }
    out.push('\n');

    out
}

/// Actual-vs-predicted table per product.
///
/// `show_actuals` limits the trailing actual rows per product (0 = all).
pub fn format_forecasts(forecasts: &[ProductForecast], show_actuals: usize) -> String {
    let mut out = String::new();

    for f in forecasts {
        out.push('\n');
        out.push_str(&format!("{}\n", f.product));
        out.push_str(&format!("{:<8} {:>12} {:>12}\n", "month", "actual", "predicted"));
        out.push_str(&format!("{:-<8} {:-<12} {:-<12}\n", "", "", ""));

        // Display in calendar order; the stored actuals keep input order.
        let mut actuals = f.actuals.clone();
        actuals.sort_by_key(|a| a.calendar_month);
        let skip = if show_actuals == 0 {
            0
        } else {
            actuals.len().saturating_sub(show_actuals)
        };
        for a in actuals.iter().skip(skip) {
            out.push_str(&format!("{:<8} {:>12}\n", a.calendar_month.to_string(), fmt_quantity(a.quantity)));
        }
        for p in &f.predictions {
            out.push_str(&format!(
                "{:<8} {:>12} {:>12}\n",
                p.calendar_month.to_string(),
                "",
                p.predicted_quantity
            ));
        }
    }

    out
}

/// Header for a forecast file reloaded by `sf show`.
pub fn format_forecast_file_header(file: &ForecastFile) -> String {
    let mut out = String::new();
    out.push_str("=== sf - saved forecast ===\n");
    out.push_str(&format!("Source: {}\n", file.source));
    out.push_str(&format!(
        "Window: {} | mode: {:?} | months: [{}, {}] | scale: [{}, {}]\n",
        file.window_size, file.mode, file.origin, file.last_month, file.scale.min, file.scale.max
    ));
    out
}

fn fmt_quantity(q: f64) -> String {
    if q.fract() == 0.0 { format!("{q:.0}") } else { format!("{q:.2}") }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ActualPoint, ForecastPoint, YearMonth};
    use crate::models::EpochReport;

    fn ym(y: i32, m: u32) -> YearMonth {
        YearMonth::new(y, m).unwrap()
    }

    #[test]
    fn forecast_table_layout() {
        let forecasts = vec![ProductForecast {
            product: "A".to_string(),
            actuals: vec![
                ActualPoint { calendar_month: ym(2023, 6), quantity: 60.0 },
                ActualPoint { calendar_month: ym(2023, 7), quantity: 70.0 },
                ActualPoint { calendar_month: ym(2023, 8), quantity: 80.5 },
            ],
            predictions: vec![ForecastPoint {
                calendar_month: ym(2023, 9),
                predicted_quantity: 45,
            }],
        }];

        let txt = format_forecasts(&forecasts, 2);
        let expected = concat!(
            "\n",
            "A\n",
            "month          actual    predicted\n",
            "-------- ------------ ------------\n",
            "2023-07            70\n",
            "2023-08         80.50\n",
            "2023-09                         45\n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn actuals_print_in_calendar_order() {
        let actuals = vec![
            ActualPoint { calendar_month: ym(2023, 8), quantity: 80.0 },
            ActualPoint { calendar_month: ym(2023, 6), quantity: 60.0 },
            ActualPoint { calendar_month: ym(2023, 7), quantity: 70.0 },
        ];
        let forecasts = vec![ProductForecast {
            product: "A".to_string(),
            actuals: actuals.clone(),
            predictions: vec![],
        }];

        let txt = format_forecasts(&forecasts, 2);
        let months: Vec<&str> = txt.lines().skip(4).map(|l| &l[..7]).collect();
        assert_eq!(months, ["2023-07", "2023-08"]);
        assert_eq!(forecasts[0].actuals, actuals);
    }

    #[test]
    fn training_summary_includes_val_loss() {
        let history = TrainingHistory {
            train_samples: 8,
            val_samples: 2,
            epochs: vec![
                EpochReport { epoch: 1, loss: 0.5, val_loss: Some(0.6) },
                EpochReport { epoch: 2, loss: 0.25, val_loss: Some(0.125) },
            ],
        };
        let txt = format_training(&history);
        assert!(txt.contains("epochs=2 | train=8 | validation=2"));
        assert!(txt.contains("Final loss: 0.250000 | val_loss: 0.125000"));
        assert!(txt.contains("     1     0.500000     0.600000\n"));
    }

    #[test]
    fn long_history_is_thinned() {
        let history = TrainingHistory {
            train_samples: 4,
            val_samples: 0,
            epochs: (1..=50)
                .map(|epoch| EpochReport { epoch, loss: 1.0 / epoch as f64, val_loss: None })
                .collect(),
        };
        let txt = format_training(&history);
        let rows = txt.lines().filter(|l| l.trim_end().ends_with('-')).count();
        // Epoch 1 plus every 5th epoch.
        assert_eq!(rows, 11);
    }

    #[test]
    fn truncate_long_names() {
        assert_eq!(truncate("abcdef", 4), "abc.");
        assert_eq!(truncate("abc", 4), "abc");
    }
}
