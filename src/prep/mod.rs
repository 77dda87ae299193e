//! Preprocessing: turn validated sales rows into model-ready data.
//!
//! - month offsets (`dates`)
//! - product IDs (`encoder`)
//! - quantity min-max scaling (`scale`)
//! - sliding-window training pairs (`window`)
//!
//! Everything here is deterministic and free of I/O.

pub mod dates;
pub mod encoder;
pub mod scale;
pub mod window;

pub use dates::*;
pub use encoder::*;
pub use scale::*;
pub use window::*;

use crate::domain::{EncodedRecord, SalesRecord, WindowSample, YearMonth};
use crate::error::AppError;

/// Everything derived from one dataset before training.
#[derive(Debug, Clone)]
pub struct PreparedData {
    pub encoded: Vec<EncodedRecord>,
    pub encoding: ProductEncoding,
    pub scale: QuantityScale,
    /// Earliest observed month (offset 0).
    pub origin: YearMonth,
    /// Latest observed month.
    pub last_month: YearMonth,
    /// Offset of `last_month`.
    pub last_offset: u32,
    pub window_size: usize,
    pub samples: Vec<WindowSample>,
}

/// Encode all records and build the training windows.
pub fn prepare(records: &[SalesRecord], window_size: usize) -> Result<PreparedData, AppError> {
    let months: Vec<YearMonth> = records.iter().map(|r| r.month).collect();
    let (origin, offsets) =
        normalize_months(&months).ok_or_else(|| AppError::no_data("No records to preprocess."))?;

    let labels: Vec<&str> = records.iter().map(|r| r.product.as_str()).collect();
    let (encoding, product_ids) = ProductEncoding::encode(&labels);

    let quantities: Vec<f64> = records.iter().map(|r| r.quantity_sold).collect();
    let scale = QuantityScale::fit(&quantities)
        .ok_or_else(|| AppError::no_data("No finite quantities to scale."))?;
    if scale.is_degenerate() {
        log::warn!(
            "All quantities equal {}; normalized values are fixed at {DEGENERATE_LEVEL}.",
            scale.min
        );
    }
    let normalized = scale.normalize_all(&quantities);

    let encoded: Vec<EncodedRecord> = offsets
        .iter()
        .zip(&product_ids)
        .zip(&normalized)
        .map(|((&month_offset, &product_id), &normalized_quantity)| EncodedRecord {
            month_offset,
            product_id,
            normalized_quantity,
        })
        .collect();

    let last_offset = offsets.iter().copied().max().unwrap_or(0);
    let last_month = months.iter().copied().max().unwrap_or(origin);

    let samples = build_windows(&encoded, window_size);
    log::info!(
        "Prepared {} rows: {} products, {} windows (size {window_size}), quantity range [{}, {}].",
        encoded.len(),
        encoding.len(),
        samples.len(),
        scale.min,
        scale.max
    );

    Ok(PreparedData {
        encoded,
        encoding,
        scale,
        origin,
        last_month,
        last_offset,
        window_size,
        samples,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product_a_rows() -> Vec<SalesRecord> {
        (1..=8)
            .map(|m| SalesRecord {
                month: YearMonth::new(2023, m).unwrap(),
                product: "A".to_string(),
                quantity_sold: f64::from(m * 10),
            })
            .collect()
    }

    #[test]
    fn product_a_scenario() {
        let prepared = prepare(&product_a_rows(), 6).unwrap();
        assert_eq!(prepared.samples.len(), 2);
        assert_eq!(prepared.scale, QuantityScale { min: 10.0, max: 80.0 });
        assert_eq!(prepared.scale.denormalize(0.5), 45);
        assert_eq!(prepared.origin.to_string(), "2023-01");
        assert_eq!(prepared.last_month.to_string(), "2023-08");
        assert_eq!(prepared.last_offset, 7);
        assert_eq!(prepared.encoding.id_of("A"), Some(0));
    }

    #[test]
    fn encoded_rows_keep_input_order() {
        let mut rows = product_a_rows();
        rows.reverse();
        let prepared = prepare(&rows, 6).unwrap();
        let offsets: Vec<u32> = prepared.encoded.iter().map(|r| r.month_offset).collect();
        assert_eq!(offsets, vec![7, 6, 5, 4, 3, 2, 1, 0]);
        assert_eq!(prepared.encoded[0].normalized_quantity, 1.0);
    }

    #[test]
    fn empty_input_is_no_data() {
        let err = prepare(&[], 6).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }
}
