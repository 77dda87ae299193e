//! Month offsets relative to the earliest observed month.

use crate::domain::YearMonth;

/// Month offsets of `months` from their calendar minimum.
///
/// The earliest month maps to 0 and the mapping preserves calendar order.
/// Returns the origin (the minimum) alongside the offsets; `None` for empty
/// input.
pub fn normalize_months(months: &[YearMonth]) -> Option<(YearMonth, Vec<u32>)> {
    let origin = months.iter().copied().min()?;
    let offsets = months
        .iter()
        .map(|m| {
            // `origin` is the minimum, so the difference is never negative.
            m.months_since(origin) as u32
        })
        .collect();
    Some((origin, offsets))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ym(s: &str) -> YearMonth {
        YearMonth::parse(s).unwrap()
    }

    #[test]
    fn earliest_month_is_zero() {
        let months = [ym("2023-03"), ym("2022-11"), ym("2023-01")];
        let (origin, offsets) = normalize_months(&months).unwrap();
        assert_eq!(origin, ym("2022-11"));
        assert_eq!(offsets, vec![4, 0, 2]);
    }

    #[test]
    fn order_is_preserved() {
        let months = [ym("2021-12"), ym("2022-01"), ym("2022-02"), ym("2024-06")];
        let (_, offsets) = normalize_months(&months).unwrap();
        for pair in offsets.windows(2) {
            assert!(pair[0] < pair[1]);
        }
        assert_eq!(offsets[3], 30);
    }

    #[test]
    fn repeated_months_share_an_offset() {
        let months = [ym("2023-05"), ym("2023-05"), ym("2023-06")];
        let (_, offsets) = normalize_months(&months).unwrap();
        assert_eq!(offsets, vec![0, 0, 1]);
    }

    #[test]
    fn empty_input_has_no_origin() {
        assert!(normalize_months(&[]).is_none());
    }
}
