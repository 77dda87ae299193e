//! Future calendar labels.

use crate::domain::YearMonth;

/// The `count` months strictly after a start month, in order.
///
/// Cloning the iterator (or building a new one) restarts the sequence; no
/// state is shared between sequences.
#[derive(Debug, Clone)]
pub struct MonthSeq {
    next: Option<YearMonth>,
    remaining: usize,
}

impl MonthSeq {
    pub fn after(start: YearMonth, count: usize) -> Self {
        Self {
            next: start.add_months(1),
            remaining: count,
        }
    }
}

impl Iterator for MonthSeq {
    type Item = YearMonth;

    fn next(&mut self) -> Option<YearMonth> {
        if self.remaining == 0 {
            return None;
        }
        let current = self.next?;
        self.next = current.add_months(1);
        self.remaining -= 1;
        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.next.is_none() {
            return (0, Some(0));
        }
        (0, Some(self.remaining))
    }
}

/// `count` months after `start`.
pub fn future_months(start: YearMonth, count: usize) -> Vec<YearMonth> {
    MonthSeq::after(start, count).collect()
}
