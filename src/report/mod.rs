//! Reporting utilities: dataset, preprocessing, training and forecast tables.

pub mod format;

pub use format::*;
