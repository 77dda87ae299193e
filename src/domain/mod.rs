//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the calendar month type (`YearMonth`)
//! - input rows and their encoded form (`SalesRecord`, `EncodedRecord`)
//! - training pairs (`WindowSample`) and forecast outputs (`ProductForecast`)
//! - the run configuration (`ForecastConfig`)

pub mod types;

pub use types::*;
