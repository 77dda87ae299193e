//! `sales-forecast` library crate.
//!
//! The binary (`sf`) is a thin wrapper around this library so that:
//!
//! - the preprocessing and forecasting core is testable without spawning processes
//! - the model collaborator can be swapped behind the `Regressor` trait
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod domain;
pub mod error;
pub mod forecast;
pub mod io;
pub mod models;
pub mod prep;
pub mod report;
