//! Post-processing and inference assembly.
//!
//! - future calendar labels (`calendar`)
//! - per-product future windows, model calls and denormalization (`assemble`)

pub mod assemble;
pub mod calendar;

pub use assemble::*;
pub use calendar::*;
