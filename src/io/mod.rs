//! Input/output helpers.
//!
//! - CSV ingest + validation (`ingest`)
//! - forecast CSV export (`export`)
//! - forecast JSON read/write (`forecast_file`)
//! - trained model JSON read/write (`model_file`)

pub mod export;
pub mod forecast_file;
pub mod ingest;
pub mod model_file;

pub use export::*;
pub use forecast_file::*;
pub use ingest::*;
pub use model_file::*;
