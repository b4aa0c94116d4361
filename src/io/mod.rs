//! Input/output helpers.
//!
//! - order-export parsing (`ingest`)
//! - artifact persistence (`export`)
//! - purchase-cost lookup store (`costs`)

pub mod costs;
pub mod export;
pub mod ingest;

pub use costs::*;
pub use export::*;
pub use ingest::*;
