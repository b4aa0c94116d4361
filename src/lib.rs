//! `salesboard` library crate.
//!
//! Ingests tab-separated order exports, normalizes and deduplicates them into
//! canonical sales records, and computes sales/profit metrics against a
//! user-maintained purchase-cost lookup.
//!
//! Front-ends only need the three functions re-exported here: [`run`],
//! [`load_cost_lookup`] and [`save_cost_lookup`].

pub mod app;
pub mod cli;
pub mod domain;
pub mod error;
pub mod io;
pub mod normalize;
pub mod report;

pub use app::pipeline::{NoDataReason, PipelineRun, RunOutcome, run};
pub use domain::{CanonicalRecord, CostLookup, PipelineConfig};
pub use error::AppError;
pub use io::costs::{load_cost_lookup, save_cost_lookup};
