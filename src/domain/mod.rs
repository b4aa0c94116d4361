//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the recognized export schema (`Column`)
//! - raw and canonical record shapes (`RawTable`, `CanonicalRecord`)
//! - enumerated statuses with pass-through for unknown codes
//! - run configuration (`PipelineConfig`)

pub mod types;

pub use types::*;
