//! Raw tables → deduplicated canonical records.
//!
//! - `project`: keep only recognized columns
//! - `canonical`: type and clean each cell, reject bad rows
//! - `dedup`: one authoritative record per order id

pub mod canonical;
pub mod dedup;
pub mod project;

use tracing::warn;

use crate::domain::{CanonicalRecord, Column, RawTable};

pub use canonical::{CanonicalBatch, RowError, canonicalize};
pub use dedup::{DedupOutcome, deduplicate};
pub use project::{ProjectedTable, project};

/// Output of a full normalization pass over every parsed table.
#[derive(Debug, Clone, Default)]
pub struct Normalized {
    pub records: Vec<CanonicalRecord>,
    pub rejected: Vec<RowError>,
    pub superseded: usize,
}

/// Project, canonicalize and deduplicate across all tables.
pub fn normalize_tables(tables: &[RawTable]) -> Normalized {
    let mut records = Vec::new();
    let mut rejected = Vec::new();

    for table in tables {
        let projected = project(table, &Column::ALL);
        let batch = canonicalize(&projected);
        for err in &batch.rejected {
            warn!("rejected row {err}");
        }
        records.extend(batch.records);
        rejected.extend(batch.rejected);
    }

    let deduped = deduplicate(records);
    Normalized {
        records: deduped.records,
        rejected,
        superseded: deduped.superseded,
    }
}
