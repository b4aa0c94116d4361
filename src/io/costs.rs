//! Persisted product → purchase-cost lookup.
//!
//! A two-column TSV (`product-name`, `purchase-cost`) read and written as a
//! whole. There is no partial update: `save_cost_lookup` rewrites the table.

use std::fs::File;
use std::io::ErrorKind;
use std::path::Path;
use std::str::FromStr;

use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::domain::CostLookup;
use crate::error::AppError;
use crate::io::export::write_tsv_atomic;

const PRODUCT_HEADER: &str = "product-name";
const COST_HEADER: &str = "purchase-cost";

/// Load the lookup; a store that does not exist yet is an empty lookup.
///
/// Rows with a non-numeric cost are skipped (their cost stays unknown).
pub fn load_cost_lookup(path: &Path) -> Result<CostLookup, AppError> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(CostLookup::new()),
        Err(e) => {
            return Err(AppError::new(
                2,
                format!("Failed to open cost lookup '{}': {e}", path.display()),
            ));
        }
    };

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .flexible(true)
        .from_reader(file);

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read cost lookup header: {e}")))?
        .clone();

    let position = |name: &str| {
        headers
            .iter()
            .position(|h| h.trim().trim_start_matches('\u{feff}') == name)
            .ok_or_else(|| {
                AppError::new(
                    2,
                    format!("Cost lookup '{}' is missing the `{name}` column", path.display()),
                )
            })
    };
    let product_idx = position(PRODUCT_HEADER)?;
    let cost_idx = position(COST_HEADER)?;

    let mut costs = CostLookup::new();
    for (idx, result) in reader.records().enumerate() {
        let line = idx + 2;
        let record = result
            .map_err(|e| AppError::new(2, format!("Failed to read cost lookup line {line}: {e}")))?;

        let Some(product) = record.get(product_idx).map(str::trim).filter(|s| !s.is_empty()) else {
            warn!(line, "cost lookup row without a product name; skipped");
            continue;
        };
        let raw_cost = record.get(cost_idx).map(str::trim).unwrap_or_default();

        match Decimal::from_str(raw_cost) {
            Ok(cost) => {
                costs.insert(product.to_string(), cost);
            }
            Err(_) => warn!(line, product, cost = raw_cost, "non-numeric purchase cost; treated as unknown"),
        }
    }

    Ok(costs)
}

/// Replace the persisted lookup with `costs`.
///
/// Negative costs are rejected before anything touches the disk.
pub fn save_cost_lookup(path: &Path, costs: &CostLookup) -> Result<(), AppError> {
    if let Some((product, cost)) = costs.iter().find(|(_, cost)| **cost < Decimal::ZERO) {
        return Err(AppError::new(
            2,
            format!("Purchase cost for '{product}' must not be negative (got {cost})."),
        ));
    }

    let rows: Vec<Vec<String>> = costs
        .iter()
        .map(|(product, cost)| vec![product.clone(), cost.normalize().to_string()])
        .collect();

    write_tsv_atomic(path, &[PRODUCT_HEADER, COST_HEADER], &rows)?;
    info!(path = %path.display(), entries = rows.len(), "saved cost lookup");
    Ok(())
}
