//! Persist pipeline artifacts as tab-separated files.
//!
//! Every write goes to a hidden temp file in the target directory and is then
//! renamed over the destination, so a reader never sees a half-written table.
//! Concurrent writers are not coordinated: the last rename wins.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::domain::{CanonicalRecord, Column, RawTable};
use crate::error::AppError;

/// Concatenate raw tables under the union of their headers (first-seen order).
///
/// Cells for columns a file does not have are left empty.
pub fn combine_raw_tables(tables: &[RawTable]) -> (Vec<String>, Vec<Vec<String>>) {
    let mut headers: Vec<String> = Vec::new();
    for table in tables {
        for name in &table.headers {
            if !headers.contains(name) {
                headers.push(name.clone());
            }
        }
    }

    let mut rows = Vec::with_capacity(tables.iter().map(|t| t.rows.len()).sum());
    for table in tables {
        let positions: Vec<usize> = table
            .headers
            .iter()
            .map(|name| headers.iter().position(|h| h == name).unwrap_or(0))
            .collect();

        for raw in &table.rows {
            let mut row = vec![String::new(); headers.len()];
            let mut filled = vec![false; headers.len()];
            for (cell, &pos) in raw.iter().zip(&positions) {
                // Duplicate header names collapse onto the first occurrence.
                if !filled[pos] {
                    row[pos] = cell.clone();
                    filled[pos] = true;
                }
            }
            rows.push(row);
        }
    }

    (headers, rows)
}

/// Write the unfiltered concatenation of every parsed export.
pub fn write_combined_raw(path: &Path, tables: &[RawTable]) -> Result<(), AppError> {
    let (headers, rows) = combine_raw_tables(tables);
    write_tsv_atomic(path, &headers, &rows)?;
    info!(path = %path.display(), rows = rows.len(), "wrote combined raw data");
    Ok(())
}

/// Write the canonical record set with the fixed 13-column header.
pub fn write_canonical(path: &Path, records: &[CanonicalRecord]) -> Result<(), AppError> {
    let headers: Vec<&str> = Column::ALL.iter().map(|c| c.header_name()).collect();
    let rows: Vec<Vec<String>> = records
        .iter()
        .map(|r| {
            Column::ALL
                .iter()
                .map(|&c| r.display_value(c).unwrap_or_default())
                .collect()
        })
        .collect();

    write_tsv_atomic(path, &headers, &rows)?;
    info!(path = %path.display(), rows = rows.len(), "wrote canonical data");
    Ok(())
}

/// Write a header + rows as TSV via temp file and rename.
pub fn write_tsv_atomic<H, C>(path: &Path, headers: &[H], rows: &[Vec<C>]) -> Result<(), AppError>
where
    H: AsRef<[u8]>,
    C: AsRef<[u8]>,
{
    let tmp_path = temp_path_for(path)?;

    if let Err(e) = write_tsv(&tmp_path, path, headers, rows) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e);
    }

    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        AppError::new(
            2,
            format!("Failed to move '{}' into place at '{}': {e}", tmp_path.display(), path.display()),
        )
    })
}

fn write_tsv<H, C>(tmp_path: &Path, path: &Path, headers: &[H], rows: &[Vec<C>]) -> Result<(), AppError>
where
    H: AsRef<[u8]>,
    C: AsRef<[u8]>,
{
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_path(tmp_path)
        .map_err(|e| AppError::new(2, format!("Failed to create '{}': {e}", tmp_path.display())))?;

    writer
        .write_record(headers)
        .map_err(|e| AppError::new(2, format!("Failed to write header to '{}': {e}", path.display())))?;
    for row in rows {
        writer
            .write_record(row)
            .map_err(|e| AppError::new(2, format!("Failed to write row to '{}': {e}", path.display())))?;
    }
    writer
        .flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush '{}': {e}", path.display())))
}

fn temp_path_for(path: &Path) -> Result<PathBuf, AppError> {
    let name = path
        .file_name()
        .ok_or_else(|| AppError::new(4, format!("Not a file path: '{}'", path.display())))?;
    let dir = path.parent().unwrap_or_else(|| Path::new(""));
    Ok(dir.join(format!(".{}.tmp", name.to_string_lossy())))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(headers: &[&str], rows: &[&[&str]]) -> RawTable {
        RawTable {
            source: PathBuf::from("t.txt"),
            headers: headers.iter().map(|s| s.to_string()).collect(),
            rows: rows
                .iter()
                .map(|r| r.iter().map(|s| s.to_string()).collect())
                .collect(),
        }
    }

    #[test]
    fn combine_takes_union_of_columns() {
        let a = table(&["id", "sku"], &[&["O1", "S1"]]);
        let b = table(&["id", "city"], &[&["O2", "Vitória"]]);

        let (headers, rows) = combine_raw_tables(&[a, b]);
        assert_eq!(headers, vec!["id", "sku", "city"]);
        assert_eq!(rows[0], vec!["O1", "S1", ""]);
        assert_eq!(rows[1], vec!["O2", "", "Vitória"]);
    }

    #[test]
    fn duplicate_header_keeps_first_cell_even_when_empty() {
        let t = table(&["id", "sku", "sku"], &[&["O1", "", "S2"], &["O2", "S1", "S3"]]);

        let (headers, rows) = combine_raw_tables(&[t]);
        assert_eq!(headers, vec!["id", "sku"]);
        assert_eq!(rows[0], vec!["O1", ""]);
        assert_eq!(rows[1], vec!["O2", "S1"]);
    }

    #[test]
    fn atomic_write_leaves_no_temp_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("out.tsv");
        write_tsv_atomic(&path, &["a", "b"], &[vec!["1", "2"]]).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "a\tb\n1\t2\n");
        let leftovers: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(leftovers.len(), 1);
    }
}
