//! Order-export ingest.
//!
//! Reads one tab-separated export into a `RawTable` without interpreting any
//! cell. Whatever columns the file carries are kept; projection and typing
//! happen later in `normalize`.
//!
//! A file is all-or-nothing: a decode error or an over-long row anywhere fails
//! the whole file with a `ParseError`, which the pipeline reports and skips.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;
use tracing::debug;

use crate::domain::RawTable;
use crate::error::ParseError;

/// Read a tab-separated export with a single header row.
pub fn read_raw_table(path: &Path) -> Result<RawTable, ParseError> {
    let file = File::open(path).map_err(|e| ParseError::new(path, format!("cannot open file: {e}")))?;
    let table = read_raw_table_from(path, file)?;
    debug!(
        path = %path.display(),
        columns = table.headers.len(),
        rows = table.rows.len(),
        "parsed export"
    );
    Ok(table)
}

/// Same as [`read_raw_table`] over any reader; `path` is only used for errors.
pub fn read_raw_table_from<R: Read>(path: &Path, reader: R) -> Result<RawTable, ParseError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| ParseError::new(path, format!("cannot read header row: {e}")))?
        .clone();

    let headers = normalize_headers(&headers);
    if headers.iter().all(String::is_empty) {
        return Err(ParseError::new(path, "no header row"));
    }

    let width = headers.len();
    let mut rows = Vec::new();

    for (idx, result) in reader.records().enumerate() {
        // Header is line 1.
        let line = idx + 2;
        let record = result.map_err(|e| ParseError::new(path, format!("line {line}: {e}")))?;

        if record.len() > width {
            return Err(ParseError::new(
                path,
                format!("line {line}: expected {width} fields, saw {}", record.len()),
            ));
        }

        let mut row: Vec<String> = record.iter().map(str::to_string).collect();
        row.resize(width, String::new());
        rows.push(row);
    }

    Ok(RawTable {
        source: path.to_path_buf(),
        headers,
        rows,
    })
}

fn normalize_headers(headers: &StringRecord) -> Vec<String> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            // Spreadsheet tools like to prefix UTF-8 exports with a BOM.
            let name = if idx == 0 { name.trim_start_matches('\u{feff}') } else { name };
            name.trim().to_string()
        })
        .collect()
}
