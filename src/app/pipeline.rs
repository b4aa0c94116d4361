//! Shared ingest pipeline used by every front-end command.
//!
//! discover exports -> parse -> persist raw concatenation -> project ->
//! canonicalize -> deduplicate -> persist canonical set
//!
//! Commands call [`run`] explicitly; nothing runs at load time.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use glob::Pattern;
use tracing::{info, warn};

use crate::domain::{CanonicalRecord, PipelineConfig};
use crate::error::{AppError, ParseError};
use crate::io::{read_raw_table, write_canonical, write_combined_raw};
use crate::normalize::{RowError, normalize_tables};

/// Why a run produced nothing. Not an error: there was simply no work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoDataReason {
    NoFilesFound { extension: String },
    NoFilesParsed { failures: Vec<ParseError> },
}

impl std::fmt::Display for NoDataReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NoDataReason::NoFilesFound { extension } => write!(f, "No .{extension} files found."),
            NoDataReason::NoFilesParsed { failures } => {
                write!(f, "No file was processed successfully ({} failed).", failures.len())
            }
        }
    }
}

/// Everything a completed run produced.
#[derive(Debug, Clone)]
pub struct PipelineRun {
    /// Deduplicated canonical records, ordered by order id.
    pub records: Vec<CanonicalRecord>,
    pub files_read: Vec<PathBuf>,
    pub file_errors: Vec<ParseError>,
    pub row_errors: Vec<RowError>,
    pub raw_rows: usize,
    pub superseded: usize,
    pub combined_path: PathBuf,
    pub canonical_path: PathBuf,
}

#[derive(Debug, Clone)]
pub enum RunOutcome {
    Completed(PipelineRun),
    NoData(NoDataReason),
}

impl RunOutcome {
    pub fn records(&self) -> Option<&[CanonicalRecord]> {
        match self {
            RunOutcome::Completed(run) => Some(&run.records),
            RunOutcome::NoData(_) => None,
        }
    }

    /// Completed run, or an exit-code-3 error carrying the no-data message.
    pub fn into_run(self) -> Result<PipelineRun, AppError> {
        match self {
            RunOutcome::Completed(run) => Ok(run),
            RunOutcome::NoData(reason) => Err(AppError::new(3, reason.to_string())),
        }
    }
}

/// Run the full ingest pipeline.
///
/// Per-file parse failures are reported in the result and never abort the
/// run. Only directory creation and artifact writes are fatal. When nothing
/// is found or nothing parses, no artifact is written.
pub fn run(config: &PipelineConfig) -> Result<RunOutcome, AppError> {
    ensure_dir(&config.input_dir)?;
    ensure_dir(&config.output_dir)?;

    let files = discover_inputs(config)?;
    if files.is_empty() {
        let reason = NoDataReason::NoFilesFound {
            extension: config.extension.clone(),
        };
        warn!("{reason}");
        return Ok(RunOutcome::NoData(reason));
    }

    let mut tables = Vec::with_capacity(files.len());
    let mut file_errors = Vec::new();
    for path in &files {
        match read_raw_table(path) {
            Ok(table) => tables.push(table),
            Err(err) => {
                warn!("{err}");
                file_errors.push(err);
            }
        }
    }

    if tables.is_empty() {
        let reason = NoDataReason::NoFilesParsed { failures: file_errors };
        warn!("{reason}");
        return Ok(RunOutcome::NoData(reason));
    }

    let combined_path = config.combined_raw_path();
    write_combined_raw(&combined_path, &tables)?;

    let normalized = normalize_tables(&tables);

    let canonical_path = config.canonical_path();
    write_canonical(&canonical_path, &normalized.records)?;

    let raw_rows: usize = tables.iter().map(|t| t.rows.len()).sum();
    info!(
        files = tables.len(),
        failed = file_errors.len(),
        raw_rows,
        orders = normalized.records.len(),
        rejected = normalized.rejected.len(),
        "pipeline run complete"
    );

    Ok(RunOutcome::Completed(PipelineRun {
        records: normalized.records,
        files_read: tables.into_iter().map(|t| t.source).collect(),
        file_errors,
        row_errors: normalized.rejected,
        raw_rows,
        superseded: normalized.superseded,
        combined_path,
        canonical_path,
    }))
}

/// Find export files in the scan dir then the input dir, sorted within each.
///
/// A file reachable from both directories is listed once.
pub fn discover_inputs(config: &PipelineConfig) -> Result<Vec<PathBuf>, AppError> {
    let mut seen = HashSet::new();
    let mut files = Vec::new();

    for dir in config.discovery_dirs() {
        let pattern = format!(
            "{}/*.{}",
            Pattern::escape(&dir.to_string_lossy()),
            Pattern::escape(&config.extension)
        );
        let entries = glob::glob(&pattern)
            .map_err(|e| AppError::new(2, format!("Invalid discovery pattern '{pattern}': {e}")))?;

        let mut found: Vec<PathBuf> = entries
            .filter_map(|entry| match entry {
                Ok(path) => Some(path),
                Err(e) => {
                    warn!("skipping unreadable path: {e}");
                    None
                }
            })
            .filter(|p| p.is_file())
            .collect();
        found.sort();

        for path in found {
            let key = fs::canonicalize(&path).unwrap_or_else(|_| path.clone());
            if seen.insert(key) {
                files.push(path);
            }
        }
    }

    Ok(files)
}

fn ensure_dir(dir: &Path) -> Result<(), AppError> {
    fs::create_dir_all(dir)
        .map_err(|e| AppError::new(2, format!("Failed to create directory '{}': {e}", dir.display())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config_in(root: &Path) -> PipelineConfig {
        PipelineConfig {
            scan_dir: Some(root.join("scan")),
            ..PipelineConfig::new(root.join("in"), root.join("out"))
        }
    }

    #[test]
    fn discovery_lists_scan_dir_first_and_sorted() {
        let root = TempDir::new().unwrap();
        let config = config_in(root.path());
        fs::create_dir_all(root.path().join("scan")).unwrap();
        fs::create_dir_all(&config.input_dir).unwrap();

        fs::write(root.path().join("scan/b.txt"), "x").unwrap();
        fs::write(root.path().join("scan/notes.md"), "x").unwrap();
        fs::write(config.input_dir.join("c.txt"), "x").unwrap();
        fs::write(config.input_dir.join("a.txt"), "x").unwrap();

        let names: Vec<String> = discover_inputs(&config)
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["b.txt", "a.txt", "c.txt"]);
    }

    #[test]
    fn same_directory_twice_lists_each_file_once() {
        let root = TempDir::new().unwrap();
        let mut config = config_in(root.path());
        config.scan_dir = Some(config.input_dir.clone());
        fs::create_dir_all(&config.input_dir).unwrap();
        fs::write(config.input_dir.join("a.txt"), "x").unwrap();

        assert_eq!(discover_inputs(&config).unwrap().len(), 1);
    }

    #[test]
    fn unparseable_files_only_yield_no_data() {
        let root = TempDir::new().unwrap();
        let config = config_in(root.path());
        fs::create_dir_all(&config.input_dir).unwrap();
        fs::write(config.input_dir.join("empty.txt"), "").unwrap();

        let outcome = run(&config).unwrap();
        match outcome {
            RunOutcome::NoData(NoDataReason::NoFilesParsed { failures }) => assert_eq!(failures.len(), 1),
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert!(!config.canonical_path().exists());
        assert!(!config.combined_raw_path().exists());
    }
}
