//! Column projection onto the recognized export schema.

use std::path::PathBuf;

use crate::domain::{Column, RawTable};

/// A raw table reduced to recognized columns; cells are still untyped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectedTable {
    pub source: PathBuf,
    pub columns: Vec<Column>,
    /// One entry per source row, each with `columns.len()` cells.
    pub rows: Vec<Vec<String>>,
}

impl ProjectedTable {
    /// Cell for `column` in `row`, or `None` when the source lacked the column.
    pub fn cell<'a>(&self, row: &'a [String], column: Column) -> Option<&'a str> {
        let idx = self.columns.iter().position(|&c| c == column)?;
        row.get(idx).map(String::as_str)
    }
}

/// Keep the intersection of `wanted` and the table's headers, in `wanted` order.
///
/// Missing columns are simply absent from the result; a table with none of
/// them yields zero columns but keeps its row count.
pub fn project(table: &RawTable, wanted: &[Column]) -> ProjectedTable {
    let selected: Vec<(Column, usize)> = wanted
        .iter()
        .filter_map(|&column| {
            table
                .headers
                .iter()
                .position(|h| Column::from_header(h) == Some(column))
                .map(|idx| (column, idx))
        })
        .collect();

    let rows = table
        .rows
        .iter()
        .map(|row| {
            selected
                .iter()
                .map(|&(_, idx)| row.get(idx).cloned().unwrap_or_default())
                .collect()
        })
        .collect();

    ProjectedTable {
        source: table.source.clone(),
        columns: selected.into_iter().map(|(c, _)| c).collect(),
        rows,
    }
}
