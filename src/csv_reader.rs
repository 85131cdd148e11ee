use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use anyhow::{Context, Result};

use crate::data::RecordTable;

/// Read a listings table from CSV on stdin
pub fn read_csv_from_stdin() -> Result<RecordTable> {
    let stdin = io::stdin();
    read_csv_from_reader(stdin.lock())
}

/// Read a listings table from a CSV file
pub fn read_csv_from_path(path: &Path) -> Result<RecordTable> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open '{}'", path.display()))?;
    read_csv_from_reader(file)
}

/// Read CSV with a header row. Cells are kept as trimmed strings; rows may be
/// ragged and short rows simply lack the trailing cells.
pub fn read_csv_from_reader<R: Read>(reader: R) -> Result<RecordTable> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = csv_reader
        .headers()
        .context("Failed to read CSV headers")?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();

    let mut rows: Vec<Vec<String>> = Vec::new();
    for (idx, record) in csv_reader.records().enumerate() {
        let record = record.with_context(|| format!("Failed to read CSV row {}", idx + 1))?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    if rows.is_empty() {
        anyhow::bail!("CSV must contain at least one data row");
    }

    Ok(RecordTable::new(headers, rows))
}
