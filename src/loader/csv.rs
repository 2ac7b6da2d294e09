//! CSV loading: the whole row-set becomes one record.
//!
//! Each row is rendered as `header: value` lines so the embedding sees the
//! column names next to the values; rows are separated by blank lines.

use std::path::Path;

use anyhow::Context;

use crate::models::RawDocument;
use crate::utils::file::read_file_bytes;

pub fn load(path: &Path, source_path: &str, max_size: u64) -> anyhow::Result<Vec<RawDocument>> {
    let bytes =
        read_file_bytes(path, max_size).with_context(|| format!("reading {}", path.display()))?;

    let mut reader = csv::Reader::from_reader(bytes.as_slice());
    let headers = reader
        .headers()
        .with_context(|| format!("reading CSV headers from {}", path.display()))?
        .clone();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.with_context(|| format!("reading CSV row from {}", path.display()))?;
        let row: Vec<String> = headers
            .iter()
            .zip(record.iter())
            .map(|(header, value)| format!("{header}: {value}"))
            .collect();
        rows.push(row.join("\n"));
    }

    Ok(vec![RawDocument::new(rows.join("\n\n"), source_path, None)])
}
