//! CSV loader for raw collaborator exports (any header, one listing per row).

use crate::models::{RawRecord, Source};
use anyhow::{Context, Result};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Guess the source from a CSV filename.
/// "linkedin_jobs_2024-05-01.csv" → LinkedIn | "cleaned_indeed_jobs.csv" → Indeed
pub fn source_from_filename(path: &Path) -> Option<Source> {
    let stem = path.file_stem()?.to_str()?.to_lowercase();
    stem.split(|c: char| c == '_' || c == ' ' || c == '-' || c == '.')
        .find_map(|part| part.parse::<Source>().ok())
}

/// Read raw records from CSV text. Header cells become field names; short
/// rows are padded with empty values, cells past the header are ignored.
pub fn read_raw_records<R: Read>(reader: R) -> Result<Vec<RawRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = reader.headers().context("CSV has no header row")?.clone();
    let mut records = Vec::new();

    for (i, result) in reader.records().enumerate() {
        let row = match result {
            Ok(r) => r,
            Err(e) => {
                warn!("Row {}: {}", i + 1, e);
                continue;
            }
        };

        let raw: RawRecord = headers
            .iter()
            .enumerate()
            .map(|(col, name)| (name, row.get(col).unwrap_or("")))
            .collect();
        records.push(raw);
    }

    Ok(records)
}

pub fn load_raw_csv(path: &Path) -> Result<Vec<RawRecord>> {
    debug!("Loading raw records from {:?}", path);
    let file = std::fs::File::open(path).with_context(|| format!("Failed to open {:?}", path))?;
    let records = read_raw_records(file).with_context(|| format!("Failed to read {:?}", path))?;
    info!("{:?}: {} raw records", path, records.len());
    Ok(records)
}

/// CSV files directly inside `dir`, sorted by name so runs are reproducible.
pub fn discover_csv_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.exists() {
        return Ok(vec![]);
    }

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().map(|e| e == "csv").unwrap_or(false) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
