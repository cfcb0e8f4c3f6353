//! The canonical tabular file: one header row with the six canonical column
//! names, one row per record, UTF-8. Dates are `YYYY-MM-DD`; an unknown date
//! is an empty cell.

use crate::error::{JobTrendError, Result};
use crate::models::{Dataset, Field, JobRecord};
use std::fs;
use std::io::{Read, Write};
use std::path::Path;
use tracing::info;

pub fn write_dataset<W: Write>(writer: W, dataset: &Dataset) -> Result<()> {
    // Header is written by hand so an empty dataset still gets one.
    let mut w = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    w.write_record(Field::header())?;
    for record in dataset {
        w.serialize(record)?;
    }
    w.flush()?;
    Ok(())
}

pub fn read_dataset<R: Read>(reader: R) -> Result<Dataset> {
    let mut r = csv::ReaderBuilder::new().has_headers(true).from_reader(reader);

    let found: Vec<String> = r.headers()?.iter().map(|h| h.to_string()).collect();
    let expected = Field::header();
    if found != expected {
        return Err(JobTrendError::SchemaMismatch {
            expected: expected.join(","),
            found: found.join(","),
        });
    }

    let records = r
        .deserialize::<JobRecord>()
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(Dataset::from_records(records))
}

pub fn save_dataset(path: &Path, dataset: &Dataset) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    write_dataset(fs::File::create(path)?, dataset)?;
    info!("Saved {} records to {:?}", dataset.len(), path);
    Ok(())
}

pub fn load_dataset(path: &Path) -> Result<Dataset> {
    let dataset = read_dataset(fs::File::open(path)?)?;
    info!("Loaded {} records from {:?}", dataset.len(), path);
    Ok(dataset)
}
