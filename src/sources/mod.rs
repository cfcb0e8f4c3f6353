pub mod parsers;

use crate::config::{SourceConfig, SourceKind};
use crate::loader::load_raw_csv;
use crate::models::{RawRecord, Source};
use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::{info, warn};

use self::parsers::{extract_records, SelectorSet};

// ── Source trait ──────────────────────────────────────────────────────────────

/// Anything that can hand the pipeline a batch of raw records for one site.
pub trait RecordSource {
    fn source(&self) -> Source;
    fn fetch(&self) -> Result<Vec<RawRecord>>;
}

// ── CSV export ────────────────────────────────────────────────────────────────

pub struct CsvFileSource {
    source: Source,
    path: PathBuf,
}

impl CsvFileSource {
    pub fn new(source: Source, path: impl Into<PathBuf>) -> Self {
        Self { source, path: path.into() }
    }
}

impl RecordSource for CsvFileSource {
    fn source(&self) -> Source {
        self.source
    }

    fn fetch(&self) -> Result<Vec<RawRecord>> {
        load_raw_csv(&self.path)
    }
}

// ── Saved HTML page ───────────────────────────────────────────────────────────

pub struct HtmlSnapshotSource {
    source: Source,
    path: PathBuf,
    selectors: SelectorSet,
}

impl HtmlSnapshotSource {
    pub fn new(source: Source, path: impl Into<PathBuf>, selectors: SelectorSet) -> Self {
        Self { source, path: path.into(), selectors }
    }
}

impl RecordSource for HtmlSnapshotSource {
    fn source(&self) -> Source {
        self.source
    }

    fn fetch(&self) -> Result<Vec<RawRecord>> {
        let html = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read HTML snapshot {:?}", self.path))?;
        let records = extract_records(&html, &self.selectors);
        if records.is_empty() {
            warn!("{}: no job cards matched in {:?}", self.source, self.path);
        }
        info!("{:?}: {} raw records", self.path, records.len());
        Ok(records)
    }
}

// ── Factory ───────────────────────────────────────────────────────────────────

pub fn build_source(cfg: &SourceConfig) -> Result<Box<dyn RecordSource>> {
    let source: Source = cfg.name.parse()?;
    match cfg.kind {
        SourceKind::Csv => Ok(Box::new(CsvFileSource::new(source, &cfg.path))),
        SourceKind::Html => {
            let selectors = cfg
                .selectors
                .as_ref()
                .with_context(|| format!("{} html source {:?} has no selectors", source, cfg.path))?;
            let selectors = SelectorSet::compile(selectors)?;
            Ok(Box::new(HtmlSnapshotSource::new(source, &cfg.path, selectors)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(name: &str, kind: SourceKind) -> SourceConfig {
        SourceConfig {
            name: name.into(),
            kind,
            path: PathBuf::from("data/missing.csv"),
            selectors: None,
        }
    }

    #[test]
    fn test_build_source_tags_the_configured_site() {
        let s = build_source(&cfg("indeed", SourceKind::Csv)).unwrap();
        assert_eq!(s.source(), Source::Indeed);
    }

    #[test]
    fn test_build_source_rejects_unknown_site() {
        assert!(build_source(&cfg("monster", SourceKind::Csv)).is_err());
    }

    #[test]
    fn test_html_source_needs_selectors() {
        assert!(build_source(&cfg("Rozee", SourceKind::Html)).is_err());
    }

    #[test]
    fn test_default_rozee_selectors_read_a_listing_page() {
        let config = crate::config::AppConfig::from_toml(include_str!("../../config/default.toml")).unwrap();
        let rozee = config
            .sources
            .iter()
            .find(|s| s.kind == SourceKind::Html)
            .unwrap();
        let selectors = SelectorSet::compile(rozee.selectors.as_ref().unwrap()).unwrap();

        let page = r#"
            <div class="jobListing">
              <h3><a href="/job/1">Python Developer</a></h3>
              <div class="job-info"><span>Arbisoft</span></div>
              <span class="job-location">Lahore</span>
              <span class="job-date">Feb 20, 2024</span>
              <div class="job-desc">Python, Django, SQL</div>
            </div>
        "#;
        let records = extract_records(page, &selectors);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get("title"), Some("Python Developer"));
        assert_eq!(records[0].get("company"), Some("Arbisoft"));
        assert_eq!(records[0].get("location"), Some("Lahore"));
        assert_eq!(records[0].get("date posted"), Some("Feb 20, 2024"));
        assert_eq!(records[0].get("summary"), Some("Python, Django, SQL"));
    }

    #[test]
    fn test_missing_file_is_a_fetch_error() {
        let s = build_source(&cfg("LinkedIn", SourceKind::Csv)).unwrap();
        assert!(s.fetch().is_err());
    }
}
