use crate::analysis::DEFAULT_SKILL_KEYWORDS;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Top-level application configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    /// Record sources, normalized and concatenated in this order.
    pub sources: Vec<SourceConfig>,
    /// Extra field-name aliases: `[aliases.<common|source>] "raw name" = "canonical_field"`.
    pub aliases: HashMap<String, HashMap<String, String>>,
    pub analysis: AnalysisConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Csv,
    Html,
}

/// One collaborator output to read.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourceConfig {
    /// LinkedIn, Indeed or Rozee.
    pub name: String,
    pub kind: SourceKind,
    pub path: PathBuf,
    /// Required for `kind = "html"`.
    #[serde(default)]
    pub selectors: Option<SelectorConfig>,
}

/// CSS selectors for pulling raw records out of a saved listing page.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SelectorConfig {
    /// Selector matching one element per job card.
    pub card: String,
    /// Raw field name → selectors tried in order within the card.
    pub fields: Vec<FieldSelectors>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FieldSelectors {
    pub name: String,
    pub selectors: Vec<String>,
}

/// Analysis configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub top_n: usize,
    pub skill_keywords: Vec<String>,
    /// Anchor for relative dates such as "3 days ago". Left unset, those
    /// dates are treated as unknown.
    pub reference_date: Option<NaiveDate>,
}

/// Storage configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    pub dataset_path: PathBuf,
    pub db_path: PathBuf,
    pub use_db: bool,
    pub run_migrations: bool,
}

// ── Defaults ─────────────────────────────────────────────────────────────────

fn default_top_n() -> usize {
    5
}
fn default_skill_keywords() -> Vec<String> {
    DEFAULT_SKILL_KEYWORDS.iter().map(|s| s.to_string()).collect()
}
fn default_dataset_path() -> PathBuf {
    PathBuf::from("data/jobs_dataset.csv")
}
fn default_db_path() -> PathBuf {
    PathBuf::from("data/jobs.duckdb")
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            top_n: default_top_n(),
            skill_keywords: default_skill_keywords(),
            reference_date: None,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dataset_path: default_dataset_path(),
            db_path: default_db_path(),
            use_db: false,
            run_migrations: true,
        }
    }
}

// ── Loader ───────────────────────────────────────────────────────────────────

impl AppConfig {
    /// Load configuration from file + environment overrides
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();

        let cfg = config::Config::builder()
            .add_source(
                config::File::with_name("config/default")
                    .required(false)
                    .format(config::FileFormat::Toml),
            )
            .add_source(
                config::File::with_name("config/local")
                    .required(false)
                    .format(config::FileFormat::Toml),
            )
            .add_source(config::Environment::with_prefix("JOBTREND").separator("__"))
            .build()
            .context("Failed to read configuration")?;

        cfg.try_deserialize().context("Invalid configuration")
    }

    /// Parse a TOML document on its own, without files or environment.
    pub fn from_toml(text: &str) -> Result<Self> {
        config::Config::builder()
            .add_source(config::File::from_str(text, config::FileFormat::Toml))
            .build()?
            .try_deserialize()
            .context("Invalid configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let cfg = AppConfig::from_toml("").unwrap();
        assert!(cfg.sources.is_empty());
        assert_eq!(cfg.analysis.top_n, 5);
        assert_eq!(cfg.analysis.skill_keywords.len(), DEFAULT_SKILL_KEYWORDS.len());
        assert_eq!(cfg.storage.dataset_path, PathBuf::from("data/jobs_dataset.csv"));
        assert!(!cfg.storage.use_db);
    }

    #[test]
    fn test_sources_and_selectors() {
        let cfg = AppConfig::from_toml(
            r#"
            [[sources]]
            name = "LinkedIn"
            kind = "csv"
            path = "data/linkedin_jobs.csv"

            [[sources]]
            name = "Indeed"
            kind = "html"
            path = "data/indeed_page_source.html"

            [sources.selectors]
            card = "div.job_seen_beacon"

            [[sources.selectors.fields]]
            name = "title"
            selectors = ["h2.jobTitle", "h2 span"]

            [[sources.selectors.fields]]
            name = "company"
            selectors = ["span.companyName"]

            [analysis]
            top_n = 10
            skill_keywords = ["Rust", "Go"]
            reference_date = "2024-06-01"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.sources.len(), 2);
        assert_eq!(cfg.sources[0].kind, SourceKind::Csv);
        let sel = cfg.sources[1].selectors.as_ref().unwrap();
        assert_eq!(sel.card, "div.job_seen_beacon");
        assert_eq!(sel.fields[0].selectors, vec!["h2.jobTitle", "h2 span"]);
        assert_eq!(cfg.analysis.top_n, 10);
        assert_eq!(cfg.analysis.skill_keywords, vec!["Rust", "Go"]);
        assert_eq!(
            cfg.analysis.reference_date,
            NaiveDate::from_ymd_opt(2024, 6, 1)
        );
    }
}
