//! Pipeline orchestrator: sources → normalizer → dataset → storage.
//!
//! ## Run
//!
//! `run()`:
//!   1. Build every configured source, in configuration order.
//!   2. Fetch and normalize each one. A source that fails is logged and
//!      skipped; the others still make it into the dataset.
//!   3. Concatenate the batches in configuration order.
//!   4. Write the dataset file, and mirror it into DuckDB when enabled.
//!
//! The dataset is rebuilt from scratch on every run.

use crate::analysis::Aggregator;
use crate::config::AppConfig;
use crate::models::JobRecord;
use crate::normalizer::{AliasTable, Normalizer};
use crate::sources::{build_source, RecordSource};
use crate::storage::{save_dataset, Repository};
use anyhow::{Context, Result};
use tracing::{debug, info, warn};

pub struct Pipeline {
    config: AppConfig,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PipelineStats {
    pub sources_processed: usize,
    pub sources_failed: usize,
    pub records_loaded: usize,
    pub unreconciled: usize,
    pub unparsed_dates: usize,
}

impl Pipeline {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    /// Built-in aliases extended with the configured ones.
    pub fn normalizer(&self) -> Result<Normalizer> {
        let mut aliases = AliasTable::builtin();
        aliases
            .extend_from_config(&self.config.aliases)
            .context("Invalid [aliases] configuration")?;
        let normalizer = Normalizer::new(aliases);
        Ok(match self.config.analysis.reference_date {
            Some(d) => normalizer.with_reference_date(d),
            None => normalizer,
        })
    }

    pub fn run(&self) -> Result<(Aggregator, PipelineStats)> {
        let mut sources: Vec<Box<dyn RecordSource>> = Vec::new();
        let mut broken = 0usize;
        for cfg in &self.config.sources {
            match build_source(cfg) {
                Ok(s) => sources.push(s),
                Err(e) => {
                    warn!("Skipping source {} ({:?}): {:#}", cfg.name, cfg.path, e);
                    broken += 1;
                }
            }
        }
        if sources.is_empty() {
            warn!("No usable sources configured; the dataset will be empty");
        }

        let (agg, mut stats) = self.collect(&sources)?;
        stats.sources_failed += broken;
        self.persist(&agg, &stats)?;

        info!(
            "=== Done: {} sources | {} records | {} failed sources | {} unreadable dates ===",
            stats.sources_processed, stats.records_loaded, stats.sources_failed, stats.unparsed_dates,
        );
        Ok((agg, stats))
    }

    /// Fetch and normalize every source, concatenating in the order given.
    pub fn collect(&self, sources: &[Box<dyn RecordSource>]) -> Result<(Aggregator, PipelineStats)> {
        let normalizer = self.normalizer()?;
        let mut stats = PipelineStats::default();
        let mut batches: Vec<Vec<JobRecord>> = Vec::with_capacity(sources.len());

        for src in sources {
            let raw = match src.fetch() {
                Ok(raw) => raw,
                Err(e) => {
                    warn!("{}: fetch failed: {:#}", src.source(), e);
                    stats.sources_failed += 1;
                    continue;
                }
            };

            let batch = normalizer.normalize_batch(&raw, src.source());
            debug!(
                "{}: appending {} records after {}",
                batch.source,
                batch.records.len(),
                stats.records_loaded
            );
            stats.sources_processed += 1;
            stats.records_loaded += batch.records.len();
            stats.unreconciled += batch.stats.unreconciled;
            stats.unparsed_dates += batch.stats.unparsed_dates;
            batches.push(batch.records);
        }

        Ok((Aggregator::from_batches(batches), stats))
    }

    fn persist(&self, agg: &Aggregator, stats: &PipelineStats) -> Result<()> {
        let storage = &self.config.storage;
        save_dataset(&storage.dataset_path, agg.dataset())
            .with_context(|| format!("Failed to write dataset {:?}", storage.dataset_path))?;

        if !storage.use_db {
            return Ok(());
        }

        let repo = Repository::open(&storage.db_path).context("Failed to open DuckDB")?;
        if storage.run_migrations {
            repo.run_migrations()?;
        }
        let run_id = repo.begin_run()?;
        let result = repo.replace_dataset(agg.dataset());
        let error = match &result {
            Ok(_) if stats.sources_failed > 0 => Some(format!("{} sources failed", stats.sources_failed)),
            Ok(_) => None,
            Err(e) => Some(format!("{:#}", e)),
        };
        repo.finish_run(run_id, stats.sources_processed, stats.records_loaded, error.as_deref())?;
        result.map(|_| ())
    }
}
