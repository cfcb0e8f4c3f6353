pub mod dataset_file;

use crate::models::{Dataset, JobRecord, PostingDate, Source};
use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use duckdb::{params, Connection};
use std::path::Path;
use tracing::info;

pub use self::dataset_file::{load_dataset, save_dataset, write_dataset};

// ── Schema ────────────────────────────────────────────────────────────────────

const DDL: &str = r#"
CREATE SEQUENCE IF NOT EXISTS pipeline_run_ids START 1;

CREATE TABLE IF NOT EXISTS job_records (
    -- insertion order of the dataset
    position        BIGINT  NOT NULL,
    job_title       VARCHAR NOT NULL DEFAULT '',
    company_name    VARCHAR NOT NULL DEFAULT '',
    location        VARCHAR NOT NULL DEFAULT '',
    skills          VARCHAR NOT NULL DEFAULT '',
    -- NULL when the posting date could not be read
    posting_date    DATE,
    source          VARCHAR NOT NULL
);

CREATE TABLE IF NOT EXISTS pipeline_runs (
    id                  BIGINT PRIMARY KEY DEFAULT nextval('pipeline_run_ids'),
    started_at          TIMESTAMP NOT NULL,
    finished_at         TIMESTAMP,
    status              VARCHAR NOT NULL DEFAULT 'running',
    sources_processed   BIGINT DEFAULT 0,
    records_loaded      BIGINT DEFAULT 0,
    error_msg           VARCHAR
);

CREATE TABLE IF NOT EXISTS schema_version (
    version     INTEGER PRIMARY KEY,
    applied_at  TIMESTAMP NOT NULL
);
"#;

const INDEXES: &str = r#"
CREATE INDEX IF NOT EXISTS idx_jobs_date   ON job_records (posting_date);
CREATE INDEX IF NOT EXISTS idx_jobs_source ON job_records (source);
"#;

// ── Repository ────────────────────────────────────────────────────────────────

/// DuckDB mirror of the latest dataset plus a log of pipeline runs.
pub struct Repository {
    conn: Connection,
}

impl Repository {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Could not create dir {:?}", parent))?;
        }
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open DuckDB at {:?}", path))?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self { conn: Connection::open_in_memory()? })
    }

    pub fn run_migrations(&self) -> Result<()> {
        info!("Running migrations…");
        self.conn.execute_batch(DDL).context("DDL failed")?;
        self.conn.execute_batch(INDEXES).context("Index creation failed")?;
        self.conn.execute(
            "INSERT OR IGNORE INTO schema_version (version, applied_at) VALUES (1, ?)",
            params![Utc::now().naive_utc()],
        )?;
        info!("Migrations done.");
        Ok(())
    }

    // ── Job records ───────────────────────────────────────────────────────────

    /// Replace the stored dataset wholesale. Runs in one transaction, so a
    /// failure leaves the previous dataset in place.
    pub fn replace_dataset(&self, dataset: &Dataset) -> Result<usize> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM job_records", [])?;

        let sql = r#"
            INSERT INTO job_records
                (position, job_title, company_name, location, skills, posting_date, source)
            VALUES (?, ?, ?, ?, ?, ?, ?)
        "#;
        for (i, r) in dataset.iter().enumerate() {
            tx.execute(sql, params![
                i as i64,
                r.job_title, r.company_name, r.location, r.skills,
                r.posting_date.date(),
                r.source.as_str(),
            ]).with_context(|| format!("insert record {} ({})", i, r.job_title))?;
        }

        tx.commit()?;
        Ok(dataset.len())
    }

    /// Stored dataset in its original order.
    pub fn load_dataset(&self) -> Result<Dataset> {
        let mut stmt = self.conn.prepare(
            r#"SELECT job_title, company_name, location, skills, posting_date, source
               FROM job_records ORDER BY position"#,
        )?;
        let rows = stmt
            .query_map([], |r| {
                Ok((
                    r.get::<_, String>(0)?,
                    r.get::<_, String>(1)?,
                    r.get::<_, String>(2)?,
                    r.get::<_, String>(3)?,
                    r.get::<_, Option<NaiveDate>>(4)?,
                    r.get::<_, String>(5)?,
                ))
            })?
            .collect::<duckdb::Result<Vec<_>>>()?;

        let mut records = Vec::with_capacity(rows.len());
        for (job_title, company_name, location, skills, date, source) in rows {
            records.push(JobRecord {
                job_title,
                company_name,
                location,
                skills,
                posting_date: PostingDate::from(date),
                source: source.parse::<Source>()?,
            });
        }
        Ok(Dataset::from_records(records))
    }

    pub fn record_count(&self) -> Result<i64> {
        let mut s = self.conn.prepare("SELECT COUNT(*) FROM job_records")?;
        Ok(s.query_row([], |r| r.get(0))?)
    }

    pub fn count_by_source(&self) -> Result<Vec<(String, i64)>> {
        let mut s = self.conn.prepare(
            "SELECT source, COUNT(*) FROM job_records GROUP BY source ORDER BY source",
        )?;
        let rows = s
            .query_map([], |r| Ok((r.get(0)?, r.get(1)?)))?
            .collect::<duckdb::Result<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn date_range(&self) -> Result<(Option<NaiveDate>, Option<NaiveDate>)> {
        let mut s = self
            .conn
            .prepare("SELECT MIN(posting_date), MAX(posting_date) FROM job_records")?;
        Ok(s.query_row([], |r| Ok((r.get(0)?, r.get(1)?)))?)
    }

    // ── Pipeline run log ──────────────────────────────────────────────────────

    pub fn begin_run(&self) -> Result<i64> {
        let id: i64 = self.conn.query_row(
            "INSERT INTO pipeline_runs (started_at, status) VALUES (?, 'running') RETURNING id",
            params![Utc::now().naive_utc()],
            |r| r.get(0),
        )?;
        Ok(id)
    }

    pub fn finish_run(
        &self, run_id: i64, sources: usize, records: usize, error: Option<&str>,
    ) -> Result<()> {
        self.conn.execute(
            r#"UPDATE pipeline_runs SET
               finished_at = ?, status = ?,
               sources_processed = ?, records_loaded = ?, error_msg = ?
               WHERE id = ?"#,
            params![
                Utc::now().naive_utc(),
                if error.is_none() { "success" } else { "error" },
                sources as i64, records as i64, error, run_id,
            ],
        )?;
        Ok(())
    }

    /// Most recent run: (id, status, records_loaded).
    pub fn last_run(&self) -> Result<Option<(i64, String, i64)>> {
        let mut s = self.conn.prepare(
            "SELECT id, status, records_loaded FROM pipeline_runs ORDER BY id DESC LIMIT 1",
        )?;
        let mut rows = s.query_map([], |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)))?;
        Ok(rows.next().transpose()?)
    }
}
