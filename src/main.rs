mod analysis;
mod config;
mod error;
mod loader;
mod models;
mod normalizer;
mod pipeline;
mod sources;
mod storage;
mod utils;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::analysis::{Aggregator, Report};
use crate::config::{AppConfig, SourceConfig, SourceKind};
use crate::loader::{discover_csv_files, load_raw_csv, source_from_filename};
use crate::models::{Dataset, Source};
use crate::pipeline::Pipeline;
use crate::storage::{load_dataset, write_dataset, Repository};

#[derive(Parser)]
#[command(name = "jobtrend", about = "Job posting normalizer and trend report", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Normalize every configured source, write the combined dataset, print the report
    Run {
        /// Use every CSV in this directory instead of the configured sources;
        /// the site is taken from each filename (e.g. linkedin_jobs.csv)
        #[arg(short, long)]
        dir: Option<PathBuf>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Normalize one raw CSV export into the canonical tabular format
    Normalize {
        /// LinkedIn, Indeed or Rozee
        #[arg(short, long)]
        source: Source,

        #[arg(short, long)]
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the dashboard report for a saved dataset
    Report {
        /// Dataset file (default: storage.dataset_path)
        #[arg(short, long)]
        dataset: Option<PathBuf>,

        /// Read the dataset from DuckDB instead of the file
        #[arg(long)]
        from_db: bool,

        #[arg(short = 'n', long)]
        top: Option<usize>,

        #[arg(long)]
        json: bool,
    },

    /// Rank the values of one canonical field in a saved dataset
    Rank {
        /// job_title, company_name, location, skills, posting_date or source
        field: String,

        #[arg(short = 'n', long, default_value_t = 10)]
        top: usize,

        #[arg(short, long)]
        dataset: Option<PathBuf>,
    },

    /// Count postings whose field mentions each term (case-insensitive)
    Tally {
        /// Canonical field to search, e.g. skills or job_title
        #[arg(short, long, default_value = "skills")]
        field: String,

        /// Terms to count (default: analysis.skill_keywords)
        terms: Vec<String>,

        #[arg(short, long)]
        dataset: Option<PathBuf>,
    },

    /// Show the effective field-name aliases for a source
    Aliases {
        #[arg(short, long)]
        source: Source,
    },

    /// Show database statistics
    Stats,

    /// Apply schema migrations without loading data
    Migrate,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "jobtrend=info,warn",
        1 => "jobtrend=debug,info",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(fmt::layer().compact().with_target(false).with_writer(std::io::stderr))
        .with(EnvFilter::new(filter))
        .init();

    let mut config = AppConfig::load()?;

    match cli.command {
        Command::Run { dir, json } => {
            let _t = utils::Timer::start("Pipeline run");
            if let Some(dir) = dir {
                config.sources = sources_in_dir(&dir)?;
                info!("Found {} source files in {:?}", config.sources.len(), dir);
            }
            let analysis = config.analysis.clone();
            let (agg, _stats) = Pipeline::new(config).run()?;
            print_report(&agg, analysis.top_n, &analysis.skill_keywords, json)?;
        }

        Command::Normalize { source, input, output } => {
            let raw = load_raw_csv(&input)?;
            let batch = Pipeline::new(config).normalizer()?.normalize_batch(&raw, source);
            let dataset = Dataset::from_records(batch.records);
            match output {
                Some(path) => storage::save_dataset(&path, &dataset)?,
                None => write_dataset(std::io::stdout().lock(), &dataset)?,
            }
        }

        Command::Report { dataset, from_db, top, json } => {
            let ds = if from_db {
                Repository::open(&config.storage.db_path)?.load_dataset()?
            } else {
                load_dataset(dataset.as_ref().unwrap_or(&config.storage.dataset_path))?
            };
            let top = top.unwrap_or(config.analysis.top_n);
            print_report(&Aggregator::new(ds), top, &config.analysis.skill_keywords, json)?;
        }

        Command::Rank { field, top, dataset } => {
            let ds = load_dataset(dataset.as_ref().unwrap_or(&config.storage.dataset_path))?;
            let ranked = Aggregator::new(ds).rank_by_field(&field, top)?;
            if ranked.is_empty() {
                println!("No values for {}.", field);
            }
            for (value, count) in ranked {
                println!("{:>6}  {}", utils::fmt_count(count), value);
            }
        }

        Command::Tally { field, terms, dataset } => {
            let ds = load_dataset(dataset.as_ref().unwrap_or(&config.storage.dataset_path))?;
            let terms = if terms.is_empty() { config.analysis.skill_keywords } else { terms };
            let tally = Aggregator::new(ds).tally_field(&field, &terms)?;
            if tally.is_empty() {
                println!("No matches in {}.", field);
            }
            for (term, count) in tally.sorted_desc() {
                println!("{:>6}  {}", utils::fmt_count(count), term);
            }
        }

        Command::Aliases { source } => {
            let normalizer = Pipeline::new(config).normalizer()?;
            println!("Aliases for {}:", source);
            for (raw, field) in normalizer.aliases().entries(source) {
                println!("  {:<20} → {}", raw, field);
            }
        }

        Command::Stats => {
            let repo = Repository::open(&config.storage.db_path)?;
            let records = repo.record_count()?;
            let (min, max) = repo.date_range()?;
            println!("─────────────────────────────────");
            println!("  jobtrend database stats");
            println!("─────────────────────────────────");
            println!("  Records  : {}", utils::fmt_count(records.max(0) as usize));
            for (source, n) in repo.count_by_source()? {
                println!("    {:<8}: {}", source, utils::fmt_count(n.max(0) as usize));
            }
            println!("  From     : {}", min.map(|d| d.to_string()).unwrap_or_else(|| "-".into()));
            println!("  To       : {}", max.map(|d| d.to_string()).unwrap_or_else(|| "-".into()));
            if let Some((id, status, loaded)) = repo.last_run()? {
                println!("  Last run : #{} {} ({} records)", id, status, loaded);
            }
            println!("─────────────────────────────────");
        }

        Command::Migrate => {
            Repository::open(&config.storage.db_path)?.run_migrations()?;
            println!("Migrations applied.");
        }
    }

    Ok(())
}

/// One CSV source per file whose name identifies the site.
fn sources_in_dir(dir: &std::path::Path) -> Result<Vec<SourceConfig>> {
    let mut sources = Vec::new();
    for path in discover_csv_files(dir)? {
        let Some(source) = source_from_filename(&path) else {
            warn!("Cannot tell the site of {:?} from its name; skipping", path);
            continue;
        };
        sources.push(SourceConfig {
            name: source.to_string(),
            kind: SourceKind::Csv,
            path,
            selectors: None,
        });
    }
    Ok(sources)
}

fn print_report(agg: &Aggregator, top_n: usize, vocabulary: &[String], json: bool) -> Result<()> {
    let report = Report::build(agg, top_n, vocabulary);
    if json {
        println!("{}", report.to_json()?);
    } else {
        print!("{}", report.render_text());
    }
    Ok(())
}
