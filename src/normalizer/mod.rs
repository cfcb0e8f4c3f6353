//! Raw scraped rows → canonical `JobRecord`s.
//!
//! Normalization is per record and stateless: output order and length always
//! match the input batch. Unrecognized field names are dropped, missing
//! fields become "", unreadable dates become `PostingDate::Unknown`, and the
//! source tag always comes from the caller.

pub mod aliases;
pub mod cleaner;

use crate::models::{Field, JobRecord, PostingDate, RawRecord, Source};
use chrono::NaiveDate;
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, info};

pub use self::aliases::AliasTable;
use self::cleaner::{clean_text, parse_posting_date};

#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    aliases: AliasTable,
    reference_date: Option<NaiveDate>,
}

/// Output of one batch plus what had to be recovered along the way.
#[derive(Debug, Clone)]
pub struct NormalizedBatch {
    pub source: Source,
    pub records: Vec<JobRecord>,
    pub stats: NormalizeStats,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizeStats {
    pub records: usize,
    /// Records where no field name matched any alias.
    pub unreconciled: usize,
    /// Non-empty date cells that could not be read as a date.
    pub unparsed_dates: usize,
    /// Raw field names that had no alias, across the batch.
    pub dropped_fields: BTreeSet<String>,
}

struct RecordOutcome {
    reconciled: bool,
    unparsed_date: Option<String>,
    dropped: Vec<String>,
}

impl Normalizer {
    pub fn new(aliases: AliasTable) -> Self {
        Self {
            aliases,
            reference_date: None,
        }
    }

    /// Resolve "3 days ago"-style dates relative to `date`.
    pub fn with_reference_date(mut self, date: NaiveDate) -> Self {
        self.reference_date = Some(date);
        self
    }

    pub fn aliases(&self) -> &AliasTable {
        &self.aliases
    }

    pub fn normalize(&self, raw: &[RawRecord], source: Source) -> Vec<JobRecord> {
        raw.iter()
            .map(|r| self.normalize_record(r, source).0)
            .collect()
    }

    pub fn normalize_batch(&self, raw: &[RawRecord], source: Source) -> NormalizedBatch {
        let mut stats = NormalizeStats {
            records: raw.len(),
            ..Default::default()
        };
        let mut records = Vec::with_capacity(raw.len());

        for (i, r) in raw.iter().enumerate() {
            let (record, outcome) = self.normalize_record(r, source);
            if !outcome.reconciled {
                debug!("{} row {}: no recognizable fields", source, i + 1);
                stats.unreconciled += 1;
            }
            if let Some(text) = &outcome.unparsed_date {
                debug!("{} row {}: unreadable date {:?}", source, i + 1, text);
                stats.unparsed_dates += 1;
            }
            stats.dropped_fields.extend(outcome.dropped);
            records.push(record);
        }

        info!(
            "{}: normalized {} records ({} unreconciled, {} unreadable dates)",
            source, stats.records, stats.unreconciled, stats.unparsed_dates
        );
        if !stats.dropped_fields.is_empty() {
            debug!("{}: dropped fields {:?}", source, stats.dropped_fields);
        }

        NormalizedBatch {
            source,
            records,
            stats,
        }
    }

    fn normalize_record(&self, raw: &RawRecord, source: Source) -> (JobRecord, RecordOutcome) {
        let mut values: HashMap<Field, String> = HashMap::new();
        let mut outcome = RecordOutcome {
            reconciled: false,
            unparsed_date: None,
            dropped: Vec::new(),
        };

        for (name, value) in raw.iter() {
            let Some(field) = self.aliases.resolve(source, name) else {
                outcome.dropped.push(name.to_string());
                continue;
            };
            outcome.reconciled = true;

            // First non-empty value wins when several names alias one field.
            let cleaned = clean_text(value);
            if !cleaned.is_empty() {
                values.entry(field).or_insert(cleaned);
            }
        }

        let posting_date = match values.remove(&Field::PostingDate) {
            Some(text) => {
                let date = parse_posting_date(&text, self.reference_date);
                if date == PostingDate::Unknown {
                    outcome.unparsed_date = Some(text);
                }
                date
            }
            None => PostingDate::Unknown,
        };

        let mut take = |f: Field| values.remove(&f).unwrap_or_default();
        let record = JobRecord {
            job_title: take(Field::JobTitle),
            company_name: take(Field::CompanyName),
            location: take(Field::Location),
            skills: take(Field::Skills),
            posting_date,
            source,
        };

        (record, outcome)
    }
}

/// Normalize with the built-in alias table and no reference date.
pub fn normalize(raw: &[RawRecord], source: Source) -> Vec<JobRecord> {
    Normalizer::default().normalize(raw, source)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn rozee_row(title: &str, date: &str) -> RawRecord {
        RawRecord::new()
            .with("Title", title)
            .with("Company", "Systems Ltd")
            .with("Location", "Lahore")
            .with("Date Posted", date)
            .with("Skills", "Python, SQL")
    }

    #[test]
    fn test_maps_aliases_onto_canonical_fields() {
        let out = normalize(&[rozee_row("Backend Developer", "2024-05-02")], Source::Rozee);
        assert_eq!(
            out,
            vec![JobRecord {
                job_title: "Backend Developer".into(),
                company_name: "Systems Ltd".into(),
                location: "Lahore".into(),
                skills: "Python, SQL".into(),
                posting_date: PostingDate::Known(ymd(2024, 5, 2)),
                source: Source::Rozee,
            }]
        );
    }

    #[test]
    fn test_output_length_and_order_match_input() {
        let raw = vec![
            rozee_row("A", "2024-01-01"),
            RawRecord::new(),
            rozee_row("C", "garbage"),
        ];
        let out = normalize(&raw, Source::Rozee);
        assert_eq!(out.len(), raw.len());
        assert_eq!(out[0].job_title, "A");
        assert_eq!(out[1], JobRecord::empty(Source::Rozee));
        assert_eq!(out[2].job_title, "C");
    }

    #[test]
    fn test_empty_batch_gives_empty_output() {
        assert!(normalize(&[], Source::Indeed).is_empty());
    }

    #[test]
    fn test_source_argument_overrides_raw_source_field() {
        let raw = RawRecord::new().with("title", "Analyst").with("source", "Indeed");
        let out = normalize(&[raw], Source::LinkedIn);
        assert_eq!(out[0].source, Source::LinkedIn);
    }

    #[test]
    fn test_unrecognized_record_still_yields_a_full_record() {
        let raw = RawRecord::new().with("salary", "100k").with("remote", "yes");
        let batch = Normalizer::default().normalize_batch(&[raw], Source::Indeed);
        assert_eq!(batch.source, Source::Indeed);
        assert_eq!(batch.records, vec![JobRecord::empty(Source::Indeed)]);
        assert_eq!(batch.stats.unreconciled, 1);
        assert_eq!(
            batch.stats.dropped_fields,
            BTreeSet::from(["remote".to_string(), "salary".to_string()])
        );
    }

    #[test]
    fn test_unparseable_date_becomes_unknown() {
        let batch = Normalizer::default()
            .normalize_batch(&[rozee_row("A", "sometime last week")], Source::Rozee);
        assert_eq!(batch.records[0].posting_date, PostingDate::Unknown);
        assert_eq!(batch.records[0].job_title, "A");
        assert_eq!(batch.stats.unparsed_dates, 1);
    }

    #[test]
    fn test_absent_and_empty_fields_collapse_to_the_same_marker() {
        // Deliberate: "field missing" and "field present but blank" are
        // indistinguishable after normalization.
        let absent = RawRecord::new().with("title", "Clerk");
        let blank = RawRecord::new()
            .with("title", "Clerk")
            .with("company", "")
            .with("location", "N/A")
            .with("date posted", "   ");
        let out = normalize(&[absent, blank], Source::Rozee);
        assert_eq!(out[0], out[1]);
        assert_eq!(out[1].company_name, "");
        assert_eq!(out[1].location, "");
        assert_eq!(out[1].posting_date, PostingDate::Unknown);
    }

    #[test]
    fn test_blank_date_is_not_counted_as_unparsed() {
        let batch = Normalizer::default()
            .normalize_batch(&[RawRecord::new().with("date_posted", "N/A")], Source::Rozee);
        assert_eq!(batch.stats.unparsed_dates, 0);
    }

    #[test]
    fn test_first_non_empty_alias_wins() {
        let raw = RawRecord::new()
            .with("title", "")
            .with("job_title", "Data Engineer")
            .with("Job Title", "Ignored");
        let out = normalize(&[raw], Source::LinkedIn);
        assert_eq!(out[0].job_title, "Data Engineer");
    }

    #[test]
    fn test_per_source_alias_for_description_text() {
        let raw = RawRecord::new()
            .with("title", "Python Developer")
            .with("details", "Django, PostgreSQL, AWS");
        assert_eq!(normalize(&[raw.clone()], Source::Indeed)[0].skills, "Django, PostgreSQL, AWS");
        assert_eq!(normalize(&[raw], Source::LinkedIn)[0].skills, "");
    }

    #[test]
    fn test_normalizing_canonical_records_is_idempotent() {
        let first = normalize(
            &[
                rozee_row("A", "2024-01-01"),
                rozee_row("B", "not a date"),
                RawRecord::new(),
            ],
            Source::Rozee,
        );
        let again: Vec<RawRecord> = first.iter().map(JobRecord::to_raw).collect();
        assert_eq!(normalize(&again, Source::Rozee), first);
    }

    #[test]
    fn test_reference_date_resolves_relative_dates() {
        let n = Normalizer::default().with_reference_date(ymd(2024, 6, 10));
        let raw = RawRecord::new().with("date posted", "Posted 2 days ago");
        assert_eq!(
            n.normalize(&[raw.clone()], Source::Indeed)[0].posting_date,
            PostingDate::Known(ymd(2024, 6, 8))
        );
        assert_eq!(
            normalize(&[raw], Source::Indeed)[0].posting_date,
            PostingDate::Unknown
        );
    }
}
