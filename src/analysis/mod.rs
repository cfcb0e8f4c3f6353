//! Read-only views over a combined `Dataset`.
//!
//! Every view is a pure function of the dataset. An empty dataset yields
//! empty results; asking for a field outside the canonical schema is an
//! `InvalidField` error.

pub mod report;

use crate::error::Result;
use crate::models::{Dataset, Field, JobRecord};
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};

pub use self::report::Report;

/// Skill vocabulary used by the dashboard when none is configured.
pub const DEFAULT_SKILL_KEYWORDS: &[&str] = &[
    "Python",
    "Java",
    "SQL",
    "Excel",
    "AWS",
    "JavaScript",
    "C++",
    "Power BI",
    "Pandas",
    "NumPy",
];

pub struct Aggregator {
    dataset: Dataset,
}

impl Aggregator {
    pub fn new(dataset: Dataset) -> Self {
        Self { dataset }
    }

    /// Concatenate normalized batches in the order given.
    pub fn from_batches<I>(batches: I) -> Self
    where
        I: IntoIterator<Item = Vec<JobRecord>>,
    {
        let mut dataset = Dataset::new();
        for batch in batches {
            dataset.append_batch(batch);
        }
        Self { dataset }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn into_dataset(self) -> Dataset {
        self.dataset
    }

    /// Most frequent values of `field`, highest count first, ties in order of
    /// first appearance. Blank values are not ranked.
    pub fn rank_by_field(&self, field: &str, top_n: usize) -> Result<Vec<(String, usize)>> {
        let field: Field = field.parse()?;
        Ok(self.rank(field, top_n))
    }

    pub fn rank(&self, field: Field, top_n: usize) -> Vec<(String, usize)> {
        let mut counts: Vec<(String, usize)> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for record in &self.dataset {
            let value = record.value(field);
            if value.is_empty() {
                continue;
            }
            match index.get(value.as_ref()) {
                Some(&i) => counts[i].1 += 1,
                None => {
                    index.insert(value.to_string(), counts.len());
                    counts.push((value.into_owned(), 1));
                }
            }
        }

        // stable: equal counts keep first-occurrence order
        counts.sort_by(|a, b| b.1.cmp(&a.1));
        counts.truncate(top_n);
        counts
    }

    /// For each term, how many records mention it in `skills`. Blank terms
    /// and terms no record mentions are left out, so an empty dataset gives an empty tally.
    ///
    /// Matching is a case-insensitive substring test, so "Java" also counts
    /// records that only mention "JavaScript".
    pub fn keyword_tally<S: AsRef<str>>(&self, vocabulary: &[S]) -> KeywordTally {
        self.tally(Field::Skills, vocabulary)
    }

    /// `keyword_tally` over an arbitrary canonical field.
    pub fn tally_field<S: AsRef<str>>(&self, field: &str, vocabulary: &[S]) -> Result<KeywordTally> {
        let field: Field = field.parse()?;
        Ok(self.tally(field, vocabulary))
    }

    fn tally<S: AsRef<str>>(&self, field: Field, vocabulary: &[S]) -> KeywordTally {
        let haystacks: Vec<String> = self
            .dataset
            .iter()
            .map(|r| r.value(field).to_lowercase())
            .collect();

        let counts = vocabulary
            .iter()
            .filter(|term| !term.as_ref().trim().is_empty())
            .map(|term| {
                let needle = term.as_ref().to_lowercase();
                let n = haystacks.iter().filter(|h| h.contains(&needle)).count();
                (term.as_ref().to_string(), n)
            })
            .filter(|(_, n)| *n > 0)
            .collect();

        KeywordTally { counts }
    }

    /// Postings per calendar date, ascending. Unknown dates are left out.
    pub fn timeline(&self) -> Vec<(NaiveDate, usize)> {
        let mut per_day: BTreeMap<NaiveDate, usize> = BTreeMap::new();
        for date in self.dataset.iter().filter_map(|r| r.posting_date.date()) {
            *per_day.entry(date).or_default() += 1;
        }
        per_day.into_iter().collect()
    }
}

/// Non-zero keyword counts in vocabulary order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordTally {
    counts: Vec<(String, usize)>,
}

impl KeywordTally {
    pub fn counts(&self) -> &[(String, usize)] {
        &self.counts
    }

    pub fn get(&self, term: &str) -> Option<usize> {
        self.counts.iter().find(|(t, _)| t == term).map(|(_, n)| *n)
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Chart order: highest count first, ties keep vocabulary order.
    pub fn sorted_desc(&self) -> Vec<(String, usize)> {
        let mut sorted = self.counts.clone();
        sorted.sort_by(|a, b| b.1.cmp(&a.1));
        sorted
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
