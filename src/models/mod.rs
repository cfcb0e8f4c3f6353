use crate::error::JobTrendError;
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

// ── Source ────────────────────────────────────────────────────────────────────

/// Listing site a batch of records was collected from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Source {
    LinkedIn,
    Indeed,
    Rozee,
}

impl Source {
    pub const ALL: [Source; 3] = [Source::LinkedIn, Source::Indeed, Source::Rozee];

    pub fn as_str(self) -> &'static str {
        match self {
            Source::LinkedIn => "LinkedIn",
            Source::Indeed => "Indeed",
            Source::Rozee => "Rozee",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Source {
    type Err = JobTrendError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "linkedin" => Ok(Source::LinkedIn),
            "indeed" => Ok(Source::Indeed),
            "rozee" | "rozee.pk" => Ok(Source::Rozee),
            _ => Err(JobTrendError::UnknownSource(s.to_string())),
        }
    }
}

impl Serialize for Source {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Source {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ── Canonical fields ──────────────────────────────────────────────────────────

/// The six columns of the canonical schema, in persisted column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    JobTitle,
    CompanyName,
    Location,
    Skills,
    PostingDate,
    Source,
}

impl Field {
    pub const ALL: [Field; 6] = [
        Field::JobTitle,
        Field::CompanyName,
        Field::Location,
        Field::Skills,
        Field::PostingDate,
        Field::Source,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Field::JobTitle => "job_title",
            Field::CompanyName => "company_name",
            Field::Location => "location",
            Field::Skills => "skills",
            Field::PostingDate => "posting_date",
            Field::Source => "source",
        }
    }

    pub fn header() -> Vec<&'static str> {
        Field::ALL.iter().map(|f| f.as_str()).collect()
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Field {
    type Err = JobTrendError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Field::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| JobTrendError::InvalidField(s.to_string()))
    }
}

// ── Posting date ──────────────────────────────────────────────────────────────

/// A posting date, or the explicit marker for text that could not be read
/// as a calendar date. Persisted as `YYYY-MM-DD`, unknown as an empty cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PostingDate {
    Known(NaiveDate),
    #[default]
    Unknown,
}

impl PostingDate {
    pub const ISO_FORMAT: &'static str = "%Y-%m-%d";

    pub fn date(self) -> Option<NaiveDate> {
        match self {
            PostingDate::Known(d) => Some(d),
            PostingDate::Unknown => None,
        }
    }

    /// Text form used in the persisted file: ISO date or empty.
    pub fn to_text(self) -> String {
        match self {
            PostingDate::Known(d) => d.format(Self::ISO_FORMAT).to_string(),
            PostingDate::Unknown => String::new(),
        }
    }
}

impl From<Option<NaiveDate>> for PostingDate {
    fn from(d: Option<NaiveDate>) -> Self {
        d.map_or(PostingDate::Unknown, PostingDate::Known)
    }
}

impl fmt::Display for PostingDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PostingDate::Known(d) => write!(f, "{}", d.format(Self::ISO_FORMAT)),
            PostingDate::Unknown => f.write_str("unknown"),
        }
    }
}

impl Serialize for PostingDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_text())
    }
}

impl<'de> Deserialize<'de> for PostingDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        let s = s.trim();
        if s.is_empty() {
            return Ok(PostingDate::Unknown);
        }
        NaiveDate::parse_from_str(s, Self::ISO_FORMAT)
            .map(PostingDate::Known)
            .map_err(|e| serde::de::Error::custom(format!("posting_date '{}': {}", s, e)))
    }
}

// ── Raw record ────────────────────────────────────────────────────────────────

/// Unprocessed field/value pairs for one scraped listing, in the order the
/// collaborator produced them. Field names are whatever the source used.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRecord {
    fields: Vec<(String, String)>,
}

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.push((name.into(), value.into()));
    }

    /// First value stored under exactly `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RawRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

// ── Canonical job record ──────────────────────────────────────────────────────

/// One normalized job listing. Field order matches the persisted columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRecord {
    pub job_title: String,
    pub company_name: String,
    pub location: String,
    pub skills: String,
    pub posting_date: PostingDate,
    pub source: Source,
}

impl JobRecord {
    /// All-empty record carrying only its source tag.
    pub fn empty(source: Source) -> Self {
        Self {
            job_title: String::new(),
            company_name: String::new(),
            location: String::new(),
            skills: String::new(),
            posting_date: PostingDate::Unknown,
            source,
        }
    }

    /// Text value of a canonical field. Unknown dates read as "".
    pub fn value(&self, field: Field) -> Cow<'_, str> {
        match field {
            Field::JobTitle => Cow::Borrowed(&self.job_title),
            Field::CompanyName => Cow::Borrowed(&self.company_name),
            Field::Location => Cow::Borrowed(&self.location),
            Field::Skills => Cow::Borrowed(&self.skills),
            Field::PostingDate => Cow::Owned(self.posting_date.to_text()),
            Field::Source => Cow::Borrowed(self.source.as_str()),
        }
    }

    /// Re-express this record as raw input keyed by canonical names.
    pub fn to_raw(&self) -> RawRecord {
        Field::ALL
            .into_iter()
            .map(|f| (f.as_str(), self.value(f).into_owned()))
            .collect()
    }
}

// ── Dataset ───────────────────────────────────────────────────────────────────

/// All records of one pipeline run, in batch concatenation order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dataset {
    records: Vec<JobRecord>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: Vec<JobRecord>) -> Self {
        Self { records }
    }

    /// Append a normalized batch after everything already present.
    pub fn append_batch(&mut self, batch: Vec<JobRecord>) {
        self.records.extend(batch);
    }

    pub fn records(&self) -> &[JobRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, JobRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Record count per source, in `Source::ALL` order, zero counts omitted.
    pub fn count_by_source(&self) -> Vec<(Source, usize)> {
        Source::ALL
            .into_iter()
            .map(|s| (s, self.records.iter().filter(|r| r.source == s).count()))
            .filter(|(_, n)| *n > 0)
            .collect()
    }
}

impl FromIterator<JobRecord> for Dataset {
    fn from_iter<I: IntoIterator<Item = JobRecord>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Dataset {
    type Item = &'a JobRecord;
    type IntoIter = std::slice::Iter<'a, JobRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_parse_is_case_insensitive() {
        assert_eq!("linkedin".parse::<Source>().unwrap(), Source::LinkedIn);
        assert_eq!(" INDEED ".parse::<Source>().unwrap(), Source::Indeed);
        assert_eq!("Rozee".parse::<Source>().unwrap(), Source::Rozee);
        assert!(matches!(
            "Monster".parse::<Source>(),
            Err(JobTrendError::UnknownSource(_))
        ));
    }

    #[test]
    fn test_field_parse_rejects_non_canonical_names() {
        assert_eq!("job_title".parse::<Field>().unwrap(), Field::JobTitle);
        assert_eq!("posting_date".parse::<Field>().unwrap(), Field::PostingDate);
        assert!(matches!(
            "salary".parse::<Field>(),
            Err(JobTrendError::InvalidField(name)) if name == "salary"
        ));
        // Aliases are a normalizer concern, not a view concern.
        assert!("title".parse::<Field>().is_err());
    }

    #[test]
    fn test_record_to_raw_uses_canonical_names() {
        let rec = JobRecord {
            job_title: "Engineer".into(),
            posting_date: PostingDate::Known(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()),
            ..JobRecord::empty(Source::Indeed)
        };
        let raw = rec.to_raw();
        assert_eq!(raw.len(), 6);
        assert_eq!(raw.get("job_title"), Some("Engineer"));
        assert_eq!(raw.get("company_name"), Some(""));
        assert_eq!(raw.get("posting_date"), Some("2024-03-01"));
        assert_eq!(raw.get("source"), Some("Indeed"));
    }

    #[test]
    fn test_dataset_counts_by_source() {
        let mut ds = Dataset::new();
        ds.append_batch(vec![JobRecord::empty(Source::Rozee)]);
        ds.append_batch(vec![
            JobRecord::empty(Source::LinkedIn),
            JobRecord::empty(Source::LinkedIn),
        ]);
        assert_eq!(
            ds.count_by_source(),
            vec![(Source::LinkedIn, 2), (Source::Rozee, 1)]
        );
        // insertion order is batch order, not source order
        assert_eq!(ds.records()[0].source, Source::Rozee);
    }
}
