//! Field-name reconciliation table.
//!
//! Two levels: aliases shared by every source, and aliases that only apply to
//! one source. Per-source entries win over common ones. Keys are compared in
//! canonical form (see [`canonical_key`]), so `"Date Posted"`, `"date posted"`
//! and `"date_posted"` all hit the same entry.

use crate::error::{JobTrendError, Result};
use crate::models::{Field, Source};
use std::collections::{BTreeMap, HashMap};

const COMMON_ALIASES: &[(&str, Field)] = &[
    ("job_title", Field::JobTitle),
    ("title", Field::JobTitle),
    ("job title", Field::JobTitle),
    ("company_name", Field::CompanyName),
    ("company", Field::CompanyName),
    ("location", Field::Location),
    ("city", Field::Location),
    ("skills", Field::Skills),
    ("posting_date", Field::PostingDate),
    ("date posted", Field::PostingDate),
    ("date_posted", Field::PostingDate),
    ("scrapped_date", Field::PostingDate),
    ("scraped_date", Field::PostingDate),
    ("date", Field::PostingDate),
];

const LINKEDIN_ALIASES: &[(&str, Field)] = &[("description", Field::Skills)];

const INDEED_ALIASES: &[(&str, Field)] = &[
    ("details", Field::Skills),
    ("summary", Field::Skills),
    ("job_snippet", Field::Skills),
];

const ROZEE_ALIASES: &[(&str, Field)] = &[
    ("summary", Field::Skills),
    ("description", Field::Skills),
];

/// Section name in `[aliases.<name>]` config tables that applies to all sources.
pub const COMMON_SECTION: &str = "common";

/// Lower-case, trim, and collapse runs of spaces, hyphens and underscores
/// into a single `_`.
pub fn canonical_key(name: &str) -> String {
    let mut key = String::with_capacity(name.len());
    let mut pending_sep = false;
    for c in name.trim().chars() {
        if c.is_whitespace() || c == '_' || c == '-' {
            pending_sep = true;
            continue;
        }
        if pending_sep && !key.is_empty() {
            key.push('_');
        }
        pending_sep = false;
        key.extend(c.to_lowercase());
    }
    key
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasTable {
    common: HashMap<String, Field>,
    per_source: HashMap<Source, HashMap<String, Field>>,
}

impl AliasTable {
    /// A table with no entries at all.
    pub fn empty() -> Self {
        Self {
            common: HashMap::new(),
            per_source: HashMap::new(),
        }
    }

    /// The built-in aliases for LinkedIn, Indeed and Rozee exports.
    pub fn builtin() -> Self {
        let mut table = Self::empty();
        for (raw, field) in COMMON_ALIASES {
            table.common.insert(canonical_key(raw), *field);
        }
        for (source, entries) in [
            (Source::LinkedIn, LINKEDIN_ALIASES),
            (Source::Indeed, INDEED_ALIASES),
            (Source::Rozee, ROZEE_ALIASES),
        ] {
            let map = table.per_source.entry(source).or_default();
            for (raw, field) in entries {
                map.insert(canonical_key(raw), *field);
            }
        }
        table
    }

    pub fn add_common(&mut self, raw: &str, field: Field) -> Result<()> {
        let key = checked_key(raw, field)?;
        self.common.insert(key, field);
        Ok(())
    }

    pub fn add(&mut self, source: Source, raw: &str, field: Field) -> Result<()> {
        let key = checked_key(raw, field)?;
        self.per_source.entry(source).or_default().insert(key, field);
        Ok(())
    }

    /// Merge `[aliases.<section>]` tables: section is `common` or a source
    /// name, each entry maps a raw field name to a canonical field name.
    pub fn extend_from_config(
        &mut self,
        sections: &HashMap<String, HashMap<String, String>>,
    ) -> Result<()> {
        for (section, entries) in sections {
            let source = if section.eq_ignore_ascii_case(COMMON_SECTION) {
                None
            } else {
                Some(section.parse::<Source>()?)
            };
            for (raw, target) in entries {
                let field = target.trim().parse::<Field>().map_err(|_| {
                    JobTrendError::Config(format!(
                        "alias '{}' in [aliases.{}] targets unknown field '{}'",
                        raw, section, target
                    ))
                })?;
                match source {
                    Some(s) => self.add(s, raw, field)?,
                    None => self.add_common(raw, field)?,
                }
            }
        }
        Ok(())
    }

    pub fn resolve(&self, source: Source, raw_name: &str) -> Option<Field> {
        let key = canonical_key(raw_name);
        self.per_source
            .get(&source)
            .and_then(|m| m.get(&key))
            .or_else(|| self.common.get(&key))
            .copied()
    }

    /// Effective mapping for one source, sorted by key.
    pub fn entries(&self, source: Source) -> BTreeMap<String, Field> {
        let mut out: BTreeMap<String, Field> = self
            .common
            .iter()
            .map(|(k, f)| (k.clone(), *f))
            .collect();
        if let Some(specific) = self.per_source.get(&source) {
            out.extend(specific.iter().map(|(k, f)| (k.clone(), *f)));
        }
        out
    }
}

impl Default for AliasTable {
    fn default() -> Self {
        Self::builtin()
    }
}

fn checked_key(raw: &str, field: Field) -> Result<String> {
    if field == Field::Source {
        return Err(JobTrendError::Config(format!(
            "alias '{}' cannot target 'source'; it is always set from the batch",
            raw
        )));
    }
    let key = canonical_key(raw);
    if key.is_empty() {
        return Err(JobTrendError::Config("alias with empty field name".into()));
    }
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_key() {
        assert_eq!(canonical_key("Date Posted"), "date_posted");
        assert_eq!(canonical_key("  date__posted "), "date_posted");
        assert_eq!(canonical_key("Job-Title"), "job_title");
        assert_eq!(canonical_key("_skills_"), "skills");
        assert_eq!(canonical_key(""), "");
    }

    #[test]
    fn test_builtin_resolves_common_spellings() {
        let t = AliasTable::builtin();
        assert_eq!(t.resolve(Source::Rozee, "Title"), Some(Field::JobTitle));
        assert_eq!(t.resolve(Source::Rozee, "Company"), Some(Field::CompanyName));
        assert_eq!(t.resolve(Source::Rozee, "Date Posted"), Some(Field::PostingDate));
        assert_eq!(t.resolve(Source::LinkedIn, "scrapped_date"), Some(Field::PostingDate));
        assert_eq!(t.resolve(Source::Indeed, "job_title"), Some(Field::JobTitle));
        assert_eq!(t.resolve(Source::Indeed, "salary"), None);
    }

    #[test]
    fn test_per_source_aliases_stay_scoped() {
        let t = AliasTable::builtin();
        assert_eq!(t.resolve(Source::Indeed, "details"), Some(Field::Skills));
        assert_eq!(t.resolve(Source::LinkedIn, "details"), None);
    }

    #[test]
    fn test_source_is_never_an_alias_target() {
        let t = AliasTable::builtin();
        assert_eq!(t.resolve(Source::LinkedIn, "source"), None);

        let mut t = AliasTable::empty();
        assert!(matches!(
            t.add_common("site", Field::Source),
            Err(JobTrendError::Config(_))
        ));
    }

    #[test]
    fn test_extend_from_config() {
        let mut sections = HashMap::new();
        sections.insert(
            "indeed".to_string(),
            HashMap::from([("Job Snippet Text".to_string(), "skills".to_string())]),
        );
        sections.insert(
            "common".to_string(),
            HashMap::from([("employer".to_string(), "company_name".to_string())]),
        );

        let mut t = AliasTable::builtin();
        t.extend_from_config(&sections).unwrap();
        assert_eq!(t.resolve(Source::Indeed, "job snippet text"), Some(Field::Skills));
        assert_eq!(t.resolve(Source::Rozee, "Employer"), Some(Field::CompanyName));
    }

    #[test]
    fn test_extend_from_config_rejects_bad_targets() {
        let bad_field = HashMap::from([(
            "common".to_string(),
            HashMap::from([("pay".to_string(), "salary".to_string())]),
        )]);
        assert!(AliasTable::builtin().extend_from_config(&bad_field).is_err());

        let bad_source = HashMap::from([(
            "monster".to_string(),
            HashMap::from([("pay".to_string(), "skills".to_string())]),
        )]);
        assert!(matches!(
            AliasTable::builtin().extend_from_config(&bad_source),
            Err(JobTrendError::UnknownSource(_))
        ));
    }

    #[test]
    fn test_entries_overlay_source_on_common() {
        let t = AliasTable::builtin();
        let indeed = t.entries(Source::Indeed);
        assert_eq!(indeed.get("summary"), Some(&Field::Skills));
        assert_eq!(indeed.get("title"), Some(&Field::JobTitle));
        assert!(!t.entries(Source::LinkedIn).contains_key("summary"));
    }
}
