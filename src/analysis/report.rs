use super::Aggregator;
use crate::error::Result;
use crate::models::{Field, Source};
use crate::utils::{bar, fmt_count};
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt::Write as _;

const BAR_WIDTH: usize = 30;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabelCount {
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatePoint {
    pub date: NaiveDate,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceCount {
    pub source: Source,
    pub count: usize,
}

/// Dashboard data: plain label/count and date/count series, nothing rendered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub total_records: usize,
    pub by_source: Vec<SourceCount>,
    pub top_titles: Vec<LabelCount>,
    pub top_locations: Vec<LabelCount>,
    pub skills: Vec<LabelCount>,
    pub timeline: Vec<DatePoint>,
}

fn labelled(pairs: Vec<(String, usize)>) -> Vec<LabelCount> {
    pairs
        .into_iter()
        .map(|(label, count)| LabelCount { label, count })
        .collect()
}

impl Report {
    pub fn build<S: AsRef<str>>(agg: &Aggregator, top_n: usize, vocabulary: &[S]) -> Self {
        let dataset = agg.dataset();
        Self {
            total_records: dataset.len(),
            by_source: dataset
                .count_by_source()
                .into_iter()
                .map(|(source, count)| SourceCount { source, count })
                .collect(),
            top_titles: labelled(agg.rank(Field::JobTitle, top_n)),
            top_locations: labelled(agg.rank(Field::Location, top_n)),
            skills: labelled(agg.keyword_tally(vocabulary).sorted_desc()),
            timeline: agg
                .timeline()
                .into_iter()
                .map(|(date, count)| DatePoint { date, count })
                .collect(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Plain-text summary with proportional bars.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Job postings: {}", fmt_count(self.total_records));
        for s in &self.by_source {
            let _ = writeln!(out, "  {:<10} {}", s.source.as_str(), fmt_count(s.count));
        }

        section(&mut out, "Top job titles", &self.top_titles);
        section(&mut out, "Top hiring cities", &self.top_locations);
        section(&mut out, "Most in-demand skills", &self.skills);

        let _ = writeln!(out, "\nPostings over time");
        if self.timeline.is_empty() {
            let _ = writeln!(out, "  (no dated postings)");
        }
        let max = self.timeline.iter().map(|p| p.count).max().unwrap_or(0);
        for p in &self.timeline {
            let _ = writeln!(
                out,
                "  {}  {:>6}  {}",
                p.date,
                fmt_count(p.count),
                bar(p.count, max, BAR_WIDTH)
            );
        }
        out
    }
}

fn section(out: &mut String, title: &str, rows: &[LabelCount]) {
    let _ = writeln!(out, "\n{}", title);
    if rows.is_empty() {
        let _ = writeln!(out, "  (none)");
        return;
    }
    let width = rows.iter().map(|r| r.label.chars().count()).max().unwrap_or(0);
    let max = rows.iter().map(|r| r.count).max().unwrap_or(0);
    for r in rows {
        let _ = writeln!(
            out,
            "  {:<width$}  {:>6}  {}",
            r.label,
            fmt_count(r.count),
            bar(r.count, max, BAR_WIDTH),
            width = width
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{JobRecord, PostingDate};

    fn job(title: &str, city: &str, skills: &str, date: &str, source: Source) -> JobRecord {
        JobRecord {
            job_title: title.into(),
            company_name: String::new(),
            location: city.into(),
            skills: skills.into(),
            posting_date: NaiveDate::parse_from_str(date, "%Y-%m-%d")
                .map(PostingDate::Known)
                .unwrap_or(PostingDate::Unknown),
            source,
        }
    }

    #[test]
    fn test_build_collects_every_view() {
        let agg = Aggregator::from_batches(vec![
            vec![
                job("Engineer", "Karachi", "python sql", "2024-01-01", Source::Rozee),
                job("Engineer", "Lahore", "Excel", "", Source::Rozee),
            ],
            vec![job("Analyst", "Karachi", "SQL", "2024-01-01", Source::Indeed)],
        ]);
        let report = Report::build(&agg, 5, &["Python", "SQL", "Excel", "AWS"]);

        assert_eq!(report.total_records, 3);
        assert_eq!(
            report.by_source,
            vec![
                SourceCount { source: Source::Indeed, count: 1 },
                SourceCount { source: Source::Rozee, count: 2 },
            ]
        );
        assert_eq!(report.top_titles[0], LabelCount { label: "Engineer".into(), count: 2 });
        assert_eq!(report.top_locations[0], LabelCount { label: "Karachi".into(), count: 2 });
        assert_eq!(
            report.skills,
            vec![
                LabelCount { label: "SQL".into(), count: 2 },
                LabelCount { label: "Python".into(), count: 1 },
                LabelCount { label: "Excel".into(), count: 1 },
            ]
        );
        assert_eq!(report.timeline.len(), 1);
        assert_eq!(report.timeline[0].count, 2);
    }

    #[test]
    fn test_json_shape() {
        let agg = Aggregator::from_batches(vec![vec![job("Clerk", "", "", "2024-02-03", Source::LinkedIn)]]);
        let json = Report::build(&agg, 5, &["Python"]).to_json().unwrap();
        let v: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(v["total_records"], 1);
        assert_eq!(v["by_source"][0]["source"], "LinkedIn");
        assert_eq!(v["top_titles"][0]["label"], "Clerk");
        assert_eq!(v["timeline"][0]["date"], "2024-02-03");
        assert_eq!(v["skills"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn test_render_text_on_empty_dataset() {
        let agg = Aggregator::from_batches(Vec::<Vec<JobRecord>>::new());
        let text = Report::build(&agg, 5, &["Python"]).render_text();
        assert!(text.starts_with("Job postings: 0"));
        assert!(text.contains("(no dated postings)"));
    }
}
