use crate::models::PostingDate;
use chrono::{DateTime, Days, Duration, NaiveDate, NaiveDateTime};

// ── Text ──────────────────────────────────────────────────────────────────────

/// Placeholder strings scrapers write when an element lookup fails.
const PLACEHOLDERS: &[&str] = &["n/a", "na", "-", "—", "none", "null", "nan"];

/// Trim, collapse internal whitespace, and map scraper placeholders to "".
/// "  Senior\n  Engineer " → "Senior Engineer" | "N/A" → ""
pub fn clean_text(s: &str) -> String {
    let collapsed = s.split_whitespace().collect::<Vec<_>>().join(" ");
    if PLACEHOLDERS.contains(&collapsed.to_lowercase().as_str()) {
        return String::new();
    }
    collapsed
}

// ── Dates ─────────────────────────────────────────────────────────────────────

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    // month-first, matching the US-centric listings
    "%m/%d/%Y",
    "%d %b %Y",
    "%d-%b-%Y",
    "%b %d, %Y",
    "%b %d %Y",
    // %b only takes abbreviations when parsing
    "%d %B %Y",
    "%d-%B-%Y",
    "%B %d, %Y",
    "%B %d %Y",
];

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S"];

/// Parse an absolute calendar date.
/// "2024-02-20" | "02/20/2024" | "20 Feb 2024" | "February 20, 2024" | RFC 3339
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }

    None
}

/// Parse listing-relative text against `today`.
/// "Just posted" → today | "Posted 3 days ago" → today - 3 | "30+ days ago" → today - 30
pub fn parse_relative_date(s: &str, today: NaiveDate) -> Option<NaiveDate> {
    let lowered = s.trim().to_lowercase();
    let text = lowered
        .trim_start_matches("posted")
        .trim_start_matches("active")
        .trim();

    match text {
        "today" | "just posted" | "just now" => return Some(today),
        "yesterday" => return today.checked_sub_days(Days::new(1)),
        _ => {}
    }

    let words: Vec<&str> = text.split_whitespace().collect();
    let [amount, unit, "ago"] = words.as_slice() else {
        return None;
    };
    let amount: i64 = amount.trim_end_matches('+').parse().ok()?;
    if amount < 0 {
        return None;
    }

    let days = match unit.trim_end_matches('s') {
        "second" | "minute" | "min" | "hour" | "hr" => 0,
        "day" => amount,
        "week" => amount.checked_mul(7)?,
        "month" => amount.checked_mul(30)?,
        _ => return None,
    };
    today.checked_sub_signed(Duration::try_days(days)?)
}

/// Resolve a raw date cell. Relative phrases only resolve when a reference
/// date is supplied; anything unreadable becomes `PostingDate::Unknown`.
pub fn parse_posting_date(s: &str, reference: Option<NaiveDate>) -> PostingDate {
    parse_date(s)
        .or_else(|| reference.and_then(|today| parse_relative_date(s, today)))
        .into()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
