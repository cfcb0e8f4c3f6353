//! Selector-driven extraction of raw records from a saved listing page.
//!
//! Nothing here knows any site's layout: the card selector and the per-field
//! fallback selectors all come from configuration.

use crate::config::SelectorConfig;
use crate::error::{JobTrendError, Result};
use crate::models::RawRecord;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

/// Compiled form of a `SelectorConfig`.
#[derive(Debug)]
pub struct SelectorSet {
    card: Selector,
    fields: Vec<(String, Vec<Selector>)>,
}

fn compile(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| JobTrendError::InvalidSelector {
        selector: selector.to_string(),
        reason: format!("{:?}", e),
    })
}

impl SelectorSet {
    pub fn compile(config: &SelectorConfig) -> Result<Self> {
        let card = compile(&config.card)?;
        let fields = config
            .fields
            .iter()
            .map(|f| {
                let selectors = f
                    .selectors
                    .iter()
                    .map(|s| compile(s))
                    .collect::<Result<Vec<_>>>()?;
                Ok((f.name.clone(), selectors))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { card, fields })
    }
}

/// Whitespace-normalized text of the first element `selector` matches.
fn first_text(card: &ElementRef<'_>, selector: &Selector) -> Option<String> {
    let el = card.select(selector).next()?;
    let text = el.text().collect::<Vec<_>>().join(" ");
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if text.is_empty() { None } else { Some(text) }
}

/// One raw record per card that yields any text. Each field takes the first
/// of its selectors that produces non-empty text; fields with no hit are
/// left out of the record.
pub fn extract_records(html: &str, selectors: &SelectorSet) -> Vec<RawRecord> {
    let doc = Html::parse_document(html);
    let mut records = Vec::new();
    let mut skipped = 0usize;

    for card in doc.select(&selectors.card) {
        let mut record = RawRecord::new();
        for (name, candidates) in &selectors.fields {
            if let Some(text) = candidates.iter().find_map(|sel| first_text(&card, sel)) {
                record.insert(name.clone(), text);
            }
        }

        if record.is_empty() {
            skipped += 1;
            continue;
        }
        records.push(record);
    }

    debug!("Extracted {} cards ({} empty cards skipped)", records.len(), skipped);
    records
}
