use thiserror::Error;

/// Errors surfaced to callers. Reconciliation gaps and unparseable dates are
/// recovered inside the normalizer and never show up here.
#[derive(Debug, Error)]
pub enum JobTrendError {
    #[error("'{0}' is not a canonical field (expected one of job_title, company_name, location, skills, posting_date, source)")]
    InvalidField(String),

    #[error("unknown job source '{0}' (expected LinkedIn, Indeed or Rozee)")]
    UnknownSource(String),

    #[error("invalid CSS selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("dataset header mismatch: expected [{expected}], found [{found}]")]
    SchemaMismatch { expected: String, found: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, JobTrendError>;
