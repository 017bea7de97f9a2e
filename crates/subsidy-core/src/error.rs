//! Error types for the subsidy-core library.

use thiserror::Error;

/// Main error type for the subsidy library.
#[derive(Error, Debug)]
pub enum SubsidyError {
    /// The applicant record is incomplete or inconsistent.
    #[error("application error: {0}")]
    Application(#[from] ApplicationError),

    /// Field extraction error.
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// Document text could not be obtained.
    #[error("document source error: {0}")]
    Source(String),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors in the applicant-supplied record. These are fatal for a case.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApplicationError {
    /// Required field is missing or blank.
    #[error("missing required field: {0}")]
    MissingField(String),

    /// Field is present but not a recognizable date.
    #[error("invalid date in {field}: {value}")]
    InvalidDate { field: String, value: String },

    /// Postal code is not four digits.
    #[error("invalid postal code: {0}")]
    InvalidPostalCode(String),

    /// Validity window ends before it starts.
    #[error("validity window ends before it starts: {start} > {end}")]
    InvalidValidity { start: String, end: String },
}

/// Errors related to document field extraction.
///
/// `NotFound` and `Unreadable` are kept apart so that "document present but
/// unreadable" never looks like "document contradicts the applicant".
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    /// No label or marker for the field was located.
    #[error("{0} not found")]
    NotFound(String),

    /// The field was located but its value could not be parsed.
    #[error("failed to parse {field}: {value}")]
    Unreadable { field: String, value: String },
}

impl ExtractionError {
    pub fn not_found(field: impl Into<String>) -> Self {
        Self::NotFound(field.into())
    }

    pub fn unreadable(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Unreadable {
            field: field.into(),
            value: value.into(),
        }
    }
}

/// Result type for the subsidy library.
pub type Result<T> = std::result::Result<T, SubsidyError>;
