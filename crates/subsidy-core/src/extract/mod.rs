//! Rule-based field extraction from OCR text.
//!
//! Extraction only locates and parses values; comparing them against the
//! applicant happens in [`crate::matching`].

pub mod dates;
pub mod labels;
pub mod markers;
pub mod patterns;

pub use dates::{parse_date, parse_month_name_date, DateExtractor, DateStyle};
pub use labels::{extract_residency_fields, LabelExtractor, ResidencyFields};
pub use markers::{extract_period, MarkerSearch};

/// An extracted value with the text it was read from.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionMatch<T> {
    /// Extracted value.
    pub value: T,
    /// Source text that was matched.
    pub source: String,
}

impl<T> ExtractionMatch<T> {
    pub fn new(value: T, source: impl Into<String>) -> Self {
        Self {
            value,
            source: source.into(),
        }
    }
}

/// Split text into trimmed, non-empty lines.
pub(crate) fn content_lines(text: &str) -> Vec<&str> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect()
}
