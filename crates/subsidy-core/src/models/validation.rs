//! Per-check and per-document validation results.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::ExtractionError;

use super::document::DocumentType;
use super::period::{DatePeriod, MonthKey};

/// The attribute a [`FieldMatch`] checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    FirstName,
    Surname,
    Birthdate,
    PostalCode,
    /// Applicant name near the card-holder or payer marker.
    HolderName,
    ValidityPeriod,
    ServicePeriod,
}

impl CheckKind {
    pub fn label(&self) -> &'static str {
        match self {
            CheckKind::FirstName => "first name",
            CheckKind::Surname => "surname",
            CheckKind::Birthdate => "birthdate",
            CheckKind::PostalCode => "postal code",
            CheckKind::HolderName => "name",
            CheckKind::ValidityPeriod => "validity period",
            CheckKind::ServicePeriod => "service period",
        }
    }
}

impl fmt::Display for CheckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Why a check failed.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MatchFailure {
    /// Label, marker or value absent from the document.
    #[error("not found")]
    NotFound,

    /// Value located but not parseable.
    #[error("unreadable value '{raw}'")]
    Unreadable { raw: String },

    /// Value extracted but contradicts the applicant.
    #[error("mismatch (document: '{extracted}', application: '{expected}')")]
    Mismatch { extracted: String, expected: String },

    /// Postal code not in the subsidy-eligible set.
    #[error("ineligible postal code {code}")]
    Ineligible { code: String },

    /// Service period not inside the applicant's validity window.
    #[error("service period {period} outside validity window {window}")]
    OutsideWindow { period: String, window: String },
}

impl From<ExtractionError> for MatchFailure {
    fn from(err: ExtractionError) -> Self {
        match err {
            ExtractionError::NotFound(_) => MatchFailure::NotFound,
            ExtractionError::Unreadable { value, .. } => MatchFailure::Unreadable { raw: value },
        }
    }
}

/// Outcome of checking one attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMatch {
    pub check: CheckKind,
    pub passed: bool,

    /// Value read from the document, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extracted: Option<String>,

    /// Set when `passed` is false.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<MatchFailure>,
}

impl FieldMatch {
    pub fn pass(check: CheckKind, extracted: impl Into<String>) -> Self {
        Self {
            check,
            passed: true,
            extracted: Some(extracted.into()),
            failure: None,
        }
    }

    pub fn fail(check: CheckKind, extracted: Option<String>, failure: MatchFailure) -> Self {
        Self {
            check,
            passed: false,
            extracted,
            failure: Some(failure),
        }
    }

    /// Failure from an extraction error; no value was read.
    pub fn missing(check: CheckKind, err: ExtractionError) -> Self {
        Self::fail(check, None, err.into())
    }

    /// Human-readable reason, `None` when the check passed.
    pub fn reason(&self) -> Option<String> {
        self.failure
            .as_ref()
            .map(|failure| format!("{}: {}", self.check, failure))
    }
}

/// All checks run against one document (or one page of a monthly invoice).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Type the document was validated as.
    pub document_type: DocumentType,

    pub checks: Vec<FieldMatch>,

    /// True when every check passed.
    pub passed: bool,

    /// Window text searched for the applicant's name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_context: Option<String>,

    /// Service period read from an invoice.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_period: Option<DatePeriod>,
}

impl ValidationResult {
    pub fn new(document_type: DocumentType, checks: Vec<FieldMatch>) -> Self {
        let passed = !checks.is_empty() && checks.iter().all(|c| c.passed);
        Self {
            document_type,
            checks,
            passed,
            name_context: None,
            service_period: None,
        }
    }

    pub fn with_name_context(mut self, context: Option<String>) -> Self {
        self.name_context = context;
        self
    }

    pub fn with_service_period(mut self, period: Option<DatePeriod>) -> Self {
        self.service_period = period;
        self
    }

    pub fn check(&self, kind: CheckKind) -> Option<&FieldMatch> {
        self.checks.iter().find(|c| c.check == kind)
    }

    /// Billing month, for monthly invoices that passed.
    pub fn valid_month(&self) -> Option<MonthKey> {
        if self.passed {
            self.service_period.map(|p| p.month_key())
        } else {
            None
        }
    }

    /// Reasons of all failed checks.
    pub fn failure_reasons(&self) -> Vec<String> {
        self.checks.iter().filter_map(FieldMatch::reason).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_text() {
        let check = FieldMatch::fail(
            CheckKind::PostalCode,
            Some("4020".to_string()),
            MatchFailure::Ineligible { code: "4020".to_string() },
        );
        assert_eq!(check.reason().unwrap(), "postal code: ineligible postal code 4020");

        let missing = FieldMatch::missing(CheckKind::Birthdate, ExtractionError::not_found("Geburtsdatum"));
        assert_eq!(missing.reason().unwrap(), "birthdate: not found");
        assert!(FieldMatch::pass(CheckKind::Surname, "mustermann").reason().is_none());
    }

    #[test]
    fn test_result_passes_only_when_all_checks_pass() {
        let ok = ValidationResult::new(
            DocumentType::PaymentConfirmation,
            vec![
                FieldMatch::pass(CheckKind::HolderName, "max mustermann"),
                FieldMatch::pass(CheckKind::ValidityPeriod, "01.01.2024 - 31.12.2024"),
            ],
        );
        assert!(ok.passed);

        let failing = ValidationResult::new(
            DocumentType::PaymentConfirmation,
            vec![
                FieldMatch::pass(CheckKind::HolderName, "max mustermann"),
                FieldMatch::missing(CheckKind::ValidityPeriod, ExtractionError::not_found("gilt")),
            ],
        );
        assert!(!failing.passed);
        assert_eq!(failing.failure_reasons(), vec!["validity period: not found".to_string()]);
        assert!(!ValidationResult::new(DocumentType::Unknown, Vec::new()).passed);
    }
}
