//! Final case decision with its audit trail.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::document::{DocumentType, Reclassification};
use super::period::MonthKey;
use super::validation::ValidationResult;

/// Which proof of ticket purchase carried the invoice outcome.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoicePath {
    /// A valid annual invoice together with a valid payment confirmation.
    AnnualWithPayment,
    /// Enough distinct months of valid monthly invoices.
    DistinctMonths,
    /// No path succeeded.
    #[default]
    None,
}

impl fmt::Display for InvoicePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            InvoicePath::AnnualWithPayment => "annual invoice + payment confirmation",
            InvoicePath::DistinctMonths => "monthly invoices",
            InvoicePath::None => "none",
        };
        f.write_str(s)
    }
}

/// Result of the residency certificate check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResidencyOutcome {
    pub passed: bool,

    /// Index into [`Decision::documents`] of the certificate used.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_index: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ValidationResult>,

    /// Empty when `passed`.
    pub reasons: Vec<String>,
}

/// Result of the invoice proof check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceOutcome {
    pub passed: bool,
    pub path: InvoicePath,

    pub annual_found: usize,
    pub annual_valid: bool,
    pub payment_found: usize,
    pub payment_valid: bool,

    /// Monthly invoice pages evaluated, reclassified ones included.
    pub monthly_found: usize,
    /// Distinct billing months covered by valid monthly invoices.
    pub distinct_months: Vec<MonthKey>,
    pub required_months: usize,

    /// Empty when `passed`.
    pub reasons: Vec<String>,
}

impl InvoiceOutcome {
    pub fn distinct_month_count(&self) -> usize {
        self.distinct_months.len()
    }
}

/// Audit entry for one input document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentAudit {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    /// Type assigned by the classifier.
    pub classified_as: DocumentType,

    /// Type the document was validated as.
    pub validated_as: DocumentType,

    pub confidence: f32,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub reclassification: Option<Reclassification>,

    /// One result per validated page; empty for documents that were not
    /// validated (unknown type, or residency certificates after the first).
    pub results: Vec<ValidationResult>,
}

/// Final outcome for one application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub approved: bool,
    pub residency: ResidencyOutcome,
    pub invoices: InvoiceOutcome,
    pub documents: Vec<DocumentAudit>,

    /// Non-fatal conditions, such as several residency certificates.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl Decision {
    /// All reasons for a rejection, residency first. Empty when approved.
    pub fn rejection_reasons(&self) -> Vec<String> {
        if self.approved {
            return Vec::new();
        }
        self.residency
            .reasons
            .iter()
            .chain(self.invoices.reasons.iter())
            .cloned()
            .collect()
    }
}
