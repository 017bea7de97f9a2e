//! Classified supporting documents.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Type of supporting document, as assigned by the classifier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    /// Ticket invoice covering (close to) a full year (Jahresrechnung).
    AnnualInvoice,
    /// Ticket invoice for a single billing month (Monatsrechnung).
    MonthlyInvoice,
    /// Payment confirmation (Zahlungsbestätigung).
    PaymentConfirmation,
    /// Residency certificate (Meldezettel).
    ResidencyCertificate,
    /// Not one of the known types.
    #[default]
    Unknown,
}

impl DocumentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::AnnualInvoice => "annual_invoice",
            DocumentType::MonthlyInvoice => "monthly_invoice",
            DocumentType::PaymentConfirmation => "payment_confirmation",
            DocumentType::ResidencyCertificate => "residency_certificate",
            DocumentType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentType {
    type Err = std::convert::Infallible;

    /// Accepts the English names as well as the classifier's German labels.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = match s.trim().to_lowercase().as_str() {
            "annual_invoice" | "jahresrechnung" => DocumentType::AnnualInvoice,
            "monthly_invoice" | "monatsrechnung" => DocumentType::MonthlyInvoice,
            "payment_confirmation" | "zahlungsbestaetigung" | "zahlungsbestätigung" => {
                DocumentType::PaymentConfirmation
            }
            "residency_certificate" | "meldezettel" => DocumentType::ResidencyCertificate,
            _ => DocumentType::Unknown,
        };
        Ok(kind)
    }
}

/// A document as handed over by the text extractor and classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedDocument {
    /// Where the document came from (file name), for audit output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    /// Classifier output.
    pub document_type: DocumentType,

    /// Classifier confidence (0.0 - 1.0). Advisory only.
    pub confidence: f32,

    /// Extracted text. Pages may be separated by form feeds.
    #[serde(default, skip_serializing)]
    pub text: String,
}

impl ExtractedDocument {
    pub fn new(document_type: DocumentType, confidence: f32, text: impl Into<String>) -> Self {
        Self {
            source: None,
            document_type,
            confidence,
            text: text.into(),
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// Why a document's effective type differs from the classifier output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reclassification {
    pub from: DocumentType,
    pub to: DocumentType,
    /// Service period length that triggered the change.
    pub service_months: i32,
}

/// A document together with the type the engine validates it as.
///
/// The classifier's verdict stays available in `document.document_type`.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedDocument<'a> {
    pub document: &'a ExtractedDocument,
    pub effective_type: DocumentType,
    pub reclassification: Option<Reclassification>,
}

impl<'a> ClassifiedDocument<'a> {
    pub fn unchanged(document: &'a ExtractedDocument) -> Self {
        Self {
            document,
            effective_type: document.document_type,
            reclassification: None,
        }
    }

    pub fn reclassified(document: &'a ExtractedDocument, change: Reclassification) -> Self {
        Self {
            document,
            effective_type: change.to,
            reclassification: Some(change),
        }
    }

    /// Non-empty pages of the document text.
    pub fn pages(&self) -> Vec<&'a str> {
        let text = self.document.text.as_str();
        let pages: Vec<&str> = text.split('\u{000C}').filter(|p| !p.trim().is_empty()).collect();
        if pages.is_empty() { vec![text] } else { pages }
    }
}
