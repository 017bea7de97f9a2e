//! Core library for transit-subsidy application verification.
//!
//! This crate provides:
//! - Text normalization for OCR output (diacritics, umlaut transliterations)
//! - Field extraction from residency certificates and invoices
//! - Matching of extracted fields against the applicant record
//! - The decision engine combining residency and invoice proofs

pub mod decision;
pub mod error;
pub mod extract;
pub mod matching;
pub mod models;
pub mod source;
pub mod text;

pub use decision::DecisionEngine;
pub use error::{ApplicationError, ExtractionError, Result, SubsidyError};
pub use models::{
    ApplicationForm, ApplicationRecord, ClassifiedDocument, Decision, DocumentType, EngineConfig,
    ExtractedDocument, InvoicePath, ValidationResult,
};
pub use source::{load_document, DocumentClassifier, KeywordClassifier, TextSource};
pub use text::{compact, normalize, umlaut_variants, CompactText, NormalizedText};
