//! Data models for applications, documents, and decisions.

pub mod application;
pub mod config;
pub mod decision;
pub mod document;
pub mod period;
pub mod validation;

pub use application::{ApplicationForm, ApplicationRecord};
pub use config::{EngineConfig, LabelConfig, LabelLayout, MarkerAnchor, MarkerConfig, MarkerWindow, WindowStrategy};
pub use decision::{Decision, DocumentAudit, InvoiceOutcome, InvoicePath, ResidencyOutcome};
pub use document::{ClassifiedDocument, DocumentType, ExtractedDocument, Reclassification};
pub use period::{DatePeriod, MonthKey};
pub use validation::{CheckKind, FieldMatch, MatchFailure, ValidationResult};
