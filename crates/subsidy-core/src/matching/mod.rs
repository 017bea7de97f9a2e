//! Comparison of extracted document fields against the applicant.
//!
//! Matchers never fail: every outcome, including a missing or unreadable
//! field, is reported as a [`FieldMatch`] inside a [`ValidationResult`].
//!
//! [`FieldMatch`]: crate::models::FieldMatch
//! [`ValidationResult`]: crate::models::ValidationResult

pub mod invoice;
pub mod names;
pub mod registration;

pub use invoice::{service_period, validate_annual_invoice, validate_monthly_invoice, validate_payment_confirmation};
pub use names::{first_name_matches, full_name_matches, surname_matches};
pub use registration::{check_residency_text, validate_registration};

use crate::models::{CheckKind, FieldMatch, MatchFailure};

/// Date format used in check output.
pub(crate) const DATE_DISPLAY: &str = "%d.%m.%Y";

pub(crate) fn mismatch(check: CheckKind, extracted: &str, expected: &str) -> FieldMatch {
    FieldMatch::fail(
        check,
        Some(extracted.to_string()),
        MatchFailure::Mismatch {
            extracted: extracted.to_string(),
            expected: expected.to_string(),
        },
    )
}
