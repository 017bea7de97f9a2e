//! Invoice and payment confirmation validation.

use tracing::debug;

use crate::error::ExtractionError;
use crate::extract::{extract_period, DateStyle, MarkerSearch};
use crate::models::{
    ApplicationRecord, CheckKind, DatePeriod, DocumentType, EngineConfig, FieldMatch, MarkerWindow,
    MatchFailure, ValidationResult,
};

use super::mismatch;
use super::names::full_name_matches;

/// Longest window excerpt quoted in a name mismatch.
const EXCERPT_CHARS: usize = 80;

/// Validate an annual invoice (Jahresrechnung).
///
/// The card holder must be the applicant and the validity period must equal
/// the applicant's. The service period is read for reclassification and
/// audit only.
pub fn validate_annual_invoice(
    applicant: &ApplicationRecord,
    text: &str,
    config: &EngineConfig,
) -> ValidationResult {
    let (holder, context) = check_holder(applicant, text, &config.markers.card_holder);
    let validity = compare_validity(applicant, invoice_validity(text, config));
    let service = service_period(text, config).ok();

    let result = ValidationResult::new(DocumentType::AnnualInvoice, vec![holder, validity])
        .with_name_context(context)
        .with_service_period(service);
    debug!(passed = result.passed, "Annual invoice validated");
    result
}

/// Validate a payment confirmation (Zahlungsbestätigung).
pub fn validate_payment_confirmation(
    applicant: &ApplicationRecord,
    text: &str,
    config: &EngineConfig,
) -> ValidationResult {
    let (holder, context) = check_holder(applicant, text, &config.markers.payer);
    let validity = compare_validity(
        applicant,
        extract_period(
            text,
            &config.markers.payment_validity,
            DateStyle::MonthName,
            CheckKind::ValidityPeriod.label(),
        ),
    );

    let result = ValidationResult::new(DocumentType::PaymentConfirmation, vec![holder, validity])
        .with_name_context(context);
    debug!(passed = result.passed, "Payment confirmation validated");
    result
}

/// Validate one page of a monthly invoice (Monatsrechnung).
///
/// On top of the annual checks, the service period must lie inside the
/// applicant's validity window.
pub fn validate_monthly_invoice(
    applicant: &ApplicationRecord,
    text: &str,
    config: &EngineConfig,
) -> ValidationResult {
    let (holder, context) = check_holder(applicant, text, &config.markers.card_holder);
    let validity = compare_validity(applicant, invoice_validity(text, config));
    let service = service_period(text, config);
    let service_check = check_service_period(applicant, &service);

    let result = ValidationResult::new(
        DocumentType::MonthlyInvoice,
        vec![holder, validity, service_check],
    )
    .with_name_context(context)
    .with_service_period(service.ok());
    debug!(
        passed = result.passed,
        month = ?result.service_period.map(|p| p.month_key().to_string()),
        "Monthly invoice validated"
    );
    result
}

/// Service (billing) period of an invoice.
pub fn service_period(text: &str, config: &EngineConfig) -> Result<DatePeriod, ExtractionError> {
    extract_period(
        text,
        &config.markers.service_period,
        DateStyle::Numeric,
        CheckKind::ServicePeriod.label(),
    )
}

/// Validity period of an invoice, falling back to the service period marker
/// for layouts without a validity section.
fn invoice_validity(text: &str, config: &EngineConfig) -> Result<DatePeriod, ExtractionError> {
    let field = CheckKind::ValidityPeriod.label();
    match extract_period(text, &config.markers.validity, DateStyle::Numeric, field) {
        Err(ExtractionError::NotFound(_)) => {
            extract_period(text, &config.markers.validity_fallback, DateStyle::Numeric, field)
        }
        found => found,
    }
}

/// Look for the applicant's full name in the windows after `window`'s
/// markers. Returns the check and the window text it was decided on.
fn check_holder(
    applicant: &ApplicationRecord,
    text: &str,
    window: &MarkerWindow,
) -> (FieldMatch, Option<String>) {
    let expected = format!("{} {}", applicant.first_name, applicant.surname);
    let windows = MarkerSearch::new(window).windows(text);

    let Some(first) = windows.first() else {
        let err = ExtractionError::not_found(window.markers.join("/"));
        return (FieldMatch::missing(CheckKind::HolderName, err), None);
    };

    match windows
        .iter()
        .find(|w| full_name_matches(&applicant.first_name, &applicant.surname, w))
    {
        Some(found) => (FieldMatch::pass(CheckKind::HolderName, expected), Some(found.clone())),
        None => (
            mismatch(CheckKind::HolderName, &excerpt(first), &expected),
            Some(first.clone()),
        ),
    }
}

fn compare_validity(
    applicant: &ApplicationRecord,
    found: Result<DatePeriod, ExtractionError>,
) -> FieldMatch {
    match found {
        Ok(period) if period == applicant.validity => {
            FieldMatch::pass(CheckKind::ValidityPeriod, period.to_string())
        }
        Ok(period) => mismatch(
            CheckKind::ValidityPeriod,
            &period.to_string(),
            &applicant.validity.to_string(),
        ),
        Err(err) => FieldMatch::missing(CheckKind::ValidityPeriod, err),
    }
}

fn check_service_period(
    applicant: &ApplicationRecord,
    found: &Result<DatePeriod, ExtractionError>,
) -> FieldMatch {
    match found {
        Ok(period) if applicant.validity.contains_period(period) => {
            FieldMatch::pass(CheckKind::ServicePeriod, period.to_string())
        }
        Ok(period) => FieldMatch::fail(
            CheckKind::ServicePeriod,
            Some(period.to_string()),
            MatchFailure::OutsideWindow {
                period: period.to_string(),
                window: applicant.validity.to_string(),
            },
        ),
        Err(err) => FieldMatch::missing(CheckKind::ServicePeriod, err.clone()),
    }
}

fn excerpt(text: &str) -> String {
    if text.chars().count() <= EXCERPT_CHARS {
        return text.to_string();
    }
    let cut: String = text.chars().take(EXCERPT_CHARS).collect();
    format!("{cut}...")
}
