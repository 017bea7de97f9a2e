//! Residency certificate validation.

use tracing::debug;

use crate::extract::{extract_residency_fields, ResidencyFields};
use crate::models::{
    ApplicationRecord, CheckKind, DocumentType, EngineConfig, FieldMatch, MatchFailure, ValidationResult,
};

use super::names::{first_name_matches, surname_matches};
use super::{mismatch, DATE_DISPLAY};

/// Check extracted certificate fields against the applicant.
///
/// Runs four independent checks (first name, surname, birthdate, postal
/// code); the certificate is valid only if all of them pass.
pub fn validate_registration(
    applicant: &ApplicationRecord,
    fields: &ResidencyFields,
    config: &EngineConfig,
) -> ValidationResult {
    let checks = vec![
        check_first_name(applicant, fields),
        check_surname(applicant, fields),
        check_birthdate(applicant, fields),
        check_postal_code(applicant, fields, config),
    ];

    let result = ValidationResult::new(DocumentType::ResidencyCertificate, checks);
    debug!(passed = result.passed, "Residency certificate validated");
    result
}

/// Extract fields from certificate text, then validate them.
pub fn check_residency_text(
    applicant: &ApplicationRecord,
    text: &str,
    config: &EngineConfig,
) -> ValidationResult {
    let fields = extract_residency_fields(text, &config.labels);
    validate_registration(applicant, &fields, config)
}

fn check_first_name(applicant: &ApplicationRecord, fields: &ResidencyFields) -> FieldMatch {
    match &fields.first_name {
        Ok(value) if first_name_matches(&applicant.first_name, value) => {
            FieldMatch::pass(CheckKind::FirstName, value.as_str())
        }
        Ok(value) => mismatch(CheckKind::FirstName, value, &applicant.first_name),
        Err(err) => FieldMatch::missing(CheckKind::FirstName, err.clone()),
    }
}

fn check_surname(applicant: &ApplicationRecord, fields: &ResidencyFields) -> FieldMatch {
    match &fields.surname {
        Ok(value) if surname_matches(&applicant.surname, value) => {
            FieldMatch::pass(CheckKind::Surname, value.as_str())
        }
        Ok(value) => mismatch(CheckKind::Surname, value, &applicant.surname),
        Err(err) => FieldMatch::missing(CheckKind::Surname, err.clone()),
    }
}

fn check_birthdate(applicant: &ApplicationRecord, fields: &ResidencyFields) -> FieldMatch {
    match &fields.birthdate {
        Ok(found) if found.value == applicant.birthdate => {
            FieldMatch::pass(CheckKind::Birthdate, found.value.format(DATE_DISPLAY).to_string())
        }
        Ok(found) => mismatch(
            CheckKind::Birthdate,
            &found.value.format(DATE_DISPLAY).to_string(),
            &applicant.birthdate.format(DATE_DISPLAY).to_string(),
        ),
        Err(err) => FieldMatch::missing(CheckKind::Birthdate, err.clone()),
    }
}

/// Eligibility is reported before a mismatch when both apply.
fn check_postal_code(
    applicant: &ApplicationRecord,
    fields: &ResidencyFields,
    config: &EngineConfig,
) -> FieldMatch {
    let code = match &fields.postal_code {
        Ok(code) => code,
        Err(err) => return FieldMatch::missing(CheckKind::PostalCode, err.clone()),
    };

    if !config.eligible_postal_codes.contains(code) {
        return FieldMatch::fail(
            CheckKind::PostalCode,
            Some(code.clone()),
            MatchFailure::Ineligible { code: code.clone() },
        );
    }
    if *code != applicant.postal_code {
        return mismatch(CheckKind::PostalCode, code, &applicant.postal_code);
    }
    FieldMatch::pass(CheckKind::PostalCode, code.as_str())
}
