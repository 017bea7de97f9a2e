//! Applicant data as submitted with the subsidy application.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ApplicationError;
use crate::extract::dates::parse_date;

use super::period::DatePeriod;

/// Raw application form as delivered by the intake system (`antrag.json`).
///
/// Every field is optional here; [`ApplicationRecord::from_form`] decides
/// what is required.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApplicationForm {
    /// Running application number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub laufende_nr: Option<serde_json::Value>,

    /// Internal case identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intern_id: Option<serde_json::Value>,

    /// First name(s).
    #[serde(default)]
    pub vorname: Option<String>,

    /// Surname.
    #[serde(default)]
    pub familienname: Option<String>,

    /// Birthdate, ISO or `DD.MM.YYYY`.
    #[serde(default)]
    pub geburtsdatum: Option<String>,

    /// Postal code of the main residence.
    #[serde(default)]
    pub plz: Option<String>,

    /// Ticket validity start.
    #[serde(default)]
    pub gilt_von: Option<String>,

    /// Ticket validity end.
    #[serde(default)]
    pub gilt_bis: Option<String>,
}

/// Validated, immutable applicant record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationRecord {
    pub first_name: String,
    pub surname: String,
    pub birthdate: NaiveDate,
    pub postal_code: String,
    pub validity: DatePeriod,
}

impl ApplicationRecord {
    /// Build a record from already-typed values.
    pub fn new(
        first_name: impl Into<String>,
        surname: impl Into<String>,
        birthdate: NaiveDate,
        postal_code: impl Into<String>,
        validity: DatePeriod,
    ) -> Result<Self, ApplicationError> {
        let record = Self {
            first_name: first_name.into(),
            surname: surname.into(),
            birthdate,
            postal_code: postal_code.into().trim().to_string(),
            validity,
        };
        record.check()?;
        Ok(record)
    }

    /// Convert a raw form, failing on the first missing or invalid field.
    pub fn from_form(form: &ApplicationForm) -> Result<Self, ApplicationError> {
        let first_name = required(&form.vorname, "vorname")?;
        let surname = required(&form.familienname, "familienname")?;
        let birthdate = required_date(&form.geburtsdatum, "geburtsdatum")?;
        let postal_code = required(&form.plz, "plz")?;
        let start = required_date(&form.gilt_von, "gilt_von")?;
        let end = required_date(&form.gilt_bis, "gilt_bis")?;

        Self::new(
            first_name,
            surname,
            birthdate,
            postal_code,
            DatePeriod::new(start, end),
        )
    }

    fn check(&self) -> Result<(), ApplicationError> {
        if self.first_name.trim().is_empty() {
            return Err(ApplicationError::MissingField("first_name".to_string()));
        }
        if self.surname.trim().is_empty() {
            return Err(ApplicationError::MissingField("surname".to_string()));
        }
        if self.postal_code.is_empty() {
            return Err(ApplicationError::MissingField("postal_code".to_string()));
        }
        if self.postal_code.len() != 4 || !self.postal_code.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ApplicationError::InvalidPostalCode(self.postal_code.clone()));
        }
        if self.validity.start > self.validity.end {
            return Err(ApplicationError::InvalidValidity {
                start: self.validity.start.to_string(),
                end: self.validity.end.to_string(),
            });
        }
        Ok(())
    }
}

impl TryFrom<&ApplicationForm> for ApplicationRecord {
    type Error = ApplicationError;

    fn try_from(form: &ApplicationForm) -> Result<Self, Self::Error> {
        Self::from_form(form)
    }
}

fn required<'a>(value: &'a Option<String>, field: &str) -> Result<&'a str, ApplicationError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApplicationError::MissingField(field.to_string()))
}

fn required_date(value: &Option<String>, field: &str) -> Result<NaiveDate, ApplicationError> {
    let raw = required(value, field)?;
    parse_date(field, raw).map_err(|_| ApplicationError::InvalidDate {
        field: field.to_string(),
        value: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn form() -> ApplicationForm {
        ApplicationForm {
            vorname: Some("Max".to_string()),
            familienname: Some("Mustermann".to_string()),
            geburtsdatum: Some("01.01.1990".to_string()),
            plz: Some(" 5020 ".to_string()),
            gilt_von: Some("2024-01-01 00:00:00".to_string()),
            gilt_bis: Some("2024-12-31T00:00:00".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_from_form() {
        let record = ApplicationRecord::from_form(&form()).unwrap();
        assert_eq!(record.birthdate, NaiveDate::from_ymd_opt(1990, 1, 1).unwrap());
        assert_eq!(record.postal_code, "5020");
        assert_eq!(record.validity.start, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(record.validity.end, NaiveDate::from_ymd_opt(2024, 12, 31).unwrap());
    }

    #[test]
    fn test_missing_field_fails_fast() {
        let mut incomplete = form();
        incomplete.familienname = Some("   ".to_string());
        incomplete.plz = None;

        let err = ApplicationRecord::from_form(&incomplete).unwrap_err();
        assert_eq!(err, ApplicationError::MissingField("familienname".to_string()));
    }

    #[test]
    fn test_postal_code_must_be_four_digits() {
        for bad in ["A-5020", "502", "50200"] {
            let mut form = form();
            form.plz = Some(bad.to_string());
            assert_eq!(
                ApplicationRecord::from_form(&form).unwrap_err(),
                ApplicationError::InvalidPostalCode(bad.to_string())
            );
        }
    }

    #[test]
    fn test_inverted_validity_rejected() {
        let mut inverted = form();
        inverted.gilt_von = Some("2025-01-01".to_string());

        let err = ApplicationRecord::from_form(&inverted).unwrap_err();
        assert!(matches!(err, ApplicationError::InvalidValidity { .. }));
    }

    #[test]
    fn test_form_deserializes_from_json() {
        let json = r#"{
            "laufende_nr": 17,
            "vorname": "Jörg",
            "familienname": "Müller-Schmidt",
            "geburtsdatum": "1985-07-05",
            "plz": "5020",
            "gilt_von": "2024-09-15",
            "gilt_bis": "2025-09-14",
            "strasse": "Musterstraße 1"
        }"#;

        let form: ApplicationForm = serde_json::from_str(json).unwrap();
        let record = ApplicationRecord::try_from(&form).unwrap();
        assert_eq!(record.surname, "Müller-Schmidt");
        assert_eq!(record.validity.months_spanned(), 12);
    }
}
