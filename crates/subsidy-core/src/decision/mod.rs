//! Combines per-document validation results into one decision.

use std::collections::BTreeSet;

use tracing::{debug, info, warn};

use crate::error::Result;
use crate::matching::{
    check_residency_text, service_period, validate_annual_invoice, validate_monthly_invoice,
    validate_payment_confirmation,
};
use crate::models::{
    ApplicationForm, ApplicationRecord, ClassifiedDocument, Decision, DocumentAudit, DocumentType,
    EngineConfig, ExtractedDocument, InvoiceOutcome, InvoicePath, MonthKey, Reclassification,
    ResidencyOutcome, ValidationResult,
};

/// Stateless decision engine over an immutable rule set.
#[derive(Debug, Clone, Default)]
pub struct DecisionEngine {
    config: EngineConfig,
}

impl DecisionEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Treat short annual invoices as monthly invoices.
    ///
    /// An annual invoice whose service period spans fewer than
    /// `reclassify_below_months` calendar months becomes a monthly invoice.
    /// Invoices without a readable service period keep their type.
    pub fn reclassify<'a>(&self, documents: &'a [ExtractedDocument]) -> Vec<ClassifiedDocument<'a>> {
        documents
            .iter()
            .map(|document| {
                if document.document_type != DocumentType::AnnualInvoice {
                    return ClassifiedDocument::unchanged(document);
                }
                let Ok(period) = service_period(&document.text, &self.config) else {
                    return ClassifiedDocument::unchanged(document);
                };

                let months = period.months_spanned();
                if months >= self.config.reclassify_below_months {
                    return ClassifiedDocument::unchanged(document);
                }

                info!(
                    source = document.source.as_deref().unwrap_or("-"),
                    months,
                    "Annual invoice reclassified as monthly invoice"
                );
                ClassifiedDocument::reclassified(
                    document,
                    Reclassification {
                        from: DocumentType::AnnualInvoice,
                        to: DocumentType::MonthlyInvoice,
                        service_months: months,
                    },
                )
            })
            .collect()
    }

    /// Evaluate a raw application form. Fails only if the form itself is
    /// incomplete or invalid.
    pub fn evaluate_form(&self, form: &ApplicationForm, documents: &[ExtractedDocument]) -> Result<Decision> {
        let applicant = ApplicationRecord::from_form(form)?;
        Ok(self.evaluate(&applicant, documents))
    }

    /// Evaluate one application against its supporting documents.
    pub fn evaluate(&self, applicant: &ApplicationRecord, documents: &[ExtractedDocument]) -> Decision {
        let classified = self.reclassify(documents);
        let mut audits: Vec<DocumentAudit> = classified.iter().map(audit_entry).collect();
        let mut warnings = Vec::new();

        let residency = self.residency_outcome(applicant, &classified, &mut audits, &mut warnings);
        let invoices = self.invoice_outcome(applicant, &classified, &mut audits);
        let approved = residency.passed && invoices.passed;

        info!(
            approved,
            residency = residency.passed,
            path = %invoices.path,
            distinct_months = invoices.distinct_month_count(),
            "Application evaluated"
        );

        Decision {
            approved,
            residency,
            invoices,
            documents: audits,
            warnings,
        }
    }

    /// The first residency certificate decides; later ones only raise a
    /// warning.
    fn residency_outcome(
        &self,
        applicant: &ApplicationRecord,
        classified: &[ClassifiedDocument<'_>],
        audits: &mut [DocumentAudit],
        warnings: &mut Vec<String>,
    ) -> ResidencyOutcome {
        let indices: Vec<usize> = classified
            .iter()
            .enumerate()
            .filter(|(_, doc)| doc.effective_type == DocumentType::ResidencyCertificate)
            .map(|(i, _)| i)
            .collect();

        let Some(&index) = indices.first() else {
            return ResidencyOutcome {
                passed: false,
                document_index: None,
                result: None,
                reasons: vec!["no residency document".to_string()],
            };
        };

        if indices.len() > 1 {
            let message = format!(
                "{} residency documents found, using the first ({})",
                indices.len(),
                source_label(&classified[index])
            );
            warn!("{}", message);
            warnings.push(message);
        }

        let result = check_residency_text(applicant, &classified[index].document.text, &self.config);
        audits[index].results.push(result.clone());

        let reasons = result
            .failure_reasons()
            .into_iter()
            .map(|reason| format!("residency certificate: {reason}"))
            .collect();

        ResidencyOutcome {
            passed: result.passed,
            document_index: Some(index),
            result: Some(result),
            reasons,
        }
    }

    fn invoice_outcome(
        &self,
        applicant: &ApplicationRecord,
        classified: &[ClassifiedDocument<'_>],
        audits: &mut [DocumentAudit],
    ) -> InvoiceOutcome {
        let mut annual: Vec<ValidationResult> = Vec::new();
        let mut payments: Vec<ValidationResult> = Vec::new();
        let mut monthly: Vec<ValidationResult> = Vec::new();

        for (doc, audit) in classified.iter().zip(audits.iter_mut()) {
            let text = doc.document.text.as_str();
            let results = match doc.effective_type {
                DocumentType::AnnualInvoice => {
                    let result = validate_annual_invoice(applicant, text, &self.config);
                    annual.push(result.clone());
                    vec![result]
                }
                DocumentType::PaymentConfirmation => {
                    let result = validate_payment_confirmation(applicant, text, &self.config);
                    payments.push(result.clone());
                    vec![result]
                }
                DocumentType::MonthlyInvoice => {
                    let pages: Vec<ValidationResult> = doc
                        .pages()
                        .into_iter()
                        .map(|page| validate_monthly_invoice(applicant, page, &self.config))
                        .collect();
                    monthly.extend(pages.iter().cloned());
                    pages
                }
                DocumentType::ResidencyCertificate | DocumentType::Unknown => continue,
            };
            audit.results.extend(results);
        }

        let annual_valid = annual.iter().any(|r| r.passed);
        let payment_valid = payments.iter().any(|r| r.passed);
        let distinct: BTreeSet<MonthKey> = monthly.iter().filter_map(ValidationResult::valid_month).collect();
        let required = self.config.min_distinct_months;

        let path = if annual_valid && payment_valid {
            InvoicePath::AnnualWithPayment
        } else if distinct.len() >= required {
            InvoicePath::DistinctMonths
        } else {
            InvoicePath::None
        };
        let passed = path != InvoicePath::None;

        debug!(
            annual = annual.len(),
            payments = payments.len(),
            monthly = monthly.len(),
            distinct_months = distinct.len(),
            %path,
            "Invoice paths evaluated"
        );

        let reasons = if passed {
            Vec::new()
        } else {
            let mut reasons = annual_path_reasons(&annual, &payments);
            reasons.push(format!(
                "monthly invoices: {} found, {} distinct valid months (minimum {})",
                monthly.len(),
                distinct.len(),
                required
            ));
            reasons
        };

        InvoiceOutcome {
            passed,
            path,
            annual_found: annual.len(),
            annual_valid,
            payment_found: payments.len(),
            payment_valid,
            monthly_found: monthly.len(),
            distinct_months: distinct.into_iter().collect(),
            required_months: required,
            reasons,
        }
    }
}

fn audit_entry(doc: &ClassifiedDocument<'_>) -> DocumentAudit {
    DocumentAudit {
        source: doc.document.source.clone(),
        classified_as: doc.document.document_type,
        validated_as: doc.effective_type,
        confidence: doc.document.confidence,
        reclassification: doc.reclassification.clone(),
        results: Vec::new(),
    }
}

fn source_label(doc: &ClassifiedDocument<'_>) -> String {
    doc.document
        .source
        .clone()
        .unwrap_or_else(|| "unnamed document".to_string())
}

/// Why the annual invoice + payment confirmation path failed.
fn annual_path_reasons(annual: &[ValidationResult], payments: &[ValidationResult]) -> Vec<String> {
    [
        ("annual invoice", annual),
        ("payment confirmation", payments),
    ]
    .into_iter()
    .filter_map(|(label, results)| {
        if results.is_empty() {
            return Some(format!("no valid {label}: none found"));
        }
        if results.iter().any(|r| r.passed) {
            return None;
        }
        let details = results
            .iter()
            .flat_map(ValidationResult::failure_reasons)
            .collect::<Vec<_>>()
            .join("; ");
        Some(format!("no valid {label}: {details}"))
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DatePeriod;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn applicant() -> ApplicationRecord {
        ApplicationRecord::new(
            "Max",
            "Mustermann",
            ymd(1990, 1, 1),
            "5020",
            DatePeriod::new(ymd(2024, 1, 1), ymd(2024, 12, 31)),
        )
        .unwrap()
    }

    fn invoice(kind: DocumentType, service: &str) -> ExtractedDocument {
        ExtractedDocument::new(
            kind,
            0.9,
            format!(
                "Karteninhaber: Max Mustermann\nGültigkeitszeitraum: 01.01.2024 - 31.12.2024\n\
                 Leistungszeitraum: {service}"
            ),
        )
    }

    const RESIDENCY: &str = "Familienname: Mustermann\nVorname: Max\nGeburtsdatum: 01.01.1990\n\
                             Hauptwohnsitz\n5020 Salzburg";

    #[test]
    fn test_short_annual_invoice_reclassified() {
        let engine = DecisionEngine::default();
        let docs = vec![
            invoice(DocumentType::AnnualInvoice, "01.01.2024 - 30.06.2024"),
            invoice(DocumentType::AnnualInvoice, "01.01.2024 - 31.12.2024"),
            ExtractedDocument::new(DocumentType::AnnualInvoice, 0.9, "Rechnung ohne Zeitraum"),
        ];

        let classified = engine.reclassify(&docs);
        assert_eq!(classified[0].effective_type, DocumentType::MonthlyInvoice);
        assert_eq!(
            classified[0].reclassification,
            Some(Reclassification {
                from: DocumentType::AnnualInvoice,
                to: DocumentType::MonthlyInvoice,
                service_months: 5,
            })
        );
        assert_eq!(classified[1].effective_type, DocumentType::AnnualInvoice);
        assert_eq!(classified[2].effective_type, DocumentType::AnnualInvoice);
        assert_eq!(docs[0].document_type, DocumentType::AnnualInvoice);
    }

    #[test]
    fn test_no_residency_document() {
        let engine = DecisionEngine::default();
        let decision = engine.evaluate(&applicant(), &[]);
        assert!(!decision.approved);
        assert_eq!(decision.residency.reasons, vec!["no residency document".to_string()]);
        assert_eq!(decision.invoices.path, InvoicePath::None);
    }

    #[test]
    fn test_first_residency_document_wins() {
        let engine = DecisionEngine::default();
        let docs = vec![
            ExtractedDocument::new(DocumentType::ResidencyCertificate, 0.4, RESIDENCY).with_source("a.pdf"),
            ExtractedDocument::new(DocumentType::ResidencyCertificate, 0.99, "Vorname: Erika")
                .with_source("b.pdf"),
        ];

        let decision = engine.evaluate(&applicant(), &docs);
        assert!(decision.residency.passed);
        assert_eq!(decision.residency.document_index, Some(0));
        assert_eq!(
            decision.warnings,
            vec!["2 residency documents found, using the first (a.pdf)".to_string()]
        );
        assert!(decision.documents[1].results.is_empty());
    }

    #[test]
    fn test_multi_page_monthly_invoice() {
        let engine = DecisionEngine::default();
        let pages = ["01.02.2024 - 29.02.2024", "01.03.2024 - 31.03.2024", "01.04.2024 - 30.04.2024"]
            .iter()
            .map(|service| invoice(DocumentType::MonthlyInvoice, service).text)
            .collect::<Vec<_>>()
            .join("\u{000C}");
        let docs = vec![
            ExtractedDocument::new(DocumentType::ResidencyCertificate, 0.9, RESIDENCY),
            ExtractedDocument::new(DocumentType::MonthlyInvoice, 0.9, pages),
        ];

        let decision = engine.evaluate(&applicant(), &docs);
        assert!(decision.approved, "{:?}", decision.rejection_reasons());
        assert_eq!(decision.invoices.path, InvoicePath::DistinctMonths);
        assert_eq!(decision.invoices.monthly_found, 3);
        assert_eq!(decision.documents[1].results.len(), 3);
    }

    #[test]
    fn test_annual_path_reasons() {
        let engine = DecisionEngine::default();
        let docs = vec![invoice(DocumentType::AnnualInvoice, "01.01.2024 - 31.12.2024")];
        let decision = engine.evaluate(&applicant(), &docs);

        assert!(decision.invoices.annual_valid);
        assert!(!decision.invoices.passed);
        assert_eq!(
            decision.invoices.reasons,
            vec![
                "no valid payment confirmation: none found".to_string(),
                "monthly invoices: 0 found, 0 distinct valid months (minimum 3)".to_string(),
            ]
        );
    }
}
