//! End-to-end decisions over realistic OCR text.

use chrono::NaiveDate;
use pretty_assertions::assert_eq;

use subsidy_core::models::{CheckKind, DatePeriod, MatchFailure, MonthKey};
use subsidy_core::{
    ApplicationError, ApplicationForm, ApplicationRecord, DecisionEngine, DocumentType, EngineConfig,
    ExtractedDocument, InvoicePath, SubsidyError,
};

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn max_mustermann() -> ApplicationRecord {
    ApplicationRecord::new(
        "Max",
        "Mustermann",
        ymd(1990, 1, 1),
        "5020",
        DatePeriod::new(ymd(2024, 1, 1), ymd(2024, 12, 31)),
    )
    .unwrap()
}

fn meldezettel(surname: &str, postal_code: &str) -> ExtractedDocument {
    let text = format!(
        "MELDEBESTÄTIGUNG\n\
         Familienname oder Nachname:\n\
         Vomame:\n\
         Geschlecht:\n\
         Geburtsdatum:\n\
         Staatsa ngehörig keit:\n\
         {surname}\n\
         Max\n\
         männlich\n\
         O1.O1.199O\n\
         Österreich\n\
         Wohnsitzqualität: Hauptwohnsitz\n\
         Musterstraße 12\n\
         {postal_code} Salzburg\n"
    );
    ExtractedDocument::new(DocumentType::ResidencyCertificate, 0.97, text).with_source("meldezettel.pdf")
}

fn jahresrechnung() -> ExtractedDocument {
    let text = "ÖBB-Personenverkehr AG\n\
                Rechnung\n\
                Rechnungsnummer: 2024-000815\n\
                Karteninhaber\n\
                Herr\n\
                Max Mustermann\n\
                Produkt: KlimaTicket Ö Classic\n\
                Gültigkeitszeitraum\n\
                Beginn           Ende\n\
                01.01.2024       31.12.2024\n\
                Leistungszeitraum\n\
                01.01.2024 - 31.12.2024\n\
                Gesamtbetrag EUR 1.095,00";
    ExtractedDocument::new(DocumentType::AnnualInvoice, 0.91, text).with_source("rechnung.pdf")
}

fn zahlungsbestaetigung() -> ExtractedDocument {
    let text = "Zahlungsbestätigung\n\
                Wir bestätigen den Zahlungseingang\n\
                für\n\
                Max Mustermann\n\
                Ihr KlimaTicket gilt\n\
                1. Jän 2024 - 31. Dez 2024";
    ExtractedDocument::new(DocumentType::PaymentConfirmation, 0.88, text).with_source("zahlung.pdf")
}

fn monatsrechnung(start: &str, end: &str) -> ExtractedDocument {
    let text = format!(
        "Monatsrechnung\n\
         Karteninhaber: Max Mustermann\n\
         Gültigkeit: 01.01.2024 - 31.12.2024\n\
         Leistungszeitraum: {start} - {end}\n\
         Betrag EUR 96,00"
    );
    ExtractedDocument::new(DocumentType::MonthlyInvoice, 0.9, text)
}

#[test]
fn approves_via_annual_invoice_and_payment() {
    let engine = DecisionEngine::new(EngineConfig::default());
    let docs = vec![meldezettel("Mustermann", "5020"), jahresrechnung(), zahlungsbestaetigung()];

    let decision = engine.evaluate(&max_mustermann(), &docs);

    assert!(decision.approved, "{:?}", decision.rejection_reasons());
    assert!(decision.residency.passed);
    assert_eq!(decision.invoices.path, InvoicePath::AnnualWithPayment);
    assert!(decision.warnings.is_empty());
    assert!(decision.rejection_reasons().is_empty());
    assert_eq!(decision.documents.len(), 3);
    assert_eq!(decision.documents[0].source.as_deref(), Some("meldezettel.pdf"));
}

#[test]
fn rejects_with_two_distinct_months_and_a_duplicate() {
    let engine = DecisionEngine::new(EngineConfig::default());
    let docs = vec![
        meldezettel("Mustermann", "5020"),
        monatsrechnung("01.03.2024", "31.03.2024"),
        monatsrechnung("01.04.2024", "30.04.2024"),
        monatsrechnung("01.04.2024", "30.04.2024"),
    ];

    let decision = engine.evaluate(&max_mustermann(), &docs);

    assert!(!decision.approved);
    assert!(decision.residency.passed);
    assert_eq!(decision.invoices.path, InvoicePath::None);
    assert_eq!(decision.invoices.monthly_found, 3);
    assert_eq!(
        decision.invoices.distinct_months,
        vec![MonthKey { year: 2024, month: 3 }, MonthKey { year: 2024, month: 4 }]
    );
    assert!(
        decision
            .rejection_reasons()
            .contains(&"monthly invoices: 3 found, 2 distinct valid months (minimum 3)".to_string())
    );
}

#[test]
fn same_month_three_times_counts_once() {
    let engine = DecisionEngine::new(EngineConfig::default());
    let docs = vec![
        meldezettel("Mustermann", "5020"),
        monatsrechnung("01.05.2024", "31.05.2024"),
        monatsrechnung("01.05.2024", "31.05.2024"),
        monatsrechnung("01.05.2024", "31.05.2024"),
    ];

    let decision = engine.evaluate(&max_mustermann(), &docs);

    assert!(!decision.invoices.passed);
    assert_eq!(decision.invoices.distinct_month_count(), 1);
    assert!(decision.invoices.reasons.iter().any(|r| r.contains("1 distinct valid months")));
}

#[test]
fn six_month_annual_invoice_only_counts_as_monthly() {
    let engine = DecisionEngine::new(EngineConfig::default());
    let short_annual = ExtractedDocument::new(
        DocumentType::AnnualInvoice,
        0.8,
        "Rechnung\nKarteninhaber: Max Mustermann\nGültigkeitszeitraum: 01.01.2024 - 31.12.2024\n\
         Leistungszeitraum: 01.01.2024 - 30.06.2024",
    );
    let docs = vec![
        meldezettel("Mustermann", "5020"),
        short_annual,
        zahlungsbestaetigung(),
        monatsrechnung("01.08.2024", "31.08.2024"),
    ];

    let decision = engine.evaluate(&max_mustermann(), &docs);

    let audit = &decision.documents[1];
    assert_eq!(audit.classified_as, DocumentType::AnnualInvoice);
    assert_eq!(audit.validated_as, DocumentType::MonthlyInvoice);
    assert_eq!(audit.results[0].document_type, DocumentType::MonthlyInvoice);

    assert_eq!(decision.invoices.annual_found, 0);
    assert!(decision.invoices.payment_valid);
    assert_eq!(decision.invoices.monthly_found, 2);
    assert_eq!(decision.invoices.distinct_month_count(), 2);
    assert!(!decision.approved);
}

#[test]
fn postal_code_ineligible_versus_mismatch() {
    let engine = DecisionEngine::new(EngineConfig::default());

    let mut linz = max_mustermann();
    linz.postal_code = "4020".to_string();
    let decision = engine.evaluate(&linz, &[meldezettel("Mustermann", "4020")]);
    let check = decision.residency.result.as_ref().unwrap().check(CheckKind::PostalCode).unwrap();
    assert_eq!(check.failure, Some(MatchFailure::Ineligible { code: "4020".to_string() }));

    let decision = engine.evaluate(&max_mustermann(), &[meldezettel("Mustermann", "5026")]);
    let check = decision.residency.result.as_ref().unwrap().check(CheckKind::PostalCode).unwrap();
    assert!(matches!(check.failure, Some(MatchFailure::Mismatch { .. })));
    assert!(decision.residency.reasons.contains(
        &"residency certificate: postal code: mismatch (document: '5026', application: '5020')".to_string()
    ));
}

#[test]
fn double_surname_requires_every_token() {
    let engine = DecisionEngine::new(EngineConfig::default());
    let mut applicant = max_mustermann();
    applicant.surname = "Müller-Schmidt".to_string();

    let decision = engine.evaluate(&applicant, &[meldezettel("Schmidt", "5020")]);
    assert!(!decision.residency.passed);

    let decision = engine.evaluate(&applicant, &[meldezettel("Müller Schmidt", "5020")]);
    assert!(decision.residency.passed, "{:?}", decision.residency.reasons);
}

#[test]
fn confidence_does_not_gate() {
    let engine = DecisionEngine::new(EngineConfig::default());
    let mut weak = jahresrechnung();
    weak.confidence = 0.05;
    let docs = vec![meldezettel("Mustermann", "5020"), weak, zahlungsbestaetigung()];

    let decision = engine.evaluate(&max_mustermann(), &docs);
    assert!(decision.approved);
    assert_eq!(decision.documents[1].confidence, 0.05);
}

#[test]
fn incomplete_form_is_fatal() {
    let engine = DecisionEngine::default();
    let form = ApplicationForm {
        vorname: Some("Max".to_string()),
        familienname: Some("Mustermann".to_string()),
        ..Default::default()
    };

    let err = engine.evaluate_form(&form, &[]).unwrap_err();
    assert!(matches!(
        err,
        SubsidyError::Application(ApplicationError::MissingField(ref field)) if field == "geburtsdatum"
    ));
}

#[test]
fn decision_serializes_to_json() {
    let engine = DecisionEngine::default();
    let decision = engine.evaluate(&max_mustermann(), &[meldezettel("Mustermann", "5020")]);

    let json = serde_json::to_value(&decision).unwrap();
    assert_eq!(json["approved"], false);
    assert_eq!(json["residency"]["passed"], true);
    assert_eq!(json["invoices"]["path"], "none");
    assert_eq!(json["documents"][0]["classified_as"], "residency_certificate");
}
