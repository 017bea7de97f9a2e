//! Seams to the text extractor and document classifier.
//!
//! Neither is part of the engine: callers obtain text and a document type
//! through these traits and hand [`ExtractedDocument`] values to
//! [`crate::DecisionEngine::evaluate`].

use std::path::Path;

use tracing::debug;

use crate::error::Result;
use crate::models::{DocumentType, ExtractedDocument};
use crate::text::normalize;

/// Produces the plain text of a supporting document.
pub trait TextSource {
    /// Extract text from the document at `path`. Pages may be separated by
    /// form feeds.
    fn text_of(&self, path: &Path) -> Result<String>;
}

/// Assigns a document type to extracted text.
pub trait DocumentClassifier {
    /// Returns the type and a confidence between 0.0 and 1.0.
    fn classify(&self, text: &str) -> (DocumentType, f32);
}

/// Read and classify one document.
pub fn load_document(
    path: &Path,
    source: &dyn TextSource,
    classifier: &dyn DocumentClassifier,
) -> Result<ExtractedDocument> {
    let text = source.text_of(path)?;
    let (document_type, confidence) = classifier.classify(&text);
    debug!(path = %path.display(), %document_type, confidence, "Document classified");

    let mut document = ExtractedDocument::new(document_type, confidence, text);
    if let Some(name) = path.file_name() {
        document = document.with_source(name.to_string_lossy());
    }
    Ok(document)
}

/// Classifies by document title vocabulary.
///
/// A fallback for documents the model classifier did not label. Titles are
/// checked most specific first, since every invoice also says "Rechnung".
#[derive(Debug, Clone)]
pub struct KeywordClassifier {
    rules: Vec<(String, DocumentType)>,
    confidence: f32,
}

impl KeywordClassifier {
    pub fn new() -> Self {
        let rules = [
            ("meldebestatigung", DocumentType::ResidencyCertificate),
            ("meldezettel", DocumentType::ResidencyCertificate),
            ("zahlungsbestatigung", DocumentType::PaymentConfirmation),
            ("monatsrechnung", DocumentType::MonthlyInvoice),
            ("jahresrechnung", DocumentType::AnnualInvoice),
            ("rechnung", DocumentType::AnnualInvoice),
        ]
        .into_iter()
        .map(|(keyword, kind)| (keyword.to_string(), kind))
        .collect();

        Self {
            rules,
            confidence: 0.5,
        }
    }
}

impl Default for KeywordClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentClassifier for KeywordClassifier {
    fn classify(&self, text: &str) -> (DocumentType, f32) {
        let compact = normalize(text).compact();
        self.rules
            .iter()
            .find(|(keyword, _)| compact.contains(keyword))
            .map_or((DocumentType::Unknown, 0.0), |(_, kind)| (*kind, self.confidence))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SubsidyError;
    use pretty_assertions::assert_eq;

    struct InMemory(&'static str);

    impl TextSource for InMemory {
        fn text_of(&self, path: &Path) -> Result<String> {
            if path.ends_with("missing.pdf") {
                return Err(SubsidyError::Source(format!("cannot read {}", path.display())));
            }
            Ok(self.0.to_string())
        }
    }

    #[test]
    fn test_keyword_classifier() {
        let classifier = KeywordClassifier::new();
        assert_eq!(
            classifier.classify("MELDEBESTÄTIGUNG\nVorname: Max").0,
            DocumentType::ResidencyCertificate
        );
        assert_eq!(
            classifier.classify("Zahlungs bestätigung").0,
            DocumentType::PaymentConfirmation
        );
        assert_eq!(classifier.classify("Monatsrechnung März").0, DocumentType::MonthlyInvoice);
        assert_eq!(classifier.classify("Rechnung Nr. 17").0, DocumentType::AnnualInvoice);
        assert_eq!(classifier.classify("Lichtbildausweis"), (DocumentType::Unknown, 0.0));
    }

    #[test]
    fn test_load_document() {
        let source = InMemory("Monatsrechnung\nKarteninhaber: Max Mustermann");
        let doc = load_document(Path::new("case/rechnung_03.txt"), &source, &KeywordClassifier::new()).unwrap();
        assert_eq!(doc.document_type, DocumentType::MonthlyInvoice);
        assert_eq!(doc.source.as_deref(), Some("rechnung_03.txt"));

        let err = load_document(Path::new("case/missing.pdf"), &source, &KeywordClassifier::new());
        assert!(matches!(err, Err(SubsidyError::Source(_))));
    }
}
