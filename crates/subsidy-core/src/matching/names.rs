//! Name comparison rules shared by all matchers.

use std::collections::BTreeSet;

use crate::text::{normalize, umlaut_variants, CompactText};

/// Normalized document text prepared for token lookups.
struct Haystack {
    tokens: BTreeSet<String>,
    compact: CompactText,
}

impl Haystack {
    fn new(text: &str) -> Option<Self> {
        let norm = normalize(text);
        if norm.is_empty() {
            return None;
        }
        let tokens = norm.tokens().flat_map(umlaut_variants).collect();
        Some(Self {
            tokens,
            compact: norm.compact(),
        })
    }

    /// Token present as a word, or as a substring once spaces are gone.
    fn has(&self, token: &str) -> bool {
        umlaut_variants(token)
            .iter()
            .any(|variant| self.tokens.contains(variant) || self.compact.contains(variant))
    }
}

/// The applicant's first given name occurs in `document`.
///
/// Only the first token counts: "Max Michael" matches a certificate listing
/// just "Max".
pub fn first_name_matches(applicant: &str, document: &str) -> bool {
    let Some(first) = name_tokens(applicant).next() else {
        return false;
    };
    Haystack::new(document).is_some_and(|haystack| haystack.has(first))
}

/// Every token of the applicant's surname occurs in `document`.
///
/// "Müller-Schmidt" does not match a document that only says "Schmidt".
pub fn surname_matches(applicant: &str, document: &str) -> bool {
    if name_tokens(applicant).next().is_none() {
        return false;
    }
    Haystack::new(document)
        .is_some_and(|haystack| name_tokens(applicant).all(|token| haystack.has(token)))
}

/// Applicant name tokens with their original spelling, so that umlaut
/// variants can still be derived from them.
fn name_tokens(name: &str) -> impl Iterator<Item = &str> {
    name.split(|c: char| !c.is_alphanumeric()).filter(|t| !t.is_empty())
}

/// Both names occur somewhere in `window`.
pub fn full_name_matches(first_name: &str, surname: &str, window: &str) -> bool {
    first_name_matches(first_name, window) && surname_matches(surname, window)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_name_uses_first_token() {
        assert!(first_name_matches("Max Michael", "Max"));
        assert!(first_name_matches("Max", "MAX MICHAEL"));
        assert!(!first_name_matches("Moritz", "Max"));
        assert!(!first_name_matches("Max", ""));
    }

    #[test]
    fn test_umlaut_transliterations() {
        assert!(first_name_matches("Jörg", "Joerg"));
        assert!(first_name_matches("Joerg", "Jorg"));
        assert!(surname_matches("Müller", "Mueller"));
        assert!(surname_matches("Strauß", "Strauss"));
        assert!(surname_matches("Müller", "MaxMueller"));
    }

    #[test]
    fn test_compact_substring_for_missing_spaces() {
        assert!(first_name_matches("Bianca", "BiancaMaria"));
        assert!(surname_matches("Mustermann", "Karteninhaber:MaxMustermann"));
    }

    #[test]
    fn test_every_surname_token_required() {
        assert!(surname_matches("Müller-Schmidt", "Müller Schmidt"));
        assert!(surname_matches("Müller-Schmidt", "MUELLER-SCHMIDT"));
        assert!(!surname_matches("Müller-Schmidt", "Schmidt"));
        assert!(!surname_matches("", "Schmidt"));
    }

    #[test]
    fn test_full_name_in_window() {
        let window = "Karteninhaber Frau Bianca Maria Bogner geboren 15.10.1990";
        assert!(full_name_matches("Bianca", "Bogner", window));
        assert!(!full_name_matches("Bianca", "Huber", window));
    }
}
