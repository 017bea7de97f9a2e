//! Text normalization for comparing OCR output with applicant data.
//!
//! Every comparison in the matchers goes through these functions. Raw text is
//! never compared directly.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Case-folded, ASCII-folded text with single spaces between words.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NormalizedText(String);

impl NormalizedText {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whitespace-separated tokens.
    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.0.split(' ').filter(|t| !t.is_empty())
    }

    pub fn compact(&self) -> CompactText {
        compact(&self.0)
    }
}

impl fmt::Display for NormalizedText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Text with every whitespace character removed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompactText(String);

impl CompactText {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn contains(&self, needle: &str) -> bool {
        !needle.is_empty() && self.0.contains(needle)
    }
}

impl fmt::Display for CompactText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Normalize text for matching.
///
/// Lowercases, maps `ß` to `ss`, strips diacritics, treats `-`, `_` and `/`
/// as word separators, drops other punctuation and collapses whitespace.
///
/// `"Müller-Schmidt"` becomes `"muller schmidt"`.
pub fn normalize(text: &str) -> NormalizedText {
    let mut out = String::with_capacity(text.len());

    for ch in text.chars().flat_map(char::to_lowercase) {
        match ch {
            'a'..='z' | '0'..='9' => out.push(ch),
            'ß' => out.push_str("ss"),
            'æ' => out.push_str("ae"),
            'œ' => out.push_str("oe"),
            _ => match fold_diacritic(ch) {
                Some(base) => out.push(base),
                None => out.push(' '),
            },
        }
    }

    NormalizedText(out.split_whitespace().collect::<Vec<_>>().join(" "))
}

/// Remove all whitespace.
///
/// Used where OCR dropped or inserted spaces: `"Max Michael"` and
/// `"MaxMichael"` compact to the same value.
pub fn compact(text: &str) -> CompactText {
    CompactText(text.chars().filter(|c| !c.is_whitespace()).collect())
}

/// Plausible German transliterations of a single name token.
///
/// `"Jörg"` yields `{"jorg", "joerg"}`; an already spelled-out `"Joerg"`
/// yields the same set. All variants are normalized.
pub fn umlaut_variants(token: &str) -> BTreeSet<String> {
    let lower = token.to_lowercase();
    let mut variants = BTreeSet::new();

    let folded = normalize(&lower).0;
    variants.insert(folded.clone());

    let spelled_out = lower
        .replace('ä', "ae")
        .replace('ö', "oe")
        .replace('ü', "ue");
    variants.insert(normalize(&spelled_out).0);

    variants.insert(
        folded
            .replace("ae", "a")
            .replace("oe", "o")
            .replace("ue", "u"),
    );

    variants.retain(|v| !v.is_empty());
    variants
}

fn fold_diacritic(ch: char) -> Option<char> {
    let base = match ch {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' | 'ă' | 'ą' => 'a',
        'ç' | 'ć' | 'ĉ' | 'č' => 'c',
        'ď' | 'đ' => 'd',
        'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ė' | 'ę' | 'ě' => 'e',
        'ğ' | 'ĝ' => 'g',
        'ì' | 'í' | 'î' | 'ï' | 'ī' | 'į' | 'ı' => 'i',
        'ĺ' | 'ľ' | 'ł' => 'l',
        'ñ' | 'ń' | 'ň' => 'n',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'ō' | 'ő' => 'o',
        'ŕ' | 'ř' => 'r',
        'ś' | 'š' | 'ş' | 'ș' => 's',
        'ť' | 'ţ' | 'ț' => 't',
        'ù' | 'ú' | 'û' | 'ü' | 'ū' | 'ů' | 'ű' | 'ų' => 'u',
        'ý' | 'ÿ' => 'y',
        'ź' | 'ż' | 'ž' => 'z',
        _ => return None,
    };
    Some(base)
}
