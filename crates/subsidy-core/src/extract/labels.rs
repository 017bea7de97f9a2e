//! Label/value extraction from residency certificates (Meldezettel).
//!
//! Certificates come out of OCR in several layouts:
//!
//! ```text
//! Vorname: Max                      inline
//! Vorname            Max            whitespace separated
//! Vorname:                          next line
//! Max
//! Familienname oder Nachname:       label block
//! Vorname:
//! Geburtsdatum:
//! Mustermann
//! Max
//! 01.01.1990
//! ```
//!
//! Labels are compared after normalization and also with whitespace removed,
//! since OCR splits words ("Staatsa ngehörig keit").

use chrono::NaiveDate;

use crate::error::ExtractionError;
use crate::models::{LabelConfig, LabelLayout};
use crate::text::{normalize, CompactText, NormalizedText};

use super::dates::parse_date;
use super::patterns::{COLUMN_GAP, POSTAL_CODE};
use super::{content_lines, ExtractionMatch};

type LabelKey = (NormalizedText, CompactText);

fn key_of(label: &str) -> LabelKey {
    let norm = normalize(label);
    let compact = norm.compact();
    (norm, compact)
}

/// Raw fields read from a residency certificate.
#[derive(Debug, Clone, PartialEq)]
pub struct ResidencyFields {
    pub first_name: Result<String, ExtractionError>,
    pub surname: Result<String, ExtractionError>,
    pub birthdate: Result<ExtractionMatch<NaiveDate>, ExtractionError>,
    pub postal_code: Result<String, ExtractionError>,
}

/// Extract all residency fields from certificate text.
pub fn extract_residency_fields(text: &str, config: &LabelConfig) -> ResidencyFields {
    let extractor = LabelExtractor::new(config);

    let birthdate = extractor
        .value_of(text, &config.birthdate)
        .and_then(|raw| {
            let date = parse_date("birthdate", &raw)?;
            Ok(ExtractionMatch::new(date, raw))
        });

    ResidencyFields {
        first_name: extractor.value_of(text, &config.first_name),
        surname: extractor.value_of(text, &config.surname),
        birthdate,
        postal_code: extractor.postal_code(text),
    }
}

/// Finds values next to configured labels.
pub struct LabelExtractor<'c> {
    config: &'c LabelConfig,
    known: Vec<LabelKey>,
}

impl<'c> LabelExtractor<'c> {
    pub fn new(config: &'c LabelConfig) -> Self {
        let known = config
            .known_labels
            .iter()
            .map(|label| key_of(label))
            .filter(|(norm, _)| !norm.is_empty())
            .collect();
        Self { config, known }
    }

    /// Value of the first label in `labels` that yields one.
    pub fn value_of(&self, text: &str, labels: &[String]) -> Result<String, ExtractionError> {
        let lines = content_lines(text);

        labels
            .iter()
            .map(|label| key_of(label))
            .filter(|(norm, _)| !norm.is_empty())
            .find_map(|label| self.find_value(&lines, &label))
            .ok_or_else(|| ExtractionError::not_found(labels.first().map_or("label", String::as_str)))
    }

    fn find_value(&self, lines: &[&str], label: &LabelKey) -> Option<String> {
        lines
            .iter()
            .enumerate()
            .filter(|(_, line)| matches_label(label_part(line), label))
            .find_map(|(i, _)| {
                self.config
                    .layouts
                    .iter()
                    .find_map(|layout| self.apply_layout(*layout, lines, i, label))
            })
    }

    fn apply_layout(
        &self,
        layout: LabelLayout,
        lines: &[&str],
        i: usize,
        label: &LabelKey,
    ) -> Option<String> {
        let line = lines[i];
        match layout {
            LabelLayout::Inline => {
                let (_, right) = line.split_once(':')?;
                non_empty(right)
            }
            LabelLayout::WhitespaceSeparated => {
                let mut parts = COLUMN_GAP.split(line);
                let head = parts.next()?;
                if line.contains(':') || !matches_label(head, label) {
                    return None;
                }
                let value = parts.collect::<Vec<_>>().join(" ");
                non_empty(&value).filter(|v| !self.is_label_only(v))
            }
            LabelLayout::NextLine => {
                let key = label_only_key(line)?;
                if !is_exact(&key, label) {
                    return None;
                }
                let next = lines.get(i + 1)?;
                (!self.is_label_only(next)).then(|| next.to_string())
            }
            LabelLayout::LabelBlock => self.block_value(lines, i, label),
        }
    }

    /// Value for a label inside a block of labels followed by a block of
    /// values in the same order.
    fn block_value(&self, lines: &[&str], i: usize, label: &LabelKey) -> Option<String> {
        if !self.is_label_only(lines[i]) || !self.is_label_only(lines.get(i + 1)?) {
            return None;
        }

        let mut start = i;
        while start > 0 && self.is_label_only(lines[start - 1]) {
            start -= 1;
        }
        let mut end = i;
        while end < lines.len() && self.is_label_only(lines[end]) {
            end += 1;
        }

        let position = lines[start..end]
            .iter()
            .filter_map(|line| label_only_key(line))
            .position(|key| matches_label(key.0.as_str(), label))?;

        lines[end..]
            .iter()
            .filter(|line| !self.is_label_only(line))
            .nth(position)
            .map(|value| value.to_string())
    }

    /// True only for lines holding nothing but a known label.
    pub fn is_label_only(&self, line: &str) -> bool {
        label_only_key(line).is_some_and(|key| self.known.iter().any(|known| is_exact(&key, known)))
    }

    /// Postal code of the main residence: the first four-digit number at or
    /// after the first line mentioning the residence marker.
    pub fn postal_code(&self, text: &str) -> Result<String, ExtractionError> {
        let marker = key_of(&self.config.residence_marker);
        let lines = content_lines(text);

        let start = lines
            .iter()
            .position(|line| {
                let norm = normalize(line);
                norm.as_str().contains(marker.0.as_str()) || norm.compact().contains(marker.1.as_str())
            })
            .ok_or_else(|| ExtractionError::not_found(self.config.residence_marker.as_str()))?;

        lines[start..]
            .iter()
            .find_map(|line| POSTAL_CODE.captures(line).and_then(|caps| caps.get(1)))
            .map(|code| code.as_str().to_string())
            .ok_or_else(|| ExtractionError::not_found("postal code"))
    }
}

/// Part of a line left of the first colon, or the whole line.
fn label_part(line: &str) -> &str {
    line.split_once(':').map_or(line, |(left, _)| left)
}

/// Normalized label of a line that carries no value: `Vorname:` or `Vorname`.
fn label_only_key(line: &str) -> Option<LabelKey> {
    let label = match line.split_once(':') {
        Some((left, right)) if right.trim().is_empty() => left,
        Some(_) => return None,
        None => line,
    };
    let key = key_of(label);
    (!key.0.is_empty()).then_some(key)
}

fn is_exact(key: &LabelKey, label: &LabelKey) -> bool {
    key.0 == label.0 || key.1 == label.1
}

/// Equal, containing, or equal/containing once whitespace is removed.
fn matches_label(text: &str, label: &LabelKey) -> bool {
    let (norm, compact) = key_of(text);
    if norm.is_empty() {
        return false;
    }
    norm == label.0
        || norm.as_str().contains(label.0.as_str())
        || compact.contains(label.1.as_str())
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}
