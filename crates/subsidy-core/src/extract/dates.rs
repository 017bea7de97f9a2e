//! Date parsing for application forms and OCR text.

use chrono::{NaiveDate, NaiveDateTime};
use regex::Match;

use crate::error::ExtractionError;
use crate::text::normalize;

use super::patterns::{DATE_MONTH_NAME, DATE_NUMERIC};

/// Timestamp formats exported by the application form system.
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];

/// Plain date formats, tried in order after OCR repair.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d.%m.%Y", "%Y.%m.%d", "%d/%m/%Y", "%d-%m-%Y"];

/// Parse a date from a form field or an OCR fragment.
///
/// Empty input is [`ExtractionError::NotFound`]; anything else that does not
/// parse is [`ExtractionError::Unreadable`].
pub fn parse_date(field: &str, raw: &str) -> Result<NaiveDate, ExtractionError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ExtractionError::not_found(field));
    }

    for format in DATETIME_FORMATS {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(datetime.date());
        }
    }

    let cleaned = repair_ocr_digits(trimmed);
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(&cleaned, format).ok())
        .ok_or_else(|| ExtractionError::unreadable(field, trimmed))
}

/// Undo common OCR confusions in a numeric date.
///
/// Whitespace is dropped, commas become dots, and `O`/`o`/`l`/`I` become
/// digits when next to a digit or a dot. If the whole string consists of
/// digits, separators and confusable letters, every confusable is replaced.
fn repair_ocr_digits(raw: &str) -> String {
    let chars: Vec<char> = raw
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if c == ',' { '.' } else { c })
        .collect();

    let date_like = chars
        .iter()
        .all(|&c| c.is_ascii_digit() || ocr_digit(c).is_some() || matches!(c, '.' | '-' | '/'));

    chars
        .iter()
        .enumerate()
        .map(|(i, &c)| {
            let Some(digit) = ocr_digit(c) else {
                return c;
            };
            let near_digit = [i.checked_sub(1), Some(i + 1)]
                .into_iter()
                .flatten()
                .filter_map(|j| chars.get(j))
                .any(|&n| n.is_ascii_digit() || n == '.');
            if date_like || near_digit { digit } else { c }
        })
        .collect()
}

fn ocr_digit(c: char) -> Option<char> {
    match c {
        'O' | 'o' => Some('0'),
        'l' | 'I' => Some('1'),
        _ => None,
    }
}

/// Parse a German month-name date such as `21. Dez 2024` or `1. Jänner 2025`.
pub fn parse_month_name_date(raw: &str) -> Option<NaiveDate> {
    let caps = DATE_MONTH_NAME.captures(raw)?;
    let day: u32 = caps[1].parse().ok()?;
    let month = german_month_to_number(&caps[2])?;
    let year: i32 = caps[3].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Month number for a German (or English) three-letter abbreviation.
fn german_month_to_number(abbrev: &str) -> Option<u32> {
    let key = normalize(abbrev);
    let month = match key.as_str() {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "mai" | "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "okt" | "oct" => 10,
        "nov" => 11,
        "dez" | "dec" => 12,
        _ => return None,
    };
    Some(month)
}

/// How dates are written in the text being searched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateStyle {
    /// `01.04.2023`, with OCR noise tolerated.
    Numeric,
    /// `21. Dez 2024`
    MonthName,
}

/// Date field extractor.
pub struct DateExtractor {
    style: DateStyle,
}

impl DateExtractor {
    pub fn new(style: DateStyle) -> Self {
        Self { style }
    }

    pub fn style(&self) -> DateStyle {
        self.style
    }

    /// Date-shaped fragments in `text`, readable or not.
    pub fn raw_matches<'t>(&self, text: &'t str) -> Vec<Match<'t>> {
        match self.style {
            DateStyle::Numeric => DATE_NUMERIC.find_iter(text).collect(),
            DateStyle::MonthName => DATE_MONTH_NAME
                .captures_iter(text)
                .filter(|caps| german_month_to_number(&caps[2]).is_some())
                .filter_map(|caps| caps.get(0))
                .collect(),
        }
    }

    /// Parse one fragment returned by [`Self::raw_matches`].
    pub fn parse(&self, field: &str, raw: &str) -> Result<NaiveDate, ExtractionError> {
        match self.style {
            DateStyle::Numeric => parse_date(field, raw),
            DateStyle::MonthName => {
                parse_month_name_date(raw).ok_or_else(|| ExtractionError::unreadable(field, raw.trim()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_form_formats() {
        assert_eq!(parse_date("gilt_von", "2024-01-01").unwrap(), ymd(2024, 1, 1));
        assert_eq!(parse_date("gilt_von", "2024-01-01 00:00:00").unwrap(), ymd(2024, 1, 1));
        assert_eq!(parse_date("gilt_bis", "2024-12-31T00:00:00").unwrap(), ymd(2024, 12, 31));
        assert_eq!(parse_date("x", "2024.03.15").unwrap(), ymd(2024, 3, 15));
        assert_eq!(parse_date("x", "15/03/2024").unwrap(), ymd(2024, 3, 15));
    }

    #[test]
    fn test_parse_ocr_noise() {
        assert_eq!(parse_date("Geburtsdatum", "O1.O1.1990").unwrap(), ymd(1990, 1, 1));
        assert_eq!(parse_date("Geburtsdatum", "01,01,1990").unwrap(), ymd(1990, 1, 1));
        assert_eq!(parse_date("Geburtsdatum", "01 .01. 1990").unwrap(), ymd(1990, 1, 1));
        assert_eq!(parse_date("Geburtsdatum", "3l.l2.2024").unwrap(), ymd(2024, 12, 31));
    }

    #[test]
    fn test_parse_failures_are_classified() {
        assert_eq!(
            parse_date("Geburtsdatum", "  "),
            Err(ExtractionError::not_found("Geburtsdatum"))
        );
        assert_eq!(
            parse_date("Geburtsdatum", "32.13.1990"),
            Err(ExtractionError::unreadable("Geburtsdatum", "32.13.1990"))
        );
        assert!(parse_date("Geburtsdatum", "unbekannt").is_err());
    }

    #[test]
    fn test_month_name_dates() {
        assert_eq!(parse_month_name_date("21. Dez 2024"), Some(ymd(2024, 12, 21)));
        assert_eq!(parse_month_name_date("1. Jän 2025"), Some(ymd(2025, 1, 1)));
        assert_eq!(parse_month_name_date("3. März 2025"), Some(ymd(2025, 3, 3)));
        assert_eq!(parse_month_name_date("12. Stock 2024"), None);
    }

    #[test]
    fn test_extractor_skips_unknown_months() {
        let extractor = DateExtractor::new(DateStyle::MonthName);
        let raw: Vec<&str> = extractor
            .raw_matches("gilt 27. Dez 2024 - 26. Dez 2025, 12. Stock 2024")
            .iter()
            .map(|m| m.as_str())
            .collect();
        assert_eq!(raw, vec!["27. Dez 2024", "26. Dez 2025"]);
    }

    #[test]
    fn test_numeric_extractor() {
        let extractor = DateExtractor::new(DateStyle::Numeric);
        let raw = extractor.raw_matches("von 01.04.2023 bis 3O.O4.2023");
        assert_eq!(raw.len(), 2);
        assert_eq!(raw[1].as_str(), "3O.O4.2023");
        assert_eq!(extractor.parse("validity", raw[1].as_str()).unwrap(), ymd(2023, 4, 30));
    }
}
