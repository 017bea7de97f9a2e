//! Common regex patterns for document field extraction.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Numeric dates with OCR noise: "01.04.2023", "01 .04.2023", "31.O3.2024", "15,10,1990"
    pub static ref DATE_NUMERIC: Regex = Regex::new(
        r"\b[\dOolI]{1,2}\s*[.,]\s*[\dOolI]{1,2}\s*[.,]\s*\d{4}\b"
    ).unwrap();

    // Service period: "01.03.2024 - 31.03.2024"
    pub static ref DATE_RANGE_NUMERIC: Regex = Regex::new(
        r"(\b[\dOolI]{1,2}\s*[.,]\s*[\dOolI]{1,2}\s*[.,]\s*\d{4}\b)\s*[-–]\s*(\b[\dOolI]{1,2}\s*[.,]\s*[\dOolI]{1,2}\s*[.,]\s*\d{4}\b)"
    ).unwrap();

    // German month-name dates on payment confirmations: "21. Dez 2024", "1. Jänner 2025"
    pub static ref DATE_MONTH_NAME: Regex = Regex::new(
        r"(\d{1,2})\.\s*([A-Za-zÄÖÜäöü]{3})[A-Za-zäöü]*\.?\s*(\d{4})"
    ).unwrap();

    // Four-digit postal code not embedded in a date or a longer number
    pub static ref POSTAL_CODE: Regex = Regex::new(
        r"(?:^|[^\d.,/])(\d{4})(?:[^\d.,/]|$)"
    ).unwrap();

    // Label and value separated by a run of spaces or a tab
    pub static ref COLUMN_GAP: Regex = Regex::new(
        r"\s{2,}|\t"
    ).unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_date_tolerates_ocr_noise() {
        assert!(DATE_NUMERIC.is_match("01 .04.2023"));
        assert!(DATE_NUMERIC.is_match("31.O3.2024"));
        assert!(DATE_NUMERIC.is_match("15,10,1990"));
        assert!(!DATE_NUMERIC.is_match("Rechnung 2024"));
    }

    #[test]
    fn test_postal_code_skips_dates() {
        let caps = POSTAL_CODE.captures("seit 01.01.2020 in 5020 Salzburg").unwrap();
        assert_eq!(&caps[1], "5020");
        assert!(POSTAL_CODE.captures("Zahl 123456").is_none());
    }

    #[test]
    fn test_range() {
        let caps = DATE_RANGE_NUMERIC.captures("Leistungszeitraum: 01.03.2024 - 31.03.2024").unwrap();
        assert_eq!(&caps[1], "01.03.2024");
        assert_eq!(&caps[2], "31.03.2024");
    }
}
