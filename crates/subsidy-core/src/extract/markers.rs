//! Marker-anchored windows over invoice text.
//!
//! Invoices have no stable layout, so values are searched in a window of
//! lines following a marker word such as `Karteninhaber` or `gilt`.

use crate::error::ExtractionError;
use crate::models::{DatePeriod, MarkerAnchor, MarkerWindow, WindowStrategy};
use crate::text::{compact, normalize, CompactText, NormalizedText};

use super::content_lines;
use super::dates::{DateExtractor, DateStyle};
use super::patterns::DATE_RANGE_NUMERIC;

/// Markers this short only match whole words.
const MIN_COMPACT_MARKER: usize = 6;

/// Searches the windows opened by one [`MarkerWindow`].
pub struct MarkerSearch<'w> {
    window: &'w MarkerWindow,
    markers: Vec<(NormalizedText, CompactText)>,
}

impl<'w> MarkerSearch<'w> {
    pub fn new(window: &'w MarkerWindow) -> Self {
        let markers = window
            .markers
            .iter()
            .map(|m| (normalize(m), compact(m)))
            .filter(|(norm, _)| !norm.is_empty())
            .collect();
        Self { window, markers }
    }

    fn is_marker_line(&self, line: &str) -> bool {
        let norm = normalize(line);
        let squeezed = norm.compact();
        let padded = format!(" {} ", norm.as_str());

        self.markers.iter().any(|(marker, marker_compact)| {
            let long = marker_compact.as_str().len() >= MIN_COMPACT_MARKER;
            match self.window.anchor {
                MarkerAnchor::Contains => {
                    padded.contains(&format!(" {} ", marker.as_str()))
                        || (long && squeezed.contains(marker_compact.as_str()))
                }
                MarkerAnchor::LineStart => {
                    padded.starts_with(&format!(" {} ", marker.as_str()))
                        || (long && squeezed.as_str().starts_with(marker_compact.as_str()))
                }
            }
        })
    }

    /// Text chunks to search, in order. Each chunk is a run of lines joined
    /// by a space; an empty result means no marker was found.
    pub fn windows(&self, text: &str) -> Vec<String> {
        let lines = content_lines(text);
        let mut chunks = Vec::new();

        for (i, line) in lines.iter().enumerate() {
            if !self.is_marker_line(line) {
                continue;
            }
            let end = (i + self.window.lines).min(lines.len());
            match self.window.strategy {
                WindowStrategy::Fixed => chunks.push(lines[i..end].join(" ")),
                WindowStrategy::Sliding { chunk } => {
                    for j in i..end {
                        let stop = (j + chunk.max(1)).min(lines.len());
                        chunks.push(lines[j..stop].join(" "));
                    }
                }
            }
        }

        chunks
    }
}

/// Read a start/end period from the windows opened by `window`.
///
/// The first chunk holding two readable dates wins. A chunk with two dates
/// that fail to parse is reported as unreadable only if no later chunk
/// succeeds.
pub fn extract_period(
    text: &str,
    window: &MarkerWindow,
    style: DateStyle,
    field: &str,
) -> Result<DatePeriod, ExtractionError> {
    let search = MarkerSearch::new(window);
    let chunks = search.windows(text);
    if chunks.is_empty() {
        return Err(ExtractionError::not_found(window.markers.join("/")));
    }

    let extractor = DateExtractor::new(style);
    let mut unreadable = None;

    for chunk in &chunks {
        let Some((start_raw, end_raw)) = date_pair(&extractor, chunk) else {
            continue;
        };
        match (extractor.parse(field, start_raw), extractor.parse(field, end_raw)) {
            (Ok(start), Ok(end)) => return Ok(DatePeriod::new(start, end)),
            (Err(err), _) | (_, Err(err)) => {
                unreadable.get_or_insert(err);
            }
        }
    }

    Err(unreadable.unwrap_or_else(|| ExtractionError::not_found(field)))
}

/// The two date fragments bounding a period. Numeric text prefers an explicit
/// `date - date` range over the first two dates.
fn date_pair<'t>(extractor: &DateExtractor, chunk: &'t str) -> Option<(&'t str, &'t str)> {
    if extractor.style() == DateStyle::Numeric {
        if let Some(caps) = DATE_RANGE_NUMERIC.captures(chunk) {
            return Some((caps.get(1)?.as_str(), caps.get(2)?.as_str()));
        }
    }

    let raw = extractor.raw_matches(chunk);
    match raw.as_slice() {
        [start, end, ..] => Some((start.as_str(), end.as_str())),
        _ => None,
    }
}
