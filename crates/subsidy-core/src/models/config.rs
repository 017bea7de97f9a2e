//! Configuration for extraction and decision rules.

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SubsidyError};

/// Main configuration for the decision engine.
///
/// Passed to [`crate::DecisionEngine::new`] and never modified afterwards, so
/// evaluations under different rule sets can run side by side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Postal codes whose residents are eligible for the subsidy.
    pub eligible_postal_codes: BTreeSet<String>,

    /// Annual invoices whose service period spans fewer months are treated
    /// as monthly invoices.
    pub reclassify_below_months: i32,

    /// Distinct valid billing months required for the monthly-invoice path.
    pub min_distinct_months: usize,

    /// Residency certificate labels and layouts.
    pub labels: LabelConfig,

    /// Invoice marker windows.
    pub markers: MarkerConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            eligible_postal_codes: [
                "5010", "5014", "5017", "5018", "5020", "5023", "5025", "5026", "5027", "5033",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            reclassify_below_months: 10,
            min_distinct_months: 3,
            labels: LabelConfig::default(),
            markers: MarkerConfig::default(),
        }
    }
}

/// Layouts in which a residency certificate pairs a label with its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelLayout {
    /// `Vorname: Max`
    Inline,
    /// `Vorname        Max`
    WhitespaceSeparated,
    /// `Vorname:` followed by `Max` on the next non-empty line.
    NextLine,
    /// A block of label lines followed by a block of values in the same order.
    LabelBlock,
}

/// Residency certificate label vocabulary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelConfig {
    /// Labels for the first-name field, including known OCR corruptions.
    pub first_name: Vec<String>,

    /// Labels for the surname field, most specific first.
    pub surname: Vec<String>,

    /// Labels for the birthdate field.
    pub birthdate: Vec<String>,

    /// Every personal-data label that may appear on its own line. Used to
    /// tell label blocks from value blocks.
    pub known_labels: Vec<String>,

    /// Marker of the main-residence section holding the postal code.
    pub residence_marker: String,

    /// Layouts to try, in order.
    pub layouts: Vec<LabelLayout>,
}

impl Default for LabelConfig {
    fn default() -> Self {
        let strings = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();

        Self {
            first_name: strings(&["Vorname", "Vomame"]),
            surname: strings(&["Familienname oder Nachname", "Familienname", "Nachname"]),
            birthdate: strings(&["Geburtsdatum"]),
            known_labels: strings(&[
                "Familienname",
                "Familienname oder Nachname",
                "Nachname",
                "Vorname",
                "Vomame",
                "Geschlecht",
                "Geburtsdatum",
                "Geburtsort",
                "Staatsangehörigkeit",
                "ZMR-Zahl",
            ]),
            residence_marker: "Hauptwohnsitz".to_string(),
            layouts: vec![
                LabelLayout::Inline,
                LabelLayout::WhitespaceSeparated,
                LabelLayout::NextLine,
                LabelLayout::LabelBlock,
            ],
        }
    }
}

/// Where a marker has to appear in a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerAnchor {
    /// Anywhere in the line.
    Contains,
    /// At the start of the line.
    LineStart,
}

/// How the lines after a marker are searched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WindowStrategy {
    /// One chunk: the marker line and the following lines, `lines` in total.
    Fixed,
    /// Slide a chunk of `chunk` lines over the `lines` lines from the marker;
    /// the first chunk yielding a value wins.
    Sliding { chunk: usize },
}

/// A marker and the window of lines searched after it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerWindow {
    /// Marker words; any of them opens a window.
    pub markers: Vec<String>,
    /// Window size in lines, marker line included.
    pub lines: usize,
    #[serde(default = "default_strategy")]
    pub strategy: WindowStrategy,
    #[serde(default = "default_anchor")]
    pub anchor: MarkerAnchor,
}

fn default_strategy() -> WindowStrategy {
    WindowStrategy::Fixed
}

fn default_anchor() -> MarkerAnchor {
    MarkerAnchor::Contains
}

impl MarkerWindow {
    pub fn fixed(markers: &[&str], lines: usize) -> Self {
        Self {
            markers: markers.iter().map(|s| s.to_string()).collect(),
            lines,
            strategy: WindowStrategy::Fixed,
            anchor: MarkerAnchor::Contains,
        }
    }

    pub fn sliding(mut self, chunk: usize) -> Self {
        self.strategy = WindowStrategy::Sliding { chunk };
        self
    }

    pub fn at_line_start(mut self) -> Self {
        self.anchor = MarkerAnchor::LineStart;
        self
    }
}

/// Marker windows for invoice-type documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerConfig {
    /// Card holder name on annual and monthly invoices.
    pub card_holder: MarkerWindow,

    /// Payer name on payment confirmations (`für Max Mustermann`).
    pub payer: MarkerWindow,

    /// Validity period on invoices.
    pub validity: MarkerWindow,

    /// Older invoice layouts state validity only as service period.
    pub validity_fallback: MarkerWindow,

    /// Validity period on payment confirmations (`gilt 27. Dez 2024 - ...`).
    pub payment_validity: MarkerWindow,

    /// Service (billing) period on invoices.
    pub service_period: MarkerWindow,
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self {
            card_holder: MarkerWindow::fixed(&["Karteninhaber"], 12),
            payer: MarkerWindow::fixed(&["für", "fuer"], 4),
            validity: MarkerWindow::fixed(
                &["Gültigkeitszeitraum", "Gültigkeit", "Gueltigkeitszeitraum", "Gueltigkeit"],
                80,
            ).sliding(3),
            validity_fallback: MarkerWindow::fixed(&["Leistungszeitraum"], 3).at_line_start(),
            payment_validity: MarkerWindow::fixed(&["gilt"], 3),
            service_period: MarkerWindow::fixed(&["Leistungszeitraum"], 5).at_line_start(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject rule sets under which no application could ever pass.
    pub fn validate(&self) -> Result<()> {
        if self.eligible_postal_codes.is_empty() {
            return Err(SubsidyError::Config("no eligible postal codes configured".to_string()));
        }
        if self.min_distinct_months == 0 {
            return Err(SubsidyError::Config("min_distinct_months must be at least 1".to_string()));
        }
        if self.labels.layouts.is_empty() {
            return Err(SubsidyError::Config("no label layouts configured".to_string()));
        }

        let markers = &self.markers;
        for (name, window) in [
            ("card_holder", &markers.card_holder),
            ("payer", &markers.payer),
            ("validity", &markers.validity),
            ("validity_fallback", &markers.validity_fallback),
            ("payment_validity", &markers.payment_validity),
            ("service_period", &markers.service_period),
        ] {
            if window.markers.is_empty() || window.lines == 0 {
                return Err(SubsidyError::Config(format!(
                    "marker window '{name}' needs at least one marker and one line"
                )));
            }
            if let WindowStrategy::Sliding { chunk: 0 } = window.strategy {
                return Err(SubsidyError::Config(format!(
                    "marker window '{name}' has an empty sliding chunk"
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.eligible_postal_codes.contains("5020"));
        assert_eq!(config.markers.card_holder.lines, 12);
        assert_eq!(config.markers.payer.lines, 4);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{ "eligible_postal_codes": ["1010"], "min_distinct_months": 2 }"#)
                .unwrap();
        assert_eq!(config.eligible_postal_codes.len(), 1);
        assert_eq!(config.min_distinct_months, 2);
        assert_eq!(config.reclassify_below_months, 10);
        assert_eq!(config.labels, LabelConfig::default());
    }

    #[test]
    fn test_marker_window_json() {
        let window: MarkerWindow = serde_json::from_str(
            r#"{ "markers": ["Karteninhaber"], "lines": 8, "strategy": { "kind": "sliding", "chunk": 2 } }"#,
        )
        .unwrap();
        assert_eq!(window.strategy, WindowStrategy::Sliding { chunk: 2 });
        assert_eq!(window.anchor, MarkerAnchor::Contains);
    }

    #[test]
    fn test_validate_rejects_empty_rules() {
        let mut config = EngineConfig::default();
        config.eligible_postal_codes.clear();
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.markers.payer.lines = 0;
        assert!(config.validate().is_err());
    }
}
