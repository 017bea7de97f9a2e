//! Case directory loading.
//!
//! A case directory holds the application form (`antrag.json`), the
//! supporting documents, and optionally a classifier manifest
//! (`documents.json`):
//!
//! ```json
//! [{ "file": "meldezettel.pdf", "type": "meldezettel", "confidence": 0.97 }]
//! ```
//!
//! Without a manifest, every `.pdf` and `.txt` file is loaded in name order
//! and classified by keyword.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;
use tracing::{debug, info};

use subsidy_core::{
    load_document, ApplicationForm, DocumentClassifier, DocumentType, EngineConfig, ExtractedDocument,
    KeywordClassifier, SubsidyError, TextSource,
};

pub const FORM_FILE: &str = "antrag.json";
pub const MANIFEST_FILE: &str = "documents.json";

/// One document entry of `documents.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct ManifestEntry {
    pub file: PathBuf,
    #[serde(default, rename = "type")]
    pub document_type: Option<String>,
    #[serde(default)]
    pub confidence: Option<f32>,
}

/// Uses the manifest's classification when present, keywords otherwise.
struct ManifestClassifier<'a> {
    entry: &'a ManifestEntry,
    fallback: &'a KeywordClassifier,
}

impl DocumentClassifier for ManifestClassifier<'_> {
    fn classify(&self, text: &str) -> (DocumentType, f32) {
        match &self.entry.document_type {
            Some(kind) => {
                let kind: DocumentType = kind.parse().unwrap_or_default();
                (kind, self.entry.confidence.unwrap_or(1.0))
            }
            None => self.fallback.classify(text),
        }
    }
}

/// Reads `.txt` files as they are and `.pdf` files through `pdf-extract`.
pub struct FileTextSource;

impl TextSource for FileTextSource {
    fn text_of(&self, path: &Path) -> subsidy_core::Result<String> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match extension.as_str() {
            "txt" => Ok(fs::read_to_string(path)?),
            "pdf" => {
                let data = fs::read(path)?;
                let text = pdf_text(&data)
                    .map_err(|e| SubsidyError::Source(format!("{}: {}", path.display(), e)))?;
                if text.trim().is_empty() {
                    return Err(SubsidyError::Source(format!(
                        "{}: no text layer (scanned PDFs need OCR first)",
                        path.display()
                    )));
                }
                Ok(text)
            }
            _ => Err(SubsidyError::Source(format!(
                "{}: unsupported file format '{}'",
                path.display(),
                extension
            ))),
        }
    }
}

/// Text layer of a PDF, one form feed between pages.
fn pdf_text(data: &[u8]) -> Result<String, pdf_extract::OutputError> {
    let pages = pdf_extract::extract_text_from_mem_by_pages(data)?;
    debug!("Extracted {} PDF pages", pages.len());
    Ok(pages.join("\u{000C}"))
}

/// A loaded case: form and documents, not yet evaluated.
pub struct Case {
    pub name: String,
    pub form: ApplicationForm,
    pub documents: Vec<ExtractedDocument>,
}

/// Load the form and all documents of a case directory.
pub fn load_case(dir: &Path) -> anyhow::Result<Case> {
    if !dir.is_dir() {
        anyhow::bail!("Case directory not found: {}", dir.display());
    }

    let form_path = dir.join(FORM_FILE);
    let form_text = fs::read_to_string(&form_path)
        .with_context(|| format!("Cannot read {}", form_path.display()))?;
    let form: ApplicationForm = serde_json::from_str(&form_text)
        .with_context(|| format!("Invalid application form {}", form_path.display()))?;

    let entries = manifest_entries(dir)?;
    let fallback = KeywordClassifier::new();
    let source = FileTextSource;

    let mut documents = Vec::with_capacity(entries.len());
    for entry in &entries {
        let path = dir.join(&entry.file);
        let classifier = ManifestClassifier {
            entry,
            fallback: &fallback,
        };
        let document = load_document(&path, &source, &classifier)
            .with_context(|| format!("Cannot load document {}", path.display()))?;
        documents.push(document);
    }

    let name = dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| dir.display().to_string());
    info!("Loaded case {} with {} documents", name, documents.len());

    Ok(Case {
        name,
        form,
        documents,
    })
}

fn manifest_entries(dir: &Path) -> anyhow::Result<Vec<ManifestEntry>> {
    let manifest_path = dir.join(MANIFEST_FILE);
    if manifest_path.exists() {
        let content = fs::read_to_string(&manifest_path)?;
        let entries: Vec<ManifestEntry> = serde_json::from_str(&content)
            .with_context(|| format!("Invalid manifest {}", manifest_path.display()))?;
        debug!("Manifest lists {} documents", entries.len());
        return Ok(entries);
    }

    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
            matches!(ext.to_lowercase().as_str(), "pdf" | "txt")
        })
        .collect();
    files.sort();

    Ok(files
        .into_iter()
        .filter_map(|path| path.file_name().map(PathBuf::from))
        .map(|file| ManifestEntry {
            file,
            document_type: None,
            confidence: None,
        })
        .collect())
}

/// Default configuration file location.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("subsidy")
        .join("config.json")
}

/// Configuration from `--config`, else the default file if it exists, else
/// built-in defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<EngineConfig> {
    if let Some(path) = config_path {
        return EngineConfig::from_file(Path::new(path))
            .with_context(|| format!("Cannot load configuration {path}"));
    }

    let default_path = default_config_path();
    if default_path.exists() {
        debug!("Using configuration {}", default_path.display());
        return Ok(EngineConfig::from_file(&default_path)?);
    }
    Ok(EngineConfig::default())
}
