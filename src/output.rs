//! Extraction and analysis result types.
//!
//! All types are `Serialize` so the CLI's `--json` mode can dump a whole
//! batch, and `Deserialize` so saved results can be reloaded for querying.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// Document-level metadata. Missing fields are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub pages: usize,
    pub title: String,
    pub author: String,
    pub subject: String,
}

/// Everything extracted from one PDF.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentContent {
    /// One entry per page, in page order. Pages without a text layer are empty.
    pub text: Vec<String>,
    /// Embedded images as JPEG bytes, in page order.
    #[serde(skip)]
    pub images: Vec<Vec<u8>>,
    pub metadata: DocumentMetadata,
}

impl DocumentContent {
    /// All page texts joined by newlines, as sent for text analysis.
    pub fn joined_text(&self) -> String {
        self.text.join("\n")
    }
}

/// Locally derived summary of [`DocumentMetadata`]; no API call involved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataSummary {
    pub summary: String,
    pub title: String,
    pub author: String,
    pub subject: String,
}

impl From<&DocumentMetadata> for MetadataSummary {
    fn from(meta: &DocumentMetadata) -> Self {
        Self {
            summary: format!("Document with {} pages", meta.pages),
            title: meta.title.clone(),
            author: meta.author.clone(),
            subject: meta.subject.clone(),
        }
    }
}

/// The LLM's view of one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentAnalysis {
    /// Structured analysis object (`main_topics`, `key_points`, `summary`, …).
    pub text_analysis: Map<String, Value>,
    /// One description per successfully analysed image.
    pub image_analyses: Vec<String>,
    pub metadata_analysis: MetadataSummary,
}

/// A document that made it through extraction and analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedDocument {
    pub path: PathBuf,
    pub content: DocumentContent,
    pub analysis: DocumentAnalysis,
}

impl ProcessedDocument {
    /// File name for display and query context; falls back to the full path.
    pub fn name(&self) -> String {
        display_name(&self.path)
    }
}

pub(crate) fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
