//! File-level entry points: validate, extract, analyse.
//!
//! Files are processed one at a time. A file that fails validation,
//! extraction, or text analysis is recorded in [`BatchOutcome::failures`]
//! and the batch moves on; only the caller decides whether an empty result
//! is fatal.

use crate::analyzer::Analyzer;
use crate::error::AnalyzerError;
use crate::output::{display_name, DocumentMetadata, ProcessedDocument};
use crate::pipeline::{extract, input};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{error, info};

/// Result of analysing a batch of files.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub processed: Vec<ProcessedDocument>,
    pub failures: Vec<(PathBuf, AnalyzerError)>,
}

impl BatchOutcome {
    pub fn is_empty(&self) -> bool {
        self.processed.is_empty()
    }
}

/// Split `paths` into valid PDFs and rejected inputs.
pub fn validate_inputs(
    paths: &[PathBuf],
    max_bytes: u64,
) -> (Vec<PathBuf>, Vec<(PathBuf, AnalyzerError)>) {
    let mut valid = Vec::with_capacity(paths.len());
    let mut rejected = Vec::new();
    for path in paths {
        match input::validate_pdf(path, max_bytes) {
            Ok(p) => valid.push(p),
            Err(e) => rejected.push((path.clone(), e)),
        }
    }
    (valid, rejected)
}

/// Validate, extract and analyse one PDF.
pub async fn analyze_file(
    path: impl AsRef<Path>,
    analyzer: &Analyzer,
) -> Result<ProcessedDocument, AnalyzerError> {
    let start = Instant::now();
    let config = analyzer.config();
    let path = input::validate_pdf(path.as_ref(), config.max_file_size_bytes())?;
    info!("Analyzing {}", path.display());

    let content = extract::extract_pdf_content(&path, config.allow_images).await?;
    if let Some(ref cb) = config.progress_callback {
        cb.on_extracted(&path, content.metadata.pages, content.images.len());
    }

    let analysis = analyzer.analyze_document(&path, &content).await?;
    info!(
        "Analyzed {}: {} pages, {}/{} images described, {}ms",
        display_name(&path),
        content.metadata.pages,
        analysis.image_analyses.len(),
        content.images.len(),
        start.elapsed().as_millis()
    );

    Ok(ProcessedDocument {
        path,
        content,
        analysis,
    })
}

/// Analyse each file in turn, continuing past failures.
pub async fn analyze_files(paths: &[PathBuf], analyzer: &Analyzer) -> BatchOutcome {
    let mut outcome = BatchOutcome::default();
    let callback = analyzer.config().progress_callback.clone();
    let total = paths.len();

    for (idx, path) in paths.iter().enumerate() {
        if let Some(ref cb) = callback {
            cb.on_document_start(path, idx + 1, total);
        }
        match analyze_file(path, analyzer).await {
            Ok(doc) => {
                if let Some(ref cb) = callback {
                    cb.on_document_complete(path, None);
                }
                outcome.processed.push(doc);
            }
            Err(e) => {
                error!("Error processing {}: {}", path.display(), e);
                if let Some(ref cb) = callback {
                    cb.on_document_complete(path, Some(&e.to_string()));
                }
                outcome.failures.push((path.clone(), e));
            }
        }
    }

    outcome
}

/// Extract PDF metadata without analysing content.
///
/// Does not require an LLM provider or API key.
pub async fn inspect(path: impl AsRef<Path>) -> Result<DocumentMetadata, AnalyzerError> {
    let path = input::validate_pdf(path.as_ref(), u64::MAX)?;
    extract::extract_metadata(&path).await
}
