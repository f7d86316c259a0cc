//! Progress-callback trait for per-document analysis events.
//!
//! Inject an [`Arc<dyn AnalysisProgressCallback>`] via
//! [`crate::config::AnalyzerConfigBuilder::progress_callback`] to receive
//! events as each document is extracted and analysed. The CLI uses it to
//! drive a spinner; library callers can forward events wherever they like.
//!
//! All methods have default no-op implementations so callers only override
//! what they care about.

use std::path::Path;
use std::sync::Arc;

/// Called by the analysis pipeline as it works through a batch.
pub trait AnalysisProgressCallback: Send + Sync {
    /// Called before a document is validated and extracted.
    fn on_document_start(&self, path: &Path, index: usize, total: usize) {
        let _ = (path, index, total);
    }

    /// Called once extraction finished, before any LLM call.
    fn on_extracted(&self, path: &Path, pages: usize, images: usize) {
        let _ = (path, pages, images);
    }

    /// Called when the structured text analysis returned.
    fn on_text_analyzed(&self, path: &Path) {
        let _ = path;
    }

    /// Called after each image analysis attempt; `error` is `None` on success.
    ///
    /// `image_num` is 1-indexed.
    fn on_image_analyzed(&self, path: &Path, image_num: usize, total_images: usize, error: Option<&str>) {
        let _ = (path, image_num, total_images, error);
    }

    /// Called once per document with the final outcome.
    fn on_document_complete(&self, path: &Path, error: Option<&str>) {
        let _ = (path, error);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl AnalysisProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::AnalyzerConfig`].
pub type ProgressCallback = Arc<dyn AnalysisProgressCallback>;
