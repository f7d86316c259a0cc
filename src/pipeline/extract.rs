//! PDF extraction: per-page text, embedded images and metadata via pdfium.
//!
//! ## Why spawn_blocking?
//!
//! The `pdfium-render` crate wraps the pdfium C++ library, which uses
//! thread-local state internally and is not safe to call from async contexts.
//! `tokio::task::spawn_blocking` moves the work onto a dedicated thread pool
//! thread designed for blocking operations.
//!
//! ## Failure policy
//!
//! A page whose text layer cannot be read contributes an empty string; an
//! image that cannot be decoded or re-encoded is logged and skipped. Only a
//! document that pdfium cannot open at all is an error.

use crate::error::AnalyzerError;
use crate::output::{DocumentContent, DocumentMetadata};
use crate::pipeline::encode::encode_jpeg;
use pdfium_render::prelude::*;
use std::path::Path;
use tracing::{debug, error, info};

/// Environment variable naming an explicit pdfium library to load.
pub const PDFIUM_LIB_PATH_ENV: &str = "PDFIUM_LIB_PATH";

/// Bind to pdfium: `PDFIUM_LIB_PATH`, then the working directory, then the system library.
pub fn bind_pdfium() -> Result<Pdfium, AnalyzerError> {
    let bindings = match std::env::var(PDFIUM_LIB_PATH_ENV) {
        Ok(path) if !path.is_empty() => Pdfium::bind_to_library(&path),
        _ => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library()),
    }
    .map_err(|e| AnalyzerError::PdfiumBindingFailed(format!("{e:?}")))?;

    Ok(Pdfium::new(bindings))
}

/// Extract text, images (when `with_images`) and metadata from a PDF.
pub async fn extract_pdf_content(
    pdf_path: &Path,
    with_images: bool,
) -> Result<DocumentContent, AnalyzerError> {
    let path = pdf_path.to_path_buf();
    tokio::task::spawn_blocking(move || extract_blocking(&path, with_images))
        .await
        .map_err(|e| AnalyzerError::Internal(format!("Extraction task panicked: {}", e)))?
}

/// Extract document metadata only.
pub async fn extract_metadata(pdf_path: &Path) -> Result<DocumentMetadata, AnalyzerError> {
    let path = pdf_path.to_path_buf();
    tokio::task::spawn_blocking(move || {
        let pdfium = bind_pdfium()?;
        let document = open_document(&pdfium, &path)?;
        Ok(read_metadata(&document))
    })
    .await
    .map_err(|e| AnalyzerError::Internal(format!("Metadata task panicked: {}", e)))?
}

fn open_document<'a>(pdfium: &'a Pdfium, path: &Path) -> Result<PdfDocument<'a>, AnalyzerError> {
    pdfium
        .load_pdf_from_file(path, None)
        .map_err(|e| AnalyzerError::CorruptPdf {
            path: path.to_path_buf(),
            detail: format!("{:?}", e),
        })
}

/// Blocking implementation of content extraction.
fn extract_blocking(pdf_path: &Path, with_images: bool) -> Result<DocumentContent, AnalyzerError> {
    let pdfium = bind_pdfium()?;
    let document = open_document(&pdfium, pdf_path)?;
    let metadata = read_metadata(&document);
    info!("PDF loaded: {} pages", metadata.pages);

    let mut text = Vec::with_capacity(metadata.pages);
    let mut images = Vec::new();

    for (idx, page) in document.pages().iter().enumerate() {
        let page_num = idx + 1;

        let page_text = match page.text() {
            Ok(t) => t.all(),
            Err(e) => {
                error!("Error extracting text from page {}: {:?}", page_num, e);
                String::new()
            }
        };
        debug!("Page {}: {} chars of text", page_num, page_text.len());
        text.push(page_text);

        if !with_images {
            continue;
        }

        for object in page.objects().iter() {
            let Some(image_object) = object.as_image_object() else {
                continue;
            };
            let encoded = image_object
                .get_raw_image()
                .map_err(|e| format!("{:?}", e))
                .and_then(|img| encode_jpeg(&img).map_err(|e| e.to_string()));
            match encoded {
                Ok(bytes) => images.push(bytes),
                Err(e) => error!("Error processing image on page {}: {}", page_num, e),
            }
        }
    }

    info!(
        "Extracted {} pages of text and {} images from {}",
        text.len(),
        images.len(),
        pdf_path.display()
    );

    Ok(DocumentContent {
        text,
        images,
        metadata,
    })
}

fn read_metadata(document: &PdfDocument) -> DocumentMetadata {
    let metadata = document.metadata();
    let get_meta = |tag: PdfDocumentMetadataTagType| -> String {
        metadata
            .get(tag)
            .map(|t| t.value().to_string())
            .unwrap_or_default()
    };

    DocumentMetadata {
        pages: document.pages().len() as usize,
        title: get_meta(PdfDocumentMetadataTagType::Title),
        author: get_meta(PdfDocumentMetadataTagType::Author),
        subject: get_meta(PdfDocumentMetadataTagType::Subject),
    }
}
