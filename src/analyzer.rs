//! The analysis operations: text, image, query, and whole documents.
//!
//! Every call follows the same three steps:
//!
//! ```text
//! AnalysisRequest ──shape──▶ ChatPayload ──backoff(transport)──▶ raw text ──normalize──▶ AnalysisResult
//! ```
//!
//! The transport handle is passed in explicitly and shared read-only, so an
//! [`Analyzer`] can be cloned cheaply and tests can substitute their own
//! [`ChatTransport`].

use crate::config::AnalyzerConfig;
use crate::error::{AnalyzerError, CallError};
use crate::output::{DocumentAnalysis, DocumentContent, MetadataSummary, ProcessedDocument};
use crate::pipeline::backoff::execute_with_backoff;
use crate::pipeline::request::AnalysisRequest;
use crate::pipeline::response::{normalize, AnalysisResult};
use crate::transport::{ChatTransport, LlmTransport};
use serde_json::{Map, Value};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Runs analysis requests against a transport.
#[derive(Clone)]
pub struct Analyzer {
    transport: Arc<dyn ChatTransport>,
    config: AnalyzerConfig,
}

impl std::fmt::Debug for Analyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Analyzer")
            .field("transport", &"<dyn ChatTransport>")
            .field("config", &self.config)
            .finish()
    }
}

impl Analyzer {
    pub fn new(transport: Arc<dyn ChatTransport>, config: AnalyzerConfig) -> Self {
        Self { transport, config }
    }

    /// Build an analyzer over the provider named in `config`.
    ///
    /// Fails when the provider's credential is not set.
    pub fn from_config(config: AnalyzerConfig) -> Result<Self, AnalyzerError> {
        let transport = LlmTransport::from_config(&config)?;
        info!(
            "Using provider '{}' with model '{}'",
            config.provider_name, config.model
        );
        Ok(Self::new(Arc::new(transport), config))
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Shape, send with backoff, and normalise one request.
    pub async fn execute(&self, request: &AnalysisRequest) -> Result<AnalysisResult, CallError> {
        let payload = request.shape();
        let raw =
            execute_with_backoff(&self.config.retry, || self.transport.complete(&payload)).await?;
        debug!("{:?}: {} chars returned", payload.kind, raw.len());
        normalize(payload.response_shape, raw)
    }

    /// Structured analysis (`main_topics`, `key_points`, `summary`) of document text.
    pub async fn analyze_text(&self, text: &str) -> Result<Map<String, Value>, CallError> {
        let result = self
            .execute(&AnalysisRequest::TextAnalysis {
                text: text.to_string(),
            })
            .await?;
        expect_structured(result)
    }

    /// Free-text description of one image.
    pub async fn analyze_image(&self, image_bytes: &[u8]) -> Result<String, CallError> {
        let result = self
            .execute(&AnalysisRequest::ImageAnalysis {
                image_bytes: image_bytes.to_vec(),
            })
            .await?;
        expect_text(result)
    }

    /// Answer `query` using `context`.
    pub async fn query(&self, query: &str, context: &str) -> Result<String, CallError> {
        let result = self
            .execute(&AnalysisRequest::Query {
                query: query.to_string(),
                context: context.to_string(),
            })
            .await?;
        expect_text(result)
    }

    /// Answer `query` over a set of analysed documents.
    pub async fn query_documents(
        &self,
        query: &str,
        documents: &[ProcessedDocument],
    ) -> Result<String, CallError> {
        let context = prepare_query_context(documents);
        debug!("Query context: {} chars from {} documents", context.len(), documents.len());
        self.query(query, &context).await
    }

    /// Analyse extracted content: one text analysis, then one call per image.
    ///
    /// A failed text analysis aborts the document. A failed image is logged
    /// and skipped. Images are skipped entirely when `allow_images` is off.
    pub async fn analyze_document(
        &self,
        path: &Path,
        content: &DocumentContent,
    ) -> Result<DocumentAnalysis, AnalyzerError> {
        let callback = self.config.progress_callback.as_ref();

        let text_analysis = self
            .analyze_text(&content.joined_text())
            .await
            .map_err(|source| AnalyzerError::TextAnalysisFailed { source })?;
        if let Some(cb) = callback {
            cb.on_text_analyzed(path);
        }

        let mut image_analyses = Vec::new();
        if self.config.allow_images {
            let total = content.images.len();
            for (idx, image) in content.images.iter().enumerate() {
                match self.analyze_image(image).await {
                    Ok(description) => {
                        if let Some(cb) = callback {
                            cb.on_image_analyzed(path, idx + 1, total, None);
                        }
                        image_analyses.push(description);
                    }
                    Err(e) => {
                        error!("Error analyzing image {}/{}: {}", idx + 1, total, e);
                        if let Some(cb) = callback {
                            cb.on_image_analyzed(path, idx + 1, total, Some(&e.to_string()));
                        }
                    }
                }
            }
        }

        Ok(DocumentAnalysis {
            text_analysis,
            image_analyses,
            metadata_analysis: MetadataSummary::from(&content.metadata),
        })
    }
}

fn expect_structured(result: AnalysisResult) -> Result<Map<String, Value>, CallError> {
    match result {
        AnalysisResult::Structured(map) => Ok(map),
        AnalysisResult::Text(raw) => Err(CallError::MalformedResponse {
            detail: "expected a structured result, got free text".into(),
            raw,
        }),
    }
}

fn expect_text(result: AnalysisResult) -> Result<String, CallError> {
    match result {
        AnalysisResult::Text(text) => Ok(text),
        AnalysisResult::Structured(map) => Err(CallError::MalformedResponse {
            detail: "expected free text, got a structured result".into(),
            raw: Value::Object(map).to_string(),
        }),
    }
}

/// Build the query context from analysed documents.
///
/// Per document: its file name, the pretty-printed text analysis, and any
/// image descriptions, one item per line.
pub fn prepare_query_context(documents: &[ProcessedDocument]) -> String {
    let mut lines: Vec<String> = Vec::new();
    for doc in documents {
        lines.push(format!("Document: {}", doc.name()));
        lines.push("Text Analysis:".to_string());
        lines.push(
            serde_json::to_string_pretty(&doc.analysis.text_analysis)
                .unwrap_or_else(|_| "{}".to_string()),
        );
        if !doc.analysis.image_analyses.is_empty() {
            lines.push("Image Analyses:".to_string());
            lines.extend(doc.analysis.image_analyses.iter().cloned());
        }
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::DocumentMetadata;
    use serde_json::json;

    fn doc(name: &str, summary: &str, images: &[&str]) -> ProcessedDocument {
        let mut text_analysis = Map::new();
        text_analysis.insert("summary".into(), json!(summary));
        ProcessedDocument {
            path: format!("/tmp/{name}").into(),
            content: DocumentContent::default(),
            analysis: DocumentAnalysis {
                text_analysis,
                image_analyses: images.iter().map(|s| s.to_string()).collect(),
                metadata_analysis: MetadataSummary::from(&DocumentMetadata::default()),
            },
        }
    }

    #[test]
    fn context_lists_documents_and_images() {
        let ctx = prepare_query_context(&[
            doc("a.pdf", "First", &[]),
            doc("b.pdf", "Second", &["a chart", "a photo"]),
        ]);
        let expected = "Document: a.pdf\n\
Text Analysis:\n\
{\n  \"summary\": \"First\"\n}\n\
Document: b.pdf\n\
Text Analysis:\n\
{\n  \"summary\": \"Second\"\n}\n\
Image Analyses:\n\
a chart\n\
a photo";
        assert_eq!(ctx, expected);
    }

    #[test]
    fn empty_document_set_gives_empty_context() {
        assert_eq!(prepare_query_context(&[]), "");
    }

    #[test]
    fn shape_mismatch_is_malformed() {
        let err = expect_text(AnalysisResult::Structured(Map::new())).unwrap_err();
        assert!(matches!(err, CallError::MalformedResponse { .. }));
        let err = expect_structured(AnalysisResult::Text("hi".into())).unwrap_err();
        assert!(matches!(err, CallError::MalformedResponse { raw, .. } if raw == "hi"));
    }
}
