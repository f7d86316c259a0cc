//! # edgequake-pdf-analyzer
//!
//! Analyse PDF documents with Large Language Models: a structured analysis of
//! the text, a description of every embedded image, and free-form questions
//! answered over everything analysed so far.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input     existence, .pdf extension, size limit, %PDF magic
//!  ├─ 2. Extract   per-page text + embedded images + metadata (pdfium)
//!  ├─ 3. Text      one structured (JSON) analysis of the whole text
//!  ├─ 4. Images    one description per image; failures are skipped
//!  └─ 5. Query     questions answered from the collected analyses
//! ```
//!
//! Every LLM call goes through the same core: the request is shaped into a
//! provider-neutral payload, sent through a [`ChatTransport`] wrapped in
//! bounded exponential backoff (rate limits only), and the raw reply is
//! normalised into the expected shape.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_pdf_analyzer::{analyze_file, Analyzer, AnalyzerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Requires OPENAI_API_KEY for the default provider.
//!     let analyzer = Analyzer::from_config(AnalyzerConfig::default())?;
//!     let doc = analyze_file("report.pdf", &analyzer).await?;
//!     println!("{}", serde_json::to_string_pretty(&doc.analysis)?);
//!
//!     let answer = analyzer
//!         .query_documents("What is the main conclusion?", &[doc])
//!         .await?;
//!     println!("{answer}");
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf-analyzer` binary (clap, anyhow, indicatif, inquire, dotenvy, tracing-subscriber) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod analyze;
pub mod analyzer;
pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod transport;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use analyze::{analyze_file, analyze_files, inspect, validate_inputs, BatchOutcome};
pub use analyzer::{prepare_query_context, Analyzer};
pub use config::{AnalyzerConfig, AnalyzerConfigBuilder, DEFAULT_MODEL, DEFAULT_PROVIDER};
pub use error::{AnalyzerError, CallError, TransportError};
pub use output::{DocumentAnalysis, DocumentContent, DocumentMetadata, MetadataSummary, ProcessedDocument};
pub use pipeline::backoff::{execute_with_backoff, RetryPolicy};
pub use pipeline::request::{
    shape_image_analysis, shape_query, shape_text_analysis, AnalysisRequest, ChatMessage, ChatPayload,
    ContentPart, RequestKind, ResponseShape, Role,
};
pub use pipeline::response::{normalize, AnalysisResult};
pub use progress::{AnalysisProgressCallback, NoopProgressCallback, ProgressCallback};
pub use transport::{ChatTransport, LlmTransport};
