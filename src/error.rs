//! Error types for the edgequake-pdf-analyzer library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`CallError`] is **per call**: one outbound analysis request failed
//!   (rate limit exhausted, transport failure, unreadable response). The
//!   caller decides what to do: the document pipeline skips a failed image
//!   but aborts the document when the text analysis fails; the query loop
//!   reports the error and keeps prompting.
//!
//! * [`AnalyzerError`] is **fatal** for one document or for startup: bad
//!   input file, unreadable PDF, missing credential, or a failed text
//!   analysis. Returned from the file-level entry points in [`crate::analyze`].
//!
//! A third, internal type, [`TransportError`], is what a single transport
//! attempt reports. Only the backoff controller turns it into a
//! [`CallError`], so a terminal `CallError` is never fed back into a retry
//! loop and reinterpreted.

use std::path::PathBuf;
use thiserror::Error;

/// Outcome of one failed call to the remote analysis service.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum CallError {
    /// The service kept signalling a rate limit until the attempt budget ran out.
    #[error(
        "Rate limit exceeded after {attempts} attempts. Please ensure your API key \
         has sufficient quota and billing enabled.\nLast error: {detail}"
    )]
    RateLimited { attempts: u32, detail: String },

    /// Non-retryable call failure: network, authentication, bad request, timeout.
    #[error("API error: {detail}")]
    Transport { detail: String },

    /// The call succeeded but the result could not be read in the expected shape.
    #[error("Malformed response: {detail}\nRaw response: {raw:?}")]
    MalformedResponse { detail: String, raw: String },
}

impl CallError {
    /// Whether this error came from rate limiting rather than a hard failure.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, CallError::RateLimited { .. })
    }
}

/// A single transport attempt's failure, before retry policy is applied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// HTTP 429 or equivalent: retryable after a delay.
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// Anything else. Not retried.
    #[error("{0}")]
    Failed(String),
}

/// All fatal errors returned by the edgequake-pdf-analyzer library.
#[derive(Debug, Error)]
pub enum AnalyzerError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("File not found: '{path}'")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The path does not carry a `.pdf` extension.
    #[error("Not a PDF file: '{path}'")]
    NotPdfExtension { path: PathBuf },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    /// The file is larger than the configured limit.
    #[error("PDF '{path}' is {size_mb:.1} MB, larger than the {limit_mb} MB limit.\nRaise it with --max-size-mb or MAX_PDF_SIZE_MB.")]
    FileTooLarge {
        path: PathBuf,
        size_mb: f64,
        limit_mb: u64,
    },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("Failed to process PDF '{path}': {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium or install pdfium system-wide."
    )]
    PdfiumBindingFailed(String),

    // ── LLM errors ────────────────────────────────────────────────────────
    /// The credential for the selected provider is not set.
    #[error("{var} environment variable is not set.\nPlease check your .env file or environment variables.")]
    MissingCredential { var: String },

    /// The configured provider could not be initialised.
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The text analysis of a document failed; the document is not processed.
    #[error("Failed to analyze document text: {source}")]
    TextAnalysisFailed {
        #[source]
        source: CallError,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limited_mentions_quota_and_billing() {
        let e = CallError::RateLimited {
            attempts: 5,
            detail: "429 Too Many Requests".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("quota"), "got: {msg}");
        assert!(msg.contains("billing"), "got: {msg}");
        assert!(msg.contains("5 attempts"), "got: {msg}");
        assert!(e.is_rate_limited());
    }

    #[test]
    fn malformed_response_keeps_raw_payload() {
        let e = CallError::MalformedResponse {
            detail: "expected value at line 1 column 1".into(),
            raw: "not json".into(),
        };
        assert!(e.to_string().contains("not json"));
        assert!(!e.is_rate_limited());
    }

    #[test]
    fn text_analysis_failure_wraps_call_error() {
        let e = AnalyzerError::TextAnalysisFailed {
            source: CallError::Transport {
                detail: "connection reset".into(),
            },
        };
        assert!(e.to_string().contains("connection reset"));
        assert!(std::error::Error::source(&e).is_some());
    }

    #[test]
    fn missing_credential_names_variable() {
        let e = AnalyzerError::MissingCredential {
            var: "OPENAI_API_KEY".into(),
        };
        assert!(e.to_string().contains("OPENAI_API_KEY"));
    }

    #[test]
    fn file_too_large_display() {
        let e = AnalyzerError::FileTooLarge {
            path: "big.pdf".into(),
            size_mb: 12.5,
            limit_mb: 10,
        };
        let msg = e.to_string();
        assert!(msg.contains("12.5 MB"), "got: {msg}");
        assert!(msg.contains("10 MB"), "got: {msg}");
    }
}
