//! Configuration types for PDF analysis.
//!
//! All analysis behaviour is controlled through [`AnalyzerConfig`], built via
//! its [`AnalyzerConfigBuilder`]. The CLI maps its flags (and the
//! `MAX_PDF_SIZE_MB` / `ALLOW_IMAGES` environment variables) onto the builder;
//! library callers set only what they care about.

use crate::error::AnalyzerError;
use crate::pipeline::backoff::RetryPolicy;
use crate::progress::ProgressCallback;
use std::fmt;
use std::time::Duration;

/// Model used when none is configured.
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// Provider used when none is configured.
pub const DEFAULT_PROVIDER: &str = "openai";

/// Configuration for document analysis.
///
/// # Example
/// ```rust
/// use edgequake_pdf_analyzer::AnalyzerConfig;
///
/// let config = AnalyzerConfig::builder()
///     .max_file_size_mb(25)
///     .allow_images(false)
///     .build()
///     .unwrap();
/// assert_eq!(config.model, "gpt-4o");
/// ```
#[derive(Clone)]
pub struct AnalyzerConfig {
    /// LLM provider name (e.g. "openai", "anthropic", "gemini", "ollama"). Default: "openai".
    pub provider_name: String,

    /// LLM model identifier. Default: "gpt-4o".
    ///
    /// Must be vision-capable when image analysis is enabled.
    pub model: String,

    /// Sampling temperature. `None` leaves the provider default in place.
    pub temperature: Option<f32>,

    /// Maximum completion tokens per call. `None` leaves the provider default.
    pub max_tokens: Option<usize>,

    /// Rate-limit retry policy. Default: 5 attempts, 2 s base delay, 0.5 s jitter.
    pub retry: RetryPolicy,

    /// Maximum accepted input size in megabytes. Default: 10.
    pub max_file_size_mb: u64,

    /// Extract and describe embedded images. Default: true.
    pub allow_images: bool,

    /// Per-call timeout in seconds. Default: 120.
    ///
    /// A timeout is reported as a non-retryable transport failure.
    pub request_timeout_secs: u64,

    /// Optional per-document / per-image event sink.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            provider_name: DEFAULT_PROVIDER.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: None,
            max_tokens: None,
            retry: RetryPolicy::default(),
            max_file_size_mb: 10,
            allow_images: true,
            request_timeout_secs: 120,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for AnalyzerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalyzerConfig")
            .field("provider_name", &self.provider_name)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("retry", &self.retry)
            .field("max_file_size_mb", &self.max_file_size_mb)
            .field("allow_images", &self.allow_images)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn AnalysisProgressCallback>"),
            )
            .finish()
    }
}

impl AnalyzerConfig {
    /// Create a new builder for `AnalyzerConfig`.
    pub fn builder() -> AnalyzerConfigBuilder {
        AnalyzerConfigBuilder {
            config: Self::default(),
        }
    }

    /// Size limit in bytes.
    pub fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_mb.saturating_mul(1024 * 1024)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Builder for [`AnalyzerConfig`].
#[derive(Debug)]
pub struct AnalyzerConfigBuilder {
    config: AnalyzerConfig,
}

impl AnalyzerConfigBuilder {
    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = name.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = Some(t.clamp(0.0, 2.0));
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = Some(n);
        self
    }

    pub fn retry(mut self, policy: RetryPolicy) -> Self {
        self.config.retry = policy;
        self
    }

    pub fn max_attempts(mut self, n: u32) -> Self {
        self.config.retry.max_attempts = n;
        self
    }

    pub fn base_delay(mut self, delay: Duration) -> Self {
        self.config.retry.base_delay = delay;
        self
    }

    pub fn max_file_size_mb(mut self, mb: u64) -> Self {
        self.config.max_file_size_mb = mb;
        self
    }

    pub fn allow_images(mut self, v: bool) -> Self {
        self.config.allow_images = v;
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<AnalyzerConfig, AnalyzerError> {
        let c = &self.config;
        if c.provider_name.trim().is_empty() {
            return Err(AnalyzerError::InvalidConfig(
                "Provider name must not be empty".into(),
            ));
        }
        if c.model.trim().is_empty() {
            return Err(AnalyzerError::InvalidConfig(
                "Model must not be empty".into(),
            ));
        }
        if c.retry.max_attempts == 0 {
            return Err(AnalyzerError::InvalidConfig(
                "Retry attempts must be ≥ 1".into(),
            ));
        }
        if c.max_file_size_mb == 0 {
            return Err(AnalyzerError::InvalidConfig(
                "Maximum file size must be ≥ 1 MB".into(),
            ));
        }
        if c.request_timeout_secs == 0 {
            return Err(AnalyzerError::InvalidConfig(
                "Request timeout must be ≥ 1 second".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_gpt4o_with_ten_mb_limit() {
        let c = AnalyzerConfig::default();
        assert_eq!(c.provider_name, "openai");
        assert_eq!(c.model, "gpt-4o");
        assert_eq!(c.max_file_size_mb, 10);
        assert!(c.allow_images);
        assert_eq!(c.retry.max_attempts, 5);
        assert_eq!(c.retry.base_delay, Duration::from_secs(2));
        assert_eq!(c.max_file_size_bytes(), 10 * 1024 * 1024);
    }

    #[test]
    fn builder_rejects_zero_attempts() {
        let err = AnalyzerConfig::builder().max_attempts(0).build().unwrap_err();
        assert!(matches!(err, AnalyzerError::InvalidConfig(_)));
    }

    #[test]
    fn builder_rejects_zero_size_limit() {
        assert!(AnalyzerConfig::builder().max_file_size_mb(0).build().is_err());
    }

    #[test]
    fn builder_clamps_temperature() {
        let c = AnalyzerConfig::builder().temperature(5.0).build().unwrap();
        assert_eq!(c.temperature, Some(2.0));
    }

    #[test]
    fn debug_hides_callback() {
        let s = format!("{:?}", AnalyzerConfig::default());
        assert!(s.contains("gpt-4o"));
    }
}
