//! Transport boundary: submit one chat-style completion, get text back.
//!
//! [`ChatTransport`] is the only place a network dependency enters the
//! crate. The production implementation, [`LlmTransport`], wraps an
//! `edgequake-llm` provider; tests inject their own implementation that
//! returns canned text.
//!
//! A transport performs exactly one attempt per call and classifies its
//! failure as either a rate limit or anything else. Retrying is the
//! backoff controller's job, not the transport's.

use crate::config::AnalyzerConfig;
use crate::error::{AnalyzerError, TransportError};
use crate::pipeline::request::{ChatPayload, ContentPart, Role};
use async_trait::async_trait;
use edgequake_llm::{
    ChatMessage, CompletionOptions, ImageData, LLMProvider, LlmError, ProviderFactory,
};
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Submit a shaped payload and return the completion text.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn complete(&self, payload: &ChatPayload) -> Result<String, TransportError>;
}

/// Production transport backed by an `edgequake-llm` provider.
pub struct LlmTransport {
    provider: Arc<dyn LLMProvider>,
    temperature: Option<f32>,
    max_tokens: Option<usize>,
    timeout: Duration,
}

impl LlmTransport {
    pub fn new(provider: Arc<dyn LLMProvider>, config: &AnalyzerConfig) -> Self {
        Self {
            provider,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            timeout: config.request_timeout(),
        }
    }

    /// Create the provider named in `config`, checking its credential first.
    pub fn from_config(config: &AnalyzerConfig) -> Result<Self, AnalyzerError> {
        require_credential(&config.provider_name)?;
        let provider = ProviderFactory::create_llm_provider(&config.provider_name, &config.model)
            .map_err(|e| AnalyzerError::ProviderNotConfigured {
                provider: config.provider_name.clone(),
                hint: format!("{e}"),
            })?;
        Ok(Self::new(provider, config))
    }

    fn build_options(&self, payload: &ChatPayload) -> CompletionOptions {
        CompletionOptions {
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            response_format: payload.wants_json().then(|| "json_object".to_string()),
            ..Default::default()
        }
    }
}

#[async_trait]
impl ChatTransport for LlmTransport {
    async fn complete(&self, payload: &ChatPayload) -> Result<String, TransportError> {
        let messages = to_provider_messages(payload);
        let options = self.build_options(payload);
        let start = Instant::now();

        let response = tokio::time::timeout(self.timeout, self.provider.chat(&messages, Some(&options)))
            .await
            .map_err(|_| {
                TransportError::Failed(format!(
                    "request timed out after {}s",
                    self.timeout.as_secs()
                ))
            })?
            .map_err(|e| classify_provider_error(&e))?;

        debug!(
            "{:?}: {} input tokens, {} output tokens, {:?}",
            payload.kind,
            response.prompt_tokens,
            response.completion_tokens,
            start.elapsed()
        );
        Ok(response.content)
    }
}

/// Map the provider-neutral payload onto `edgequake-llm` messages.
fn to_provider_messages(payload: &ChatPayload) -> Vec<ChatMessage> {
    payload
        .messages
        .iter()
        .map(|m| {
            let text = m.text();
            match m.role {
                Role::System => ChatMessage::system(text),
                Role::User => {
                    let images: Vec<ImageData> = m
                        .images()
                        .filter_map(|p| match p {
                            ContentPart::Image {
                                mime_type,
                                data_base64,
                            } => Some(ImageData::new(data_base64.clone(), mime_type.as_str())),
                            ContentPart::Text(_) => None,
                        })
                        .collect();
                    if images.is_empty() {
                        ChatMessage::user(text)
                    } else {
                        ChatMessage::user_with_images(text, images)
                    }
                }
            }
        })
        .collect()
}

/// Rate-limit wording inside an otherwise untyped provider message.
static RATE_LIMIT_WORDING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\brate[ _-]?limit|\btoo many requests\b|\bquota\b|\b(?:http|status|code)\W{0,3}429\b",
    )
    .unwrap()
});

/// Classify a provider error as a rate limit or a hard failure.
///
/// `LlmError::RateLimited` is always a rate limit. Untyped `ApiError` and
/// `ProviderError` messages count only when they carry rate-limit wording,
/// since quota exhaustion often arrives that way. Every other variant fails.
pub fn classify_provider_error(err: &LlmError) -> TransportError {
    match err {
        LlmError::RateLimited(detail) => TransportError::RateLimited(detail.clone()),
        LlmError::ApiError(detail) | LlmError::ProviderError(detail)
            if RATE_LIMIT_WORDING.is_match(detail) =>
        {
            TransportError::RateLimited(err.to_string())
        }
        other => TransportError::Failed(other.to_string()),
    }
}

/// Credential variable required by a provider, if any.
pub fn credential_var(provider: &str) -> Option<&'static str> {
    match provider.to_lowercase().as_str() {
        "openai" => Some("OPENAI_API_KEY"),
        "anthropic" => Some("ANTHROPIC_API_KEY"),
        "gemini" => Some("GEMINI_API_KEY"),
        "mistral" => Some("MISTRAL_API_KEY"),
        "openrouter" => Some("OPENROUTER_API_KEY"),
        "xai" => Some("XAI_API_KEY"),
        "azure" => Some("AZURE_OPENAI_API_KEY"),
        _ => None,
    }
}

/// Fail fast when the provider's credential is missing or empty.
pub fn require_credential(provider: &str) -> Result<(), AnalyzerError> {
    let Some(var) = credential_var(provider) else {
        return Ok(());
    };
    match std::env::var(var) {
        Ok(v) if !v.trim().is_empty() => Ok(()),
        _ => Err(AnalyzerError::MissingCredential {
            var: var.to_string(),
        }),
    }
}
