//! Request shaping: turn an [`AnalysisRequest`] into a chat payload.
//!
//! Every builder here is pure. The payload is provider-neutral: a list of
//! role-tagged messages whose content is text or base64 image parts, and
//! the transport adapter maps it onto whatever client library it wraps.
//!
//! ## Message Layout
//!
//! | Request | Messages | Response shape |
//! |---------|----------|----------------|
//! | text analysis | system instruction, user text | structured (JSON) |
//! | image analysis | user: instruction + image | free text |
//! | query | system instruction, user "Context … Query …" | free text |

use crate::prompts::{
    query_user_message, IMAGE_ANALYSIS_PROMPT, QUERY_SYSTEM_PROMPT, TEXT_ANALYSIS_PROMPT,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// MIME type of images sent for analysis (extraction re-encodes to JPEG).
pub const IMAGE_MIME_TYPE: &str = "image/jpeg";

/// One analysis call, before shaping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisRequest {
    /// Structured analysis of a document's text.
    TextAnalysis { text: String },
    /// Free-text description of one embedded image.
    ImageAnalysis { image_bytes: Vec<u8> },
    /// Free-text answer to a question over the given context.
    Query { query: String, context: String },
}

impl AnalysisRequest {
    /// Build the payload for this request.
    pub fn shape(&self) -> ChatPayload {
        match self {
            AnalysisRequest::TextAnalysis { text } => shape_text_analysis(text),
            AnalysisRequest::ImageAnalysis { image_bytes } => shape_image_analysis(image_bytes),
            AnalysisRequest::Query { query, context } => shape_query(query, context),
        }
    }

    pub fn kind(&self) -> RequestKind {
        match self {
            AnalysisRequest::TextAnalysis { .. } => RequestKind::TextAnalysis,
            AnalysisRequest::ImageAnalysis { .. } => RequestKind::ImageAnalysis,
            AnalysisRequest::Query { .. } => RequestKind::Query,
        }
    }
}

/// Which builder produced a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestKind {
    TextAnalysis,
    ImageAnalysis,
    Query,
}

/// What the caller expects back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResponseShape {
    /// A JSON object.
    Structured,
    /// Free text, returned verbatim.
    FreeText,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    System,
    User,
}

/// A piece of message content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContentPart {
    Text(String),
    Image { mime_type: String, data_base64: String },
}

impl ContentPart {
    /// `data:<mime>;base64,<data>` for image parts, `None` for text.
    pub fn data_uri(&self) -> Option<String> {
        match self {
            ContentPart::Text(_) => None,
            ContentPart::Image {
                mime_type,
                data_base64,
            } => Some(format!("data:{mime_type};base64,{data_base64}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub parts: Vec<ContentPart>,
}

impl ChatMessage {
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            parts: vec![ContentPart::Text(text.into())],
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            parts: vec![ContentPart::Text(text.into())],
        }
    }

    /// Concatenated text parts, separated by blank lines.
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|p| match p {
                ContentPart::Text(t) => Some(t.as_str()),
                ContentPart::Image { .. } => None,
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    pub fn images(&self) -> impl Iterator<Item = &ContentPart> {
        self.parts
            .iter()
            .filter(|p| matches!(p, ContentPart::Image { .. }))
    }
}

/// A shaped request, ready for a [`crate::transport::ChatTransport`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatPayload {
    pub kind: RequestKind,
    pub messages: Vec<ChatMessage>,
    pub response_shape: ResponseShape,
}

impl ChatPayload {
    /// Whether the transport should request a JSON-object response.
    pub fn wants_json(&self) -> bool {
        self.response_shape == ResponseShape::Structured
    }

    pub fn has_images(&self) -> bool {
        self.messages.iter().any(|m| m.images().next().is_some())
    }
}

/// Structured analysis of document text.
pub fn shape_text_analysis(text: &str) -> ChatPayload {
    debug!("Shaping text analysis: {} chars", text.len());
    ChatPayload {
        kind: RequestKind::TextAnalysis,
        messages: vec![
            ChatMessage::system(TEXT_ANALYSIS_PROMPT),
            ChatMessage::user(text),
        ],
        response_shape: ResponseShape::Structured,
    }
}

/// Free-text description of one image.
pub fn shape_image_analysis(image_bytes: &[u8]) -> ChatPayload {
    let data_base64 = STANDARD.encode(image_bytes);
    debug!(
        "Shaping image analysis: {} bytes → {} bytes base64",
        image_bytes.len(),
        data_base64.len()
    );
    ChatPayload {
        kind: RequestKind::ImageAnalysis,
        messages: vec![ChatMessage {
            role: Role::User,
            parts: vec![
                ContentPart::Text(IMAGE_ANALYSIS_PROMPT.to_string()),
                ContentPart::Image {
                    mime_type: IMAGE_MIME_TYPE.to_string(),
                    data_base64,
                },
            ],
        }],
        response_shape: ResponseShape::FreeText,
    }
}

/// Context-grounded question.
pub fn shape_query(query: &str, context: &str) -> ChatPayload {
    ChatPayload {
        kind: RequestKind::Query,
        messages: vec![
            ChatMessage::system(QUERY_SYSTEM_PROMPT),
            ChatMessage::user(query_user_message(context, query)),
        ],
        response_shape: ResponseShape::FreeText,
    }
}
