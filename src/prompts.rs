//! Fixed instructions sent with every analysis request.
//!
//! Centralising every prompt here serves two purposes:
//!
//! 1. **Single source of truth**: changing what the model is asked to do
//!    requires editing exactly one place.
//!
//! 2. **Testability**: unit tests can import and inspect prompts directly
//!    without spinning up a real LLM, so a shaped payload can be checked
//!    against the exact instruction text.

/// System instruction for the structured text analysis.
///
/// Paired with the JSON response flag; the model answers with an object
/// carrying `main_topics`, `key_points` and `summary`.
pub const TEXT_ANALYSIS_PROMPT: &str = "Analyze the following document text and provide a \
structured analysis including main topics, key points, and a summary. \
Return the analysis in JSON format.";

/// Instruction placed next to each image in an image-analysis request.
pub const IMAGE_ANALYSIS_PROMPT: &str = "Analyze this image and describe its content, \
context, and any relevant information it contains.";

/// System instruction for free-text questions over analysed documents.
pub const QUERY_SYSTEM_PROMPT: &str = "You are a document analysis assistant. Use the \
provided document context to answer the user's query accurately and concisely.";

/// Build the user message for a query: the context first, then the question.
pub fn query_user_message(context: &str, query: &str) -> String {
    format!("Context:\n{context}\n\nQuery: {query}")
}
