//! Response normalisation: raw completion text → [`AnalysisResult`].
//!
//! Structured requests must come back as a JSON object. Providers without a
//! native JSON mode occasionally wrap the object in a ```` ```json ```` fence
//! despite the instruction, so an outer fence is stripped before parsing.
//! Anything that still fails to parse keeps the raw text in the error.

use crate::error::CallError;
use crate::pipeline::request::ResponseShape;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Decoded result of one analysis call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AnalysisResult {
    Structured(Map<String, Value>),
    Text(String),
}

impl AnalysisResult {
    pub fn into_structured(self) -> Option<Map<String, Value>> {
        match self {
            AnalysisResult::Structured(map) => Some(map),
            AnalysisResult::Text(_) => None,
        }
    }

    pub fn into_text(self) -> Option<String> {
        match self {
            AnalysisResult::Text(text) => Some(text),
            AnalysisResult::Structured(_) => None,
        }
    }
}

/// Decode `raw` according to the shape the request asked for.
pub fn normalize(shape: ResponseShape, raw: String) -> Result<AnalysisResult, CallError> {
    match shape {
        ResponseShape::FreeText => Ok(AnalysisResult::Text(raw)),
        ResponseShape::Structured => parse_object(&raw).map(AnalysisResult::Structured),
    }
}

static RE_JSON_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```(?:json|JSON)?\s*\n(.*)\n```\s*$").unwrap());

fn strip_json_fence(input: &str) -> &str {
    let trimmed = input.trim();
    match RE_JSON_FENCE.captures(trimmed) {
        Some(caps) => caps.get(1).map_or(trimmed, |m| m.as_str()),
        None => trimmed,
    }
}

fn parse_object(raw: &str) -> Result<Map<String, Value>, CallError> {
    let body = strip_json_fence(raw);
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(CallError::MalformedResponse {
            detail: format!("expected a JSON object, got {}", json_kind(&other)),
            raw: raw.to_string(),
        }),
        Err(e) => Err(CallError::MalformedResponse {
            detail: format!("invalid JSON: {e}"),
            raw: raw.to_string(),
        }),
    }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
