//! Shape and content checks run before any classifier call.

use serde_json::{Map, Value};

use crate::api::models::{AnalyzeRequest, BatchRequest};
use crate::error::ApiError;

pub const MAX_BATCH_SIZE: usize = 10;

/// Decodes a request body. Empty or malformed JSON counts as an absent body.
pub fn decode_body(bytes: &[u8]) -> Option<Value> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return None;
    }
    match serde_json::from_slice(bytes) {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::debug!(error = %err, "request body is not valid JSON");
            None
        }
    }
}

pub fn validate_analyze(body: Option<Value>) -> Result<AnalyzeRequest, ApiError> {
    let text = match take_field(body, "text")? {
        Value::String(text) => text,
        _ => return Err(ApiError::WrongType("'text' must be a string")),
    };

    if text.trim().is_empty() {
        return Err(ApiError::EmptyText);
    }

    Ok(AnalyzeRequest { text })
}

/// Blank entries are accepted here; only the single-text route rejects them.
pub fn validate_batch(body: Option<Value>) -> Result<BatchRequest, ApiError> {
    let items = match take_field(body, "texts")? {
        Value::Array(items) => items,
        _ => return Err(ApiError::WrongType("'texts' must be a list")),
    };

    if items.len() > MAX_BATCH_SIZE {
        return Err(ApiError::BatchTooLarge {
            max: MAX_BATCH_SIZE,
            actual: items.len(),
        });
    }

    let texts = items
        .into_iter()
        .map(|item| match item {
            Value::String(text) => Ok(text),
            _ => Err(ApiError::WrongType("'texts' must be a list of strings")),
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(BatchRequest { texts })
}

fn take_field(body: Option<Value>, key: &'static str) -> Result<Value, ApiError> {
    let mut object: Map<String, Value> = match body {
        Some(Value::Object(object)) => object,
        _ => return Err(ApiError::MissingField(key)),
    };

    object.remove(key).ok_or(ApiError::MissingField(key))
}
