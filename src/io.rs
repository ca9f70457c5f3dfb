//! Wire payloads exchanged with the persistence service and the assistant proxy.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use crate::error::{DrawingError, Result};
use crate::normalize::normalize_all;
use crate::types::{Shape, ShapeList};

/// A transport-level reply handed back by the host.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Reply {
    pub status: u16,
    pub body: String,
}

impl Reply {
    pub fn new(status: u16, body: impl Into<String>) -> Reply {
        Reply { status, body: body.into() }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Serialize)]
struct DrawingRef<'a> {
    shapes: &'a [Shape],
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SaveRequest {
    pub name: String,
    /// The drawing `{ "shapes": [...] }`, serialized a second time as a string.
    #[serde(rename = "jsonData")]
    pub json_data: String,
}

impl SaveRequest {
    pub fn new(name: &str, shapes: &[Shape]) -> Result<SaveRequest> {
        Ok(SaveRequest { name: name.to_string(), json_data: serde_json::to_string(&DrawingRef { shapes })? })
    }
}

/// Turns a stored drawing into shapes: `{ "shapes": [...] }` or a bare array are normalized
/// element-wise, anything else becomes an empty drawing.
pub fn decode_drawing(parsed: &Value) -> ShapeList {
    match parsed {
        Value::Array(items) => normalize_all(items),
        Value::Object(fields) => match fields.get("shapes") {
            Some(Value::Array(items)) => normalize_all(items),
            _ => {
                tracing::warn!("stored drawing has no shape array");
                Vec::new()
            }
        },
        _ => {
            tracing::warn!("unexpected stored drawing structure");
            Vec::new()
        }
    }
}

/// Decodes a load response body. `Ok(None)` when the record carries no drawing data.
pub fn decode_load_response(body: &str) -> Result<Option<ShapeList>> {
    let record: Value = serde_json::from_str(body)?;
    let json_data = match record.get("jsonData").and_then(Value::as_str) {
        Some(data) if !data.is_empty() => data,
        _ => return Ok(None),
    };
    let parsed: Value = serde_json::from_str(json_data)?;
    Ok(Some(decode_drawing(&parsed)))
}

/// The assistant proxy takes the bare prompt as a JSON string.
pub fn assistant_request_body(prompt: &str) -> Result<String> {
    Ok(serde_json::to_string(prompt)?)
}

#[derive(Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Option<ChatMessageBody>,
}

#[derive(Deserialize)]
struct ChatMessageBody {
    content: Option<String>,
}

/// Extracts shape descriptors from a chat-completion payload whose first choice carries
/// `{ "shapes": [...] }` as JSON text.
pub fn decode_assistant_reply(body: &str) -> Result<ShapeList> {
    let completion: ChatCompletion = serde_json::from_str(body)?;
    let content = completion
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message)
        .and_then(|message| message.content)
        .filter(|content| !content.is_empty())
        .ok_or_else(|| DrawingError::UnexpectedPayload("missing choices[0].message.content".to_string()))?;
    let shapes_data: Value = serde_json::from_str(&content)?;
    Ok(match shapes_data.get("shapes") {
        Some(Value::Array(items)) => normalize_all(items),
        _ => Vec::new(),
    })
}
