//! Normalization of stored point payloads to plain text.
//!
//! Two shapes are recognized:
//!
//! - `{ "text": "..." }`, written by this crate
//! - `{ "text": { "text": "...", ... } }`, where a whole page object was stored
//!
//! Anything else normalizes to an empty string.

use serde_json::Value;

pub fn payload_text(payload: &Value) -> String {
    match payload.get("text") {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Object(page)) => match page.get("text") {
            Some(Value::String(text)) => text.clone(),
            _ => String::new(),
        },
        _ => String::new(),
    }
}

/// Page number when present as `page`, or as `num` inside a nested page object.
pub fn payload_page(payload: &Value) -> Option<u32> {
    let page = payload
        .get("page")
        .and_then(|v| v.as_u64())
        .or_else(|| payload.get("text").and_then(|t| t.get("num")).and_then(|v| v.as_u64()))?;
    u32::try_from(page).ok()
}
