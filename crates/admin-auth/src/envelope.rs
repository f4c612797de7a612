//! Backend response envelope
//!
//! Every backend response is wrapped as
//! `{ "success": bool, "message"?: string, "data"?: T, "errors"?: [{field, message}] }`.
//! This is the one canonical shape; a body that deviates from it is decoded
//! as-is rather than probed for alternative nestings.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Canonical response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    // No `default` here: it would put a `T: Default` bound on Deserialize
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
}

impl<T> Envelope<T> {
    pub fn into_data(self) -> Option<T> {
        self.data
    }
}

/// One entry of a 400 validation errors array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Return `data` if the body is an object carrying it, otherwise the body.
pub fn unwrap_data(body: Value) -> Value {
    match body {
        Value::Object(mut map) if map.contains_key("data") => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

/// The envelope's `message`, if the body has one.
pub fn envelope_message(body: &Value) -> Option<&str> {
    body.get("message")
        .and_then(Value::as_str)
        .filter(|m| !m.is_empty())
}
