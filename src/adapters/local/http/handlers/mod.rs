pub mod clip;
pub mod download;
pub mod health;
pub mod info;
pub mod status;

use super::error::{ApiError, ApiResult};
use serde_json::{Map, Value};

/// Parse a JSON object body. Empty, malformed or empty-object bodies are all
/// treated as missing.
pub(super) fn json_object(body: &[u8]) -> ApiResult<Map<String, Value>> {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) if !map.is_empty() => Ok(map),
        _ => Err(ApiError::bad_request("no json data provided")),
    }
}

/// String field of a request body; absent or non-string values read as empty.
pub(super) fn text_field(body: &Map<String, Value>, key: &str) -> String {
    body.get(key)
        .and_then(Value::as_str)
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}
