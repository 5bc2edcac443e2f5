//! Interpretation of the backend's `{ success, ...payload }` envelope.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::utils::{CdcError, CdcResult};

/// Turns a raw HTTP status + body into either the JSON payload or a typed error.
///
/// Endpoints that return bare payloads (no `success` key) pass through as long
/// as the status is 2xx.
pub fn interpret(status: u16, body: &str, fallback: &str) -> CdcResult<Value> {
    let parsed: Result<Value, _> = if body.trim().is_empty() {
        Ok(Value::Null)
    } else {
        serde_json::from_str(body)
    };

    if !(200..300).contains(&status) {
        let message = parsed
            .ok()
            .as_ref()
            .and_then(backend_message)
            .unwrap_or_else(|| format!("{} (HTTP {})", fallback, status));
        return Err(CdcError::request(Some(status), message));
    }

    let value = parsed.map_err(|e| {
        CdcError::Transport(format!("backend returned a non-JSON body: {}", e))
    })?;

    if value.get("success").and_then(Value::as_bool) == Some(false) {
        let message = backend_message(&value).unwrap_or_else(|| fallback.to_string());
        return Err(CdcError::request(Some(status), message));
    }

    Ok(value)
}

/// `message` wins over `error` when both are present.
pub fn backend_message(body: &Value) -> Option<String> {
    ["message", "error"]
        .iter()
        .filter_map(|key| body.get(*key).and_then(Value::as_str))
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

pub fn field<T: DeserializeOwned>(body: &Value, key: &str) -> CdcResult<T> {
    let raw = body
        .get(key)
        .cloned()
        .ok_or_else(|| CdcError::Transport(format!("response is missing `{}`", key)))?;
    Ok(serde_json::from_value(raw)?)
}

pub fn optional_field<T: DeserializeOwned>(body: &Value, key: &str) -> CdcResult<Option<T>> {
    match body.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(raw) => Ok(Some(serde_json::from_value(raw.clone())?)),
    }
}

pub fn whole<T: DeserializeOwned>(body: Value) -> CdcResult<T> {
    Ok(serde_json::from_value(body)?)
}
