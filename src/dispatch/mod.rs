//! Request dispatch
//!
//! Accepts the `{ "method", "params": { "name", "arguments" } }` envelope and
//! routes it to the tool catalog or a tool call. Transport-independent: the
//! HTTP server and the `call` CLI command both go through here.

pub mod tools;

use axum::http::StatusCode;
use serde_json::{json, Value};
use tracing::{debug, error, warn};

use crate::service::LearningLog;

pub use tools::{handle_tool_call, tool_catalog, Tool};

/// Status code and JSON body of a dispatched request
#[derive(Debug, Clone)]
pub struct DispatchResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl DispatchResponse {
    fn ok(body: Value) -> Self {
        Self { status: StatusCode::OK, body }
    }

    fn error(status: StatusCode, message: String) -> Self {
        Self {
            status,
            body: json!({ "success": false, "error": message }),
        }
    }
}

/// Handle a raw request body. Bytes that are not UTF-8 fail as invalid JSON.
pub async fn handle_request(log: &LearningLog, body: &[u8], default_user: &str) -> DispatchResponse {
    let envelope: Value = match serde_json::from_slice(body) {
        Ok(value) => value,
        Err(e) => {
            warn!("Rejected request body: {}", e);
            return DispatchResponse::error(StatusCode::BAD_REQUEST, format!("Invalid JSON: {}", e));
        }
    };

    handle_envelope(log, envelope, default_user).await
}

/// Handle an already parsed envelope.
///
/// A gateway-style wrapper whose `body` field holds the envelope (as a string
/// or an object) is unwrapped first.
pub async fn handle_envelope(log: &LearningLog, envelope: Value, default_user: &str) -> DispatchResponse {
    let envelope = match envelope.get("body") {
        Some(Value::String(inner)) => match serde_json::from_str(inner) {
            Ok(value) => value,
            Err(e) => {
                return DispatchResponse::error(StatusCode::BAD_REQUEST, format!("Invalid JSON: {}", e));
            }
        },
        Some(inner @ Value::Object(_)) => inner.clone(),
        _ => envelope,
    };

    let method = envelope.get("method").and_then(Value::as_str).unwrap_or_default();
    let params = envelope.get("params").cloned().unwrap_or(Value::Null);
    debug!("Dispatching method '{}'", method);

    match method {
        "tools/list" => match serde_json::to_value(tool_catalog()) {
            Ok(tools) => DispatchResponse::ok(json!({ "tools": tools })),
            Err(e) => {
                error!("Failed to serialize tool catalog: {}", e);
                DispatchResponse::error(StatusCode::INTERNAL_SERVER_ERROR, format!("Internal error: {}", e))
            }
        },
        "tools/call" => {
            let name = params.get("name").and_then(Value::as_str).unwrap_or_default();
            let arguments = params.get("arguments").cloned().unwrap_or(Value::Null);
            DispatchResponse::ok(handle_tool_call(log, name, &arguments, default_user).await)
        }
        other => DispatchResponse::error(StatusCode::BAD_REQUEST, format!("Unknown method: {}", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteRecordStore;
    use std::sync::Arc;

    fn sqlite_log() -> LearningLog {
        LearningLog::new(Arc::new(SqliteRecordStore::in_memory().unwrap()))
    }

    #[tokio::test]
    async fn test_tools_list() {
        let response = handle_request(&sqlite_log(), br#"{"method": "tools/list"}"#, "u").await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body["tools"].as_array().unwrap().len(), 7);
    }

    #[tokio::test]
    async fn test_tools_call() {
        let body = r#"{
            "method": "tools/call",
            "params": {"name": "save_phrase", "arguments": {"english": "Hello", "japanese": "こんにちは"}}
        }"#;
        let response = handle_request(&sqlite_log(), body.as_bytes(), "u").await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body["success"], true);
    }

    #[tokio::test]
    async fn test_tool_failure_is_still_200() {
        let body = r#"{"method": "tools/call", "params": {"name": "nope"}}"#;
        let response = handle_request(&sqlite_log(), body.as_bytes(), "u").await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body["success"], false);
        assert_eq!(response.body["error"], "Unknown tool: nope");
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let response = handle_request(&sqlite_log(), br#"{"method": "resources/list"}"#, "u").await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(response.body["error"], "Unknown method: resources/list");
    }

    #[tokio::test]
    async fn test_invalid_json() {
        let response = handle_request(&sqlite_log(), b"{not json", "u").await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert!(response.body["error"].as_str().unwrap().starts_with("Invalid JSON"));
    }

    #[tokio::test]
    async fn test_non_utf8_body_is_invalid_json() {
        let response = handle_request(&sqlite_log(), &[0xff, 0xfe, 0x7b], "u").await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(response.body["success"], false);
        assert!(response.body["error"].as_str().unwrap().starts_with("Invalid JSON: "));
    }

    #[tokio::test]
    async fn test_wrapped_body() {
        let wrapped = json!({ "body": r#"{"method": "tools/list"}"# });
        let response = handle_envelope(&sqlite_log(), wrapped, "u").await;
        assert_eq!(response.status, StatusCode::OK);
        assert!(response.body["tools"].is_array());
    }
}
