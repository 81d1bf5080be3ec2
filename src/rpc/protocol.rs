//! JSON-RPC 2.0 envelopes and the `{success, data | error}` result shape.
//!
//! Two layers of failure are kept apart:
//!
//! - **Protocol errors** (unknown method, malformed params, not a request
//!   object) become a JSON-RPC `error` member with a standard code.
//! - **Operation errors** (missing file, completion failure, hosting API
//!   status) are ordinary results: `{"success": false, "error": "..."}` in
//!   the `result` member. The request itself was well-formed.

use crate::error::StudyError;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Map, Value};

pub const JSONRPC_VERSION: &str = "2.0";

pub const INVALID_REQUEST: i64 = -32600;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;

/// One JSON-RPC call.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RpcRequest {
    #[serde(default)]
    pub jsonrpc: Option<String>,
    pub method: String,
    #[serde(default)]
    pub params: Option<Value>,
    /// `None` only when the member is absent; an explicit `null` id is kept.
    #[serde(default, deserialize_with = "present")]
    pub id: Option<Value>,
}

fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl RpcRequest {
    /// A call without an `id` expects no response.
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }

    /// Require `"jsonrpc": "2.0"`; a missing member is an invalid request.
    pub fn check_version(&self) -> Result<(), RpcError> {
        match self.jsonrpc.as_deref() {
            Some(JSONRPC_VERSION) => Ok(()),
            Some(other) => Err(RpcError::new(
                INVALID_REQUEST,
                format!("unsupported jsonrpc version '{other}'"),
            )),
            None => Err(RpcError::new(
                INVALID_REQUEST,
                format!("missing jsonrpc member, expected \"{JSONRPC_VERSION}\""),
            )),
        }
    }
}

/// Protocol-level error object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl RpcError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    pub fn method_not_found(method: &str) -> Self {
        Self::new(METHOD_NOT_FOUND, format!("Method not found: {method}"))
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(INVALID_PARAMS, message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(INVALID_REQUEST, message)
    }
}

/// One JSON-RPC response. Exactly one of `result` and `error` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcResponse {
    pub jsonrpc: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
    pub id: Value,
}

impl RpcResponse {
    pub fn result(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            result: Some(result),
            error: None,
            id,
        }
    }

    pub fn error(id: Value, error: RpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            result: None,
            error: Some(error),
            id,
        }
    }
}

// ── Operation envelopes ──────────────────────────────────────────────────

/// `{"success": true, "data": data}`.
pub fn success(data: impl Serialize) -> Value {
    match serde_json::to_value(data) {
        Ok(data) => json!({ "success": true, "data": data }),
        Err(e) => json!({ "success": false, "error": format!("Failed to serialise result: {e}") }),
    }
}

/// `{"success": false, "error": message, "error_kind": kind}`.
pub fn failure(error: &StudyError) -> Value {
    json!({
        "success": false,
        "error": error.to_string(),
        "error_kind": error.kind(),
    })
}

/// Envelope for either outcome of an operation.
pub fn envelope<T: Serialize>(outcome: Result<T, StudyError>) -> Value {
    match outcome {
        Ok(data) => success(data),
        Err(e) => failure(&e),
    }
}

// ── Params ───────────────────────────────────────────────────────────────

/// Named arguments of one call after positional binding.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params(Map<String, Value>);

impl Params {
    /// Bind `params` to the method's declared argument `names`.
    ///
    /// Arrays are matched positionally; objects are taken as named
    /// arguments. Missing or `null` params mean "no arguments".
    pub fn bind(names: &[&str], params: Option<Value>) -> Result<Self, RpcError> {
        match params {
            None | Some(Value::Null) => Ok(Self::default()),
            Some(Value::Object(map)) => Ok(Self(map)),
            Some(Value::Array(values)) => {
                if values.len() > names.len() {
                    return Err(RpcError::invalid_params(format!(
                        "expected at most {} positional params, got {}",
                        names.len(),
                        values.len()
                    )));
                }
                Ok(Self(
                    names
                        .iter()
                        .map(|n| n.to_string())
                        .zip(values)
                        .collect(),
                ))
            }
            Some(other) => Err(RpcError::invalid_params(format!(
                "params must be an array or an object, got {other}"
            ))),
        }
    }

    /// A required string argument.
    pub fn required_str(&self, name: &str) -> Result<String, RpcError> {
        match self.0.get(name) {
            Some(Value::String(s)) => Ok(s.clone()),
            Some(other) => Err(RpcError::invalid_params(format!(
                "'{name}' must be a string, got {other}"
            ))),
            None => Err(RpcError::invalid_params(format!(
                "missing required param '{name}'"
            ))),
        }
    }

    /// The raw value of an argument, `None` if absent.
    pub fn take(&mut self, name: &str) -> Option<Value> {
        self.0.remove(name)
    }

    /// A required argument deserialised into `T`.
    pub fn required<T: serde::de::DeserializeOwned>(&mut self, name: &str) -> Result<T, RpcError> {
        let value = self
            .take(name)
            .ok_or_else(|| RpcError::invalid_params(format!("missing required param '{name}'")))?;
        serde_json::from_value(value)
            .map_err(|e| RpcError::invalid_params(format!("invalid '{name}': {e}")))
    }

    /// An optional argument deserialised into `T`; `null` counts as absent.
    pub fn optional<T: serde::de::DeserializeOwned>(
        &mut self,
        name: &str,
    ) -> Result<Option<T>, RpcError> {
        match self.take(name) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| RpcError::invalid_params(format!("invalid '{name}': {e}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_absent_vs_null() {
        let r: RpcRequest = serde_json::from_value(json!({"jsonrpc": "2.0", "method": "m"})).unwrap();
        assert!(r.is_notification());

        let r: RpcRequest =
            serde_json::from_value(json!({"jsonrpc": "2.0", "method": "m", "id": null})).unwrap();
        assert_eq!(r.id, Some(Value::Null));
        assert!(!r.is_notification());
    }

    #[test]
    fn version_check() {
        let r: RpcRequest = serde_json::from_value(json!({"jsonrpc": "1.0", "method": "m"})).unwrap();
        assert_eq!(r.check_version().unwrap_err().code, INVALID_REQUEST);

        let r: RpcRequest = serde_json::from_value(json!({"jsonrpc": "2.0", "method": "m"})).unwrap();
        assert!(r.check_version().is_ok());
    }

    #[test]
    fn missing_version_is_invalid_request() {
        let r: RpcRequest = serde_json::from_value(json!({"method": "m", "id": 1})).unwrap();
        let err = r.check_version().unwrap_err();
        assert_eq!(err.code, INVALID_REQUEST);
        assert!(err.message.contains("jsonrpc"));
    }

    #[test]
    fn response_omits_unused_member() {
        let ok = serde_json::to_value(RpcResponse::result(json!(1), json!({"success": true}))).unwrap();
        assert!(ok.get("error").is_none());
        assert_eq!(ok["jsonrpc"], "2.0");

        let err = serde_json::to_value(RpcResponse::error(json!(2), RpcError::method_not_found("nope")))
            .unwrap();
        assert!(err.get("result").is_none());
        assert_eq!(err["error"]["code"], -32601);
    }

    #[test]
    fn positional_params_bind_in_order() {
        let p = Params::bind(&["file_path", "options"], Some(json!(["/tmp/a.md"]))).unwrap();
        assert_eq!(p.required_str("file_path").unwrap(), "/tmp/a.md");
    }

    #[test]
    fn too_many_positional_params() {
        let err = Params::bind(&["a"], Some(json!([1, 2]))).unwrap_err();
        assert_eq!(err.code, INVALID_PARAMS);
    }

    #[test]
    fn scalar_params_rejected() {
        assert!(Params::bind(&["a"], Some(json!("x"))).is_err());
    }

    #[test]
    fn required_str_type_and_presence() {
        let p = Params::bind(&["a"], Some(json!({"a": 5}))).unwrap();
        assert!(p.required_str("a").unwrap_err().message.contains("string"));
        assert!(p.required_str("b").unwrap_err().message.contains("missing"));
    }

    #[test]
    fn failure_envelope_carries_kind() {
        let v = failure(&StudyError::EmptyContent {
            path: "e.txt".into(),
        });
        assert_eq!(v["success"], false);
        assert_eq!(v["error_kind"], "EmptyContent");
    }
}
