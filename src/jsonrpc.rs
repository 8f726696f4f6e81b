//! JSON-RPC 2.0 request and response envelopes
//!
//! The engine speaks JSON-RPC 2.0 exclusively, so envelopes are validated
//! here, before the registry or the engine ever see them. Correlation of a
//! request `id` with its response is left to the caller; this layer only
//! guarantees that what crosses the boundary is a well-formed 2.0 envelope.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::error::{LightlinkError, Result};

/// The only protocol version the engine accepts
pub const JSONRPC_VERSION: &str = "2.0";

/// A request identifier: a number or a string, per JSON-RPC 2.0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    Number(serde_json::Number),
    String(String),
}

impl From<i64> for RequestId {
    fn from(n: i64) -> Self {
        Self::Number(n.into())
    }
}

impl From<&str> for RequestId {
    fn from(s: &str) -> Self {
        Self::String(s.to_owned())
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::String(s) => write!(f, "{s}"),
        }
    }
}

/// A validated JSON-RPC 2.0 request envelope.
///
/// A request without an `id` is a notification: the engine will not produce
/// a response for it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Request {
    jsonrpc: &'static str,
    method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    params: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<RequestId>,
}

impl Request {
    /// Build a request from its parts.
    pub fn new(
        method: impl Into<String>,
        params: Option<Value>,
        id: Option<RequestId>,
    ) -> Result<Self> {
        let method = method.into();
        if method.is_empty() {
            return Err(LightlinkError::InvalidRequest(
                "method must be a non-empty string".into(),
            ));
        }
        if let Some(params) = &params {
            if !params.is_array() && !params.is_object() {
                return Err(LightlinkError::InvalidRequest(
                    "params must be an array or an object".into(),
                ));
            }
        }
        Ok(Self {
            jsonrpc: JSONRPC_VERSION,
            method,
            params,
            id,
        })
    }

    /// Build a notification: a request without an `id`, for which the engine
    /// produces no response.
    pub fn notification(method: impl Into<String>, params: Option<Value>) -> Result<Self> {
        Self::new(method, params, None)
    }

    /// Parse and validate a request from JSON text.
    ///
    /// Checks run in a fixed order: the text must parse as a JSON object,
    /// `jsonrpc` must be exactly `"2.0"` (1.0 and malformed version strings
    /// are rejected outright, never coerced), and `method` must be a
    /// non-empty string. An `id`, if present, must be a number or a string.
    pub fn from_json(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)?;
        let Value::Object(object) = value else {
            return Err(LightlinkError::InvalidRequest(
                "request must be a JSON object".into(),
            ));
        };

        match object.get("jsonrpc") {
            Some(Value::String(version)) if version == JSONRPC_VERSION => {}
            Some(Value::String(version)) => {
                return Err(LightlinkError::InvalidRequest(format!(
                    "unsupported protocol version `{version}`, expected `{JSONRPC_VERSION}`"
                )));
            }
            _ => {
                return Err(LightlinkError::InvalidRequest(
                    "missing `jsonrpc` version field".into(),
                ));
            }
        }

        let method = match object.get("method") {
            Some(Value::String(method)) if !method.is_empty() => method.clone(),
            Some(Value::String(_)) => {
                return Err(LightlinkError::InvalidRequest(
                    "method must be a non-empty string".into(),
                ));
            }
            _ => {
                return Err(LightlinkError::InvalidRequest(
                    "missing `method` field".into(),
                ));
            }
        };

        let id = match object.get("id") {
            None => None,
            Some(Value::Number(n)) => Some(RequestId::Number(n.clone())),
            Some(Value::String(s)) => Some(RequestId::String(s.clone())),
            Some(_) => {
                return Err(LightlinkError::InvalidRequest(
                    "id must be a number or a string".into(),
                ));
            }
        };

        Self::new(method, object.get("params").cloned(), id)
    }

    /// Serialize the request for submission to the engine.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn params(&self) -> Option<&Value> {
        self.params.as_ref()
    }

    pub fn id(&self) -> Option<&RequestId> {
        self.id.as_ref()
    }

    /// True if no response is expected for this request.
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

/// The `error` member of a failed JSON-RPC 2.0 response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseError {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl fmt::Display for ResponseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code {})", self.message, self.code)
    }
}

/// A JSON-RPC 2.0 response produced by the engine.
///
/// Carries exactly one of `result` or `error`; anything else is rejected at
/// parse time.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    id: Option<RequestId>,
    outcome: std::result::Result<Value, ResponseError>,
}

impl Response {
    /// Parse and validate a response from the engine's JSON text.
    pub fn from_json(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)?;
        let Value::Object(mut object) = value else {
            return Err(LightlinkError::InvalidResponse(
                "response must be a JSON object".into(),
            ));
        };

        match object.get("jsonrpc") {
            Some(Value::String(version)) if version == JSONRPC_VERSION => {}
            _ => {
                return Err(LightlinkError::InvalidResponse(
                    "missing or unsupported `jsonrpc` version field".into(),
                ));
            }
        }

        let id = match object.get("id") {
            None | Some(Value::Null) => None,
            Some(Value::Number(n)) => Some(RequestId::Number(n.clone())),
            Some(Value::String(s)) => Some(RequestId::String(s.clone())),
            Some(_) => {
                return Err(LightlinkError::InvalidResponse(
                    "id must be a number or a string".into(),
                ));
            }
        };

        let outcome = match (object.remove("result"), object.remove("error")) {
            (Some(result), None) => Ok(result),
            (None, Some(error)) => Err(serde_json::from_value::<ResponseError>(error)
                .map_err(|e| LightlinkError::InvalidResponse(format!("malformed error member: {e}")))?),
            (Some(_), Some(_)) => {
                return Err(LightlinkError::InvalidResponse(
                    "response carries both result and error".into(),
                ));
            }
            (None, None) => {
                return Err(LightlinkError::InvalidResponse(
                    "response carries neither result nor error".into(),
                ));
            }
        };

        Ok(Self { id, outcome })
    }

    /// The `id` echoed from the originating request, absent for engine-level
    /// failures that could not be attributed to a request.
    pub fn id(&self) -> Option<&RequestId> {
        self.id.as_ref()
    }

    /// The `result` member, if the response is a success.
    pub fn result(&self) -> Option<&Value> {
        self.outcome.as_ref().ok()
    }

    /// The `error` member, if the response is a failure.
    pub fn error(&self) -> Option<&ResponseError> {
        self.outcome.as_ref().err()
    }

    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }
}
