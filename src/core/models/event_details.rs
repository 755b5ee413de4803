use serde_json::{Map, Value};

use crate::core::errors::{MonitorError, Result};

/// Parsed CloudTrail detail payload (the `CloudTrailEvent` JSON string).
///
/// Wraps the untyped document behind optional accessors so a missing or
/// mistyped field is simply `None` rather than a cast failure at the call
/// site.
#[derive(Debug, Clone, PartialEq)]
pub struct EventDetails {
    document: Map<String, Value>,
}

impl EventDetails {
    /// Parse the raw detail JSON. The top level must be an object.
    pub fn parse(raw: &str) -> Result<Self> {
        let value: Value =
            serde_json::from_str(raw).map_err(|e| MonitorError::DetailParseFailed {
                reason: e.to_string(),
            })?;

        match value {
            Value::Object(document) => Ok(Self { document }),
            other => Err(MonitorError::DetailParseFailed {
                reason: format!("expected a JSON object, found {}", json_kind(&other)),
            }),
        }
    }

    /// The error code, if the call failed. Empty codes count as absent.
    pub fn error_code(&self) -> Option<&str> {
        self.str_field("errorCode").filter(|code| !code.is_empty())
    }

    pub fn error_message(&self) -> Option<&str> {
        self.str_field("errorMessage")
    }

    pub fn request_parameters(&self) -> Option<&Map<String, Value>> {
        self.document.get("requestParameters")?.as_object()
    }

    pub fn response_elements(&self) -> Option<&Map<String, Value>> {
        self.document.get("responseElements")?.as_object()
    }

    /// A string-valued request parameter such as `keyId` or `bucketName`.
    pub fn request_parameter(&self, name: &str) -> Option<&str> {
        self.request_parameters()?.get(name)?.as_str()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.document
    }

    fn str_field(&self, name: &str) -> Option<&str> {
        self.document.get(name)?.as_str()
    }
}

/// Render a detail value for key/value dumps: strings bare, everything
/// else as compact JSON.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
