//! Response envelope shared by every endpoint.
//!
//! ```json
//! {"success": true, "data": [...]}
//! {"success": false, "error": "not found"}
//! {"success": false, "error": [{"message": "name required"}, {"message": "email invalid"}]}
//! ```

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ApiError;

const DEFAULT_FAILURE: &str = "API request failed";

/// Envelope wrapping every API response body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Envelope {
    /// Missing `success` is treated as success; only an explicit `false` fails.
    #[serde(default = "default_success")]
    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<EnvelopeError>,
}

fn default_success() -> bool {
    true
}

/// `error` is either a plain string or a list of `{message}` entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EnvelopeError {
    Message(String),
    List(Vec<ErrorEntry>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEntry {
    #[serde(default)]
    pub message: String,
}

impl EnvelopeError {
    /// Human-readable message; list entries are joined with `", "`.
    pub fn message(&self) -> String {
        match self {
            EnvelopeError::Message(m) => m.clone(),
            EnvelopeError::List(entries) => entries
                .iter()
                .map(|e| e.message.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

impl Envelope {
    /// Parse a raw JSON body into an envelope, failing on `success: false`.
    pub fn from_body(body: Value) -> Result<Self, ApiError> {
        let env: Envelope = serde_json::from_value(body)
            .map_err(|e| ApiError::Decode(format!("envelope: {}", e)))?;
        env.into_result()
    }

    /// Turn a `success: false` envelope into [`ApiError::Api`].
    pub fn into_result(self) -> Result<Self, ApiError> {
        if self.success {
            return Ok(self);
        }
        let message = match &self.error {
            Some(err) => {
                let m = err.message();
                if m.is_empty() { DEFAULT_FAILURE.to_string() } else { m }
            }
            None => DEFAULT_FAILURE.to_string(),
        };
        Err(ApiError::Api { message })
    }

    /// Decode `data` into `T`. A missing or null `data` decodes as `T::default()`.
    pub fn data_as<T: DeserializeOwned + Default>(&self) -> Result<T, ApiError> {
        match &self.data {
            None | Some(Value::Null) => Ok(T::default()),
            Some(v) => serde_json::from_value(v.clone())
                .map_err(|e| ApiError::Decode(format!("data: {}", e))),
        }
    }

    /// Decode `data` into `T`, requiring it to be present.
    pub fn require_data<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        match &self.data {
            None | Some(Value::Null) => Err(ApiError::Decode("data: missing".into())),
            Some(v) => serde_json::from_value(v.clone())
                .map_err(|e| ApiError::Decode(format!("data: {}", e))),
        }
    }

    /// `data` as a list of raw records; anything other than an array is empty.
    pub fn rows(&self) -> Vec<Value> {
        match &self.data {
            Some(Value::Array(items)) => items.clone(),
            _ => Vec::new(),
        }
    }
}
