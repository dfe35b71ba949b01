//! Response envelope used by the backend.
//!
//! Most endpoints wrap their payload as `{code, message, data}` where a
//! `code` of 2000 means success. Some admin endpoints return the payload
//! bare. [`Payload`] accepts both shapes.
//!
//! A body is an envelope when it carries `statusCode`, or an integer `code`.
//! Records such as store info pages have a string `code` of their own and
//! stay bare.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use super::ApiError;

/// Envelope code signalling success
pub const SUCCESS_CODE: i64 = 2000;

#[derive(Debug, Clone, Deserialize)]
pub struct ApiEnvelope<T> {
    #[serde(alias = "statusCode")]
    pub code: i64,
    pub message: Option<String>,
    pub data: Option<T>,
}

impl<T> ApiEnvelope<T> {
    pub fn is_success(&self) -> bool {
        self.code == SUCCESS_CODE
    }

    /// Payload of a successful envelope, or [`ApiError::Rejected`].
    pub fn into_result(self) -> Result<Option<T>, ApiError> {
        if self.is_success() {
            Ok(self.data)
        } else {
            Err(ApiError::Rejected {
                code: self.code,
                message: self.message,
            })
        }
    }
}

#[derive(Debug)]
pub enum Payload<T> {
    Wrapped(ApiEnvelope<T>),
    Bare(T),
}

fn is_envelope(value: &Value) -> bool {
    match value.as_object() {
        Some(obj) => obj.contains_key("statusCode") || obj.get("code").is_some_and(Value::is_i64),
        None => false,
    }
}

impl<T: DeserializeOwned> Payload<T> {
    /// Decode a response body, keeping the real error when the data has the
    /// wrong shape.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_str(text)?;
        if is_envelope(&value) {
            serde_json::from_value(value).map(Payload::Wrapped)
        } else {
            serde_json::from_value(value).map(Payload::Bare)
        }
    }
}

impl<T> Payload<T> {
    pub fn into_data(self) -> Result<Option<T>, ApiError> {
        match self {
            Payload::Wrapped(envelope) => envelope.into_result(),
            Payload::Bare(data) => Ok(Some(data)),
        }
    }
}
