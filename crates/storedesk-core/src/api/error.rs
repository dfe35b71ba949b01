use reqwest::header::InvalidHeaderValue;
use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Unauthorized - token may be expired: {0}")]
    Unauthorized(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Rate limited - please wait before retrying")]
    RateLimited,

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Invalid authorization header: {0}")]
    InvalidHeader(#[from] InvalidHeaderValue),

    #[error("Request rejected (code {code}): {}", message.as_deref().unwrap_or("no message"))]
    Rejected { code: i64, message: Option<String> },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

#[derive(Deserialize)]
struct MessageBody {
    message: Option<String>,
}

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let truncated = Self::truncate_body(body);
        match status.as_u16() {
            401 => ApiError::Unauthorized(truncated),
            403 => ApiError::AccessDenied(truncated),
            404 => ApiError::NotFound(truncated),
            429 => ApiError::RateLimited,
            500..=599 => ApiError::ServerError(truncated),
            _ => ApiError::InvalidResponse(format!("Status {}: {}", status, truncated)),
        }
    }

    /// Human-readable message supplied by the backend, if any.
    ///
    /// Envelope rejections carry it directly; HTTP error responses carry it
    /// as a `message` field in their JSON body.
    pub fn server_message(&self) -> Option<String> {
        let body = match self {
            ApiError::Rejected { message, .. } => return message.clone(),
            ApiError::AccessDenied(body)
            | ApiError::Unauthorized(body)
            | ApiError::NotFound(body)
            | ApiError::ServerError(body) => body,
            ApiError::InvalidResponse(text) => text.split_once(": ").map(|(_, b)| b)?,
            ApiError::RateLimited | ApiError::NetworkError(_) | ApiError::InvalidHeader(_) => {
                return None
            }
        };

        serde_json::from_str::<MessageBody>(body)
            .ok()
            .and_then(|b| b.message)
            .filter(|m| !m.trim().is_empty())
    }

    /// Whether the request never produced an HTTP response.
    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::NetworkError(_))
    }

    /// Whether the backend refused the caller's credential.
    pub fn is_auth_rejection(&self) -> bool {
        matches!(self, ApiError::Unauthorized(_) | ApiError::AccessDenied(_))
    }
}
