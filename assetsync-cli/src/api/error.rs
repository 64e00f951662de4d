//! API error type
//!
//! Travels inside `anyhow::Error`; callers that need to classify a failure
//! downcast to it.

/// Failure of a single request to the asset service
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Request never produced a response (connect error, timeout, ...)
    Transport(String),
    /// Non-success HTTP status; `error_key` comes from the body when present
    Status {
        status: u16,
        error_key: Option<String>,
        message: String,
    },
    /// Success status but the body could not be decoded
    Malformed(String),
}

impl ApiError {
    /// Server-provided error key, if the body carried one
    pub fn error_key(&self) -> Option<&str> {
        match self {
            ApiError::Status { error_key, .. } => error_key.as_deref(),
            _ => None,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ApiError::Transport(message) => message,
            ApiError::Status { message, .. } => message,
            ApiError::Malformed(message) => message,
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::Transport(message) => write!(f, "Request failed: {}", message),
            ApiError::Status {
                status, message, ..
            } => write!(f, "API error {}: {}", status, message),
            ApiError::Malformed(message) => write!(f, "Malformed response: {}", message),
        }
    }
}

impl std::error::Error for ApiError {}
