//! SDK error types and handling
//!
//! Errors raised while talking to the task server or the model API.

use course_core::CoreError;
use thiserror::Error;

/// The main error type for the SDK
#[derive(Error, Debug)]
pub enum SdkError {
    /// API returned an error response
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    /// Network or connection error
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// Request timed out
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    /// Rate limit exceeded
    #[error("Rate limit exceeded. Retry after {retry_after} seconds")]
    RateLimited { retry_after: u64 },

    /// Authentication failed
    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    /// Authorization failed
    #[error("Access denied: {0}")]
    AuthorizationError(String),

    /// Resource not found
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// URL parsing error
    #[error("Invalid URL: {0}")]
    UrlError(#[from] url::ParseError),

    /// Local file error (cache, audio, images)
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Response body could not be read in the expected form
    #[error("Invalid response body: {0}")]
    InvalidBody(String),

    /// Server error
    #[error("Server error: {0}")]
    ServerError(String),

    /// The model API answered, but not with anything usable
    #[error("Model error: {0}")]
    LlmError(String),

    /// A reply decoded but violated the protocol
    #[error(transparent)]
    Protocol(#[from] CoreError),

    /// Unknown error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

/// Result type alias for SDK operations
pub type SdkResult<T> = Result<T, SdkError>;

/// Error body shapes sent by the task server and by OpenAI-compatible APIs.
#[derive(Debug, serde::Deserialize)]
#[serde(untagged)]
enum ErrorBody {
    OpenAi { error: OpenAiError },
    Course { message: serde_json::Value },
}

#[derive(Debug, serde::Deserialize)]
struct OpenAiError {
    message: String,
}

impl SdkError {
    /// Create an API error from a response body
    pub fn from_response(status: u16, body: &str) -> Self {
        let message = match serde_json::from_str::<ErrorBody>(body) {
            Ok(ErrorBody::OpenAi { error }) => error.message,
            Ok(ErrorBody::Course { message }) => match message {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            },
            Err(_) => body.to_string(),
        };

        match status {
            401 => SdkError::AuthenticationError(message),
            403 => SdkError::AuthorizationError(message),
            404 => SdkError::NotFound(message),
            429 => SdkError::RateLimited { retry_after: 60 },
            500..=599 => SdkError::ServerError(message),
            _ => SdkError::ApiError { status, message },
        }
    }

    /// Check if the error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SdkError::NetworkError(_)
                | SdkError::Timeout(_)
                | SdkError::RateLimited { .. }
                | SdkError::ServerError(_)
        )
    }

    /// Get the HTTP status code if available
    pub fn status_code(&self) -> Option<u16> {
        match self {
            SdkError::ApiError { status, .. } => Some(*status),
            SdkError::RateLimited { .. } => Some(429),
            SdkError::AuthenticationError(_) => Some(401),
            SdkError::AuthorizationError(_) => Some(403),
            SdkError::NotFound(_) => Some(404),
            SdkError::ServerError(_) => Some(500),
            SdkError::NetworkError(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

impl From<SdkError> for CoreError {
    fn from(err: SdkError) -> Self {
        match err {
            SdkError::Protocol(inner) => inner,
            SdkError::ConfigurationError(msg) => CoreError::Configuration(msg),
            SdkError::SerializationError(e) => CoreError::Serialization(e.to_string()),
            SdkError::NotFound(msg) => CoreError::NotFound(msg),
            other => CoreError::Transport(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_from_course_body() {
        let body = r#"{"code": -100, "message": "Invalid API key"}"#;
        let error = SdkError::from_response(401, body);

        assert!(matches!(error, SdkError::AuthenticationError(ref m) if m == "Invalid API key"));
    }

    #[test]
    fn test_error_from_openai_body() {
        let body = r#"{"error": {"message": "model not found", "type": "invalid_request_error"}}"#;
        let error = SdkError::from_response(400, body);

        match error {
            SdkError::ApiError { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "model not found");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_error_is_retryable() {
        assert!(SdkError::RateLimited { retry_after: 60 }.is_retryable());
        assert!(SdkError::ServerError("boom".into()).is_retryable());
        assert!(!SdkError::NotFound("notes.json".into()).is_retryable());
    }

    #[test]
    fn test_into_core_error() {
        let core: CoreError = SdkError::Timeout(5).into();
        assert!(matches!(core, CoreError::Transport(_)));

        let core: CoreError =
            SdkError::Protocol(CoreError::Validation("bad grant".into())).into();
        assert!(matches!(core, CoreError::Validation(_)));
    }
}
