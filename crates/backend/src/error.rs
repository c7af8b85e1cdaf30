use common::models::ImageError;
use thiserror::Error;

/// Failures talking to the backend platform or the vision endpoint.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Non-success HTTP status; `message` is the server's own error text when it sent one.
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("request timeout: {0}")]
    Timeout(String),

    /// The response decoded but carried no analysis.
    #[error("Invalid response from analysis service")]
    MissingPayload,

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error(transparent)]
    InvalidImage(#[from] ImageError),

    #[error("configuration error: {0}")]
    Configuration(String),
}

impl BackendError {
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_decode() {
            Self::Serialization(err.to_string())
        } else if err.is_connect() {
            Self::Network(format!("connection failed: {err}"))
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for BackendError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, BackendError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display_keeps_server_message() {
        let err = BackendError::api(401, "Unauthorized");
        assert_eq!(err.to_string(), "API error 401: Unauthorized");
        assert!(matches!(err, BackendError::Api { status: 401, .. }));
    }

    #[test]
    fn test_image_error_is_transparent() {
        let err = BackendError::from(ImageError::UnsupportedFormat);
        assert!(err.to_string().starts_with("Invalid image format"));
    }
}
