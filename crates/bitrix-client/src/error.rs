//! Error types for Bitrix24 client operations

use thiserror::Error;

use crate::config::ConfigError;

/// Result type alias for Bitrix24 client operations
pub type Result<T> = std::result::Result<T, BitrixError>;

/// Errors that can occur during Bitrix24 client operations
#[derive(Error, Debug)]
pub enum BitrixError {
    /// A parameter object or a response failed its schema rules
    #[error("Validation failed: {0}")]
    Validation(String),

    /// HTTP request failed (connection, timeout, body read)
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The API host answered with a non-success status
    #[error("HTTP status {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body carried an `error` key
    #[error("Bitrix error {code}: {}", .description.as_deref().unwrap_or("no description"))]
    Api {
        code: String,
        description: Option<String>,
    },

    /// The upload-ticket destination rejected the file transfer
    #[error("Upload failed with status {status}: {body}")]
    Upload { status: u16, body: String },

    /// The response body was not valid JSON
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl BitrixError {
    /// Create an application error from the remote code and description
    pub fn api(code: impl Into<String>, description: Option<String>) -> Self {
        Self::Api {
            code: code.into(),
            description,
        }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Network or HTTP-level failure, including the upload leg
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Http(_) | Self::Status { .. } | Self::Upload { .. }
        )
    }

    /// Error reported inside an otherwise successful response body
    pub fn is_application(&self) -> bool {
        matches!(self, Self::Api { .. })
    }

    /// Remote error code, if this is an application error
    pub fn api_code(&self) -> Option<&str> {
        match self {
            Self::Api { code, .. } => Some(code),
            _ => None,
        }
    }
}
