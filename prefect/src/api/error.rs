use thiserror::Error;

use super::common::ApiErrorDetails;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Request timeout after {0} seconds")]
    Timeout(u64),

    #[error("Authentication failed (HTTP {status}): {message}")]
    Auth { status: u16, message: String },

    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Request rejected (HTTP {status}): {message}")]
    Validation {
        status: u16,
        message: String,
        #[source]
        details: Option<Box<ApiErrorDetails>>,
    },

    #[error("Too many requests, rate limited: {message}")]
    RateLimited { message: String },

    #[error("Server error (HTTP {status}): {message}")]
    Server { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl ApiError {
    /// HTTP status carried by the error, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Auth { status, .. }
            | ApiError::Validation { status, .. }
            | ApiError::Server { status, .. } => Some(*status),
            ApiError::NotFound { .. } => Some(404),
            ApiError::RateLimited { .. } => Some(429),
            ApiError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound { .. })
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Transport(_) | ApiError::Timeout(_))
    }

    /// Errors worth another attempt when the caller enabled retries.
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::Transport(e) => e.is_connect() || e.is_timeout() || e.is_request(),
            ApiError::Timeout(_) | ApiError::RateLimited { .. } | ApiError::Server { .. } => true,
            _ => false,
        }
    }

    /// A request rejected before it was sent, reported like a 400 from the server.
    pub(crate) fn invalid_request(message: impl Into<String>) -> Self {
        ApiError::Validation {
            status: 400,
            message: message.into(),
            details: None,
        }
    }

    /// Map a non-success status and its decoded message onto the taxonomy.
    pub(crate) fn from_status(
        status: u16,
        message: String,
        details: Option<Box<ApiErrorDetails>>,
    ) -> Self {
        match status {
            401 | 403 => ApiError::Auth { status, message },
            404 => ApiError::NotFound { message },
            429 => ApiError::RateLimited { message },
            500..=599 => ApiError::Server { status, message },
            _ => ApiError::Validation {
                status,
                message,
                details,
            },
        }
    }
}

pub trait ResultExt<T> {
    /// Turn a `NotFound` into `Ok(None)`, keeping every other error.
    ///
    /// Lets a repeated delete, or a read of something that may already be
    /// gone, be handled without matching on the error variant.
    fn optional(self) -> Result<Option<T>, ApiError>;
}

impl<T> ResultExt<T> for Result<T, ApiError> {
    fn optional(self) -> Result<Option<T>, ApiError> {
        match self {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }
}
