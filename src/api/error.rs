//! Remote service error types.
//!
//! Messages are deliberately generic: response bodies from the service may
//! echo request headers, so they are logged at debug level and never carried
//! inside an error.

use std::time::Duration;
use thiserror::Error;

/// Result type for remote service operations.
pub type ApiResult<T> = Result<T, ApiError>;

/// Errors returned by a [`ReactorService`](super::ReactorService).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("remote service returned HTTP {status} for {endpoint}")]
    Status { status: u16, endpoint: String },

    #[error("remote service rejected the credentials (HTTP {status})")]
    Unauthorized { status: u16 },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("rate limited: retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("request to {endpoint} could not be completed")]
    Transport { endpoint: String },

    #[error("malformed response from {endpoint}")]
    Decode { endpoint: String },

    #[error("invalid client configuration: {0}")]
    Config(String),
}

impl ApiError {
    /// Returns true if this error represents a 429 rate-limit response.
    pub fn is_rate_limited(&self) -> bool {
        match self {
            ApiError::RateLimited { .. } => true,
            ApiError::Status { status, .. } => *status == 429,
            _ => false,
        }
    }

    /// Returns the retry-after duration if this is a rate-limit error.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            ApiError::RateLimited { retry_after_secs } => {
                Some(Duration::from_secs(*retry_after_secs))
            }
            _ => None,
        }
    }
}
