//! Errors from the one-shot REST re-seed calls.

use thiserror::Error;

use super::category::ErrorCategory;
use crate::traits::HttpError;

/// Failure of an idempotent re-seed GET.
///
/// Only [`ApiError::Unauthorized`] changes control flow (it forces the
/// collaborator's logout flow); everything else is logged and the module
/// continues with its live subscription.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// The backend rejected the credential (HTTP 401).
    #[error("unauthorized request to {path}")]
    Unauthorized { path: String },

    /// Any other non-2xx status.
    #[error("{path} returned HTTP {status}: {message}")]
    Status {
        path: String,
        status: u16,
        message: String,
    },

    /// The response body did not match the expected shape.
    #[error("failed to decode response from {path}: {message}")]
    Decode { path: String, message: String },

    /// The request never produced a response.
    #[error("request to {path} failed: {source}")]
    Request {
        path: String,
        #[source]
        source: HttpError,
    },
}

impl ApiError {
    pub fn requires_reauth(&self) -> bool {
        matches!(self, ApiError::Unauthorized { .. })
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            ApiError::Unauthorized { .. } => ErrorCategory::Auth,
            ApiError::Status { status, .. } if *status >= 500 => ErrorCategory::Server,
            ApiError::Status { .. } | ApiError::Decode { .. } => ErrorCategory::Client,
            ApiError::Request { .. } => ErrorCategory::Network,
        }
    }

    /// Get a short error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::Unauthorized { .. } => "E_API_AUTH",
            ApiError::Status { .. } => "E_API_STATUS",
            ApiError::Decode { .. } => "E_API_DECODE",
            ApiError::Request { .. } => "E_API_REQUEST",
        }
    }
}
