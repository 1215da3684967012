//! Error types for flagboard.
//!
//! One error enum covers the flag service, its HTTP surface, the outbound
//! clients and the panel. The HTTP status mapping lives here too so the
//! server handlers can return `Result<_, Error>` directly.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// The main error type for flagboard operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Request Errors ===
    /// A request body did not match the expected schema.
    #[error("invalid request: {message}")]
    Validation {
        /// Description of what was wrong with the request.
        message: String,
    },

    // === Upstream Errors ===
    /// An upstream service could not be reached or returned garbage.
    #[error("{service} unavailable: {message}")]
    UpstreamUnavailable {
        /// Which upstream was being called.
        service: &'static str,
        /// Description of what went wrong.
        message: String,
    },

    /// An upstream service answered with a non-success status.
    #[error("{service} responded with status {status}{}", detail_suffix(.detail.as_deref()))]
    UpstreamStatus {
        /// Which upstream was being called.
        service: &'static str,
        /// The HTTP status code returned.
        status: u16,
        /// The upstream's own explanation, taken from the response body.
        detail: Option<String>,
    },

    // === Host Errors ===
    /// Registration with the host runtime failed.
    #[error("host registration failed: {0}")]
    HostUnavailable(String),

    /// A panel action was attempted before the panel finished loading.
    #[error("panel is not ready")]
    PanelNotReady,

    // === I/O Errors ===
    /// File system or socket operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for flagboard operations.
pub type Result<T> = std::result::Result<T, Error>;

fn detail_suffix(detail: Option<&str>) -> String {
    detail.map(|d| format!(": {d}")).unwrap_or_default()
}

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a new validation error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new upstream-unavailable error.
    #[must_use]
    pub fn upstream(service: &'static str, message: impl Into<String>) -> Self {
        Self::UpstreamUnavailable {
            service,
            message: message.into(),
        }
    }

    /// Create a new host registration error.
    #[must_use]
    pub fn host_unavailable(message: impl Into<String>) -> Self {
        Self::HostUnavailable(message.into())
    }

    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Check if this error was caused by the caller's request.
    #[must_use]
    pub fn is_validation_error(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    /// Check if this error came from an upstream service.
    #[must_use]
    pub fn is_upstream_error(&self) -> bool {
        matches!(
            self,
            Self::UpstreamUnavailable { .. } | Self::UpstreamStatus { .. }
        )
    }

    /// The HTTP status this error maps to when returned from a handler.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::UpstreamUnavailable { .. } | Self::UpstreamStatus { .. } => {
                StatusCode::BAD_GATEWAY
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// JSON body sent back for failed requests.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, "request rejected");
        }

        let body = ErrorBody {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
