//! Provisioning error types.

use thiserror::Error;

/// Provisioning error type.
#[derive(Debug, Error)]
pub enum ProvisionError {
    /// Token endpoint unreachable or admin credentials rejected.
    #[error("authentication unavailable: {0}")]
    AuthUnavailable(String),

    /// The admin API answered with a status outside the expected set.
    #[error("unexpected status {status}: {body}")]
    UnexpectedStatus {
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// Readiness polling exhausted its attempt budget.
    #[error("timed out waiting for Keycloak after {attempts} attempts")]
    TimedOut {
        /// Number of authentication attempts made.
        attempts: u32,
    },

    /// A required identifier could not be resolved.
    #[error("missing dependency: {0}")]
    MissingDependency(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// HTTP request error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProvisionError {
    /// Builds an `UnexpectedStatus` from a raw status code and body.
    pub fn unexpected(status: reqwest::StatusCode, body: impl Into<String>) -> Self {
        Self::UnexpectedStatus {
            status: status.as_u16(),
            body: body.into(),
        }
    }
}

/// Provisioning result type.
pub type ProvisionResult<T> = Result<T, ProvisionError>;
