//! Error types for the Cloud Build client.
//!
//! # Design
//! Each variant names the stage that failed: encoding the request, reading a
//! YAML configuration, the transport call, decoding the response body, a
//! non-2xx status, or an error reported inside an [`Operation`] payload. The
//! underlying cause stays reachable through `source()`.
//!
//! [`Operation`]: crate::Operation

use thiserror::Error;

use crate::operation::Status;

/// Result alias for client operations.
pub type Result<T> = std::result::Result<T, ApiError>;

/// Failures raised by a [`crate::Transport`].
#[derive(Debug, Error)]
pub enum TransportError {
    /// The HTTP call itself failed (connect, DNS, TLS, protocol).
    #[error("transport call failed: {0}")]
    Request(String),

    /// The response arrived but its body could not be read.
    #[error("response body read failed: {0}")]
    Body(String),
}

/// Errors returned by [`crate::Client`], the request encoders and
/// [`crate::BuildConfig`] hydration.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The build configuration could not be serialized to JSON.
    #[error("request build failed: configuration could not be encoded: {0}")]
    Encoding(#[source] serde_json::Error),

    /// A YAML configuration stream could not be read.
    #[error("configuration input could not be read: {0}")]
    ConfigRead(#[from] std::io::Error),

    /// A YAML configuration is not well-formed for the schema.
    #[error("configuration could not be decoded: {0}")]
    ConfigDecode(#[from] serde_yaml::Error),

    /// The transport failed before a response body was available.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The service answered with a non-2xx status.
    #[error("service returned HTTP {status}{}", status_suffix(.error))]
    Status { status: u16, error: Option<Status> },

    /// The response body is not valid JSON for the expected shape.
    #[error("response decode failed: {0}")]
    Decoding(#[source] serde_json::Error),

    /// The service reported an error inside an operation payload.
    #[error("operation {name} failed: {status}")]
    Operation { name: String, status: Status },

    /// A follow-up request was derived from an operation that failed.
    #[error("cannot derive a request from failed operation {name}: {status}")]
    Guard { name: String, status: Status },

    /// The operation metadata does not identify a build.
    #[error("operation {0} has no build id in its metadata")]
    MissingBuildId(String),
}

fn status_suffix(error: &Option<Status>) -> String {
    error.as_ref().map(|e| format!(": {e}")).unwrap_or_default()
}

impl ApiError {
    pub fn is_decoding(&self) -> bool {
        matches!(self, ApiError::Decoding(_))
    }

    pub fn is_guard(&self) -> bool {
        matches!(self, ApiError::Guard { .. })
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Transport(_))
    }

    /// True for an HTTP 404 from the service.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::Status { status: 404, .. })
    }
}
