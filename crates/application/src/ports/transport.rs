//! HTTP transport port

use async_trait::async_trait;
use warden_domain::{ApiRequest, ApiResponse};

/// Errors that prevent a request from producing a response.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum TransportError {
    /// The request URL could not be parsed.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// The request did not complete in time.
    #[error("request timed out after {timeout_ms} ms")]
    Timeout {
        /// Configured timeout.
        timeout_ms: u64,
    },

    /// The server could not be reached.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// The response body could not be read.
    #[error("failed to read response body: {0}")]
    Body(String),

    /// Any other transport failure.
    #[error("{0}")]
    Other(String),
}

/// Port for sending HTTP requests.
///
/// HTTP error statuses are returned as `Ok` responses; `Err` means no
/// response was obtained at all.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends `request` and returns the server's response.
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be delivered or the response
    /// cannot be read.
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError>;
}
