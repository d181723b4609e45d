//! Domain error types

use thiserror::Error;

/// Errors raised while building or inspecting requests.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// The request URL cannot be parsed as an absolute URL.
    #[error("invalid URL {url}: {reason}")]
    InvalidUrl {
        /// The rejected URL.
        url: String,
        /// Parser message.
        reason: String,
    },

    /// A JSON payload could not be serialized.
    #[error("cannot serialize request body: {0}")]
    Serialization(String),
}

/// Result type alias for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
