//! Application error types

use thiserror::Error;
use warden_domain::DomainError;

use crate::ports::{StorageError, TransportError};

/// Authentication failures.
///
/// Cloneable because a single refresh outcome is handed to every request
/// waiting on that refresh.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    /// The refresh request never produced a response.
    #[error("refresh request failed: {0}")]
    RefreshTransport(String),

    /// The refresh endpoint answered with a non-success status.
    #[error("refresh rejected with status {status}")]
    RefreshRejected {
        /// HTTP status returned by the endpoint.
        status: u16,
    },

    /// The login endpoint answered with a non-success status.
    #[error("login rejected with status {status}")]
    LoginRejected {
        /// HTTP status returned by the endpoint.
        status: u16,
    },

    /// A token endpoint returned a body that could not be parsed.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// A token endpoint succeeded but did not include `access_token`.
    #[error("response did not include an access token")]
    MissingAccessToken,

    /// The request driving the refresh was dropped before it completed.
    #[error("refresh abandoned before completion")]
    RefreshAbandoned,

    /// The session could not be persisted.
    #[error("session storage failed: {0}")]
    Storage(String),
}

impl From<StorageError> for AuthError {
    fn from(err: StorageError) -> Self {
        Self::Storage(err.to_string())
    }
}

/// Errors surfaced by [`AuthenticatingClient::send`](crate::AuthenticatingClient::send).
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request could not be delivered.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Authentication failed definitively; the session has been cleared.
    #[error("authentication failed: {0}")]
    Auth(#[from] AuthError),

    /// The session store failed.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The request itself was invalid.
    #[error(transparent)]
    Domain(#[from] DomainError),
}

/// Result type alias for client operations.
pub type ClientResult<T> = Result<T, ClientError>;
