//! Warden Application - Token lifecycle core
//!
//! This crate defines the application layer with:
//! - Port traits (interfaces for storage, transport, navigation and time)
//! - The token store, refresh coordinator and authenticating client
//! - Application-level configuration and error handling

pub mod auth;
pub mod config;
pub mod error;
pub mod ports;

pub use auth::{
    AccessDecision, AccessGuard, AuthenticatingClient, RefreshCoordinator, SessionService,
    TokenStore,
};
pub use config::{ClientConfig, ConfigError};
pub use error::{AuthError, ClientError};
pub use ports::{Clock, KeyValueStore, Navigator, StorageError, Transport, TransportError};
