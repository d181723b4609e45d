//! Warden Domain - Core token and request types
//!
//! This crate defines the domain model for the Warden bearer-token client.
//! All types here are pure Rust with no I/O dependencies.

pub mod error;
pub mod request;
pub mod response;
pub mod session;
pub mod token;
pub mod wire;

pub use error::{DomainError, DomainResult};
pub use request::{ApiRequest, Header, Headers, HttpMethod};
pub use response::{ApiResponse, StatusCode};
pub use session::{Session, UserProfile};
pub use token::{AccessToken, decode_expiry, decode_subject, is_expired_at, preview};
pub use wire::{LoginRequest, LoginResponse, RefreshResponse};
