//! Bearer-token authentication.
//!
//! This module provides:
//! - Persistent token storage with expiry tracking
//! - Single-flight token refresh shared by concurrent requests
//! - A transport decorator that attaches the token and retries once on 401
//! - Route guarding and the login/logout session lifecycle

mod client;
mod guard;
mod refresh;
mod session;
mod token_store;

#[cfg(test)]
mod test_support;

pub use client::AuthenticatingClient;
pub use guard::{AccessDecision, AccessGuard};
pub use refresh::{RefreshCoordinator, RefreshOutcome};
pub use session::SessionService;
pub use token_store::{EXPIRY_KEY, TOKEN_KEY, TokenStore, USER_KEY};
