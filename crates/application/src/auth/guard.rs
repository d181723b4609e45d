//! Route guard for protected views.

use std::sync::Arc;

use tracing::{debug, warn};

use super::token_store::TokenStore;
use crate::ports::Navigator;

/// Outcome of a guard check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    /// A usable token is present.
    Allow,
    /// The caller was sent to the login screen.
    RedirectToLogin,
}

/// Blocks navigation to protected views without a usable token.
///
/// A missing token redirects without touching the store. An expired token
/// redirects too; the session is left in place so that the next API call can
/// still attempt a refresh through the cookie.
pub struct AccessGuard {
    store: Arc<TokenStore>,
    navigator: Arc<dyn Navigator>,
    skew_seconds: i64,
}

impl AccessGuard {
    /// Creates a guard treating tokens within `skew_seconds` of expiry as expired.
    #[must_use]
    pub fn new(store: Arc<TokenStore>, navigator: Arc<dyn Navigator>, skew_seconds: i64) -> Self {
        Self {
            store,
            navigator,
            skew_seconds,
        }
    }

    /// Decides whether navigation may proceed, redirecting when it may not.
    #[must_use]
    pub fn check(&self) -> AccessDecision {
        let decision = match self.evaluate() {
            Ok(decision) => decision,
            Err(err) => {
                warn!(error = %err, "session unreadable, denying access");
                AccessDecision::RedirectToLogin
            }
        };
        if decision == AccessDecision::RedirectToLogin {
            self.navigator.redirect_to_login();
        }
        decision
    }

    /// Shorthand for `check() == AccessDecision::Allow`.
    #[must_use]
    pub fn can_activate(&self) -> bool {
        self.check() == AccessDecision::Allow
    }

    fn evaluate(&self) -> Result<AccessDecision, crate::ports::StorageError> {
        if self.store.raw_token()?.is_none() {
            debug!("no token, redirecting to login");
            return Ok(AccessDecision::RedirectToLogin);
        }
        if self.store.is_expired(self.skew_seconds)? {
            debug!("token expired, redirecting to login");
            return Ok(AccessDecision::RedirectToLogin);
        }
        Ok(AccessDecision::Allow)
    }
}

impl std::fmt::Debug for AccessGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessGuard")
            .field("skew_seconds", &self.skew_seconds)
            .finish_non_exhaustive()
    }
}
