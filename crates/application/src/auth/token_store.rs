//! Persistent session storage with expiry tracking.
//!
//! The store keeps three keys in the backing [`KeyValueStore`]: the raw
//! token, its decoded expiry in epoch milliseconds, and the JSON user
//! profile. A reader/writer lock makes multi-key updates appear atomic, so
//! no reader ever pairs a new token with the previous token's expiry.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tracing::{debug, warn};
use warden_domain::{AccessToken, Session, UserProfile};

use crate::ports::{Clock, KeyValueStore, StorageError};

/// Storage key for the raw access token.
pub const TOKEN_KEY: &str = "token";
/// Storage key for the token expiry in epoch milliseconds.
pub const EXPIRY_KEY: &str = "token_exp_ms";
/// Storage key for the JSON user profile.
pub const USER_KEY: &str = "user";

/// Thread-safe session store over a key-value backend.
pub struct TokenStore {
    storage: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    lock: RwLock<()>,
}

impl TokenStore {
    /// Create a store over `storage`, reading time from `clock`.
    #[must_use]
    pub fn new(storage: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            storage,
            clock,
            lock: RwLock::new(()),
        }
    }

    /// Stores a raw token together with its decoded expiry.
    ///
    /// A token without a decodable expiry removes any previously stored one.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects a write.
    pub fn set_token(&self, raw: &str) -> Result<AccessToken, StorageError> {
        let token = AccessToken::parse(raw);
        let _guard = self.lock.write();

        // The old expiry goes first so a failed write can only leave the
        // expiry unknown, never stale.
        self.storage.remove(EXPIRY_KEY)?;
        self.storage.set(TOKEN_KEY, raw)?;
        if let Some(exp) = token.expires_at() {
            self.storage
                .set(EXPIRY_KEY, &exp.timestamp_millis().to_string())?;
        }

        debug!(
            token = %token.preview(),
            expires_at = ?token.expires_at(),
            "stored access token"
        );
        Ok(token)
    }

    /// Returns the raw token, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    pub fn raw_token(&self) -> Result<Option<String>, StorageError> {
        let _guard = self.lock.read();
        self.storage.get(TOKEN_KEY)
    }

    /// Returns the current token with its recorded expiry.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    pub fn token(&self) -> Result<Option<AccessToken>, StorageError> {
        let _guard = self.lock.read();
        let Some(raw) = self.storage.get(TOKEN_KEY)? else {
            return Ok(None);
        };
        let expires_at = self.read_expiry()?;
        Ok(Some(AccessToken::from_parts(raw, expires_at)))
    }

    /// Returns the recorded expiry of the current token.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    pub fn expires_at(&self) -> Result<Option<DateTime<Utc>>, StorageError> {
        let _guard = self.lock.read();
        self.read_expiry()
    }

    /// Whether the current token expires within `skew_seconds`.
    ///
    /// Returns `false` when no expiry is recorded: an unknown expiry never
    /// blocks a request, the server gets the final word.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    pub fn is_expired(&self, skew_seconds: i64) -> Result<bool, StorageError> {
        let expires_at = self.expires_at()?;
        Ok(warden_domain::is_expired_at(
            expires_at,
            self.clock.now(),
            skew_seconds,
        ))
    }

    /// Stores the user profile.
    ///
    /// # Errors
    ///
    /// Returns an error if the profile cannot be serialized or written.
    pub fn set_user(&self, user: &UserProfile) -> Result<(), StorageError> {
        let json =
            serde_json::to_string(user).map_err(|e| StorageError::Serialization(e.to_string()))?;
        let _guard = self.lock.write();
        self.storage.set(USER_KEY, &json)
    }

    /// Returns the stored user profile, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read or the stored profile
    /// is not valid JSON.
    pub fn user(&self) -> Result<Option<UserProfile>, StorageError> {
        let _guard = self.lock.read();
        self.read_user()
    }

    /// Returns the token and user as one consistent snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    pub fn session(&self) -> Result<Option<Session>, StorageError> {
        let _guard = self.lock.read();
        let Some(raw) = self.storage.get(TOKEN_KEY)? else {
            return Ok(None);
        };
        let token = AccessToken::from_parts(raw, self.read_expiry()?);
        let user = self.read_user()?;
        Ok(Some(Session { token, user }))
    }

    /// Removes token, expiry and user. Clearing an empty store is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects a removal.
    pub fn clear(&self) -> Result<(), StorageError> {
        let _guard = self.lock.write();
        self.storage.remove(USER_KEY)?;
        self.storage.remove(TOKEN_KEY)?;
        self.storage.remove(EXPIRY_KEY)?;
        debug!("cleared session");
        Ok(())
    }

    fn read_expiry(&self) -> Result<Option<DateTime<Utc>>, StorageError> {
        let Some(value) = self.storage.get(EXPIRY_KEY)? else {
            return Ok(None);
        };
        let parsed = value
            .trim()
            .parse::<i64>()
            .ok()
            .and_then(DateTime::from_timestamp_millis);
        if parsed.is_none() {
            warn!(value = %value, "ignoring unreadable token expiry");
        }
        Ok(parsed)
    }

    fn read_user(&self) -> Result<Option<UserProfile>, StorageError> {
        self.storage
            .get(USER_KEY)?
            .map(|json| {
                serde_json::from_str(&json).map_err(|e| StorageError::Serialization(e.to_string()))
            })
            .transpose()
    }
}

impl std::fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStore").finish_non_exhaustive()
    }
}
