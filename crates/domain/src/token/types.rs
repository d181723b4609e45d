//! Access token type

use std::fmt;

use chrono::{DateTime, Utc};

use super::claims::{decode_expiry, decode_subject, is_expired_at};

/// An opaque bearer credential with the metadata decoded from it.
///
/// The expiry and subject are derived once from the raw value and cannot be
/// changed independently of it.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    raw: String,
    expires_at: Option<DateTime<Utc>>,
    subject: Option<String>,
}

impl AccessToken {
    /// Parses a raw token, decoding its claims where possible.
    #[must_use]
    pub fn parse(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let expires_at = decode_expiry(&raw);
        let subject = decode_subject(&raw);
        Self {
            raw,
            expires_at,
            subject,
        }
    }

    /// Rebuilds a token from a raw value and a previously recorded expiry.
    #[must_use]
    pub fn from_parts(raw: impl Into<String>, expires_at: Option<DateTime<Utc>>) -> Self {
        let raw = raw.into();
        let subject = decode_subject(&raw);
        Self {
            raw,
            expires_at,
            subject,
        }
    }

    /// The raw credential.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Consumes the token, returning the raw credential.
    #[must_use]
    pub fn into_string(self) -> String {
        self.raw
    }

    /// When the token expires, if known.
    #[must_use]
    pub const fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    /// The identity the token was issued to, if present.
    #[must_use]
    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    /// Checks expiry against `now` plus `skew_seconds`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>, skew_seconds: i64) -> bool {
        is_expired_at(self.expires_at, now, skew_seconds)
    }

    /// Seconds until expiry, or None if the expiry is unknown.
    #[must_use]
    pub fn seconds_until_expiry(&self, now: DateTime<Utc>) -> Option<i64> {
        self.expires_at.map(|exp| (exp - now).num_seconds())
    }

    /// Short prefix of the token that is safe to log.
    #[must_use]
    pub fn preview(&self) -> String {
        preview(&self.raw)
    }
}

/// Get a preview of a credential (first 8 chars + ...).
#[must_use]
pub fn preview(token: &str) -> String {
    match token.char_indices().nth(8) {
        Some((idx, _)) if token.len() > 12 => format!("{}...", &token[..idx]),
        _ => token.to_string(),
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("raw", &self.preview())
            .field("expires_at", &self.expires_at)
            .field("subject", &self.subject)
            .finish()
    }
}
