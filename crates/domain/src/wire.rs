//! Wire payloads exchanged with the authentication endpoints

use serde::{Deserialize, Serialize};

use crate::session::UserProfile;

/// Body returned by the refresh endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RefreshResponse {
    /// The new access token
    #[serde(default)]
    pub access_token: Option<String>,
}

impl RefreshResponse {
    /// Returns the new token; an empty string counts as absent.
    #[must_use]
    pub fn into_token(self) -> Option<String> {
        self.access_token.filter(|t| !t.is_empty())
    }
}

/// Credentials posted to the login endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
    /// Account email
    pub email: &'a str,
    /// Account password
    pub password: &'a str,
}

/// Body returned by the login endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginResponse {
    /// Issued access token
    #[serde(default)]
    pub access_token: Option<String>,
    /// Profile of the authenticated user
    #[serde(default)]
    pub user: Option<UserProfile>,
}
