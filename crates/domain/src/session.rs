//! Session and user profile types

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::token::AccessToken;

/// Snapshot of the signed-in user as returned by the API.
///
/// Only the commonly used fields are typed; everything else the server sends
/// is preserved in `extra` so it survives a persist/load cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Server-side identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    /// Display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Email address
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Any other fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UserProfile {
    /// Creates a profile with a name and email.
    #[must_use]
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            email: Some(email.into()),
            ..Self::default()
        }
    }
}

/// A token paired with the user it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Current access token
    pub token: AccessToken,
    /// User snapshot, if one has been recorded
    pub user: Option<UserProfile>,
}
