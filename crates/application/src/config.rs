//! Client configuration

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration sources could not be read or parsed.
    #[error("failed to load configuration: {0}")]
    Load(String),

    /// A value is present but unusable.
    #[error("invalid configuration: {field}: {message}")]
    Invalid {
        /// Offending field.
        field: &'static str,
        /// What is wrong with it.
        message: String,
    },
}

/// Settings shared by the authenticating client and its collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Prefix identifying requests to the authenticated API surface.
    pub api_base_url: String,
    /// Path of the refresh endpoint, relative to `api_base_url`.
    #[serde(default = "default_refresh_path")]
    pub refresh_path: String,
    /// Path of the login endpoint.
    #[serde(default = "default_login_path")]
    pub login_path: String,
    /// Path of the logout endpoint.
    #[serde(default = "default_logout_path")]
    pub logout_path: String,
    /// Path returning the current user's profile.
    #[serde(default = "default_me_path")]
    pub me_path: String,
    /// URL fragments identifying endpoints that never carry a bearer token.
    #[serde(default = "default_public_paths")]
    pub public_paths: Vec<String>,
    /// Safety margin applied to token expiry checks.
    #[serde(default = "default_expiry_skew_seconds")]
    pub expiry_skew_seconds: i64,
    /// Per-request timeout used by the HTTP transport.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// File backing the session store; the user data directory when unset.
    #[serde(default)]
    pub storage_path: Option<PathBuf>,
}

fn default_refresh_path() -> String {
    "/auth/refresh".to_string()
}

fn default_login_path() -> String {
    "/auth/login".to_string()
}

fn default_logout_path() -> String {
    "/auth/logout".to_string()
}

fn default_me_path() -> String {
    "/auth/me".to_string()
}

fn default_public_paths() -> Vec<String> {
    vec!["/auth/login".to_string(), "/auth/register".to_string()]
}

const fn default_expiry_skew_seconds() -> i64 {
    30
}

const fn default_request_timeout_ms() -> u64 {
    30_000
}

impl ClientConfig {
    /// Creates a configuration with defaults for everything but the API base.
    #[must_use]
    pub fn new(api_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            refresh_path: default_refresh_path(),
            login_path: default_login_path(),
            logout_path: default_logout_path(),
            me_path: default_me_path(),
            public_paths: default_public_paths(),
            expiry_skew_seconds: default_expiry_skew_seconds(),
            request_timeout_ms: default_request_timeout_ms(),
            storage_path: None,
        }
    }

    /// Checks values that serde cannot.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for an empty API base, a negative
    /// skew or a zero timeout.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_base_url.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "api_base_url",
                message: "must not be empty".to_string(),
            });
        }
        if self.expiry_skew_seconds < 0 {
            return Err(ConfigError::Invalid {
                field: "expiry_skew_seconds",
                message: format!("must not be negative, got {}", self.expiry_skew_seconds),
            });
        }
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "request_timeout_ms",
                message: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    /// Joins `path` onto the API base URL.
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.api_base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Absolute URL of the refresh endpoint.
    #[must_use]
    pub fn refresh_url(&self) -> String {
        self.endpoint(&self.refresh_path)
    }

    /// Whether `url` targets the authenticated API surface.
    #[must_use]
    pub fn is_api_call(&self, url: &str) -> bool {
        url.starts_with(&self.api_base_url)
    }

    /// Whether `url` targets a public endpoint.
    #[must_use]
    pub fn is_public(&self, url: &str) -> bool {
        self.public_paths.iter().any(|p| url.contains(p.as_str()))
    }

    /// Whether requests to `url` carry the bearer token and get refreshed on 401.
    #[must_use]
    pub fn requires_auth(&self, url: &str) -> bool {
        self.is_api_call(url) && !self.is_public(url)
    }
}
