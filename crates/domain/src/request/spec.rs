//! Outbound request type

use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

use super::header::AUTHORIZATION;
use super::{Headers, HttpMethod};
use crate::error::{DomainError, DomainResult};

const BEARER_PREFIX: &str = "Bearer ";

/// A request the client is asked to dispatch.
///
/// The `id` identifies the logical request: a retry after a token refresh
/// keeps the same id so both network attempts can be correlated in logs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiRequest {
    /// Unique identifier for this logical request
    pub id: Uuid,
    /// HTTP method
    pub method: HttpMethod,
    /// Absolute target URL
    pub url: String,
    /// HTTP headers
    #[serde(default)]
    pub headers: Headers,
    /// Optional request body
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

impl ApiRequest {
    /// Creates a request without a body.
    #[must_use]
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            method,
            url: url.into(),
            headers: Headers::new(),
            body: None,
        }
    }

    /// Creates a GET request with the given URL.
    #[must_use]
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, url)
    }

    /// Creates a POST request carrying `payload` serialized as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload cannot be serialized.
    pub fn post_json<T: Serialize>(url: impl Into<String>, payload: &T) -> DomainResult<Self> {
        let body =
            serde_json::to_string(payload).map_err(|e| DomainError::Serialization(e.to_string()))?;
        let mut request = Self::new(HttpMethod::Post, url);
        request.headers.set("Content-Type", "application/json");
        request.body = Some(body);
        Ok(request)
    }

    /// Replaces any `Authorization` header with `Bearer <token>`.
    pub fn set_bearer(&mut self, token: &str) {
        self.headers.set(AUTHORIZATION, format!("{BEARER_PREFIX}{token}"));
    }

    /// Returns the bearer credential this request carries, if any.
    #[must_use]
    pub fn bearer_token(&self) -> Option<&str> {
        self.headers
            .get(AUTHORIZATION)
            .and_then(|v| v.strip_prefix(BEARER_PREFIX))
    }

    /// Validates the URL and returns the parsed version if valid.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is malformed.
    pub fn parse_url(&self) -> DomainResult<Url> {
        Url::parse(&self.url).map_err(|e| DomainError::InvalidUrl {
            url: self.url.clone(),
            reason: e.to_string(),
        })
    }
}
