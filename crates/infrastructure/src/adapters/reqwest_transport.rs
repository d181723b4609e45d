//! HTTP transport implementation using reqwest.
//!
//! This adapter implements the `Transport` port. The underlying client keeps
//! a cookie jar so the HTTP-only refresh cookie set at login is sent back to
//! the refresh endpoint.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, Method};
use tracing::trace;
use warden_application::ports::{Transport, TransportError};
use warden_domain::{ApiRequest, ApiResponse, Header, Headers, HttpMethod};

const MAX_REDIRECTS: usize = 10;

/// Transport over a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
    timeout_ms: u64,
}

impl ReqwestTransport {
    /// Creates a transport with a cookie store and a per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the client cannot be created.
    pub fn new(timeout_ms: u64) -> Result<Self, TransportError> {
        let client = Client::builder()
            .user_agent(concat!("warden/", env!("CARGO_PKG_VERSION")))
            .cookie_store(true)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .build()
            .map_err(|e| TransportError::Other(e.to_string()))?;

        Ok(Self { client, timeout_ms })
    }

    const fn to_reqwest_method(method: HttpMethod) -> Method {
        match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Put => Method::PUT,
            HttpMethod::Patch => Method::PATCH,
            HttpMethod::Delete => Method::DELETE,
        }
    }

    fn map_error(error: &reqwest::Error, timeout_ms: u64) -> TransportError {
        if error.is_timeout() {
            return TransportError::Timeout { timeout_ms };
        }
        if error.is_connect() {
            return TransportError::ConnectionFailed(error.to_string());
        }
        if error.is_body() || error.is_decode() {
            return TransportError::Body(error.to_string());
        }
        TransportError::Other(error.to_string())
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
        let url = request
            .parse_url()
            .map_err(|e| TransportError::InvalidUrl(e.to_string()))?;

        let start = Instant::now();
        let mut builder = self
            .client
            .request(Self::to_reqwest_method(request.method), url)
            .timeout(Duration::from_millis(self.timeout_ms));
        for header in request.headers.iter() {
            builder = builder.header(&header.name, &header.value);
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Self::map_error(&e, self.timeout_ms))?;

        let status = response.status().as_u16();
        let headers: Headers = response
            .headers()
            .iter()
            .map(|(k, v)| Header::new(k.as_str(), v.to_str().unwrap_or("<binary>")))
            .collect();
        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError::Body(e.to_string()))?
            .to_vec();

        let duration = start.elapsed();
        trace!(
            request_id = %request.id,
            status,
            elapsed_ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
            "response received"
        );
        Ok(ApiResponse::new(status, headers, body).with_duration(duration))
    }
}
