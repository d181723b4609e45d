//! Authenticating request decorator.
//!
//! [`AuthenticatingClient`] wraps a [`Transport`]: it attaches the current
//! bearer token to requests for the protected API surface and, when such a
//! request comes back 401, obtains a fresh token through the
//! [`RefreshCoordinator`] and replays the request exactly once.

use std::sync::Arc;

use tracing::{debug, instrument, warn};
use warden_domain::{AccessToken, ApiRequest, ApiResponse};

use super::refresh::RefreshCoordinator;
use super::token_store::TokenStore;
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::ports::Transport;

/// Transport decorator that manages bearer authentication.
pub struct AuthenticatingClient {
    transport: Arc<dyn Transport>,
    store: Arc<TokenStore>,
    coordinator: Arc<RefreshCoordinator>,
    config: Arc<ClientConfig>,
}

impl AuthenticatingClient {
    /// Creates a client sending through `transport`.
    #[must_use]
    pub fn new(
        transport: Arc<dyn Transport>,
        store: Arc<TokenStore>,
        coordinator: Arc<RefreshCoordinator>,
        config: Arc<ClientConfig>,
    ) -> Self {
        Self {
            transport,
            store,
            coordinator,
            config,
        }
    }

    /// The configuration used to classify requests.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Sends `request`, refreshing the token and retrying once on 401.
    ///
    /// Requests outside the API base or to public paths are sent as given
    /// and never retried. Every response other than a 401 on a protected
    /// request is returned unchanged, and so is the response to the retry.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Auth`] when the refresh fails (the session has
    /// been cleared by then), [`ClientError::Transport`] when no response is
    /// obtained and [`ClientError::Storage`] when the token cannot be read.
    #[instrument(
        name = "authenticated_send",
        skip_all,
        fields(request_id = %request.id, method = %request.method, url = %request.url)
    )]
    pub async fn send(&self, mut request: ApiRequest) -> ClientResult<ApiResponse> {
        let protected = self.config.requires_auth(&request.url);
        if protected && let Some(token) = self.store.raw_token()? {
            request.set_bearer(&token);
        }

        let response = self.transport.send(&request).await?;
        if !(protected && response.status.is_unauthorized()) {
            return Ok(response);
        }

        debug!("request unauthorized, obtaining a fresh token");
        let used = request.bearer_token().map(str::to_owned);
        let token = self.token_for_retry(used.as_deref()).await?;

        request.set_bearer(token.as_str());
        debug!(token = %token.preview(), "retrying request with refreshed token");
        Ok(self.transport.send(&request).await?)
    }

    /// Picks the token for the single retry through the coordinator.
    async fn token_for_retry(&self, used: Option<&str>) -> ClientResult<AccessToken> {
        self.coordinator.replace(used).await.map_err(|err| {
            warn!(error = %err, "refresh failed, request not retried");
            ClientError::Auth(err)
        })
    }
}

impl std::fmt::Debug for AuthenticatingClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthenticatingClient")
            .field("api_base_url", &self.config.api_base_url)
            .field("coordinator", &self.coordinator)
            .finish_non_exhaustive()
    }
}
