//! Login, logout and current-user tracking.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};
use warden_domain::{ApiRequest, HttpMethod, LoginRequest, LoginResponse, Session, UserProfile};

use super::client::AuthenticatingClient;
use super::token_store::TokenStore;
use crate::error::{AuthError, ClientResult};
use crate::ports::{Navigator, StorageError};

/// Session lifecycle on top of the authenticating client.
///
/// The current user is published on a `watch` channel so views can react to
/// sign-in and sign-out without polling the store.
pub struct SessionService {
    client: Arc<AuthenticatingClient>,
    store: Arc<TokenStore>,
    navigator: Arc<dyn Navigator>,
    current_user: watch::Sender<Option<UserProfile>>,
}

impl SessionService {
    /// Creates the service, seeding the current user from the store.
    #[must_use]
    pub fn new(
        client: Arc<AuthenticatingClient>,
        store: Arc<TokenStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        let initial = store.user().unwrap_or_else(|err| {
            warn!(error = %err, "ignoring unreadable stored user");
            None
        });
        Self {
            client,
            store,
            navigator,
            current_user: watch::Sender::new(initial),
        }
    }

    /// Signs in with email and password.
    ///
    /// The user (when the server returns one) is stored before the token.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::LoginRejected`] for a non-success status,
    /// [`AuthError::MalformedResponse`] for an unparseable body and
    /// [`AuthError::MissingAccessToken`] when no token was issued. Transport
    /// and storage failures are passed through.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> ClientResult<Session> {
        let config = self.client.config();
        let request = ApiRequest::post_json(
            config.endpoint(&config.login_path),
            &LoginRequest { email, password },
        )?;

        let response = self.client.send(request).await?;
        if !response.is_success() {
            warn!(status = %response.status, "login rejected");
            return Err(AuthError::LoginRejected {
                status: response.status.as_u16(),
            }
            .into());
        }

        let body: LoginResponse = response
            .json_body()
            .map_err(|e| AuthError::MalformedResponse(e.to_string()))?;
        let raw = body
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::MissingAccessToken)?;

        if let Some(user) = &body.user {
            self.store.set_user(user)?;
        }
        let token = self.store.set_token(&raw)?;
        self.current_user.send_replace(body.user.clone());

        info!(token = %token.preview(), "signed in");
        Ok(Session {
            token,
            user: body.user,
        })
    }

    /// Clears the local session and redirects to login.
    ///
    /// The redirect and the signed-out notification happen even when the
    /// store fails to clear.
    ///
    /// # Errors
    ///
    /// Returns the storage error raised while clearing.
    pub fn logout(&self) -> Result<(), StorageError> {
        let cleared = self.store.clear();
        if let Err(err) = &cleared {
            warn!(error = %err, "failed to clear session on logout");
        }
        self.current_user.send_replace(None);
        self.navigator.redirect_to_login();
        info!("signed out");
        cleared
    }

    /// Tells the server to end the session, then logs out locally.
    ///
    /// The local logout happens whatever the server answers.
    ///
    /// # Errors
    ///
    /// Returns the storage error raised while clearing.
    pub async fn remote_logout(&self) -> Result<(), StorageError> {
        let config = self.client.config();
        let request = ApiRequest::new(HttpMethod::Post, config.endpoint(&config.logout_path));
        match self.client.send(request).await {
            Ok(response) if response.is_success() => debug!("server session ended"),
            Ok(response) => warn!(status = %response.status, "server logout rejected"),
            Err(err) => warn!(error = %err, "server logout failed"),
        }
        self.logout()
    }

    /// Fetches and stores the signed-in user's profile.
    ///
    /// Any failure yields `None`; the session is left as it is.
    pub async fn fetch_current_user(&self) -> Option<UserProfile> {
        let config = self.client.config();
        let request = ApiRequest::get(config.endpoint(&config.me_path));
        let response = match self.client.send(request).await {
            Ok(response) if response.is_success() => response,
            Ok(response) => {
                debug!(status = %response.status, "current user unavailable");
                return None;
            }
            Err(err) => {
                debug!(error = %err, "current user request failed");
                return None;
            }
        };

        let user: UserProfile = match response.json_body() {
            Ok(user) => user,
            Err(err) => {
                warn!(error = %err, "ignoring malformed user profile");
                return None;
            }
        };
        if let Err(err) = self.store.set_user(&user) {
            warn!(error = %err, "failed to store user profile");
        }
        self.current_user.send_replace(Some(user.clone()));
        Some(user)
    }

    /// Reloads the user for a session persisted by a previous run.
    pub async fn restore(&self) -> Option<UserProfile> {
        match self.store.raw_token() {
            Ok(Some(_)) => self.fetch_current_user().await,
            Ok(None) => None,
            Err(err) => {
                warn!(error = %err, "cannot read stored session");
                None
            }
        }
    }

    /// The current user, as last published.
    #[must_use]
    pub fn current_user(&self) -> Option<UserProfile> {
        self.current_user.borrow().clone()
    }

    /// Subscribes to current-user changes.
    #[must_use]
    pub fn subscribe_user(&self) -> watch::Receiver<Option<UserProfile>> {
        self.current_user.subscribe()
    }
}

impl std::fmt::Debug for SessionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionService")
            .field("client", &self.client)
            .finish_non_exhaustive()
    }
}
