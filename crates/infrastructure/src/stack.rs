//! Assembly of the authentication components.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::broadcast;
use tracing::info;
use warden_application::ports::{Clock, KeyValueStore, StorageError, Transport, TransportError};
use warden_application::{
    AccessGuard, AuthenticatingClient, ClientConfig, RefreshCoordinator, SessionService,
    TokenStore,
};

use crate::adapters::{ReqwestTransport, SystemClock};
use crate::navigation::{ChannelNavigator, NavigationEvent};
use crate::persistence::FileKeyValueStore;

/// Errors raised while building an [`AuthStack`].
#[derive(Debug, Error)]
pub enum StackError {
    /// The HTTP client could not be created.
    #[error("failed to create transport: {0}")]
    Transport(#[from] TransportError),

    /// The session file could not be opened.
    #[error("failed to open session storage: {0}")]
    Storage(#[from] StorageError),

    /// No storage path was configured and the platform has no data directory.
    #[error("no storage path configured and no user data directory available")]
    NoDataDirectory,
}

/// Every component of the client, sharing one store, coordinator and navigator.
#[derive(Debug)]
pub struct AuthStack {
    /// Effective configuration.
    pub config: Arc<ClientConfig>,
    /// Session store.
    pub store: Arc<TokenStore>,
    /// Single-flight refresh coordinator.
    pub coordinator: Arc<RefreshCoordinator>,
    /// Authenticating client for API calls.
    pub client: Arc<AuthenticatingClient>,
    /// Route guard.
    pub guard: Arc<AccessGuard>,
    /// Login and logout.
    pub session: Arc<SessionService>,
    navigator: Arc<ChannelNavigator>,
}

impl AuthStack {
    /// Builds the production stack: reqwest transport, file-backed store and
    /// system clock.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport or the session file cannot be set up.
    pub fn build(config: ClientConfig) -> Result<Self, StackError> {
        let path = config
            .storage_path
            .clone()
            .or_else(FileKeyValueStore::default_path)
            .ok_or(StackError::NoDataDirectory)?;
        let storage = Arc::new(FileKeyValueStore::open(&path)?);
        let transport = Arc::new(ReqwestTransport::new(config.request_timeout_ms)?);

        info!(
            api_base_url = %config.api_base_url,
            storage = %path.display(),
            "authentication stack ready"
        );
        Ok(Self::with_parts(
            config,
            transport,
            storage,
            Arc::new(SystemClock::new()),
        ))
    }

    /// Builds a stack over caller-provided adapters.
    ///
    /// The same transport serves both the authenticating client and the
    /// refresh call; only the client adds bearer tokens.
    #[must_use]
    pub fn with_parts(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
        storage: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let config = Arc::new(config);
        let navigator = Arc::new(ChannelNavigator::default());
        let store = Arc::new(TokenStore::new(storage, clock));
        let coordinator = Arc::new(RefreshCoordinator::new(
            transport.clone(),
            store.clone(),
            navigator.clone(),
            config.refresh_url(),
        ));
        let client = Arc::new(AuthenticatingClient::new(
            transport,
            store.clone(),
            coordinator.clone(),
            config.clone(),
        ));
        let guard = Arc::new(AccessGuard::new(
            store.clone(),
            navigator.clone(),
            config.expiry_skew_seconds,
        ));
        let session = Arc::new(SessionService::new(
            client.clone(),
            store.clone(),
            navigator.clone(),
        ));

        Self {
            config,
            store,
            coordinator,
            client,
            guard,
            session,
            navigator,
        }
    }

    /// Subscribes to login redirects requested by any component.
    #[must_use]
    pub fn navigation_events(&self) -> broadcast::Receiver<NavigationEvent> {
        self.navigator.subscribe()
    }
}
