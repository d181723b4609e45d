//! Single-flight token refresh.
//!
//! [`RefreshCoordinator`] guarantees at most one refresh request in flight
//! per client. The first caller to ask for a refresh while the coordinator
//! is idle becomes the leader and issues the request; callers arriving while
//! it runs subscribe to the same cycle and receive the leader's outcome.
//!
//! Each cycle owns a fresh `watch` channel. The state check, the transition
//! and waiter registration all happen under one mutex with no await in
//! between, and the leader publishes the outcome under that same mutex, so a
//! caller either joins the running cycle or starts the next one.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use warden_domain::{AccessToken, ApiRequest, ApiResponse, HttpMethod, RefreshResponse};

use super::token_store::TokenStore;
use crate::error::AuthError;
use crate::ports::{Navigator, Transport};

/// Result delivered to every participant of a refresh cycle.
pub type RefreshOutcome = Result<AccessToken, AuthError>;

type OutcomeSlot = Option<RefreshOutcome>;

/// Coordinator state. Exactly one exists per coordinator.
enum RefreshState {
    Idle,
    /// The sender publishes the cycle's outcome; waiters subscribe to it.
    Refreshing(watch::Sender<OutcomeSlot>),
}

/// What a caller does after inspecting the state.
enum Role<'a> {
    /// A newer token is already stored; no cycle is needed.
    Current(AccessToken),
    Leader(Cycle<'a>),
    Waiter(watch::Receiver<OutcomeSlot>),
}

/// The leader's handle on a running cycle.
///
/// Dropping it without calling [`Cycle::finish`] (the leader's future was
/// cancelled) returns the coordinator to idle and releases the waiters with
/// [`AuthError::RefreshAbandoned`]. Only the leader moves the state out of
/// `Refreshing`, so the guard never touches a later cycle.
struct Cycle<'a> {
    state: &'a Mutex<RefreshState>,
    finished: bool,
}

impl Cycle<'_> {
    fn finish(mut self, outcome: RefreshOutcome) {
        self.finished = true;
        let mut state = self.state.lock();
        if let RefreshState::Refreshing(sender) = std::mem::replace(&mut *state, RefreshState::Idle)
        {
            sender.send_replace(Some(outcome));
        }
    }
}

impl Drop for Cycle<'_> {
    fn drop(&mut self) {
        if !self.finished {
            // Dropping the sender wakes every waiter with a closed channel.
            *self.state.lock() = RefreshState::Idle;
            warn!("token refresh abandoned by its caller");
        }
    }
}

/// Deduplicates concurrent token refreshes.
pub struct RefreshCoordinator {
    /// Transport that bypasses the authenticating client.
    transport: Arc<dyn Transport>,
    store: Arc<TokenStore>,
    navigator: Arc<dyn Navigator>,
    refresh_url: String,
    state: Mutex<RefreshState>,
    refresh_calls: AtomicU64,
}

impl RefreshCoordinator {
    /// Creates an idle coordinator.
    ///
    /// `transport` must not route through the authenticating client,
    /// otherwise a 401 from the refresh endpoint would recurse.
    #[must_use]
    pub fn new(
        transport: Arc<dyn Transport>,
        store: Arc<TokenStore>,
        navigator: Arc<dyn Navigator>,
        refresh_url: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            store,
            navigator,
            refresh_url: refresh_url.into(),
            state: Mutex::new(RefreshState::Idle),
            refresh_calls: AtomicU64::new(0),
        }
    }

    /// Obtains a new access token, joining the in-flight refresh if any.
    ///
    /// On success the token has already been written to the store. On
    /// failure the session has been cleared and the navigator told to
    /// redirect (once per cycle, by the leader).
    ///
    /// # Errors
    ///
    /// Returns the cycle's failure: transport error, non-success status,
    /// malformed body, missing `access_token`, storage failure, or
    /// [`AuthError::RefreshAbandoned`] if the leader was cancelled.
    pub async fn refresh(&self) -> RefreshOutcome {
        self.run(|| Ok(None)).await
    }

    /// Obtains a token to replace `rejected`, the credential a request was
    /// refused with.
    ///
    /// When no refresh is in flight and the store already holds a different
    /// token, a cycle finished after that request was sent: the stored token
    /// is returned and no refresh is issued. The check runs under the state
    /// lock, so a cycle completing concurrently is never repeated.
    ///
    /// # Errors
    ///
    /// Same as [`refresh`](Self::refresh), plus [`AuthError::Storage`] when
    /// the stored token cannot be read.
    pub async fn replace(&self, rejected: Option<&str>) -> RefreshOutcome {
        self.run(|| {
            let current = self.store.token()?;
            Ok(current.filter(|token| Some(token.as_str()) != rejected))
        })
        .await
    }

    async fn run(
        &self,
        reuse: impl FnOnce() -> Result<Option<AccessToken>, AuthError>,
    ) -> RefreshOutcome {
        match self.join_or_lead(reuse)? {
            Role::Current(token) => {
                debug!("token changed while request was in flight, skipping refresh");
                Ok(token)
            }
            Role::Leader(cycle) => self.lead(cycle).await,
            Role::Waiter(receiver) => {
                debug!("joining in-flight token refresh");
                Self::wait(receiver).await
            }
        }
    }

    /// Whether a refresh is currently in flight.
    #[must_use]
    pub fn is_refreshing(&self) -> bool {
        matches!(*self.state.lock(), RefreshState::Refreshing(_))
    }

    /// Number of callers currently waiting on the in-flight refresh.
    #[must_use]
    pub fn waiter_count(&self) -> usize {
        match &*self.state.lock() {
            RefreshState::Refreshing(sender) => sender.receiver_count(),
            RefreshState::Idle => 0,
        }
    }

    /// Number of refresh requests issued since creation.
    #[must_use]
    pub fn refresh_count(&self) -> u64 {
        self.refresh_calls.load(Ordering::Relaxed)
    }

    fn join_or_lead(
        &self,
        reuse: impl FnOnce() -> Result<Option<AccessToken>, AuthError>,
    ) -> Result<Role<'_>, AuthError> {
        let mut state = self.state.lock();
        match &*state {
            RefreshState::Refreshing(sender) => Ok(Role::Waiter(sender.subscribe())),
            RefreshState::Idle => {
                // The leader stores its token before going idle.
                if let Some(token) = reuse()? {
                    return Ok(Role::Current(token));
                }
                let (sender, _) = watch::channel(None);
                *state = RefreshState::Refreshing(sender);
                Ok(Role::Leader(Cycle {
                    state: &self.state,
                    finished: false,
                }))
            }
        }
    }

    async fn wait(mut receiver: watch::Receiver<OutcomeSlot>) -> RefreshOutcome {
        match receiver.wait_for(Option::is_some).await {
            Ok(slot) => slot
                .as_ref()
                .cloned()
                .unwrap_or(Err(AuthError::RefreshAbandoned)),
            Err(_) => Err(AuthError::RefreshAbandoned),
        }
    }

    async fn lead(&self, cycle: Cycle<'_>) -> RefreshOutcome {
        let call = self.refresh_calls.fetch_add(1, Ordering::Relaxed) + 1;
        info!(call, "refreshing access token");

        let outcome = match self.request_token().await {
            Ok(raw) => self.store.set_token(&raw).map_err(AuthError::from),
            Err(err) => Err(err),
        };

        match &outcome {
            Ok(token) => {
                info!(token = %token.preview(), "access token refreshed");
                cycle.finish(outcome.clone());
            }
            Err(err) => {
                warn!(error = %err, "token refresh failed, ending session");
                if let Err(clear_err) = self.store.clear() {
                    warn!(error = %clear_err, "failed to clear session after refresh failure");
                }
                cycle.finish(outcome.clone());
                self.navigator.redirect_to_login();
            }
        }
        outcome
    }

    /// Performs the refresh call and extracts the new raw token.
    async fn request_token(&self) -> Result<String, AuthError> {
        let mut request = ApiRequest::new(HttpMethod::Post, self.refresh_url.clone());
        request.headers.set("Content-Type", "application/json");
        request.body = Some("{}".to_string());

        let response = self
            .transport
            .send(&request)
            .await
            .map_err(|e| AuthError::RefreshTransport(e.to_string()))?;

        Self::token_from_response(&response)
    }

    fn token_from_response(response: &ApiResponse) -> Result<String, AuthError> {
        // A 401 here is terminal like any other rejection.
        if !response.is_success() {
            return Err(AuthError::RefreshRejected {
                status: response.status.as_u16(),
            });
        }
        let body: RefreshResponse = response
            .json_body()
            .map_err(|e| AuthError::MalformedResponse(e.to_string()))?;
        body.into_token().ok_or(AuthError::MissingAccessToken)
    }
}

impl std::fmt::Debug for RefreshCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshCoordinator")
            .field("refresh_url", &self.refresh_url)
            .field("refreshing", &self.is_refreshing())
            .field("refresh_calls", &self.refresh_count())
            .finish_non_exhaustive()
    }
}
