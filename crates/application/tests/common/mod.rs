//! Scripted fakes for the refresh flow tests.
#![allow(dead_code, clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use tokio::sync::watch;
use warden_application::{
    AuthenticatingClient, ClientConfig, KeyValueStore, Navigator, RefreshCoordinator,
    StorageError, TokenStore, Transport, TransportError,
};
use warden_domain::{ApiRequest, ApiResponse, Headers};

pub const API: &str = "https://api.example.com";

#[derive(Default)]
pub struct MemoryStore(Mutex<HashMap<String, String>>);

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.0.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.0.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.0.lock().remove(key);
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingNavigator(AtomicUsize);

impl RecordingNavigator {
    pub fn redirects(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

impl Navigator for RecordingNavigator {
    fn redirect_to_login(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

/// Fake API server.
///
/// Protected endpoints accept only `Bearer <valid>`. The refresh endpoint
/// blocks until released, then answers with `refresh_response`.
pub struct FakeApi {
    valid: String,
    refresh_response: ApiResponse,
    gate: watch::Sender<bool>,
    log: Mutex<Vec<ApiRequest>>,
}

impl FakeApi {
    pub fn new(valid: &str, refresh_response: ApiResponse) -> Arc<Self> {
        Arc::new(Self {
            valid: valid.to_string(),
            refresh_response,
            gate: watch::Sender::new(false),
            log: Mutex::new(Vec::new()),
        })
    }

    pub fn issuing(token: &str) -> Arc<Self> {
        Self::new(
            token,
            ApiResponse::json(200, &serde_json::json!({ "access_token": token })),
        )
    }

    pub fn release_refresh(&self) {
        self.gate.send_replace(true);
    }

    pub fn log(&self) -> Vec<ApiRequest> {
        self.log.lock().clone()
    }

    pub fn refresh_calls(&self) -> usize {
        self.log().iter().filter(|r| is_refresh(r)).count()
    }

    pub fn api_calls(&self) -> Vec<ApiRequest> {
        self.log().into_iter().filter(|r| !is_refresh(r)).collect()
    }

    pub async fn wait_until(&self, condition: impl Fn(&Self) -> bool) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while !condition(self) {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("condition never reached");
    }
}

fn is_refresh(request: &ApiRequest) -> bool {
    request.url.ends_with("/auth/refresh")
}

#[async_trait]
impl Transport for FakeApi {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
        self.log.lock().push(request.clone());

        if is_refresh(request) {
            let mut gate = self.gate.subscribe();
            gate.wait_for(|open| *open)
                .await
                .map_err(|e| TransportError::Other(e.to_string()))?;
            return Ok(self.refresh_response.clone());
        }

        let status = if !request.url.contains("/auth/login")
            && request.bearer_token() != Some(self.valid.as_str())
        {
            401
        } else {
            200
        };
        Ok(ApiResponse::new(status, Headers::new(), Vec::new()))
    }
}

pub struct Stack {
    pub client: Arc<AuthenticatingClient>,
    pub coordinator: Arc<RefreshCoordinator>,
    pub store: Arc<TokenStore>,
    pub navigator: Arc<RecordingNavigator>,
}

pub fn stack(api: Arc<FakeApi>) -> Stack {
    let config = Arc::new(ClientConfig::new(API));
    let store = Arc::new(TokenStore::new(
        Arc::new(MemoryStore::default()),
        Arc::new(Utc::now),
    ));
    let navigator = Arc::new(RecordingNavigator::default());
    let coordinator = Arc::new(RefreshCoordinator::new(
        api.clone(),
        store.clone(),
        navigator.clone(),
        config.refresh_url(),
    ));
    let client = Arc::new(AuthenticatingClient::new(
        api,
        store.clone(),
        coordinator.clone(),
        config,
    ));
    Stack {
        client,
        coordinator,
        store,
        navigator,
    }
}
