//! Fakes shared by the unit tests of the auth module.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::sync::watch;
use warden_domain::{ApiRequest, ApiResponse};

use crate::ports::{Clock, KeyValueStore, Navigator, StorageError, Transport, TransportError};

/// Builds a JWT-shaped token whose `exp` claim is `expires_at`.
pub fn jwt_expiring_at(expires_at: DateTime<Utc>) -> String {
    let payload = format!(r#"{{"sub":"ana","exp":{}}}"#, expires_at.timestamp());
    format!(
        "eyJhbGciOiJIUzI1NiJ9.{}.signature",
        URL_SAFE_NO_PAD.encode(payload)
    )
}

#[derive(Debug, Default)]
pub struct MapStore {
    values: Mutex<HashMap<String, String>>,
}

impl MapStore {
    pub fn value(&self, key: &str) -> Option<String> {
        self.values.lock().get(key).cloned()
    }

    pub fn is_empty(&self) -> bool {
        self.values.lock().is_empty()
    }
}

impl KeyValueStore for MapStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.value(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.values.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.values.lock().remove(key);
        Ok(())
    }
}

/// A [`MapStore`] whose writes fail with a full disk once armed.
#[derive(Debug, Default)]
pub struct FlakyStore {
    inner: MapStore,
    writes_fail: AtomicBool,
}

impl FlakyStore {
    pub fn fail_writes(&self) {
        self.writes_fail.store(true, Ordering::SeqCst);
    }
}

impl KeyValueStore for FlakyStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if self.writes_fail.load(Ordering::SeqCst) {
            return Err(std::io::Error::other("disk full").into());
        }
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.inner.remove(key)
    }
}

pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

#[derive(Debug, Default)]
pub struct CountingNavigator {
    redirects: AtomicUsize,
}

impl CountingNavigator {
    pub fn count(&self) -> usize {
        self.redirects.load(Ordering::SeqCst)
    }
}

impl Navigator for CountingNavigator {
    fn redirect_to_login(&self) {
        self.redirects.fetch_add(1, Ordering::SeqCst);
    }
}

/// Returns a fixed response once its gate is opened, recording every request.
pub struct GatedTransport {
    response: ApiResponse,
    gate: watch::Sender<bool>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl GatedTransport {
    pub fn open(response: ApiResponse) -> Arc<Self> {
        Self::with_gate(response, true)
    }

    pub fn closed(response: ApiResponse) -> Arc<Self> {
        Self::with_gate(response, false)
    }

    fn with_gate(response: ApiResponse, open: bool) -> Arc<Self> {
        Arc::new(Self {
            response,
            gate: watch::Sender::new(open),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn release(&self) {
        self.gate.send_replace(true);
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().clone()
    }

    pub async fn wait_for_requests(&self, expected: usize) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while self.requests.lock().len() < expected {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("requests never arrived");
    }
}

#[async_trait]
impl Transport for GatedTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
        self.requests.lock().push(request.clone());
        let mut gate = self.gate.subscribe();
        gate.wait_for(|open| *open)
            .await
            .map_err(|e| TransportError::Other(e.to_string()))?;
        Ok(self.response.clone())
    }
}

/// Answers each request with the result of a closure, recording every request.
pub struct FnTransport<F> {
    respond: F,
    requests: Mutex<Vec<ApiRequest>>,
}

impl<F> FnTransport<F>
where
    F: Fn(&ApiRequest) -> Result<ApiResponse, TransportError> + Send + Sync,
{
    pub fn new(respond: F) -> Arc<Self> {
        Arc::new(Self {
            respond,
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl<F> Transport for FnTransport<F>
where
    F: Fn(&ApiRequest) -> Result<ApiResponse, TransportError> + Send + Sync,
{
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
        self.requests.lock().push(request.clone());
        (self.respond)(request)
    }
}
