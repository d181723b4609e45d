//! End-to-end refresh behaviour of the authenticating client.
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod common;

use std::sync::Arc;

use common::{API, FakeApi, stack};
use pretty_assertions::assert_eq;
use warden_application::{AuthError, ClientError};
use warden_domain::{ApiRequest, ApiResponse, Headers, HttpMethod};

fn spawn_gets(
    client: &Arc<warden_application::AuthenticatingClient>,
    paths: &[&str],
) -> Vec<tokio::task::JoinHandle<Result<ApiResponse, ClientError>>> {
    paths
        .iter()
        .map(|path| {
            let client = client.clone();
            let request = ApiRequest::get(format!("{API}{path}"));
            tokio::spawn(async move { client.send(request).await })
        })
        .collect()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_unauthorized_requests_share_one_refresh() {
    let api = FakeApi::issuing("T2");
    let s = stack(api.clone());
    s.store.set_token("T1").unwrap();

    let handles = spawn_gets(&s.client, &["/orders", "/invoices", "/profile"]);

    api.wait_until(|api| api.refresh_calls() == 1).await;
    let coordinator = s.coordinator.clone();
    api.wait_until(move |_| coordinator.waiter_count() == 2).await;
    api.release_refresh();

    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap().status.as_u16(), 200);
    }

    assert_eq!(api.refresh_calls(), 1);
    let calls = api.api_calls();
    assert_eq!(calls.len(), 6);
    let retried: Vec<_> = calls
        .iter()
        .filter(|r| r.bearer_token() == Some("T2"))
        .map(|r| r.url.clone())
        .collect();
    assert_eq!(retried.len(), 3);
    for path in ["/orders", "/invoices", "/profile"] {
        assert!(retried.contains(&format!("{API}{path}")));
    }
    assert_eq!(s.store.raw_token().unwrap().as_deref(), Some("T2"));
    assert_eq!(s.navigator.redirects(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_failed_refresh_fails_every_request_and_redirects_once() {
    let api = FakeApi::new("T2", ApiResponse::new(500, Headers::new(), Vec::new()));
    let s = stack(api.clone());
    s.store.set_token("T1").unwrap();

    let handles = spawn_gets(&s.client, &["/orders", "/invoices", "/profile"]);

    api.wait_until(|api| api.refresh_calls() == 1).await;
    let coordinator = s.coordinator.clone();
    api.wait_until(move |_| coordinator.waiter_count() == 2).await;
    api.release_refresh();

    for handle in handles {
        assert!(matches!(
            handle.await.unwrap(),
            Err(ClientError::Auth(AuthError::RefreshRejected { status: 500 }))
        ));
    }

    assert_eq!(api.refresh_calls(), 1);
    assert_eq!(api.api_calls().len(), 3, "no request may be retried");
    assert!(s.store.session().unwrap().is_none());
    assert_eq!(s.navigator.redirects(), 1);
}

#[tokio::test]
async fn test_each_request_is_dispatched_at_most_twice() {
    // The refresh succeeds but the server keeps rejecting the new token.
    let api = FakeApi::new(
        "never",
        ApiResponse::json(200, &serde_json::json!({ "access_token": "T2" })),
    );
    api.release_refresh();
    let s = stack(api.clone());
    s.store.set_token("T1").unwrap();

    let response = s
        .client
        .send(ApiRequest::get(format!("{API}/orders")))
        .await
        .unwrap();

    assert_eq!(response.status.as_u16(), 401);
    assert_eq!(api.api_calls().len(), 2);
    assert_eq!(api.refresh_calls(), 1);
}

#[tokio::test]
async fn test_later_request_uses_refreshed_token_directly() {
    let api = FakeApi::issuing("T2");
    api.release_refresh();
    let s = stack(api.clone());
    s.store.set_token("T1").unwrap();

    s.client
        .send(ApiRequest::get(format!("{API}/orders")))
        .await
        .unwrap();
    s.client
        .send(ApiRequest::get(format!("{API}/invoices")))
        .await
        .unwrap();

    assert_eq!(api.refresh_calls(), 1);
    let last = api.log().pop().unwrap();
    assert_eq!(last.bearer_token(), Some("T2"));
}

#[tokio::test]
async fn test_public_endpoint_401_is_returned_as_is() {
    let api = FakeApi::issuing("T2");
    let s = stack(api.clone());

    let request = ApiRequest::new(HttpMethod::Post, format!("{API}/auth/register"));
    let response = s.client.send(request).await.unwrap();

    assert_eq!(response.status.as_u16(), 401);
    assert_eq!(api.refresh_calls(), 0);
    assert_eq!(s.navigator.redirects(), 0);
}
