// ABOUTME: Integration tests for the provider OAuth handshake over HTTP
// ABOUTME: Drives authorize redirect, callback validation, and token custody end to end
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Sello Sign

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use axum::http::StatusCode;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use common::{provider_token_set, test_resources_with, StubExchange, TestRequest};
use sello_auth::routes;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use url::Url;

/// Begin the handshake and return the session cookie plus the parsed
/// authorization URL query
async fn begin(app: axum::Router) -> (String, HashMap<String, String>) {
    let response = TestRequest::get("/api/docusign/auth").send(app).await;
    assert_eq!(response.status, StatusCode::FOUND);

    let cookie = response
        .header("set-cookie")
        .expect("Missing session cookie")
        .split(';')
        .next()
        .unwrap()
        .to_owned();

    let location = response.header("location").expect("Missing redirect");
    let url = Url::parse(location).unwrap();
    let query: HashMap<String, String> = url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    (cookie, query)
}

#[tokio::test]
async fn test_authorize_redirect_carries_pkce_challenge() {
    let app = routes::router(test_resources_with(Arc::new(StubExchange::returning(
        provider_token_set(3600),
    ))));

    let (_, query) = begin(app).await;

    assert_eq!(query["response_type"], "code");
    assert_eq!(query["client_id"], "integration-key");
    assert_eq!(query["code_challenge_method"], "S256");
    assert_eq!(query["scope"], "signature");
    assert!(!query["state"].is_empty());

    // Challenge is base64url without padding
    let challenge = &query["code_challenge"];
    assert!(!challenge.contains('='));
    assert!(URL_SAFE_NO_PAD.decode(challenge).is_ok());
}

#[tokio::test]
async fn test_full_handshake_with_stubbed_provider() {
    let stub = Arc::new(StubExchange::returning(provider_token_set(3600)));
    let resources = test_resources_with(stub.clone());
    let app = routes::router(resources);

    let (cookie, query) = begin(app.clone()).await;
    let state = &query["state"];

    let response = TestRequest::get(&format!(
        "/api/docusign/callback?code=auth-code&state={state}"
    ))
    .header("cookie", &cookie)
    .send(app.clone())
    .await;

    assert_eq!(response.status, StatusCode::OK);
    let body = response.json();
    assert_eq!(body["access_token"], "provider-access-token");
    assert_eq!(body["refresh_token"], "provider-refresh-token");
    assert!(body["expires_in"].as_i64().unwrap() > 3500);
    assert_eq!(stub.exchanges.load(Ordering::SeqCst), 1);

    // The verifier handed to the exchange hashes to the advertised challenge
    let verifier = stub.last_verifier.lock().unwrap().clone().unwrap();
    assert!(verifier.len() >= 43 && verifier.len() <= 128);
    let mut hasher = Sha256::new();
    hasher.update(verifier.as_bytes());
    assert_eq!(query["code_challenge"], URL_SAFE_NO_PAD.encode(hasher.finalize()));

    // The session is now connected
    let response = TestRequest::get("/api/docusign/status")
        .header("cookie", &cookie)
        .send(app.clone())
        .await;
    assert_eq!(response.json()["connected"], true);

    // The challenge was consumed: replaying the callback fails
    let response = TestRequest::get(&format!(
        "/api/docusign/callback?code=auth-code&state={state}"
    ))
    .header("cookie", &cookie)
    .send(app)
    .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.error_code(), "PKCE_MISSING");
    assert_eq!(stub.exchanges.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_callback_rejects_mismatched_state() {
    let app = routes::router(test_resources_with(Arc::new(StubExchange::returning(
        provider_token_set(3600),
    ))));

    let (cookie, _) = begin(app.clone()).await;

    let response = TestRequest::get("/api/docusign/callback?code=auth-code&state=forged")
        .header("cookie", &cookie)
        .send(app)
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.error_code(), "STATE_MISMATCH");
}

#[tokio::test]
async fn test_callback_requires_parameters_and_session() {
    let app = routes::router(test_resources_with(Arc::new(StubExchange::returning(
        provider_token_set(3600),
    ))));

    let response = TestRequest::get("/api/docusign/callback?state=s").send(app.clone()).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.error_code(), "INVALID_INPUT");

    let response = TestRequest::get("/api/docusign/callback?code=c").send(app.clone()).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    // Parameters present but no session cookie: no challenge to match
    let response = TestRequest::get("/api/docusign/callback?code=c&state=s").send(app).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.error_code(), "PKCE_MISSING");
}

#[tokio::test]
async fn test_provider_rejection_maps_to_validation_error() {
    let app = routes::router(test_resources_with(Arc::new(StubExchange::rejecting())));

    let (cookie, query) = begin(app.clone()).await;
    let state = &query["state"];

    let response = TestRequest::get(&format!(
        "/api/docusign/callback?code=consumed-code&state={state}"
    ))
    .header("cookie", &cookie)
    .send(app)
    .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.error_code(), "PROVIDER_VALIDATION");
}

#[tokio::test]
async fn test_status_without_session_is_disconnected() {
    let app = routes::router(test_resources_with(Arc::new(StubExchange::returning(
        provider_token_set(3600),
    ))));

    let response = TestRequest::get("/api/docusign/status").send(app).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()["connected"], false);
}

#[tokio::test]
async fn test_restarted_flow_reuses_session_cookie() {
    let app = routes::router(test_resources_with(Arc::new(StubExchange::returning(
        provider_token_set(3600),
    ))));

    let (cookie, first_query) = begin(app.clone()).await;

    // Second begin with the existing cookie issues a fresh state and does not
    // set a new cookie
    let response = TestRequest::get("/api/docusign/auth")
        .header("cookie", &cookie)
        .send(app.clone())
        .await;
    assert_eq!(response.status, StatusCode::FOUND);
    assert!(response.header("set-cookie").is_none());

    let location = response.header("location").unwrap();
    let url = Url::parse(location).unwrap();
    let new_state = url
        .query_pairs()
        .find(|(k, _)| k == "state")
        .map(|(_, v)| v.into_owned())
        .unwrap();
    assert_ne!(new_state, first_query["state"]);

    // The earlier challenge was overwritten; only the fresh state validates
    let response = TestRequest::get(&format!(
        "/api/docusign/callback?code=auth-code&state={}",
        first_query["state"]
    ))
    .header("cookie", &cookie)
    .send(app.clone())
    .await;
    assert_eq!(response.error_code(), "STATE_MISMATCH");

    // That failure consumed the challenge; restart before the real callback
    let (cookie, query) = begin(app.clone()).await;
    let response = TestRequest::get(&format!(
        "/api/docusign/callback?code=auth-code&state={}",
        query["state"]
    ))
    .header("cookie", &cookie)
    .send(app)
    .await;
    assert_eq!(response.status, StatusCode::OK);
}
