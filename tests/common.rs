// ABOUTME: Shared test utilities and setup functions for integration tests
// ABOUTME: Provides config, resources, a stubbed provider exchange, and HTTP helpers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Sello Sign
#![allow(dead_code, clippy::unwrap_used, clippy::expect_used, clippy::missing_panics_doc)]

//! Shared test utilities for `sello_auth`
//!
//! Common setup to reduce duplication across integration tests: a valid
//! in-memory configuration, server resources wired to a stubbed provider
//! exchange, and a small request builder for driving the axum router.

use axum::{
    body::{to_bytes, Body},
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use sello_auth::{
    config::environment::{AuthConfig, HttpClientConfig, LogLevel, ProviderConfig, ServerConfig},
    errors::{AppError, AppResult},
    oauth::{client::TokenExchange, ProviderTokenSet},
    resources::ServerResources,
    storage::MemoryUserStore,
};
use serde::Serialize;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex, Once,
};
use tower::ServiceExt;

static INIT_LOGGER: Once = Once::new();

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_test_writer()
            .init();
    });
}

/// Shared HMAC key used by webhook tests
pub const TEST_HMAC_KEY: &str = "test-webhook-shared-key";

/// A valid configuration that never touches the environment
pub fn test_config() -> ServerConfig {
    ServerConfig {
        http_port: 0,
        log_level: LogLevel::Warn,
        auth: AuthConfig {
            jwt_secret: "integration-test-secret-0123456789abcdef".into(),
            access_expiry_secs: 3600,
            refresh_expiry_secs: 2_592_000,
            max_login_attempts: 3,
            lockout_window_secs: 300,
        },
        provider: ProviderConfig {
            client_id: "integration-key".into(),
            client_secret: "integration-secret".into(),
            auth_url: "https://account-d.docusign.com/oauth/auth".into(),
            token_url: "https://account-d.docusign.com/oauth/token".into(),
            redirect_uri: "https://app.sello.test/api/docusign/callback".into(),
            scopes: vec!["signature".into()],
            webhook_hmac_key: TEST_HMAC_KEY.into(),
            challenge_lifetime_secs: 600,
        },
        http_client: HttpClientConfig {
            timeout_secs: 10,
            connect_timeout_secs: 5,
        },
    }
}

/// Stubbed provider exchange: echoes a fixed token set and records the
/// verifier each exchange presented
pub struct StubExchange {
    token_set: ProviderTokenSet,
    pub exchanges: AtomicUsize,
    pub refreshes: AtomicUsize,
    pub last_verifier: Mutex<Option<String>>,
    pub fail_validation: bool,
}

impl StubExchange {
    pub fn returning(token_set: ProviderTokenSet) -> Self {
        Self {
            token_set,
            exchanges: AtomicUsize::new(0),
            refreshes: AtomicUsize::new(0),
            last_verifier: Mutex::new(None),
            fail_validation: false,
        }
    }

    pub fn rejecting() -> Self {
        let mut stub = Self::returning(provider_token_set(3600));
        stub.fail_validation = true;
        stub
    }
}

#[async_trait::async_trait]
impl TokenExchange for StubExchange {
    async fn exchange_code(&self, _code: &str, verifier: &str) -> AppResult<ProviderTokenSet> {
        if self.fail_validation {
            return Err(AppError::provider_validation("invalid_grant"));
        }
        self.exchanges.fetch_add(1, Ordering::SeqCst);
        *self.last_verifier.lock().unwrap() = Some(verifier.to_owned());
        Ok(self.token_set.clone())
    }

    async fn refresh(&self, _refresh_token: &str) -> AppResult<ProviderTokenSet> {
        if self.fail_validation {
            return Err(AppError::provider_validation("invalid_grant"));
        }
        self.refreshes.fetch_add(1, Ordering::SeqCst);
        Ok(self.token_set.clone())
    }
}

/// A provider token set expiring the given seconds from now
pub fn provider_token_set(expires_in_secs: i64) -> ProviderTokenSet {
    ProviderTokenSet {
        access_token: "provider-access-token".into(),
        token_type: "Bearer".into(),
        expires_at: Some(Utc::now() + Duration::seconds(expires_in_secs)),
        refresh_token: Some("provider-refresh-token".into()),
        scope: Some("signature".into()),
    }
}

/// Server resources over an in-memory store and the given stub exchange
pub fn test_resources_with(stub: Arc<StubExchange>) -> Arc<ServerResources> {
    init_test_logging();
    Arc::new(ServerResources::with_exchange(
        test_config(),
        Arc::new(MemoryUserStore::new()),
        stub,
    ))
}

/// Server resources with a default succeeding stub
pub fn test_resources() -> Arc<ServerResources> {
    test_resources_with(Arc::new(StubExchange::returning(provider_token_set(3600))))
}

/// Helper to build and execute HTTP requests against the axum router
pub struct TestRequest {
    method: Method,
    uri: String,
    headers: Vec<(String, String)>,
    body: Option<String>,
}

impl TestRequest {
    pub fn get(uri: &str) -> Self {
        Self {
            method: Method::GET,
            uri: uri.to_owned(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn post(uri: &str) -> Self {
        Self {
            method: Method::POST,
            uri: uri.to_owned(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn header(mut self, key: &str, value: &str) -> Self {
        self.headers.push((key.to_owned(), value.to_owned()));
        self
    }

    pub fn json<T: Serialize>(mut self, data: &T) -> Self {
        self.body = Some(serde_json::to_string(data).expect("Failed to serialize JSON"));
        self.headers.push((
            header::CONTENT_TYPE.as_str().to_owned(),
            "application/json".to_owned(),
        ));
        self
    }

    pub fn raw_body(mut self, body: &str) -> Self {
        self.body = Some(body.to_owned());
        self
    }

    /// Execute the request against an axum router
    pub async fn send(self, app: Router) -> TestResponse {
        let mut builder = Request::builder().method(self.method).uri(self.uri);
        for (key, value) in self.headers {
            builder = builder.header(key, value);
        }

        let request = builder
            .body(Body::from(self.body.unwrap_or_default()))
            .expect("Failed to build request");

        let response = app
            .oneshot(request)
            .await
            .expect("Failed to execute request");

        let status = response.status();
        let headers = response.headers().clone();
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read response body")
            .to_vec();

        TestResponse {
            status,
            headers,
            body,
        }
    }
}

/// Eagerly-read HTTP response for assertions
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).expect("Response body is not JSON")
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Stable error code from the JSON error body
    pub fn error_code(&self) -> String {
        self.json()["error"]["code"]
            .as_str()
            .expect("Missing error code")
            .to_owned()
    }
}
