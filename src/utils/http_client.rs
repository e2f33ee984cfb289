// ABOUTME: Shared HTTP client utilities with connection pooling and timeout configuration
// ABOUTME: Builds reqwest clients whose outbound calls can never hang indefinitely
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Sello Sign

use reqwest::{Client, ClientBuilder};
use std::time::Duration;

/// Default total timeout for provider token exchanges
const DEFAULT_OAUTH_TIMEOUT_SECS: u64 = 10;

/// Default connection timeout for provider token exchanges
const DEFAULT_OAUTH_CONNECT_TIMEOUT_SECS: u64 = 5;

/// Create a new HTTP client with custom timeout settings
///
/// The timeout is mandatory: an unresponsive provider must not hold a
/// request open indefinitely.
#[must_use]
pub fn create_client_with_timeout(timeout_secs: u64, connect_timeout_secs: u64) -> Client {
    ClientBuilder::new()
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(connect_timeout_secs))
        .build()
        .unwrap_or_else(|_| Client::new())
}

/// Create a new HTTP client optimized for OAuth token exchanges
///
/// Token exchanges should be fast operations; this client uses short
/// timeouts accordingly.
#[must_use]
pub fn oauth_client() -> Client {
    create_client_with_timeout(DEFAULT_OAUTH_TIMEOUT_SECS, DEFAULT_OAUTH_CONNECT_TIMEOUT_SECS)
}
