// ABOUTME: OAuth2 client for the e-signature provider - authorization URL and token exchange
// ABOUTME: Performs the code-for-token and refresh grants over HTTPS with mandatory timeouts
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Sello Sign

//! # Provider OAuth2 Client
//!
//! Builds the provider's authorization URL from the active challenge and
//! exchanges authorization codes (and refresh tokens) for provider token
//! sets. The outbound call always runs with a timeout; the provider's 4xx
//! rejections and transport/5xx failures map to distinct error codes so
//! callers can tell "the grant is bad" from "try again later". Client
//! secrets, verifiers, and returned tokens are never logged.

use super::pkce::PkceParams;
use super::ProviderTokenSet;
use crate::errors::{AppError, AppResult};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde::Deserialize;
use url::Url;

/// Placeholder values that must never reach a live authorization request
const PLACEHOLDER_MARKERS: &[&str] = &["your_", "changeme", "placeholder", "example.com/callback"];

/// OAuth2 configuration for the e-signature provider
#[derive(Debug, Clone)]
pub struct OAuth2Config {
    /// OAuth client ID (integration key) from the provider
    pub client_id: String,
    /// OAuth client secret from the provider
    pub client_secret: String,
    /// Authorization endpoint URL
    pub auth_url: String,
    /// Token endpoint URL
    pub token_url: String,
    /// Redirect URI, must exactly match the value registered with the provider
    pub redirect_uri: String,
    /// OAuth scopes to request
    pub scopes: Vec<String>,
}

impl OAuth2Config {
    /// Build the authorization URL for the current challenge and state
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the authorize endpoint does not parse or the
    /// redirect URI is empty or a known placeholder.
    pub fn authorization_url(&self, state: &str, pkce: &PkceParams) -> AppResult<String> {
        if self.redirect_uri.trim().is_empty()
            || PLACEHOLDER_MARKERS
                .iter()
                .any(|m| self.redirect_uri.contains(m))
        {
            return Err(AppError::config(
                "Redirect URI is empty or still a placeholder",
            ));
        }

        let mut url = Url::parse(&self.auth_url)
            .map_err(|e| AppError::config(format!("Invalid authorize endpoint: {e}")))?;

        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &self.client_id)
            .append_pair("redirect_uri", &self.redirect_uri)
            .append_pair("scope", &self.scopes.join(" "))
            .append_pair("state", state)
            .append_pair("code_challenge", &pkce.code_challenge)
            .append_pair("code_challenge_method", &pkce.code_challenge_method);

        Ok(url.to_string())
    }
}

/// Exchange seam between the flow orchestration and the provider transport
#[async_trait]
pub trait TokenExchange: Send + Sync {
    /// Exchange an authorization code plus its verifier for a token set
    async fn exchange_code(&self, code: &str, verifier: &str) -> AppResult<ProviderTokenSet>;

    /// Renew an access token with a refresh token
    async fn refresh(&self, refresh_token: &str) -> AppResult<ProviderTokenSet>;
}

/// OAuth2 client performing the real HTTPS grants
pub struct OAuth2Client {
    config: OAuth2Config,
    client: reqwest::Client,
}

impl OAuth2Client {
    /// Create a client over a transport that already enforces timeouts
    #[must_use]
    pub const fn new(config: OAuth2Config, client: reqwest::Client) -> Self {
        Self { config, client }
    }

    /// The provider configuration in use
    #[must_use]
    pub const fn config(&self) -> &OAuth2Config {
        &self.config
    }

    async fn post_token_request(&self, params: &[(&str, &str)]) -> AppResult<ProviderTokenSet> {
        let response = self
            .client
            .post(&self.config.token_url)
            .form(params)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::provider_unavailable("Provider token endpoint timed out")
                } else {
                    AppError::provider_unavailable("Provider token endpoint unreachable")
                }
                .with_source(e)
            })?;

        let status = response.status();
        if status.is_client_error() {
            let detail = Self::error_detail(response).await;
            tracing::warn!("Provider rejected token request ({status}): {detail}");
            return Err(AppError::provider_validation(format!(
                "Provider rejected the grant: {detail}"
            )));
        }
        if !status.is_success() {
            tracing::warn!("Provider token endpoint returned {status}");
            return Err(AppError::provider_unavailable(format!(
                "Provider token endpoint returned {status}"
            )));
        }

        let token_response: TokenResponse = response.json().await.map_err(|e| {
            AppError::provider_unavailable("Provider returned a malformed token response")
                .with_source(e)
        })?;

        Ok(Self::token_from_response(token_response))
    }

    /// Extract the provider's stable error code, dropping anything that
    /// could carry token material
    async fn error_detail(response: reqwest::Response) -> String {
        match response.json::<ProviderErrorBody>().await {
            Ok(body) => body.error,
            Err(_) => "unknown error".into(),
        }
    }

    fn token_from_response(response: TokenResponse) -> ProviderTokenSet {
        let expires_at = response
            .expires_in
            .map(|seconds| Utc::now() + Duration::seconds(i64::try_from(seconds).unwrap_or(3600)));

        ProviderTokenSet {
            access_token: response.access_token,
            token_type: response.token_type,
            expires_at,
            refresh_token: response.refresh_token,
            scope: response.scope,
        }
    }
}

#[async_trait]
impl TokenExchange for OAuth2Client {
    async fn exchange_code(&self, code: &str, verifier: &str) -> AppResult<ProviderTokenSet> {
        tracing::debug!("Exchanging authorization code with provider");
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("code_verifier", verifier),
        ];
        self.post_token_request(&params).await
    }

    async fn refresh(&self, refresh_token: &str) -> AppResult<ProviderTokenSet> {
        tracing::debug!("Refreshing provider access token");
        let params = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
        ];
        self.post_token_request(&params).await
    }
}

/// OAuth2 token response from the provider
#[derive(Debug, Deserialize)]
struct TokenResponse {
    /// The access token issued by the authorization server
    access_token: String,
    /// The type of token (usually "Bearer")
    token_type: String,
    /// Token lifetime in seconds
    expires_in: Option<u64>,
    /// Refresh token for obtaining new access tokens
    refresh_token: Option<String>,
    /// Space-separated list of granted scopes
    scope: Option<String>,
}

/// Error body the provider returns on a rejected grant
#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    error: String,
}
