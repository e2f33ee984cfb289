// ABOUTME: Provider authorization flow orchestration and token custody
// ABOUTME: Sequences PKCE challenge, redirect URL, callback validation, and exchange
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Sello Sign

//! # Provider Authorization Manager
//!
//! Sequences the end-to-end handshake with the e-signature provider: issue a
//! challenge, hand out the redirect URL, validate the callback, and swap the
//! authorization code for tokens. Token sets are held per caller session and
//! renewed proactively before their stated expiry. The exchange transport is
//! injected behind [`TokenExchange`] so the flow is testable without the
//! provider in the loop.

use super::client::{OAuth2Config, TokenExchange};
use super::pkce::PkceChallengeManager;
use super::ProviderTokenSet;
use crate::errors::AppResult;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Connection state reported to callers
#[derive(Debug, Clone, Serialize)]
pub struct ConnectionStatus {
    /// Whether this session holds a provider token set
    pub connected: bool,
    /// Stated expiry of the held access token
    pub expires_at: Option<DateTime<Utc>>,
}

/// Orchestrates the provider handshake and keeps custody of issued tokens
pub struct ProviderAuthManager {
    config: OAuth2Config,
    exchange: Arc<dyn TokenExchange>,
    challenges: PkceChallengeManager,
    tokens: RwLock<HashMap<String, ProviderTokenSet>>,
}

impl ProviderAuthManager {
    /// Create a manager over the given exchange transport
    #[must_use]
    pub fn new(
        config: OAuth2Config,
        exchange: Arc<dyn TokenExchange>,
        challenge_lifetime_secs: i64,
    ) -> Self {
        Self {
            config,
            exchange,
            challenges: PkceChallengeManager::new(challenge_lifetime_secs),
            tokens: RwLock::new(HashMap::new()),
        }
    }

    /// Start the handshake for a session, returning the redirect target
    ///
    /// Stores a fresh single-use challenge for the session as a side effect.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when the authorize endpoint or redirect URI is
    /// unusable.
    pub async fn begin_authorization(&self, session_id: &str) -> AppResult<String> {
        let (params, state) = self.challenges.begin(session_id).await;
        let url = self.config.authorization_url(&state, &params)?;
        tracing::info!("Provider authorization started for a session");
        Ok(url)
    }

    /// Complete the handshake from the provider callback
    ///
    /// Validates and consumes the session's challenge, then exchanges the
    /// authorization code. The exchange is never retried here: a consumed
    /// code is rejected by the provider, so retry is the caller's decision.
    ///
    /// # Errors
    ///
    /// Returns the PKCE/state taxonomy on a bad callback, or the provider
    /// taxonomy when the exchange fails.
    pub async fn handle_callback(
        &self,
        session_id: &str,
        code: &str,
        state: &str,
    ) -> AppResult<ProviderTokenSet> {
        let verifier = self.challenges.validate(session_id, state).await?;
        let token_set = self.exchange.exchange_code(code, &verifier).await?;

        let mut tokens = self.tokens.write().await;
        tokens.insert(session_id.to_owned(), token_set.clone());
        drop(tokens);

        tracing::info!("Provider authorization completed for a session");
        Ok(token_set)
    }

    /// Connection state for a session
    pub async fn connection_status(&self, session_id: &str) -> ConnectionStatus {
        let tokens = self.tokens.read().await;
        match tokens.get(session_id) {
            Some(set) if !set.is_expired() => ConnectionStatus {
                connected: true,
                expires_at: set.expires_at,
            },
            _ => ConnectionStatus {
                connected: false,
                expires_at: None,
            },
        }
    }

    /// Return a token set fit for calling the provider's API, renewing it
    /// proactively inside the renewal margin
    ///
    /// `None` means the session holds no usable tokens and the handshake must
    /// be run again.
    ///
    /// # Errors
    ///
    /// Propagates the provider taxonomy when the refresh grant fails.
    pub async fn ensure_valid_token(
        &self,
        session_id: &str,
    ) -> AppResult<Option<ProviderTokenSet>> {
        let current = {
            let tokens = self.tokens.read().await;
            tokens.get(session_id).cloned()
        };

        let Some(token_set) = current else {
            return Ok(None);
        };
        if !token_set.needs_renewal() {
            return Ok(Some(token_set));
        }

        let Some(refresh_token) = token_set.refresh_token else {
            // Nothing to renew with; the handshake must be repeated
            let mut tokens = self.tokens.write().await;
            tokens.remove(session_id);
            return Ok(None);
        };

        tracing::info!("Renewing provider access token ahead of expiry");
        let renewed = self.exchange.refresh(&refresh_token).await?;

        let mut tokens = self.tokens.write().await;
        tokens.insert(session_id.to_owned(), renewed.clone());
        drop(tokens);

        Ok(Some(renewed))
    }

    /// Drop a session's provider tokens
    pub async fn disconnect(&self, session_id: &str) {
        let mut tokens = self.tokens.write().await;
        if tokens.remove(session_id).is_some() {
            tracing::info!("Provider tokens dropped for a session");
        }
    }
}
