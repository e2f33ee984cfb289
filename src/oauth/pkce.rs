// ABOUTME: PKCE challenge generation and single-use validation for the provider handshake
// ABOUTME: Binds verifier/state pairs to a caller session with a strict expiry window
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Sello Sign

//! # PKCE Challenge Management
//!
//! Generates `code_verifier`/`code_challenge` pairs with an anti-CSRF state
//! token and binds them to one caller's ephemeral session in an injected
//! keyed store. A challenge is consumed exactly once: validation removes it
//! whatever the outcome, so a replayed callback always fails with
//! `PkceMissing`.

use crate::errors::{AppError, AppResult};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Random bytes behind a code verifier; encodes to 86 chars, inside the
/// 43-128 range RFC 7636 allows
const VERIFIER_BYTES: usize = 64;

/// Random bytes behind an anti-CSRF state token
const STATE_BYTES: usize = 32;

/// Default challenge lifetime in seconds (10 minutes)
pub const DEFAULT_CHALLENGE_LIFETIME_SECS: i64 = 600;

/// PKCE parameters for an `S256` authorization request
#[derive(Debug, Clone)]
pub struct PkceParams {
    /// Randomly generated code verifier (43-128 characters)
    pub code_verifier: String,
    /// SHA256 hash of the code verifier, base64url encoded without padding
    pub code_challenge: String,
    /// Challenge method (always "S256")
    pub code_challenge_method: String,
}

impl PkceParams {
    /// Generate PKCE parameters with the `S256` challenge method
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0u8; VERIFIER_BYTES];
        rand::thread_rng().fill_bytes(&mut bytes);
        let code_verifier = URL_SAFE_NO_PAD.encode(bytes);

        let mut hasher = Sha256::new();
        hasher.update(code_verifier.as_bytes());
        let code_challenge = URL_SAFE_NO_PAD.encode(hasher.finalize());

        Self {
            code_verifier,
            code_challenge,
            code_challenge_method: "S256".into(),
        }
    }
}

/// Generate an unguessable anti-CSRF state token
#[must_use]
pub fn generate_state() -> String {
    let mut bytes = [0u8; STATE_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Stored half of an outstanding challenge
#[derive(Debug, Clone)]
struct StoredChallenge {
    verifier: String,
    state: String,
    created_at: DateTime<Utc>,
}

/// Session-keyed store of outstanding PKCE challenges
pub struct PkceChallengeManager {
    challenges: RwLock<HashMap<String, StoredChallenge>>,
    lifetime: Duration,
}

impl PkceChallengeManager {
    /// Create a manager with the given challenge lifetime
    #[must_use]
    pub fn new(lifetime_secs: i64) -> Self {
        Self {
            challenges: RwLock::new(HashMap::new()),
            lifetime: Duration::seconds(lifetime_secs),
        }
    }

    /// Begin a handshake for this session
    ///
    /// Generates a fresh verifier/challenge/state triple and stores the
    /// server-side half, overwriting any prior unconsumed challenge for the
    /// same session.
    pub async fn begin(&self, session_id: &str) -> (PkceParams, String) {
        let params = PkceParams::generate();
        let state = generate_state();
        let now = Utc::now();

        let mut store = self.challenges.write().await;
        // Lazy sweep while the write lock is held anyway
        store.retain(|_, c| now - c.created_at <= self.lifetime);
        store.insert(
            session_id.to_owned(),
            StoredChallenge {
                verifier: params.code_verifier.clone(),
                state: state.clone(),
                created_at: now,
            },
        );
        drop(store);

        tracing::debug!("PKCE challenge stored for session {}", truncate(session_id));
        (params, state)
    }

    /// Validate the provider callback for this session and consume the
    /// challenge, returning the stored verifier
    ///
    /// Checks in order: a challenge exists, it has not expired, and the
    /// received state matches. The challenge is removed on every definitive
    /// outcome, so a second callback fails with `PkceMissing`.
    ///
    /// # Errors
    ///
    /// Returns `PkceMissing`, `PkceExpired`, or `StateMismatch`.
    pub async fn validate(&self, session_id: &str, received_state: &str) -> AppResult<String> {
        let mut store = self.challenges.write().await;
        let challenge = store.remove(session_id).ok_or_else(|| {
            tracing::warn!("No pending challenge for session {}", truncate(session_id));
            AppError::new(
                crate::errors::ErrorCode::PkceMissing,
                "No pending authorization challenge for this session",
            )
        })?;
        drop(store);

        if Utc::now() - challenge.created_at > self.lifetime {
            tracing::warn!("Expired challenge for session {}", truncate(session_id));
            return Err(AppError::new(
                crate::errors::ErrorCode::PkceExpired,
                "Authorization challenge has expired, restart the flow",
            ));
        }

        // The state is not secret, exact match is what matters
        if challenge.state != received_state {
            tracing::warn!("State mismatch for session {}", truncate(session_id));
            return Err(AppError::new(
                crate::errors::ErrorCode::StateMismatch,
                "Authorization state does not match the pending challenge",
            ));
        }

        Ok(challenge.verifier)
    }

    /// Number of outstanding challenges
    #[must_use]
    pub async fn pending_count(&self) -> usize {
        self.challenges.read().await.len()
    }
}

impl Default for PkceChallengeManager {
    fn default() -> Self {
        Self::new(DEFAULT_CHALLENGE_LIFETIME_SECS)
    }
}

/// Truncate an identifier for logging
fn truncate(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorCode;

    #[test]
    fn test_verifier_shape() {
        let params = PkceParams::generate();
        assert!(params.code_verifier.len() >= 43);
        assert!(params.code_verifier.len() <= 128);
        assert_eq!(params.code_challenge_method, "S256");

        let mut hasher = Sha256::new();
        hasher.update(params.code_verifier.as_bytes());
        let expected = URL_SAFE_NO_PAD.encode(hasher.finalize());
        assert_eq!(params.code_challenge, expected);
        assert!(!params.code_challenge.contains('='));
    }

    #[test]
    fn test_state_tokens_are_unique() {
        assert_ne!(generate_state(), generate_state());
    }

    #[tokio::test]
    async fn test_validate_succeeds_exactly_once() {
        let manager = PkceChallengeManager::default();
        let (params, state) = manager.begin("session-1").await;

        let verifier = manager.validate("session-1", &state).await.unwrap();
        assert_eq!(verifier, params.code_verifier);

        // Replay after consumption
        let err = manager.validate("session-1", &state).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::PkceMissing);
    }

    #[tokio::test]
    async fn test_state_mismatch_consumes_challenge() {
        let manager = PkceChallengeManager::default();
        let (_, _state) = manager.begin("session-1").await;

        let err = manager.validate("session-1", "forged-state").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::StateMismatch);

        // Definitive failure also deletes the challenge
        let err = manager.validate("session-1", "forged-state").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::PkceMissing);
    }

    #[tokio::test]
    async fn test_expired_challenge_reports_expired() {
        let manager = PkceChallengeManager::new(0);
        let (_, state) = manager.begin("session-1").await;

        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let err = manager.validate("session-1", &state).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::PkceExpired);
    }

    #[tokio::test]
    async fn test_begin_overwrites_prior_challenge() {
        let manager = PkceChallengeManager::default();
        let (_, old_state) = manager.begin("session-1").await;
        let (_, new_state) = manager.begin("session-1").await;
        assert_eq!(manager.pending_count().await, 1);

        let err = manager.validate("session-1", &old_state).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::StateMismatch);

        // A fresh begin is required after the failed validation consumed it
        manager.begin("session-1").await;
        assert_ne!(old_state, new_state);
    }
}
