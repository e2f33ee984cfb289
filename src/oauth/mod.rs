// ABOUTME: OAuth module for the delegated e-signature provider authorization flow
// ABOUTME: Organizes PKCE challenges, the token exchange client, and flow orchestration
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Sello Sign

//! # Provider Authorization Module
//!
//! OAuth2 Authorization Code with PKCE against the external e-signature
//! provider. [`pkce`] generates and consumes single-use challenges, [`client`]
//! builds the authorization URL and performs the token exchange over HTTPS,
//! and [`manager`] sequences the two into the end-to-end handshake and keeps
//! custody of the resulting tokens.

pub mod client;
pub mod manager;
pub mod pkce;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Seconds before the stated expiry at which a provider token is renewed
pub const RENEWAL_MARGIN_SECS: i64 = 60;

/// Provider-issued token set from a completed exchange or refresh
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderTokenSet {
    /// The access token string
    pub access_token: String,
    /// Token type (usually "Bearer")
    pub token_type: String,
    /// Expiration timestamp (UTC)
    pub expires_at: Option<DateTime<Utc>>,
    /// Refresh token for renewing the access token
    pub refresh_token: Option<String>,
    /// Granted scopes
    pub scope: Option<String>,
}

impl ProviderTokenSet {
    /// Check if the access token is past its stated expiry
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_at
            .is_some_and(|expires_at| expires_at <= Utc::now())
    }

    /// Check if the access token is inside the proactive renewal margin
    #[must_use]
    pub fn needs_renewal(&self) -> bool {
        self.expires_at.is_some_and(|expires_at| {
            expires_at <= Utc::now() + Duration::seconds(RENEWAL_MARGIN_SECS)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_expiring_in(secs: i64) -> ProviderTokenSet {
        ProviderTokenSet {
            access_token: "at".into(),
            token_type: "Bearer".into(),
            expires_at: Some(Utc::now() + Duration::seconds(secs)),
            refresh_token: Some("rt".into()),
            scope: None,
        }
    }

    #[test]
    fn test_renewal_margin() {
        assert!(token_expiring_in(-10).is_expired());
        assert!(token_expiring_in(30).needs_renewal());
        assert!(!token_expiring_in(30).is_expired());
        assert!(!token_expiring_in(600).needs_renewal());
    }
}
