// ABOUTME: JWT session token issuance, verification, and revocation
// ABOUTME: Mints access/refresh token pairs and maintains the jti revocation list
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Sello Sign

//! # Session Token Management
//!
//! Stateless HS256 session tokens with a process-wide signing secret loaded
//! once from configuration. Every token carries a fresh random `jti`;
//! revocation is an idempotent insert of that `jti` into a shared list that
//! is consulted on every verification and swept of entries whose token would
//! have expired anyway. Rotating the signing secret invalidates all
//! outstanding tokens; callers must re-authenticate.

use crate::errors::{AppError, AppResult};
use crate::models::{TokenKind, User};
use chrono::{Duration, Utc};
use dashmap::DashMap;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::{distributions::Alphanumeric, Rng};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default access token lifetime in seconds (1 hour)
pub const DEFAULT_ACCESS_EXPIRY_SECS: i64 = 3600;

/// Default refresh token lifetime in seconds (30 days)
pub const DEFAULT_REFRESH_EXPIRY_SECS: i64 = 2_592_000;

/// Claims carried by a session token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User ID the token was issued to
    pub sub: String,
    /// Unique token ID, the revocation key
    pub jti: String,
    /// Issued-at timestamp (seconds since epoch)
    pub iat: i64,
    /// Expiry timestamp (seconds since epoch)
    pub exp: i64,
    /// Whether this is an access or refresh token
    pub kind: TokenKind,
}

/// Generate a cryptographically secure signing secret
#[must_use]
pub fn generate_jwt_secret() -> String {
    // 64 character (512-bit) random secret
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(64)
        .map(char::from)
        .collect()
}

/// Shared set of revoked token IDs
///
/// Entries are kept alongside their token's expiry so the sweep can forget
/// revocations that natural expiry already covers.
#[derive(Default)]
pub struct RevocationList {
    revoked: DashMap<String, i64>,
}

impl RevocationList {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Revoke a token ID; idempotent
    pub fn revoke(&self, jti: &str, expires_at: i64) {
        self.revoked.insert(jti.to_owned(), expires_at);
    }

    /// Whether a token ID has been revoked
    #[must_use]
    pub fn is_revoked(&self, jti: &str) -> bool {
        self.revoked.contains_key(jti)
    }

    /// Drop entries whose token has expired on its own
    pub fn sweep_expired(&self) {
        let now = Utc::now().timestamp();
        self.revoked.retain(|_, exp| *exp > now);
    }

    /// Number of live revocation entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.revoked.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.revoked.is_empty()
    }
}

/// An access/refresh token pair minted together
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    /// Short-lived access token
    pub access_token: String,
    /// Long-lived refresh token
    pub refresh_token: String,
}

/// Session token issuer and verifier
pub struct AuthManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_expiry: Duration,
    refresh_expiry: Duration,
    revocation: RevocationList,
}

impl AuthManager {
    /// Create a manager signing with the given process-wide secret
    #[must_use]
    pub fn new(secret: &[u8], access_expiry_secs: i64, refresh_expiry_secs: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            access_expiry: Duration::seconds(access_expiry_secs),
            refresh_expiry: Duration::seconds(refresh_expiry_secs),
            revocation: RevocationList::new(),
        }
    }

    /// Issue a short-lived access token
    ///
    /// # Errors
    ///
    /// Returns an error if JWT encoding fails
    pub fn issue_access_token(&self, user: &User) -> AppResult<String> {
        self.issue(&user.id.to_string(), TokenKind::Access, self.access_expiry)
    }

    /// Issue a long-lived refresh token
    ///
    /// # Errors
    ///
    /// Returns an error if JWT encoding fails
    pub fn issue_refresh_token(&self, user: &User) -> AppResult<String> {
        self.issue(&user.id.to_string(), TokenKind::Refresh, self.refresh_expiry)
    }

    /// Mint a fresh access/refresh pair for a subject
    ///
    /// Used on login and on the refresh grant, where only the subject from
    /// the verified refresh token is at hand.
    ///
    /// # Errors
    ///
    /// Returns an error if JWT encoding fails
    pub fn issue_token_pair(&self, subject: &str) -> AppResult<TokenPair> {
        Ok(TokenPair {
            access_token: self.issue(subject, TokenKind::Access, self.access_expiry)?,
            refresh_token: self.issue(subject, TokenKind::Refresh, self.refresh_expiry)?,
        })
    }

    /// Access token lifetime in seconds
    #[must_use]
    pub fn access_expiry_secs(&self) -> i64 {
        self.access_expiry.num_seconds()
    }

    fn issue(&self, subject: &str, kind: TokenKind, expiry: Duration) -> AppResult<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: subject.to_owned(),
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: (now + expiry).timestamp(),
            kind,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("Token encoding failed: {e}")))
    }

    /// Verify a session token: signature, then expiry, then revocation
    ///
    /// # Errors
    ///
    /// Returns `AuthMalformed` for tokens that do not parse, `AuthInvalid`
    /// for bad signatures, `AuthExpired` past the expiry, and `AuthRevoked`
    /// when the token's `jti` is on the revocation list.
    pub fn verify(&self, token: &str) -> AppResult<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;

        let claims = decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| Self::convert_jwt_error(&e))?;

        self.revocation.sweep_expired();
        if self.revocation.is_revoked(&claims.jti) {
            tracing::warn!("Rejected revoked token for user {}", claims.sub);
            return Err(AppError::auth_revoked());
        }

        Ok(claims)
    }

    /// Revoke the token behind these claims; idempotent
    pub fn revoke(&self, claims: &Claims) {
        self.revocation.revoke(&claims.jti, claims.exp);
        tracing::info!("Token revoked for user {}", claims.sub);
    }

    /// The shared revocation list
    #[must_use]
    pub const fn revocation_list(&self) -> &RevocationList {
        &self.revocation
    }

    /// Convert JWT library errors to the stable taxonomy
    fn convert_jwt_error(e: &jsonwebtoken::errors::Error) -> AppError {
        use jsonwebtoken::errors::ErrorKind;

        match e.kind() {
            ErrorKind::ExpiredSignature => AppError::auth_expired(),
            ErrorKind::InvalidSignature => {
                tracing::warn!("Token signature verification failed");
                AppError::auth_invalid("Token signature verification failed")
            }
            ErrorKind::InvalidToken => AppError::auth_malformed("Token format is invalid"),
            ErrorKind::Base64(base64_err) => {
                AppError::auth_malformed(format!("Token contains invalid base64: {base64_err}"))
            }
            ErrorKind::Json(json_err) => {
                AppError::auth_malformed(format!("Token contains invalid JSON: {json_err}"))
            }
            ErrorKind::Utf8(utf8_err) => {
                AppError::auth_malformed(format!("Token contains invalid UTF-8: {utf8_err}"))
            }
            _ => AppError::auth_invalid(format!("Token validation failed: {e}")),
        }
    }
}
