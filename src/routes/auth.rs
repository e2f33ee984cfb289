// ABOUTME: User authentication route handlers for registration, login, and sessions
// ABOUTME: Thin axum handlers delegating to the AuthService orchestration layer
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Sello Sign

//! Authentication routes for account and session management
//!
//! The [`AuthService`] sequences the login flow: the attempt guard gates the
//! request, the credential store verifies the password, and the token issuer
//! mints the session pair. Handlers stay thin and push every decision into
//! the service.

use crate::credentials::INVALID_CREDENTIALS;
use crate::errors::{AppError, AppResult, ErrorCode};
use crate::models::TokenKind;
use crate::resources::ServerResources;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use axum_extra::headers::authorization::Bearer;
use axum_extra::headers::Authorization;
use axum_extra::TypedHeader;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// User registration request
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub email: String,
}

/// User registration response
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user_id: String,
    pub message: String,
}

/// User login request
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Session token pair response for login and refresh
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: String,
}

/// Token refresh request
#[derive(Debug, Deserialize)]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

/// Logout confirmation
#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub message: String,
}

/// Authentication service sequencing guard, credentials, and token issuance
#[derive(Clone)]
pub struct AuthService {
    resources: Arc<ServerResources>,
}

impl AuthService {
    #[must_use]
    pub const fn new(resources: Arc<ServerResources>) -> Self {
        Self { resources }
    }

    /// Handle user registration
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for malformed requests and `DuplicateIdentity`
    /// when the username or email is taken.
    pub async fn register(&self, request: RegisterRequest) -> AppResult<RegisterResponse> {
        tracing::info!("Registration attempt for username: {}", request.username);

        let user = self
            .resources
            .credentials
            .create(&request.username, &request.password, &request.email)
            .await?;

        Ok(RegisterResponse {
            user_id: user.id.to_string(),
            message: "User registered successfully".into(),
        })
    }

    /// Handle user login: guard gate, credential check, token mint
    ///
    /// # Errors
    ///
    /// Returns `AccountLocked` while the account is locked out and a generic
    /// `AuthInvalid` for any credential failure.
    pub async fn login(&self, request: LoginRequest) -> AppResult<LoginResponse> {
        tracing::info!("Login attempt for username: {}", request.username);

        self.resources.login_guard.check(&request.username)?;

        let user = match self
            .resources
            .credentials
            .verify(&request.username, &request.password)
            .await
        {
            Ok(user) => user,
            Err(err) => {
                if err.code == ErrorCode::AuthInvalid {
                    self.resources.login_guard.record_failure(&request.username);
                }
                return Err(err);
            }
        };

        self.resources.login_guard.record_success(&user.username);

        let pair = self
            .resources
            .auth_manager
            .issue_token_pair(&user.id.to_string())?;
        let expires_at = chrono::Utc::now()
            + chrono::Duration::seconds(self.resources.auth_manager.access_expiry_secs());

        tracing::info!("User logged in: {} ({})", user.username, user.id);

        Ok(LoginResponse {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            expires_at: expires_at.to_rfc3339(),
        })
    }

    /// Handle the refresh grant, rotating the presented refresh token
    ///
    /// # Errors
    ///
    /// Returns the token taxonomy when the refresh token is invalid, expired,
    /// revoked, or not a refresh token.
    pub async fn refresh(&self, request: RefreshTokenRequest) -> AppResult<LoginResponse> {
        let claims = self.resources.auth_manager.verify(&request.refresh_token)?;
        if claims.kind != TokenKind::Refresh {
            return Err(AppError::auth_invalid(INVALID_CREDENTIALS));
        }

        // Rotation: the presented refresh token is spent either way
        self.resources.auth_manager.revoke(&claims);
        let pair = self.resources.auth_manager.issue_token_pair(&claims.sub)?;
        let expires_at = chrono::Utc::now()
            + chrono::Duration::seconds(self.resources.auth_manager.access_expiry_secs());

        tracing::info!("Session refreshed for user: {}", claims.sub);

        Ok(LoginResponse {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            expires_at: expires_at.to_rfc3339(),
        })
    }

    /// Handle logout: revoke the presented token's `jti`
    ///
    /// # Errors
    ///
    /// Returns the token taxonomy when the bearer token does not verify.
    pub async fn logout(&self, bearer_token: &str) -> AppResult<LogoutResponse> {
        let claims = self.resources.auth_manager.verify(bearer_token)?;
        self.resources.auth_manager.revoke(&claims);

        Ok(LogoutResponse {
            message: "Logged out successfully".into(),
        })
    }
}

/// Authentication route handlers
pub struct AuthRoutes;

impl AuthRoutes {
    /// Create all authentication routes
    #[must_use]
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/register", post(register_handler))
            .route("/login", post(login_handler))
            .route("/refresh", post(refresh_handler))
            .route("/logout", post(logout_handler))
            .with_state(resources)
    }
}

async fn register_handler(
    State(resources): State<Arc<ServerResources>>,
    Json(request): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<RegisterResponse>)> {
    let response = AuthService::new(resources).register(request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

async fn login_handler(
    State(resources): State<Arc<ServerResources>>,
    Json(request): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let response = AuthService::new(resources).login(request).await?;
    Ok(Json(response))
}

async fn refresh_handler(
    State(resources): State<Arc<ServerResources>>,
    Json(request): Json<RefreshTokenRequest>,
) -> AppResult<Json<LoginResponse>> {
    let response = AuthService::new(resources).refresh(request).await?;
    Ok(Json(response))
}

async fn logout_handler(
    State(resources): State<Arc<ServerResources>>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
) -> AppResult<Json<LogoutResponse>> {
    let TypedHeader(Authorization(bearer)) = bearer.ok_or_else(AppError::auth_required)?;
    let response = AuthService::new(resources).logout(bearer.token()).await?;
    Ok(Json(response))
}
