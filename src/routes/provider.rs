// ABOUTME: E-signature provider route handlers for the OAuth handshake and webhooks
// ABOUTME: Binds PKCE challenges to a session cookie and validates webhook signatures first
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Sello Sign

//! Provider authorization and webhook routes
//!
//! The handshake endpoints bind the PKCE challenge to an ephemeral session
//! cookie so the callback can be matched to the browser that started the
//! flow. The webhook endpoint verifies the HMAC signature over the raw body
//! before anything is deserialized; an invalid signature aborts with no
//! state change.

use crate::errors::{AppError, AppResult, ErrorCode};
use crate::oauth::manager::ConnectionStatus;
use crate::resources::ServerResources;
use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::header::{COOKIE, LOCATION, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::Utc;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Session cookie carrying the handshake binding
const SESSION_COOKIE: &str = "sello_session";

/// Webhook signature header sent by the provider
const SIGNATURE_HEADER: &str = "x-docusign-signature-1";

/// Optional webhook timestamp header
const SIGNATURE_TIMESTAMP_HEADER: &str = "x-docusign-signature-timestamp";

/// Envelope lifecycle events this backend reacts to
const RECOGNIZED_EVENTS: &[&str] = &[
    "envelope-sent",
    "envelope-delivered",
    "envelope-completed",
    "envelope-declined",
    "envelope-voided",
    "recipient-completed",
];

/// Query parameters of the provider callback redirect
#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
}

/// Token set returned to the caller after a completed handshake
#[derive(Debug, Serialize)]
pub struct CallbackResponse {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: Option<i64>,
    pub status: String,
}

/// Webhook processing acknowledgement
#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub status: String,
    pub event: String,
}

/// Minimal webhook envelope; parsed only after the signature validates
#[derive(Debug, Deserialize)]
struct WebhookPayload {
    event: String,
}

/// Provider route handlers
pub struct ProviderRoutes;

impl ProviderRoutes {
    /// Create all provider routes
    #[must_use]
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/auth", get(auth_handler))
            .route("/callback", get(callback_handler))
            .route("/status", get(status_handler))
            .route("/webhook", post(webhook_handler))
            .with_state(resources)
    }
}

/// Start the handshake: store a challenge and redirect to the provider
async fn auth_handler(
    State(resources): State<Arc<ServerResources>>,
    headers: HeaderMap,
) -> AppResult<(StatusCode, HeaderMap)> {
    let (session_id, is_new_session) = match get_cookie_value(&headers, SESSION_COOKIE) {
        Some(sid) => (sid, false),
        None => (new_session_id(), true),
    };

    let url = resources.provider_auth.begin_authorization(&session_id).await?;

    let mut response_headers = HeaderMap::new();
    response_headers.insert(
        LOCATION,
        HeaderValue::from_str(&url)
            .map_err(|e| AppError::internal(format!("Authorization URL not header-safe: {e}")))?,
    );
    if is_new_session {
        let cookie = format!("{SESSION_COOKIE}={session_id}; Path=/; HttpOnly; SameSite=Lax");
        response_headers.insert(
            SET_COOKIE,
            HeaderValue::from_str(&cookie)
                .map_err(|e| AppError::internal(format!("Session cookie not header-safe: {e}")))?,
        );
    }

    Ok((StatusCode::FOUND, response_headers))
}

/// Complete the handshake from the provider redirect
async fn callback_handler(
    State(resources): State<Arc<ServerResources>>,
    headers: HeaderMap,
    Query(params): Query<CallbackParams>,
) -> AppResult<Json<CallbackResponse>> {
    let code = params
        .code
        .ok_or_else(|| AppError::invalid_input("Missing 'code' parameter"))?;
    let state = params
        .state
        .ok_or_else(|| AppError::invalid_input("Missing 'state' parameter"))?;

    let session_id = get_cookie_value(&headers, SESSION_COOKIE).ok_or_else(|| {
        AppError::new(
            ErrorCode::PkceMissing,
            "No handshake session found for this callback",
        )
    })?;

    let token_set = resources
        .provider_auth
        .handle_callback(&session_id, &code, &state)
        .await?;

    let expires_in = token_set
        .expires_at
        .map(|at| (at - Utc::now()).num_seconds());

    Ok(Json(CallbackResponse {
        access_token: token_set.access_token,
        refresh_token: token_set.refresh_token,
        expires_in,
        status: "success".into(),
    }))
}

/// Report whether this session holds provider tokens
async fn status_handler(
    State(resources): State<Arc<ServerResources>>,
    headers: HeaderMap,
) -> Json<ConnectionStatus> {
    let status = match get_cookie_value(&headers, SESSION_COOKIE) {
        Some(session_id) => resources.provider_auth.connection_status(&session_id).await,
        None => ConnectionStatus {
            connected: false,
            expires_at: None,
        },
    };
    Json(status)
}

/// Receive a provider webhook; the signature check runs before any parsing
async fn webhook_handler(
    State(resources): State<Arc<ServerResources>>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Json<WebhookResponse>> {
    let signature = header_str(&headers, SIGNATURE_HEADER);
    let timestamp = header_str(&headers, SIGNATURE_TIMESTAMP_HEADER);

    if !resources
        .webhook_validator
        .validate(signature, timestamp, &body)
        .is_valid()
    {
        return Err(AppError::signature_invalid());
    }

    let payload: WebhookPayload = serde_json::from_slice(&body)
        .map_err(|e| AppError::invalid_input(format!("Malformed webhook payload: {e}")))?;

    if RECOGNIZED_EVENTS.contains(&payload.event.as_str()) {
        tracing::info!("Webhook event accepted: {}", payload.event);
        Ok(Json(WebhookResponse {
            status: "processed".into(),
            event: payload.event,
        }))
    } else {
        tracing::info!("Webhook event ignored: {}", payload.event);
        Ok(Json(WebhookResponse {
            status: "ignored".into(),
            event: payload.event,
        }))
    }
}

/// Extract a header value as a string, dropping non-UTF8 values
fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Extract a cookie value from the Cookie header
fn get_cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let cookies = headers.get(COOKIE)?.to_str().ok()?;
    cookies.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key == name).then(|| value.to_owned())
    })
}

/// Generate an unguessable session identifier
fn new_session_id() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}
