// ABOUTME: Main library entry point for the Sello authentication core
// ABOUTME: Provides local login sessions, provider OAuth2 with PKCE, and webhook auth
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Sello Sign

#![deny(unsafe_code)]

//! # Sello Auth Server
//!
//! The authentication and third-party-authorization core of the Sello
//! document e-signature backend. Three concerns live here:
//!
//! - **Local sessions**: username/password login with bcrypt-hashed
//!   credentials, lockout after repeated failures, and signed access/refresh
//!   tokens with jti-based revocation
//! - **Provider authorization**: the OAuth2 Authorization Code with PKCE
//!   handshake against the external e-signature provider, including token
//!   custody and proactive renewal
//! - **Webhook authentication**: constant-time HMAC verification of inbound
//!   provider webhooks before any payload processing
//!
//! Persistence and the provider's business API are external collaborators:
//! the former sits behind the narrow [`storage::UserStore`] trait, the latter
//! behind [`oauth::client::TokenExchange`].
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use sello_auth::config::environment::ServerConfig;
//!
//! fn main() -> anyhow::Result<()> {
//!     // Load and validate configuration once at startup
//!     let config = ServerConfig::from_env()?;
//!     println!("Sello auth server configured on port {}", config.http_port);
//!     Ok(())
//! }
//! ```

// ── Public API ──────────────────────────────────────────────────────────
// These modules are used by the server binary (src/bin/) and integration
// tests (tests/). They must remain `pub` so external consumers can access them.

/// Session token issuance, verification, and revocation
pub mod auth;

/// Environment-driven configuration, validated at startup
pub mod config;

/// Password hashing and account creation over the user store
pub mod credentials;

/// Error taxonomy, HTTP mapping, and JSON error responses
pub mod errors;

/// Failed-login tracking and temporary lockout
pub mod login_guard;

/// Logging configuration and structured output
pub mod logging;

/// Core data models
pub mod models;

/// Provider OAuth2 handshake: PKCE, token exchange, orchestration
pub mod oauth;

/// Shared resource container for dependency injection
pub mod resources;

/// `HTTP` routes and the application router
pub mod routes;

/// Narrow persistence interface for user identities
pub mod storage;

/// Shared utilities
pub mod utils;

/// Webhook signature validation
pub mod webhook;
