// ABOUTME: Route module organization for the auth core HTTP endpoints
// ABOUTME: Assembles the axum router from domain modules with thin handlers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Sello Sign

//! Route modules for the Sello auth server
//!
//! Each domain module contains route definitions and thin handlers that
//! delegate to the service layer; business logic stays out of the handlers.

/// Authentication and session routes
pub mod auth;
/// Health check and readiness routes
pub mod health;
/// E-signature provider authorization and webhook routes
pub mod provider;

pub use auth::{AuthRoutes, AuthService};
pub use health::HealthRoutes;
pub use provider::ProviderRoutes;

use crate::resources::ServerResources;
use axum::Router;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};

/// Upper bound on request bodies; webhook payloads stay well under this
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Assemble the full application router
#[must_use]
pub fn router(resources: Arc<ServerResources>) -> Router {
    Router::new()
        .merge(HealthRoutes::routes())
        .nest("/api/auth", AuthRoutes::routes(resources.clone()))
        .nest("/api/docusign", ProviderRoutes::routes(resources))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
}
