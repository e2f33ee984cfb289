// ABOUTME: Centralized resource container for dependency injection
// ABOUTME: Builds and shares the auth components consumed by the HTTP layer
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Sello Sign

//! # Server Resources
//!
//! One container holds every shared component so expensive objects are built
//! once at startup and handed to the HTTP layer behind `Arc`s. The user
//! store and the provider token-exchange transport are injected, which is
//! what lets tests run the full flows with an in-memory store and a stubbed
//! provider.

use crate::auth::AuthManager;
use crate::config::ServerConfig;
use crate::credentials::CredentialStore;
use crate::login_guard::LoginAttemptGuard;
use crate::oauth::client::{OAuth2Client, OAuth2Config, TokenExchange};
use crate::oauth::manager::ProviderAuthManager;
use crate::storage::UserStore;
use crate::utils::http_client::create_client_with_timeout;
use crate::webhook::WebhookSignatureValidator;
use std::sync::Arc;

/// Centralized resource container for dependency injection
#[derive(Clone)]
pub struct ServerResources {
    pub config: Arc<ServerConfig>,
    pub credentials: CredentialStore,
    pub login_guard: Arc<LoginAttemptGuard>,
    pub auth_manager: Arc<AuthManager>,
    pub provider_auth: Arc<ProviderAuthManager>,
    pub webhook_validator: Arc<WebhookSignatureValidator>,
}

impl ServerResources {
    /// Create resources with the real provider transport
    #[must_use]
    pub fn new(config: ServerConfig, users: Arc<dyn UserStore>) -> Self {
        let http_client = create_client_with_timeout(
            config.http_client.timeout_secs,
            config.http_client.connect_timeout_secs,
        );
        let oauth_config = oauth_config_from(&config);
        let exchange: Arc<dyn TokenExchange> =
            Arc::new(OAuth2Client::new(oauth_config, http_client));
        Self::with_exchange(config, users, exchange)
    }

    /// Create resources over an injected token-exchange transport
    #[must_use]
    pub fn with_exchange(
        config: ServerConfig,
        users: Arc<dyn UserStore>,
        exchange: Arc<dyn TokenExchange>,
    ) -> Self {
        let provider_auth = Arc::new(ProviderAuthManager::new(
            oauth_config_from(&config),
            exchange,
            config.provider.challenge_lifetime_secs,
        ));

        Self {
            credentials: CredentialStore::new(users),
            login_guard: Arc::new(LoginAttemptGuard::new(
                config.auth.max_login_attempts,
                config.auth.lockout_window_secs,
            )),
            auth_manager: Arc::new(AuthManager::new(
                config.auth.jwt_secret.as_bytes(),
                config.auth.access_expiry_secs,
                config.auth.refresh_expiry_secs,
            )),
            provider_auth,
            webhook_validator: Arc::new(WebhookSignatureValidator::new(
                config.provider.webhook_hmac_key.clone(),
            )),
            config: Arc::new(config),
        }
    }
}

fn oauth_config_from(config: &ServerConfig) -> OAuth2Config {
    OAuth2Config {
        client_id: config.provider.client_id.clone(),
        client_secret: config.provider.client_secret.clone(),
        auth_url: config.provider.auth_url.clone(),
        token_url: config.provider.token_url.clone(),
        redirect_uri: config.provider.redirect_uri.clone(),
        scopes: config.provider.scopes.clone(),
    }
}
