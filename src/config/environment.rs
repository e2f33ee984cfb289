// ABOUTME: Environment configuration management for deployment-specific settings
// ABOUTME: Loads and validates the server configuration once at startup
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Sello Sign

//! Environment-based configuration management
//!
//! Everything the core needs from the outside world is read from environment
//! variables into one validated [`ServerConfig`] at startup. Validation fails
//! fast on missing secrets, placeholder values, and unparseable endpoints so
//! misconfiguration never surfaces as an obscure request-time failure.

use crate::auth::{DEFAULT_ACCESS_EXPIRY_SECS, DEFAULT_REFRESH_EXPIRY_SECS};
use crate::login_guard::{DEFAULT_LOCKOUT_WINDOW_SECS, DEFAULT_MAX_ATTEMPTS};
use crate::oauth::pkce::DEFAULT_CHALLENGE_LIFETIME_SECS;
use anyhow::{Context, Result};
use std::env;
use std::fmt;
use url::Url;

/// Values that indicate a secret was never actually configured
const PLACEHOLDER_MARKERS: &[&str] = &["your_", "changeme", "placeholder", "xxxx"];

/// Strongly typed log level configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Parse from string with fallback
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "error" => Self::Error,
            "warn" => Self::Warn,
            "debug" => Self::Debug,
            "trace" => Self::Trace,
            _ => Self::Info,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warn => write!(f, "warn"),
            Self::Info => write!(f, "info"),
            Self::Debug => write!(f, "debug"),
            Self::Trace => write!(f, "trace"),
        }
    }
}

/// Session token and login guard configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Process-wide HS256 signing secret; rotating it invalidates all tokens
    pub jwt_secret: String,
    /// Access token lifetime in seconds
    pub access_expiry_secs: i64,
    /// Refresh token lifetime in seconds
    pub refresh_expiry_secs: i64,
    /// Failed attempts allowed before lockout
    pub max_login_attempts: u32,
    /// Lockout window in seconds
    pub lockout_window_secs: i64,
}

/// E-signature provider configuration
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// OAuth client ID (integration key)
    pub client_id: String,
    /// OAuth client secret
    pub client_secret: String,
    /// Authorization endpoint
    pub auth_url: String,
    /// Token endpoint
    pub token_url: String,
    /// Redirect URI registered with the provider
    pub redirect_uri: String,
    /// Scopes to request
    pub scopes: Vec<String>,
    /// Shared HMAC key for webhook signatures
    pub webhook_hmac_key: String,
    /// PKCE challenge lifetime in seconds
    pub challenge_lifetime_secs: i64,
}

/// Outbound HTTP client configuration
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Total request timeout in seconds
    pub timeout_secs: u64,
    /// Connection timeout in seconds
    pub connect_timeout_secs: u64,
}

/// Server configuration loaded once at startup
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// HTTP listen port
    pub http_port: u16,
    /// Log level
    pub log_level: LogLevel,
    /// Session token and lockout settings
    pub auth: AuthConfig,
    /// Provider OAuth and webhook settings
    pub provider: ProviderConfig,
    /// Outbound HTTP client settings
    pub http_client: HttpClientConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error when a required variable is missing, unparseable, or
    /// still a placeholder.
    pub fn from_env() -> Result<Self> {
        let config = Self {
            http_port: env_var_or("HTTP_PORT", "8081")?
                .parse()
                .context("Invalid HTTP_PORT value")?,
            log_level: LogLevel::from_str_or_default(&env_var_or("LOG_LEVEL", "info")?),

            auth: AuthConfig {
                jwt_secret: env_var("JWT_SECRET")?,
                access_expiry_secs: env_var_or(
                    "JWT_ACCESS_EXPIRY_SECS",
                    &DEFAULT_ACCESS_EXPIRY_SECS.to_string(),
                )?
                .parse()
                .context("Invalid JWT_ACCESS_EXPIRY_SECS value")?,
                refresh_expiry_secs: env_var_or(
                    "JWT_REFRESH_EXPIRY_SECS",
                    &DEFAULT_REFRESH_EXPIRY_SECS.to_string(),
                )?
                .parse()
                .context("Invalid JWT_REFRESH_EXPIRY_SECS value")?,
                max_login_attempts: env_var_or(
                    "MAX_LOGIN_ATTEMPTS",
                    &DEFAULT_MAX_ATTEMPTS.to_string(),
                )?
                .parse()
                .context("Invalid MAX_LOGIN_ATTEMPTS value")?,
                lockout_window_secs: env_var_or(
                    "LOGIN_LOCKOUT_SECS",
                    &DEFAULT_LOCKOUT_WINDOW_SECS.to_string(),
                )?
                .parse()
                .context("Invalid LOGIN_LOCKOUT_SECS value")?,
            },

            provider: ProviderConfig {
                client_id: env_var("DOCUSIGN_CLIENT_ID")?,
                client_secret: env_var("DOCUSIGN_CLIENT_SECRET")?,
                auth_url: env_var_or(
                    "DOCUSIGN_AUTH_URL",
                    "https://account-d.docusign.com/oauth/auth",
                )?,
                token_url: env_var_or(
                    "DOCUSIGN_TOKEN_URL",
                    "https://account-d.docusign.com/oauth/token",
                )?,
                redirect_uri: env_var("DOCUSIGN_REDIRECT_URI")?,
                scopes: parse_scopes(&env_var_or("DOCUSIGN_SCOPES", "signature")?),
                webhook_hmac_key: env_var("DOCUSIGN_HMAC_KEY")?,
                challenge_lifetime_secs: env_var_or(
                    "PKCE_CHALLENGE_LIFETIME_SECS",
                    &DEFAULT_CHALLENGE_LIFETIME_SECS.to_string(),
                )?
                .parse()
                .context("Invalid PKCE_CHALLENGE_LIFETIME_SECS value")?,
            },

            http_client: HttpClientConfig {
                timeout_secs: env_var_or("PROVIDER_HTTP_TIMEOUT_SECS", "10")?
                    .parse()
                    .context("Invalid PROVIDER_HTTP_TIMEOUT_SECS value")?,
                connect_timeout_secs: env_var_or("PROVIDER_HTTP_CONNECT_TIMEOUT_SECS", "5")?
                    .parse()
                    .context("Invalid PROVIDER_HTTP_CONNECT_TIMEOUT_SECS value")?,
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values; fails fast at startup
    ///
    /// # Errors
    ///
    /// Returns an error describing the first rejected value.
    pub fn validate(&self) -> Result<()> {
        require_secret("JWT_SECRET", &self.auth.jwt_secret)?;
        if self.auth.jwt_secret.len() < 32 {
            anyhow::bail!("JWT_SECRET must be at least 32 characters");
        }

        require_secret("DOCUSIGN_CLIENT_ID", &self.provider.client_id)?;
        require_secret("DOCUSIGN_CLIENT_SECRET", &self.provider.client_secret)?;
        require_secret("DOCUSIGN_HMAC_KEY", &self.provider.webhook_hmac_key)?;
        require_secret("DOCUSIGN_REDIRECT_URI", &self.provider.redirect_uri)?;

        Url::parse(&self.provider.auth_url).context("DOCUSIGN_AUTH_URL is not a valid URL")?;
        Url::parse(&self.provider.token_url).context("DOCUSIGN_TOKEN_URL is not a valid URL")?;
        Url::parse(&self.provider.redirect_uri)
            .context("DOCUSIGN_REDIRECT_URI is not a valid URL")?;

        if self.http_client.timeout_secs == 0 {
            anyhow::bail!("PROVIDER_HTTP_TIMEOUT_SECS must be greater than zero");
        }

        Ok(())
    }

    /// Get a summary of the configuration for logging (without secrets)
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "Sello Auth Server Configuration:\n\
             - HTTP Port: {}\n\
             - Log Level: {}\n\
             - Access Token Lifetime: {}s\n\
             - Refresh Token Lifetime: {}s\n\
             - Login Lockout: {} attempts / {}s\n\
             - Provider Authorize Endpoint: {}\n\
             - Provider Redirect URI: {}\n\
             - Provider Scopes: {}\n\
             - Provider HTTP Timeout: {}s",
            self.http_port,
            self.log_level,
            self.auth.access_expiry_secs,
            self.auth.refresh_expiry_secs,
            self.auth.max_login_attempts,
            self.auth.lockout_window_secs,
            self.provider.auth_url,
            self.provider.redirect_uri,
            self.provider.scopes.join(" "),
            self.http_client.timeout_secs,
        )
    }
}

fn env_var(key: &str) -> Result<String> {
    env::var(key).with_context(|| format!("Missing required environment variable {key}"))
}

fn env_var_or(key: &str, default: &str) -> Result<String> {
    Ok(env::var(key).unwrap_or_else(|_| default.to_string()))
}

/// Parse comma-separated scopes
fn parse_scopes(scopes_str: &str) -> Vec<String> {
    scopes_str
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Reject empty values and known placeholders
fn require_secret(name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        anyhow::bail!("{name} must not be empty");
    }
    let lowered = value.to_lowercase();
    if PLACEHOLDER_MARKERS.iter().any(|m| lowered.contains(m)) {
        anyhow::bail!("{name} is still set to a placeholder value");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> ServerConfig {
        ServerConfig {
            http_port: 8081,
            log_level: LogLevel::Info,
            auth: AuthConfig {
                jwt_secret: "0123456789abcdef0123456789abcdef".into(),
                access_expiry_secs: 3600,
                refresh_expiry_secs: 2_592_000,
                max_login_attempts: 3,
                lockout_window_secs: 300,
            },
            provider: ProviderConfig {
                client_id: "integration-key".into(),
                client_secret: "client-secret-value".into(),
                auth_url: "https://account-d.docusign.com/oauth/auth".into(),
                token_url: "https://account-d.docusign.com/oauth/token".into(),
                redirect_uri: "https://app.sello.test/api/docusign/callback".into(),
                scopes: vec!["signature".into()],
                webhook_hmac_key: "webhook-shared-key".into(),
                challenge_lifetime_secs: 600,
            },
            http_client: HttpClientConfig {
                timeout_secs: 10,
                connect_timeout_secs: 5,
            },
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_placeholder_secret_rejected() {
        let mut config = valid_config();
        config.provider.client_secret = "your_client_secret_here".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_short_jwt_secret_rejected() {
        let mut config = valid_config();
        config.auth.jwt_secret = "too-short".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_redirect_uri_rejected() {
        let mut config = valid_config();
        config.provider.redirect_uri = "not a url".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut config = valid_config();
        config.http_client.timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_scopes_trims_and_filters() {
        assert_eq!(
            parse_scopes("signature, impersonation ,"),
            vec!["signature".to_string(), "impersonation".to_string()]
        );
    }
}
