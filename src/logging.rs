// ABOUTME: Logging configuration and structured logging setup for observability
// ABOUTME: Configures tracing subscribers with env-filter and pretty/json output
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Sello Sign

//! Production logging configuration with structured output

use crate::config::environment::LogLevel;
use anyhow::Result;
use std::env;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// JSON format for production logging
    Json,
    /// Pretty format for development
    Pretty,
}

impl LogFormat {
    /// Parse from string with fallback
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Pretty,
        }
    }
}

/// Initialize logging from the configured level and the `LOG_FORMAT` /
/// `RUST_LOG` environment variables
///
/// `RUST_LOG` takes precedence over the configured level so operators can
/// raise verbosity per module without touching configuration.
///
/// # Errors
///
/// Returns an error if a tracing subscriber is already installed.
pub fn init(level: LogLevel) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("info,sello_auth={level}")));

    let format = LogFormat::from_str_or_default(&env::var("LOG_FORMAT").unwrap_or_default());
    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json())
                .try_init()?;
        }
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .try_init()?;
        }
    }

    Ok(())
}
