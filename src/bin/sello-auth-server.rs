// ABOUTME: Server binary wiring configuration, logging, resources, and the router
// ABOUTME: Serves the auth core over HTTP with graceful shutdown
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Sello Sign

//! # Sello Auth Server Binary
//!
//! Starts the authentication core: loads and validates configuration from
//! the environment, initializes logging, builds the shared resources, and
//! serves the axum router until shutdown.

use anyhow::Result;
use clap::Parser;
use sello_auth::{
    config::environment::ServerConfig, logging, resources::ServerResources, routes,
    storage::MemoryUserStore,
};
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "sello-auth-server")]
#[command(about = "Sello Sign - authentication and provider authorization core")]
pub struct Args {
    /// Override HTTP port
    #[arg(long)]
    http_port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration from environment; misconfiguration fails here,
    // before anything listens
    let mut config = ServerConfig::from_env()?;
    if let Some(http_port) = args.http_port {
        config.http_port = http_port;
    }

    logging::init(config.log_level)?;
    info!("Starting Sello Auth Server");
    info!("{}", config.summary());

    let http_port = config.http_port;
    let resources = Arc::new(ServerResources::new(
        config,
        Arc::new(MemoryUserStore::new()),
    ));
    let app = routes::router(resources);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", http_port)).await?;
    info!("Listening on port {http_port}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
    }
}
