// ABOUTME: Server binary for the oauthgate OAuth 2.0 authorization server
// ABOUTME: Loads configuration, opens storage, starts code GC, and serves the HTTP routes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # OAuthGate Server Binary
//!
//! Starts the authorization server with environment configuration, structured
//! logging, database migrations, and a background sweeper for expired codes.

use anyhow::{Context, Result};
use clap::Parser;
use oauthgate_server::{
    config::{DatabaseUrl, ServerConfig},
    lifecycle::CodeSweeper,
    logging::LoggingConfig,
    resources::ServerResources,
    routes,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "oauthgate-server")]
#[command(about = "OAuthGate - OAuth 2.0 authorization server with token rotation and revocation")]
pub struct Args {
    /// Override HTTP port
    #[arg(long)]
    http_port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = ServerConfig::from_env()?;
    if let Some(http_port) = args.http_port {
        config.http_port = http_port;
    }

    LoggingConfig::from_server_config(&config).init()?;

    info!("Starting OAuthGate authorization server");
    info!("{}", config.summary());

    if let DatabaseUrl::SQLite { path } = &config.database_url {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create database directory {}", parent.display())
            })?;
        }
    }
    if config.database_url.is_ephemeral() {
        warn!("Using ephemeral storage; all grants are lost on shutdown");
    }

    let http_port = config.http_port;
    let gc_interval = Duration::from_secs(config.oauth2.code_gc_interval_secs);
    let gc_grace = config.oauth2.code_gc_grace();

    let resources = Arc::new(ServerResources::from_config(config).await?);
    let sweeper = CodeSweeper::spawn(resources.oauth2_server.clone(), gc_interval, gc_grace);

    let app = routes::router(resources);
    let addr = SocketAddr::from(([0, 0, 0, 0], http_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind HTTP listener on {addr}"))?;
    info!("HTTP server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("HTTP server failed")?;

    sweeper.shutdown().await;
    info!("OAuthGate server stopped");
    Ok(())
}

/// Resolve on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    info!("Shutdown signal received");
}
