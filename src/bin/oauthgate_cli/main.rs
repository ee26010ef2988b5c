// ABOUTME: OAuthGate CLI - administrative command-line tool for the authorization server
// ABOUTME: Handles user creation, client registration, scope catalog, and code purging
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
//!
//! Usage:
//! ```bash
//! # Create a resource owner
//! oauthgate-cli create-user --username alice --password correct-horse
//!
//! # Register a confidential client allowed two scopes
//! oauthgate-cli create-client --redirect-uri https://app.example.com/cb --scope "read write"
//!
//! # Add a scope to the catalog
//! oauthgate-cli add-scope read --description "Read access"
//!
//! # Remove codes expired for longer than an hour
//! oauthgate-cli purge-codes --grace-secs 3600
//! ```

mod commands;
mod helpers;

use clap::{Parser, Subcommand};
use oauthgate_server::{
    config::{LogLevel, ServerConfig},
    constants::{env_config, oauth2::MAX_LIFETIME_SECS},
    errors::{AppError, AppResult},
    logging::{LogFormat, LoggingConfig},
    resources::ServerResources,
};
use std::env;
use tracing::info;

type Result<T> = AppResult<T>;

#[derive(Parser)]
#[command(
    name = "oauthgate-cli",
    about = "OAuthGate Management CLI",
    long_about = "Command-line tool for managing OAuthGate users, clients, scopes, and stored grants."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Database URL override
    #[arg(long, global = true)]
    database_url: Option<String>,

    /// Enable debug logging
    #[arg(long, short = 'v', global = true)]
    verbose: bool,
}

#[non_exhaustive]
#[derive(Subcommand)]
enum Command {
    /// Create a resource owner account
    CreateUser {
        /// Login name
        #[arg(long)]
        username: String,

        /// Password (at least 8 characters)
        #[arg(long)]
        password: String,

        /// Optional email address
        #[arg(long)]
        email: Option<String>,
    },

    /// Register an OAuth 2.0 client
    CreateClient {
        /// Registered redirect URI
        #[arg(long)]
        redirect_uri: String,

        /// Allowed scopes, space or comma separated
        #[arg(long)]
        scope: Option<String>,

        /// Display name
        #[arg(long)]
        name: Option<String>,

        /// Register a public client without a secret
        #[arg(long)]
        public: bool,
    },

    /// Add a scope to the catalog
    AddScope {
        /// Scope name
        name: String,

        /// What the scope allows
        #[arg(long)]
        description: Option<String>,
    },

    /// Delete authorization codes expired for longer than the grace period
    PurgeCodes {
        /// Grace period in seconds (defaults to the configured value)
        #[arg(long, value_parser = clap::value_parser!(i64).range(0..=MAX_LIFETIME_SECS))]
        grace_secs: Option<i64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut logging = LoggingConfig::from_env();
    logging.format = LogFormat::Compact;
    if cli.verbose {
        logging.level = LogLevel::Debug;
    }
    logging
        .init()
        .map_err(|e| AppError::internal(format!("Failed to initialize logging: {e}")))?;

    info!("OAuthGate CLI");

    if let Some(database_url) = &cli.database_url {
        // Single-threaded at this point; the override must be visible to from_env
        env::set_var(env_config::DATABASE_URL, database_url);
    }
    let config = ServerConfig::from_env()?;
    info!("Connecting to database: {}", config.database_url);
    let default_grace = config.oauth2.code_gc_grace();
    let resources = ServerResources::from_config(config).await?;

    match cli.command {
        Command::CreateUser {
            username,
            password,
            email,
        } => commands::user::create(&resources, &username, &password, email.as_deref()).await,
        Command::CreateClient {
            redirect_uri,
            scope,
            name,
            public,
        } => commands::client::create(&resources, redirect_uri, scope, name, public).await,
        Command::AddScope { name, description } => {
            commands::client::add_scope(&resources, &name, description.as_deref()).await
        }
        Command::PurgeCodes { grace_secs } => {
            let grace = grace_secs.map_or(default_grace, chrono::Duration::seconds);
            commands::maintenance::purge_codes(&resources, grace).await
        }
    }
}
