// ABOUTME: Shared server resources for dependency injection into HTTP handlers and background tasks
// ABOUTME: Builds the database, account service, authorization server, and rate limiter once
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use crate::accounts::AccountService;
use crate::clock::{Clock, SystemClock};
use crate::config::ServerConfig;
use crate::crypto::{Argon2CredentialStore, CredentialStore, RandomSource, SystemRandomSource};
use crate::database_plugins::{factory::Database, DatabaseProvider};
use crate::errors::AppResult;
use crate::oauth2_server::{OAuth2AuthorizationServer, OAuth2RateLimiter};
use std::sync::Arc;
use tracing::info;

/// Centralized resource container for dependency injection
#[derive(Clone)]
pub struct ServerResources {
    /// Storage backend
    pub database: Arc<Database>,
    /// User registration and login
    pub accounts: Arc<AccountService>,
    /// Authorization server endpoints and engines
    pub oauth2_server: Arc<OAuth2AuthorizationServer>,
    /// Per-IP limiter for the OAuth endpoints
    pub rate_limiter: OAuth2RateLimiter,
    /// Loaded configuration
    pub config: Arc<ServerConfig>,
}

impl ServerResources {
    /// Wire resources over an existing database and explicit capabilities
    #[must_use]
    pub fn new(
        database: Database,
        config: ServerConfig,
        clock: Arc<dyn Clock>,
        random: Arc<dyn RandomSource>,
        credentials: Arc<dyn CredentialStore>,
    ) -> Self {
        let database = Arc::new(database);
        let accounts = Arc::new(AccountService::new(
            database.clone(),
            credentials.clone(),
            clock.clone(),
        ));
        let oauth2_server = Arc::new(OAuth2AuthorizationServer::new(
            database.clone(),
            clock,
            random,
            credentials,
            &config.oauth2,
        ));
        let rate_limiter = OAuth2RateLimiter::from_rate_limit_config(config.rate_limit.clone());

        Self {
            database,
            accounts,
            oauth2_server,
            rate_limiter,
            config: Arc::new(config),
        }
    }

    /// Connect and migrate the configured database, then wire production capabilities
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated
    pub async fn from_config(config: ServerConfig) -> AppResult<Self> {
        let database = Database::new(&config.database_url.to_connection_string()).await?;
        database.migrate().await?;
        info!("Database ready: {}", database.backend_info());

        Ok(Self::new(
            database,
            config,
            Arc::new(SystemClock),
            Arc::new(SystemRandomSource::new()),
            Arc::new(Argon2CredentialStore::new()),
        ))
    }
}
