// ABOUTME: Shared test utilities and setup functions for integration tests
// ABOUTME: Deterministic clock and random sources plus a harness over the in-memory backend
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
#![allow(
    dead_code,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::unwrap_used
)]
//! Shared test utilities for `oauthgate_server`

use oauthgate_server::clock::ManualClock;
use oauthgate_server::config::{
    DatabaseUrl, Environment, LogLevel, OAuth2ServerConfig, RateLimitConfig, ServerConfig,
};
use oauthgate_server::crypto::{Argon2CredentialStore, CredentialStore, RandomSource};
use oauthgate_server::database_plugins::{factory::Database, memory::MemoryDatabase};
use oauthgate_server::errors::{AppError, AppResult};
use oauthgate_server::models::{OAuth2Client, OAuth2ClientType, User};
use oauthgate_server::oauth2_server::ClientRegistrationRequest;
use oauthgate_server::resources::ServerResources;
use chrono::{TimeZone, Utc};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Once};

static INIT_LOGGER: Once = Once::new();

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match std::env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => tracing::Level::TRACE,
            Ok("DEBUG") => tracing::Level::DEBUG,
            Ok("INFO") => tracing::Level::INFO,
            _ => tracing::Level::WARN,
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .init();
    });
}

/// Redirect URI used by test clients
pub const TEST_REDIRECT_URI: &str = "https://client.example.com/callback";

/// Password used by test users
pub const TEST_PASSWORD: &str = "correct-horse-battery";

/// Random source that replays scripted values, then counts upward
#[derive(Debug, Default)]
pub struct ScriptedRandomSource {
    script: Mutex<VecDeque<String>>,
    counter: AtomicU64,
}

impl ScriptedRandomSource {
    /// Replay `values` in order before falling back to unique generated values
    #[must_use]
    pub fn new<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            script: Mutex::new(values.into_iter().map(Into::into).collect()),
            counter: AtomicU64::new(0),
        }
    }
}

impl RandomSource for ScriptedRandomSource {
    fn random_token(&self, _bytes: usize) -> AppResult<String> {
        let scripted = self
            .script
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .pop_front();
        Ok(scripted.unwrap_or_else(|| {
            format!("generated-{}", self.counter.fetch_add(1, Ordering::SeqCst))
        }))
    }
}

/// Random source whose RNG always fails
#[derive(Debug, Default, Clone, Copy)]
pub struct FailingRandomSource;

impl RandomSource for FailingRandomSource {
    fn random_token(&self, _bytes: usize) -> AppResult<String> {
        Err(AppError::internal("rng unavailable"))
    }
}

/// Argon2 store with the cheapest accepted parameters
#[must_use]
pub fn fast_credentials() -> Arc<dyn CredentialStore> {
    Argon2CredentialStore::with_params(64, 1).map_or_else(
        |_| Arc::new(Argon2CredentialStore::new()) as Arc<dyn CredentialStore>,
        |store| Arc::new(store) as Arc<dyn CredentialStore>,
    )
}

/// Fixed instant tests start from
#[must_use]
pub fn test_epoch() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0)
        .single()
        .unwrap_or_else(Utc::now)
}

/// Configuration for tests: in-memory storage and a generous rate limit
#[must_use]
pub fn test_config() -> ServerConfig {
    ServerConfig {
        http_port: 0,
        log_level: LogLevel::Warn,
        environment: Environment::Testing,
        database_url: DatabaseUrl::Memory,
        oauth2: OAuth2ServerConfig::default(),
        rate_limit: RateLimitConfig {
            requests_per_window: 1_000,
            ..RateLimitConfig::default()
        },
    }
}

/// Fully wired server over the in-memory backend with a manual clock
pub struct TestHarness {
    /// Shared resources handed to routes and engines
    pub resources: Arc<ServerResources>,
    /// Clock driving every engine
    pub clock: Arc<ManualClock>,
}

impl TestHarness {
    /// Harness with default configuration and a system-like random source
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(test_config(), Arc::new(ScriptedRandomSource::default()))
    }

    /// Harness with explicit configuration and random source
    #[must_use]
    pub fn with_config(config: ServerConfig, random: Arc<dyn RandomSource>) -> Self {
        Self::with_database(
            Database::Memory(MemoryDatabase::new()),
            config,
            random,
        )
    }

    /// Harness over an already migrated database
    #[must_use]
    pub fn with_database(
        database: Database,
        config: ServerConfig,
        random: Arc<dyn RandomSource>,
    ) -> Self {
        init_test_logging();
        let clock = Arc::new(ManualClock::new(test_epoch()));
        let resources = ServerResources::new(
            database,
            config,
            clock.clone(),
            random,
            fast_credentials(),
        );
        Self {
            resources: Arc::new(resources),
            clock,
        }
    }

    /// Register a user with [`TEST_PASSWORD`]
    ///
    /// # Errors
    /// Returns an error if the username is taken or storage fails
    pub async fn create_user(&self, username: &str) -> AppResult<User> {
        self.resources
            .accounts
            .register_user(username, TEST_PASSWORD, None)
            .await
    }

    /// Register a client allowed `scopes`, returning it with its plaintext secret
    ///
    /// # Errors
    /// Returns an error if registration fails
    pub async fn create_client(
        &self,
        scopes: &str,
        client_type: OAuth2ClientType,
    ) -> AppResult<(OAuth2Client, Option<String>)> {
        self.resources
            .oauth2_server
            .clients()
            .register(ClientRegistrationRequest {
                redirect_uri: TEST_REDIRECT_URI.to_owned(),
                client_name: Some("Test Client".to_owned()),
                scope: Some(scopes.to_owned()),
                client_type,
            })
            .await
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// In-memory `SQLite` database with the schema applied
pub async fn sqlite_memory_database() -> Database {
    use oauthgate_server::database_plugins::DatabaseProvider;

    let database = Database::new("sqlite::memory:").await.unwrap();
    database.migrate().await.unwrap();
    database
}

/// A user and a confidential client allowed `scopes`
pub async fn user_and_client(
    harness: &TestHarness,
    scopes: &str,
) -> (User, OAuth2Client, String) {
    let user = harness.create_user("alice").await.unwrap();
    let (client, secret) = harness
        .create_client(scopes, OAuth2ClientType::Confidential)
        .await
        .unwrap();
    (user, client, secret.unwrap())
}

/// Issue a code for `user` and `client` requesting `scopes`
pub async fn issue_code(
    harness: &TestHarness,
    user: &User,
    client: &OAuth2Client,
    scopes: &str,
) -> String {
    harness
        .resources
        .oauth2_server
        .codes()
        .issue(
            user.id,
            &client.client_id,
            Some(TEST_REDIRECT_URI),
            &oauthgate_server::models::ScopeSet::parse(scopes),
        )
        .await
        .unwrap()
        .code
}
