// ABOUTME: Tests for environment-driven server configuration loading
// ABOUTME: Verifies defaults, overrides, and rejection of invalid values
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use oauthgate_server::config::{DatabaseUrl, Environment, ServerConfig};
use oauthgate_server::constants::env_config;
use oauthgate_server::oauth2_server::EmptyScopePolicy;
use serial_test::serial;
use std::env;
use std::path::PathBuf;

const ALL_VARS: &[&str] = &[
    env_config::HTTP_PORT,
    env_config::DATABASE_URL,
    env_config::LOG_LEVEL,
    env_config::ENVIRONMENT,
    env_config::CODE_TTL_SECS,
    env_config::ACCESS_TOKEN_TTL_SECS,
    env_config::REFRESH_TOKEN_TTL_SECS,
    env_config::EMPTY_SCOPE_POLICY,
    env_config::MAX_GENERATION_ATTEMPTS,
    env_config::STORAGE_TIMEOUT_MS,
    env_config::REVOKE_ON_CODE_REUSE,
    env_config::CODE_GC_GRACE_SECS,
    env_config::CODE_GC_INTERVAL_SECS,
    env_config::RATE_LIMIT_REQUESTS,
    env_config::RATE_LIMIT_WINDOW_SECS,
];

fn clear_env() {
    for var in ALL_VARS {
        env::remove_var(var);
    }
}

#[test]
#[serial]
fn test_defaults_when_environment_is_empty() {
    clear_env();
    let config = ServerConfig::from_env().unwrap();

    assert_eq!(config.http_port, 8080);
    assert_eq!(config.environment, Environment::Development);
    assert_eq!(
        config.database_url,
        DatabaseUrl::SQLite {
            path: PathBuf::from("./data/oauthgate.db")
        }
    );
    assert_eq!(config.oauth2.code_ttl_secs, 600);
    assert_eq!(config.oauth2.access_token_ttl_secs, 3600);
    assert_eq!(config.oauth2.refresh_token_ttl_secs, 30 * 24 * 3600);
    assert_eq!(config.oauth2.max_generation_attempts, 3);
    assert_eq!(config.oauth2.storage_timeout_ms, 5000);
    assert_eq!(config.oauth2.empty_scope_policy, EmptyScopePolicy::GrantAll);
    assert!(config.oauth2.revoke_on_code_reuse);
    assert_eq!(config.rate_limit.requests_per_window, 60);
}

#[test]
#[serial]
fn test_environment_overrides() {
    clear_env();
    env::set_var(env_config::HTTP_PORT, "9000");
    env::set_var(env_config::DATABASE_URL, "memory://");
    env::set_var(env_config::ENVIRONMENT, "production");
    env::set_var(env_config::CODE_TTL_SECS, "120");
    env::set_var(env_config::EMPTY_SCOPE_POLICY, "reject");
    env::set_var(env_config::REVOKE_ON_CODE_REUSE, "false");
    env::set_var(env_config::RATE_LIMIT_REQUESTS, "5");

    let config = ServerConfig::from_env().unwrap();
    clear_env();

    assert_eq!(config.http_port, 9000);
    assert_eq!(config.database_url, DatabaseUrl::Memory);
    assert!(config.environment.is_production());
    assert_eq!(config.oauth2.code_ttl_secs, 120);
    assert_eq!(config.oauth2.empty_scope_policy, EmptyScopePolicy::Reject);
    assert!(!config.oauth2.revoke_on_code_reuse);
    assert_eq!(config.rate_limit.requests_per_window, 5);
}

#[test]
#[serial]
fn test_unparseable_values_are_rejected() {
    clear_env();
    env::set_var(env_config::ACCESS_TOKEN_TTL_SECS, "an hour");
    assert!(ServerConfig::from_env().is_err());

    clear_env();
    env::set_var(env_config::EMPTY_SCOPE_POLICY, "sometimes");
    assert!(ServerConfig::from_env().is_err());

    clear_env();
    env::set_var(env_config::DATABASE_URL, "postgres://localhost/db");
    assert!(ServerConfig::from_env().is_err());
    clear_env();
}

#[test]
#[serial]
fn test_inconsistent_lifetimes_fail_validation() {
    clear_env();
    env::set_var(env_config::ACCESS_TOKEN_TTL_SECS, "7200");
    env::set_var(env_config::REFRESH_TOKEN_TTL_SECS, "3600");
    assert!(ServerConfig::from_env().is_err());

    clear_env();
    env::set_var(env_config::MAX_GENERATION_ATTEMPTS, "0");
    assert!(ServerConfig::from_env().is_err());
    clear_env();
}

#[test]
fn test_database_url_parsing() {
    assert_eq!(
        DatabaseUrl::parse_url("memory").unwrap(),
        DatabaseUrl::Memory
    );
    assert_eq!(
        DatabaseUrl::parse_url("sqlite::memory:").unwrap(),
        DatabaseUrl::SQLiteMemory
    );
    let file = DatabaseUrl::parse_url("sqlite:/var/lib/oauthgate.db").unwrap();
    assert_eq!(file.to_connection_string(), "sqlite:/var/lib/oauthgate.db");
    assert!(!file.is_ephemeral());
}
