// ABOUTME: Main library entry point for the oauthgate authorization server
// ABOUTME: Provides single-use authorization codes, rotating refresh tokens, and revocation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]

//! # OAuthGate Server
//!
//! An OAuth 2.0 authorization server focused on the lifecycle of grants:
//! authorization codes that redeem at most once, access/refresh token pairs
//! that rotate on refresh, and revocation of single tokens, whole code
//! lineages, or every token a user holds.
//!
//! ## Architecture
//!
//! - **Engines**: `AuthorizationCodeEngine` and `TokenEngine` own the grant rules
//! - **Repository**: `DatabaseProvider` with in-memory and `SQLite` backends
//! - **Capabilities**: injected `Clock`, `RandomSource`, and `CredentialStore`
//! - **Façade**: `OAuth2AuthorizationServer` maps grant failures to RFC 6749 errors
//! - **HTTP**: axum routes for authorize, token, revoke, introspect, and health
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use oauthgate_server::config::ServerConfig;
//! use oauthgate_server::errors::AppResult;
//! use oauthgate_server::resources::ServerResources;
//!
//! #[tokio::main]
//! async fn main() -> AppResult<()> {
//!     let config = ServerConfig::from_env()?;
//!     let resources = ServerResources::from_config(config).await?;
//!     println!("Storage: {}", resources.database.backend_info());
//!     Ok(())
//! }
//! ```

/// User registration and password login
pub mod accounts;

/// Injectable time source
pub mod clock;

/// Environment-driven configuration
pub mod config;

/// Application constants and configuration defaults
pub mod constants;

/// Secret hashing and random token generation
pub mod crypto;

/// Storage abstraction with in-memory and `SQLite` backends
pub mod database_plugins;

/// Unified error handling system with standard error codes and HTTP responses
pub mod errors;

/// Background maintenance tasks
pub mod lifecycle;

/// Structured logging setup
pub mod logging;

/// Domain models
pub mod models;

/// OAuth 2.0 authorization server
pub mod oauth2_server;

/// Shared server resources
pub mod resources;

/// HTTP routes
pub mod routes;
