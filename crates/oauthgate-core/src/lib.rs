// ABOUTME: Core types and constants for the oauthgate authorization server
// ABOUTME: Foundation crate with domain models, error handling, scopes, and constants
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]

//! # oauthgate Core
//!
//! Foundation crate providing shared types for the oauthgate OAuth 2.0
//! authorization server. The server crate depends on these types for storage,
//! engines, and the HTTP façade.
//!
//! ## Modules
//!
//! - **errors**: `GrantError` for the code/token engines, `DatabaseError` for storage,
//!   and the unified `AppError` with `ErrorCode`
//! - **models**: Users, clients, authorization codes, tokens, and the scope catalog
//! - **scopes**: `ScopeSet` parsing, formatting, and subset checks
//! - **constants**: Default lifetimes and limits

/// Unified error handling system with standard error codes and HTTP responses
pub mod errors;

/// Application constants organized by domain
pub mod constants;

/// Persistence models for users, clients, codes, and tokens
pub mod models;

/// Scope sets with OAuth 2.0 wire formatting
pub mod scopes;
