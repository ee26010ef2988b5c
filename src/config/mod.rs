// ABOUTME: Configuration module for the oauthgate server
// ABOUTME: Environment-driven settings for grants, storage, and rate limiting
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// Environment-based configuration
pub mod environment;

pub use environment::{
    DatabaseUrl, Environment, LogLevel, OAuth2ServerConfig, RateLimitConfig, ServerConfig,
};
