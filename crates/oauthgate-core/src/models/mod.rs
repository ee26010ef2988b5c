// ABOUTME: Core data models for users, OAuth clients, codes, tokens, and scopes
// ABOUTME: Shared by the storage backends and the grant engines
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// OAuth 2.0 server persistence models
pub mod oauth2_server;
/// Resource owner accounts
pub mod user;

pub use oauth2_server::{
    AuthorizationCode, CodeState, OAuth2Client, OAuth2ClientType, ScopeDescription, Token,
    TokenState,
};
pub use user::User;
