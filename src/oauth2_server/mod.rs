// ABOUTME: OAuth 2.0 authorization server with single-use codes and rotating refresh tokens
// ABOUTME: Engines for code and token lifecycles plus the endpoint façade and client registry
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// Authorization code issuance and redemption
pub mod authorization_code;
/// Client registration, authentication, and scope catalog
pub mod client_registration;
/// OAuth 2.0 authorization server endpoints
pub mod endpoints;
/// OAuth 2.0 request/response types
pub mod models;
/// Rate limiting for OAuth 2.0 endpoints
pub mod rate_limiting;
/// Scope validation
pub mod scopes;
/// Token issuance, rotation, validation, and revocation
pub mod tokens;

pub use authorization_code::{AuthorizationCodeEngine, RedeemedGrant};
pub use client_registration::ClientRegistry;
pub use endpoints::OAuth2AuthorizationServer;
pub use models::{
    AuthorizeRequest, AuthorizeResponse, ClientRegistrationRequest, ClientRegistrationResponse,
    IntrospectRequest, IntrospectResponse, OAuth2Error, RevokeRequest, TokenRequest,
    TokenResponse,
};
pub use rate_limiting::{OAuth2RateLimiter, RateLimitStatus};
pub use scopes::{EmptyScopePolicy, ScopeValidator};
pub use tokens::{TokenEngine, TokenKind, TokenPair, ValidatedToken};

use crate::crypto::RandomSource;
use crate::errors::{GrantError, GrantResult};

/// Draw an opaque value for a code or token
fn random_value(random: &dyn RandomSource, bytes: usize) -> GrantResult<String> {
    random
        .random_token(bytes)
        .map_err(|e| GrantError::StorageUnavailable(format!("random source failure: {e}")))
}
