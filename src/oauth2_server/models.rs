// ABOUTME: OAuth 2.0 request and response structures for the authorization server endpoints
// ABOUTME: Covers authorize, token, revocation (RFC 7009), introspection (RFC 7662), and errors
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use crate::errors::GrantError;
use crate::models::OAuth2ClientType;
use serde::{Deserialize, Serialize};

/// Input for registering a new client
#[derive(Debug, Clone, Deserialize)]
pub struct ClientRegistrationRequest {
    /// Redirect URI for the authorization code flow
    pub redirect_uri: String,
    /// Display name shown to resource owners
    pub client_name: Option<String>,
    /// Scopes the client may request, space or comma separated
    pub scope: Option<String>,
    /// Public or confidential
    #[serde(default)]
    pub client_type: OAuth2ClientType,
}

/// Credentials returned once at registration
#[derive(Debug, Serialize)]
pub struct ClientRegistrationResponse {
    /// Generated `client_` identifier
    pub client_id: String,
    /// Plaintext secret, shown once; absent for public clients
    pub client_secret: Option<String>,
    /// Registration time as a Unix timestamp
    pub client_id_issued_at: i64,
    /// The single redirect URI bound to this client
    pub redirect_uri: String,
    /// Allowed scopes
    pub scope: String,
    /// Public or confidential
    pub client_type: OAuth2ClientType,
}

/// Form fields accepted by the authorize endpoint
#[derive(Debug, Deserialize, Clone)]
pub struct AuthorizeRequest {
    /// Response type; only `code` is supported
    pub response_type: String,
    /// Client identifier
    pub client_id: String,
    /// Redirect URI; defaults to the client's registered URI
    pub redirect_uri: Option<String>,
    /// Requested scopes
    pub scope: Option<String>,
    /// Opaque value echoed back to the client
    pub state: Option<String>,
}

/// Issued code plus the echoed state
#[derive(Debug, Serialize)]
pub struct AuthorizeResponse {
    /// Authorization code
    pub code: String,
    /// Echo of the request `state`
    pub state: Option<String>,
    /// Where the user agent should be sent
    pub redirect_uri: String,
}

/// Form fields accepted by the token endpoint
#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    /// Grant type (`authorization_code` or `refresh_token`)
    pub grant_type: String,
    /// Code being exchanged (`authorization_code` grant)
    pub code: Option<String>,
    /// Redirect URI bound to the code
    pub redirect_uri: Option<String>,
    /// Client ID
    pub client_id: String,
    /// Client secret; omitted by public clients
    pub client_secret: Option<String>,
    /// Narrowed scopes (for `refresh_token` grant)
    pub scope: Option<String>,
    /// Token being rotated (`refresh_token` grant)
    pub refresh_token: Option<String>,
}

/// Successful token endpoint body
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    /// Access token
    pub access_token: String,
    /// Always `Bearer`
    pub token_type: String,
    /// Expires in seconds
    pub expires_in: i64,
    /// Scopes granted
    pub scope: String,
    /// Refresh token
    pub refresh_token: String,
}

/// Token revocation request (RFC 7009)
#[derive(Debug, Deserialize)]
pub struct RevokeRequest {
    /// Access or refresh token to revoke
    pub token: String,
    /// Optional hint; both kinds are searched regardless
    pub token_type_hint: Option<String>,
    /// Client ID
    pub client_id: String,
    /// Client secret; omitted by public clients
    pub client_secret: Option<String>,
}

/// Token introspection request (RFC 7662)
#[derive(Debug, Deserialize)]
pub struct IntrospectRequest {
    /// Token to inspect
    pub token: String,
    /// Optional hint; both kinds are searched regardless
    pub token_type_hint: Option<String>,
    /// Client ID
    pub client_id: String,
    /// Client secret; omitted by public clients
    pub client_secret: Option<String>,
}

/// Token introspection response (RFC 7662)
///
/// Inactive tokens serialize as `{"active": false}` only.
#[derive(Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct IntrospectResponse {
    /// Whether the token is currently usable
    pub active: bool,
    /// Granted scopes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    /// Owning client
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    /// Owning user's username
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// `access_token` or `refresh_token`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    /// Expiry as a Unix timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
    /// Issuance as a Unix timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    /// Owning user's ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
}

impl IntrospectResponse {
    /// Response for unknown, revoked, or expired tokens
    #[must_use]
    pub fn inactive() -> Self {
        Self::default()
    }
}

/// RFC 6749 section 5.2 error body
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OAuth2Error {
    /// Error code
    pub error: String,
    /// Detail for developers, never shown to end users
    pub error_description: Option<String>,
    /// Link to documentation about the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_uri: Option<String>,
}

const RFC6749_AUTHZ_ERRORS: &str = "https://datatracker.ietf.org/doc/html/rfc6749#section-4.1.2.1";
const RFC6749_TOKEN_ERRORS: &str = "https://datatracker.ietf.org/doc/html/rfc6749#section-5.2";

impl OAuth2Error {
    fn new(error: &str, description: &str, uri: &str) -> Self {
        Self {
            error: error.to_owned(),
            error_description: Some(description.to_owned()),
            error_uri: Some(uri.to_owned()),
        }
    }

    /// `invalid_request`
    #[must_use]
    pub fn invalid_request(description: &str) -> Self {
        Self::new("invalid_request", description, RFC6749_AUTHZ_ERRORS)
    }

    /// `invalid_client`
    #[must_use]
    pub fn invalid_client() -> Self {
        Self::new(
            "invalid_client",
            "Client authentication failed",
            RFC6749_TOKEN_ERRORS,
        )
    }

    /// `invalid_grant`
    #[must_use]
    pub fn invalid_grant(description: &str) -> Self {
        Self::new("invalid_grant", description, RFC6749_TOKEN_ERRORS)
    }

    /// `unsupported_grant_type`
    #[must_use]
    pub fn unsupported_grant_type() -> Self {
        Self::new(
            "unsupported_grant_type",
            "Grant type not supported",
            RFC6749_TOKEN_ERRORS,
        )
    }

    /// `unsupported_response_type`
    #[must_use]
    pub fn unsupported_response_type() -> Self {
        Self::new(
            "unsupported_response_type",
            "Only the code response type is supported",
            RFC6749_AUTHZ_ERRORS,
        )
    }

    /// `invalid_scope`
    #[must_use]
    pub fn invalid_scope(description: &str) -> Self {
        Self::new("invalid_scope", description, RFC6749_AUTHZ_ERRORS)
    }

    /// `access_denied`
    #[must_use]
    pub fn access_denied(description: &str) -> Self {
        Self::new("access_denied", description, RFC6749_AUTHZ_ERRORS)
    }

    /// Create a `server_error` error
    #[must_use]
    pub fn server_error() -> Self {
        Self::new(
            "server_error",
            "The authorization server encountered an unexpected condition",
            RFC6749_AUTHZ_ERRORS,
        )
    }

    /// Create a `temporarily_unavailable` error
    #[must_use]
    pub fn temporarily_unavailable() -> Self {
        Self::new(
            "temporarily_unavailable",
            "The authorization server is temporarily unable to handle the request",
            RFC6749_AUTHZ_ERRORS,
        )
    }

    /// HTTP status for this error on the token endpoint
    #[must_use]
    pub fn http_status(&self) -> u16 {
        match self.error.as_str() {
            "invalid_client" => 401,
            "access_denied" => 403,
            "server_error" => 500,
            "temporarily_unavailable" => 503,
            _ => 400,
        }
    }
}

impl From<GrantError> for OAuth2Error {
    fn from(error: GrantError) -> Self {
        match error {
            GrantError::UnknownClient => Self::invalid_client(),
            GrantError::UnknownUser => Self::invalid_request("Unknown user"),
            GrantError::InvalidScope(scopes) => {
                Self::invalid_scope(&format!("Scope not permitted: {scopes}"))
            }
            GrantError::CodeNotFound => Self::invalid_grant("Authorization code is invalid"),
            GrantError::CodeExpired => Self::invalid_grant("Authorization code has expired"),
            GrantError::CodeAlreadyUsed => {
                Self::invalid_grant("Authorization code has already been used")
            }
            GrantError::ClientMismatch => {
                Self::invalid_grant("Grant was issued to another client or redirect_uri")
            }
            GrantError::TokenNotFound => Self::invalid_grant("Refresh token is invalid"),
            GrantError::TokenExpired => Self::invalid_grant("Refresh token has expired"),
            GrantError::TokenRevoked => Self::invalid_grant("Refresh token has been revoked"),
            GrantError::StorageConflict(_) | GrantError::StorageUnavailable(_) => {
                Self::temporarily_unavailable()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grant_errors_map_to_rfc6749_codes() {
        let cases = [
            (GrantError::UnknownClient, "invalid_client"),
            (GrantError::CodeAlreadyUsed, "invalid_grant"),
            (GrantError::CodeExpired, "invalid_grant"),
            (GrantError::ClientMismatch, "invalid_grant"),
            (GrantError::TokenRevoked, "invalid_grant"),
            (GrantError::InvalidScope("admin".into()), "invalid_scope"),
            (
                GrantError::StorageUnavailable("timeout".into()),
                "temporarily_unavailable",
            ),
        ];
        for (grant_error, expected) in cases {
            assert_eq!(OAuth2Error::from(grant_error).error, expected);
        }
    }

    #[test]
    fn test_inactive_introspection_serializes_minimally() {
        let json = serde_json::to_value(IntrospectResponse::inactive()).unwrap();
        assert_eq!(json, serde_json::json!({ "active": false }));
    }
}
