// ABOUTME: OAuth 2.0 server persistence models for clients, auth codes, tokens, and scopes
// ABOUTME: Used by the DatabaseProvider trait and the grant engines
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use crate::scopes::ScopeSet;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// OAuth 2.0 client type (RFC 6749 Section 2.1)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OAuth2ClientType {
    /// Cannot keep a secret; authenticates by `client_id` alone
    Public,
    /// Holds a secret and must present it
    #[default]
    Confidential,
}

impl OAuth2ClientType {
    /// Storage representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Confidential => "confidential",
        }
    }
}

impl fmt::Display for OAuth2ClientType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OAuth2ClientType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "public" => Ok(Self::Public),
            "confidential" => Ok(Self::Confidential),
            other => Err(format!("unknown client type: {other}")),
        }
    }
}

/// Stored OAuth 2.0 Client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuth2Client {
    /// Internal identifier
    pub id: Uuid,
    /// Public OAuth 2.0 client identifier
    pub client_id: String,
    /// Hashed client secret; `None` for public clients
    pub client_secret_hash: Option<String>,
    /// Registered redirect URI
    pub redirect_uri: String,
    /// Scopes this client may be granted
    pub allowed_scopes: ScopeSet,
    /// Human-readable client name
    pub client_name: Option<String>,
    /// Public or confidential
    pub client_type: OAuth2ClientType,
    /// When this client was registered
    pub created_at: DateTime<Utc>,
}

/// Lifecycle of an authorization code at a given instant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeState {
    /// Redeemable
    Issued,
    /// Exchanged for tokens (terminal)
    Redeemed,
    /// Lifetime elapsed before redemption (terminal)
    Expired,
}

/// OAuth 2.0 Authorization Code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationCode {
    /// The authorization code value
    pub code: String,
    /// User who authorized the code
    pub user_id: Uuid,
    /// Client that requested this code
    pub client_id: String,
    /// Redirect URI that must match during token exchange
    pub redirect_uri: String,
    /// Granted scopes
    pub scopes: ScopeSet,
    /// When this code was issued
    pub created_at: DateTime<Utc>,
    /// When this code expires
    pub expires_at: DateTime<Utc>,
    /// Whether this code has been exchanged for tokens
    pub is_used: bool,
}

impl AuthorizationCode {
    /// Whether the lifetime has elapsed at `now`
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// State at `now`; a used code reports `Redeemed` even after expiry
    #[must_use]
    pub fn state_at(&self, now: DateTime<Utc>) -> CodeState {
        if self.is_used {
            CodeState::Redeemed
        } else if self.is_expired_at(now) {
            CodeState::Expired
        } else {
            CodeState::Issued
        }
    }
}

/// Lifecycle of a token record at a given instant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenState {
    /// Usable
    Active,
    /// Revoked (terminal)
    Revoked,
    /// Access lifetime elapsed (terminal)
    Expired,
}

/// Access/refresh token pair record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Access token value
    pub access_token: String,
    /// Refresh token value
    pub refresh_token: String,
    /// Owning user
    pub user_id: Uuid,
    /// Owning client
    pub client_id: String,
    /// Granted scopes
    pub scopes: ScopeSet,
    /// When this record was issued
    pub issued_at: DateTime<Utc>,
    /// When the access token expires
    pub expires_at: DateTime<Utc>,
    /// When the refresh token stops being accepted
    pub refresh_expires_at: DateTime<Utc>,
    /// Whether this record has been revoked
    pub revoked: bool,
    /// Authorization code whose redemption started this lineage
    pub origin_code: Option<String>,
    /// Access token of the record this one was rotated from
    pub parent_access_token: Option<String>,
}

impl Token {
    /// Whether the access token lifetime has elapsed at `now`
    #[must_use]
    pub fn is_access_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Whether the refresh token lifetime has elapsed at `now`
    #[must_use]
    pub fn is_refresh_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.refresh_expires_at
    }

    /// State at `now`; revocation wins over expiry
    #[must_use]
    pub fn state_at(&self, now: DateTime<Utc>) -> TokenState {
        if self.revoked {
            TokenState::Revoked
        } else if self.is_access_expired_at(now) {
            TokenState::Expired
        } else {
            TokenState::Active
        }
    }
}

/// Scope catalog entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeDescription {
    /// Unique scope name
    pub name: String,
    /// What the scope allows
    pub description: Option<String>,
}
