// ABOUTME: Typed failures of the authorization code and token engines
// ABOUTME: Every engine operation returns these instead of raw storage errors
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::database::DatabaseError;

/// Failures returned by the authorization code and token engines
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GrantError {
    /// User referenced by the request does not exist
    #[error("Unknown user")]
    UnknownUser,

    /// Client referenced by the request does not exist
    #[error("Unknown client")]
    UnknownClient,

    /// Requested scopes are not a subset of what is allowed
    #[error("Invalid scope: {0}")]
    InvalidScope(String),

    /// Authorization code was never issued
    #[error("Authorization code not found")]
    CodeNotFound,

    /// Authorization code lifetime has elapsed
    #[error("Authorization code expired")]
    CodeExpired,

    /// Authorization code was already redeemed
    #[error("Authorization code already used")]
    CodeAlreadyUsed,

    /// Client or redirect URI differs from the one the grant is bound to
    #[error("Client mismatch")]
    ClientMismatch,

    /// Token was never issued
    #[error("Token not found")]
    TokenNotFound,

    /// Token lifetime has elapsed
    #[error("Token expired")]
    TokenExpired,

    /// Token was revoked
    #[error("Token revoked")]
    TokenRevoked,

    /// Transient storage conflict, safe to retry
    #[error("Storage conflict: {0}")]
    StorageConflict(String),

    /// Storage failed; fatal to the request
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),
}

impl GrantError {
    /// Whether the caller may retry the same operation
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::StorageConflict(_))
    }

    /// Stable snake-case identifier for logs and metrics
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::UnknownUser => "unknown_user",
            Self::UnknownClient => "unknown_client",
            Self::InvalidScope(_) => "invalid_scope",
            Self::CodeNotFound => "code_not_found",
            Self::CodeExpired => "code_expired",
            Self::CodeAlreadyUsed => "code_already_used",
            Self::ClientMismatch => "client_mismatch",
            Self::TokenNotFound => "token_not_found",
            Self::TokenExpired => "token_expired",
            Self::TokenRevoked => "token_revoked",
            Self::StorageConflict(_) => "storage_conflict",
            Self::StorageUnavailable(_) => "storage_unavailable",
        }
    }
}

impl From<DatabaseError> for GrantError {
    fn from(error: DatabaseError) -> Self {
        if error.is_conflict() {
            Self::StorageConflict(error.to_string())
        } else {
            Self::StorageUnavailable(error.to_string())
        }
    }
}

/// Result alias for engine operations
pub type GrantResult<T> = Result<T, GrantError>;
