// ABOUTME: Database abstraction layer for the oauthgate authorization server
// ABOUTME: Plugin architecture with in-memory and SQLite backends behind one trait
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use crate::errors::DatabaseError;
use crate::models::{AuthorizationCode, OAuth2Client, ScopeDescription, Token, User};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::future::Future;
use std::time::Duration;
use uuid::Uuid;

pub mod factory;
pub mod memory;
pub mod sqlite;

/// Core database abstraction trait
///
/// Every call is atomic on its own. Creates fail with
/// [`DatabaseError::UniqueViolation`] instead of overwriting, and the
/// `compare_and_set_*` methods flip a flag only if it still holds its
/// initial value, reporting whether this call performed the flip.
#[async_trait]
pub trait DatabaseProvider: Send + Sync + Clone {
    /// Run database migrations to set up schema
    async fn migrate(&self) -> Result<(), DatabaseError>;

    // ================================
    // Users
    // ================================

    /// Insert a new user; username and email must be unique
    async fn create_user(&self, user: &User) -> Result<(), DatabaseError>;

    /// Get user by ID
    async fn get_user(&self, user_id: Uuid) -> Result<Option<User>, DatabaseError>;

    /// Get user by username
    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, DatabaseError>;

    // ================================
    // OAuth 2.0 Clients
    // ================================

    /// Insert a new client; `client_id` must be unique
    async fn create_client(&self, client: &OAuth2Client) -> Result<(), DatabaseError>;

    /// Get client by its public `client_id`
    async fn get_client(&self, client_id: &str) -> Result<Option<OAuth2Client>, DatabaseError>;

    // ================================
    // Authorization Codes
    // ================================

    /// Insert a new authorization code; `code` must be unique
    async fn create_auth_code(&self, code: &AuthorizationCode) -> Result<(), DatabaseError>;

    /// Get authorization code by value
    async fn get_auth_code(&self, code: &str) -> Result<Option<AuthorizationCode>, DatabaseError>;

    /// Set `is_used` from false to true; `false` if the code is unknown or already used
    async fn compare_and_set_code_used(&self, code: &str) -> Result<bool, DatabaseError>;

    /// Delete codes that expired before `cutoff`, returning how many were removed
    async fn delete_expired_auth_codes(&self, cutoff: DateTime<Utc>)
        -> Result<u64, DatabaseError>;

    // ================================
    // Tokens
    // ================================

    /// Insert a new token record; access and refresh values must be unique
    async fn create_token(&self, token: &Token) -> Result<(), DatabaseError>;

    /// Get token record by access token value
    async fn get_token_by_access_token(
        &self,
        access_token: &str,
    ) -> Result<Option<Token>, DatabaseError>;

    /// Get token record by refresh token value
    async fn get_token_by_refresh_token(
        &self,
        refresh_token: &str,
    ) -> Result<Option<Token>, DatabaseError>;

    /// Set `revoked` from false to true; `false` if unknown or already revoked
    async fn compare_and_set_token_revoked(&self, access_token: &str)
        -> Result<bool, DatabaseError>;

    /// Token records whose lineage started with `code`
    async fn list_tokens_for_code(&self, code: &str) -> Result<Vec<Token>, DatabaseError>;

    /// Token records owned by `user_id`
    async fn list_tokens_for_user(&self, user_id: Uuid) -> Result<Vec<Token>, DatabaseError>;

    // ================================
    // Scope Catalog
    // ================================

    /// Insert a scope description; `name` must be unique
    async fn create_scope(&self, scope: &ScopeDescription) -> Result<(), DatabaseError>;

    /// All known scopes ordered by name
    async fn list_scopes(&self) -> Result<Vec<ScopeDescription>, DatabaseError>;
}

/// Run a storage call under a caller-supplied timeout
///
/// # Errors
/// Returns [`DatabaseError::Timeout`] if `limit` elapses first, otherwise the call's own result
pub async fn bounded<T, F>(limit: Duration, call: F) -> Result<T, DatabaseError>
where
    F: Future<Output = Result<T, DatabaseError>> + Send,
{
    tokio::time::timeout(limit, call)
        .await
        .unwrap_or_else(|_| {
            Err(DatabaseError::Timeout {
                millis: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
            })
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::GrantError;

    #[tokio::test]
    async fn test_bounded_times_out_stalled_calls() {
        let stalled = std::future::pending::<Result<(), DatabaseError>>();
        let error = bounded(Duration::from_millis(20), stalled)
            .await
            .unwrap_err();
        assert!(matches!(error, DatabaseError::Timeout { millis: 20 }));
        assert!(matches!(
            GrantError::from(error),
            GrantError::StorageUnavailable(_)
        ));
    }

    #[tokio::test]
    async fn test_bounded_passes_through_results() {
        let value = bounded(Duration::from_secs(1), async { Ok(7) }).await;
        assert_eq!(value.unwrap(), 7);

        let conflict = bounded(Duration::from_secs(1), async {
            Err::<(), _>(DatabaseError::UniqueViolation {
                constraint: "codes.code".to_owned(),
            })
        })
        .await
        .unwrap_err();
        assert!(conflict.is_conflict());
    }
}
