// ABOUTME: Database factory and provider abstraction for multi-backend support
// ABOUTME: Selects the in-memory or SQLite backend at runtime from the connection string
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Database factory for creating database providers
//!
//! This module provides automatic database type detection and creation
//! based on connection strings.

use super::memory::MemoryDatabase;
use super::sqlite::SqliteDatabase;
use super::DatabaseProvider;
use crate::errors::DatabaseError;
use crate::models::{AuthorizationCode, OAuth2Client, ScopeDescription, Token, User};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, info};
use uuid::Uuid;

/// Supported database types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseType {
    /// Process-local maps, lost on shutdown
    Memory,
    /// SQLite file or `sqlite::memory:`
    SQLite,
}

/// Database instance wrapper that delegates to the appropriate implementation
#[derive(Clone)]
pub enum Database {
    /// In-memory backend
    Memory(MemoryDatabase),
    /// SQLite backend
    SQLite(SqliteDatabase),
}

impl Database {
    /// Get a descriptive string for the current database backend
    #[must_use]
    pub const fn backend_info(&self) -> &'static str {
        match self {
            Self::Memory(_) => "In-Memory (Ephemeral)",
            Self::SQLite(_) => "SQLite (Embedded)",
        }
    }

    /// Get the database type enum
    #[must_use]
    pub const fn database_type(&self) -> DatabaseType {
        match self {
            Self::Memory(_) => DatabaseType::Memory,
            Self::SQLite(_) => DatabaseType::SQLite,
        }
    }

    /// Create a new database instance based on the connection string
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Database URL format is unsupported
    /// - Database connection fails
    /// - Database migration fails
    pub async fn new(database_url: &str) -> Result<Self, DatabaseError> {
        debug!("Detecting database type from URL: {}", database_url);
        let db_type = detect_database_type(database_url)?;
        info!("Detected database type: {:?}", db_type);

        match db_type {
            DatabaseType::Memory => Ok(Self::Memory(MemoryDatabase::new())),
            DatabaseType::SQLite => {
                info!("Initializing SQLite database");
                let db = SqliteDatabase::new(database_url).await?;
                info!("SQLite database initialized successfully");
                Ok(Self::SQLite(db))
            }
        }
    }
}

/// Automatically detect database type from connection string
///
/// # Errors
///
/// Returns an error if the URL starts with neither `memory` nor `sqlite:`
pub fn detect_database_type(database_url: &str) -> Result<DatabaseType, DatabaseError> {
    if database_url == "memory" || database_url.starts_with("memory://") {
        Ok(DatabaseType::Memory)
    } else if database_url.starts_with("sqlite:") {
        Ok(DatabaseType::SQLite)
    } else {
        Err(DatabaseError::ConnectionError {
            context: format!(
                "Unsupported database URL format: {database_url}. \
                 Supported formats: memory://, sqlite:path/to/db.sqlite, sqlite::memory:"
            ),
        })
    }
}

// Implement DatabaseProvider for the enum by delegating to the appropriate implementation
#[async_trait]
impl DatabaseProvider for Database {
    async fn migrate(&self) -> Result<(), DatabaseError> {
        match self {
            Self::Memory(db) => db.migrate().await,
            Self::SQLite(db) => db.migrate().await,
        }
    }

    async fn create_user(&self, user: &User) -> Result<(), DatabaseError> {
        match self {
            Self::Memory(db) => db.create_user(user).await,
            Self::SQLite(db) => db.create_user(user).await,
        }
    }

    async fn get_user(&self, user_id: Uuid) -> Result<Option<User>, DatabaseError> {
        match self {
            Self::Memory(db) => db.get_user(user_id).await,
            Self::SQLite(db) => db.get_user(user_id).await,
        }
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, DatabaseError> {
        match self {
            Self::Memory(db) => db.get_user_by_username(username).await,
            Self::SQLite(db) => db.get_user_by_username(username).await,
        }
    }

    async fn create_client(&self, client: &OAuth2Client) -> Result<(), DatabaseError> {
        match self {
            Self::Memory(db) => db.create_client(client).await,
            Self::SQLite(db) => db.create_client(client).await,
        }
    }

    async fn get_client(&self, client_id: &str) -> Result<Option<OAuth2Client>, DatabaseError> {
        match self {
            Self::Memory(db) => db.get_client(client_id).await,
            Self::SQLite(db) => db.get_client(client_id).await,
        }
    }

    async fn create_auth_code(&self, code: &AuthorizationCode) -> Result<(), DatabaseError> {
        match self {
            Self::Memory(db) => db.create_auth_code(code).await,
            Self::SQLite(db) => db.create_auth_code(code).await,
        }
    }

    async fn get_auth_code(&self, code: &str) -> Result<Option<AuthorizationCode>, DatabaseError> {
        match self {
            Self::Memory(db) => db.get_auth_code(code).await,
            Self::SQLite(db) => db.get_auth_code(code).await,
        }
    }

    async fn compare_and_set_code_used(&self, code: &str) -> Result<bool, DatabaseError> {
        match self {
            Self::Memory(db) => db.compare_and_set_code_used(code).await,
            Self::SQLite(db) => db.compare_and_set_code_used(code).await,
        }
    }

    async fn delete_expired_auth_codes(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<u64, DatabaseError> {
        match self {
            Self::Memory(db) => db.delete_expired_auth_codes(cutoff).await,
            Self::SQLite(db) => db.delete_expired_auth_codes(cutoff).await,
        }
    }

    async fn create_token(&self, token: &Token) -> Result<(), DatabaseError> {
        match self {
            Self::Memory(db) => db.create_token(token).await,
            Self::SQLite(db) => db.create_token(token).await,
        }
    }

    async fn get_token_by_access_token(
        &self,
        access_token: &str,
    ) -> Result<Option<Token>, DatabaseError> {
        match self {
            Self::Memory(db) => db.get_token_by_access_token(access_token).await,
            Self::SQLite(db) => db.get_token_by_access_token(access_token).await,
        }
    }

    async fn get_token_by_refresh_token(
        &self,
        refresh_token: &str,
    ) -> Result<Option<Token>, DatabaseError> {
        match self {
            Self::Memory(db) => db.get_token_by_refresh_token(refresh_token).await,
            Self::SQLite(db) => db.get_token_by_refresh_token(refresh_token).await,
        }
    }

    async fn compare_and_set_token_revoked(
        &self,
        access_token: &str,
    ) -> Result<bool, DatabaseError> {
        match self {
            Self::Memory(db) => db.compare_and_set_token_revoked(access_token).await,
            Self::SQLite(db) => db.compare_and_set_token_revoked(access_token).await,
        }
    }

    async fn list_tokens_for_code(&self, code: &str) -> Result<Vec<Token>, DatabaseError> {
        match self {
            Self::Memory(db) => db.list_tokens_for_code(code).await,
            Self::SQLite(db) => db.list_tokens_for_code(code).await,
        }
    }

    async fn list_tokens_for_user(&self, user_id: Uuid) -> Result<Vec<Token>, DatabaseError> {
        match self {
            Self::Memory(db) => db.list_tokens_for_user(user_id).await,
            Self::SQLite(db) => db.list_tokens_for_user(user_id).await,
        }
    }

    async fn create_scope(&self, scope: &ScopeDescription) -> Result<(), DatabaseError> {
        match self {
            Self::Memory(db) => db.create_scope(scope).await,
            Self::SQLite(db) => db.create_scope(scope).await,
        }
    }

    async fn list_scopes(&self) -> Result<Vec<ScopeDescription>, DatabaseError> {
        match self {
            Self::Memory(db) => db.list_scopes().await,
            Self::SQLite(db) => db.list_scopes().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_database_type() {
        assert_eq!(
            detect_database_type("memory://").unwrap(),
            DatabaseType::Memory
        );
        assert_eq!(
            detect_database_type("sqlite::memory:").unwrap(),
            DatabaseType::SQLite
        );
        assert_eq!(
            detect_database_type("sqlite:./data/oauthgate.db").unwrap(),
            DatabaseType::SQLite
        );
        assert!(detect_database_type("postgresql://localhost/db").is_err());
    }

    #[tokio::test]
    async fn test_memory_backend_info() {
        let db = Database::new("memory://").await.unwrap();
        assert_eq!(db.database_type(), DatabaseType::Memory);
        assert_eq!(db.backend_info(), "In-Memory (Ephemeral)");
    }
}
