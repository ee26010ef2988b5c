// ABOUTME: SQLite DatabaseProvider using sqlx with schema migrations and unique indexes
// ABOUTME: Conditional single-row UPDATEs provide the atomic code and token state flips
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! SQLite database implementation

use super::DatabaseProvider;
use crate::errors::DatabaseError;
use crate::models::{
    AuthorizationCode, OAuth2Client, OAuth2ClientType, ScopeDescription, ScopeSet, Token, User,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow};
use sqlx::{Pool, Row, Sqlite};
use std::str::FromStr;
use tracing::{debug, info};
use uuid::Uuid;

/// Connections kept for file-backed databases
const FILE_POOL_SIZE: u32 = 8;

/// SQLite database implementation
#[derive(Clone)]
pub struct SqliteDatabase {
    pool: Pool<Sqlite>,
}

impl SqliteDatabase {
    /// Connect to `database_url` and run migrations
    ///
    /// In-memory URLs get a single connection so every query sees the same database.
    ///
    /// # Errors
    /// Returns an error if the URL is malformed, the connection fails or migrations fail
    pub async fn new(database_url: &str) -> Result<Self, DatabaseError> {
        let in_memory = database_url.contains(":memory:");

        let mut options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);
        if !in_memory {
            options = options.journal_mode(SqliteJournalMode::Wal);
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(if in_memory { 1 } else { FILE_POOL_SIZE })
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.migrate().await?;
        debug!(in_memory, "SQLite pool ready");
        Ok(db)
    }

    async fn migrate_users(&self) -> Result<(), DatabaseError> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                username TEXT UNIQUE NOT NULL,
                password_hash TEXT NOT NULL,
                email TEXT UNIQUE,
                created_at DATETIME NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn migrate_clients(&self) -> Result<(), DatabaseError> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS oauth2_clients (
                id TEXT PRIMARY KEY,
                client_id TEXT UNIQUE NOT NULL,
                client_secret_hash TEXT,
                redirect_uri TEXT NOT NULL,
                allowed_scopes TEXT NOT NULL,
                client_name TEXT,
                client_type TEXT NOT NULL,
                created_at DATETIME NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS oauth2_scopes (
                name TEXT PRIMARY KEY,
                description TEXT
            )
            ",
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn migrate_grants(&self) -> Result<(), DatabaseError> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS oauth2_auth_codes (
                code TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                client_id TEXT NOT NULL,
                redirect_uri TEXT NOT NULL,
                scopes TEXT NOT NULL,
                created_at DATETIME NOT NULL,
                expires_at DATETIME NOT NULL,
                is_used INTEGER NOT NULL DEFAULT 0
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_oauth2_auth_codes_expires_at ON oauth2_auth_codes(expires_at)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS oauth2_tokens (
                access_token TEXT PRIMARY KEY,
                refresh_token TEXT UNIQUE NOT NULL,
                user_id TEXT NOT NULL,
                client_id TEXT NOT NULL,
                scopes TEXT NOT NULL,
                issued_at DATETIME NOT NULL,
                expires_at DATETIME NOT NULL,
                refresh_expires_at DATETIME NOT NULL,
                revoked INTEGER NOT NULL DEFAULT 0,
                origin_code TEXT,
                parent_access_token TEXT
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_oauth2_tokens_origin_code ON oauth2_tokens(origin_code)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_oauth2_tokens_user_id ON oauth2_tokens(user_id)")
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

fn parse_uuid(value: &str) -> Result<Uuid, DatabaseError> {
    Uuid::parse_str(value).map_err(|e| DatabaseError::QueryError {
        context: format!("Invalid UUID '{value}' in database: {e}"),
    })
}

fn row_to_user(row: &SqliteRow) -> Result<User, DatabaseError> {
    let id: String = row.get("id");
    Ok(User {
        id: parse_uuid(&id)?,
        username: row.get("username"),
        password_hash: row.get("password_hash"),
        email: row.get("email"),
        created_at: row.get("created_at"),
    })
}

fn row_to_client(row: &SqliteRow) -> Result<OAuth2Client, DatabaseError> {
    let id: String = row.get("id");
    let scopes: String = row.get("allowed_scopes");
    let client_type: String = row.get("client_type");
    Ok(OAuth2Client {
        id: parse_uuid(&id)?,
        client_id: row.get("client_id"),
        client_secret_hash: row.get("client_secret_hash"),
        redirect_uri: row.get("redirect_uri"),
        allowed_scopes: ScopeSet::parse(&scopes),
        client_name: row.get("client_name"),
        client_type: OAuth2ClientType::from_str(&client_type).map_err(|e| {
            DatabaseError::QueryError {
                context: format!("Invalid client_type in database: {e}"),
            }
        })?,
        created_at: row.get("created_at"),
    })
}

fn row_to_auth_code(row: &SqliteRow) -> Result<AuthorizationCode, DatabaseError> {
    let user_id: String = row.get("user_id");
    let scopes: String = row.get("scopes");
    Ok(AuthorizationCode {
        code: row.get("code"),
        user_id: parse_uuid(&user_id)?,
        client_id: row.get("client_id"),
        redirect_uri: row.get("redirect_uri"),
        scopes: ScopeSet::parse(&scopes),
        created_at: row.get("created_at"),
        expires_at: row.get("expires_at"),
        is_used: row.get("is_used"),
    })
}

fn row_to_token(row: &SqliteRow) -> Result<Token, DatabaseError> {
    let user_id: String = row.get("user_id");
    let scopes: String = row.get("scopes");
    Ok(Token {
        access_token: row.get("access_token"),
        refresh_token: row.get("refresh_token"),
        user_id: parse_uuid(&user_id)?,
        client_id: row.get("client_id"),
        scopes: ScopeSet::parse(&scopes),
        issued_at: row.get("issued_at"),
        expires_at: row.get("expires_at"),
        refresh_expires_at: row.get("refresh_expires_at"),
        revoked: row.get("revoked"),
        origin_code: row.get("origin_code"),
        parent_access_token: row.get("parent_access_token"),
    })
}

const TOKEN_COLUMNS: &str = "access_token, refresh_token, user_id, client_id, scopes, issued_at, \
     expires_at, refresh_expires_at, revoked, origin_code, parent_access_token";

#[async_trait]
impl DatabaseProvider for SqliteDatabase {
    async fn migrate(&self) -> Result<(), DatabaseError> {
        self.migrate_users().await?;
        self.migrate_clients().await?;
        self.migrate_grants().await?;
        info!("SQLite schema migrated");
        Ok(())
    }

    async fn create_user(&self, user: &User) -> Result<(), DatabaseError> {
        sqlx::query(
            r"
            INSERT INTO users (id, username, password_hash, email, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ",
        )
        .bind(user.id.to_string())
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.email)
        .bind(user.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_user(&self, user_id: Uuid) -> Result<Option<User>, DatabaseError> {
        let row = sqlx::query(
            "SELECT id, username, password_hash, email, created_at FROM users WHERE id = $1",
        )
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(row_to_user).transpose()
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, DatabaseError> {
        let row = sqlx::query(
            "SELECT id, username, password_hash, email, created_at FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(row_to_user).transpose()
    }

    async fn create_client(&self, client: &OAuth2Client) -> Result<(), DatabaseError> {
        sqlx::query(
            r"
            INSERT INTO oauth2_clients
                (id, client_id, client_secret_hash, redirect_uri, allowed_scopes,
                 client_name, client_type, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ",
        )
        .bind(client.id.to_string())
        .bind(&client.client_id)
        .bind(&client.client_secret_hash)
        .bind(&client.redirect_uri)
        .bind(client.allowed_scopes.to_string())
        .bind(&client.client_name)
        .bind(client.client_type.as_str())
        .bind(client.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_client(&self, client_id: &str) -> Result<Option<OAuth2Client>, DatabaseError> {
        let row = sqlx::query(
            r"
            SELECT id, client_id, client_secret_hash, redirect_uri, allowed_scopes,
                   client_name, client_type, created_at
            FROM oauth2_clients WHERE client_id = $1
            ",
        )
        .bind(client_id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(row_to_client).transpose()
    }

    async fn create_auth_code(&self, code: &AuthorizationCode) -> Result<(), DatabaseError> {
        sqlx::query(
            r"
            INSERT INTO oauth2_auth_codes
                (code, user_id, client_id, redirect_uri, scopes, created_at, expires_at, is_used)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ",
        )
        .bind(&code.code)
        .bind(code.user_id.to_string())
        .bind(&code.client_id)
        .bind(&code.redirect_uri)
        .bind(code.scopes.to_string())
        .bind(code.created_at)
        .bind(code.expires_at)
        .bind(code.is_used)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_auth_code(&self, code: &str) -> Result<Option<AuthorizationCode>, DatabaseError> {
        let row = sqlx::query(
            r"
            SELECT code, user_id, client_id, redirect_uri, scopes, created_at, expires_at, is_used
            FROM oauth2_auth_codes WHERE code = $1
            ",
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(row_to_auth_code).transpose()
    }

    async fn compare_and_set_code_used(&self, code: &str) -> Result<bool, DatabaseError> {
        let result =
            sqlx::query("UPDATE oauth2_auth_codes SET is_used = 1 WHERE code = $1 AND is_used = 0")
                .bind(code)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn delete_expired_auth_codes(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<u64, DatabaseError> {
        let result = sqlx::query("DELETE FROM oauth2_auth_codes WHERE expires_at < $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn create_token(&self, token: &Token) -> Result<(), DatabaseError> {
        // Access and refresh values share one namespace; the existence check and
        // the insert run as a single statement under SQLite's write lock
        let result = sqlx::query(&format!(
            "INSERT INTO oauth2_tokens ({TOKEN_COLUMNS}) \
             SELECT $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11 \
             WHERE NOT EXISTS (SELECT 1 FROM oauth2_tokens \
                 WHERE access_token IN ($1, $2) OR refresh_token IN ($1, $2))"
        ))
        .bind(&token.access_token)
        .bind(&token.refresh_token)
        .bind(token.user_id.to_string())
        .bind(&token.client_id)
        .bind(token.scopes.to_string())
        .bind(token.issued_at)
        .bind(token.expires_at)
        .bind(token.refresh_expires_at)
        .bind(token.revoked)
        .bind(&token.origin_code)
        .bind(&token.parent_access_token)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::UniqueViolation {
                constraint: "oauth2_tokens.token_value".to_owned(),
            });
        }
        Ok(())
    }

    async fn get_token_by_access_token(
        &self,
        access_token: &str,
    ) -> Result<Option<Token>, DatabaseError> {
        let row = sqlx::query(&format!(
            "SELECT {TOKEN_COLUMNS} FROM oauth2_tokens WHERE access_token = $1"
        ))
        .bind(access_token)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(row_to_token).transpose()
    }

    async fn get_token_by_refresh_token(
        &self,
        refresh_token: &str,
    ) -> Result<Option<Token>, DatabaseError> {
        let row = sqlx::query(&format!(
            "SELECT {TOKEN_COLUMNS} FROM oauth2_tokens WHERE refresh_token = $1"
        ))
        .bind(refresh_token)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(row_to_token).transpose()
    }

    async fn compare_and_set_token_revoked(
        &self,
        access_token: &str,
    ) -> Result<bool, DatabaseError> {
        let result = sqlx::query(
            "UPDATE oauth2_tokens SET revoked = 1 WHERE access_token = $1 AND revoked = 0",
        )
        .bind(access_token)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn list_tokens_for_code(&self, code: &str) -> Result<Vec<Token>, DatabaseError> {
        let rows = sqlx::query(&format!(
            "SELECT {TOKEN_COLUMNS} FROM oauth2_tokens WHERE origin_code = $1 ORDER BY issued_at"
        ))
        .bind(code)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_token).collect()
    }

    async fn list_tokens_for_user(&self, user_id: Uuid) -> Result<Vec<Token>, DatabaseError> {
        let rows = sqlx::query(&format!(
            "SELECT {TOKEN_COLUMNS} FROM oauth2_tokens WHERE user_id = $1 ORDER BY issued_at"
        ))
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_token).collect()
    }

    async fn create_scope(&self, scope: &ScopeDescription) -> Result<(), DatabaseError> {
        sqlx::query("INSERT INTO oauth2_scopes (name, description) VALUES ($1, $2)")
            .bind(&scope.name)
            .bind(&scope.description)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list_scopes(&self) -> Result<Vec<ScopeDescription>, DatabaseError> {
        let rows = sqlx::query("SELECT name, description FROM oauth2_scopes ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows
            .iter()
            .map(|row| ScopeDescription {
                name: row.get("name"),
                description: row.get("description"),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_duplicate_username_is_unique_violation() {
        let db = SqliteDatabase::new("sqlite::memory:").await.unwrap();
        let now = Utc::now();
        db.create_user(&User::new("alice".into(), "hash".into(), None, now))
            .await
            .unwrap();

        let err = db
            .create_user(&User::new("alice".into(), "other".into(), None, now))
            .await
            .unwrap_err();
        assert!(err.is_conflict(), "unexpected error: {err:?}");
    }

    #[tokio::test]
    async fn test_compare_and_set_token_revoked_flips_once() {
        let db = SqliteDatabase::new("sqlite::memory:").await.unwrap();
        let now = Utc::now();
        let token = Token {
            access_token: "at".into(),
            refresh_token: "rt".into(),
            user_id: Uuid::new_v4(),
            client_id: "client".into(),
            scopes: ScopeSet::parse("read write"),
            issued_at: now,
            expires_at: now + chrono::Duration::hours(1),
            refresh_expires_at: now + chrono::Duration::days(30),
            revoked: false,
            origin_code: Some("code".into()),
            parent_access_token: None,
        };
        db.create_token(&token).await.unwrap();

        assert!(db.compare_and_set_token_revoked("at").await.unwrap());
        assert!(!db.compare_and_set_token_revoked("at").await.unwrap());

        let stored = db.get_token_by_refresh_token("rt").await.unwrap().unwrap();
        assert!(stored.revoked);
        assert_eq!(stored.scopes, ScopeSet::parse("write read"));
        assert_eq!(stored.expires_at, token.expires_at);
    }

    #[tokio::test]
    async fn test_token_values_are_unique_across_columns() {
        let db = SqliteDatabase::new("sqlite::memory:").await.unwrap();
        let now = Utc::now();
        let token = |access: &str, refresh: &str| Token {
            access_token: access.into(),
            refresh_token: refresh.into(),
            user_id: Uuid::new_v4(),
            client_id: "client".into(),
            scopes: ScopeSet::parse("read"),
            issued_at: now,
            expires_at: now + chrono::Duration::hours(1),
            refresh_expires_at: now + chrono::Duration::days(30),
            revoked: false,
            origin_code: None,
            parent_access_token: None,
        };
        db.create_token(&token("at", "rt")).await.unwrap();

        for (access, refresh) in [("rt", "fresh-1"), ("fresh-2", "at"), ("at", "fresh-3")] {
            let err = db.create_token(&token(access, refresh)).await.unwrap_err();
            assert!(err.is_conflict(), "{access}/{refresh}: {err:?}");
        }
        assert!(db.get_token_by_access_token("rt").await.unwrap().is_none());
        assert!(db.get_token_by_refresh_token("at").await.unwrap().is_none());

        db.create_token(&token("at-2", "rt-2")).await.unwrap();
    }
}
