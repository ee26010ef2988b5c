// ABOUTME: In-memory DatabaseProvider backed by HashMaps behind a single async RwLock
// ABOUTME: Enforces the same unique keys and conditional updates as the SQLite backend
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! In-memory database implementation
//!
//! Every trait call takes the lock once for its whole duration, so each
//! check-and-write is atomic with respect to other calls. Data is lost
//! when the last clone is dropped.

use super::DatabaseProvider;
use crate::errors::DatabaseError;
use crate::models::{AuthorizationCode, OAuth2Client, ScopeDescription, Token, User};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    usernames: HashMap<String, Uuid>,
    emails: HashMap<String, Uuid>,
    clients: HashMap<String, OAuth2Client>,
    auth_codes: HashMap<String, AuthorizationCode>,
    /// Keyed by access token
    tokens: HashMap<String, Token>,
    /// refresh token → access token
    refresh_index: HashMap<String, String>,
    scopes: BTreeMap<String, ScopeDescription>,
}

fn conflict(constraint: &str) -> DatabaseError {
    DatabaseError::UniqueViolation {
        constraint: constraint.to_owned(),
    }
}

/// In-memory database
#[derive(Clone, Default)]
pub struct MemoryDatabase {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryDatabase {
    /// Create an empty database
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored authorization codes
    pub async fn auth_code_count(&self) -> usize {
        self.tables.read().await.auth_codes.len()
    }
}

#[async_trait]
impl DatabaseProvider for MemoryDatabase {
    async fn migrate(&self) -> Result<(), DatabaseError> {
        Ok(())
    }

    async fn create_user(&self, user: &User) -> Result<(), DatabaseError> {
        let mut tables = self.tables.write().await;
        if tables.users.contains_key(&user.id) {
            return Err(conflict("users.id"));
        }
        if tables.usernames.contains_key(&user.username) {
            return Err(conflict("users.username"));
        }
        if let Some(email) = &user.email {
            if tables.emails.contains_key(email) {
                return Err(conflict("users.email"));
            }
            tables.emails.insert(email.clone(), user.id);
        }
        tables.usernames.insert(user.username.clone(), user.id);
        tables.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn get_user(&self, user_id: Uuid) -> Result<Option<User>, DatabaseError> {
        Ok(self.tables.read().await.users.get(&user_id).cloned())
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables
            .usernames
            .get(username)
            .and_then(|id| tables.users.get(id))
            .cloned())
    }

    async fn create_client(&self, client: &OAuth2Client) -> Result<(), DatabaseError> {
        let mut tables = self.tables.write().await;
        if tables.clients.contains_key(&client.client_id) {
            return Err(conflict("clients.client_id"));
        }
        if tables.clients.values().any(|c| c.id == client.id) {
            return Err(conflict("clients.id"));
        }
        tables
            .clients
            .insert(client.client_id.clone(), client.clone());
        Ok(())
    }

    async fn get_client(&self, client_id: &str) -> Result<Option<OAuth2Client>, DatabaseError> {
        Ok(self.tables.read().await.clients.get(client_id).cloned())
    }

    async fn create_auth_code(&self, code: &AuthorizationCode) -> Result<(), DatabaseError> {
        let mut tables = self.tables.write().await;
        if tables.auth_codes.contains_key(&code.code) {
            return Err(conflict("authorization_codes.code"));
        }
        tables.auth_codes.insert(code.code.clone(), code.clone());
        Ok(())
    }

    async fn get_auth_code(&self, code: &str) -> Result<Option<AuthorizationCode>, DatabaseError> {
        Ok(self.tables.read().await.auth_codes.get(code).cloned())
    }

    async fn compare_and_set_code_used(&self, code: &str) -> Result<bool, DatabaseError> {
        let mut tables = self.tables.write().await;
        match tables.auth_codes.get_mut(code) {
            Some(stored) if !stored.is_used => {
                stored.is_used = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete_expired_auth_codes(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<u64, DatabaseError> {
        let mut tables = self.tables.write().await;
        let before = tables.auth_codes.len();
        tables.auth_codes.retain(|_, code| code.expires_at >= cutoff);
        Ok((before - tables.auth_codes.len()) as u64)
    }

    async fn create_token(&self, token: &Token) -> Result<(), DatabaseError> {
        let mut tables = self.tables.write().await;
        if tables.tokens.contains_key(&token.access_token)
            || tables.refresh_index.contains_key(&token.access_token)
        {
            return Err(conflict("tokens.access_token"));
        }
        if tables.refresh_index.contains_key(&token.refresh_token)
            || tables.tokens.contains_key(&token.refresh_token)
        {
            return Err(conflict("tokens.refresh_token"));
        }
        tables
            .refresh_index
            .insert(token.refresh_token.clone(), token.access_token.clone());
        tables
            .tokens
            .insert(token.access_token.clone(), token.clone());
        Ok(())
    }

    async fn get_token_by_access_token(
        &self,
        access_token: &str,
    ) -> Result<Option<Token>, DatabaseError> {
        Ok(self.tables.read().await.tokens.get(access_token).cloned())
    }

    async fn get_token_by_refresh_token(
        &self,
        refresh_token: &str,
    ) -> Result<Option<Token>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables
            .refresh_index
            .get(refresh_token)
            .and_then(|access| tables.tokens.get(access))
            .cloned())
    }

    async fn compare_and_set_token_revoked(
        &self,
        access_token: &str,
    ) -> Result<bool, DatabaseError> {
        let mut tables = self.tables.write().await;
        match tables.tokens.get_mut(access_token) {
            Some(stored) if !stored.revoked => {
                stored.revoked = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn list_tokens_for_code(&self, code: &str) -> Result<Vec<Token>, DatabaseError> {
        let tables = self.tables.read().await;
        let mut tokens: Vec<Token> = tables
            .tokens
            .values()
            .filter(|t| t.origin_code.as_deref() == Some(code))
            .cloned()
            .collect();
        tokens.sort_by_key(|t| t.issued_at);
        Ok(tokens)
    }

    async fn list_tokens_for_user(&self, user_id: Uuid) -> Result<Vec<Token>, DatabaseError> {
        let tables = self.tables.read().await;
        let mut tokens: Vec<Token> = tables
            .tokens
            .values()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect();
        tokens.sort_by_key(|t| t.issued_at);
        Ok(tokens)
    }

    async fn create_scope(&self, scope: &ScopeDescription) -> Result<(), DatabaseError> {
        let mut tables = self.tables.write().await;
        if tables.scopes.contains_key(&scope.name) {
            return Err(conflict("scopes.name"));
        }
        tables.scopes.insert(scope.name.clone(), scope.clone());
        Ok(())
    }

    async fn list_scopes(&self) -> Result<Vec<ScopeDescription>, DatabaseError> {
        Ok(self.tables.read().await.scopes.values().cloned().collect())
    }
}
