// ABOUTME: Access and refresh token lifecycle: issuance, rotation, validation, and revocation
// ABOUTME: Tokens are opaque random strings tracked per record with lineage back to their code
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::authorization_code::RedeemedGrant;
use super::random_value;
use crate::clock::Clock;
use crate::config::OAuth2ServerConfig;
use crate::constants::oauth2::{RANDOM_TOKEN_BYTES, TOKEN_TYPE_BEARER};
use crate::crypto::RandomSource;
use crate::database_plugins::{bounded, factory::Database, DatabaseProvider};
use crate::errors::{GrantError, GrantResult};
use crate::models::{ScopeSet, Token, TokenState};
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Newly issued access/refresh pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    /// Access token value
    pub access_token: String,
    /// Refresh token value
    pub refresh_token: String,
    /// Always `Bearer`
    pub token_type: &'static str,
    /// Seconds until the access token expires
    pub expires_in: i64,
    /// Access token expiry
    pub expires_at: DateTime<Utc>,
    /// Granted scopes
    pub scopes: ScopeSet,
}

impl TokenPair {
    fn from_record(token: &Token) -> Self {
        Self {
            access_token: token.access_token.clone(),
            refresh_token: token.refresh_token.clone(),
            token_type: TOKEN_TYPE_BEARER,
            expires_in: (token.expires_at - token.issued_at).num_seconds(),
            expires_at: token.expires_at,
            scopes: token.scopes.clone(),
        }
    }
}

/// Result of a successful access token validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedToken {
    /// Owning user
    pub user_id: Uuid,
    /// Owning client
    pub client_id: String,
    /// Granted scopes
    pub scopes: ScopeSet,
    /// Access token expiry
    pub expires_at: DateTime<Utc>,
}

/// Which value of a record a presented token matched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Matched the access token
    Access,
    /// Matched the refresh token
    Refresh,
}

impl TokenKind {
    /// RFC 7009 `token_type_hint` value
    #[must_use]
    pub const fn as_hint(self) -> &'static str {
        match self {
            Self::Access => "access_token",
            Self::Refresh => "refresh_token",
        }
    }
}

/// Issues, rotates, validates, and revokes tokens
pub struct TokenEngine {
    database: Arc<Database>,
    clock: Arc<dyn Clock>,
    random: Arc<dyn RandomSource>,
    access_ttl: Duration,
    refresh_ttl: Duration,
    max_generation_attempts: u32,
    storage_timeout: std::time::Duration,
}

impl TokenEngine {
    /// Create an engine over `database` using the lifetimes in `config`
    #[must_use]
    pub fn new(
        database: Arc<Database>,
        clock: Arc<dyn Clock>,
        random: Arc<dyn RandomSource>,
        config: &OAuth2ServerConfig,
    ) -> Self {
        Self {
            database,
            clock,
            random,
            access_ttl: config.access_token_ttl(),
            refresh_ttl: config.refresh_token_ttl(),
            max_generation_attempts: config.max_generation_attempts,
            storage_timeout: config.storage_timeout(),
        }
    }

    /// Issue the first token pair of a lineage from a redeemed code
    ///
    /// # Errors
    ///
    /// - `UnknownClient` if the client no longer exists
    /// - `InvalidScope` if the grant exceeds the client's current allowed scopes
    /// - `StorageUnavailable` on storage failure or exhausted generation attempts
    pub async fn issue_from_code(&self, grant: &RedeemedGrant) -> GrantResult<TokenPair> {
        let client = bounded(self.storage_timeout, self.database.get_client(&grant.client_id))
            .await?
            .ok_or(GrantError::UnknownClient)?;

        if !grant.scopes.is_subset(&client.allowed_scopes) {
            return Err(GrantError::InvalidScope(
                grant.scopes.difference(&client.allowed_scopes).to_string(),
            ));
        }

        let record = self
            .insert_record(|access_token, refresh_token, now| Token {
                access_token,
                refresh_token,
                user_id: grant.user_id,
                client_id: grant.client_id.clone(),
                scopes: grant.scopes.clone(),
                issued_at: now,
                expires_at: now + self.access_ttl,
                refresh_expires_at: now + self.refresh_ttl,
                revoked: false,
                origin_code: Some(grant.code.clone()),
                parent_access_token: None,
            })
            .await?;

        info!(
            client_id = %record.client_id,
            user_id = %record.user_id,
            scopes = %record.scopes,
            "Issued token pair from authorization code"
        );
        Ok(TokenPair::from_record(&record))
    }

    /// Rotate a refresh token into a new pair, optionally narrowing scopes
    ///
    /// The presented record is revoked before the replacement is stored, so a
    /// refresh token works at most once.
    ///
    /// # Errors
    ///
    /// - `TokenNotFound` if no record carries this refresh token
    /// - `ClientMismatch` if the record belongs to another client
    /// - `TokenRevoked` if the record is revoked, including by a concurrent refresh
    /// - `TokenExpired` if the refresh lifetime has elapsed
    /// - `InvalidScope` if `requested` widens the original grant
    /// - `StorageUnavailable` on storage failure
    pub async fn refresh(
        &self,
        refresh_token: &str,
        client_id: &str,
        requested: Option<&ScopeSet>,
    ) -> GrantResult<TokenPair> {
        let old = bounded(
            self.storage_timeout,
            self.database.get_token_by_refresh_token(refresh_token),
        )
        .await?
        .ok_or(GrantError::TokenNotFound)?;

        if old.client_id != client_id {
            warn!(
                client_id = %client_id,
                issued_to = %old.client_id,
                "Refresh token presented by a different client"
            );
            return Err(GrantError::ClientMismatch);
        }

        if old.revoked {
            warn!(
                security_event = "refresh_reuse",
                client_id = %client_id,
                user_id = %old.user_id,
                "Revoked refresh token presented"
            );
            return Err(GrantError::TokenRevoked);
        }

        if old.is_refresh_expired_at(self.clock.now()) {
            return Err(GrantError::TokenExpired);
        }

        let scopes = match requested {
            Some(requested) if !requested.is_empty() => {
                if !requested.is_subset(&old.scopes) {
                    return Err(GrantError::InvalidScope(
                        requested.difference(&old.scopes).to_string(),
                    ));
                }
                requested.clone()
            }
            _ => old.scopes.clone(),
        };

        let won = bounded(
            self.storage_timeout,
            self.database.compare_and_set_token_revoked(&old.access_token),
        )
        .await?;
        if !won {
            warn!(
                security_event = "refresh_reuse",
                client_id = %client_id,
                "Refresh token rotated concurrently"
            );
            return Err(GrantError::TokenRevoked);
        }

        let record = self
            .insert_record(|access_token, refresh_token, now| Token {
                access_token,
                refresh_token,
                user_id: old.user_id,
                client_id: old.client_id.clone(),
                scopes: scopes.clone(),
                issued_at: now,
                expires_at: now + self.access_ttl,
                refresh_expires_at: now + self.refresh_ttl,
                revoked: false,
                origin_code: old.origin_code.clone(),
                parent_access_token: Some(old.access_token.clone()),
            })
            .await?;

        info!(
            client_id = %record.client_id,
            user_id = %record.user_id,
            scopes = %record.scopes,
            "Rotated refresh token"
        );
        Ok(TokenPair::from_record(&record))
    }

    /// Check an access token without changing any state
    ///
    /// Revocation is reported even when the token has also expired.
    ///
    /// # Errors
    ///
    /// - `TokenNotFound` if no record carries this access token
    /// - `TokenRevoked` if the record is revoked
    /// - `TokenExpired` if the access lifetime has elapsed
    /// - `StorageUnavailable` on storage failure
    pub async fn validate(&self, access_token: &str) -> GrantResult<ValidatedToken> {
        let token = bounded(
            self.storage_timeout,
            self.database.get_token_by_access_token(access_token),
        )
        .await?
        .ok_or(GrantError::TokenNotFound)?;

        match token.state_at(self.clock.now()) {
            TokenState::Active => {}
            TokenState::Revoked => return Err(GrantError::TokenRevoked),
            TokenState::Expired => return Err(GrantError::TokenExpired),
        }

        Ok(ValidatedToken {
            user_id: token.user_id,
            client_id: token.client_id,
            scopes: token.scopes,
            expires_at: token.expires_at,
        })
    }

    /// Look up the record an access or refresh token belongs to
    ///
    /// # Errors
    /// Returns `StorageUnavailable` on storage failure
    pub async fn find(&self, token: &str) -> GrantResult<Option<(Token, TokenKind)>> {
        if let Some(record) = bounded(
            self.storage_timeout,
            self.database.get_token_by_access_token(token),
        )
        .await?
        {
            return Ok(Some((record, TokenKind::Access)));
        }

        Ok(bounded(
            self.storage_timeout,
            self.database.get_token_by_refresh_token(token),
        )
        .await?
        .map(|record| (record, TokenKind::Refresh)))
    }

    /// Revoke the record an access or refresh token belongs to
    ///
    /// Unknown and already revoked tokens are accepted; the return value says
    /// whether this call performed the revocation.
    ///
    /// # Errors
    /// Returns `StorageUnavailable` on storage failure
    pub async fn revoke(&self, token: &str) -> GrantResult<bool> {
        let Some((record, kind)) = self.find(token).await? else {
            debug!("Revocation requested for unknown token");
            return Ok(false);
        };

        let changed = bounded(
            self.storage_timeout,
            self.database
                .compare_and_set_token_revoked(&record.access_token),
        )
        .await?;

        if changed {
            info!(
                client_id = %record.client_id,
                user_id = %record.user_id,
                presented = kind.as_hint(),
                "Revoked token"
            );
        }
        Ok(changed)
    }

    /// Revoke every record whose lineage started with `code`
    ///
    /// # Errors
    /// Returns `StorageUnavailable` on storage failure
    pub async fn revoke_lineage(&self, code: &str) -> GrantResult<usize> {
        let tokens = bounded(self.storage_timeout, self.database.list_tokens_for_code(code))
            .await?;
        let revoked = self.revoke_records(&tokens).await?;
        if revoked > 0 {
            warn!(
                security_event = "lineage_revoked",
                revoked, "Revoked tokens descended from a reused authorization code"
            );
        }
        Ok(revoked)
    }

    /// Revoke every record owned by `user_id`
    ///
    /// # Errors
    /// Returns `StorageUnavailable` on storage failure
    pub async fn revoke_all_for_user(&self, user_id: Uuid) -> GrantResult<usize> {
        let tokens = bounded(
            self.storage_timeout,
            self.database.list_tokens_for_user(user_id),
        )
        .await?;
        let revoked = self.revoke_records(&tokens).await?;
        info!(user_id = %user_id, revoked, "Revoked all tokens for user");
        Ok(revoked)
    }

    async fn revoke_records(&self, tokens: &[Token]) -> GrantResult<usize> {
        let mut revoked = 0;
        for token in tokens.iter().filter(|t| !t.revoked) {
            if bounded(
                self.storage_timeout,
                self.database
                    .compare_and_set_token_revoked(&token.access_token),
            )
            .await?
            {
                revoked += 1;
            }
        }
        Ok(revoked)
    }

    /// Store a record built from fresh random values, retrying on unique-key conflicts
    async fn insert_record<F>(&self, build: F) -> GrantResult<Token>
    where
        F: Fn(String, String, DateTime<Utc>) -> Token + Send + Sync,
    {
        for attempt in 1..=self.max_generation_attempts {
            let access_token = random_value(self.random.as_ref(), RANDOM_TOKEN_BYTES)?;
            let refresh_token = random_value(self.random.as_ref(), RANDOM_TOKEN_BYTES)?;
            if access_token == refresh_token {
                warn!(attempt, "Generated identical access and refresh tokens, regenerating");
                continue;
            }

            let record = build(access_token, refresh_token, self.clock.now());
            match bounded(self.storage_timeout, self.database.create_token(&record)).await {
                Ok(()) => return Ok(record),
                Err(e) if e.is_conflict() => {
                    warn!(attempt, "Token value collided with an existing token, regenerating");
                }
                Err(e) => return Err(GrantError::StorageUnavailable(e.to_string())),
            }
        }

        Err(GrantError::StorageUnavailable(format!(
            "could not generate unique tokens after {} attempts",
            self.max_generation_attempts
        )))
    }
}
