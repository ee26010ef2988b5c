// ABOUTME: Authorization code issuance and single-use redemption
// ABOUTME: Binds each code to user, client, scopes, and redirect URI with an atomic used flag
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::random_value;
use super::scopes::ScopeValidator;
use crate::clock::Clock;
use crate::config::OAuth2ServerConfig;
use crate::constants::oauth2::RANDOM_TOKEN_BYTES;
use crate::crypto::RandomSource;
use crate::database_plugins::{bounded, factory::Database, DatabaseProvider};
use crate::errors::{GrantError, GrantResult};
use crate::models::{AuthorizationCode, CodeState, ScopeSet};
use chrono::Duration;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// What a successful redemption hands to the token engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedeemedGrant {
    /// User who authorized the code
    pub user_id: Uuid,
    /// Client the code was issued to
    pub client_id: String,
    /// Scopes granted at issuance
    pub scopes: ScopeSet,
    /// The redeemed code, recorded as the origin of the token lineage
    pub code: String,
}

/// Issues and redeems one-time authorization codes
pub struct AuthorizationCodeEngine {
    database: Arc<Database>,
    clock: Arc<dyn Clock>,
    random: Arc<dyn RandomSource>,
    scopes: ScopeValidator,
    code_ttl: Duration,
    max_generation_attempts: u32,
    storage_timeout: std::time::Duration,
}

impl AuthorizationCodeEngine {
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
            scopes: ScopeValidator::new(config.empty_scope_policy),
            code_ttl: config.code_ttl(),
            max_generation_attempts: config.max_generation_attempts,
            storage_timeout: config.storage_timeout(),
        }
    }

    /// Issue a code for `user_id` on behalf of `client_id`
    ///
    /// `redirect_uri`, when given, must equal the client's registered URI; the
    /// registered URI is what gets bound to the code either way.
    ///
    /// # Errors
    ///
    /// - `UnknownClient` / `UnknownUser` if either lookup fails
    /// - `ClientMismatch` if `redirect_uri` differs from the registered one
    /// - `InvalidScope` if `requested` is not within the client's allowed scopes
    /// - `StorageUnavailable` if storage fails or no unique code could be generated
    pub async fn issue(
        &self,
        user_id: Uuid,
        client_id: &str,
        redirect_uri: Option<&str>,
        requested: &ScopeSet,
    ) -> GrantResult<AuthorizationCode> {
        let client = bounded(self.storage_timeout, self.database.get_client(client_id))
            .await?
            .ok_or(GrantError::UnknownClient)?;

        if bounded(self.storage_timeout, self.database.get_user(user_id))
            .await?
            .is_none()
        {
            return Err(GrantError::UnknownUser);
        }

        if let Some(uri) = redirect_uri {
            if uri != client.redirect_uri {
                warn!(client_id = %client_id, "Authorization request with unregistered redirect_uri");
                return Err(GrantError::ClientMismatch);
            }
        }

        let scopes = self.scopes.check(requested, &client.allowed_scopes)?;

        for attempt in 1..=self.max_generation_attempts {
            let now = self.clock.now();
            let code = AuthorizationCode {
                code: random_value(self.random.as_ref(), RANDOM_TOKEN_BYTES)?,
                user_id,
                client_id: client.client_id.clone(),
                redirect_uri: client.redirect_uri.clone(),
                scopes: scopes.clone(),
                created_at: now,
                expires_at: now + self.code_ttl,
                is_used: false,
            };

            match bounded(self.storage_timeout, self.database.create_auth_code(&code)).await {
                Ok(()) => {
                    info!(
                        client_id = %client_id,
                        user_id = %user_id,
                        scopes = %code.scopes,
                        "Issued authorization code"
                    );
                    return Ok(code);
                }
                Err(e) if e.is_conflict() => {
                    warn!(attempt, "Authorization code collided with an existing code, regenerating");
                }
                Err(e) => return Err(GrantError::StorageUnavailable(e.to_string())),
            }
        }

        Err(GrantError::StorageUnavailable(format!(
            "could not generate a unique authorization code after {} attempts",
            self.max_generation_attempts
        )))
    }

    /// Redeem `code` for the client presenting it
    ///
    /// Checks run in a fixed order: existence, client and redirect binding,
    /// prior use, then expiry. The used flag is set with a conditional update,
    /// so of any number of concurrent redeemers exactly one succeeds.
    ///
    /// # Errors
    ///
    /// - `CodeNotFound` if the code was never issued or has been purged
    /// - `ClientMismatch` if `client_id` or `redirect_uri` differ from issuance
    /// - `CodeAlreadyUsed` if the code was redeemed before, including by a concurrent caller
    /// - `CodeExpired` if the code's lifetime has elapsed
    /// - `StorageUnavailable` on storage failure
    pub async fn redeem(
        &self,
        code: &str,
        client_id: &str,
        redirect_uri: &str,
    ) -> GrantResult<RedeemedGrant> {
        let stored = bounded(self.storage_timeout, self.database.get_auth_code(code))
            .await?
            .ok_or(GrantError::CodeNotFound)?;

        if stored.client_id != client_id || stored.redirect_uri != redirect_uri {
            warn!(
                client_id = %client_id,
                issued_to = %stored.client_id,
                "Authorization code presented by a different client or redirect_uri"
            );
            return Err(GrantError::ClientMismatch);
        }

        match stored.state_at(self.clock.now()) {
            CodeState::Issued => {}
            CodeState::Redeemed => {
                warn!(
                    security_event = "code_reuse",
                    client_id = %client_id,
                    user_id = %stored.user_id,
                    "Authorization code presented after redemption"
                );
                return Err(GrantError::CodeAlreadyUsed);
            }
            CodeState::Expired => {
                debug!(client_id = %client_id, "Authorization code expired before redemption");
                return Err(GrantError::CodeExpired);
            }
        }

        let won = bounded(
            self.storage_timeout,
            self.database.compare_and_set_code_used(code),
        )
        .await?;
        if !won {
            warn!(
                security_event = "code_reuse",
                client_id = %client_id,
                user_id = %stored.user_id,
                "Authorization code redeemed concurrently"
            );
            return Err(GrantError::CodeAlreadyUsed);
        }

        info!(client_id = %client_id, user_id = %stored.user_id, "Redeemed authorization code");

        Ok(RedeemedGrant {
            user_id: stored.user_id,
            client_id: stored.client_id,
            scopes: stored.scopes,
            code: stored.code,
        })
    }

    /// Delete codes whose `expires_at + grace` has passed
    ///
    /// Used codes inside the grace window stay so reuse can still be detected.
    /// A negative `grace` is treated as zero; unexpired codes are never purged.
    ///
    /// # Errors
    /// Returns `StorageUnavailable` on storage failure
    pub async fn purge_expired(&self, grace: Duration) -> GrantResult<u64> {
        if grace < Duration::zero() {
            warn!(
                grace_secs = grace.num_seconds(),
                "Negative code GC grace period clamped to zero"
            );
        }
        let cutoff = self.clock.now() - grace.max(Duration::zero());
        let removed = bounded(
            self.storage_timeout,
            self.database.delete_expired_auth_codes(cutoff),
        )
        .await?;
        if removed > 0 {
            info!(removed, "Purged expired authorization codes");
        }
        Ok(removed)
    }
}
