// ABOUTME: OAuth 2.0 authorization, token, revocation, and introspection endpoint logic
// ABOUTME: Authenticates clients, drives the code and token engines, and maps failures to RFC 6749 errors
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::authorization_code::AuthorizationCodeEngine;
use super::client_registration::ClientRegistry;
use super::models::{
    AuthorizeRequest, AuthorizeResponse, IntrospectRequest, IntrospectResponse, OAuth2Error,
    RevokeRequest, TokenRequest, TokenResponse,
};
use super::tokens::{TokenEngine, TokenKind, TokenPair};
use crate::clock::Clock;
use crate::config::OAuth2ServerConfig;
use crate::constants::grant_types;
use crate::crypto::{CredentialStore, RandomSource};
use crate::database_plugins::{bounded, factory::Database, DatabaseProvider};
use crate::errors::{AppError, ErrorCode, GrantError};
use crate::logging::AppLogger;
use crate::models::{OAuth2Client, ScopeSet};
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

/// OAuth 2.0 Authorization Server
pub struct OAuth2AuthorizationServer {
    clients: ClientRegistry,
    codes: AuthorizationCodeEngine,
    tokens: TokenEngine,
    database: Arc<Database>,
    clock: Arc<dyn Clock>,
    storage_timeout: std::time::Duration,
    revoke_on_code_reuse: bool,
}

impl OAuth2AuthorizationServer {
    /// Wire the registry and engines over shared capabilities
    #[must_use]
    pub fn new(
        database: Arc<Database>,
        clock: Arc<dyn Clock>,
        random: Arc<dyn RandomSource>,
        credentials: Arc<dyn CredentialStore>,
        config: &OAuth2ServerConfig,
    ) -> Self {
        Self {
            clients: ClientRegistry::new(
                database.clone(),
                credentials,
                random.clone(),
                clock.clone(),
            ),
            codes: AuthorizationCodeEngine::new(
                database.clone(),
                clock.clone(),
                random.clone(),
                config,
            ),
            tokens: TokenEngine::new(database.clone(), clock.clone(), random, config),
            database,
            clock,
            storage_timeout: config.storage_timeout(),
            revoke_on_code_reuse: config.revoke_on_code_reuse,
        }
    }

    /// Client registry
    #[must_use]
    pub const fn clients(&self) -> &ClientRegistry {
        &self.clients
    }

    /// Authorization code engine
    #[must_use]
    pub const fn codes(&self) -> &AuthorizationCodeEngine {
        &self.codes
    }

    /// Token engine
    #[must_use]
    pub const fn tokens(&self) -> &TokenEngine {
        &self.tokens
    }

    /// Handle an authorization request for an authenticated user
    ///
    /// Consent is implied; the caller has already authenticated `user_id`.
    ///
    /// # Errors
    /// Returns an RFC 6749 error for unsupported response types, unknown clients,
    /// unregistered redirect URIs, disallowed scopes, or storage failures
    pub async fn authorize(
        &self,
        request: AuthorizeRequest,
        user_id: Uuid,
    ) -> Result<AuthorizeResponse, OAuth2Error> {
        if request.response_type != "code" {
            return Err(OAuth2Error::unsupported_response_type());
        }

        let requested = ScopeSet::parse_optional(request.scope.as_deref());
        let code = self
            .codes
            .issue(
                user_id,
                &request.client_id,
                request.redirect_uri.as_deref(),
                &requested,
            )
            .await
            .map_err(|e| match e {
                GrantError::ClientMismatch => {
                    OAuth2Error::invalid_request("redirect_uri does not match the registered URI")
                }
                other => log_grant_failure("authorize", &request.client_id, other),
            })?;

        Ok(AuthorizeResponse {
            code: code.code,
            state: request.state,
            redirect_uri: code.redirect_uri,
        })
    }

    /// Handle a token request (`authorization_code` or `refresh_token` grant)
    ///
    /// # Errors
    /// Returns an RFC 6749 error describing why no tokens were issued
    pub async fn token(&self, request: TokenRequest) -> Result<TokenResponse, OAuth2Error> {
        match request.grant_type.as_str() {
            grant_types::AUTHORIZATION_CODE => {
                let client = self
                    .authenticate_client(&request.client_id, request.client_secret.as_deref())
                    .await?;
                self.handle_authorization_code_grant(&request, &client)
                    .await
            }
            grant_types::REFRESH_TOKEN => {
                let client = self
                    .authenticate_client(&request.client_id, request.client_secret.as_deref())
                    .await?;
                self.handle_refresh_token_grant(&request, &client).await
            }
            other => {
                warn!(grant_type = %other, "Unsupported grant type requested");
                Err(OAuth2Error::unsupported_grant_type())
            }
        }
    }

    async fn handle_authorization_code_grant(
        &self,
        request: &TokenRequest,
        client: &OAuth2Client,
    ) -> Result<TokenResponse, OAuth2Error> {
        let code = request
            .code
            .as_deref()
            .ok_or_else(|| OAuth2Error::invalid_request("Missing authorization code"))?;
        let redirect_uri = request
            .redirect_uri
            .as_deref()
            .unwrap_or(&client.redirect_uri);

        let grant = match self
            .codes
            .redeem(code, &client.client_id, redirect_uri)
            .await
        {
            Ok(grant) => grant,
            Err(GrantError::CodeAlreadyUsed) => {
                AppLogger::log_security_event(
                    "code_reuse",
                    "high",
                    "authorization code presented after redemption",
                    &client.client_id,
                );
                if self.revoke_on_code_reuse {
                    self.revoke_reused_code_lineage(code).await;
                }
                return Err(GrantError::CodeAlreadyUsed.into());
            }
            Err(e) => return Err(log_grant_failure("token", &client.client_id, e)),
        };

        let pair = self
            .tokens
            .issue_from_code(&grant)
            .await
            .map_err(|e| log_grant_failure("token", &client.client_id, e))?;

        Ok(token_response(pair))
    }

    async fn handle_refresh_token_grant(
        &self,
        request: &TokenRequest,
        client: &OAuth2Client,
    ) -> Result<TokenResponse, OAuth2Error> {
        let refresh_token = request
            .refresh_token
            .as_deref()
            .ok_or_else(|| OAuth2Error::invalid_request("Missing refresh_token"))?;
        let requested = request.scope.as_deref().map(ScopeSet::parse);

        let pair = self
            .tokens
            .refresh(refresh_token, &client.client_id, requested.as_ref())
            .await
            .map_err(|e| log_grant_failure("refresh", &client.client_id, e))?;

        Ok(token_response(pair))
    }

    async fn revoke_reused_code_lineage(&self, code: &str) {
        match self.tokens.revoke_lineage(code).await {
            Ok(revoked) => {
                info!(revoked, "Revoked token lineage of a reused authorization code");
            }
            Err(e) => {
                error!(error = %e, "Failed to revoke token lineage of a reused authorization code");
            }
        }
    }

    /// Handle a revocation request (RFC 7009)
    ///
    /// Unknown tokens and tokens issued to other clients are accepted without
    /// effect. Returns whether a record was revoked by this call.
    ///
    /// # Errors
    /// Returns `invalid_client` if client authentication fails, or an unavailability error
    pub async fn revoke(&self, request: RevokeRequest) -> Result<bool, OAuth2Error> {
        let client = self
            .authenticate_client(&request.client_id, request.client_secret.as_deref())
            .await?;

        let found = self
            .tokens
            .find(&request.token)
            .await
            .map_err(|e| log_grant_failure("revoke", &client.client_id, e))?;

        match found {
            Some((record, _)) if record.client_id == client.client_id => self
                .tokens
                .revoke(&request.token)
                .await
                .map_err(|e| log_grant_failure("revoke", &client.client_id, e)),
            Some(_) => {
                warn!(
                    client_id = %client.client_id,
                    "Client attempted to revoke a token issued to another client"
                );
                Ok(false)
            }
            None => Ok(false),
        }
    }

    /// Handle an introspection request (RFC 7662)
    ///
    /// Clients can only see their own tokens; anything else reports inactive.
    ///
    /// # Errors
    /// Returns `invalid_client` if client authentication fails, or an unavailability error
    pub async fn introspect(
        &self,
        request: IntrospectRequest,
    ) -> Result<IntrospectResponse, OAuth2Error> {
        let client = self
            .authenticate_client(&request.client_id, request.client_secret.as_deref())
            .await?;

        let Some((record, kind)) = self
            .tokens
            .find(&request.token)
            .await
            .map_err(|e| log_grant_failure("introspect", &client.client_id, e))?
        else {
            return Ok(IntrospectResponse::inactive());
        };

        if record.client_id != client.client_id {
            return Ok(IntrospectResponse::inactive());
        }

        let now = self.clock.now();
        let expires_at = match kind {
            TokenKind::Access => record.expires_at,
            TokenKind::Refresh => record.refresh_expires_at,
        };
        if record.revoked || now >= expires_at {
            return Ok(IntrospectResponse::inactive());
        }

        let username = bounded(self.storage_timeout, self.database.get_user(record.user_id))
            .await
            .map_err(|e| log_grant_failure("introspect", &client.client_id, e.into()))?
            .map(|user| user.username);

        Ok(IntrospectResponse {
            active: true,
            scope: Some(record.scopes.to_string()),
            client_id: Some(record.client_id),
            username,
            token_type: Some(kind.as_hint().to_owned()),
            exp: Some(expires_at.timestamp()),
            iat: Some(record.issued_at.timestamp()),
            sub: Some(record.user_id.to_string()),
        })
    }

    async fn authenticate_client(
        &self,
        client_id: &str,
        client_secret: Option<&str>,
    ) -> Result<OAuth2Client, OAuth2Error> {
        self.clients
            .authenticate(client_id, client_secret)
            .await
            .map_err(|e| client_auth_error(&e))
    }
}

fn token_response(pair: TokenPair) -> TokenResponse {
    TokenResponse {
        access_token: pair.access_token,
        token_type: pair.token_type.to_owned(),
        expires_in: pair.expires_in,
        scope: pair.scopes.to_string(),
        refresh_token: pair.refresh_token,
    }
}

fn client_auth_error(error: &AppError) -> OAuth2Error {
    match error.code {
        ErrorCode::ResourceUnavailable => OAuth2Error::temporarily_unavailable(),
        ErrorCode::DatabaseError | ErrorCode::InternalError => {
            error!(error = %error, "Client authentication failed on storage");
            OAuth2Error::server_error()
        }
        _ => OAuth2Error::invalid_client(),
    }
}

fn log_grant_failure(operation: &str, client_id: &str, error: GrantError) -> OAuth2Error {
    match &error {
        GrantError::StorageConflict(detail) | GrantError::StorageUnavailable(detail) => {
            error!(operation, client_id = %client_id, detail = %detail, "Grant storage failure");
        }
        _ => {
            info!(operation, client_id = %client_id, kind = error.kind(), "Grant request rejected");
        }
    }
    error.into()
}
