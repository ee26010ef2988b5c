// ABOUTME: OAuth 2.0 client registry with credential issuance and authentication
// ABOUTME: Validates redirect URIs, hashes client secrets, and manages the scope catalog
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::models::{ClientRegistrationRequest, ClientRegistrationResponse};
use crate::clock::Clock;
use crate::constants::oauth2::RANDOM_TOKEN_BYTES;
use crate::crypto::{hash_secret_blocking, verify_blocking, CredentialStore, RandomSource};
use crate::database_plugins::{factory::Database, DatabaseProvider};
use crate::errors::{AppError, AppResult};
use crate::models::{OAuth2Client, OAuth2ClientType, ScopeDescription, ScopeSet};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// OAuth 2.0 client registry
pub struct ClientRegistry {
    database: Arc<Database>,
    credentials: Arc<dyn CredentialStore>,
    random: Arc<dyn RandomSource>,
    clock: Arc<dyn Clock>,
}

impl ClientRegistry {
    /// Creates a new client registry
    #[must_use]
    pub fn new(
        database: Arc<Database>,
        credentials: Arc<dyn CredentialStore>,
        random: Arc<dyn RandomSource>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            database,
            credentials,
            random,
            clock,
        }
    }

    /// Register a new client, returning it with its plaintext secret
    ///
    /// Confidential clients receive a secret that is shown only here; public
    /// clients receive none.
    ///
    /// # Errors
    /// Returns an error if the redirect URI is invalid, hashing fails, or storage fails
    pub async fn register(
        &self,
        request: ClientRegistrationRequest,
    ) -> AppResult<(OAuth2Client, Option<String>)> {
        if !is_valid_redirect_uri(&request.redirect_uri) {
            return Err(AppError::invalid_input(format!(
                "Invalid redirect_uri: {}",
                request.redirect_uri
            )));
        }

        let (client_secret, client_secret_hash) = match request.client_type {
            OAuth2ClientType::Confidential => {
                let secret = self.random.random_token(RANDOM_TOKEN_BYTES)?;
                let hash = hash_secret_blocking(&self.credentials, &secret).await?;
                (Some(secret), Some(hash))
            }
            OAuth2ClientType::Public => (None, None),
        };

        let client = OAuth2Client {
            id: Uuid::new_v4(),
            client_id: generate_client_id(),
            client_secret_hash,
            redirect_uri: request.redirect_uri,
            allowed_scopes: ScopeSet::parse_optional(request.scope.as_deref()),
            client_name: request.client_name,
            client_type: request.client_type,
            created_at: self.clock.now(),
        };

        self.database.create_client(&client).await.map_err(|e| {
            tracing::error!(error = %e, client_id = %client.client_id, "Failed to store OAuth2 client");
            AppError::from(e)
        })?;

        info!(
            client_id = %client.client_id,
            client_type = %client.client_type,
            scopes = %client.allowed_scopes,
            "Registered OAuth2 client"
        );
        Ok((client, client_secret))
    }

    /// Authenticate a client for the token, revocation, and introspection endpoints
    ///
    /// Every failure produces the same error so callers cannot probe which
    /// client IDs exist.
    ///
    /// # Errors
    /// Returns `AuthInvalid` for unknown clients or bad secrets, or a storage error
    pub async fn authenticate(
        &self,
        client_id: &str,
        client_secret: Option<&str>,
    ) -> AppResult<OAuth2Client> {
        debug!("Authenticating OAuth client: {}", client_id);

        let Some(client) = self.database.get_client(client_id).await? else {
            warn!("OAuth client {} not found", client_id);
            return Err(AppError::auth_invalid("Client authentication failed"));
        };

        match (client.client_type, client.client_secret_hash.as_deref()) {
            (OAuth2ClientType::Public, _) => Ok(client),
            (OAuth2ClientType::Confidential, Some(hash)) => {
                let presented = client_secret.unwrap_or_default();
                if !presented.is_empty()
                    && verify_blocking(&self.credentials, presented, hash).await?
                {
                    Ok(client)
                } else {
                    warn!("OAuth client {} secret validation failed", client_id);
                    Err(AppError::auth_invalid("Client authentication failed"))
                }
            }
            (OAuth2ClientType::Confidential, None) => {
                tracing::error!("Confidential OAuth client {} has no stored secret", client_id);
                Err(AppError::auth_invalid("Client authentication failed"))
            }
        }
    }

    /// Get client by `client_id`
    ///
    /// # Errors
    /// Returns `ResourceNotFound` if the client does not exist
    pub async fn get_client(&self, client_id: &str) -> AppResult<OAuth2Client> {
        self.database
            .get_client(client_id)
            .await?
            .ok_or_else(|| AppError::not_found("OAuth2 client"))
    }

    /// Add a scope to the catalog
    ///
    /// # Errors
    /// Returns an error if the name is not a single scope token or already exists
    pub async fn register_scope(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> AppResult<ScopeDescription> {
        let name = name.trim();
        if name.is_empty() || name.contains(|c: char| c.is_whitespace() || c == ',' || c == '"') {
            return Err(AppError::invalid_input(format!(
                "Invalid scope name '{name}'"
            )));
        }

        let scope = ScopeDescription {
            name: name.to_owned(),
            description: description.map(str::to_owned),
        };
        self.database.create_scope(&scope).await?;
        info!(scope = %scope.name, "Registered scope");
        Ok(scope)
    }

    /// All catalog scopes ordered by name
    ///
    /// # Errors
    /// Returns an error on storage failure
    pub async fn list_scopes(&self) -> AppResult<Vec<ScopeDescription>> {
        Ok(self.database.list_scopes().await?)
    }
}

impl ClientRegistrationResponse {
    /// Build the registration response for a newly registered client
    #[must_use]
    pub fn new(client: &OAuth2Client, client_secret: Option<String>) -> Self {
        Self {
            client_id: client.client_id.clone(),
            client_secret,
            client_id_issued_at: client.created_at.timestamp(),
            redirect_uri: client.redirect_uri.clone(),
            scope: client.allowed_scopes.to_string(),
            client_type: client.client_type,
        }
    }
}

fn generate_client_id() -> String {
    format!("client_{}", Uuid::new_v4().simple())
}

/// Check if redirect URI is acceptable for registration
///
/// Absolute, no fragment, no wildcard, HTTPS unless the host is loopback.
#[must_use]
pub fn is_valid_redirect_uri(uri: &str) -> bool {
    if uri.trim().is_empty() {
        return false;
    }

    if uri.contains('#') {
        warn!("Rejected redirect_uri with fragment: {}", uri);
        return false;
    }

    if uri.contains('*') {
        warn!("Rejected redirect_uri with wildcard: {}", uri);
        return false;
    }

    let Ok(parsed_uri) = url::Url::parse(uri) else {
        warn!("Rejected malformed redirect_uri: {}", uri);
        return false;
    };

    let is_loopback = matches!(parsed_uri.host_str(), Some("localhost" | "127.0.0.1" | "[::1]"));

    match parsed_uri.scheme() {
        "https" => parsed_uri.host_str().is_some(),
        "http" if is_loopback => true,
        _ => {
            warn!(
                "Rejected redirect_uri with non-HTTPS scheme for non-localhost: {}",
                uri
            );
            false
        }
    }
}
