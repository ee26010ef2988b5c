// ABOUTME: User account registration and password authentication
// ABOUTME: Hashes passwords through the CredentialStore and reports failures uniformly
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use crate::clock::Clock;
use crate::crypto::{hash_secret_blocking, verify_blocking, CredentialStore};
use crate::database_plugins::{factory::Database, DatabaseProvider};
use crate::errors::{AppError, AppResult, DatabaseError};
use crate::models::User;
use std::sync::Arc;
use tracing::{info, warn};

/// Minimum accepted password length
const MIN_PASSWORD_LENGTH: usize = 8;

/// Registers and authenticates users
pub struct AccountService {
    database: Arc<Database>,
    credentials: Arc<dyn CredentialStore>,
    clock: Arc<dyn Clock>,
}

impl AccountService {
    /// Create a new account service
    #[must_use]
    pub fn new(
        database: Arc<Database>,
        credentials: Arc<dyn CredentialStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            database,
            credentials,
            clock,
        }
    }

    /// Create a user with a hashed password
    ///
    /// # Errors
    /// Returns `InvalidInput` for an empty username or short password,
    /// `ResourceAlreadyExists` if the username or email is taken, or a storage error
    pub async fn register_user(
        &self,
        username: &str,
        password: &str,
        email: Option<&str>,
    ) -> AppResult<User> {
        let username = username.trim();
        if username.is_empty() {
            return Err(AppError::invalid_input("Username must not be empty"));
        }
        if password.len() < MIN_PASSWORD_LENGTH {
            return Err(AppError::invalid_input(format!(
                "Password must be at least {MIN_PASSWORD_LENGTH} characters"
            )));
        }

        let password_hash = hash_secret_blocking(&self.credentials, password).await?;
        let user = User::new(
            username.to_owned(),
            password_hash,
            email.map(str::to_owned),
            self.clock.now(),
        );

        match self.database.create_user(&user).await {
            Ok(()) => {
                info!(user_id = %user.id, username = %user.username, "Registered user");
                Ok(user)
            }
            Err(DatabaseError::UniqueViolation { .. }) => {
                Err(AppError::already_exists(format!("User '{username}'")))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Verify a username and password
    ///
    /// Unknown users and wrong passwords produce the same error.
    ///
    /// # Errors
    /// Returns `AuthInvalid` on bad credentials, or a storage error
    pub async fn authenticate(&self, username: &str, password: &str) -> AppResult<User> {
        let user = self.database.get_user_by_username(username.trim()).await?;

        if let Some(user) = user {
            if verify_blocking(&self.credentials, password, &user.password_hash).await? {
                return Ok(user);
            }
        }
        warn!("Failed login attempt for username {}", username);
        Err(AppError::auth_invalid("Invalid username or password"))
    }
}
