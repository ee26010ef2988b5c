// ABOUTME: Opaque hashing and verification of user passwords and client secrets
// ABOUTME: Argon2id with a random salt per secret, stored in PHC string format
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use crate::errors::{AppError, AppResult};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use std::sync::Arc;

/// Hashes and verifies secrets without exposing the algorithm to callers
pub trait CredentialStore: Send + Sync {
    /// Hash a plaintext secret for storage
    ///
    /// # Errors
    /// Returns an error if hashing fails
    fn hash_secret(&self, plain: &str) -> AppResult<String>;

    /// Whether `plain` matches a hash produced by [`CredentialStore::hash_secret`]
    fn verify(&self, plain: &str, hash: &str) -> bool;
}

/// Argon2id credential store
#[derive(Default, Clone)]
pub struct Argon2CredentialStore {
    argon2: Argon2<'static>,
}

impl Argon2CredentialStore {
    /// Create a store with default Argon2id parameters
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store with explicit Argon2id cost parameters
    ///
    /// # Errors
    /// Returns an error if the parameters are outside Argon2's accepted ranges
    pub fn with_params(memory_kib: u32, iterations: u32) -> AppResult<Self> {
        let params = Params::new(memory_kib, iterations, 1, None)
            .map_err(|e| AppError::config(format!("Invalid Argon2 parameters: {e}")))?;
        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }
}

impl CredentialStore for Argon2CredentialStore {
    fn hash_secret(&self, plain: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);

        let hash = self
            .argon2
            .hash_password(plain.as_bytes(), &salt)
            .map_err(|e| AppError::internal(format!("Argon2 password hashing failed: {e}")))?;

        Ok(hash.to_string())
    }

    fn verify(&self, plain: &str, hash: &str) -> bool {
        let parsed_hash = match PasswordHash::new(hash) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::error!("Failed to parse stored password hash: {}", e);
                return false;
            }
        };

        self.argon2
            .verify_password(plain.as_bytes(), &parsed_hash)
            .is_ok()
    }
}

/// Hash `plain` on the blocking pool so Argon2 never stalls the async executor
///
/// # Errors
/// Returns an error if hashing fails or the blocking task panics
pub async fn hash_secret_blocking(
    store: &Arc<dyn CredentialStore>,
    plain: &str,
) -> AppResult<String> {
    let store = Arc::clone(store);
    let plain = plain.to_owned();
    tokio::task::spawn_blocking(move || store.hash_secret(&plain))
        .await
        .map_err(|e| AppError::internal(format!("Secret hashing task failed: {e}")))?
}

/// Verify `plain` against `hash` on the blocking pool
///
/// # Errors
/// Returns an error if the blocking task panics
pub async fn verify_blocking(
    store: &Arc<dyn CredentialStore>,
    plain: &str,
    hash: &str,
) -> AppResult<bool> {
    let store = Arc::clone(store);
    let plain = plain.to_owned();
    let hash = hash.to_owned();
    tokio::task::spawn_blocking(move || store.verify(&plain, &hash))
        .await
        .map_err(|e| AppError::internal(format!("Secret verification task failed: {e}")))
}
