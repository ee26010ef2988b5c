// ABOUTME: Cryptographically secure random string generation for codes and tokens
// ABOUTME: Wraps ring's SystemRandom behind a trait so engines stay deterministic in tests
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use crate::errors::{AppError, AppResult};
use base64::{engine::general_purpose, Engine as _};
use ring::rand::{SecureRandom, SystemRandom};

/// Source of opaque random strings
pub trait RandomSource: Send + Sync {
    /// Generate a URL-safe string carrying `bytes` bytes of randomness
    ///
    /// # Errors
    /// Returns an error if the underlying RNG fails
    fn random_token(&self, bytes: usize) -> AppResult<String>;
}

/// Operating system RNG
#[derive(Clone)]
pub struct SystemRandomSource {
    rng: SystemRandom,
}

impl SystemRandomSource {
    /// Create a new system-backed random source
    #[must_use]
    pub fn new() -> Self {
        Self {
            rng: SystemRandom::new(),
        }
    }
}

impl Default for SystemRandomSource {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomSource for SystemRandomSource {
    fn random_token(&self, bytes: usize) -> AppResult<String> {
        let mut buf = vec![0u8; bytes];

        self.rng.fill(&mut buf).map_err(|e| {
            tracing::error!(
                "CRITICAL: SystemRandom failed - cannot generate secure random bytes: {}",
                e
            );
            AppError::internal("System RNG failure - server cannot operate securely")
        })?;

        Ok(general_purpose::URL_SAFE_NO_PAD.encode(&buf))
    }
}
