// ABOUTME: Cryptography module providing secure randomness and secret hashing
// ABOUTME: Centralizes the opaque capabilities the grant engines depend on
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Cryptographic utilities for oauthgate

/// Password and client secret hashing
pub mod credentials;
/// Random opaque value generation
pub mod random;

pub use credentials::{
    hash_secret_blocking, verify_blocking, Argon2CredentialStore, CredentialStore,
};
pub use random::{RandomSource, SystemRandomSource};
