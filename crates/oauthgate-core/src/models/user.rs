// ABOUTME: Resource owner account model
// ABOUTME: Holds the unique username, optional unique email, and password hash
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Resource owner who grants clients access
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Unique user identifier
    pub id: Uuid,
    /// Unique login name
    pub username: String,
    /// Hashed password (never the plaintext)
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Optional unique email address
    pub email: Option<String>,
    /// When this user was created
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Build a new user with a fresh identifier
    #[must_use]
    pub fn new(
        username: String,
        password_hash: String,
        email: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            username,
            password_hash,
            email,
            created_at,
        }
    }
}
