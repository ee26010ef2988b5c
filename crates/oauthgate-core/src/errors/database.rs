// ABOUTME: Structured error types for storage backend operations
// ABOUTME: Distinguishes unique-key conflicts from unavailability for retry decisions
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// Errors reported by `DatabaseProvider` implementations
#[derive(Debug, Clone, thiserror::Error)]
pub enum DatabaseError {
    /// Insert collided with an existing unique key
    #[error("Unique constraint violated: {constraint}")]
    UniqueViolation {
        /// Constraint or column that conflicted
        constraint: String,
    },

    /// Referenced record does not exist
    #[error("{entity} not found")]
    NotFound {
        /// Entity kind
        entity: &'static str,
    },

    /// Query failed
    #[error("Database query failed: {context}")]
    QueryError {
        /// Backend error description
        context: String,
    },

    /// Backend could not be reached
    #[error("Database connection failed: {context}")]
    ConnectionError {
        /// Backend error description
        context: String,
    },

    /// Call exceeded the caller-supplied timeout
    #[error("Database call timed out after {millis}ms")]
    Timeout {
        /// Timeout that elapsed
        millis: u64,
    },
}

impl DatabaseError {
    /// Whether the failure is a unique-key conflict that a retry with a new value can resolve
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::UniqueViolation { .. })
    }
}

#[cfg(feature = "database-errors")]
impl From<sqlx::Error> for DatabaseError {
    fn from(error: sqlx::Error) -> Self {
        match &error {
            sqlx::Error::Database(db_error) if db_error.is_unique_violation() => {
                Self::UniqueViolation {
                    constraint: db_error
                        .constraint()
                        .map_or_else(|| db_error.message().to_owned(), str::to_owned),
                }
            }
            sqlx::Error::RowNotFound => Self::NotFound { entity: "row" },
            sqlx::Error::PoolTimedOut => Self::Timeout { millis: 0 },
            sqlx::Error::PoolClosed | sqlx::Error::Io(_) | sqlx::Error::Tls(_) => {
                Self::ConnectionError {
                    context: error.to_string(),
                }
            }
            _ => Self::QueryError {
                context: error.to_string(),
            },
        }
    }
}
