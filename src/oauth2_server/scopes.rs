// ABOUTME: Scope validation for authorization and refresh requests
// ABOUTME: Enforces requested scopes as a subset of what the client or grant allows
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use crate::errors::{AppError, GrantError, GrantResult};
use crate::models::ScopeSet;
use std::fmt;
use std::str::FromStr;

/// How an empty scope request is resolved
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EmptyScopePolicy {
    /// Grant everything the client is allowed
    #[default]
    GrantAll,
    /// Fail with `InvalidScope`
    Reject,
}

impl EmptyScopePolicy {
    /// Configuration value for this policy
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::GrantAll => "grant_all",
            Self::Reject => "reject",
        }
    }
}

impl fmt::Display for EmptyScopePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmptyScopePolicy {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "grant_all" | "all" => Ok(Self::GrantAll),
            "reject" => Ok(Self::Reject),
            other => Err(AppError::config(format!(
                "Invalid empty scope policy '{other}', expected grant_all or reject"
            ))),
        }
    }
}

/// Checks requested scopes against an allowed set
#[derive(Debug, Clone, Copy, Default)]
pub struct ScopeValidator {
    empty_policy: EmptyScopePolicy,
}

impl ScopeValidator {
    /// Create a validator with the given empty-request policy
    #[must_use]
    pub const fn new(empty_policy: EmptyScopePolicy) -> Self {
        Self { empty_policy }
    }

    /// Resolve `requested` against `allowed`, returning the scopes to grant
    ///
    /// # Errors
    /// Returns `InvalidScope` naming the offending scopes if `requested` is not a subset
    /// of `allowed`, or if it is empty under [`EmptyScopePolicy::Reject`]
    pub fn check(&self, requested: &ScopeSet, allowed: &ScopeSet) -> GrantResult<ScopeSet> {
        if requested.is_empty() {
            return match self.empty_policy {
                EmptyScopePolicy::GrantAll => Ok(allowed.clone()),
                EmptyScopePolicy::Reject => {
                    Err(GrantError::InvalidScope("no scope requested".to_owned()))
                }
            };
        }

        if requested.is_subset(allowed) {
            Ok(requested.clone())
        } else {
            Err(GrantError::InvalidScope(
                requested.difference(allowed).to_string(),
            ))
        }
    }

    /// Policy applied to empty requests
    #[must_use]
    pub const fn empty_policy(&self) -> EmptyScopePolicy {
        self.empty_policy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subset_is_granted_as_requested() {
        let validator = ScopeValidator::default();
        let granted = validator
            .check(&ScopeSet::parse("read"), &ScopeSet::parse("read write"))
            .unwrap();
        assert_eq!(granted, ScopeSet::parse("read"));
    }

    #[test]
    fn test_widening_names_offending_scopes() {
        let validator = ScopeValidator::default();
        let err = validator
            .check(
                &ScopeSet::parse("read admin delete"),
                &ScopeSet::parse("read write"),
            )
            .unwrap_err();
        assert_eq!(err, GrantError::InvalidScope("admin delete".to_owned()));
    }

    #[test]
    fn test_empty_request_policies() {
        let allowed = ScopeSet::parse("read write");

        let grant_all = ScopeValidator::new(EmptyScopePolicy::GrantAll);
        assert_eq!(grant_all.check(&ScopeSet::new(), &allowed).unwrap(), allowed);

        let reject = ScopeValidator::new(EmptyScopePolicy::Reject);
        assert!(matches!(
            reject.check(&ScopeSet::new(), &allowed),
            Err(GrantError::InvalidScope(_))
        ));
    }

    #[test]
    fn test_policy_parsing() {
        assert_eq!(
            "reject".parse::<EmptyScopePolicy>().unwrap(),
            EmptyScopePolicy::Reject
        );
        assert_eq!(
            "GRANT_ALL".parse::<EmptyScopePolicy>().unwrap(),
            EmptyScopePolicy::GrantAll
        );
        assert!("sometimes".parse::<EmptyScopePolicy>().is_err());
    }
}
