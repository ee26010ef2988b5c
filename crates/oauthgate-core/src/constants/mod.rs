// ABOUTME: Constants module with domain-separated organization
// ABOUTME: Default lifetimes, retry limits, and environment variable names
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Constants module
//!
//! Defaults here are the values used when the corresponding environment
//! variable is unset.

/// OAuth 2.0 grant lifetimes and generation limits
pub mod oauth2 {
    /// Authorization code lifetime (10 minutes)
    pub const DEFAULT_CODE_TTL_SECS: i64 = 600;
    /// Access token lifetime (1 hour)
    pub const DEFAULT_ACCESS_TOKEN_TTL_SECS: i64 = 3600;
    /// Refresh token lifetime (30 days)
    pub const DEFAULT_REFRESH_TOKEN_TTL_SECS: i64 = 30 * 24 * 3600;
    /// Attempts at generating a unique random value before giving up
    pub const DEFAULT_MAX_GENERATION_ATTEMPTS: u32 = 3;
    /// Per-call storage timeout in milliseconds
    pub const DEFAULT_STORAGE_TIMEOUT_MS: u64 = 5000;
    /// How long expired codes are retained for replay detection
    pub const DEFAULT_CODE_GC_GRACE_SECS: i64 = 24 * 3600;
    /// Interval between expired code sweeps
    pub const DEFAULT_CODE_GC_INTERVAL_SECS: u64 = 900;
    /// Upper bound for every configured lifetime and grace period (10 years)
    pub const MAX_LIFETIME_SECS: i64 = 10 * 365 * 24 * 3600;
    /// Random bytes behind each code and token (256 bits)
    pub const RANDOM_TOKEN_BYTES: usize = 32;
    /// Token type reported to clients
    pub const TOKEN_TYPE_BEARER: &str = "Bearer";
}

/// Grant type identifiers (RFC 6749)
pub mod grant_types {
    /// Authorization code grant
    pub const AUTHORIZATION_CODE: &str = "authorization_code";
    /// Refresh token grant
    pub const REFRESH_TOKEN: &str = "refresh_token";
}

/// Network defaults
pub mod ports {
    /// Default HTTP port
    pub const DEFAULT_HTTP_PORT: u16 = 8080;
}

/// Service identifiers used in structured logs
pub mod service_names {
    /// Server binary service name
    pub const OAUTHGATE_SERVER: &str = "oauthgate-server";
}

/// Environment variable names
pub mod env_config {
    /// HTTP listen port
    pub const HTTP_PORT: &str = "HTTP_PORT";
    /// Database connection string
    pub const DATABASE_URL: &str = "DATABASE_URL";
    /// Log level
    pub const LOG_LEVEL: &str = "LOG_LEVEL";
    /// Deployment environment
    pub const ENVIRONMENT: &str = "ENVIRONMENT";
    /// Authorization code lifetime
    pub const CODE_TTL_SECS: &str = "OAUTH_CODE_TTL_SECS";
    /// Access token lifetime
    pub const ACCESS_TOKEN_TTL_SECS: &str = "OAUTH_ACCESS_TOKEN_TTL_SECS";
    /// Refresh token lifetime
    pub const REFRESH_TOKEN_TTL_SECS: &str = "OAUTH_REFRESH_TOKEN_TTL_SECS";
    /// Empty scope request policy (`grant_all` or `reject`)
    pub const EMPTY_SCOPE_POLICY: &str = "OAUTH_EMPTY_SCOPE_POLICY";
    /// Unique value generation attempts
    pub const MAX_GENERATION_ATTEMPTS: &str = "OAUTH_MAX_GENERATION_ATTEMPTS";
    /// Storage call timeout
    pub const STORAGE_TIMEOUT_MS: &str = "OAUTH_STORAGE_TIMEOUT_MS";
    /// Whether a reused code revokes its token lineage
    pub const REVOKE_ON_CODE_REUSE: &str = "OAUTH_REVOKE_ON_CODE_REUSE";
    /// Expired code retention window
    pub const CODE_GC_GRACE_SECS: &str = "OAUTH_CODE_GC_GRACE_SECS";
    /// Expired code sweep interval
    pub const CODE_GC_INTERVAL_SECS: &str = "OAUTH_CODE_GC_INTERVAL_SECS";
    /// Requests per window on rate limited endpoints
    pub const RATE_LIMIT_REQUESTS: &str = "RATE_LIMIT_REQUESTS";
    /// Rate limit window length
    pub const RATE_LIMIT_WINDOW_SECS: &str = "RATE_LIMIT_WINDOW_SECS";
}

/// Rate limiting defaults
pub mod limits {
    /// Requests allowed per IP per window
    pub const DEFAULT_RATE_LIMIT_REQUESTS: u32 = 60;
    /// Window length in seconds
    pub const DEFAULT_RATE_LIMIT_WINDOW_SECS: u64 = 60;
    /// Tracked IPs before a stale entry sweep runs
    pub const RATE_LIMIT_CLEANUP_THRESHOLD: usize = 10_000;
}
