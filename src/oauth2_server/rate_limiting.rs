// ABOUTME: OAuth2 endpoint rate limiting with RFC-compliant headers and rejection handling
// ABOUTME: Implements per-IP fixed-window rate limiting for the authorize, token, and revoke endpoints
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use crate::config::RateLimitConfig;
use dashmap::DashMap;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Outcome of a rate limit check, carried into response headers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitStatus {
    /// Whether the request must be rejected
    pub is_limited: bool,
    /// Requests allowed per window
    pub limit: u32,
    /// Requests left in the current window
    pub remaining: u32,
    /// Window reset as a Unix timestamp
    pub reset_at: i64,
    /// Seconds to wait before retrying, when limited
    pub retry_after_seconds: Option<u64>,
}

/// `OAuth2` rate limiter with per-IP tracking using sharded concurrent `HashMap`
#[derive(Clone)]
pub struct OAuth2RateLimiter {
    /// Per-IP request tracking: IP -> (`request_count`, `window_start`)
    state: Arc<DashMap<IpAddr, (u32, Instant)>>,
    config: RateLimitConfig,
}

impl OAuth2RateLimiter {
    /// Create new `OAuth2` rate limiter with default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::from_rate_limit_config(RateLimitConfig::default())
    }

    /// Create `OAuth2` rate limiter from `RateLimitConfig`
    #[must_use]
    pub fn from_rate_limit_config(config: RateLimitConfig) -> Self {
        Self {
            state: Arc::new(DashMap::new()),
            config,
        }
    }

    /// Check and count a request from `client_ip`
    /// Uses `DashMap` entry API for atomic read-modify-write operations
    #[must_use]
    pub fn check_rate_limit(&self, client_ip: IpAddr) -> RateLimitStatus {
        let limit = self.config.requests_per_window;
        let now = Instant::now();
        let window = Duration::from_secs(self.config.rate_limit_window_secs);

        let mut entry = self.state.entry(client_ip).or_insert((0, now));
        let (count, window_start) = entry.value_mut();

        if now.duration_since(*window_start) >= window {
            *count = 0;
            *window_start = now;
        }

        let is_limited = *count >= limit;
        if !is_limited {
            *count += 1;
        }
        let remaining = limit.saturating_sub(*count);

        let result_window_start = *window_start;
        drop(entry);

        // Lazy cleanup keeps the sweep off the common path
        if self.state.len() > self.config.cleanup_threshold {
            self.cleanup_old_entries(now, window);
        }

        let until_reset = window.saturating_sub(now.duration_since(result_window_start));
        let reset_at = SystemTime::now()
            .checked_add(until_reset)
            .and_then(|reset| reset.duration_since(UNIX_EPOCH).ok())
            .map_or(0, |d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX));

        RateLimitStatus {
            is_limited,
            limit,
            remaining,
            reset_at,
            retry_after_seconds: is_limited.then(|| until_reset.as_secs().max(1)),
        }
    }

    /// Remove entries whose window ended
    fn cleanup_old_entries(&self, now: Instant, window: Duration) {
        self.state
            .retain(|_ip, (_count, start)| now.duration_since(*start) < window);
    }
}

impl Default for OAuth2RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}
