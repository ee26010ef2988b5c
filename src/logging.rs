// ABOUTME: Logging configuration and structured logging setup for the authorization server
// ABOUTME: Builds the tracing subscriber from environment settings with json, pretty, or compact output
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Structured logging configuration
//!
//! `RUST_LOG`, when set, replaces the level-derived filter entirely. Token and
//! secret values never reach the log; events carry client and user identifiers.

use crate::config::{Environment, LogLevel, ServerConfig};
use crate::constants::{env_config, service_names};
use anyhow::Result;
use std::env;
use std::io;
use tracing::{info, warn};
use tracing_subscriber::{
    filter::Directive,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Dependencies whose logs are capped regardless of the configured level
const QUIET_TARGETS: [&str; 3] = ["hyper=warn", "sqlx=warn", "tower_http=info"];

/// Log output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One JSON object per event, for log shippers
    Json,
    /// Human-readable multi-field output
    #[default]
    Pretty,
    /// Single-line output without targets
    Compact,
}

impl LogFormat {
    /// Parse a `LOG_FORMAT` value, defaulting to pretty output
    #[must_use]
    pub fn from_str_or_default(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "json" => Self::Json,
            "compact" => Self::Compact,
            _ => Self::Pretty,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Level applied to this crate's events
    pub level: LogLevel,
    /// Output format
    pub format: LogFormat,
    /// Include source file and line numbers
    pub include_location: bool,
    /// Include span open/close events
    pub include_spans: bool,
    /// Service name reported at startup
    pub service_name: String,
    /// Service version reported at startup
    pub service_version: String,
    /// Deployment environment
    pub environment: Environment,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Pretty,
            include_location: false,
            include_spans: false,
            service_name: service_names::OAUTHGATE_SERVER.to_owned(),
            service_version: env!("CARGO_PKG_VERSION").to_owned(),
            environment: Environment::Development,
        }
    }
}

impl LoggingConfig {
    /// Read `LOG_LEVEL`, `LOG_FORMAT`, `ENVIRONMENT`, `LOG_INCLUDE_LOCATION`,
    /// `LOG_INCLUDE_SPANS`, `SERVICE_NAME`, and `SERVICE_VERSION`
    #[must_use]
    pub fn from_env() -> Self {
        let environment = env::var(env_config::ENVIRONMENT)
            .map_or(Environment::Development, |v| Environment::from_str_or_default(&v));
        let level = env::var(env_config::LOG_LEVEL)
            .map_or(LogLevel::Info, |v| LogLevel::from_str_or_default(&v));
        Self::build(level, environment)
    }

    /// Logging settings matching an already loaded server configuration
    #[must_use]
    pub fn from_server_config(config: &ServerConfig) -> Self {
        Self::build(config.log_level, config.environment)
    }

    fn build(level: LogLevel, environment: Environment) -> Self {
        let defaults = Self::default();
        Self {
            level,
            format: env::var("LOG_FORMAT")
                .map_or(LogFormat::default(), |v| LogFormat::from_str_or_default(&v)),
            // Production logs always carry call sites
            include_location: environment.is_production()
                || env::var("LOG_INCLUDE_LOCATION").is_ok(),
            include_spans: env::var("LOG_INCLUDE_SPANS").is_ok(),
            service_name: env::var("SERVICE_NAME").unwrap_or(defaults.service_name),
            service_version: env::var("SERVICE_VERSION").unwrap_or(defaults.service_version),
            environment,
        }
    }

    fn env_filter(&self) -> EnvFilter {
        if let Ok(directives) = env::var("RUST_LOG") {
            return EnvFilter::new(directives);
        }

        let crate_directive: Directive = format!("oauthgate_server={}", self.level)
            .parse()
            .unwrap_or_else(|_| self.level.to_tracing_level().into());

        QUIET_TARGETS
            .iter()
            .filter_map(|directive| directive.parse::<Directive>().ok())
            .fold(EnvFilter::new(self.level.to_string()), EnvFilter::add_directive)
            .add_directive(crate_directive)
    }

    /// Install the global tracing subscriber
    ///
    /// # Errors
    ///
    /// Returns an error if a global subscriber is already installed
    pub fn init(&self) -> Result<()> {
        let span_events = if self.include_spans {
            FmtSpan::NEW | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        };
        let registry = tracing_subscriber::registry().with(self.env_filter());
        let base = fmt::layer()
            .with_writer(io::stdout)
            .with_file(self.include_location)
            .with_line_number(self.include_location);

        match self.format {
            LogFormat::Json => registry
                .with(base.with_target(true).with_span_events(span_events).json())
                .try_init()?,
            LogFormat::Pretty => registry
                .with(base.with_target(true).with_span_events(span_events))
                .try_init()?,
            LogFormat::Compact => registry
                .with(base.compact().with_target(false))
                .try_init()?,
        }

        info!(
            service.name = %self.service_name,
            service.version = %self.service_version,
            environment = %self.environment,
            log.level = %self.level,
            log.format = ?self.format,
            log.location = self.include_location,
            log.spans = self.include_spans,
            "Logging configured"
        );
        Ok(())
    }
}

/// Application-specific logging utilities
pub struct AppLogger;

impl AppLogger {
    /// Log resource owner login attempts
    pub fn log_auth_event(username: &str, event: &str, success: bool) {
        info!(
            user.name = %username,
            auth.event = %event,
            auth.success = success,
            "Authentication event"
        );
    }

    /// Log events that indicate a leaked or replayed credential
    pub fn log_security_event(event_type: &str, severity: &str, details: &str, client_id: &str) {
        warn!(
            security.event = %event_type,
            security.severity = %severity,
            security.details = %details,
            client.id = %client_id,
            "Security event"
        );
    }
}
