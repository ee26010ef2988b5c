// ABOUTME: Route module organization for the authorization server HTTP endpoints
// ABOUTME: Assembles the OAuth 2.0 and health routers with tracing and body limit layers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// Health check route
pub mod health;
/// OAuth 2.0 server routes
pub mod oauth2;

pub use health::HealthRoutes;
pub use oauth2::OAuth2Routes;

use crate::errors::AppError;
use crate::resources::ServerResources;
use axum::Router;
use std::sync::Arc;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};

/// Form bodies on these endpoints are small
const MAX_BODY_BYTES: usize = 16 * 1024;

/// Build the complete application router
pub fn router(resources: Arc<ServerResources>) -> Router {
    Router::new()
        .merge(HealthRoutes::routes(resources.clone()))
        .merge(OAuth2Routes::routes(resources))
        .fallback(|| async { AppError::not_found("Route") })
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
}
