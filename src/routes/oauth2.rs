// ABOUTME: OAuth 2.0 server route handlers for the authorize, token, revoke, and introspect endpoints
// ABOUTME: Decodes form bodies, applies per-IP rate limiting, and renders RFC 6749 responses
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! OAuth 2.0 server routes
//!
//! ## Endpoints
//!
//! - `POST /oauth2/authorize` - Log in and approve; redirects with a code
//! - `POST /oauth2/token` - Exchange a code or refresh token
//! - `POST /oauth2/revoke` - Revoke a token (RFC 7009)
//! - `POST /oauth2/introspect` - Inspect a token (RFC 7662)

use crate::errors::{AppError, ErrorCode};
use crate::logging::AppLogger;
use crate::oauth2_server::{
    AuthorizeRequest, IntrospectRequest, OAuth2Error, RateLimitStatus, RevokeRequest,
    TokenRequest,
};
use crate::resources::ServerResources;
use axum::{
    extract::{rejection::FormRejection, ConnectInfo, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Form, Json, Router,
};
use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use tracing::{debug, warn};

/// HTTP header names for rate limiting
pub mod headers {
    /// Maximum requests allowed in the current window
    pub const X_RATE_LIMIT_LIMIT: &str = "X-RateLimit-Limit";
    /// Remaining requests in the current window
    pub const X_RATE_LIMIT_REMAINING: &str = "X-RateLimit-Remaining";
    /// Unix timestamp when the window resets
    pub const X_RATE_LIMIT_RESET: &str = "X-RateLimit-Reset";
    /// Seconds to wait before retrying
    pub const RETRY_AFTER: &str = "Retry-After";
}

/// Login form posted to the authorization endpoint
#[derive(Debug, Deserialize)]
pub struct AuthorizeForm {
    /// Response type; only `code` is supported
    pub response_type: String,
    /// Client identifier
    pub client_id: String,
    /// Redirect URI; defaults to the client's registered URI
    pub redirect_uri: Option<String>,
    /// Requested scopes
    pub scope: Option<String>,
    /// Opaque value echoed back to the client
    pub state: Option<String>,
    /// Resource owner username
    pub username: String,
    /// Resource owner password
    pub password: String,
}

/// `OAuth2` routes implementation
pub struct OAuth2Routes;

impl OAuth2Routes {
    /// Create all `OAuth2` routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/oauth2/authorize", post(Self::handle_authorize))
            .route("/oauth2/token", post(Self::handle_token))
            .route("/oauth2/revoke", post(Self::handle_revoke))
            .route("/oauth2/introspect", post(Self::handle_introspect))
            .with_state(resources)
    }

    /// Authenticate the resource owner and redirect back with a code
    async fn handle_authorize(
        State(resources): State<Arc<ServerResources>>,
        connect_info: Option<ConnectInfo<SocketAddr>>,
        request_headers: HeaderMap,
        form: Result<Form<AuthorizeForm>, FormRejection>,
    ) -> Response {
        let limit = Self::check_limit(&resources, &request_headers, connect_info);
        if limit.is_limited {
            return rate_limited_response(&limit);
        }

        let Form(form) = match form {
            Ok(form) => form,
            Err(rejection) => return form_rejection_response(&rejection, &limit),
        };

        let user = match resources
            .accounts
            .authenticate(&form.username, &form.password)
            .await
        {
            Ok(user) => {
                AppLogger::log_auth_event(&user.username, "authorize_login", true);
                user
            }
            Err(e) => {
                AppLogger::log_auth_event(&form.username, "authorize_login", false);
                return oauth2_error_response(&login_error(&e), &limit);
            }
        };

        let request = AuthorizeRequest {
            response_type: form.response_type,
            client_id: form.client_id,
            redirect_uri: form.redirect_uri,
            scope: form.scope,
            state: form.state,
        };

        let authorized = match resources.oauth2_server.authorize(request, user.id).await {
            Ok(authorized) => authorized,
            Err(error) => return oauth2_error_response(&error, &limit),
        };

        let Ok(mut location) = url::Url::parse(&authorized.redirect_uri) else {
            warn!("Stored redirect_uri failed to parse");
            return oauth2_error_response(&OAuth2Error::server_error(), &limit);
        };
        {
            let mut query = location.query_pairs_mut();
            query.append_pair("code", &authorized.code);
            if let Some(state) = &authorized.state {
                query.append_pair("state", state);
            }
        }

        debug!(user_id = %user.id, "Authorization approved, redirecting");
        let mut response = (
            StatusCode::FOUND,
            [(header::LOCATION, location.to_string())],
        )
            .into_response();
        apply_rate_limit_headers(response.headers_mut(), &limit);
        response
    }

    /// Exchange an authorization code or refresh token for tokens
    async fn handle_token(
        State(resources): State<Arc<ServerResources>>,
        connect_info: Option<ConnectInfo<SocketAddr>>,
        request_headers: HeaderMap,
        form: Result<Form<TokenRequest>, FormRejection>,
    ) -> Response {
        let limit = Self::check_limit(&resources, &request_headers, connect_info);
        if limit.is_limited {
            return rate_limited_response(&limit);
        }

        let Form(request) = match form {
            Ok(form) => form,
            Err(rejection) => return form_rejection_response(&rejection, &limit),
        };

        match resources.oauth2_server.token(request).await {
            Ok(tokens) => {
                let mut response = (StatusCode::OK, Json(tokens)).into_response();
                let response_headers = response.headers_mut();
                response_headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
                response_headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
                apply_rate_limit_headers(response_headers, &limit);
                response
            }
            Err(error) => oauth2_error_response(&error, &limit),
        }
    }

    /// Revoke a token; unknown tokens still answer 200
    async fn handle_revoke(
        State(resources): State<Arc<ServerResources>>,
        connect_info: Option<ConnectInfo<SocketAddr>>,
        request_headers: HeaderMap,
        form: Result<Form<RevokeRequest>, FormRejection>,
    ) -> Response {
        let limit = Self::check_limit(&resources, &request_headers, connect_info);
        if limit.is_limited {
            return rate_limited_response(&limit);
        }

        let Form(request) = match form {
            Ok(form) => form,
            Err(rejection) => return form_rejection_response(&rejection, &limit),
        };

        match resources.oauth2_server.revoke(request).await {
            Ok(_) => {
                let mut response = StatusCode::OK.into_response();
                apply_rate_limit_headers(response.headers_mut(), &limit);
                response
            }
            Err(error) => oauth2_error_response(&error, &limit),
        }
    }

    async fn handle_introspect(
        State(resources): State<Arc<ServerResources>>,
        connect_info: Option<ConnectInfo<SocketAddr>>,
        request_headers: HeaderMap,
        form: Result<Form<IntrospectRequest>, FormRejection>,
    ) -> Response {
        let limit = Self::check_limit(&resources, &request_headers, connect_info);
        if limit.is_limited {
            return rate_limited_response(&limit);
        }

        let Form(request) = match form {
            Ok(form) => form,
            Err(rejection) => return form_rejection_response(&rejection, &limit),
        };

        match resources.oauth2_server.introspect(request).await {
            Ok(introspection) => {
                let mut response = (StatusCode::OK, Json(introspection)).into_response();
                response
                    .headers_mut()
                    .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
                apply_rate_limit_headers(response.headers_mut(), &limit);
                response
            }
            Err(error) => oauth2_error_response(&error, &limit),
        }
    }

    fn check_limit(
        resources: &ServerResources,
        request_headers: &HeaderMap,
        connect_info: Option<ConnectInfo<SocketAddr>>,
    ) -> RateLimitStatus {
        let client_ip = client_ip(request_headers, connect_info.map(|ConnectInfo(addr)| addr));
        resources.rate_limiter.check_rate_limit(client_ip)
    }
}

/// Resolve the client IP from `X-Forwarded-For`, then the socket peer
#[must_use]
pub fn client_ip(request_headers: &HeaderMap, peer: Option<SocketAddr>) -> IpAddr {
    request_headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .and_then(|first| first.trim().parse::<IpAddr>().ok())
        .or_else(|| peer.map(|addr| addr.ip()))
        .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST))
}

fn login_error(error: &AppError) -> OAuth2Error {
    match error.code {
        ErrorCode::ResourceUnavailable => OAuth2Error::temporarily_unavailable(),
        ErrorCode::DatabaseError | ErrorCode::InternalError => OAuth2Error::server_error(),
        _ => OAuth2Error::access_denied("Invalid username or password"),
    }
}

fn apply_rate_limit_headers(response_headers: &mut HeaderMap, status: &RateLimitStatus) {
    let values = [
        (headers::X_RATE_LIMIT_LIMIT, status.limit.to_string()),
        (headers::X_RATE_LIMIT_REMAINING, status.remaining.to_string()),
        (headers::X_RATE_LIMIT_RESET, status.reset_at.to_string()),
    ];
    for (name, value) in values {
        if let Ok(header_value) = HeaderValue::from_str(&value) {
            response_headers.insert(name, header_value);
        }
    }
    if let Some(retry_after) = status.retry_after_seconds {
        if let Ok(header_value) = HeaderValue::from_str(&retry_after.to_string()) {
            response_headers.insert(headers::RETRY_AFTER, header_value);
        }
    }
}

fn oauth2_error_response(error: &OAuth2Error, limit: &RateLimitStatus) -> Response {
    let status =
        StatusCode::from_u16(error.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut response = (status, Json(error)).into_response();
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    apply_rate_limit_headers(response.headers_mut(), limit);
    response
}

fn form_rejection_response(rejection: &FormRejection, limit: &RateLimitStatus) -> Response {
    debug!("Rejected malformed form body: {}", rejection);
    oauth2_error_response(
        &OAuth2Error::invalid_request("Malformed or incomplete request parameters"),
        limit,
    )
}

fn rate_limited_response(status: &RateLimitStatus) -> Response {
    warn!(
        limit = status.limit,
        retry_after = ?status.retry_after_seconds,
        "OAuth2 rate limit exceeded"
    );
    let body = serde_json::json!({
        "error": "rate_limit_exceeded",
        "error_description": format!(
            "Rate limit exceeded. Retry after {} seconds",
            status.retry_after_seconds.unwrap_or(1)
        ),
    });
    let mut response = (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();
    apply_rate_limit_headers(response.headers_mut(), status);
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_ip_prefers_forwarded_header() {
        let mut request_headers = HeaderMap::new();
        request_headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7, 10.0.0.1"),
        );
        let peer: SocketAddr = "192.0.2.1:5000".parse().unwrap();

        assert_eq!(
            client_ip(&request_headers, Some(peer)),
            "203.0.113.7".parse::<IpAddr>().unwrap()
        );
        assert_eq!(
            client_ip(&HeaderMap::new(), Some(peer)),
            "192.0.2.1".parse::<IpAddr>().unwrap()
        );
        assert_eq!(
            client_ip(&HeaderMap::new(), None),
            IpAddr::V4(Ipv4Addr::LOCALHOST)
        );
    }

    #[test]
    fn test_login_errors_hide_storage_details() {
        assert_eq!(
            login_error(&AppError::auth_invalid("bad")).error,
            "access_denied"
        );
        assert_eq!(
            login_error(&AppError::new(ErrorCode::ResourceUnavailable, "down")).error,
            "temporarily_unavailable"
        );
    }
}
