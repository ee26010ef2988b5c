// ABOUTME: Integration tests for the authorization server facade
// ABOUTME: Exercises authorize, token, revoke, and introspect with RFC 6749 error mapping
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use common::{
    test_config, user_and_client, ScriptedRandomSource, TestHarness, TEST_REDIRECT_URI,
};
use oauthgate_server::errors::GrantError;
use oauthgate_server::models::{OAuth2Client, OAuth2ClientType, User};
use oauthgate_server::oauth2_server::{
    AuthorizeRequest, IntrospectRequest, RevokeRequest, TokenRequest, TokenResponse,
};
use std::sync::Arc;

fn authorize_request(client: &OAuth2Client, scope: &str) -> AuthorizeRequest {
    AuthorizeRequest {
        response_type: "code".to_owned(),
        client_id: client.client_id.clone(),
        redirect_uri: Some(TEST_REDIRECT_URI.to_owned()),
        scope: Some(scope.to_owned()),
        state: Some("xyz".to_owned()),
    }
}

fn code_request(client: &OAuth2Client, secret: Option<&str>, code: &str) -> TokenRequest {
    TokenRequest {
        grant_type: "authorization_code".to_owned(),
        code: Some(code.to_owned()),
        redirect_uri: Some(TEST_REDIRECT_URI.to_owned()),
        client_id: client.client_id.clone(),
        client_secret: secret.map(str::to_owned),
        scope: None,
        refresh_token: None,
    }
}

fn refresh_request(client: &OAuth2Client, secret: &str, refresh_token: &str) -> TokenRequest {
    TokenRequest {
        grant_type: "refresh_token".to_owned(),
        code: None,
        redirect_uri: None,
        client_id: client.client_id.clone(),
        client_secret: Some(secret.to_owned()),
        scope: None,
        refresh_token: Some(refresh_token.to_owned()),
    }
}

fn introspect_request(client: &OAuth2Client, secret: &str, token: &str) -> IntrospectRequest {
    IntrospectRequest {
        token: token.to_owned(),
        token_type_hint: None,
        client_id: client.client_id.clone(),
        client_secret: Some(secret.to_owned()),
    }
}

fn revoke_request(client: &OAuth2Client, secret: &str, token: &str) -> RevokeRequest {
    RevokeRequest {
        token: token.to_owned(),
        token_type_hint: None,
        client_id: client.client_id.clone(),
        client_secret: Some(secret.to_owned()),
    }
}

async fn exchange(
    harness: &TestHarness,
    user: &User,
    client: &OAuth2Client,
    secret: &str,
) -> (String, TokenResponse) {
    let server = &harness.resources.oauth2_server;
    let authorized = server
        .authorize(authorize_request(client, "read"), user.id)
        .await
        .unwrap();
    let tokens = server
        .token(code_request(client, Some(secret), &authorized.code))
        .await
        .unwrap();
    (authorized.code, tokens)
}

#[tokio::test]
async fn test_full_authorization_code_flow() {
    let harness = TestHarness::new();
    let (user, client, secret) = user_and_client(&harness, "read write").await;
    let server = &harness.resources.oauth2_server;

    let authorized = server
        .authorize(authorize_request(&client, "read"), user.id)
        .await
        .unwrap();
    assert_eq!(authorized.state.as_deref(), Some("xyz"));
    assert_eq!(authorized.redirect_uri, TEST_REDIRECT_URI);

    let tokens = server
        .token(code_request(&client, Some(&secret), &authorized.code))
        .await
        .unwrap();
    assert_eq!(tokens.token_type, "Bearer");
    assert_eq!(tokens.scope, "read");
    assert_eq!(
        tokens.expires_in,
        harness.resources.config.oauth2.access_token_ttl_secs
    );

    let introspection = server
        .introspect(introspect_request(&client, &secret, &tokens.access_token))
        .await
        .unwrap();
    assert!(introspection.active);
    assert_eq!(introspection.username.as_deref(), Some("alice"));
    assert_eq!(introspection.token_type.as_deref(), Some("access_token"));
    assert_eq!(introspection.sub, Some(user.id.to_string()));

    let rotated = server
        .token(refresh_request(&client, &secret, &tokens.refresh_token))
        .await
        .unwrap();
    assert_ne!(rotated.access_token, tokens.access_token);

    let stale = server
        .introspect(introspect_request(&client, &secret, &tokens.access_token))
        .await
        .unwrap();
    assert!(!stale.active);

    assert!(server
        .revoke(revoke_request(&client, &secret, &rotated.access_token))
        .await
        .unwrap());
    assert_eq!(
        server.tokens().validate(&rotated.access_token).await,
        Err(GrantError::TokenRevoked)
    );
}

#[tokio::test]
async fn test_code_reuse_revokes_issued_tokens() {
    let harness = TestHarness::new();
    let (user, client, secret) = user_and_client(&harness, "read").await;
    let server = &harness.resources.oauth2_server;
    let (code, tokens) = exchange(&harness, &user, &client, &secret).await;

    let replay = server
        .token(code_request(&client, Some(&secret), &code))
        .await
        .unwrap_err();
    assert_eq!(replay.error, "invalid_grant");

    assert_eq!(
        server.tokens().validate(&tokens.access_token).await,
        Err(GrantError::TokenRevoked)
    );
}

#[tokio::test]
async fn test_code_reuse_leaves_tokens_when_revocation_disabled() {
    let mut config = test_config();
    config.oauth2.revoke_on_code_reuse = false;
    let harness = TestHarness::with_config(config, Arc::new(ScriptedRandomSource::default()));
    let (user, client, secret) = user_and_client(&harness, "read").await;
    let server = &harness.resources.oauth2_server;
    let (code, tokens) = exchange(&harness, &user, &client, &secret).await;

    let replay = server
        .token(code_request(&client, Some(&secret), &code))
        .await
        .unwrap_err();
    assert_eq!(replay.error, "invalid_grant");
    assert!(server
        .tokens()
        .validate(&tokens.access_token)
        .await
        .is_ok());
}

#[tokio::test]
async fn test_client_authentication() {
    let harness = TestHarness::new();
    let (user, client, _) = user_and_client(&harness, "read").await;
    let server = &harness.resources.oauth2_server;

    let authorized = server
        .authorize(authorize_request(&client, "read"), user.id)
        .await
        .unwrap();
    let rejected = server
        .token(code_request(&client, Some("wrong-secret"), &authorized.code))
        .await
        .unwrap_err();
    assert_eq!(rejected.error, "invalid_client");
    assert_eq!(rejected.http_status(), 401);

    let missing = server
        .token(code_request(&client, None, &authorized.code))
        .await
        .unwrap_err();
    assert_eq!(missing.error, "invalid_client");

    let (public, secret) = harness
        .create_client("read", OAuth2ClientType::Public)
        .await
        .unwrap();
    assert!(secret.is_none());
    let authorized = server
        .authorize(authorize_request(&public, "read"), user.id)
        .await
        .unwrap();
    assert!(server
        .token(code_request(&public, None, &authorized.code))
        .await
        .is_ok());
}

#[tokio::test]
async fn test_unsupported_grant_and_response_types() {
    let harness = TestHarness::new();
    let (user, client, secret) = user_and_client(&harness, "read").await;
    let server = &harness.resources.oauth2_server;

    let mut request = code_request(&client, Some(&secret), "irrelevant");
    request.grant_type = "password".to_owned();
    let error = server.token(request).await.unwrap_err();
    assert_eq!(error.error, "unsupported_grant_type");

    let mut authorize = authorize_request(&client, "read");
    authorize.response_type = "token".to_owned();
    let error = server.authorize(authorize, user.id).await.unwrap_err();
    assert_eq!(error.error, "unsupported_response_type");
}

#[tokio::test]
async fn test_authorize_error_mapping() {
    let harness = TestHarness::new();
    let (user, client, _) = user_and_client(&harness, "read").await;
    let server = &harness.resources.oauth2_server;

    let error = server
        .authorize(authorize_request(&client, "read admin"), user.id)
        .await
        .unwrap_err();
    assert_eq!(error.error, "invalid_scope");

    let mut request = authorize_request(&client, "read");
    request.redirect_uri = Some("https://attacker.example.com/cb".to_owned());
    let error = server.authorize(request, user.id).await.unwrap_err();
    assert_eq!(error.error, "invalid_request");

    let mut request = authorize_request(&client, "read");
    request.client_id = "client_missing".to_owned();
    let error = server.authorize(request, user.id).await.unwrap_err();
    assert_eq!(error.error, "invalid_client");
}

#[tokio::test]
async fn test_missing_redirect_falls_back_to_registered_uri() {
    let harness = TestHarness::new();
    let (user, client, secret) = user_and_client(&harness, "read").await;
    let server = &harness.resources.oauth2_server;

    let authorized = server
        .authorize(authorize_request(&client, "read"), user.id)
        .await
        .unwrap();
    let mut request = code_request(&client, Some(&secret), &authorized.code);
    request.redirect_uri = None;
    assert!(server.token(request).await.is_ok());
}

#[tokio::test]
async fn test_introspection_visibility() {
    let harness = TestHarness::new();
    let (user, client, secret) = user_and_client(&harness, "read").await;
    let (other, other_secret) = harness
        .create_client("read", OAuth2ClientType::Confidential)
        .await
        .unwrap();
    let other_secret = other_secret.unwrap();
    let server = &harness.resources.oauth2_server;
    let (_, tokens) = exchange(&harness, &user, &client, &secret).await;

    let foreign = server
        .introspect(introspect_request(&other, &other_secret, &tokens.access_token))
        .await
        .unwrap();
    assert!(!foreign.active);
    assert!(foreign.client_id.is_none());

    let refresh = server
        .introspect(introspect_request(&client, &secret, &tokens.refresh_token))
        .await
        .unwrap();
    assert!(refresh.active);
    assert_eq!(refresh.token_type.as_deref(), Some("refresh_token"));

    server
        .revoke(revoke_request(&client, &secret, &tokens.refresh_token))
        .await
        .unwrap();
    let revoked = server
        .introspect(introspect_request(&client, &secret, &tokens.access_token))
        .await
        .unwrap();
    assert!(!revoked.active);

    let unknown = server
        .introspect(introspect_request(&client, &secret, "never-issued"))
        .await
        .unwrap();
    assert!(!unknown.active);
}

#[tokio::test]
async fn test_revoking_foreign_token_has_no_effect() {
    let harness = TestHarness::new();
    let (user, client, secret) = user_and_client(&harness, "read").await;
    let (other, other_secret) = harness
        .create_client("read", OAuth2ClientType::Confidential)
        .await
        .unwrap();
    let server = &harness.resources.oauth2_server;
    let (_, tokens) = exchange(&harness, &user, &client, &secret).await;

    let revoked = server
        .revoke(revoke_request(
            &other,
            &other_secret.unwrap(),
            &tokens.access_token,
        ))
        .await
        .unwrap();
    assert!(!revoked);
    assert!(server
        .tokens()
        .validate(&tokens.access_token)
        .await
        .is_ok());

    assert!(!server
        .revoke(revoke_request(&client, &secret, "never-issued"))
        .await
        .unwrap());
}

#[tokio::test]
async fn test_refresh_grant_errors() {
    let harness = TestHarness::new();
    let (user, client, secret) = user_and_client(&harness, "read").await;
    let server = &harness.resources.oauth2_server;
    let (_, tokens) = exchange(&harness, &user, &client, &secret).await;

    let mut missing = refresh_request(&client, &secret, "unused");
    missing.refresh_token = None;
    assert_eq!(
        server.token(missing).await.unwrap_err().error,
        "invalid_request"
    );

    let mut widened = refresh_request(&client, &secret, &tokens.refresh_token);
    widened.scope = Some("read write".to_owned());
    assert_eq!(
        server.token(widened).await.unwrap_err().error,
        "invalid_scope"
    );

    server
        .token(refresh_request(&client, &secret, &tokens.refresh_token))
        .await
        .unwrap();
    let reused = server
        .token(refresh_request(&client, &secret, &tokens.refresh_token))
        .await
        .unwrap_err();
    assert_eq!(reused.error, "invalid_grant");
    assert_eq!(reused.http_status(), 400);
}
