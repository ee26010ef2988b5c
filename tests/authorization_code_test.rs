// ABOUTME: Integration tests for authorization code issuance, redemption, and purging
// ABOUTME: Covers single use, expiry, client binding, scope rules, and generation retries
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use chrono::Duration;
use common::{
    issue_code, test_config, user_and_client, FailingRandomSource, ScriptedRandomSource,
    TestHarness, TEST_REDIRECT_URI,
};
use oauthgate_server::errors::GrantError;
use oauthgate_server::models::{OAuth2ClientType, ScopeSet};
use oauthgate_server::oauth2_server::EmptyScopePolicy;
use std::sync::Arc;
use uuid::Uuid;

#[tokio::test]
async fn test_code_redeems_once_with_requested_scopes() {
    let harness = TestHarness::new();
    let (user, client, _) = user_and_client(&harness, "read write").await;
    let code = issue_code(&harness, &user, &client, "read").await;
    let codes = harness.resources.oauth2_server.codes();

    let grant = codes
        .redeem(&code, &client.client_id, TEST_REDIRECT_URI)
        .await
        .unwrap();
    assert_eq!(grant.user_id, user.id);
    assert_eq!(grant.client_id, client.client_id);
    assert_eq!(grant.scopes, ScopeSet::parse("read"));
    assert_eq!(grant.code, code);

    let second = codes
        .redeem(&code, &client.client_id, TEST_REDIRECT_URI)
        .await;
    assert_eq!(second, Err(GrantError::CodeAlreadyUsed));
}

#[tokio::test]
async fn test_code_expires_at_its_deadline() {
    let harness = TestHarness::new();
    let (user, client, _) = user_and_client(&harness, "read").await;
    let code = issue_code(&harness, &user, &client, "read").await;

    harness.clock.advance(Duration::seconds(
        harness.resources.config.oauth2.code_ttl_secs,
    ));

    let result = harness
        .resources
        .oauth2_server
        .codes()
        .redeem(&code, &client.client_id, TEST_REDIRECT_URI)
        .await;
    assert_eq!(result, Err(GrantError::CodeExpired));
}

#[tokio::test]
async fn test_code_redeems_just_before_deadline() {
    let harness = TestHarness::new();
    let (user, client, _) = user_and_client(&harness, "read").await;
    let code = issue_code(&harness, &user, &client, "read").await;

    harness.clock.advance(Duration::seconds(
        harness.resources.config.oauth2.code_ttl_secs - 1,
    ));

    assert!(harness
        .resources
        .oauth2_server
        .codes()
        .redeem(&code, &client.client_id, TEST_REDIRECT_URI)
        .await
        .is_ok());
}

#[tokio::test]
async fn test_mismatched_redemption_does_not_consume_code() {
    let harness = TestHarness::new();
    let (user, client, _) = user_and_client(&harness, "read").await;
    let (other, _) = harness
        .create_client("read", OAuth2ClientType::Public)
        .await
        .unwrap();
    let code = issue_code(&harness, &user, &client, "read").await;
    let codes = harness.resources.oauth2_server.codes();

    assert_eq!(
        codes
            .redeem(&code, &other.client_id, TEST_REDIRECT_URI)
            .await,
        Err(GrantError::ClientMismatch)
    );
    assert_eq!(
        codes
            .redeem(&code, &client.client_id, "https://client.example.com/other")
            .await,
        Err(GrantError::ClientMismatch)
    );

    assert!(codes
        .redeem(&code, &client.client_id, TEST_REDIRECT_URI)
        .await
        .is_ok());
}

#[tokio::test]
async fn test_unknown_code_is_not_found() {
    let harness = TestHarness::new();
    let (_, client, _) = user_and_client(&harness, "read").await;

    let result = harness
        .resources
        .oauth2_server
        .codes()
        .redeem("never-issued", &client.client_id, TEST_REDIRECT_URI)
        .await;
    assert_eq!(result, Err(GrantError::CodeNotFound));
}

#[tokio::test]
async fn test_issue_rejects_scopes_outside_client_allowance() {
    let harness = TestHarness::new();
    let (user, client, _) = user_and_client(&harness, "read").await;

    let result = harness
        .resources
        .oauth2_server
        .codes()
        .issue(
            user.id,
            &client.client_id,
            None,
            &ScopeSet::parse("read admin"),
        )
        .await;
    assert_eq!(result, Err(GrantError::InvalidScope("admin".to_owned())));
}

#[tokio::test]
async fn test_issue_rejects_unknown_parties_and_redirects() {
    let harness = TestHarness::new();
    let (user, client, _) = user_and_client(&harness, "read").await;
    let codes = harness.resources.oauth2_server.codes();
    let read = ScopeSet::parse("read");

    assert_eq!(
        codes.issue(user.id, "client_missing", None, &read).await,
        Err(GrantError::UnknownClient)
    );
    assert_eq!(
        codes
            .issue(Uuid::new_v4(), &client.client_id, None, &read)
            .await,
        Err(GrantError::UnknownUser)
    );
    assert_eq!(
        codes
            .issue(
                user.id,
                &client.client_id,
                Some("https://attacker.example.com/cb"),
                &read
            )
            .await,
        Err(GrantError::ClientMismatch)
    );
}

#[tokio::test]
async fn test_issue_without_redirect_binds_registered_uri() {
    let harness = TestHarness::new();
    let (user, client, _) = user_and_client(&harness, "read").await;

    let code = harness
        .resources
        .oauth2_server
        .codes()
        .issue(user.id, &client.client_id, None, &ScopeSet::parse("read"))
        .await
        .unwrap();
    assert_eq!(code.redirect_uri, TEST_REDIRECT_URI);
    assert!(!code.is_used);
    assert_eq!(
        code.expires_at - code.created_at,
        Duration::seconds(harness.resources.config.oauth2.code_ttl_secs)
    );
}

#[tokio::test]
async fn test_empty_scope_request_follows_policy() {
    let harness = TestHarness::new();
    let (user, client, _) = user_and_client(&harness, "read write").await;
    let code = harness
        .resources
        .oauth2_server
        .codes()
        .issue(user.id, &client.client_id, None, &ScopeSet::new())
        .await
        .unwrap();
    assert_eq!(code.scopes, ScopeSet::parse("read write"));

    let mut config = test_config();
    config.oauth2.empty_scope_policy = EmptyScopePolicy::Reject;
    let strict = TestHarness::with_config(config, Arc::new(ScriptedRandomSource::default()));
    let (user, client, _) = user_and_client(&strict, "read write").await;
    let result = strict
        .resources
        .oauth2_server
        .codes()
        .issue(user.id, &client.client_id, None, &ScopeSet::new())
        .await;
    assert!(matches!(result, Err(GrantError::InvalidScope(_))));
}

#[tokio::test]
async fn test_code_collision_is_regenerated() {
    let random = Arc::new(ScriptedRandomSource::new(["taken", "taken", "fresh"]));
    let harness = TestHarness::with_config(test_config(), random);
    let user = harness.create_user("alice").await.unwrap();
    let (client, _) = harness
        .create_client("read", OAuth2ClientType::Public)
        .await
        .unwrap();

    let first = issue_code(&harness, &user, &client, "read").await;
    let second = issue_code(&harness, &user, &client, "read").await;

    assert_eq!(first, "taken");
    assert_eq!(second, "fresh");
}

#[tokio::test]
async fn test_persistent_code_collision_is_storage_unavailable() {
    let random = Arc::new(ScriptedRandomSource::new(["same"; 8]));
    let mut config = test_config();
    config.oauth2.max_generation_attempts = 3;
    let harness = TestHarness::with_config(config, random);
    let user = harness.create_user("alice").await.unwrap();
    let (client, _) = harness
        .create_client("read", OAuth2ClientType::Public)
        .await
        .unwrap();
    let codes = harness.resources.oauth2_server.codes();
    let read = ScopeSet::parse("read");

    codes
        .issue(user.id, &client.client_id, None, &read)
        .await
        .unwrap();
    let result = codes.issue(user.id, &client.client_id, None, &read).await;
    assert!(matches!(result, Err(GrantError::StorageUnavailable(_))));
}

#[tokio::test]
async fn test_random_source_failure_is_storage_unavailable() {
    let harness = TestHarness::with_config(test_config(), Arc::new(FailingRandomSource));
    let user = harness.create_user("alice").await.unwrap();
    let (client, _) = harness
        .create_client("read", OAuth2ClientType::Public)
        .await
        .unwrap();

    let result = harness
        .resources
        .oauth2_server
        .codes()
        .issue(user.id, &client.client_id, None, &ScopeSet::parse("read"))
        .await;
    assert!(matches!(result, Err(GrantError::StorageUnavailable(_))));
}

#[tokio::test]
async fn test_purge_removes_codes_past_grace_only() {
    let harness = TestHarness::new();
    let (user, client, _) = user_and_client(&harness, "read").await;
    let old = issue_code(&harness, &user, &client, "read").await;

    let grace = Duration::hours(1);
    let ttl = Duration::seconds(harness.resources.config.oauth2.code_ttl_secs);
    harness.clock.advance(ttl + grace + Duration::seconds(1));
    let recent = issue_code(&harness, &user, &client, "read").await;

    let codes = harness.resources.oauth2_server.codes();
    assert_eq!(codes.purge_expired(grace).await.unwrap(), 1);

    assert_eq!(
        codes
            .redeem(&old, &client.client_id, TEST_REDIRECT_URI)
            .await,
        Err(GrantError::CodeNotFound)
    );
    assert!(codes
        .redeem(&recent, &client.client_id, TEST_REDIRECT_URI)
        .await
        .is_ok());
}
