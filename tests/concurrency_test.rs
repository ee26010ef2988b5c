// ABOUTME: Concurrency tests for single-use codes and single-use refresh tokens
// ABOUTME: Races redemptions and refreshes on both backends and expects exactly one winner
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use common::{
    issue_code, sqlite_memory_database, test_config, user_and_client, ScriptedRandomSource,
    TestHarness, TEST_REDIRECT_URI,
};
use oauthgate_server::errors::GrantError;
use std::sync::Arc;

const RACERS: usize = 8;

async fn race_redemptions(harness: TestHarness) {
    let (user, client, _) = user_and_client(&harness, "read").await;
    let code = issue_code(&harness, &user, &client, "read").await;

    let mut handles = Vec::with_capacity(RACERS);
    for _ in 0..RACERS {
        let server = harness.resources.oauth2_server.clone();
        let code = code.clone();
        let client_id = client.client_id.clone();
        handles.push(tokio::spawn(async move {
            server
                .codes()
                .redeem(&code, &client_id, TEST_REDIRECT_URI)
                .await
        }));
    }

    let mut winners = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => winners += 1,
            Err(e) => assert_eq!(e, GrantError::CodeAlreadyUsed),
        }
    }
    assert_eq!(winners, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_redemption_has_one_winner_in_memory() {
    race_redemptions(TestHarness::new()).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_redemption_has_one_winner_in_sqlite() {
    let harness = TestHarness::with_database(
        sqlite_memory_database().await,
        test_config(),
        Arc::new(ScriptedRandomSource::default()),
    );
    race_redemptions(harness).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_refresh_has_one_winner() {
    let harness = TestHarness::new();
    let (user, client, _) = user_and_client(&harness, "read").await;
    let code = issue_code(&harness, &user, &client, "read").await;
    let server = harness.resources.oauth2_server.clone();
    let grant = server
        .codes()
        .redeem(&code, &client.client_id, TEST_REDIRECT_URI)
        .await
        .unwrap();
    let pair = server.tokens().issue_from_code(&grant).await.unwrap();

    let mut handles = Vec::with_capacity(RACERS);
    for _ in 0..RACERS {
        let server = server.clone();
        let refresh_token = pair.refresh_token.clone();
        let client_id = client.client_id.clone();
        handles.push(tokio::spawn(async move {
            server
                .tokens()
                .refresh(&refresh_token, &client_id, None)
                .await
        }));
    }

    let mut rotated = Vec::new();
    for handle in handles {
        match handle.await.unwrap() {
            Ok(pair) => rotated.push(pair),
            Err(e) => assert_eq!(e, GrantError::TokenRevoked),
        }
    }
    assert_eq!(rotated.len(), 1);
    assert!(server
        .tokens()
        .validate(&rotated[0].access_token)
        .await
        .is_ok());
}
