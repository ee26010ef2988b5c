// ABOUTME: Storage maintenance command for oauthgate-cli
// ABOUTME: Purges authorization codes past their expiry plus a grace period
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use oauthgate_server::{
    errors::{AppError, AppResult},
    resources::ServerResources,
};

/// Delete codes expired for longer than `grace`
pub async fn purge_codes(resources: &ServerResources, grace: chrono::Duration) -> AppResult<()> {
    let purged = resources
        .oauth2_server
        .codes()
        .purge_expired(grace)
        .await
        .map_err(|e| AppError::database(e.to_string()))?;
    println!(
        "Purged {purged} authorization code(s) expired for more than {}s",
        grace.num_seconds()
    );
    Ok(())
}
