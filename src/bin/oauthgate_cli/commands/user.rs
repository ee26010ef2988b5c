// ABOUTME: User management command for oauthgate-cli
// ABOUTME: Creates resource owner accounts with hashed passwords
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use crate::helpers::display::display_user_created;
use oauthgate_server::{errors::AppResult, resources::ServerResources};
use tracing::info;

/// Create a resource owner account
pub async fn create(
    resources: &ServerResources,
    username: &str,
    password: &str,
    email: Option<&str>,
) -> AppResult<()> {
    info!("Creating user: {}", username);
    let user = resources
        .accounts
        .register_user(username, password, email)
        .await?;
    display_user_created(&user);
    Ok(())
}
