// ABOUTME: Client and scope catalog commands for oauthgate-cli
// ABOUTME: Registers OAuth 2.0 clients and adds catalog scopes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use crate::helpers::display::{display_client_registered, display_scope_added};
use oauthgate_server::{
    errors::AppResult,
    models::OAuth2ClientType,
    oauth2_server::{ClientRegistrationRequest, ClientRegistrationResponse},
    resources::ServerResources,
};

/// Register a client and print its credentials once
pub async fn create(
    resources: &ServerResources,
    redirect_uri: String,
    scope: Option<String>,
    name: Option<String>,
    public: bool,
) -> AppResult<()> {
    let client_type = if public {
        OAuth2ClientType::Public
    } else {
        OAuth2ClientType::Confidential
    };

    let (client, secret) = resources
        .oauth2_server
        .clients()
        .register(ClientRegistrationRequest {
            redirect_uri,
            client_name: name,
            scope,
            client_type,
        })
        .await?;

    display_client_registered(&ClientRegistrationResponse::new(&client, secret));
    Ok(())
}

/// Add a scope to the catalog
pub async fn add_scope(
    resources: &ServerResources,
    name: &str,
    description: Option<&str>,
) -> AppResult<()> {
    let scope = resources
        .oauth2_server
        .clients()
        .register_scope(name, description)
        .await?;
    let catalog = resources.oauth2_server.clients().list_scopes().await?;
    display_scope_added(&scope, &catalog);
    Ok(())
}
