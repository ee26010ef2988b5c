// ABOUTME: Output formatting helpers for oauthgate-cli
// ABOUTME: Provides consistent display functions for users, clients, and scopes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use oauthgate_server::{
    models::{ScopeDescription, User},
    oauth2_server::ClientRegistrationResponse,
};

/// Display user creation success message
pub fn display_user_created(user: &User) {
    println!("\nUser Created Successfully!");
    println!("{}", "=".repeat(50));
    println!("   Username: {}", user.username);
    println!("   User ID:  {}", user.id);
    if let Some(email) = &user.email {
        println!("   Email:    {email}");
    }
    println!("{}", "=".repeat(50));
}

/// Display registered client credentials with the one-time secret warning
pub fn display_client_registered(client: &ClientRegistrationResponse) {
    println!("\nOAuth 2.0 Client Registered Successfully!");
    println!("{}", "=".repeat(80));
    println!("   Client ID:    {}", client.client_id);
    println!("   Client Type:  {}", client.client_type);
    println!("   Redirect URI: {}", client.redirect_uri);
    println!("   Scopes:       {}", client.scope);

    if let Some(secret) = &client.client_secret {
        println!("\nCLIENT SECRET (SAVE THIS NOW):");
        println!("{}", "=".repeat(80));
        println!("{secret}");
        println!("{}", "=".repeat(80));
        println!("• This secret is shown ONLY ONCE; only its hash is stored");
        println!("• Never commit it to version control");
    } else {
        println!("\nPublic client: authenticates with client_id only");
    }
}

/// Display a newly added scope and the resulting catalog
pub fn display_scope_added(scope: &ScopeDescription, catalog: &[ScopeDescription]) {
    println!("\nScope '{}' added", scope.name);
    println!("Catalog ({} scopes):", catalog.len());
    for entry in catalog {
        println!(
            "   {:<24} {}",
            entry.name,
            entry.description.as_deref().unwrap_or("")
        );
    }
}
