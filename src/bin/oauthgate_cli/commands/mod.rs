// ABOUTME: Re-exports command modules for oauthgate-cli
// ABOUTME: Provides access to user, client, and maintenance commands
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

pub mod client;
pub mod maintenance;
pub mod user;
