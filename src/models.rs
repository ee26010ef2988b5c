// ABOUTME: Data models re-exported from oauthgate-core
// ABOUTME: Users, OAuth clients, authorization codes, tokens, and scope catalog entries
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

pub use oauthgate_core::models::*;
pub use oauthgate_core::scopes::ScopeSet;
