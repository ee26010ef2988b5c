// ABOUTME: Server-side access to the shared constants defined in oauthgate-core
// ABOUTME: Re-exports grant defaults, environment variable names, and limits
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

pub use oauthgate_core::constants::*;
