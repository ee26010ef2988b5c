// ABOUTME: Error types re-exported from oauthgate-core for unified type identity
// ABOUTME: Server modules import errors from here rather than from the core crate
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

pub use oauthgate_core::errors::*;
