// ABOUTME: Configuration module grouping environment and presence settings
// ABOUTME: All configuration is environment-variable driven with defaults
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 VentureLink

/// Server configuration loaded from environment variables
pub mod environment;
/// Presence store configuration
pub mod presence;
