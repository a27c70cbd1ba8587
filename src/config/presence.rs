// ABOUTME: Presence store and Redis connection configuration types
// ABOUTME: Handles backend selection, session TTLs, and retry settings
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 VentureLink

use crate::constants::{presence, redis};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Presence store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresenceConfig {
    /// Redis URL; when set the Redis backend is selected, otherwise the
    /// in-memory backend is used
    #[serde(default)]
    pub redis_url: Option<String>,
    /// TTL applied to a live session's presence keys, in seconds
    pub session_ttl_secs: u64,
    /// Heartbeat interval refreshing presence TTLs, in seconds
    pub heartbeat_secs: u64,
    /// Sweep interval for the in-memory backend's cleanup task, in seconds
    pub cleanup_interval_secs: u64,
    /// Run the in-memory backend's background cleanup task.
    /// Disabled in tests to avoid runtime conflicts.
    pub enable_background_cleanup: bool,
    /// Redis connection and retry configuration
    #[serde(default)]
    pub redis_connection: RedisConnectionConfig,
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            redis_url: None,
            session_ttl_secs: presence::DEFAULT_SESSION_TTL_SECS,
            heartbeat_secs: presence::DEFAULT_HEARTBEAT_SECS,
            cleanup_interval_secs: presence::DEFAULT_CLEANUP_INTERVAL_SECS,
            enable_background_cleanup: true,
            redis_connection: RedisConnectionConfig::default(),
        }
    }
}

impl PresenceConfig {
    /// Load presence configuration from environment
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            redis_url: env::var("REDIS_URL").ok(),
            session_ttl_secs: env::var("PRESENCE_SESSION_TTL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(presence::DEFAULT_SESSION_TTL_SECS),
            heartbeat_secs: env::var("PRESENCE_HEARTBEAT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(presence::DEFAULT_HEARTBEAT_SECS),
            cleanup_interval_secs: env::var("PRESENCE_CLEANUP_INTERVAL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(presence::DEFAULT_CLEANUP_INTERVAL_SECS),
            enable_background_cleanup: true,
            redis_connection: RedisConnectionConfig::from_env(),
        }
    }

    /// Session TTL as a `Duration`
    #[must_use]
    pub const fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }

    /// Heartbeat interval as a `Duration`
    #[must_use]
    pub const fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_secs)
    }
}

/// Redis connection and retry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConnectionConfig {
    /// Connection timeout in seconds
    pub connection_timeout_secs: u64,
    /// Response/command timeout in seconds
    pub response_timeout_secs: u64,
    /// Number of reconnection retries after connection drop
    pub reconnection_retries: usize,
    /// Exponential backoff base for retry delays
    pub retry_exponent_base: u64,
    /// Maximum retry delay in milliseconds
    pub max_retry_delay_ms: u64,
    /// Number of retries for initial connection at startup
    pub initial_connection_retries: u32,
    /// Initial retry delay in milliseconds (doubles with exponential backoff)
    pub initial_retry_delay_ms: u64,
}

impl Default for RedisConnectionConfig {
    fn default() -> Self {
        Self {
            connection_timeout_secs: redis::CONNECTION_TIMEOUT_SECS,
            response_timeout_secs: redis::RESPONSE_TIMEOUT_SECS,
            reconnection_retries: redis::RECONNECTION_RETRIES,
            retry_exponent_base: redis::RETRY_EXPONENT_BASE,
            max_retry_delay_ms: redis::MAX_RETRY_DELAY_MS,
            initial_connection_retries: redis::INITIAL_CONNECTION_RETRIES,
            initial_retry_delay_ms: redis::INITIAL_RETRY_DELAY_MS,
        }
    }
}

impl RedisConnectionConfig {
    /// Load Redis connection configuration from environment
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            connection_timeout_secs: env::var("REDIS_CONNECTION_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(redis::CONNECTION_TIMEOUT_SECS),
            response_timeout_secs: env::var("REDIS_RESPONSE_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(redis::RESPONSE_TIMEOUT_SECS),
            reconnection_retries: env::var("REDIS_RECONNECTION_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(redis::RECONNECTION_RETRIES),
            retry_exponent_base: env::var("REDIS_RETRY_EXPONENT_BASE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(redis::RETRY_EXPONENT_BASE),
            max_retry_delay_ms: env::var("REDIS_MAX_RETRY_DELAY_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(redis::MAX_RETRY_DELAY_MS),
            initial_connection_retries: env::var("REDIS_INITIAL_CONNECTION_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(redis::INITIAL_CONNECTION_RETRIES),
            initial_retry_delay_ms: env::var("REDIS_INITIAL_RETRY_DELAY_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(redis::INITIAL_RETRY_DELAY_MS),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_heartbeat_below_ttl() {
        let config = PresenceConfig::default();
        assert!(config.heartbeat_secs < config.session_ttl_secs);
    }
}
