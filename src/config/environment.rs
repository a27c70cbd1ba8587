// ABOUTME: Environment-based server configuration with validated defaults
// ABOUTME: Covers HTTP port, database URL, presence backend, and media storage
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 VentureLink

//! # Server Configuration
//!
//! Environment-only configuration: every setting has a default suitable for
//! local development and can be overridden through environment variables.

use crate::config::presence::PresenceConfig;
use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Top-level server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP/WebSocket listen port
    pub http_port: u16,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Presence store configuration
    pub presence: PresenceConfig,
    /// Media storage configuration
    pub media: MediaConfig,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database URL (SQLite path, e.g. `sqlite:./data/chat.db`)
    pub url: String,
}

/// Media storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    /// Root directory for stored attachments
    pub root_dir: PathBuf,
    /// Public URL prefix under which stored attachments are served
    pub base_url: String,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns a configuration error if a set variable fails to parse
    pub fn from_env() -> AppResult<Self> {
        let http_port = match env::var("HTTP_PORT") {
            Ok(value) => value
                .parse()
                .map_err(|e| AppError::config(format!("Invalid HTTP_PORT '{value}': {e}")))?,
            Err(_) => 8081,
        };

        Ok(Self {
            http_port,
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:./data/chat.db".into()),
            },
            presence: PresenceConfig::from_env(),
            media: MediaConfig {
                root_dir: PathBuf::from(
                    env::var("MEDIA_ROOT").unwrap_or_else(|_| "./data/media".into()),
                ),
                base_url: env::var("MEDIA_BASE_URL").unwrap_or_else(|_| "/media".into()),
            },
        })
    }

    /// Human-readable configuration summary for startup logging
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "VentureLink Chat Server Configuration:\n\
             - HTTP Port: {}\n\
             - Database: {}\n\
             - Presence Backend: {}\n\
             - Presence Session TTL: {}s\n\
             - Media Root: {}",
            self.http_port,
            self.database.url,
            if self.presence.redis_url.is_some() {
                "redis"
            } else {
                "memory"
            },
            self.presence.session_ttl_secs,
            self.media.root_dir.display(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_reports_backend() {
        let mut config = ServerConfig {
            http_port: 8081,
            database: DatabaseConfig {
                url: "sqlite::memory:".into(),
            },
            presence: PresenceConfig::default(),
            media: MediaConfig {
                root_dir: PathBuf::from("/tmp/media"),
                base_url: "/media".into(),
            },
        };
        assert!(config.summary().contains("memory"));

        config.presence.redis_url = Some("redis://localhost:6379".into());
        assert!(config.summary().contains("redis"));
    }
}
