// ABOUTME: Presence factory for environment-based backend selection
// ABOUTME: Dispatches between Redis and in-memory backends behind one type
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 VentureLink

use super::{memory::InMemoryPresence, redis::RedisPresence, PresenceProvider};
use crate::config::presence::PresenceConfig;
use crate::errors::AppResult;
use crate::models::PresenceStatus;
use uuid::Uuid;

#[derive(Clone)]
enum Backend {
    Memory(InMemoryPresence),
    Redis(Box<RedisPresence>),
}

/// Unified presence interface over the configured backend.
///
/// `REDIS_URL` set selects the Redis backend (required for multi-instance
/// deployments where sessions live in different processes); otherwise the
/// in-memory backend serves single-process setups and tests.
#[derive(Clone)]
pub struct Presence {
    inner: Backend,
}

impl Presence {
    /// Create new presence store based on configuration
    ///
    /// # Errors
    ///
    /// Returns an error if backend initialization fails
    pub async fn new(config: PresenceConfig) -> AppResult<Self> {
        let inner = if config.redis_url.is_some() {
            tracing::info!("Initializing Redis presence backend");
            Backend::Redis(Box::new(RedisPresence::new(config).await?))
        } else {
            tracing::info!(
                "Initializing in-memory presence backend (session TTL: {}s)",
                config.session_ttl_secs
            );
            Backend::Memory(InMemoryPresence::new(config).await?)
        };

        Ok(Self { inner })
    }

    /// Register a live session; returns the user's status after the transition
    ///
    /// # Errors
    ///
    /// Returns an error if the store write fails
    pub async fn session_connected(
        &self,
        user_id: i64,
        session_id: Uuid,
    ) -> AppResult<PresenceStatus> {
        match &self.inner {
            Backend::Memory(p) => p.session_connected(user_id, session_id).await,
            Backend::Redis(p) => p.session_connected(user_id, session_id).await,
        }
    }

    /// Remove a session; offline only when it was the user's last one
    ///
    /// # Errors
    ///
    /// Returns an error if the store write fails
    pub async fn session_disconnected(
        &self,
        user_id: i64,
        session_id: Uuid,
    ) -> AppResult<PresenceStatus> {
        match &self.inner {
            Backend::Memory(p) => p.session_disconnected(user_id, session_id).await,
            Backend::Redis(p) => p.session_disconnected(user_id, session_id).await,
        }
    }

    /// Current status for a user; unknown users are offline
    ///
    /// # Errors
    ///
    /// Returns an error if the store read fails
    pub async fn status(&self, user_id: i64) -> AppResult<PresenceStatus> {
        match &self.inner {
            Backend::Memory(p) => p.status(user_id).await,
            Backend::Redis(p) => p.status(user_id).await,
        }
    }

    /// Heartbeat: refresh the TTL on a live session's presence entries
    ///
    /// # Errors
    ///
    /// Returns an error if the refresh fails
    pub async fn refresh(&self, user_id: i64, session_id: Uuid) -> AppResult<()> {
        match &self.inner {
            Backend::Memory(p) => p.refresh(user_id, session_id).await,
            Backend::Redis(p) => p.refresh(user_id, session_id).await,
        }
    }

    /// Verify the backend is healthy
    ///
    /// # Errors
    ///
    /// Returns an error if the health check fails
    pub async fn health_check(&self) -> AppResult<()> {
        match &self.inner {
            Backend::Memory(p) => p.health_check().await,
            Backend::Redis(p) => p.health_check().await,
        }
    }
}
