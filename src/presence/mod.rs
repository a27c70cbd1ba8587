// ABOUTME: Presence store abstraction answering "is user X online" cheaply
// ABOUTME: Pluggable backend support (in-memory, Redis) with session-set semantics
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 VentureLink

/// Presence factory for environment-based backend selection
pub mod factory;
/// In-memory presence implementation
pub mod memory;
/// Redis presence implementation
pub mod redis;

use crate::config::presence::PresenceConfig;
use crate::errors::AppResult;
use uuid::Uuid;

use crate::models::PresenceStatus;

/// Presence provider trait for pluggable backend implementations.
///
/// Presence is tracked per session, not per user: a user is online while at
/// least one of their sessions is live, so closing one device of a
/// multi-device user never clobbers the other's online status. Entries carry
/// a TTL refreshed by a heartbeat, so an abrupt process kill self-heals to
/// offline without relying on disconnect handlers running.
#[async_trait::async_trait]
pub trait PresenceProvider: Send + Sync + Clone {
    /// Create new presence store instance with configuration
    ///
    /// # Errors
    ///
    /// Returns an error if backend initialization fails
    async fn new(config: PresenceConfig) -> AppResult<Self>
    where
        Self: Sized;

    /// Register a live session for a user. Returns the user's status after
    /// the transition (always online).
    ///
    /// # Errors
    ///
    /// Returns an error if the store write fails
    async fn session_connected(
        &self,
        user_id: i64,
        session_id: Uuid,
    ) -> AppResult<PresenceStatus>;

    /// Remove a session for a user. Returns the status after the transition:
    /// offline only when this was the user's last live session.
    ///
    /// # Errors
    ///
    /// Returns an error if the store write fails
    async fn session_disconnected(
        &self,
        user_id: i64,
        session_id: Uuid,
    ) -> AppResult<PresenceStatus>;

    /// Current status for a user. Unknown users are offline, not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the store read fails
    async fn status(&self, user_id: i64) -> AppResult<PresenceStatus>;

    /// Heartbeat: refresh the TTL on a live session's presence entries
    ///
    /// # Errors
    ///
    /// Returns an error if the refresh fails
    async fn refresh(&self, user_id: i64, session_id: Uuid) -> AppResult<()>;

    /// Verify the backend is healthy
    ///
    /// # Errors
    ///
    /// Returns an error if the health check fails
    async fn health_check(&self) -> AppResult<()>;
}

/// Build the namespaced fast-store key for a user's status
#[must_use]
pub fn status_key(user_id: i64) -> String {
    format!(
        "{}user:{user_id}:status",
        crate::constants::presence::PRESENCE_KEY_PREFIX
    )
}

/// Build the namespaced fast-store key for a user's live-session set
#[must_use]
pub fn sessions_key(user_id: i64) -> String {
    format!(
        "{}user:{user_id}:sessions",
        crate::constants::presence::PRESENCE_KEY_PREFIX
    )
}
