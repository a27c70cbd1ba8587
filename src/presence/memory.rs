// ABOUTME: In-memory presence implementation with per-session TTL tracking
// ABOUTME: Includes background cleanup task sweeping expired sessions
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 VentureLink

use super::PresenceProvider;
use crate::config::presence::PresenceConfig;
use crate::errors::AppResult;
use crate::models::PresenceStatus;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use uuid::Uuid;

type SessionMap = HashMap<i64, HashMap<Uuid, Instant>>;

/// In-memory presence store for single-process deployments.
///
/// Uses `Arc<RwLock<..>>` for shared state between session operations and the
/// background cleanup task. Each session entry holds its expiry instant;
/// entries past expiry count as gone even before the sweeper removes them, so
/// a killed process's sessions read as offline once the TTL elapses.
#[derive(Clone)]
pub struct InMemoryPresence {
    sessions: Arc<RwLock<SessionMap>>,
    session_ttl: Duration,
}

impl InMemoryPresence {
    fn new_with_config(config: &PresenceConfig) -> Self {
        let sessions: Arc<RwLock<SessionMap>> = Arc::new(RwLock::new(HashMap::new()));

        if config.enable_background_cleanup {
            // The sweeper holds only a Weak handle: clones of the store come
            // and go with every session, and the task must outlive all of
            // them, exiting once the last owner is gone
            let weak_sessions = Arc::downgrade(&sessions);
            let cleanup_interval = Duration::from_secs(config.cleanup_interval_secs);

            tokio::spawn(async move {
                let mut interval = tokio::time::interval(cleanup_interval);
                loop {
                    interval.tick().await;
                    let Some(sessions) = weak_sessions.upgrade() else {
                        tracing::debug!("Presence store dropped, cleanup task exiting");
                        break;
                    };
                    Self::cleanup_expired(&sessions).await;
                }
            });
        }

        Self {
            sessions,
            session_ttl: config.session_ttl(),
        }
    }

    /// Remove all expired sessions, and users whose session set became empty
    async fn cleanup_expired(sessions: &Arc<RwLock<SessionMap>>) {
        let now = Instant::now();
        let mut guard = sessions.write().await;

        let mut removed = 0usize;
        guard.retain(|_, user_sessions| {
            let before = user_sessions.len();
            user_sessions.retain(|_, expires_at| *expires_at > now);
            removed += before - user_sessions.len();
            !user_sessions.is_empty()
        });

        drop(guard);
        if removed > 0 {
            tracing::debug!("Cleaned up {} expired presence sessions", removed);
        }
    }

    fn live_count(user_sessions: &HashMap<Uuid, Instant>) -> usize {
        let now = Instant::now();
        user_sessions
            .values()
            .filter(|expires_at| **expires_at > now)
            .count()
    }
}

#[async_trait::async_trait]
impl PresenceProvider for InMemoryPresence {
    async fn new(config: PresenceConfig) -> AppResult<Self> {
        Ok(Self::new_with_config(&config))
    }

    async fn session_connected(
        &self,
        user_id: i64,
        session_id: Uuid,
    ) -> AppResult<PresenceStatus> {
        let expires_at = Instant::now() + self.session_ttl;
        self.sessions
            .write()
            .await
            .entry(user_id)
            .or_default()
            .insert(session_id, expires_at);

        Ok(PresenceStatus::Online)
    }

    async fn session_disconnected(
        &self,
        user_id: i64,
        session_id: Uuid,
    ) -> AppResult<PresenceStatus> {
        let mut guard = self.sessions.write().await;

        let Some(user_sessions) = guard.get_mut(&user_id) else {
            return Ok(PresenceStatus::Offline);
        };
        user_sessions.remove(&session_id);

        let status = if Self::live_count(user_sessions) == 0 {
            guard.remove(&user_id);
            PresenceStatus::Offline
        } else {
            PresenceStatus::Online
        };
        drop(guard);

        Ok(status)
    }

    async fn status(&self, user_id: i64) -> AppResult<PresenceStatus> {
        let guard = self.sessions.read().await;
        let status = match guard.get(&user_id) {
            Some(user_sessions) if Self::live_count(user_sessions) > 0 => PresenceStatus::Online,
            _ => PresenceStatus::Offline,
        };
        drop(guard);

        Ok(status)
    }

    async fn refresh(&self, user_id: i64, session_id: Uuid) -> AppResult<()> {
        let expires_at = Instant::now() + self.session_ttl;
        let mut guard = self.sessions.write().await;

        if let Some(user_sessions) = guard.get_mut(&user_id) {
            if let Some(expiry) = user_sessions.get_mut(&session_id) {
                *expiry = expires_at;
            }
        }
        drop(guard);

        Ok(())
    }

    async fn health_check(&self) -> AppResult<()> {
        // In-memory store is always healthy
        Ok(())
    }
}
