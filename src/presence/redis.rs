// ABOUTME: Redis presence implementation with connection pooling and TTL keys
// ABOUTME: Tracks per-user live-session sets for multi-instance deployments
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 VentureLink

use super::{sessions_key, status_key, PresenceProvider};
use crate::config::presence::{PresenceConfig, RedisConnectionConfig};
use crate::errors::{AppError, AppResult};
use crate::models::PresenceStatus;
use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use redis::AsyncCommands;
use std::str::FromStr;
use std::time::Duration;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Redis presence store with connection pooling.
///
/// Uses Redis `ConnectionManager` for automatic reconnection. Two keys exist
/// per user: a live-session set and a plain status key, both namespaced and
/// both carrying the session TTL while the user is online. The session set is
/// the source of truth; the status key exists for cheap point reads. When the
/// TTL lapses without a heartbeat the keys expire and the user reads as
/// offline, which is the desired crash behavior.
#[derive(Clone)]
pub struct RedisPresence {
    manager: ConnectionManager,
    session_ttl_secs: u64,
}

impl RedisPresence {
    /// Create new Redis presence instance
    ///
    /// # Errors
    ///
    /// Returns an error if the Redis connection fails
    async fn new_with_config(config: &PresenceConfig) -> AppResult<Self> {
        let redis_url = config
            .redis_url
            .as_ref()
            .ok_or_else(|| AppError::config("Redis URL is required for Redis presence backend"))?;

        let conn_config = &config.redis_connection;

        info!(
            "Connecting to Redis at {} (timeout={}s, response_timeout={}s, retries={})",
            redis_url,
            conn_config.connection_timeout_secs,
            conn_config.response_timeout_secs,
            conn_config.initial_connection_retries
        );

        let client = redis::Client::open(redis_url.as_str())
            .map_err(|e| AppError::internal(format!("Failed to create Redis client: {e}")))?;

        let manager = Self::connect_with_retry(&client, conn_config).await?;

        info!("Successfully connected to Redis");

        Ok(Self {
            manager,
            session_ttl_secs: config.session_ttl_secs,
        })
    }

    /// Connect to Redis with exponential backoff retry on failure
    async fn connect_with_retry(
        client: &redis::Client,
        conn_config: &RedisConnectionConfig,
    ) -> AppResult<ConnectionManager> {
        let manager_config = ConnectionManagerConfig::new()
            .set_connection_timeout(Duration::from_secs(conn_config.connection_timeout_secs))
            .set_response_timeout(Duration::from_secs(conn_config.response_timeout_secs))
            .set_number_of_retries(conn_config.reconnection_retries)
            .set_exponent_base(conn_config.retry_exponent_base)
            .set_max_delay(conn_config.max_retry_delay_ms);

        let max_retries = conn_config.initial_connection_retries;
        let max_delay_ms = conn_config.max_retry_delay_ms;

        let mut last_error = None;
        let mut delay_ms = conn_config.initial_retry_delay_ms;

        for attempt in 0..=max_retries {
            match ConnectionManager::new_with_config(client.clone(), manager_config.clone()).await {
                Ok(manager) => {
                    if attempt > 0 {
                        info!("Redis connection established after {} retries", attempt);
                    }
                    return Ok(manager);
                }
                Err(e) => {
                    last_error = Some(e);

                    if attempt < max_retries {
                        warn!(
                            "Redis connection attempt {}/{} failed, retrying in {}ms: {}",
                            attempt + 1,
                            max_retries + 1,
                            delay_ms,
                            last_error
                                .as_ref()
                                .map_or_else(|| "unknown".to_owned(), ToString::to_string)
                        );
                        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                        // Exponential backoff with cap
                        delay_ms = (delay_ms * 2).min(max_delay_ms);
                    }
                }
            }
        }

        Err(AppError::internal(format!(
            "Failed to connect to Redis after {} retries: {}",
            max_retries + 1,
            last_error.map_or_else(|| "unknown error".to_owned(), |e| e.to_string())
        )))
    }

    fn store_error(operation: &str, e: &redis::RedisError) -> AppError {
        error!("Redis {} operation failed: {}", operation, e);
        AppError::internal(format!("Presence store error: {e}"))
    }

    /// Session TTL in the signed form EXPIRE takes
    fn ttl_seconds(&self) -> i64 {
        i64::try_from(self.session_ttl_secs).unwrap_or(i64::MAX)
    }
}

#[async_trait::async_trait]
impl PresenceProvider for RedisPresence {
    async fn new(config: PresenceConfig) -> AppResult<Self>
    where
        Self: Sized,
    {
        Self::new_with_config(&config).await
    }

    async fn session_connected(
        &self,
        user_id: i64,
        session_id: Uuid,
    ) -> AppResult<PresenceStatus> {
        let sessions = sessions_key(user_id);
        let status = status_key(user_id);
        let mut conn = self.manager.clone();

        conn.sadd::<_, _, ()>(&sessions, session_id.to_string())
            .await
            .map_err(|e| Self::store_error("SADD", &e))?;
        conn.expire::<_, ()>(&sessions, self.ttl_seconds())
            .await
            .map_err(|e| Self::store_error("EXPIRE", &e))?;
        conn.set_ex::<_, _, ()>(
            &status,
            PresenceStatus::Online.as_str(),
            self.session_ttl_secs,
        )
        .await
        .map_err(|e| Self::store_error("SETEX", &e))?;

        Ok(PresenceStatus::Online)
    }

    async fn session_disconnected(
        &self,
        user_id: i64,
        session_id: Uuid,
    ) -> AppResult<PresenceStatus> {
        let sessions = sessions_key(user_id);
        let status = status_key(user_id);
        let mut conn = self.manager.clone();

        conn.srem::<_, _, ()>(&sessions, session_id.to_string())
            .await
            .map_err(|e| Self::store_error("SREM", &e))?;
        let remaining: i64 = conn
            .scard(&sessions)
            .await
            .map_err(|e| Self::store_error("SCARD", &e))?;

        if remaining > 0 {
            return Ok(PresenceStatus::Online);
        }

        // Last session gone: record offline durably (no TTL, last-known status)
        conn.set::<_, _, ()>(&status, PresenceStatus::Offline.as_str())
            .await
            .map_err(|e| Self::store_error("SET", &e))?;

        Ok(PresenceStatus::Offline)
    }

    async fn status(&self, user_id: i64) -> AppResult<PresenceStatus> {
        let mut conn = self.manager.clone();

        let value: Option<String> = conn
            .get(status_key(user_id))
            .await
            .map_err(|e| Self::store_error("GET", &e))?;

        match value {
            Some(raw) => Ok(PresenceStatus::from_str(&raw)
                .map_err(|e| AppError::internal(format!("Corrupt presence value: {e}")))?),
            // Missing key means unknown or expired; both read as offline
            None => Ok(PresenceStatus::Offline),
        }
    }

    async fn refresh(&self, user_id: i64, session_id: Uuid) -> AppResult<()> {
        let sessions = sessions_key(user_id);
        let mut conn = self.manager.clone();

        let is_member: bool = conn
            .sismember(&sessions, session_id.to_string())
            .await
            .map_err(|e| Self::store_error("SISMEMBER", &e))?;
        if !is_member {
            return Ok(());
        }

        conn.expire::<_, ()>(&sessions, self.ttl_seconds())
            .await
            .map_err(|e| Self::store_error("EXPIRE", &e))?;
        conn.set_ex::<_, _, ()>(
            status_key(user_id),
            PresenceStatus::Online.as_str(),
            self.session_ttl_secs,
        )
        .await
        .map_err(|e| Self::store_error("SETEX", &e))?;

        Ok(())
    }

    async fn health_check(&self) -> AppResult<()> {
        let mut conn = self.manager.clone();

        let response: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| Self::store_error("PING", &e))?;

        if response == "PONG" {
            Ok(())
        } else {
            Err(AppError::internal(format!(
                "Presence store error: unexpected PING response '{response}'"
            )))
        }
    }
}
