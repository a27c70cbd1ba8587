// ABOUTME: Integration tests for the in-memory presence backend
// ABOUTME: Covers multi-session semantics, TTL expiry, and the factory
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 VentureLink

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use anyhow::Result;
use std::time::Duration;
use uuid::Uuid;
use venturelink_chat::config::presence::PresenceConfig;
use venturelink_chat::models::PresenceStatus;
use venturelink_chat::presence::factory::Presence;
use venturelink_chat::presence::memory::InMemoryPresence;
use venturelink_chat::presence::PresenceProvider;

async fn memory_presence() -> Result<InMemoryPresence> {
    Ok(InMemoryPresence::new(common::test_presence_config()).await?)
}

#[tokio::test]
async fn test_unknown_user_reads_offline() -> Result<()> {
    let presence = memory_presence().await?;
    assert_eq!(presence.status(42).await?, PresenceStatus::Offline);
    Ok(())
}

#[tokio::test]
async fn test_connect_and_disconnect_cycle() -> Result<()> {
    let presence = memory_presence().await?;
    let session = Uuid::new_v4();

    assert_eq!(
        presence.session_connected(1, session).await?,
        PresenceStatus::Online
    );
    assert_eq!(presence.status(1).await?, PresenceStatus::Online);

    assert_eq!(
        presence.session_disconnected(1, session).await?,
        PresenceStatus::Offline
    );
    assert_eq!(presence.status(1).await?, PresenceStatus::Offline);
    Ok(())
}

#[tokio::test]
async fn test_second_device_keeps_user_online() -> Result<()> {
    let presence = memory_presence().await?;
    let phone = Uuid::new_v4();
    let laptop = Uuid::new_v4();

    presence.session_connected(1, phone).await?;
    presence.session_connected(1, laptop).await?;

    // Closing one device leaves the user online through the other
    assert_eq!(
        presence.session_disconnected(1, phone).await?,
        PresenceStatus::Online
    );
    assert_eq!(presence.status(1).await?, PresenceStatus::Online);

    assert_eq!(
        presence.session_disconnected(1, laptop).await?,
        PresenceStatus::Offline
    );
    Ok(())
}

#[tokio::test]
async fn test_disconnect_of_unknown_session_is_harmless() -> Result<()> {
    let presence = memory_presence().await?;

    assert_eq!(
        presence.session_disconnected(1, Uuid::new_v4()).await?,
        PresenceStatus::Offline
    );

    // A stray disconnect must not take down another live session
    let session = Uuid::new_v4();
    presence.session_connected(2, session).await?;
    presence.session_disconnected(2, Uuid::new_v4()).await?;
    assert_eq!(presence.status(2).await?, PresenceStatus::Online);
    Ok(())
}

#[tokio::test]
async fn test_expired_session_reads_offline_without_sweeper() -> Result<()> {
    let config = PresenceConfig {
        session_ttl_secs: 0,
        enable_background_cleanup: false,
        ..PresenceConfig::default()
    };
    let presence = InMemoryPresence::new(config).await?;

    presence.session_connected(1, Uuid::new_v4()).await?;

    // TTL of zero expires the entry immediately, no sweep required
    assert_eq!(presence.status(1).await?, PresenceStatus::Offline);
    Ok(())
}

#[tokio::test]
async fn test_refresh_only_touches_live_sessions() -> Result<()> {
    let presence = memory_presence().await?;
    let session = Uuid::new_v4();

    // Refreshing a session that never connected is a no-op
    presence.refresh(1, session).await?;
    assert_eq!(presence.status(1).await?, PresenceStatus::Offline);

    presence.session_connected(1, session).await?;
    presence.refresh(1, session).await?;
    assert_eq!(presence.status(1).await?, PresenceStatus::Online);
    Ok(())
}

#[tokio::test]
async fn test_cleanup_task_survives_clone_drop() -> Result<()> {
    let metrics = tokio::runtime::Handle::current().metrics();
    let baseline = metrics.num_alive_tasks();

    let config = PresenceConfig {
        cleanup_interval_secs: 1,
        enable_background_cleanup: true,
        ..PresenceConfig::default()
    };
    let presence = InMemoryPresence::new(config).await?;
    assert_eq!(metrics.num_alive_tasks(), baseline + 1);

    // Every session consumes a clone of the store; a session teardown must
    // not take the shared sweeper down with it
    drop(presence.clone());
    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert_eq!(metrics.num_alive_tasks(), baseline + 1);

    let session = Uuid::new_v4();
    presence.session_connected(1, session).await?;
    assert_eq!(presence.status(1).await?, PresenceStatus::Online);

    // Once the last owner is gone the sweeper exits at its next tick
    drop(presence);
    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert_eq!(metrics.num_alive_tasks(), baseline);
    Ok(())
}

#[tokio::test]
async fn test_factory_selects_memory_backend_without_redis_url() -> Result<()> {
    let presence = Presence::new(common::test_presence_config()).await?;
    let session = Uuid::new_v4();

    presence.health_check().await?;
    assert_eq!(
        presence.session_connected(7, session).await?,
        PresenceStatus::Online
    );
    assert_eq!(presence.status(7).await?, PresenceStatus::Online);
    assert_eq!(
        presence.session_disconnected(7, session).await?,
        PresenceStatus::Offline
    );
    Ok(())
}
