// ABOUTME: Shared test fixtures for integration tests
// ABOUTME: Builds temp databases, seeded users, and a real chat server
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 VentureLink

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]
#![allow(dead_code)]

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use venturelink_chat::chat::ChatManager;
use venturelink_chat::config::environment::MediaConfig;
use venturelink_chat::config::presence::PresenceConfig;
use venturelink_chat::database::Database;
use venturelink_chat::media::LocalMediaStorage;
use venturelink_chat::models::{User, UserRole};
use venturelink_chat::presence::factory::Presence;
use venturelink_chat::router::BroadcastRouter;
use venturelink_chat::routes::{self, AppState};

/// Create a file-backed test database in its own temp directory.
/// The temp dir must outlive the database, so both are returned.
pub async fn create_test_database() -> Result<(Database, tempfile::TempDir)> {
    let temp_dir = tempfile::tempdir()?;
    let url = format!("sqlite:{}/chat-test.db", temp_dir.path().display());
    let database = Database::new(&url).await?;
    Ok((database, temp_dir))
}

/// Seed a user with a generated email
pub async fn create_test_user(database: &Database, name: &str) -> Result<User> {
    let email = format!("{name}-{}@example.com", uuid::Uuid::new_v4());
    database.create_user(&email, name, UserRole::Investor).await
}

/// Presence config suited to tests: in-memory, no background sweeper
pub fn test_presence_config() -> PresenceConfig {
    PresenceConfig {
        enable_background_cleanup: false,
        ..PresenceConfig::default()
    }
}

/// Assemble the application router over temp-dir storage, for oneshot
/// HTTP tests that never bind a listener
pub async fn create_test_app() -> Result<(axum::Router, Database, Vec<tempfile::TempDir>)> {
    let (database, db_dir) = create_test_database().await?;
    let media_dir = tempfile::tempdir()?;

    let presence = Presence::new(test_presence_config()).await?;
    let media = LocalMediaStorage::new(&MediaConfig {
        root_dir: media_dir.path().to_path_buf(),
        base_url: "/media".to_owned(),
    });

    let chat = ChatManager::new(
        database.clone(),
        presence,
        BroadcastRouter::new(),
        Arc::new(media),
        Duration::from_secs(5),
    );

    let app = routes::router(AppState {
        chat,
        database: database.clone(),
    });

    Ok((app, database, vec![db_dir, media_dir]))
}

/// A running chat server on an ephemeral port
pub struct TestServer {
    pub port: u16,
    pub database: Database,
    _db_dir: tempfile::TempDir,
    _media_dir: tempfile::TempDir,
    _handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    /// Boot the full application router on 127.0.0.1 with an in-memory
    /// presence backend and temp-dir media storage
    pub async fn start() -> Result<Self> {
        let (database, db_dir) = create_test_database().await?;
        let media_dir = tempfile::tempdir()?;

        let presence = Presence::new(test_presence_config()).await?;
        let media = LocalMediaStorage::new(&MediaConfig {
            root_dir: media_dir.path().to_path_buf(),
            base_url: "/media".to_owned(),
        });

        let chat = ChatManager::new(
            database.clone(),
            presence,
            BroadcastRouter::new(),
            Arc::new(media),
            Duration::from_secs(5),
        );

        let app = routes::router(AppState {
            chat,
            database: database.clone(),
        });

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let port = listener.local_addr()?.port();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Ok(Self {
            port,
            database,
            _db_dir: db_dir,
            _media_dir: media_dir,
            _handle: handle,
        })
    }

    /// WebSocket URL for a user's chat session
    pub fn ws_url(&self, user_id: i64) -> String {
        format!("ws://127.0.0.1:{}/ws/chat/{user_id}", self.port)
    }
}
