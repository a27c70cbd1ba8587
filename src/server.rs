// ABOUTME: Server assembly and lifecycle, wiring resources into the router
// ABOUTME: Binds the listener and runs axum with graceful shutdown
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 VentureLink

use crate::chat::ChatManager;
use crate::config::environment::ServerConfig;
use crate::database::Database;
use crate::media::LocalMediaStorage;
use crate::presence::factory::Presence;
use crate::router::BroadcastRouter;
use crate::routes::{self, AppState};
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

/// Everything the route handlers share, built once at startup
#[derive(Clone)]
pub struct ServerResources {
    /// Loaded configuration
    pub config: ServerConfig,
    /// Durable storage
    pub database: Database,
    /// Chat session coordinator
    pub chat: ChatManager,
}

impl ServerResources {
    /// Connect to the backing stores and assemble the chat stack
    ///
    /// # Errors
    ///
    /// Returns an error if the database or presence backend cannot be
    /// initialized
    pub async fn new(config: ServerConfig) -> Result<Self> {
        let database = Database::new(&config.database.url)
            .await
            .context("Failed to initialize database")?;
        info!("Database ready at {}", config.database.url);

        let presence = Presence::new(config.presence.clone())
            .await
            .context("Failed to initialize presence store")?;

        let chat = ChatManager::new(
            database.clone(),
            presence,
            BroadcastRouter::new(),
            Arc::new(LocalMediaStorage::new(&config.media)),
            config.presence.heartbeat_interval(),
        );

        Ok(Self {
            config,
            database,
            chat,
        })
    }

    /// Bind the listener and serve until ctrl-c
    ///
    /// # Errors
    ///
    /// Returns an error if binding or serving fails
    pub async fn run(self) -> Result<()> {
        let addr = format!("0.0.0.0:{}", self.config.http_port);
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .with_context(|| format!("Failed to bind {addr}"))?;

        info!("Chat server listening on {}", addr);

        let app = routes::router(AppState {
            chat: self.chat,
            database: self.database,
        });

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("Server error")?;

        info!("Chat server shut down cleanly");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    } else {
        info!("Shutdown signal received");
    }
}
