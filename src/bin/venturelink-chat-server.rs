// ABOUTME: Chat server binary, parsing CLI flags and launching the server
// ABOUTME: Wires logging, configuration, storage, and presence together
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 VentureLink

#![allow(clippy::doc_markdown)]

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use venturelink_chat::config::environment::ServerConfig;
use venturelink_chat::logging;
use venturelink_chat::server::ServerResources;

/// VentureLink real-time chat and presence server
#[derive(Parser)]
#[command(name = "venturelink-chat-server")]
#[command(about = "Real-time messaging and presence backend for VentureLink")]
#[command(version)]
struct Args {
    /// HTTP/WebSocket listen port (overrides HTTP_PORT)
    #[arg(long)]
    port: Option<u16>,

    /// Database URL (overrides DATABASE_URL)
    #[arg(long)]
    database_url: Option<String>,

    /// Media storage root directory (overrides MEDIA_ROOT)
    #[arg(long)]
    media_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    logging::init_from_env()?;

    let mut config = ServerConfig::from_env()?;
    if let Some(port) = args.port {
        config.http_port = port;
    }
    if let Some(database_url) = args.database_url {
        config.database.url = database_url;
    }
    if let Some(media_dir) = args.media_dir {
        config.media.root_dir = media_dir;
    }

    info!("{}", config.summary());

    let resources = ServerResources::new(config).await?;
    resources.run().await
}
