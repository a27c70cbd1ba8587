// ABOUTME: Main library entry point for the VentureLink chat backend
// ABOUTME: Provides real-time messaging, presence tracking, and broadcast fan-out
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 VentureLink

#![deny(unsafe_code)]

//! # VentureLink Chat Server
//!
//! Real-time chat backend for the VentureLink startup/investor networking
//! platform. Clients connect over WebSocket, exchange text and voice messages,
//! and observe each other's online status.
//!
//! ## Architecture
//!
//! The server follows a modular architecture:
//! - **Models**: Conversation, message, and presence data structures
//! - **Database**: Durable conversation/message storage over `sqlx`
//! - **Presence**: Fast online/offline tracking with pluggable backends
//!   (Redis for multi-instance deployments, in-memory for single process)
//! - **Router**: Group-based broadcast fan-out across live sessions
//! - **Chat**: Per-socket session lifecycle and event handling
//! - **Routes**: Axum WebSocket and HTTP endpoints
//!
//! ## Delivery contract
//!
//! Messages are persisted before they are published, so a client that queries
//! conversation history immediately after receiving a live event always sees
//! that event. Within one group, events from a single publisher arrive in
//! send order; there is no cross-group ordering guarantee.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use venturelink_chat::config::environment::ServerConfig;
//! use venturelink_chat::errors::AppResult;
//!
//! fn main() -> AppResult<()> {
//!     let config = ServerConfig::from_env()?;
//!     println!("VentureLink chat server configured with port: HTTP={}",
//!              config.http_port);
//!     Ok(())
//! }
//! ```

/// Per-socket connection sessions and the message/presence protocol handler
pub mod chat;
/// Configuration management
pub mod config;
/// Application-wide constants
pub mod constants;
/// Durable conversation and message storage
pub mod database;
/// Unified error handling
pub mod errors;
/// Logging configuration
pub mod logging;
/// Media blob storage for voice and image attachments
pub mod media;
/// Core data models
pub mod models;
/// Online/offline presence tracking with pluggable backends
pub mod presence;
/// Inbound/outbound wire protocol types
pub mod protocol;
/// Group-based broadcast fan-out
pub mod router;
/// HTTP and WebSocket route handlers
pub mod routes;
/// Server resources and startup
pub mod server;
