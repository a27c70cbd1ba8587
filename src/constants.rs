// ABOUTME: Application-wide constants for presence TTLs, group naming, and limits
// ABOUTME: Central place for tunable defaults shared by config and subsystems
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 VentureLink

//! Application-wide constants

/// Service identity used in logs and startup banners
pub mod service_names {
    /// Canonical service name
    pub const CHAT_SERVER: &str = "venturelink-chat-server";
}

/// Presence store tuning
pub mod presence {
    /// Namespace prefix for all presence keys in the fast store
    pub const PRESENCE_KEY_PREFIX: &str = "venturelink:presence:";

    /// Default TTL for a live session's presence keys, in seconds.
    /// An abrupt process kill self-heals to offline once this elapses.
    pub const DEFAULT_SESSION_TTL_SECS: u64 = 60;

    /// Default heartbeat interval refreshing presence TTLs, in seconds.
    /// Must be comfortably below `DEFAULT_SESSION_TTL_SECS`.
    pub const DEFAULT_HEARTBEAT_SECS: u64 = 20;

    /// Default sweep interval for the in-memory backend's expired-session
    /// cleanup task, in seconds
    pub const DEFAULT_CLEANUP_INTERVAL_SECS: u64 = 30;
}

/// Redis connection defaults
pub mod redis {
    /// Connection timeout in seconds
    pub const CONNECTION_TIMEOUT_SECS: u64 = 5;
    /// Response/command timeout in seconds
    pub const RESPONSE_TIMEOUT_SECS: u64 = 3;
    /// Reconnection retries after a connection drop
    pub const RECONNECTION_RETRIES: usize = 6;
    /// Exponential backoff base for retry delays
    pub const RETRY_EXPONENT_BASE: u64 = 2;
    /// Maximum retry delay in milliseconds
    pub const MAX_RETRY_DELAY_MS: u64 = 10_000;
    /// Retries for the initial connection at startup
    pub const INITIAL_CONNECTION_RETRIES: u32 = 5;
    /// Initial retry delay in milliseconds
    pub const INITIAL_RETRY_DELAY_MS: u64 = 500;
}

/// Broadcast router naming
pub mod groups {
    /// Prefix for per-user personal groups
    pub const USER_GROUP_PREFIX: &str = "user:";
}

/// WebSocket close codes in the application-defined 4000-4999 range
pub mod close_codes {
    /// Connecting user id does not resolve to a known user
    pub const USER_NOT_FOUND: u16 = 4404;
    /// Session setup failed after the user was resolved
    pub const SETUP_FAILED: u16 = 4500;
}

/// Protocol and storage limits
pub mod limits {
    /// Maximum accepted inbound text-message length, in bytes
    pub const MAX_MESSAGE_BYTES: usize = 8 * 1024;

    /// Maximum accepted decoded audio payload, in bytes
    pub const MAX_AUDIO_BYTES: usize = 5 * 1024 * 1024;
}
