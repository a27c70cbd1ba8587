// ABOUTME: Core data models for conversations, messages, users, and presence
// ABOUTME: Defines the enums and invariants shared by storage, protocol, and sessions
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 VentureLink

//! # Data Models
//!
//! Core data structures for the chat subsystem.
//!
//! ## Invariants
//!
//! - A conversation holds exactly one row per unordered user pair; the pair
//!   is canonicalized at write time so `user_a <= user_b` always holds.
//! - A message populates exactly one of text content or an attachment
//!   reference, consistent with its content type.
//! - Message status only moves forward: sent → delivered → read.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;

/// A platform user, as seen by the chat subsystem.
///
/// Account management lives in the user service; chat only needs identity,
/// display data, and the active flag for connection admission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique user id assigned by the user service
    pub id: i64,
    /// Login email, unique across the platform
    pub email: String,
    /// Display name
    pub full_name: String,
    /// Platform role
    pub role: UserRole,
    /// Blocked accounts cannot open chat sessions
    pub is_active: bool,
    /// Account creation time
    pub created_at: DateTime<Utc>,
}

/// Platform role of a user
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
#[derive(Default)]
pub enum UserRole {
    /// Investor account
    #[default]
    Investor,
    /// Business/startup account
    Business,
    /// Platform administrator
    Admin,
}

impl UserRole {
    /// Convert to string for database storage
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Investor => "investor",
            Self::Business => "business",
            Self::Admin => "admin",
        }
    }
}

impl FromStr for UserRole {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "investor" => Ok(Self::Investor),
            "business" => Ok(Self::Business),
            "admin" => Ok(Self::Admin),
            _ => Err(AppError::invalid_input(format!("Invalid user role: {s}"))),
        }
    }
}

impl Display for UserRole {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// A conversation between two users.
///
/// Exactly one row exists per unordered pair; `user_a` is always the smaller
/// id so concurrent first contact from both directions lands on the same row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    /// Row id
    pub id: i64,
    /// Smaller user id of the pair
    pub user_a: i64,
    /// Larger user id of the pair
    pub user_b: i64,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Refreshed on every message write
    pub last_updated: DateTime<Utc>,
}

impl Conversation {
    /// Canonical storage order for an unordered user pair
    #[must_use]
    pub const fn canonical_pair(a: i64, b: i64) -> (i64, i64) {
        if a <= b {
            (a, b)
        } else {
            (b, a)
        }
    }

    /// The other participant of this conversation
    #[must_use]
    pub const fn partner_of(&self, user_id: i64) -> i64 {
        if self.user_a == user_id {
            self.user_b
        } else {
            self.user_a
        }
    }
}

/// Kind of content a message carries
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    /// Plain text body
    Text,
    /// Image attachment
    Image,
    /// Voice recording attachment
    Voice,
}

impl ContentType {
    /// Convert to string for database storage
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::Voice => "voice",
        }
    }
}

impl FromStr for ContentType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(Self::Text),
            "image" => Ok(Self::Image),
            "voice" => Ok(Self::Voice),
            _ => Err(AppError::invalid_input(format!(
                "Invalid content type: {s}"
            ))),
        }
    }
}

impl Display for ContentType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// Delivery status of a message
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
#[derive(Default)]
pub enum MessageStatus {
    /// Persisted, not yet acknowledged by the recipient device
    #[default]
    Sent,
    /// Acknowledged by at least one recipient device
    Delivered,
    /// Seen by the recipient
    Read,
}

impl MessageStatus {
    /// Convert to string for database storage
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Sent => "sent",
            Self::Delivered => "delivered",
            Self::Read => "read",
        }
    }

    /// Whether moving from `self` to `next` is a forward transition.
    /// Status never regresses; read implies delivered.
    #[must_use]
    pub const fn can_advance_to(&self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Sent, Self::Delivered | Self::Read) | (Self::Delivered, Self::Read)
        )
    }
}

impl FromStr for MessageStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sent" => Ok(Self::Sent),
            "delivered" => Ok(Self::Delivered),
            "read" => Ok(Self::Read),
            _ => Err(AppError::invalid_input(format!(
                "Invalid message status: {s}"
            ))),
        }
    }
}

impl Display for MessageStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// Payload for a new message, encoding the exactly-one-of invariant
/// between text content and attachment references
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageBody {
    /// Plain text body
    Text(String),
    /// Stored image reference
    Image(String),
    /// Stored voice recording reference
    Voice(String),
}

impl MessageBody {
    /// The content type this body maps to
    #[must_use]
    pub const fn content_type(&self) -> ContentType {
        match self {
            Self::Text(_) => ContentType::Text,
            Self::Image(_) => ContentType::Image,
            Self::Voice(_) => ContentType::Voice,
        }
    }
}

/// A single message within a conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Row id
    pub id: i64,
    /// Owning conversation
    pub conversation_id: i64,
    /// Sending user
    pub sender_id: i64,
    /// Kind of content carried
    pub content_type: ContentType,
    /// Text body, present iff `content_type` is text
    pub content: Option<String>,
    /// Image reference, present iff `content_type` is image
    pub image: Option<String>,
    /// Voice recording reference, present iff `content_type` is voice
    pub voice: Option<String>,
    /// Delivery status
    pub status: MessageStatus,
    /// Set at creation, immutable afterwards
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// The populated content or attachment reference for this message
    #[must_use]
    pub fn display_content(&self) -> Option<&str> {
        match self.content_type {
            ContentType::Text => self.content.as_deref(),
            ContentType::Image => self.image.as_deref(),
            ContentType::Voice => self.voice.as_deref(),
        }
    }
}

/// Online/offline state of a user
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
#[derive(Default)]
pub enum PresenceStatus {
    /// At least one live session
    Online,
    /// No live sessions; also the default for unknown users
    #[default]
    Offline,
}

impl PresenceStatus {
    /// Convert to string for storage
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::Offline => "offline",
        }
    }
}

impl FromStr for PresenceStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "online" => Ok(Self::Online),
            "offline" => Ok(Self::Offline),
            _ => Err(AppError::invalid_input(format!(
                "Invalid presence status: {s}"
            ))),
        }
    }
}

impl Display for PresenceStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}
