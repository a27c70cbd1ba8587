// ABOUTME: Wire protocol for chat sessions, inbound and outbound event shapes
// ABOUTME: Inbound events are tagged by content_type, outbound by type
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 VentureLink

use crate::errors::{AppError, AppResult};
use crate::models::{Message, PresenceStatus};
use serde::{Deserialize, Serialize};

/// An event received from a connected client.
///
/// The `content_type` field selects the variant. Anything that does not
/// parse into one of these shapes is answered with an [`OutboundEvent::Error`]
/// and the session continues.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(tag = "content_type", rename_all = "snake_case")]
pub enum InboundEvent {
    /// Plain text message to another user
    Message {
        /// Claimed sender, must match the session user
        sender_id: i64,
        /// Recipient user id
        receiver_id: i64,
        /// Text body
        message: String,
    },
    /// Voice recording to another user, carried inline as base64
    Audio {
        /// Claimed sender, must match the session user
        sender_id: i64,
        /// Recipient user id
        receiver_id: i64,
        /// Base64-encoded audio payload
        audio_data: String,
    },
    /// Ask for another user's current presence
    StatusRequest {
        /// User whose presence is being asked about
        user_id: i64,
    },
}

impl InboundEvent {
    /// Parse an inbound frame.
    ///
    /// # Errors
    ///
    /// Returns an invalid-format error for frames that are not valid JSON
    /// or do not match any known event shape
    pub fn parse(raw: &str) -> AppResult<Self> {
        serde_json::from_str(raw)
            .map_err(|e| AppError::invalid_format(format!("Malformed chat event: {e}")))
    }
}

/// An event pushed to a connected client.
///
/// The `type` field names the variant on the wire.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundEvent {
    /// A persisted message delivered into the recipient's (and sender's)
    /// personal groups. All three body fields are present on the wire;
    /// the two that do not match `content_type` are null.
    ChatMessage {
        /// Message row id
        id: i64,
        /// Sending user id
        sender: i64,
        /// Kind of content
        content_type: crate::models::ContentType,
        /// Text body or null
        content: Option<String>,
        /// Image reference or null
        image: Option<String>,
        /// Voice recording reference or null
        voice: Option<String>,
        /// Delivery status at publish time
        status: crate::models::MessageStatus,
        /// Creation time, RFC 3339
        timestamp: String,
    },
    /// Unsolicited presence change for a user of interest
    StatusUpdate {
        /// User whose presence changed
        user_id: i64,
        /// New status
        status: PresenceStatus,
    },
    /// Direct answer to a status request
    StatusResponse {
        /// User the request asked about
        user_id: i64,
        /// Current status
        status: PresenceStatus,
    },
    /// Acknowledgement of a frame that could not be processed
    Error {
        /// Human-readable reason
        message: String,
    },
}

impl OutboundEvent {
    /// Wire form of a persisted message
    #[must_use]
    pub fn chat_message(message: &Message) -> Self {
        Self::ChatMessage {
            id: message.id,
            sender: message.sender_id,
            content_type: message.content_type,
            content: message.content.clone(),
            image: message.image.clone(),
            voice: message.voice.clone(),
            status: message.status,
            timestamp: message.timestamp.to_rfc3339(),
        }
    }

    /// Presence change notification
    #[must_use]
    pub const fn status_update(user_id: i64, status: PresenceStatus) -> Self {
        Self::StatusUpdate { user_id, status }
    }

    /// Answer to a presence query
    #[must_use]
    pub const fn status_response(user_id: i64, status: PresenceStatus) -> Self {
        Self::StatusResponse { user_id, status }
    }

    /// Error acknowledgement for a rejected frame
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// Serialize for the wire.
    ///
    /// # Errors
    ///
    /// Returns a serialization error if JSON encoding fails
    pub fn to_json(&self) -> AppResult<String> {
        serde_json::to_string(self)
            .map_err(|e| AppError::serialization(format!("Failed to encode chat event: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ContentType, MessageStatus};
    use chrono::Utc;

    #[test]
    fn test_parse_text_message_event() {
        let raw = r#"{"content_type":"message","sender_id":1,"receiver_id":2,"message":"hi"}"#;
        let event = InboundEvent::parse(raw).unwrap();
        assert_eq!(
            event,
            InboundEvent::Message {
                sender_id: 1,
                receiver_id: 2,
                message: "hi".to_owned(),
            }
        );
    }

    #[test]
    fn test_parse_audio_event() {
        let raw = r#"{"content_type":"audio","sender_id":3,"receiver_id":4,"audio_data":"AAAA"}"#;
        let event = InboundEvent::parse(raw).unwrap();
        assert!(matches!(event, InboundEvent::Audio { receiver_id: 4, .. }));
    }

    #[test]
    fn test_parse_status_request() {
        let raw = r#"{"content_type":"status_request","user_id":9}"#;
        assert_eq!(
            InboundEvent::parse(raw).unwrap(),
            InboundEvent::StatusRequest { user_id: 9 }
        );
    }

    #[test]
    fn test_malformed_frames_are_rejected() {
        assert!(InboundEvent::parse("not json").is_err());
        assert!(InboundEvent::parse(r#"{"content_type":"message"}"#).is_err());
        assert!(InboundEvent::parse(r#"{"content_type":"selfie","user_id":1}"#).is_err());
        assert!(InboundEvent::parse(r"{}").is_err());
    }

    #[test]
    fn test_chat_message_keeps_null_fields_on_wire() {
        let message = Message {
            id: 10,
            conversation_id: 1,
            sender_id: 2,
            content_type: ContentType::Text,
            content: Some("hello".to_owned()),
            image: None,
            voice: None,
            status: MessageStatus::Sent,
            timestamp: Utc::now(),
        };

        let json = OutboundEvent::chat_message(&message).to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["type"], "chat_message");
        assert_eq!(value["content"], "hello");
        assert!(value["image"].is_null());
        assert!(value["voice"].is_null());
        assert_eq!(value["status"], "sent");
    }

    #[test]
    fn test_status_events_tag() {
        let json = OutboundEvent::status_update(5, PresenceStatus::Offline)
            .to_json()
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["type"], "status_update");
        assert_eq!(value["status"], "offline");

        let json = OutboundEvent::status_response(5, PresenceStatus::Online)
            .to_json()
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["type"], "status_response");
        assert_eq!(value["user_id"], 5);
    }
}
