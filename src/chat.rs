// ABOUTME: WebSocket chat session lifecycle, event dispatch, and fan-out
// ABOUTME: Ties together storage, presence, media, and the broadcast router
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 VentureLink

//! # Chat Sessions
//!
//! One [`ChatManager::handle_connection`] call owns one WebSocket session
//! from admission to teardown. The ordering contract is persist-before-
//! publish: a message reaches the database before any session hears about
//! it, so a crash between the two steps loses a notification, never a
//! message.

use crate::constants::close_codes;
use crate::constants::limits::MAX_MESSAGE_BYTES;
use crate::database::Database;
use crate::errors::{AppError, AppResult};
use crate::media::MediaStorage;
use crate::models::{MessageBody, PresenceStatus};
use crate::presence::factory::Presence;
use crate::protocol::{InboundEvent, OutboundEvent};
use crate::router::{user_group, BroadcastRouter};
use axum::extract::ws::{CloseFrame, Message as WsMessage, WebSocket};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use futures_util::{SinkExt, StreamExt};
use std::borrow::Cow;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Coordinates chat sessions over shared storage, presence, and routing
#[derive(Clone)]
pub struct ChatManager {
    database: Database,
    presence: Presence,
    router: BroadcastRouter,
    media: Arc<dyn MediaStorage>,
    heartbeat: std::time::Duration,
}

impl ChatManager {
    /// Create a manager over the shared server resources
    #[must_use]
    pub fn new(
        database: Database,
        presence: Presence,
        router: BroadcastRouter,
        media: Arc<dyn MediaStorage>,
        heartbeat: std::time::Duration,
    ) -> Self {
        Self {
            database,
            presence,
            router,
            media,
            heartbeat,
        }
    }

    /// Shared broadcast router, for callers that publish outside a session
    #[must_use]
    pub const fn router(&self) -> &BroadcastRouter {
        &self.router
    }

    /// Shared presence store
    #[must_use]
    pub const fn presence(&self) -> &Presence {
        &self.presence
    }

    /// Drive one WebSocket session to completion.
    ///
    /// Unknown or deactivated users are closed immediately with an
    /// application close code; everyone else gets a session that survives
    /// malformed frames and store hiccups until the peer disconnects.
    pub async fn handle_connection(self, mut socket: WebSocket, user_id: i64) {
        match self.database.get_user(user_id).await {
            Ok(Some(user)) if user.is_active => {}
            Ok(_) => {
                debug!("Rejecting chat session for unknown user {}", user_id);
                Self::close_with(&mut socket, close_codes::USER_NOT_FOUND, "user not found")
                    .await;
                return;
            }
            Err(e) => {
                error!("User lookup failed for chat session {}: {}", user_id, e);
                Self::close_with(&mut socket, close_codes::SETUP_FAILED, "session setup failed")
                    .await;
                return;
            }
        }

        let session_id = Uuid::new_v4();
        info!("Chat session {} opened for user {}", session_id, user_id);

        let (mut ws_tx, mut ws_rx) = socket.split();
        let (event_tx, mut event_rx) = mpsc::unbounded_channel::<OutboundEvent>();

        // Writer task: the only place that touches the sink, so fan-out
        // from other sessions never interleaves partial frames
        let writer = tokio::spawn(async move {
            while let Some(event) = event_rx.recv().await {
                let json = match event.to_json() {
                    Ok(json) => json,
                    Err(e) => {
                        error!("Failed to encode outbound chat event: {}", e);
                        continue;
                    }
                };
                if ws_tx.send(WsMessage::Text(json)).await.is_err() {
                    break;
                }
            }
        });

        let group = user_group(user_id);
        self.router.join(&group, session_id, event_tx.clone()).await;
        self.announce_presence_change(user_id, session_id, true).await;

        let mut heartbeat = tokio::time::interval(self.heartbeat);
        heartbeat.tick().await; // first tick fires immediately

        loop {
            tokio::select! {
                _ = heartbeat.tick() => {
                    if let Err(e) = self.presence.refresh(user_id, session_id).await {
                        warn!("Presence refresh failed for session {}: {}", session_id, e);
                    }
                }
                frame = ws_rx.next() => {
                    match frame {
                        Some(Ok(WsMessage::Text(raw))) => {
                            self.handle_frame(user_id, &raw, &event_tx).await;
                        }
                        Some(Ok(WsMessage::Close(_))) | None => break,
                        Some(Ok(_)) => {} // ping/pong/binary frames are ignored
                        Some(Err(e)) => {
                            debug!("Chat session {} socket error: {}", session_id, e);
                            break;
                        }
                    }
                }
            }
        }

        // Teardown is best-effort in total: every step runs even if an
        // earlier one fails
        self.router.leave(&group, session_id).await;
        self.announce_presence_change(user_id, session_id, false).await;
        writer.abort();

        info!("Chat session {} closed for user {}", session_id, user_id);
    }

    /// Process one inbound frame. Failures are acknowledged with an error
    /// event on this session; the session itself continues.
    async fn handle_frame(
        &self,
        user_id: i64,
        raw: &str,
        event_tx: &mpsc::UnboundedSender<OutboundEvent>,
    ) {
        let event = match InboundEvent::parse(raw) {
            Ok(event) => event,
            Err(e) => {
                debug!("Rejecting malformed frame from user {}: {}", user_id, e);
                let _ = event_tx.send(OutboundEvent::error(e.message));
                return;
            }
        };

        let outcome = match event {
            InboundEvent::Message {
                sender_id,
                receiver_id,
                message,
            } => {
                self.send_message(user_id, sender_id, receiver_id, MessageBody::Text(message))
                    .await
            }
            InboundEvent::Audio {
                sender_id,
                receiver_id,
                audio_data,
            } => {
                self.send_audio(user_id, sender_id, receiver_id, &audio_data)
                    .await
            }
            InboundEvent::StatusRequest { user_id: subject } => {
                self.answer_status_request(subject, event_tx).await
            }
        };

        if let Err(e) = outcome {
            warn!("Chat event from user {} failed: {}", user_id, e);
            let _ = event_tx.send(OutboundEvent::error(e.message));
        }
    }

    /// Persist a message and fan it out to both participants' groups
    async fn send_message(
        &self,
        session_user: i64,
        sender_id: i64,
        receiver_id: i64,
        body: MessageBody,
    ) -> AppResult<()> {
        if sender_id != session_user {
            return Err(AppError::invalid_input(
                "sender_id does not match the session user",
            ));
        }
        if let MessageBody::Text(text) = &body {
            if text.is_empty() {
                return Err(AppError::invalid_input("Message body is empty"));
            }
            if text.len() > MAX_MESSAGE_BYTES {
                return Err(AppError::invalid_input(format!(
                    "Message body exceeds the {MAX_MESSAGE_BYTES} byte limit"
                )));
            }
        }
        match self.database.get_user(receiver_id).await? {
            Some(receiver) if receiver.is_active => {}
            _ => return Err(AppError::not_found(format!("User {receiver_id}"))),
        }

        let conversation = self
            .database
            .get_or_create_conversation(sender_id, receiver_id)
            .await
            .map_err(|e| AppError::database(e.to_string()))?;

        // Persist before publish
        let message = self
            .database
            .record_message(conversation.id, sender_id, body)
            .await
            .map_err(|e| AppError::database(e.to_string()))?;

        let event = OutboundEvent::chat_message(&message);
        self.router.publish(&user_group(receiver_id), &event).await;
        // The sender's own group too, so their other devices see it
        self.router.publish(&user_group(sender_id), &event).await;

        debug!(
            "Message {} recorded in conversation {} and published",
            message.id, conversation.id
        );
        Ok(())
    }

    /// Decode, store, and deliver a voice recording
    async fn send_audio(
        &self,
        session_user: i64,
        sender_id: i64,
        receiver_id: i64,
        audio_data: &str,
    ) -> AppResult<()> {
        let bytes = BASE64
            .decode(audio_data)
            .map_err(|e| AppError::invalid_format(format!("Invalid base64 audio data: {e}")))?;
        let reference = self.media.store_voice(&bytes).await?;

        self.send_message(
            session_user,
            sender_id,
            receiver_id,
            MessageBody::Voice(reference),
        )
        .await
    }

    /// Answer a presence query on this session only
    async fn answer_status_request(
        &self,
        subject: i64,
        event_tx: &mpsc::UnboundedSender<OutboundEvent>,
    ) -> AppResult<()> {
        let status = self.resolve_status(subject).await;
        let _ = event_tx.send(OutboundEvent::status_response(subject, status));
        Ok(())
    }

    /// Presence read-through: the fast store is authoritative, the durable
    /// mirror answers only when it errors, and an unreachable mirror reads
    /// as offline rather than failing the caller
    pub async fn resolve_status(&self, user_id: i64) -> PresenceStatus {
        match self.presence.status(user_id).await {
            Ok(status) => status,
            Err(e) => {
                warn!("Presence read failed for user {}, using mirror: {}", user_id, e);
                self.database
                    .get_presence_mirror(user_id)
                    .await
                    .unwrap_or_default()
            }
        }
    }

    /// Record a session transition in the presence store and, when the
    /// user's aggregate status changed, tell their conversation partners.
    /// Every step is best-effort; a presence hiccup never kills a session.
    async fn announce_presence_change(&self, user_id: i64, session_id: Uuid, connected: bool) {
        let result = if connected {
            self.presence.session_connected(user_id, session_id).await
        } else {
            self.presence.session_disconnected(user_id, session_id).await
        };

        let status = match result {
            Ok(status) => status,
            Err(e) => {
                warn!("Presence transition failed for user {}: {}", user_id, e);
                return;
            }
        };

        // Another device may still be online after a disconnect; only the
        // aggregate transition is worth announcing
        if !connected && status == PresenceStatus::Online {
            return;
        }

        if let Err(e) = self.database.set_presence_mirror(user_id, status).await {
            warn!("Presence mirror write failed for user {}: {}", user_id, e);
        }

        let partners = match self.database.conversation_partners(user_id).await {
            Ok(partners) => partners,
            Err(e) => {
                warn!("Partner lookup failed for user {}: {}", user_id, e);
                return;
            }
        };

        let event = OutboundEvent::status_update(user_id, status);
        for partner in partners {
            self.router.publish(&user_group(partner), &event).await;
        }
    }

    async fn close_with(socket: &mut WebSocket, code: u16, reason: &'static str) {
        let frame = CloseFrame {
            code,
            reason: Cow::Borrowed(reason),
        };
        if let Err(e) = socket.send(WsMessage::Close(Some(frame))).await {
            debug!("Failed to send close frame: {}", e);
        }
    }
}
