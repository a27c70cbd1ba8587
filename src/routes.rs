// ABOUTME: HTTP and WebSocket route handlers for the chat server
// ABOUTME: Session upgrade, history and partner queries, and health probe
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 VentureLink

use crate::chat::ChatManager;
use crate::database::Database;
use crate::errors::{AppError, AppResult};
use crate::models::PresenceStatus;
use crate::protocol::OutboundEvent;
use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{Path, Query, State};
use axum::response::Response;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::debug;

/// Shared state behind every route
#[derive(Clone)]
pub struct AppState {
    /// Chat session coordinator
    pub chat: ChatManager,
    /// Durable storage
    pub database: Database,
}

/// Build the application router with tracing and CORS layers
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/ws/chat/:user_id", get(ws_chat))
        .route("/chat/messages/:user_id", get(conversation_messages))
        .route("/chat/partners/:user_id", get(conversation_partners))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Upgrade into a chat session for the given user
async fn ws_chat(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    ws: WebSocketUpgrade,
) -> Response {
    debug!("WebSocket upgrade requested for user {}", user_id);
    ws.on_upgrade(move |socket| state.chat.handle_connection(socket, user_id))
}

#[derive(Debug, Deserialize)]
struct MessagesQuery {
    /// User asking for the history; must share the conversation
    requester: i64,
}

/// Conversation history between the requester and a partner, in the same
/// JSON shape the session broadcast uses. Users who never spoke get an
/// empty list.
async fn conversation_messages(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Query(query): Query<MessagesQuery>,
) -> AppResult<Json<Vec<OutboundEvent>>> {
    if state.database.get_user(query.requester).await?.is_none() {
        return Err(AppError::not_found(format!("User {}", query.requester)));
    }

    let messages = state
        .database
        .messages_between(query.requester, user_id)
        .await
        .map_err(|e| AppError::database(e.to_string()))?;

    Ok(Json(
        messages.iter().map(OutboundEvent::chat_message).collect(),
    ))
}

/// One conversation partner of a user, with presence and latest activity
#[derive(Debug, Serialize, Deserialize)]
pub struct PartnerSummary {
    /// Partner user id
    pub user_id: i64,
    /// Partner display name
    pub full_name: String,
    /// Current presence status
    pub status: PresenceStatus,
    /// Display content of the most recent message, if any
    pub last_message: Option<String>,
    /// RFC 3339 time of the most recent message, if any
    pub last_message_time: Option<String>,
}

/// All conversation partners of a user, most recently active first
async fn conversation_partners(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> AppResult<Json<Vec<PartnerSummary>>> {
    if state.database.get_user(user_id).await?.is_none() {
        return Err(AppError::not_found(format!("User {user_id}")));
    }

    let conversations = state
        .database
        .conversations_of(user_id)
        .await
        .map_err(|e| AppError::database(e.to_string()))?;

    let mut summaries = Vec::with_capacity(conversations.len());
    for conversation in conversations {
        let partner_id = conversation.partner_of(user_id);
        let Some(partner) = state.database.get_user(partner_id).await? else {
            continue; // partner row cascaded away mid-listing
        };

        let latest = state
            .database
            .latest_message(conversation.id)
            .await
            .map_err(|e| AppError::database(e.to_string()))?;

        summaries.push(PartnerSummary {
            user_id: partner_id,
            full_name: partner.full_name,
            status: state.chat.resolve_status(partner_id).await,
            last_message: latest
                .as_ref()
                .and_then(|m| m.display_content().map(ToOwned::to_owned)),
            last_message_time: latest.as_ref().map(|m| m.timestamp.to_rfc3339()),
        });
    }

    Ok(Json(summaries))
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    database: &'static str,
    presence: &'static str,
}

/// Liveness of the storage and presence backends
async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let database_ok = state.database.health_check().await.is_ok();
    let presence_ok = state.chat.presence().health_check().await.is_ok();

    Json(HealthResponse {
        status: if database_ok && presence_ok {
            "ok"
        } else {
            "degraded"
        },
        database: if database_ok { "ok" } else { "unavailable" },
        presence: if presence_ok { "ok" } else { "unavailable" },
    })
}
