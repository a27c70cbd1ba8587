// ABOUTME: HTTP integration tests for the chat REST endpoints
// ABOUTME: Covers history, partner summaries, health, and error responses
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 VentureLink

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;
mod helpers;

use anyhow::Result;
use helpers::axum_test::AxumTestRequest;
use venturelink_chat::models::MessageBody;

#[tokio::test]
async fn test_health_endpoint_reports_ok() -> Result<()> {
    let (app, _database, _dirs) = common::create_test_app().await?;

    let response = AxumTestRequest::get("/health").send(app).await;

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "ok");
    assert_eq!(body["presence"], "ok");
    Ok(())
}

#[tokio::test]
async fn test_messages_empty_for_strangers() -> Result<()> {
    let (app, database, _dirs) = common::create_test_app().await?;
    let alice = common::create_test_user(&database, "alice").await?;
    let bob = common::create_test_user(&database, "bob").await?;

    let response = AxumTestRequest::get(&format!(
        "/chat/messages/{}?requester={}",
        bob.id, alice.id
    ))
    .send(app)
    .await;

    assert_eq!(response.status(), 200);
    let body: Vec<serde_json::Value> = response.json();
    assert!(body.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_messages_match_broadcast_wire_shape() -> Result<()> {
    let (app, database, _dirs) = common::create_test_app().await?;
    let alice = common::create_test_user(&database, "alice").await?;
    let bob = common::create_test_user(&database, "bob").await?;

    let conversation = database
        .get_or_create_conversation(alice.id, bob.id)
        .await?;
    database
        .record_message(conversation.id, alice.id, MessageBody::Text("hello".into()))
        .await?;
    database
        .record_message(
            conversation.id,
            bob.id,
            MessageBody::Voice("/media/message_voices/x.wav".into()),
        )
        .await?;

    let response = AxumTestRequest::get(&format!(
        "/chat/messages/{}?requester={}",
        bob.id, alice.id
    ))
    .send(app)
    .await;

    assert_eq!(response.status(), 200);
    let body: Vec<serde_json::Value> = response.json();
    assert_eq!(body.len(), 2);

    assert_eq!(body[0]["type"], "chat_message");
    assert_eq!(body[0]["sender"], alice.id);
    assert_eq!(body[0]["content_type"], "text");
    assert_eq!(body[0]["content"], "hello");
    assert!(body[0]["image"].is_null());
    assert!(body[0]["voice"].is_null());
    assert_eq!(body[0]["status"], "sent");

    assert_eq!(body[1]["content_type"], "voice");
    assert!(body[1]["content"].is_null());
    assert_eq!(body[1]["voice"], "/media/message_voices/x.wav");
    Ok(())
}

#[tokio::test]
async fn test_messages_requires_requester_param() -> Result<()> {
    let (app, database, _dirs) = common::create_test_app().await?;
    let bob = common::create_test_user(&database, "bob").await?;

    let response = AxumTestRequest::get(&format!("/chat/messages/{}", bob.id))
        .send(app)
        .await;

    assert_eq!(response.status(), 400);
    Ok(())
}

#[tokio::test]
async fn test_messages_unknown_requester_is_404() -> Result<()> {
    let (app, database, _dirs) = common::create_test_app().await?;
    let bob = common::create_test_user(&database, "bob").await?;

    let response =
        AxumTestRequest::get(&format!("/chat/messages/{}?requester=99999", bob.id))
            .send(app)
            .await;

    assert_eq!(response.status(), 404);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["code"], "RESOURCE_NOT_FOUND");
    Ok(())
}

#[tokio::test]
async fn test_partners_lists_conversations_with_latest_activity() -> Result<()> {
    let (app, database, _dirs) = common::create_test_app().await?;
    let alice = common::create_test_user(&database, "alice").await?;
    let bob = common::create_test_user(&database, "bob").await?;

    let conversation = database
        .get_or_create_conversation(alice.id, bob.id)
        .await?;
    database
        .record_message(conversation.id, bob.id, MessageBody::Text("pitch deck?".into()))
        .await?;

    let response = AxumTestRequest::get(&format!("/chat/partners/{}", alice.id))
        .send(app)
        .await;

    assert_eq!(response.status(), 200);
    let body: Vec<serde_json::Value> = response.json();
    assert_eq!(body.len(), 1);
    assert_eq!(body[0]["user_id"], bob.id);
    assert_eq!(body[0]["full_name"], "bob");
    assert_eq!(body[0]["status"], "offline");
    assert_eq!(body[0]["last_message"], "pitch deck?");
    assert!(body[0]["last_message_time"].is_string());
    Ok(())
}

#[tokio::test]
async fn test_partners_empty_without_conversations() -> Result<()> {
    let (app, database, _dirs) = common::create_test_app().await?;
    let alice = common::create_test_user(&database, "alice").await?;

    let response = AxumTestRequest::get(&format!("/chat/partners/{}", alice.id))
        .send(app)
        .await;

    assert_eq!(response.status(), 200);
    let body: Vec<serde_json::Value> = response.json();
    assert!(body.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_partners_unknown_user_is_404() -> Result<()> {
    let (app, _database, _dirs) = common::create_test_app().await?;

    let response = AxumTestRequest::get("/chat/partners/99999").send(app).await;

    assert_eq!(response.status(), 404);
    Ok(())
}
