// ABOUTME: Durable conversation and message storage over sqlx/SQLite
// ABOUTME: Owns pair-canonical conversation rows, ordered messages, and the presence mirror
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # Database Management
//!
//! Durable storage for the chat subsystem: users (the collaborator boundary
//! of the user directory), conversations, messages, and the best-effort
//! presence mirror read by synchronous HTTP callers.
//!
//! Conversation pairs are canonicalized at write time (`user_a <= user_b`)
//! and guarded by a UNIQUE constraint, so concurrent first contact from both
//! directions yields exactly one row. The losing writer catches the conflict
//! and re-reads.

use crate::models::{
    ContentType, Conversation, Message, MessageBody, MessageStatus, PresenceStatus, User, UserRole,
};
use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Pool, Row, Sqlite};
use std::str::FromStr;

/// Database manager for conversation and message storage
#[derive(Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Create a new database connection and run migrations
    ///
    /// # Errors
    ///
    /// Returns an error if the connection or migrations fail
    pub async fn new(database_url: &str) -> Result<Self> {
        // Foreign keys must be on for conversation deletes to cascade
        let options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("Invalid database URL: {database_url}"))?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to connect to database: {database_url}"))?;

        let db = Self { pool };
        db.migrate().await?;

        Ok(db)
    }

    /// Run database migrations
    ///
    /// # Errors
    ///
    /// Returns an error if a migration statement fails
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                email TEXT UNIQUE NOT NULL,
                full_name TEXT NOT NULL,
                role TEXT NOT NULL DEFAULT 'investor',
                is_active BOOLEAN NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS conversations (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_a INTEGER NOT NULL,
                user_b INTEGER NOT NULL,
                created_at TEXT NOT NULL,
                last_updated TEXT NOT NULL,
                UNIQUE (user_a, user_b),
                FOREIGN KEY (user_a) REFERENCES users (id) ON DELETE CASCADE,
                FOREIGN KEY (user_b) REFERENCES users (id) ON DELETE CASCADE
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS messages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                conversation_id INTEGER NOT NULL,
                sender_id INTEGER NOT NULL,
                content_type TEXT NOT NULL DEFAULT 'text',
                content TEXT,
                image TEXT,
                voice TEXT,
                status TEXT NOT NULL DEFAULT 'sent',
                timestamp TEXT NOT NULL,
                FOREIGN KEY (conversation_id) REFERENCES conversations (id) ON DELETE CASCADE,
                FOREIGN KEY (sender_id) REFERENCES users (id) ON DELETE CASCADE
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_messages_conversation
             ON messages (conversation_id, timestamp)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_conversations_user_b ON conversations (user_b)")
            .execute(&self.pool)
            .await?;

        // Durable mirror of the fast presence store, read by HTTP callers
        // that cannot reach it. Last-known status, persists indefinitely.
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS presence (
                user_id INTEGER PRIMARY KEY,
                status TEXT NOT NULL DEFAULT 'offline',
                changed_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Verify the database is reachable
    ///
    /// # Errors
    ///
    /// Returns an error if the probe query fails
    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
        Ok(())
    }

    // === Users (user directory collaborator boundary) ===

    /// Create a user record
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails (e.g. duplicate email)
    pub async fn create_user(&self, email: &str, full_name: &str, role: UserRole) -> Result<User> {
        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO users (email, full_name, role, is_active, created_at)
             VALUES (?1, ?2, ?3, 1, ?4)",
        )
        .bind(email)
        .bind(full_name)
        .bind(role.as_str())
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(User {
            id: result.last_insert_rowid(),
            email: email.to_owned(),
            full_name: full_name.to_owned(),
            role,
            is_active: true,
            created_at: now,
        })
    }

    /// Look up a user by id
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn get_user(&self, user_id: i64) -> Result<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE id = ?1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| Self::row_to_user(&r)).transpose()
    }

    // === Conversations ===

    /// Find the conversation for an unordered user pair
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn find_conversation(&self, a: i64, b: i64) -> Result<Option<Conversation>> {
        let (user_a, user_b) = Conversation::canonical_pair(a, b);
        let row = sqlx::query("SELECT * FROM conversations WHERE user_a = ?1 AND user_b = ?2")
            .bind(user_a)
            .bind(user_b)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| Self::row_to_conversation(&r)).transpose()
    }

    /// Resolve the conversation for an unordered user pair, creating it on
    /// first contact.
    ///
    /// Safe under concurrent first contact from both sides: the UNIQUE
    /// constraint decides the winner and the loser re-reads.
    ///
    /// # Errors
    ///
    /// Returns an error if the pair is degenerate or a query fails
    pub async fn get_or_create_conversation(&self, a: i64, b: i64) -> Result<Conversation> {
        if a == b {
            bail!("Cannot create a conversation between a user and themselves");
        }

        if let Some(conversation) = self.find_conversation(a, b).await? {
            return Ok(conversation);
        }

        let (user_a, user_b) = Conversation::canonical_pair(a, b);
        let now = Utc::now();
        let insert = sqlx::query(
            "INSERT INTO conversations (user_a, user_b, created_at, last_updated)
             VALUES (?1, ?2, ?3, ?3)",
        )
        .bind(user_a)
        .bind(user_b)
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await;

        match insert {
            Ok(result) => Ok(Conversation {
                id: result.last_insert_rowid(),
                user_a,
                user_b,
                created_at: now,
                last_updated: now,
            }),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                // Lost the race to the other side's first message
                self.find_conversation(a, b)
                    .await?
                    .context("Conversation vanished after unique-constraint conflict")
            }
            Err(e) => Err(e.into()),
        }
    }

    /// All conversations the user participates in, most recently updated first
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn conversations_of(&self, user_id: i64) -> Result<Vec<Conversation>> {
        let rows = sqlx::query(
            "SELECT * FROM conversations WHERE user_a = ?1 OR user_b = ?1
             ORDER BY last_updated DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_conversation).collect()
    }

    /// Ids of all users sharing a conversation with `user_id`
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn conversation_partners(&self, user_id: i64) -> Result<Vec<i64>> {
        let conversations = self.conversations_of(user_id).await?;
        Ok(conversations
            .iter()
            .map(|c| c.partner_of(user_id))
            .collect())
    }

    /// Delete the conversation for a pair, cascading to its messages.
    /// Invoked when the underlying follow relationship is removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails
    pub async fn delete_conversation(&self, a: i64, b: i64) -> Result<bool> {
        let (user_a, user_b) = Conversation::canonical_pair(a, b);
        let result = sqlx::query("DELETE FROM conversations WHERE user_a = ?1 AND user_b = ?2")
            .bind(user_a)
            .bind(user_b)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    // === Messages ===

    /// Persist a new message and refresh the conversation's `last_updated`
    ///
    /// # Errors
    ///
    /// Returns an error if a query fails
    pub async fn record_message(
        &self,
        conversation_id: i64,
        sender_id: i64,
        body: MessageBody,
    ) -> Result<Message> {
        let content_type = body.content_type();
        let (content, image, voice) = match body {
            MessageBody::Text(text) => (Some(text), None, None),
            MessageBody::Image(reference) => (None, Some(reference), None),
            MessageBody::Voice(reference) => (None, None, Some(reference)),
        };

        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO messages
                 (conversation_id, sender_id, content_type, content, image, voice, status, timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )
        .bind(conversation_id)
        .bind(sender_id)
        .bind(content_type.as_str())
        .bind(&content)
        .bind(&image)
        .bind(&voice)
        .bind(MessageStatus::Sent.as_str())
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await?;

        sqlx::query("UPDATE conversations SET last_updated = ?1 WHERE id = ?2")
            .bind(now.to_rfc3339())
            .bind(conversation_id)
            .execute(&self.pool)
            .await?;

        Ok(Message {
            id: result.last_insert_rowid(),
            conversation_id,
            sender_id,
            content_type,
            content,
            image,
            voice,
            status: MessageStatus::Sent,
            timestamp: now,
        })
    }

    /// Look up a single message by id
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn get_message(&self, message_id: i64) -> Result<Option<Message>> {
        let row = sqlx::query("SELECT * FROM messages WHERE id = ?1")
            .bind(message_id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| Self::row_to_message(&r)).transpose()
    }

    /// Full message history of a conversation in insertion order
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn conversation_history(&self, conversation_id: i64) -> Result<Vec<Message>> {
        let rows = sqlx::query(
            "SELECT * FROM messages WHERE conversation_id = ?1 ORDER BY timestamp, id",
        )
        .bind(conversation_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_message).collect()
    }

    /// Message history between two users; empty when they have never spoken
    ///
    /// # Errors
    ///
    /// Returns an error if a query fails
    pub async fn messages_between(&self, a: i64, b: i64) -> Result<Vec<Message>> {
        match self.find_conversation(a, b).await? {
            Some(conversation) => self.conversation_history(conversation.id).await,
            None => Ok(Vec::new()),
        }
    }

    /// Most recent message of a conversation
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn latest_message(&self, conversation_id: i64) -> Result<Option<Message>> {
        let row = sqlx::query(
            "SELECT * FROM messages WHERE conversation_id = ?1
             ORDER BY timestamp DESC, id DESC LIMIT 1",
        )
        .bind(conversation_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| Self::row_to_message(&r)).transpose()
    }

    /// Advance a message's delivery status.
    ///
    /// The monotonic guard lives in the statement itself: sent → delivered →
    /// read, never backwards. Returns whether the row changed.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails
    pub async fn advance_message_status(
        &self,
        message_id: i64,
        next: MessageStatus,
    ) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE messages SET status = ?1
             WHERE id = ?2
               AND ((?1 = 'delivered' AND status = 'sent')
                 OR (?1 = 'read' AND status IN ('sent', 'delivered')))",
        )
        .bind(next.as_str())
        .bind(message_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    // === Presence mirror ===

    /// Upsert the durable last-known presence status for a user
    ///
    /// # Errors
    ///
    /// Returns an error if the upsert fails
    pub async fn set_presence_mirror(&self, user_id: i64, status: PresenceStatus) -> Result<()> {
        sqlx::query(
            "INSERT INTO presence (user_id, status, changed_at) VALUES (?1, ?2, ?3)
             ON CONFLICT (user_id) DO UPDATE SET status = ?2, changed_at = ?3",
        )
        .bind(user_id)
        .bind(status.as_str())
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Last-known presence status; offline for users never seen
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn get_presence_mirror(&self, user_id: i64) -> Result<PresenceStatus> {
        let row = sqlx::query("SELECT status FROM presence WHERE user_id = ?1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(r) => {
                let status: String = r.try_get("status")?;
                Ok(PresenceStatus::from_str(&status)?)
            }
            None => Ok(PresenceStatus::Offline),
        }
    }

    // === Row mapping ===

    fn row_to_user(row: &SqliteRow) -> Result<User> {
        let role: String = row.try_get("role")?;
        let created_at_str: String = row.try_get("created_at")?;

        Ok(User {
            id: row.try_get("id")?,
            email: row.try_get("email")?,
            full_name: row.try_get("full_name")?,
            role: UserRole::from_str(&role)?,
            is_active: row.try_get("is_active")?,
            created_at: Self::parse_timestamp(&created_at_str)?,
        })
    }

    fn row_to_conversation(row: &SqliteRow) -> Result<Conversation> {
        let created_at_str: String = row.try_get("created_at")?;
        let last_updated_str: String = row.try_get("last_updated")?;

        Ok(Conversation {
            id: row.try_get("id")?,
            user_a: row.try_get("user_a")?,
            user_b: row.try_get("user_b")?,
            created_at: Self::parse_timestamp(&created_at_str)?,
            last_updated: Self::parse_timestamp(&last_updated_str)?,
        })
    }

    fn row_to_message(row: &SqliteRow) -> Result<Message> {
        let content_type: String = row.try_get("content_type")?;
        let status: String = row.try_get("status")?;
        let timestamp_str: String = row.try_get("timestamp")?;

        Ok(Message {
            id: row.try_get("id")?,
            conversation_id: row.try_get("conversation_id")?,
            sender_id: row.try_get("sender_id")?,
            content_type: ContentType::from_str(&content_type)?,
            content: row.try_get("content")?,
            image: row.try_get("image")?,
            voice: row.try_get("voice")?,
            status: MessageStatus::from_str(&status)?,
            timestamp: Self::parse_timestamp(&timestamp_str)?,
        })
    }

    fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
        Ok(DateTime::parse_from_rfc3339(value)
            .with_context(|| format!("Invalid stored timestamp: {value}"))?
            .with_timezone(&Utc))
    }
}
