// ABOUTME: In-process broadcast router fanning events out to named groups
// ABOUTME: Tracks per-session outbound channels keyed by group name
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 VentureLink

use crate::constants::groups::USER_GROUP_PREFIX;
use crate::protocol::OutboundEvent;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::sync::RwLock;
use tracing::{debug, trace};
use uuid::Uuid;

type GroupMap = HashMap<String, HashMap<Uuid, mpsc::UnboundedSender<OutboundEvent>>>;

/// Group name for a user's personal delivery group. Every session a user
/// opens joins this group, so publishing to it reaches all their devices.
#[must_use]
pub fn user_group(user_id: i64) -> String {
    format!("{USER_GROUP_PREFIX}{user_id}")
}

/// Routes outbound events to all sessions subscribed to a group.
///
/// Each session registers an unbounded sender under the groups it belongs
/// to. Publishing walks the group's senders in turn; because each publish
/// call enqueues on every channel before returning, two events published in
/// order by one task arrive in that order on every subscribed session.
///
/// A session whose receiver has been dropped is skipped silently; the
/// session teardown path removes the stale entry.
#[derive(Clone, Default)]
pub struct BroadcastRouter {
    groups: Arc<RwLock<GroupMap>>,
}

impl BroadcastRouter {
    /// Create an empty router
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe a session's outbound channel to a group. Re-joining with
    /// the same session id replaces the previous sender.
    pub async fn join(
        &self,
        group: &str,
        session_id: Uuid,
        tx: mpsc::UnboundedSender<OutboundEvent>,
    ) {
        let mut groups = self.groups.write().await;
        groups
            .entry(group.to_owned())
            .or_default()
            .insert(session_id, tx);
        debug!("Session {} joined group {}", session_id, group);
    }

    /// Remove a session from a group. Removing a session that is not a
    /// member is a no-op; empty groups are dropped.
    pub async fn leave(&self, group: &str, session_id: Uuid) {
        let mut groups = self.groups.write().await;
        if let Some(members) = groups.get_mut(group) {
            members.remove(&session_id);
            if members.is_empty() {
                groups.remove(group);
            }
            debug!("Session {} left group {}", session_id, group);
        }
    }

    /// Deliver an event to every live session in a group. A group with no
    /// members is a successful no-op, not an error.
    pub async fn publish(&self, group: &str, event: &OutboundEvent) {
        let groups = self.groups.read().await;
        let Some(members) = groups.get(group) else {
            trace!("No sessions in group {}, dropping event", group);
            return;
        };

        for (session_id, tx) in members {
            if tx.send(event.clone()).is_err() {
                // Receiver dropped; teardown will remove the entry
                trace!("Session {} in group {} is gone, skipping", session_id, group);
            }
        }
    }

    /// Number of sessions currently subscribed to a group
    pub async fn group_size(&self, group: &str) -> usize {
        self.groups
            .read()
            .await
            .get(group)
            .map_or(0, HashMap::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chat_event(n: i64) -> OutboundEvent {
        OutboundEvent::status_update(n, crate::models::PresenceStatus::Online)
    }

    #[tokio::test]
    async fn test_publish_reaches_all_members() {
        let router = BroadcastRouter::new();
        let (tx_a, mut rx_a) = mpsc::unbounded_channel();
        let (tx_b, mut rx_b) = mpsc::unbounded_channel();

        router.join("user:1", Uuid::new_v4(), tx_a).await;
        router.join("user:1", Uuid::new_v4(), tx_b).await;

        router.publish("user:1", &chat_event(1)).await;

        assert!(rx_a.recv().await.is_some());
        assert!(rx_b.recv().await.is_some());
    }

    #[tokio::test]
    async fn test_publish_to_empty_group_is_noop() {
        let router = BroadcastRouter::new();
        router.publish("user:404", &chat_event(404)).await;
        assert_eq!(router.group_size("user:404").await, 0);
    }

    #[tokio::test]
    async fn test_leave_is_idempotent() {
        let router = BroadcastRouter::new();
        let session = Uuid::new_v4();
        let (tx, _rx) = mpsc::unbounded_channel();

        router.join("user:1", session, tx).await;
        router.leave("user:1", session).await;
        router.leave("user:1", session).await;
        router.leave("user:2", session).await;

        assert_eq!(router.group_size("user:1").await, 0);
    }

    #[tokio::test]
    async fn test_dead_session_does_not_block_others() {
        let router = BroadcastRouter::new();
        let (tx_dead, rx_dead) = mpsc::unbounded_channel();
        let (tx_live, mut rx_live) = mpsc::unbounded_channel();

        router.join("user:1", Uuid::new_v4(), tx_dead).await;
        router.join("user:1", Uuid::new_v4(), tx_live).await;
        drop(rx_dead);

        router.publish("user:1", &chat_event(1)).await;

        assert!(rx_live.recv().await.is_some());
    }

    #[tokio::test]
    async fn test_single_publisher_order_is_preserved() {
        let router = BroadcastRouter::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        router.join("user:1", Uuid::new_v4(), tx).await;

        for n in 0..5 {
            router.publish("user:1", &chat_event(n)).await;
        }

        for n in 0..5 {
            match rx.recv().await {
                Some(OutboundEvent::StatusUpdate { user_id, .. }) => assert_eq!(user_id, n),
                other => panic!("unexpected event: {other:?}"),
            }
        }
    }

    #[test]
    fn test_user_group_naming() {
        assert_eq!(user_group(42), "user:42");
    }
}
