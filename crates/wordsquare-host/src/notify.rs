//! Fire-and-forget notifications to participants.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;
use wordsquare_core::{GameEvent, UserId};

/// What a participant is told about
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum NotificationKind {
    /// A state transition in one of their games
    Event(GameEvent),
    /// Their turn runs out soon
    TurnEndingSoon { expires_at: DateTime<Utc> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub game_id: Uuid,
    pub kind: NotificationKind,
}

/// Delivers notifications. Implementations must not block.
pub trait Notifier: Send + Sync {
    fn notify(&self, user: UserId, notification: Notification);
}

/// Pushes notifications into per-user channels
#[derive(Default)]
pub struct ChannelNotifier {
    senders: DashMap<UserId, mpsc::UnboundedSender<Notification>>,
}

impl ChannelNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user and return the receiving end of their channel.
    /// A second subscription replaces the first.
    pub fn subscribe(&self, user: UserId) -> mpsc::UnboundedReceiver<Notification> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.senders.insert(user, tx);
        rx
    }

    pub fn unsubscribe(&self, user: UserId) {
        self.senders.remove(&user);
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, user: UserId, notification: Notification) {
        if let Some(sender) = self.senders.get(&user) {
            let _ = sender.send(notification);
        }
    }
}

/// Writes notifications to the log only
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, user: UserId, notification: Notification) {
        match serde_json::to_string(&notification.kind) {
            Ok(json) => info!(%user, game_id = %notification.game_id, "Notification {}", json),
            Err(e) => warn!(%user, "Failed to serialize notification: {}", e),
        }
    }
}
