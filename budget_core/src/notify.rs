//! Single-line messages for the player.

use crossbeam_channel::{unbounded, Receiver, Sender};
use serde::Serialize;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// Combat started against a monster whose budget is spent.
    ThresholdWarning,
    /// A left-click attack was swallowed.
    AttackBlocked,
    CommandReply,
    PendingAdded,
    DatabaseUpdated,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub text: String,
}

impl Notification {
    pub fn new(kind: NotificationKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    pub fn threshold_warning(name: &str) -> Self {
        Self::new(
            NotificationKind::ThresholdWarning,
            format!("Warning: You've already reached the kill threshold for {name}."),
        )
    }

    pub fn attack_blocked(name: &str) -> Self {
        Self::new(
            NotificationKind::AttackBlocked,
            format!("You've already reached the kill threshold for {name}."),
        )
    }

    pub fn pending_added(name: &str) -> Self {
        Self::new(
            NotificationKind::PendingAdded,
            format!("New monster detected: {name} (Added to pending list)"),
        )
    }

    pub fn monster_saved(name: &str, existing: bool) -> Self {
        let verb = if existing { "Updated" } else { "Added" };
        Self::new(
            NotificationKind::DatabaseUpdated,
            format!("{verb} {name} in the Fifty-Fifty database."),
        )
    }

    pub fn overrides_reset() -> Self {
        Self::new(
            NotificationKind::DatabaseUpdated,
            "Reset all custom monster data.",
        )
    }
}

/// Sink for player-facing messages. Implementations must not block.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Queues notifications for the host (or a test) to drain.
#[derive(Clone)]
pub struct ChannelNotifier {
    sender: Sender<Notification>,
}

impl ChannelNotifier {
    pub fn new() -> (Self, Receiver<Notification>) {
        let (sender, receiver) = unbounded();
        (Self { sender }, receiver)
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, notification: Notification) {
        // A dropped receiver means nobody is listening any more.
        let _ = self.sender.send(notification);
    }
}

/// Writes notifications to the log; used when the host supplies no sink.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notification: Notification) {
        info!(
            target: "fifty_fifty::notify",
            kind = ?notification.kind,
            "{}",
            notification.text
        );
    }
}
