//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is shared via `Arc<EventBus>`. Subscribers (push gateways,
//! mailers, UI sockets) receive every [`CenterEvent`] after it is committed.

use mota_core::channels::Channel;
use mota_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// CenterEvent
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A new head record was stored.
    Created,
    /// A notification was folded into an existing head.
    Merged,
    /// Presentation state changed (read, pin, collapse, classification).
    Updated,
    Deleted,
    /// DND schedule or override changed.
    DndChanged,
    SubscriptionChanged,
    PreferencesChanged,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "notification.created",
            Self::Merged => "notification.merged",
            Self::Updated => "notification.updated",
            Self::Deleted => "notification.deleted",
            Self::DndChanged => "settings.dnd_changed",
            Self::SubscriptionChanged => "settings.subscription_changed",
            Self::PreferencesChanged => "settings.preferences_changed",
        }
    }
}

/// A committed change for one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CenterEvent {
    pub kind: EventKind,
    pub user_id: DbId,
    /// Affected records; empty for settings changes.
    pub notification_ids: Vec<DbId>,
    /// Channels the change should be delivered on. Only set for intake events.
    pub channels: Vec<Channel>,
    pub payload: serde_json::Value,
    pub timestamp: Timestamp,
}

impl CenterEvent {
    pub fn new(kind: EventKind, user_id: DbId, timestamp: Timestamp) -> Self {
        Self {
            kind,
            user_id,
            notification_ids: Vec::new(),
            channels: Vec::new(),
            payload: serde_json::Value::Object(Default::default()),
            timestamp,
        }
    }

    pub fn with_notification(mut self, id: DbId) -> Self {
        self.notification_ids.push(id);
        self
    }

    pub fn with_notifications(mut self, ids: impl IntoIterator<Item = DbId>) -> Self {
        self.notification_ids.extend(ids);
        self
    }

    pub fn with_channels(mut self, channels: Vec<Channel>) -> Self {
        self.channels = channels;
        self
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
///
/// When the buffer is full the oldest un-consumed messages are dropped and
/// slow receivers observe `RecvError::Lagged`.
pub struct EventBus {
    sender: broadcast::Sender<CenterEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish to all current subscribers. Dropped silently when there are none.
    pub fn publish(&self, event: CenterEvent) {
        tracing::trace!(
            kind = event.kind.as_str(),
            user_id = event.user_id,
            "Publishing center event"
        );
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CenterEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
