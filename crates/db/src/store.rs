//! Store adapter contract.
//!
//! Every write that changes an existing notification is conditional on the
//! caller's `expected_version`; head creation is conditional on no open head
//! existing for the same `(user_id, group_key)`.

use async_trait::async_trait;
use mota_core::dnd::{DndOverride, DndSettings};
use mota_core::error::CoreError;
use mota_core::notification::{Category, Notification, PendingNotification};
use mota_core::preferences::NotificationPreferences;
use mota_core::subscription::Subscription;
use mota_core::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: DbId },

    #[error("version conflict on notification {id}: expected {expected}, found {actual}")]
    VersionConflict {
        id: DbId,
        expected: i64,
        actual: i64,
    },

    #[error("an open group already exists for key {group_key}")]
    OpenGroupExists { group_key: String },

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("corrupt row: {0}")]
    Corrupt(String),

    #[error("database error: {0}")]
    Database(sqlx::Error),
}

/// Partial unique index guarding one open head per user and group key.
pub const OPEN_GROUP_INDEX: &str = "uq_notifications_open_group";

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => StoreError::Unavailable(err.to_string()),
            sqlx::Error::Database(db_err) if db_err.constraint() == Some(OPEN_GROUP_INDEX) => {
                StoreError::OpenGroupExists {
                    group_key: String::new(),
                }
            }
            _ => StoreError::Database(err),
        }
    }
}

impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, id } => CoreError::NotFound { entity, id },
            StoreError::VersionConflict { .. } | StoreError::OpenGroupExists { .. } => {
                CoreError::Conflict(err.to_string())
            }
            StoreError::Unavailable(msg) => CoreError::UpstreamUnavailable(msg),
            StoreError::Corrupt(msg) => CoreError::Internal(msg),
            StoreError::Database(e) => CoreError::Internal(e.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Filter
// ---------------------------------------------------------------------------

/// Narrowing applied by [`NotificationStore::get_by_user`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotificationFilter {
    pub unread_only: bool,
    pub categories: Option<Vec<Category>>,
    pub group_key: Option<String>,
    pub created_since: Option<Timestamp>,
}

impl NotificationFilter {
    pub fn unread() -> Self {
        Self {
            unread_only: true,
            ..Self::default()
        }
    }

    pub fn for_group(group_key: impl Into<String>) -> Self {
        Self {
            group_key: Some(group_key.into()),
            ..Self::default()
        }
    }

    pub fn matches(&self, n: &Notification) -> bool {
        (!self.unread_only || !n.is_read)
            && self
                .categories
                .as_ref()
                .map_or(true, |c| c.contains(&n.category))
            && self
                .group_key
                .as_ref()
                .map_or(true, |k| n.group_key.as_ref() == Some(k))
            && self.created_since.map_or(true, |t| n.created_at >= t)
    }
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// Durable notification records.
#[async_trait]
pub trait NotificationStore: Send + Sync {
    /// Records for a user, newest first with ties broken by descending id.
    async fn get_by_user(
        &self,
        user_id: DbId,
        filter: &NotificationFilter,
    ) -> Result<Vec<Notification>, StoreError>;

    async fn get(&self, id: DbId) -> Result<Option<Notification>, StoreError>;

    /// Insert a new single-member head. Fails with
    /// [`StoreError::OpenGroupExists`] when an unread, unclosed record with the
    /// same group key already exists for the user.
    async fn insert(&self, pending: PendingNotification) -> Result<Notification, StoreError>;

    /// Replace the mutable fields of an existing record, bumping its version.
    /// With `expected_version` set the write only applies if it matches.
    async fn upsert(
        &self,
        notification: &Notification,
        expected_version: Option<i64>,
    ) -> Result<Notification, StoreError>;

    async fn delete(&self, id: DbId) -> Result<bool, StoreError>;

    async fn delete_by_user(&self, user_id: DbId) -> Result<u64, StoreError>;

    /// Retention: remove records created before `cutoff`.
    async fn delete_created_before(&self, cutoff: Timestamp) -> Result<u64, StoreError>;

    /// Reachability check used by health checks.
    async fn ping(&self) -> Result<(), StoreError>;
}

/// Per-user settings rows. Absent rows are reported as `None` / empty.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn get_dnd(&self, user_id: DbId) -> Result<Option<DndSettings>, StoreError>;

    /// Persist the schedule fields; the stored override is left unchanged.
    async fn put_dnd(&self, user_id: DbId, settings: &DndSettings) -> Result<(), StoreError>;

    /// Set or clear the override without touching the schedule.
    async fn set_dnd_override(
        &self,
        user_id: DbId,
        dnd_override: Option<DndOverride>,
    ) -> Result<(), StoreError>;

    async fn get_subscriptions(&self, user_id: DbId) -> Result<Vec<Subscription>, StoreError>;

    async fn put_subscription(
        &self,
        user_id: DbId,
        subscription: &Subscription,
    ) -> Result<(), StoreError>;

    async fn get_preferences(
        &self,
        user_id: DbId,
    ) -> Result<Option<NotificationPreferences>, StoreError>;

    async fn put_preferences(
        &self,
        user_id: DbId,
        preferences: &NotificationPreferences,
    ) -> Result<(), StoreError>;
}
