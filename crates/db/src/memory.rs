//! In-process store adapter.
//!
//! Holds all state behind one `RwLock`, so each call is atomic with respect to
//! every other. Used by tests and single-node deployments without a database.

use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use mota_core::dnd::{DndOverride, DndSettings};
use mota_core::notification::{Category, Notification, PendingNotification};
use mota_core::preferences::NotificationPreferences;
use mota_core::subscription::Subscription;
use mota_core::types::{DbId, Timestamp};
use tokio::sync::RwLock;

use crate::store::{NotificationFilter, NotificationStore, SettingsStore, StoreError};

#[derive(Default)]
struct State {
    next_id: DbId,
    notifications: BTreeMap<DbId, Notification>,
    dnd: HashMap<DbId, DndSettings>,
    subscriptions: HashMap<DbId, BTreeMap<Category, Subscription>>,
    preferences: HashMap<DbId, NotificationPreferences>,
}

pub struct InMemoryStore {
    state: RwLock<State>,
    available: AtomicBool,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(State::default()),
            available: AtomicBool::new(true),
        }
    }

    /// Simulate an outage: while unavailable every call fails with
    /// [`StoreError::Unavailable`].
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    fn ensure_available(&self) -> Result<(), StoreError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::Unavailable("in-memory store offline".to_string()))
        }
    }
}

#[async_trait]
impl NotificationStore for InMemoryStore {
    async fn get_by_user(
        &self,
        user_id: DbId,
        filter: &NotificationFilter,
    ) -> Result<Vec<Notification>, StoreError> {
        self.ensure_available()?;
        let state = self.state.read().await;
        let mut rows: Vec<Notification> = state
            .notifications
            .values()
            .filter(|n| n.user_id == user_id && filter.matches(n))
            .cloned()
            .collect();
        rows.sort_by_key(|n| Reverse((n.created_at, n.id)));
        Ok(rows)
    }

    async fn get(&self, id: DbId) -> Result<Option<Notification>, StoreError> {
        self.ensure_available()?;
        Ok(self.state.read().await.notifications.get(&id).cloned())
    }

    async fn insert(&self, pending: PendingNotification) -> Result<Notification, StoreError> {
        self.ensure_available()?;
        let mut state = self.state.write().await;

        if let Some(key) = &pending.group_key {
            let open = state.notifications.values().any(|n| {
                n.user_id == pending.user_id
                    && n.group_key.as_ref() == Some(key)
                    && n.accepts_members()
            });
            if open {
                return Err(StoreError::OpenGroupExists {
                    group_key: key.clone(),
                });
            }
        }

        state.next_id += 1;
        let id = state.next_id;
        let notification = pending.into_notification(id, 1);
        state.notifications.insert(id, notification.clone());
        Ok(notification)
    }

    async fn upsert(
        &self,
        notification: &Notification,
        expected_version: Option<i64>,
    ) -> Result<Notification, StoreError> {
        self.ensure_available()?;
        let mut state = self.state.write().await;
        let stored = state
            .notifications
            .get_mut(&notification.id)
            .ok_or(StoreError::NotFound {
                entity: "Notification",
                id: notification.id,
            })?;

        if let Some(expected) = expected_version {
            if stored.version != expected {
                return Err(StoreError::VersionConflict {
                    id: notification.id,
                    expected,
                    actual: stored.version,
                });
            }
        }

        let mut next = notification.clone();
        next.version = stored.version + 1;
        *stored = next.clone();
        Ok(next)
    }

    async fn delete(&self, id: DbId) -> Result<bool, StoreError> {
        self.ensure_available()?;
        Ok(self.state.write().await.notifications.remove(&id).is_some())
    }

    async fn delete_by_user(&self, user_id: DbId) -> Result<u64, StoreError> {
        self.ensure_available()?;
        let mut state = self.state.write().await;
        let before = state.notifications.len();
        state.notifications.retain(|_, n| n.user_id != user_id);
        Ok((before - state.notifications.len()) as u64)
    }

    async fn delete_created_before(&self, cutoff: Timestamp) -> Result<u64, StoreError> {
        self.ensure_available()?;
        let mut state = self.state.write().await;
        let before = state.notifications.len();
        state.notifications.retain(|_, n| n.created_at >= cutoff);
        Ok((before - state.notifications.len()) as u64)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.ensure_available()
    }
}

#[async_trait]
impl SettingsStore for InMemoryStore {
    async fn get_dnd(&self, user_id: DbId) -> Result<Option<DndSettings>, StoreError> {
        self.ensure_available()?;
        Ok(self.state.read().await.dnd.get(&user_id).cloned())
    }

    async fn put_dnd(&self, user_id: DbId, settings: &DndSettings) -> Result<(), StoreError> {
        self.ensure_available()?;
        let mut state = self.state.write().await;
        let entry = state.dnd.entry(user_id).or_default();
        let dnd_override = entry.dnd_override;
        *entry = DndSettings {
            dnd_override,
            ..settings.clone()
        };
        Ok(())
    }

    async fn set_dnd_override(
        &self,
        user_id: DbId,
        dnd_override: Option<DndOverride>,
    ) -> Result<(), StoreError> {
        self.ensure_available()?;
        let mut state = self.state.write().await;
        state.dnd.entry(user_id).or_default().dnd_override = dnd_override;
        Ok(())
    }

    async fn get_subscriptions(&self, user_id: DbId) -> Result<Vec<Subscription>, StoreError> {
        self.ensure_available()?;
        Ok(self
            .state
            .read()
            .await
            .subscriptions
            .get(&user_id)
            .map(|rows| rows.values().copied().collect())
            .unwrap_or_default())
    }

    async fn put_subscription(
        &self,
        user_id: DbId,
        subscription: &Subscription,
    ) -> Result<(), StoreError> {
        self.ensure_available()?;
        self.state
            .write()
            .await
            .subscriptions
            .entry(user_id)
            .or_default()
            .insert(subscription.category, *subscription);
        Ok(())
    }

    async fn get_preferences(
        &self,
        user_id: DbId,
    ) -> Result<Option<NotificationPreferences>, StoreError> {
        self.ensure_available()?;
        Ok(self.state.read().await.preferences.get(&user_id).copied())
    }

    async fn put_preferences(
        &self,
        user_id: DbId,
        preferences: &NotificationPreferences,
    ) -> Result<(), StoreError> {
        self.ensure_available()?;
        self.state
            .write()
            .await
            .preferences
            .insert(user_id, *preferences);
        Ok(())
    }
}
