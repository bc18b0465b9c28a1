//! PostgreSQL store adapter built on the repositories.

use async_trait::async_trait;
use mota_core::dnd::{DndOverride, DndSettings};
use mota_core::notification::{Notification, PendingNotification};
use mota_core::preferences::NotificationPreferences;
use mota_core::subscription::Subscription;
use mota_core::types::{DbId, Timestamp};

use crate::repositories::{NotificationRepo, SettingsRepo};
use crate::store::{NotificationFilter, NotificationStore, SettingsStore, StoreError};
use crate::DbPool;

#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl NotificationStore for PgStore {
    async fn get_by_user(
        &self,
        user_id: DbId,
        filter: &NotificationFilter,
    ) -> Result<Vec<Notification>, StoreError> {
        NotificationRepo::list_for_user(&self.pool, user_id, filter).await
    }

    async fn get(&self, id: DbId) -> Result<Option<Notification>, StoreError> {
        NotificationRepo::find_by_id(&self.pool, id).await
    }

    async fn insert(&self, pending: PendingNotification) -> Result<Notification, StoreError> {
        NotificationRepo::create(&self.pool, pending).await
    }

    async fn upsert(
        &self,
        notification: &Notification,
        expected_version: Option<i64>,
    ) -> Result<Notification, StoreError> {
        if let Some(updated) =
            NotificationRepo::update(&self.pool, notification, expected_version).await?
        {
            return Ok(updated);
        }
        // Zero rows matched: distinguish a missing row from a stale version.
        match NotificationRepo::version_of(&self.pool, notification.id).await? {
            Some(actual) => {
                tracing::debug!(
                    notification_id = notification.id,
                    ?expected_version,
                    actual,
                    "Stale notification version"
                );
                Err(StoreError::VersionConflict {
                    id: notification.id,
                    expected: expected_version.unwrap_or(actual),
                    actual,
                })
            }
            None => Err(StoreError::NotFound {
                entity: "Notification",
                id: notification.id,
            }),
        }
    }

    async fn delete(&self, id: DbId) -> Result<bool, StoreError> {
        NotificationRepo::delete(&self.pool, id).await
    }

    async fn delete_by_user(&self, user_id: DbId) -> Result<u64, StoreError> {
        NotificationRepo::delete_for_user(&self.pool, user_id).await
    }

    async fn delete_created_before(&self, cutoff: Timestamp) -> Result<u64, StoreError> {
        let deleted = NotificationRepo::delete_created_before(&self.pool, cutoff).await?;
        tracing::debug!(deleted, %cutoff, "Purged notification rows");
        Ok(deleted)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        crate::health_check(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl SettingsStore for PgStore {
    async fn get_dnd(&self, user_id: DbId) -> Result<Option<DndSettings>, StoreError> {
        SettingsRepo::get_dnd(&self.pool, user_id).await
    }

    async fn put_dnd(&self, user_id: DbId, settings: &DndSettings) -> Result<(), StoreError> {
        SettingsRepo::upsert_dnd_schedule(&self.pool, user_id, settings).await
    }

    async fn set_dnd_override(
        &self,
        user_id: DbId,
        dnd_override: Option<DndOverride>,
    ) -> Result<(), StoreError> {
        SettingsRepo::upsert_dnd_override(&self.pool, user_id, dnd_override).await
    }

    async fn get_subscriptions(&self, user_id: DbId) -> Result<Vec<Subscription>, StoreError> {
        SettingsRepo::list_subscriptions(&self.pool, user_id).await
    }

    async fn put_subscription(
        &self,
        user_id: DbId,
        subscription: &Subscription,
    ) -> Result<(), StoreError> {
        SettingsRepo::upsert_subscription(&self.pool, user_id, subscription).await
    }

    async fn get_preferences(
        &self,
        user_id: DbId,
    ) -> Result<Option<NotificationPreferences>, StoreError> {
        SettingsRepo::get_preferences(&self.pool, user_id).await
    }

    async fn put_preferences(
        &self,
        user_id: DbId,
        preferences: &NotificationPreferences,
    ) -> Result<(), StoreError> {
        SettingsRepo::upsert_preferences(&self.pool, user_id, preferences).await
    }
}
