//! The notification center service.
//!
//! Split by concern: [`intake`] (submit pipeline), [`actions`] (user
//! mutations), [`query`] (listing and counts) and [`settings`] (DND,
//! subscriptions, preferences). All share the optimistic-write loop in
//! [`NotificationCenter::mutate`].

mod actions;
mod intake;
mod query;
mod settings;

use std::collections::HashMap;
use std::sync::Arc;

use mota_core::classifier::{Classifier, ScoringClassifier};
use mota_core::clock::{Clock, SystemClock};
use mota_core::dnd::{is_suppressed, DndSettings};
use mota_core::error::CoreError;
use mota_core::notification::Notification;
use mota_core::preferences::NotificationPreferences;
use mota_core::presentation::{GroupExpansion, ListedNotification};
use mota_core::types::DbId;
use mota_db::{NotificationStore, SettingsStore, StoreError};
use mota_events::{CenterEvent, EventBus, EventKind};
use tokio::sync::RwLock;

use crate::config::EngineConfig;

pub use intake::{SubmitOutcome, MAX_SUBMIT_BATCH};

/// Attempts per read-modify-write before a conflict is surfaced.
pub const MAX_WRITE_ATTEMPTS: u32 = 3;

pub struct NotificationCenter {
    notifications: Arc<dyn NotificationStore>,
    settings: Arc<dyn SettingsStore>,
    classifier: Arc<dyn Classifier>,
    clock: Arc<dyn Clock>,
    bus: Arc<EventBus>,
    /// UI-only group expansion state per user.
    expansion: RwLock<HashMap<DbId, GroupExpansion>>,
    config: EngineConfig,
}

impl NotificationCenter {
    pub fn new(
        notifications: Arc<dyn NotificationStore>,
        settings: Arc<dyn SettingsStore>,
        bus: Arc<EventBus>,
        config: EngineConfig,
    ) -> Self {
        Self {
            notifications,
            settings,
            classifier: Arc::new(ScoringClassifier),
            clock: Arc::new(SystemClock),
            bus,
            expansion: RwLock::new(HashMap::new()),
            config,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_classifier(mut self, classifier: Arc<dyn Classifier>) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    // -----------------------------------------------------------------------
    // Shared helpers
    // -----------------------------------------------------------------------

    /// Fetch a record owned by `user_id`. Other users' records are reported
    /// as missing.
    async fn owned(&self, user_id: DbId, id: DbId) -> Result<Notification, CoreError> {
        match self.notifications.get(id).await? {
            Some(n) if n.user_id == user_id => Ok(n),
            _ => Err(CoreError::NotFound {
                entity: "Notification",
                id,
            }),
        }
    }

    /// Apply `change` to a record with optimistic concurrency.
    ///
    /// `change` returns `false` when the record already has the desired state;
    /// the current record is then returned without a write.
    async fn mutate<F>(
        &self,
        user_id: DbId,
        id: DbId,
        change: F,
    ) -> Result<(Notification, bool), CoreError>
    where
        F: Fn(&mut Notification) -> bool,
    {
        for attempt in 1..=MAX_WRITE_ATTEMPTS {
            let current = self.owned(user_id, id).await?;
            let mut next = current.clone();
            if !change(&mut next) {
                return Ok((current, false));
            }
            match self.notifications.upsert(&next, Some(current.version)).await {
                Ok(stored) => return Ok((stored, true)),
                Err(StoreError::VersionConflict { .. }) => {
                    tracing::debug!(user_id, notification_id = id, attempt, "Write conflict, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(CoreError::Conflict(format!(
            "notification {id} changed concurrently {MAX_WRITE_ATTEMPTS} times"
        )))
    }

    async fn preferences_or_default(
        &self,
        user_id: DbId,
    ) -> Result<NotificationPreferences, CoreError> {
        Ok(self
            .settings
            .get_preferences(user_id)
            .await?
            .unwrap_or_else(|| self.default_preferences()))
    }

    fn default_preferences(&self) -> NotificationPreferences {
        NotificationPreferences {
            aggregation_interval_minutes: self.config.aggregation_window_minutes,
            ..NotificationPreferences::default()
        }
    }

    async fn dnd_or_default(&self, user_id: DbId) -> Result<DndSettings, CoreError> {
        Ok(self.settings.get_dnd(user_id).await?.unwrap_or_default())
    }

    /// Attach suppression and expansion flags to a single record.
    async fn annotate(
        &self,
        notification: Notification,
    ) -> Result<ListedNotification, CoreError> {
        let dnd = self.dnd_or_default(notification.user_id).await?;
        let quiet = dnd.is_quiet(self.clock.now());
        let is_expanded = self
            .expansion
            .read()
            .await
            .get(&notification.user_id)
            .is_some_and(|e| e.is_expanded(notification.id));
        Ok(ListedNotification {
            is_suppressed: is_suppressed(
                quiet,
                &dnd,
                notification.priority,
                notification.notification_type,
                notification.sender_id,
            ),
            is_expanded,
            notification,
        })
    }

    fn publish(&self, kind: EventKind, user_id: DbId, ids: impl IntoIterator<Item = DbId>) {
        self.bus
            .publish(CenterEvent::new(kind, user_id, self.clock.now()).with_notifications(ids));
    }
}
