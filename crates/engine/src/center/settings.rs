//! DND, subscription and preference settings.

use mota_core::channels::Channel;
use mota_core::dnd::{DndOverride, DndSettings, DndUpdate, QuietStatus};
use mota_core::error::CoreError;
use mota_core::notification::Category;
use mota_core::preferences::{NotificationPreferences, PreferencesUpdate};
use mota_core::subscription::{self, Subscription, SubscriptionUpdate};
use mota_core::types::{DbId, Timestamp};
use mota_events::{CenterEvent, EventKind};

use super::NotificationCenter;

impl NotificationCenter {
    // -----------------------------------------------------------------------
    // DND
    // -----------------------------------------------------------------------

    /// Stored settings or defaults. An expired override is reported as absent.
    pub async fn get_dnd_settings(&self, user_id: DbId) -> Result<DndSettings, CoreError> {
        let mut settings = self.dnd_or_default(user_id).await?;
        settings.dnd_override = settings.active_override(self.clock.now());
        Ok(settings)
    }

    /// Apply a partial update. Invalid input is rejected before anything is
    /// written.
    pub async fn update_dnd_settings(
        &self,
        user_id: DbId,
        update: DndUpdate,
    ) -> Result<DndSettings, CoreError> {
        let current = self.get_dnd_settings(user_id).await?;
        let next = update.apply(&current)?;
        self.settings.put_dnd(user_id, &next).await?;
        self.publish_settings(EventKind::DndChanged, user_id);
        tracing::info!(user_id, enabled = next.enabled, "DND settings updated");
        Ok(next)
    }

    pub async fn is_quiet(&self, user_id: DbId, at: Timestamp) -> Result<bool, CoreError> {
        Ok(self.dnd_or_default(user_id).await?.is_quiet(at))
    }

    pub async fn dnd_status(&self, user_id: DbId) -> Result<QuietStatus, CoreError> {
        Ok(self.dnd_or_default(user_id).await?.status(self.clock.now()))
    }

    /// Start quick DND for `minutes`, or until disabled when `None`.
    pub async fn enable_dnd_override(
        &self,
        user_id: DbId,
        minutes: Option<u32>,
    ) -> Result<QuietStatus, CoreError> {
        let dnd_override = DndOverride::starting_at(self.clock.now(), minutes)?;
        self.settings
            .set_dnd_override(user_id, Some(dnd_override))
            .await?;
        self.publish_settings(EventKind::DndChanged, user_id);
        tracing::info!(user_id, ?minutes, "DND override enabled");
        self.dnd_status(user_id).await
    }

    pub async fn disable_dnd_override(&self, user_id: DbId) -> Result<QuietStatus, CoreError> {
        self.settings.set_dnd_override(user_id, None).await?;
        self.publish_settings(EventKind::DndChanged, user_id);
        tracing::info!(user_id, "DND override disabled");
        self.dnd_status(user_id).await
    }

    // -----------------------------------------------------------------------
    // Subscriptions
    // -----------------------------------------------------------------------

    /// One entry per category, defaults filled in.
    pub async fn get_subscriptions(&self, user_id: DbId) -> Result<Vec<Subscription>, CoreError> {
        let stored = self.settings.get_subscriptions(user_id).await?;
        Ok(subscription::with_defaults(&stored))
    }

    pub async fn update_subscription(
        &self,
        user_id: DbId,
        category: Category,
        update: SubscriptionUpdate,
    ) -> Result<Subscription, CoreError> {
        let stored = self.settings.get_subscriptions(user_id).await?;
        let next = update.apply(subscription::subscription_for(&stored, category));
        self.settings.put_subscription(user_id, &next).await?;
        self.publish_settings(EventKind::SubscriptionChanged, user_id);
        tracing::info!(user_id, category = %category, in_app = next.enabled, "Subscription updated");
        Ok(next)
    }

    pub async fn is_channel_enabled(
        &self,
        user_id: DbId,
        category: Category,
        channel: Channel,
    ) -> Result<bool, CoreError> {
        let stored = self.settings.get_subscriptions(user_id).await?;
        Ok(subscription::is_channel_enabled(&stored, category, channel))
    }

    // -----------------------------------------------------------------------
    // Preferences
    // -----------------------------------------------------------------------

    pub async fn get_preferences(
        &self,
        user_id: DbId,
    ) -> Result<NotificationPreferences, CoreError> {
        self.preferences_or_default(user_id).await
    }

    pub async fn update_preferences(
        &self,
        user_id: DbId,
        update: PreferencesUpdate,
    ) -> Result<NotificationPreferences, CoreError> {
        let current = self.preferences_or_default(user_id).await?;
        let next = update.apply(&current)?;
        self.settings.put_preferences(user_id, &next).await?;
        self.publish_settings(EventKind::PreferencesChanged, user_id);
        tracing::info!(user_id, "Notification preferences updated");
        Ok(next)
    }

    fn publish_settings(&self, kind: EventKind, user_id: DbId) {
        self.bus
            .publish(CenterEvent::new(kind, user_id, self.clock.now()));
    }
}
