//! Repository for the `dnd_settings`, `notification_subscriptions` and
//! `notification_preferences` tables.

use mota_core::dnd::{DndOverride, DndSettings};
use mota_core::preferences::NotificationPreferences;
use mota_core::subscription::Subscription;
use mota_core::types::DbId;
use sqlx::PgPool;

use crate::models::settings::{DndSettingsRow, PreferencesRow, SubscriptionRow};
use crate::store::StoreError;

const DND_COLUMNS: &str = "user_id, enabled, start_time, end_time, weekdays, allow_urgent, \
    allow_mentions, except_senders, utc_offset_minutes, override_active, override_until";

const SUBSCRIPTION_COLUMNS: &str = "user_id, category, enabled, email_enabled, push_enabled";

const PREFERENCE_COLUMNS: &str = "user_id, enable_aggregation, aggregation_interval_minutes, \
    enable_ai_classification, auto_collapse_threshold, auto_pin_urgent, auto_pin_mentions, \
    show_low_priority_collapsed, max_visible_notifications";

/// Provides get/upsert operations for per-user settings rows.
pub struct SettingsRepo;

impl SettingsRepo {
    pub async fn get_dnd(pool: &PgPool, user_id: DbId) -> Result<Option<DndSettings>, StoreError> {
        let query = format!("SELECT {DND_COLUMNS} FROM dnd_settings WHERE user_id = $1");
        sqlx::query_as::<_, DndSettingsRow>(&query)
            .bind(user_id)
            .fetch_optional(pool)
            .await?
            .map(DndSettings::try_from)
            .transpose()
    }

    /// Upsert the schedule columns, leaving override columns as stored.
    pub async fn upsert_dnd_schedule(
        pool: &PgPool,
        user_id: DbId,
        s: &DndSettings,
    ) -> Result<(), StoreError> {
        let weekdays: Vec<i16> = s.weekdays.iter().map(|d| i16::from(*d)).collect();
        sqlx::query(
            "INSERT INTO dnd_settings \
                (user_id, enabled, start_time, end_time, weekdays, allow_urgent, \
                 allow_mentions, except_senders, utc_offset_minutes) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             ON CONFLICT (user_id) DO UPDATE SET \
                enabled = EXCLUDED.enabled, \
                start_time = EXCLUDED.start_time, \
                end_time = EXCLUDED.end_time, \
                weekdays = EXCLUDED.weekdays, \
                allow_urgent = EXCLUDED.allow_urgent, \
                allow_mentions = EXCLUDED.allow_mentions, \
                except_senders = EXCLUDED.except_senders, \
                utc_offset_minutes = EXCLUDED.utc_offset_minutes, \
                updated_at = NOW()",
        )
        .bind(user_id)
        .bind(s.enabled)
        .bind(&s.start_time)
        .bind(&s.end_time)
        .bind(weekdays)
        .bind(s.allow_urgent)
        .bind(s.allow_mentions)
        .bind(&s.except_senders)
        .bind(s.utc_offset_minutes)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Upsert the override columns only.
    pub async fn upsert_dnd_override(
        pool: &PgPool,
        user_id: DbId,
        dnd_override: Option<DndOverride>,
    ) -> Result<(), StoreError> {
        let active = dnd_override.is_some();
        let until = dnd_override.and_then(|o| o.until());
        sqlx::query(
            "INSERT INTO dnd_settings (user_id, override_active, override_until) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (user_id) DO UPDATE SET \
                override_active = EXCLUDED.override_active, \
                override_until = EXCLUDED.override_until, \
                updated_at = NOW()",
        )
        .bind(user_id)
        .bind(active)
        .bind(until)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn list_subscriptions(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<Subscription>, StoreError> {
        let query = format!(
            "SELECT {SUBSCRIPTION_COLUMNS} FROM notification_subscriptions \
             WHERE user_id = $1 ORDER BY category"
        );
        sqlx::query_as::<_, SubscriptionRow>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await?
            .into_iter()
            .map(Subscription::try_from)
            .collect()
    }

    pub async fn upsert_subscription(
        pool: &PgPool,
        user_id: DbId,
        s: &Subscription,
    ) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO notification_subscriptions \
                (user_id, category, enabled, email_enabled, push_enabled) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (user_id, category) DO UPDATE SET \
                enabled = EXCLUDED.enabled, \
                email_enabled = EXCLUDED.email_enabled, \
                push_enabled = EXCLUDED.push_enabled, \
                updated_at = NOW()",
        )
        .bind(user_id)
        .bind(s.category.as_str())
        .bind(s.enabled)
        .bind(s.email_enabled)
        .bind(s.push_enabled)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn get_preferences(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Option<NotificationPreferences>, StoreError> {
        let query = format!(
            "SELECT {PREFERENCE_COLUMNS} FROM notification_preferences WHERE user_id = $1"
        );
        sqlx::query_as::<_, PreferencesRow>(&query)
            .bind(user_id)
            .fetch_optional(pool)
            .await?
            .map(NotificationPreferences::try_from)
            .transpose()
    }

    pub async fn upsert_preferences(
        pool: &PgPool,
        user_id: DbId,
        p: &NotificationPreferences,
    ) -> Result<(), StoreError> {
        let to_i32 = |v: u32| {
            i32::try_from(v).map_err(|e| StoreError::Corrupt(format!("preferences: {e}")))
        };
        sqlx::query(
            "INSERT INTO notification_preferences \
                (user_id, enable_aggregation, aggregation_interval_minutes, \
                 enable_ai_classification, auto_collapse_threshold, auto_pin_urgent, \
                 auto_pin_mentions, show_low_priority_collapsed, max_visible_notifications) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             ON CONFLICT (user_id) DO UPDATE SET \
                enable_aggregation = EXCLUDED.enable_aggregation, \
                aggregation_interval_minutes = EXCLUDED.aggregation_interval_minutes, \
                enable_ai_classification = EXCLUDED.enable_ai_classification, \
                auto_collapse_threshold = EXCLUDED.auto_collapse_threshold, \
                auto_pin_urgent = EXCLUDED.auto_pin_urgent, \
                auto_pin_mentions = EXCLUDED.auto_pin_mentions, \
                show_low_priority_collapsed = EXCLUDED.show_low_priority_collapsed, \
                max_visible_notifications = EXCLUDED.max_visible_notifications, \
                updated_at = NOW()",
        )
        .bind(user_id)
        .bind(p.enable_aggregation)
        .bind(to_i32(p.aggregation_interval_minutes)?)
        .bind(p.enable_ai_classification)
        .bind(i16::from(p.auto_collapse_threshold))
        .bind(p.auto_pin_urgent)
        .bind(p.auto_pin_mentions)
        .bind(p.show_low_priority_collapsed)
        .bind(to_i32(p.max_visible_notifications)?)
        .execute(pool)
        .await?;
        Ok(())
    }
}
