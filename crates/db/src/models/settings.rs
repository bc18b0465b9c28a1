//! Row models for the per-user settings tables.

use mota_core::dnd::{DndOverride, DndSettings};
use mota_core::preferences::NotificationPreferences;
use mota_core::subscription::Subscription;
use mota_core::types::{DbId, Timestamp};
use sqlx::FromRow;

use crate::store::StoreError;

/// A row from the `dnd_settings` table.
#[derive(Debug, Clone, FromRow)]
pub struct DndSettingsRow {
    pub user_id: DbId,
    pub enabled: bool,
    pub start_time: String,
    pub end_time: String,
    pub weekdays: Vec<i16>,
    pub allow_urgent: bool,
    pub allow_mentions: bool,
    pub except_senders: Vec<DbId>,
    pub utc_offset_minutes: i32,
    pub override_active: bool,
    pub override_until: Option<Timestamp>,
}

impl TryFrom<DndSettingsRow> for DndSettings {
    type Error = StoreError;

    fn try_from(row: DndSettingsRow) -> Result<Self, Self::Error> {
        let weekdays = row
            .weekdays
            .iter()
            .map(|d| u8::try_from(*d))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| StoreError::Corrupt(format!("dnd_settings {}: {e}", row.user_id)))?;
        let dnd_override = match (row.override_active, row.override_until) {
            (false, _) => None,
            (true, Some(until)) => Some(DndOverride::Until(until)),
            (true, None) => Some(DndOverride::Indefinite),
        };
        Ok(DndSettings {
            enabled: row.enabled,
            start_time: row.start_time,
            end_time: row.end_time,
            weekdays,
            allow_urgent: row.allow_urgent,
            allow_mentions: row.allow_mentions,
            except_senders: row.except_senders,
            utc_offset_minutes: row.utc_offset_minutes,
            dnd_override,
        })
    }
}

/// A row from the `notification_subscriptions` table.
#[derive(Debug, Clone, FromRow)]
pub struct SubscriptionRow {
    pub user_id: DbId,
    pub category: String,
    pub enabled: bool,
    pub email_enabled: bool,
    pub push_enabled: bool,
}

impl TryFrom<SubscriptionRow> for Subscription {
    type Error = StoreError;

    fn try_from(row: SubscriptionRow) -> Result<Self, Self::Error> {
        Ok(Subscription {
            category: row.category.parse().map_err(|e| {
                StoreError::Corrupt(format!("subscription for user {}: {e}", row.user_id))
            })?,
            enabled: row.enabled,
            email_enabled: row.email_enabled,
            push_enabled: row.push_enabled,
        })
    }
}

/// A row from the `notification_preferences` table.
#[derive(Debug, Clone, FromRow)]
pub struct PreferencesRow {
    pub user_id: DbId,
    pub enable_aggregation: bool,
    pub aggregation_interval_minutes: i32,
    pub enable_ai_classification: bool,
    pub auto_collapse_threshold: i16,
    pub auto_pin_urgent: bool,
    pub auto_pin_mentions: bool,
    pub show_low_priority_collapsed: bool,
    pub max_visible_notifications: i32,
}

impl TryFrom<PreferencesRow> for NotificationPreferences {
    type Error = StoreError;

    fn try_from(row: PreferencesRow) -> Result<Self, Self::Error> {
        let corrupt = |e: std::num::TryFromIntError| {
            StoreError::Corrupt(format!("preferences for user {}: {e}", row.user_id))
        };
        Ok(NotificationPreferences {
            enable_aggregation: row.enable_aggregation,
            aggregation_interval_minutes: u32::try_from(row.aggregation_interval_minutes)
                .map_err(corrupt)?,
            enable_ai_classification: row.enable_ai_classification,
            auto_collapse_threshold: u8::try_from(row.auto_collapse_threshold).map_err(corrupt)?,
            auto_pin_urgent: row.auto_pin_urgent,
            auto_pin_mentions: row.auto_pin_mentions,
            show_low_priority_collapsed: row.show_low_priority_collapsed,
            max_visible_notifications: u32::try_from(row.max_visible_notifications)
                .map_err(corrupt)?,
        })
    }
}
