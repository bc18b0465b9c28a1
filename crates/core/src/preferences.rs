//! Per-user notification behaviour preferences.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::aggregation::AggregationPolicy;
use crate::classifier::Classification;
use crate::error::CoreError;
use crate::notification::{
    AiClassification, Notification, NotificationType, PendingNotification, Priority,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPreferences {
    pub enable_aggregation: bool,
    #[validate(range(min = 5, max = 120))]
    pub aggregation_interval_minutes: u32,
    /// When off every record gets [`Classification::SAFE_DEFAULT`].
    pub enable_ai_classification: bool,
    /// New records scoring below this are stored collapsed. Zero disables.
    #[validate(range(max = 100))]
    pub auto_collapse_threshold: u8,
    pub auto_pin_urgent: bool,
    pub auto_pin_mentions: bool,
    pub show_low_priority_collapsed: bool,
    #[validate(range(min = 10, max = 200))]
    pub max_visible_notifications: u32,
}

impl Default for NotificationPreferences {
    fn default() -> Self {
        Self {
            enable_aggregation: true,
            aggregation_interval_minutes: 30,
            enable_ai_classification: true,
            auto_collapse_threshold: 30,
            auto_pin_urgent: true,
            auto_pin_mentions: false,
            show_low_priority_collapsed: true,
            max_visible_notifications: 50,
        }
    }
}

impl NotificationPreferences {
    pub fn aggregation_policy(&self, max_members: usize) -> AggregationPolicy {
        AggregationPolicy {
            enabled: self.enable_aggregation,
            window: Duration::minutes(i64::from(self.aggregation_interval_minutes)),
            max_members,
        }
    }

    /// Intake presentation flags for a freshly classified record.
    pub fn apply_intake_flags(&self, pending: &mut PendingNotification, class: Classification) {
        pending.is_pinned = (self.auto_pin_urgent && pending.priority == Priority::Urgent)
            || (self.auto_pin_mentions && pending.notification_type == NotificationType::Mention);
        pending.is_collapsed = self.collapses_at_intake(class.score, class.classification);
    }

    fn collapses_at_intake(&self, score: u8, classification: AiClassification) -> bool {
        score < self.auto_collapse_threshold
            || (self.show_low_priority_collapsed && classification == AiClassification::LowPriority)
    }

    /// Re-check an open head after a merge raised its score or class.
    ///
    /// Only open heads carry an intake collapse: every user collapse closes
    /// the group, so a closed head keeps its flag. A merge never collapses.
    pub fn release_intake_collapse(&self, head: &mut Notification) {
        if head.is_collapsed
            && !head.group_closed
            && !self.collapses_at_intake(head.ai_score, head.ai_classification)
        {
            head.is_collapsed = false;
        }
    }
}

/// Partial preferences update; absent fields keep their stored value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PreferencesUpdate {
    pub enable_aggregation: Option<bool>,
    #[validate(range(min = 5, max = 120))]
    pub aggregation_interval_minutes: Option<u32>,
    pub enable_ai_classification: Option<bool>,
    #[validate(range(max = 100))]
    pub auto_collapse_threshold: Option<u8>,
    pub auto_pin_urgent: Option<bool>,
    pub auto_pin_mentions: Option<bool>,
    pub show_low_priority_collapsed: Option<bool>,
    #[validate(range(min = 10, max = 200))]
    pub max_visible_notifications: Option<u32>,
}

impl PreferencesUpdate {
    pub fn apply(&self, current: &NotificationPreferences) -> Result<NotificationPreferences, CoreError> {
        self.validate()
            .map_err(|e| CoreError::Validation(e.to_string()))?;
        Ok(NotificationPreferences {
            enable_aggregation: self.enable_aggregation.unwrap_or(current.enable_aggregation),
            aggregation_interval_minutes: self
                .aggregation_interval_minutes
                .unwrap_or(current.aggregation_interval_minutes),
            enable_ai_classification: self
                .enable_ai_classification
                .unwrap_or(current.enable_ai_classification),
            auto_collapse_threshold: self
                .auto_collapse_threshold
                .unwrap_or(current.auto_collapse_threshold),
            auto_pin_urgent: self.auto_pin_urgent.unwrap_or(current.auto_pin_urgent),
            auto_pin_mentions: self.auto_pin_mentions.unwrap_or(current.auto_pin_mentions),
            show_low_priority_collapsed: self
                .show_low_priority_collapsed
                .unwrap_or(current.show_low_priority_collapsed),
            max_visible_notifications: self
                .max_visible_notifications
                .unwrap_or(current.max_visible_notifications),
        })
    }
}
