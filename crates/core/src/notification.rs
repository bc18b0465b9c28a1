//! Notification data model.
//!
//! A [`Notification`] is either a plain record (`aggregated_count == 1`) or a
//! synthetic group head that has absorbed newer members sharing its
//! `group_key`. Members live only inside the head's member list.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::CoreError;
use crate::types::{DbId, Timestamp};

/// Implements `as_str`, `Display` and `FromStr` for a fieldless enum whose
/// wire/storage form is a fixed snake_case string.
macro_rules! text_enum {
    ($name:ident, $label:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = CoreError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(CoreError::Validation(format!(
                        "Unknown {} '{other}'", $label
                    ))),
                }
            }
        }
    };
}

pub(crate) use text_enum;

// ---------------------------------------------------------------------------
// Enumerations
// ---------------------------------------------------------------------------

/// The business event that raised the notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    TaskAssigned,
    TaskCompleted,
    TaskOverdue,
    TaskComment,
    TaskProgress,
    CommentAdded,
    MilestoneReached,
    MilestoneDue,
    DeadlineReminder,
    Mention,
    PlanSubmitted,
    PlanApproved,
    PlanRejected,
    FeedbackReceived,
    DeliverableUploaded,
    ProjectUpdate,
    MemberJoined,
    System,
}

text_enum!(NotificationType, "notification type", {
    TaskAssigned => "task_assigned",
    TaskCompleted => "task_completed",
    TaskOverdue => "task_overdue",
    TaskComment => "task_comment",
    TaskProgress => "task_progress",
    CommentAdded => "comment_added",
    MilestoneReached => "milestone_reached",
    MilestoneDue => "milestone_due",
    DeadlineReminder => "deadline_reminder",
    Mention => "mention",
    PlanSubmitted => "plan_submitted",
    PlanApproved => "plan_approved",
    PlanRejected => "plan_rejected",
    FeedbackReceived => "feedback_received",
    DeliverableUploaded => "deliverable_uploaded",
    ProjectUpdate => "project_update",
    MemberJoined => "member_joined",
    System => "system",
});

impl NotificationType {
    /// Direct address of the recipient: an @-mention or an assignment to them.
    pub fn addresses_recipient(self) -> bool {
        matches!(self, Self::Mention | Self::TaskAssigned)
    }

    /// Repeated reminders of the same subject count as escalation signals.
    pub fn is_reminder(self) -> bool {
        matches!(
            self,
            Self::DeadlineReminder | Self::TaskOverdue | Self::MilestoneDue
        )
    }
}

/// Coarse grouping used by tabs and subscriptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Task,
    Plan,
    Project,
    Feedback,
    Comment,
    System,
    Reminder,
}

text_enum!(Category, "category", {
    Task => "task",
    Plan => "plan",
    Project => "project",
    Feedback => "feedback",
    Comment => "comment",
    System => "system",
    Reminder => "reminder",
});

/// Producer-assigned urgency. Ordered from least to most urgent.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
    Urgent,
}

text_enum!(Priority, "priority", {
    Low => "low",
    Normal => "normal",
    High => "high",
    Urgent => "urgent",
});

/// Importance class derived by the classifier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AiClassification {
    Important,
    #[default]
    Normal,
    LowPriority,
    Spam,
}

text_enum!(AiClassification, "classification", {
    Important => "important",
    Normal => "normal",
    LowPriority => "low_priority",
    Spam => "spam",
});

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// Snapshot of one notification absorbed into a group head.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberSummary {
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub priority: Priority,
    pub title: String,
    pub content: String,
    pub sender_id: Option<DbId>,
    pub sender_name: Option<String>,
    pub created_at: Timestamp,
}

/// A persisted notification record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: DbId,
    pub user_id: DbId,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub category: Category,
    pub priority: Priority,
    pub title: String,
    pub content: String,
    pub created_at: Timestamp,
    pub sender_id: Option<DbId>,
    pub sender_name: Option<String>,
    pub project_id: Option<DbId>,
    pub related_type: Option<String>,
    pub related_id: Option<DbId>,
    pub action_url: Option<String>,

    pub ai_classification: AiClassification,
    pub ai_score: u8,

    pub is_read: bool,
    pub read_at: Option<Timestamp>,
    pub is_pinned: bool,
    pub is_collapsed: bool,

    pub group_key: Option<String>,
    pub aggregated_count: u32,
    pub aggregated_members: Vec<MemberSummary>,
    /// No further members may merge into this head.
    pub group_closed: bool,

    /// Optimistic-concurrency counter; bumped by the store on every write.
    pub version: i64,
}

impl Notification {
    /// A head that represents more than one raw notification.
    pub fn is_aggregated(&self) -> bool {
        self.aggregated_count > 1
    }

    /// Whether new members may still merge into this record.
    pub fn accepts_members(&self) -> bool {
        self.group_key.is_some() && !self.is_read && !self.group_closed
    }

    /// Summary of this record as it appears in a member list.
    pub fn member_summary(&self) -> MemberSummary {
        MemberSummary {
            notification_type: self.notification_type,
            priority: self.priority,
            title: self.title.clone(),
            content: self.content.clone(),
            sender_id: self.sender_id,
            sender_name: self.sender_name.clone(),
            created_at: self.created_at,
        }
    }
}

/// A raw notification as submitted by a producer.
///
/// Carries the immutable fields only; classification and aggregation fields
/// are computed by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewNotification {
    #[validate(range(min = 1))]
    pub user_id: DbId,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub category: Category,
    #[serde(default)]
    pub priority: Priority,
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    #[serde(default)]
    #[validate(length(max = 10000))]
    pub content: String,
    /// Producer timestamp; the engine clock is used when absent.
    #[serde(default)]
    pub created_at: Option<Timestamp>,
    #[serde(default)]
    pub sender_id: Option<DbId>,
    #[serde(default)]
    pub sender_name: Option<String>,
    #[serde(default)]
    pub project_id: Option<DbId>,
    #[serde(default)]
    pub related_type: Option<String>,
    #[serde(default)]
    pub related_id: Option<DbId>,
    #[serde(default)]
    pub action_url: Option<String>,
}

impl NewNotification {
    /// Minimal constructor; optional fields start empty.
    pub fn new(
        user_id: DbId,
        notification_type: NotificationType,
        category: Category,
        title: impl Into<String>,
    ) -> Self {
        Self {
            user_id,
            notification_type,
            category,
            priority: Priority::Normal,
            title: title.into(),
            content: String::new(),
            created_at: None,
            sender_id: None,
            sender_name: None,
            project_id: None,
            related_type: None,
            related_id: None,
            action_url: None,
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    pub fn with_sender(mut self, sender_id: DbId) -> Self {
        self.sender_id = Some(sender_id);
        self
    }

    pub fn with_subject(mut self, related_type: impl Into<String>, related_id: DbId) -> Self {
        self.related_type = Some(related_type.into());
        self.related_id = Some(related_id);
        self
    }

    pub fn with_project(mut self, project_id: DbId) -> Self {
        self.project_id = Some(project_id);
        self
    }

    pub fn at(mut self, created_at: Timestamp) -> Self {
        self.created_at = Some(created_at);
        self
    }

    /// Check field constraints, mapping failures to [`CoreError::Validation`].
    pub fn validate_fields(&self) -> Result<(), CoreError> {
        self.validate()
            .map_err(|e| CoreError::Validation(e.to_string()))
    }
}

/// A fully computed notification that has not been assigned an id yet.
///
/// Produced by the engine from a [`NewNotification`] and handed to the store
/// adapter, which assigns `id` and `version`.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingNotification {
    pub user_id: DbId,
    pub notification_type: NotificationType,
    pub category: Category,
    pub priority: Priority,
    pub title: String,
    pub content: String,
    pub created_at: Timestamp,
    pub sender_id: Option<DbId>,
    pub sender_name: Option<String>,
    pub project_id: Option<DbId>,
    pub related_type: Option<String>,
    pub related_id: Option<DbId>,
    pub action_url: Option<String>,
    pub ai_classification: AiClassification,
    pub ai_score: u8,
    pub is_pinned: bool,
    pub is_collapsed: bool,
    pub group_key: Option<String>,
}

impl PendingNotification {
    /// Start from a raw submission stamped with `created_at`, unclassified.
    pub fn from_new(raw: NewNotification, created_at: Timestamp) -> Self {
        Self {
            user_id: raw.user_id,
            notification_type: raw.notification_type,
            category: raw.category,
            priority: raw.priority,
            title: raw.title,
            content: raw.content,
            created_at: raw.created_at.unwrap_or(created_at),
            sender_id: raw.sender_id,
            sender_name: raw.sender_name,
            project_id: raw.project_id,
            related_type: raw.related_type,
            related_id: raw.related_id,
            action_url: raw.action_url,
            ai_classification: AiClassification::Normal,
            ai_score: 40,
            is_pinned: false,
            is_collapsed: false,
            group_key: None,
        }
    }

    /// Materialize as a single-member head with the given identity.
    pub fn into_notification(self, id: DbId, version: i64) -> Notification {
        let mut notification = Notification {
            id,
            user_id: self.user_id,
            notification_type: self.notification_type,
            category: self.category,
            priority: self.priority,
            title: self.title,
            content: self.content,
            created_at: self.created_at,
            sender_id: self.sender_id,
            sender_name: self.sender_name,
            project_id: self.project_id,
            related_type: self.related_type,
            related_id: self.related_id,
            action_url: self.action_url,
            ai_classification: self.ai_classification,
            ai_score: self.ai_score,
            is_read: false,
            read_at: None,
            is_pinned: self.is_pinned,
            is_collapsed: self.is_collapsed,
            group_key: self.group_key,
            aggregated_count: 1,
            aggregated_members: Vec::new(),
            group_closed: false,
            version,
        };
        notification.aggregated_members = vec![notification.member_summary()];
        notification
    }

    /// Summary of this notification as it would appear in a member list.
    pub fn member_summary(&self) -> MemberSummary {
        MemberSummary {
            notification_type: self.notification_type,
            priority: self.priority,
            title: self.title.clone(),
            content: self.content.clone(),
            sender_id: self.sender_id,
            sender_name: self.sender_name.clone(),
            created_at: self.created_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    #[test]
    fn text_enums_round_trip_through_str() {
        for t in NotificationType::ALL {
            assert_eq!(t.as_str().parse::<NotificationType>().unwrap(), *t);
        }
        for c in Category::ALL {
            assert_eq!(c.as_str().parse::<Category>().unwrap(), *c);
        }
        assert_eq!(
            "low_priority".parse::<AiClassification>().unwrap(),
            AiClassification::LowPriority
        );
    }

    #[test]
    fn unknown_category_is_a_validation_error() {
        let err = "calendar".parse::<Category>().unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn priority_orders_by_urgency() {
        assert!(Priority::Urgent > Priority::High);
        assert!(Priority::High > Priority::Normal);
        assert!(Priority::Normal > Priority::Low);
    }

    #[test]
    fn enums_serialize_snake_case() {
        let json = serde_json::to_value(AiClassification::LowPriority).unwrap();
        assert_eq!(json, "low_priority");
        let json = serde_json::to_value(NotificationType::DeadlineReminder).unwrap();
        assert_eq!(json, "deadline_reminder");
    }

    #[test]
    fn pending_materializes_as_single_member_head() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        let raw = NewNotification::new(7, NotificationType::TaskComment, Category::Task, "Hi");
        let n = PendingNotification::from_new(raw, at).into_notification(1, 1);
        assert_eq!(n.aggregated_count, 1);
        assert_eq!(n.aggregated_members.len(), 1);
        assert_eq!(n.aggregated_members[0].title, "Hi");
        assert_eq!(n.created_at, at);
        assert!(!n.is_aggregated());
    }

    #[test]
    fn producer_timestamp_wins_over_clock() {
        let clock = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        let producer = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
        let raw = NewNotification::new(7, NotificationType::System, Category::System, "x")
            .at(producer);
        assert_eq!(PendingNotification::from_new(raw, clock).created_at, producer);
    }

    #[test]
    fn empty_title_fails_validation() {
        let raw = NewNotification::new(7, NotificationType::System, Category::System, "");
        assert!(raw.validate_fields().is_err());
    }

    #[test]
    fn non_positive_user_fails_validation() {
        let raw = NewNotification::new(0, NotificationType::System, Category::System, "x");
        assert!(raw.validate_fields().is_err());
    }

    #[test]
    fn deserializes_wire_shape() {
        let raw: NewNotification = serde_json::from_value(serde_json::json!({
            "userId": 3,
            "type": "mention",
            "category": "comment",
            "title": "You were mentioned",
            "relatedType": "task",
            "relatedId": 12
        }))
        .unwrap();
        assert_eq!(raw.notification_type, NotificationType::Mention);
        assert_eq!(raw.priority, Priority::Normal);
        assert_eq!(raw.related_id, Some(12));
    }
}
