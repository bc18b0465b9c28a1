//! Grouping of related notifications into a single head record.
//!
//! Notifications for the same user, category, type and subject share a
//! [`group_key`]. A new notification merges into an open head with that key
//! when the head was created within the aggregation window; otherwise it
//! starts a new group.

use chrono::Duration;

use crate::classifier::Classification;
use crate::hashing::sha256_hex;
use crate::notification::{Category, Notification, NotificationType, PendingNotification};
use crate::types::DbId;

/// Default aggregation window in minutes.
pub const DEFAULT_WINDOW_MINS: i64 = 30;

/// Default number of member summaries retained on a head.
pub const DEFAULT_MAX_MEMBERS: usize = 50;

// ---------------------------------------------------------------------------
// Policy
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregationPolicy {
    /// When `false` every notification forms its own group.
    pub enabled: bool,
    pub window: Duration,
    pub max_members: usize,
}

impl Default for AggregationPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            window: Duration::minutes(DEFAULT_WINDOW_MINS),
            max_members: DEFAULT_MAX_MEMBERS,
        }
    }
}

impl AggregationPolicy {
    /// Whether a head created at `head` may absorb a notification created at `new`.
    fn within_window(&self, head: &Notification, new: &PendingNotification) -> bool {
        let delta = new.created_at - head.created_at;
        delta <= self.window && delta >= -self.window
    }
}

// ---------------------------------------------------------------------------
// Group key
// ---------------------------------------------------------------------------

/// Stable group key over `(user, category, type, subject)`.
pub fn group_key(
    user_id: DbId,
    category: Category,
    notification_type: NotificationType,
    subject: Option<&str>,
) -> String {
    let material = format!(
        "{user_id}|{}|{}|{}",
        category.as_str(),
        notification_type.as_str(),
        subject.unwrap_or("-")
    );
    sha256_hex(material.as_bytes())
}

/// The entity a notification is about: the related entity when present,
/// otherwise its project.
pub fn subject_of(n: &PendingNotification) -> Option<String> {
    match (&n.related_type, n.related_id, n.project_id) {
        (Some(kind), Some(id), _) => Some(format!("{kind}:{id}")),
        (None, Some(id), _) => Some(format!("related:{id}")),
        (_, None, Some(project)) => Some(format!("project:{project}")),
        _ => None,
    }
}

/// Compute the group key of a pending notification.
pub fn group_key_for(n: &PendingNotification) -> String {
    group_key(
        n.user_id,
        n.category,
        n.notification_type,
        subject_of(n).as_deref(),
    )
}

// ---------------------------------------------------------------------------
// Decision
// ---------------------------------------------------------------------------

/// Outcome of evaluating a new notification against recent records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AggregationDecision {
    /// Start a new group. `stale_heads` are open heads for the same key whose
    /// window has lapsed and must be closed first.
    NewHead { stale_heads: Vec<DbId> },
    /// Merge into the existing head with this id.
    MergeInto(DbId),
}

/// Decide whether `new` (with its `group_key` already set) starts a group or
/// joins one among `recent`.
pub fn decide(
    new: &PendingNotification,
    recent: &[Notification],
    policy: &AggregationPolicy,
) -> AggregationDecision {
    let Some(key) = new.group_key.as_deref() else {
        return AggregationDecision::NewHead {
            stale_heads: Vec::new(),
        };
    };

    let open: Vec<&Notification> = recent
        .iter()
        .filter(|n| n.user_id == new.user_id)
        .filter(|n| n.group_key.as_deref() == Some(key) && n.accepts_members())
        .collect();

    if policy.enabled {
        let target = open
            .iter()
            .filter(|head| policy.within_window(head, new))
            .max_by_key(|head| (head.created_at, head.id));
        if let Some(head) = target {
            return AggregationDecision::MergeInto(head.id);
        }
    }

    AggregationDecision::NewHead {
        stale_heads: open.iter().map(|head| head.id).collect(),
    }
}

/// Escalation signals for the classifier: for reminder-like types, how many
/// notifications the open head for the same group already holds unread.
pub fn escalation_signals(new: &PendingNotification, recent: &[Notification]) -> u32 {
    if !new.notification_type.is_reminder() {
        return 0;
    }
    let Some(key) = new.group_key.as_deref() else {
        return 0;
    };
    recent
        .iter()
        .filter(|n| n.user_id == new.user_id)
        .filter(|n| n.group_key.as_deref() == Some(key) && n.accepts_members())
        .map(|n| n.aggregated_count)
        .max()
        .unwrap_or(0)
}

// ---------------------------------------------------------------------------
// Merge
// ---------------------------------------------------------------------------

/// Title shown on a head holding `count` notifications.
pub fn summary_title(count: u32, category: Category) -> String {
    format!("{count} new {} updates", category.as_str())
}

/// Fold `new` into `head`.
///
/// The member list stays newest first and bounded by `max_members`; dropped
/// members remain counted in `aggregated_count`.
pub fn merge(
    head: &mut Notification,
    new: &PendingNotification,
    classification: Classification,
    max_members: usize,
) {
    head.aggregated_count += 1;

    let summary = new.member_summary();
    let position = head
        .aggregated_members
        .iter()
        .position(|m| m.created_at <= summary.created_at)
        .unwrap_or(head.aggregated_members.len());
    head.aggregated_members.insert(position, summary);
    head.aggregated_members.truncate(max_members.max(1));

    if new.created_at >= head.created_at {
        head.created_at = new.created_at;
        head.content = new.content.clone();
        head.sender_id = new.sender_id;
        head.sender_name = new.sender_name.clone();
        if new.action_url.is_some() {
            head.action_url = new.action_url.clone();
        }
    }
    head.title = summary_title(head.aggregated_count, head.category);
    head.priority = head.priority.max(new.priority);

    if classification.score > head.ai_score {
        head.ai_score = classification.score;
        head.ai_classification = classification.classification;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::notification::{AiClassification, NewNotification, Priority};
    use crate::types::Timestamp;

    fn t(min: i64) -> Timestamp {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap() + Duration::minutes(min)
    }

    fn pending_at(min: i64, content: &str) -> PendingNotification {
        let raw = NewNotification::new(1, NotificationType::TaskComment, Category::Task, "c")
            .with_subject("task", 99)
            .with_content(content)
            .at(t(min));
        let mut p = PendingNotification::from_new(raw, t(min));
        p.group_key = Some(group_key_for(&p));
        p
    }

    fn head_from(p: PendingNotification, id: DbId) -> Notification {
        p.into_notification(id, 1)
    }

    #[test]
    fn group_key_is_stable_and_distinguishes_subjects() {
        let a = group_key(1, Category::Task, NotificationType::TaskComment, Some("task:1"));
        let b = group_key(1, Category::Task, NotificationType::TaskComment, Some("task:1"));
        let c = group_key(1, Category::Task, NotificationType::TaskComment, Some("task:2"));
        let d = group_key(2, Category::Task, NotificationType::TaskComment, Some("task:1"));
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn subject_prefers_related_entity_over_project() {
        let raw = NewNotification::new(1, NotificationType::TaskComment, Category::Task, "c")
            .with_subject("task", 5)
            .with_project(8);
        let p = PendingNotification::from_new(raw, t(0));
        assert_eq!(subject_of(&p).as_deref(), Some("task:5"));

        let raw = NewNotification::new(1, NotificationType::ProjectUpdate, Category::Project, "c")
            .with_project(8);
        let p = PendingNotification::from_new(raw, t(0));
        assert_eq!(subject_of(&p).as_deref(), Some("project:8"));
    }

    #[test]
    fn merges_into_open_head_within_window() {
        let head = head_from(pending_at(0, "first"), 10);
        let new = pending_at(5, "second");
        let decision = decide(&new, &[head], &AggregationPolicy::default());
        assert_eq!(decision, AggregationDecision::MergeInto(10));
    }

    #[test]
    fn lapsed_window_starts_new_group_and_closes_stale_head() {
        let head = head_from(pending_at(0, "first"), 10);
        let new = pending_at(31, "late");
        let decision = decide(&new, &[head], &AggregationPolicy::default());
        assert_eq!(
            decision,
            AggregationDecision::NewHead {
                stale_heads: vec![10]
            }
        );
    }

    #[test]
    fn read_head_is_never_reopened() {
        let mut head = head_from(pending_at(0, "first"), 10);
        head.is_read = true;
        let decision = decide(&pending_at(1, "x"), &[head], &AggregationPolicy::default());
        assert_eq!(
            decision,
            AggregationDecision::NewHead {
                stale_heads: vec![]
            }
        );
    }

    #[test]
    fn closed_head_is_never_reopened() {
        let mut head = head_from(pending_at(0, "first"), 10);
        head.group_closed = true;
        let decision = decide(&pending_at(1, "x"), &[head], &AggregationPolicy::default());
        assert!(matches!(decision, AggregationDecision::NewHead { .. }));
    }

    #[test]
    fn disabled_policy_never_merges() {
        let head = head_from(pending_at(0, "first"), 10);
        let policy = AggregationPolicy {
            enabled: false,
            ..AggregationPolicy::default()
        };
        let decision = decide(&pending_at(1, "x"), &[head], &policy);
        assert_eq!(
            decision,
            AggregationDecision::NewHead {
                stale_heads: vec![10]
            }
        );
    }

    #[test]
    fn merge_counts_and_orders_members_newest_first() {
        let mut head = head_from(pending_at(0, "first"), 10);
        merge(
            &mut head,
            &pending_at(2, "second"),
            Classification::SAFE_DEFAULT,
            DEFAULT_MAX_MEMBERS,
        );
        assert_eq!(head.aggregated_count, 2);
        assert_eq!(head.aggregated_members.len(), 2);
        assert_eq!(head.aggregated_members[0].content, "second");
        assert_eq!(head.aggregated_members[1].content, "first");
        assert_eq!(head.created_at, t(2));
        assert_eq!(head.title, "2 new task updates");
        assert_eq!(head.content, "second");
    }

    #[test]
    fn out_of_order_member_is_placed_by_timestamp() {
        let mut head = head_from(pending_at(10, "late"), 10);
        merge(
            &mut head,
            &pending_at(5, "early"),
            Classification::SAFE_DEFAULT,
            DEFAULT_MAX_MEMBERS,
        );
        assert_eq!(head.aggregated_members[0].content, "late");
        assert_eq!(head.aggregated_members[1].content, "early");
        assert_eq!(head.created_at, t(10));
        assert_eq!(head.content, "late");
    }

    #[test]
    fn member_overflow_is_dropped_but_counted() {
        let mut head = head_from(pending_at(0, "m0"), 10);
        for i in 1..=5 {
            merge(
                &mut head,
                &pending_at(i, &format!("m{i}")),
                Classification::SAFE_DEFAULT,
                3,
            );
        }
        assert_eq!(head.aggregated_count, 6);
        assert_eq!(head.aggregated_members.len(), 3);
        assert_eq!(head.aggregated_members[0].content, "m5");
        assert_eq!(head.aggregated_members[2].content, "m3");
    }

    #[test]
    fn merge_keeps_highest_priority_and_score() {
        let mut head = head_from(pending_at(0, "a"), 10);
        let mut urgent = pending_at(1, "b");
        urgent.priority = Priority::Urgent;
        merge(
            &mut head,
            &urgent,
            Classification::from_score(90),
            DEFAULT_MAX_MEMBERS,
        );
        assert_eq!(head.priority, Priority::Urgent);
        assert_eq!(head.ai_score, 90);
        assert_eq!(head.ai_classification, AiClassification::Important);

        merge(
            &mut head,
            &pending_at(2, "c"),
            Classification::from_score(15),
            DEFAULT_MAX_MEMBERS,
        );
        assert_eq!(head.priority, Priority::Urgent);
        assert_eq!(head.ai_score, 90);
    }

    #[test]
    fn escalation_counts_only_reminders() {
        let head = head_from(pending_at(0, "a"), 10);
        assert_eq!(escalation_signals(&pending_at(1, "b"), &[head]), 0);

        let raw = NewNotification::new(1, NotificationType::DeadlineReminder, Category::Reminder, "r")
            .with_subject("task", 99)
            .at(t(0));
        let mut first = PendingNotification::from_new(raw.clone(), t(0));
        first.group_key = Some(group_key_for(&first));
        let mut reminder_head = first.clone().into_notification(20, 1);
        reminder_head.aggregated_count = 2;
        assert_eq!(escalation_signals(&first, &[reminder_head]), 2);
    }
}
