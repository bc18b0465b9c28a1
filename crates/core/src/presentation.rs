//! Filtering and ranking of a user's notifications for display.

use std::cmp::Reverse;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::channels::Channel;
use crate::dnd::{is_suppressed, DndSettings};
use crate::error::CoreError;
use crate::notification::{
    text_enum, AiClassification, Category, Notification, NotificationType, Priority,
};
use crate::subscription::{is_channel_enabled, Subscription};
use crate::types::DbId;

/// Default page size when no preference is stored.
pub const DEFAULT_MAX_VISIBLE: usize = 50;

// ---------------------------------------------------------------------------
// Tabs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tab {
    #[default]
    All,
    Unread,
    Pinned,
    Important,
    Task,
    Plan,
    Project,
    Feedback,
    System,
}

text_enum!(Tab, "tab", {
    All => "all",
    Unread => "unread",
    Pinned => "pinned",
    Important => "important",
    Task => "task",
    Plan => "plan",
    Project => "project",
    Feedback => "feedback",
    System => "system",
});

impl Tab {
    /// Categories shown by a category tab; `None` for the state tabs.
    pub fn categories(self) -> Option<&'static [Category]> {
        match self {
            Self::Task => Some(&[Category::Task]),
            Self::Plan => Some(&[Category::Plan]),
            Self::Project => Some(&[Category::Project]),
            Self::Feedback => Some(&[Category::Feedback, Category::Comment]),
            Self::System => Some(&[Category::System, Category::Reminder]),
            Self::All | Self::Unread | Self::Pinned | Self::Important => None,
        }
    }

    pub fn targets(self, category: Category) -> bool {
        self.categories().is_some_and(|c| c.contains(&category))
    }

    pub fn matches(self, n: &Notification) -> bool {
        match self {
            Self::All => true,
            Self::Unread => !n.is_read,
            Self::Pinned => n.is_pinned,
            Self::Important => {
                n.ai_classification == AiClassification::Important
                    || matches!(n.priority, Priority::Urgent | Priority::High)
            }
            _ => self.targets(n.category),
        }
    }
}

// ---------------------------------------------------------------------------
// Group expansion
// ---------------------------------------------------------------------------

/// UI-only expansion state, keyed by head id. Kept apart from the persisted
/// `is_collapsed` flag.
///
/// Group keys repeat across successive groups for the same subject, so a later
/// head never inherits an earlier head's state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupExpansion {
    expanded: HashSet<DbId>,
}

impl GroupExpansion {
    pub fn set(&mut self, head_id: DbId, expanded: bool) {
        if expanded {
            self.expanded.insert(head_id);
        } else {
            self.expanded.remove(&head_id);
        }
    }

    pub fn is_expanded(&self, head_id: DbId) -> bool {
        self.expanded.contains(&head_id)
    }

    pub fn is_empty(&self) -> bool {
        self.expanded.is_empty()
    }

    pub fn expanded_ids(&self) -> impl Iterator<Item = DbId> + '_ {
        self.expanded.iter().copied()
    }

    /// Keep only heads for which `keep` holds.
    pub fn retain(&mut self, mut keep: impl FnMut(DbId) -> bool) {
        self.expanded.retain(|id| keep(*id));
    }
}

// ---------------------------------------------------------------------------
// Listing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListOptions {
    pub tab: Tab,
    pub show_collapsed: bool,
    /// Hide in-app-unsubscribed categories from non-category tabs.
    pub hide_unsubscribed_in_all: bool,
    pub max_visible: usize,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            tab: Tab::All,
            show_collapsed: false,
            hide_unsubscribed_in_all: true,
            max_visible: DEFAULT_MAX_VISIBLE,
        }
    }
}

/// A notification as handed to the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListedNotification {
    #[serde(flatten)]
    pub notification: Notification,
    /// Quiet hours are in effect and no exception applies.
    pub is_suppressed: bool,
    pub is_expanded: bool,
}

/// Inputs gathered by the caller for one listing.
pub struct ListContext<'a> {
    pub subscriptions: &'a [Subscription],
    pub dnd: &'a DndSettings,
    pub quiet: bool,
    pub expansion: &'a GroupExpansion,
}

/// Filter, rank and annotate `records` (in retrieval order).
pub fn present(
    records: Vec<Notification>,
    ctx: &ListContext<'_>,
    opts: &ListOptions,
) -> Vec<ListedNotification> {
    let mut visible: Vec<Notification> = records
        .into_iter()
        .filter(|n| opts.tab.matches(n))
        .filter(|n| is_visible(n, ctx.subscriptions, opts))
        .filter(|n| opts.show_collapsed || !n.is_collapsed)
        .collect();

    rank(&mut visible);
    visible.truncate(opts.max_visible);

    visible
        .into_iter()
        .map(|n| ListedNotification {
            is_suppressed: is_suppressed(
                ctx.quiet,
                ctx.dnd,
                n.priority,
                n.notification_type,
                n.sender_id,
            ),
            is_expanded: ctx.expansion.is_expanded(n.id),
            notification: n,
        })
        .collect()
}

fn is_visible(n: &Notification, subscriptions: &[Subscription], opts: &ListOptions) -> bool {
    if opts.tab.targets(n.category) {
        return true;
    }
    if opts.tab == Tab::All && !opts.hide_unsubscribed_in_all {
        return true;
    }
    is_channel_enabled(subscriptions, n.category, Channel::InApp)
}

/// Stable sort: pinned first, then newest first. Ties keep input order.
pub fn rank(records: &mut [Notification]) {
    records.sort_by_key(|n| (Reverse(n.is_pinned), Reverse(n.created_at)));
}

/// Ids of `low_priority` records not yet collapsed.
pub fn low_priority_to_collapse(records: &[Notification]) -> Vec<DbId> {
    records
        .iter()
        .filter(|n| n.ai_classification == AiClassification::LowPriority && !n.is_collapsed)
        .map(|n| n.id)
        .collect()
}

// ---------------------------------------------------------------------------
// Unread counts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnreadCounts {
    pub total: u64,
    pub by_category: BTreeMap<Category, u64>,
}

impl UnreadCounts {
    /// Heads count by their aggregated size.
    pub fn tally(records: &[Notification]) -> Self {
        let mut counts = Self::default();
        for n in records.iter().filter(|n| !n.is_read) {
            let size = u64::from(n.aggregated_count);
            counts.total += size;
            *counts.by_category.entry(n.category).or_default() += size;
        }
        counts
    }
}

// ---------------------------------------------------------------------------
// Statistics
// ---------------------------------------------------------------------------

/// Totals over every stored record of a user, weighted like [`UnreadCounts`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationStatistics {
    pub total: u64,
    pub read: u64,
    pub unread: u64,
    pub pinned: u64,
    /// Unread notifications per type.
    pub unread_by_type: BTreeMap<NotificationType, u64>,
}

impl NotificationStatistics {
    pub fn tally(records: &[Notification]) -> Self {
        let mut stats = Self::default();
        for n in records {
            let size = u64::from(n.aggregated_count);
            stats.total += size;
            if n.is_pinned {
                stats.pinned += 1;
            }
            if n.is_read {
                stats.read += size;
            } else {
                stats.unread += size;
                *stats.unread_by_type.entry(n.notification_type).or_default() += size;
            }
        }
        stats
    }
}
