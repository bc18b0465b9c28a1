//! Per-category channel subscriptions.

use serde::{Deserialize, Serialize};

use crate::channels::Channel;
use crate::notification::Category;

/// One user's delivery preference for one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub category: Category,
    /// In-app delivery. Disabling hides the category from the default view.
    pub enabled: bool,
    pub email_enabled: bool,
    pub push_enabled: bool,
}

impl Subscription {
    /// The row assumed when none is stored: in-app on, external channels off.
    pub fn default_for(category: Category) -> Self {
        Self {
            category,
            enabled: true,
            email_enabled: false,
            push_enabled: false,
        }
    }

    pub fn channel_enabled(&self, channel: Channel) -> bool {
        match channel {
            Channel::InApp => self.enabled,
            Channel::Email => self.email_enabled,
            Channel::Push => self.push_enabled,
        }
    }
}

/// Partial update of a single category's subscription.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionUpdate {
    pub enabled: Option<bool>,
    pub email_enabled: Option<bool>,
    pub push_enabled: Option<bool>,
}

impl SubscriptionUpdate {
    pub fn apply(&self, current: Subscription) -> Subscription {
        Subscription {
            category: current.category,
            enabled: self.enabled.unwrap_or(current.enabled),
            email_enabled: self.email_enabled.unwrap_or(current.email_enabled),
            push_enabled: self.push_enabled.unwrap_or(current.push_enabled),
        }
    }
}

/// Resolve the subscription for `category`, falling back to the default row.
pub fn subscription_for(stored: &[Subscription], category: Category) -> Subscription {
    stored
        .iter()
        .find(|s| s.category == category)
        .copied()
        .unwrap_or_else(|| Subscription::default_for(category))
}

/// One entry per category in declaration order, stored rows taking precedence.
pub fn with_defaults(stored: &[Subscription]) -> Vec<Subscription> {
    Category::ALL
        .iter()
        .map(|c| subscription_for(stored, *c))
        .collect()
}

pub fn is_channel_enabled(stored: &[Subscription], category: Category, channel: Channel) -> bool {
    subscription_for(stored, category).channel_enabled(channel)
}

/// Channels a newly submitted notification should be pushed to.
///
/// While suppressed only in-app delivery survives; external channels are
/// deferred. The record itself is always persisted.
pub fn delivery_channels(
    stored: &[Subscription],
    category: Category,
    suppressed: bool,
) -> Vec<Channel> {
    let subscription = subscription_for(stored, category);
    Channel::ALL
        .into_iter()
        .filter(|c| subscription.channel_enabled(*c))
        .filter(|c| !(suppressed && c.is_external()))
        .collect()
}
