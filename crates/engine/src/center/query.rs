//! Read-only queries: listing, single fetch, unread counts.

use std::collections::HashSet;

use mota_core::error::CoreError;
use mota_core::presentation::{
    present, GroupExpansion, ListContext, ListOptions, ListedNotification, NotificationStatistics,
    Tab, UnreadCounts,
};
use mota_core::types::{DbId, Timestamp};
use mota_db::NotificationFilter;

use super::NotificationCenter;

impl NotificationCenter {
    /// The ranked, filtered view for a tab.
    ///
    /// Missing DND, subscription or preference rows resolve to defaults.
    pub async fn list(
        &self,
        user_id: DbId,
        tab: Tab,
        show_collapsed: bool,
    ) -> Result<Vec<ListedNotification>, CoreError> {
        let records = self
            .notifications
            .get_by_user(user_id, &NotificationFilter::default())
            .await?;
        let subscriptions = self.settings.get_subscriptions(user_id).await?;
        let dnd = self.dnd_or_default(user_id).await?;
        let prefs = self.preferences_or_default(user_id).await?;

        let opts = ListOptions {
            tab,
            show_collapsed,
            hide_unsubscribed_in_all: self.config.hide_unsubscribed_in_all,
            max_visible: prefs.max_visible_notifications as usize,
        };
        let expansion = self.expansion.read().await;
        let empty = GroupExpansion::default();
        let ctx = ListContext {
            subscriptions: &subscriptions,
            dnd: &dnd,
            quiet: dnd.is_quiet(self.clock.now()),
            expansion: expansion.get(&user_id).unwrap_or(&empty),
        };
        let listed = present(records, &ctx, &opts);
        tracing::debug!(user_id, tab = %tab, count = listed.len(), "Listed notifications");
        Ok(listed)
    }

    pub async fn get(&self, user_id: DbId, id: DbId) -> Result<ListedNotification, CoreError> {
        let n = self.owned(user_id, id).await?;
        self.annotate(n).await
    }

    pub async fn unread_counts(&self, user_id: DbId) -> Result<UnreadCounts, CoreError> {
        let unread = self
            .notifications
            .get_by_user(user_id, &NotificationFilter::unread())
            .await?;
        Ok(UnreadCounts::tally(&unread))
    }

    pub async fn statistics(&self, user_id: DbId) -> Result<NotificationStatistics, CoreError> {
        let records = self
            .notifications
            .get_by_user(user_id, &NotificationFilter::default())
            .await?;
        Ok(NotificationStatistics::tally(&records))
    }

    /// Retention: remove every record created before `cutoff`, then drop
    /// expansion state for heads that no longer exist.
    pub async fn purge_created_before(&self, cutoff: Timestamp) -> Result<u64, CoreError> {
        let purged = self.notifications.delete_created_before(cutoff).await?;
        if purged > 0 {
            self.prune_expansion().await?;
        }
        Ok(purged)
    }

    async fn prune_expansion(&self) -> Result<(), CoreError> {
        let tracked: Vec<DbId> = self
            .expansion
            .read()
            .await
            .values()
            .flat_map(|state| state.expanded_ids())
            .collect();
        let mut gone = HashSet::new();
        for id in tracked {
            if self.notifications.get(id).await?.is_none() {
                gone.insert(id);
            }
        }
        if gone.is_empty() {
            return Ok(());
        }
        let mut expansion = self.expansion.write().await;
        for state in expansion.values_mut() {
            state.retain(|id| !gone.contains(&id));
        }
        expansion.retain(|_, state| !state.is_empty());
        tracing::debug!(pruned = gone.len(), "Dropped expansion state of purged heads");
        Ok(())
    }

    /// Number of heads with tracked expansion state for `user_id`.
    pub async fn expanded_head_count(&self, user_id: DbId) -> usize {
        self.expansion
            .read()
            .await
            .get(&user_id)
            .map_or(0, |state| state.expanded_ids().count())
    }

    /// Whether the notification store answers.
    pub async fn store_healthy(&self) -> bool {
        match self.notifications.ping().await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "Notification store health check failed");
                false
            }
        }
    }

    /// Cutoff for the configured retention period, relative to the engine clock.
    pub fn retention_cutoff(&self) -> Timestamp {
        self.clock.now() - chrono::Duration::days(i64::from(self.config.retention_days))
    }
}
