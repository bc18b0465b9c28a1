//! User actions on notifications.
//!
//! Each action is a single command applied to the store; callers reflect it
//! locally only after it returns.

use mota_core::error::CoreError;
use mota_core::notification::{AiClassification, Category, Notification};
use mota_core::presentation::{low_priority_to_collapse, ListedNotification};
use mota_core::types::{DbId, Timestamp};
use mota_db::NotificationFilter;
use mota_events::EventKind;

use super::NotificationCenter;

/// Monotonic read transition. Reading a head closes its group window.
fn apply_read(n: &mut Notification, now: Timestamp) -> bool {
    if n.is_read {
        return false;
    }
    n.is_read = true;
    n.read_at = Some(now);
    n.group_closed = true;
    true
}

impl NotificationCenter {
    pub async fn mark_read(&self, user_id: DbId, id: DbId) -> Result<Notification, CoreError> {
        let now = self.clock.now();
        let (n, changed) = self.mutate(user_id, id, |n| apply_read(n, now)).await?;
        if changed {
            self.publish(EventKind::Updated, user_id, [id]);
        }
        Ok(n)
    }

    /// Mark every unread record read. Returns how many changed.
    pub async fn mark_all_read(&self, user_id: DbId) -> Result<u64, CoreError> {
        self.mark_read_where(user_id, NotificationFilter::unread())
            .await
    }

    pub async fn mark_category_read(
        &self,
        user_id: DbId,
        category: Category,
    ) -> Result<u64, CoreError> {
        let filter = NotificationFilter {
            categories: Some(vec![category]),
            ..NotificationFilter::unread()
        };
        self.mark_read_where(user_id, filter).await
    }

    /// Mark the listed records read; ids not owned by the user are skipped.
    pub async fn batch_mark_read(&self, user_id: DbId, ids: &[DbId]) -> Result<u64, CoreError> {
        let now = self.clock.now();
        let mut changed_ids = Vec::new();
        for id in ids {
            match self.mutate(user_id, *id, |n| apply_read(n, now)).await {
                Ok((_, true)) => changed_ids.push(*id),
                Ok((_, false)) | Err(CoreError::NotFound { .. }) => {}
                Err(e) => return Err(e),
            }
        }
        let count = changed_ids.len() as u64;
        if count > 0 {
            self.publish(EventKind::Updated, user_id, changed_ids);
        }
        Ok(count)
    }

    async fn mark_read_where(
        &self,
        user_id: DbId,
        filter: NotificationFilter,
    ) -> Result<u64, CoreError> {
        let ids: Vec<DbId> = self
            .notifications
            .get_by_user(user_id, &filter)
            .await?
            .into_iter()
            .map(|n| n.id)
            .collect();
        let count = self.batch_mark_read(user_id, &ids).await?;
        tracing::info!(user_id, count, "Marked notifications read");
        Ok(count)
    }

    pub async fn toggle_pin(&self, user_id: DbId, id: DbId) -> Result<Notification, CoreError> {
        let (n, _) = self
            .mutate(user_id, id, |n| {
                n.is_pinned = !n.is_pinned;
                true
            })
            .await?;
        self.publish(EventKind::Updated, user_id, [id]);
        Ok(n)
    }

    /// Flip the persisted collapse flag. Closes the record's group window.
    pub async fn toggle_collapse(&self, user_id: DbId, id: DbId) -> Result<Notification, CoreError> {
        let (n, _) = self
            .mutate(user_id, id, |n| {
                n.is_collapsed = !n.is_collapsed;
                n.group_closed = true;
                true
            })
            .await?;
        self.publish(EventKind::Updated, user_id, [id]);
        Ok(n)
    }

    /// Set UI expansion for a record's group. Expanding or collapsing a head
    /// closes its group window.
    pub async fn set_group_expanded(
        &self,
        user_id: DbId,
        id: DbId,
        expanded: bool,
    ) -> Result<ListedNotification, CoreError> {
        let (n, _) = self
            .mutate(user_id, id, |n| {
                if n.group_closed {
                    return false;
                }
                n.group_closed = true;
                true
            })
            .await?;
        self.expansion
            .write()
            .await
            .entry(user_id)
            .or_default()
            .set(n.id, expanded);
        self.annotate(n).await
    }

    /// Collapse every `low_priority` record and close its group. Other classes
    /// are untouched and nothing is un-collapsed.
    pub async fn collapse_low_priority(&self, user_id: DbId) -> Result<u64, CoreError> {
        let records = self
            .notifications
            .get_by_user(user_id, &NotificationFilter::default())
            .await?;
        let mut collapsed = Vec::new();
        for id in low_priority_to_collapse(&records) {
            let result = self
                .mutate(user_id, id, |n| {
                    if n.ai_classification != AiClassification::LowPriority || n.is_collapsed {
                        return false;
                    }
                    n.is_collapsed = true;
                    n.group_closed = true;
                    true
                })
                .await;
            match result {
                Ok((_, true)) => collapsed.push(id),
                Ok((_, false)) | Err(CoreError::NotFound { .. }) => {}
                Err(e) => return Err(e),
            }
        }
        let count = collapsed.len() as u64;
        if count > 0 {
            self.publish(EventKind::Updated, user_id, collapsed);
        }
        tracing::info!(user_id, count, "Collapsed low-priority notifications");
        Ok(count)
    }

    /// Override the class of a record. The score is kept.
    pub async fn reclassify(
        &self,
        user_id: DbId,
        id: DbId,
        classification: AiClassification,
    ) -> Result<Notification, CoreError> {
        let (n, changed) = self
            .mutate(user_id, id, |n| {
                if n.ai_classification == classification {
                    return false;
                }
                n.ai_classification = classification;
                true
            })
            .await?;
        if changed {
            self.publish(EventKind::Updated, user_id, [id]);
        }
        Ok(n)
    }

    /// Remove a record. A head takes its members with it.
    pub async fn delete(&self, user_id: DbId, id: DbId) -> Result<(), CoreError> {
        let n = self.owned(user_id, id).await?;
        if !self.notifications.delete(id).await? {
            return Err(CoreError::NotFound {
                entity: "Notification",
                id,
            });
        }
        self.forget_expansion(user_id, n.id).await;
        self.publish(EventKind::Deleted, user_id, [id]);
        Ok(())
    }

    /// Delete the listed records; ids not owned by the user are skipped.
    pub async fn batch_delete(&self, user_id: DbId, ids: &[DbId]) -> Result<u64, CoreError> {
        let mut deleted = Vec::new();
        for id in ids {
            match self.delete(user_id, *id).await {
                Ok(()) => deleted.push(*id),
                Err(CoreError::NotFound { .. }) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(deleted.len() as u64)
    }

    pub async fn delete_all(&self, user_id: DbId) -> Result<u64, CoreError> {
        let count = self.notifications.delete_by_user(user_id).await?;
        self.expansion.write().await.remove(&user_id);
        self.publish(EventKind::Deleted, user_id, Vec::<DbId>::new());
        tracing::info!(user_id, count, "Deleted all notifications");
        Ok(count)
    }

    async fn forget_expansion(&self, user_id: DbId, head_id: DbId) {
        let mut expansion = self.expansion.write().await;
        if let Some(state) = expansion.get_mut(&user_id) {
            state.set(head_id, false);
            if state.is_empty() {
                expansion.remove(&user_id);
            }
        }
    }
}
