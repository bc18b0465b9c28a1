//! Optimistic-write retries against a store where another writer lands
//! between the read and the guarded write.

mod common;

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use assert_matches::assert_matches;
use async_trait::async_trait;
use common::{start, task_comment};
use mota_core::clock::ManualClock;
use mota_core::error::CoreError;
use mota_core::notification::{Notification, PendingNotification};
use mota_core::types::{DbId, Timestamp};
use mota_db::memory::InMemoryStore;
use mota_db::{NotificationFilter, NotificationStore, StoreError};
use mota_engine::{EngineConfig, NotificationCenter, MAX_WRITE_ATTEMPTS};
use mota_events::EventBus;

#[derive(Debug, Clone, Copy)]
enum Interference {
    /// Another client marks the record read just before the first guarded write.
    ReadOnce,
    /// Another client rewrites the record before every guarded write.
    BumpEvery,
}

struct RacingStore {
    inner: Arc<InMemoryStore>,
    mode: Interference,
    guarded_writes: AtomicU32,
}

impl RacingStore {
    fn new(inner: Arc<InMemoryStore>, mode: Interference) -> Self {
        Self {
            inner,
            mode,
            guarded_writes: AtomicU32::new(0),
        }
    }

    fn guarded_writes(&self) -> u32 {
        self.guarded_writes.load(Ordering::SeqCst)
    }

    async fn interfere(&self, id: DbId, attempt: u32) -> Result<(), StoreError> {
        let Some(mut current) = self.inner.get(id).await? else {
            return Ok(());
        };
        match self.mode {
            Interference::ReadOnce if attempt == 1 => {
                current.is_read = true;
                current.read_at = Some(start());
                current.group_closed = true;
            }
            Interference::ReadOnce => return Ok(()),
            Interference::BumpEvery => {}
        }
        self.inner.upsert(&current, None).await?;
        Ok(())
    }
}

#[async_trait]
impl NotificationStore for RacingStore {
    async fn get_by_user(
        &self,
        user_id: DbId,
        filter: &NotificationFilter,
    ) -> Result<Vec<Notification>, StoreError> {
        self.inner.get_by_user(user_id, filter).await
    }

    async fn get(&self, id: DbId) -> Result<Option<Notification>, StoreError> {
        self.inner.get(id).await
    }

    async fn insert(&self, pending: PendingNotification) -> Result<Notification, StoreError> {
        self.inner.insert(pending).await
    }

    async fn upsert(
        &self,
        notification: &Notification,
        expected_version: Option<i64>,
    ) -> Result<Notification, StoreError> {
        if expected_version.is_some() {
            let attempt = self.guarded_writes.fetch_add(1, Ordering::SeqCst) + 1;
            self.interfere(notification.id, attempt).await?;
        }
        self.inner.upsert(notification, expected_version).await
    }

    async fn delete(&self, id: DbId) -> Result<bool, StoreError> {
        self.inner.delete(id).await
    }

    async fn delete_by_user(&self, user_id: DbId) -> Result<u64, StoreError> {
        self.inner.delete_by_user(user_id).await
    }

    async fn delete_created_before(&self, cutoff: Timestamp) -> Result<u64, StoreError> {
        self.inner.delete_created_before(cutoff).await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.inner.ping().await
    }
}

fn racing_center(mode: Interference) -> (NotificationCenter, Arc<RacingStore>, Arc<InMemoryStore>) {
    let inner = Arc::new(InMemoryStore::new());
    let racing = Arc::new(RacingStore::new(inner.clone(), mode));
    let center = NotificationCenter::new(
        racing.clone(),
        inner.clone(),
        Arc::new(EventBus::default()),
        EngineConfig::default(),
    )
    .with_clock(Arc::new(ManualClock::new(start())));
    (center, racing, inner)
}

#[tokio::test]
async fn merge_that_loses_to_mark_read_starts_a_new_head() {
    let (center, racing, inner) = racing_center(Interference::ReadOnce);
    let first = center.submit(task_comment(1, 7)).await.unwrap().notification;

    let second = center.submit(task_comment(1, 7)).await.unwrap();
    assert!(!second.merged);
    assert_ne!(second.notification.id, first.id);
    assert_eq!(second.notification.aggregated_count, 1);
    assert_eq!(racing.guarded_writes(), 1);

    let stored = inner.get(first.id).await.unwrap().unwrap();
    assert!(stored.is_read);
    assert_eq!(stored.aggregated_count, 1);
    assert_eq!(stored.aggregated_members.len(), 1);
}

#[tokio::test]
async fn action_retry_keeps_the_concurrent_change() {
    let (center, racing, _) = racing_center(Interference::ReadOnce);
    let n = center.submit(task_comment(1, 7)).await.unwrap().notification;

    let pinned = center.toggle_pin(1, n.id).await.unwrap();
    assert!(pinned.is_pinned);
    assert!(pinned.is_read);
    assert_eq!(racing.guarded_writes(), 2);
}

#[tokio::test]
async fn action_gives_up_with_conflict_after_max_attempts() {
    let (center, racing, inner) = racing_center(Interference::BumpEvery);
    let n = center.submit(task_comment(1, 7)).await.unwrap().notification;

    assert_matches!(center.mark_read(1, n.id).await, Err(CoreError::Conflict(_)));
    assert_eq!(racing.guarded_writes(), MAX_WRITE_ATTEMPTS);
    assert!(!inner.get(n.id).await.unwrap().unwrap().is_read);
}
