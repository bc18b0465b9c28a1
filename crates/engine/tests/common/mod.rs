#![allow(dead_code)]

use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use mota_core::clock::ManualClock;
use mota_core::notification::{Category, NewNotification, NotificationType};
use mota_core::types::Timestamp;
use mota_db::memory::InMemoryStore;
use mota_engine::{EngineConfig, NotificationCenter};
use mota_events::EventBus;

pub struct Harness {
    pub center: Arc<NotificationCenter>,
    pub store: Arc<InMemoryStore>,
    pub clock: Arc<ManualClock>,
    pub bus: Arc<EventBus>,
}

/// Wednesday 2024-06-05 12:00 UTC.
pub fn start() -> Timestamp {
    Utc.with_ymd_and_hms(2024, 6, 5, 12, 0, 0).unwrap()
}

pub fn harness() -> Harness {
    harness_with(EngineConfig::default())
}

pub fn harness_with(config: EngineConfig) -> Harness {
    let store = Arc::new(InMemoryStore::new());
    let clock = Arc::new(ManualClock::new(start()));
    let bus = Arc::new(EventBus::default());
    let center = NotificationCenter::new(store.clone(), store.clone(), bus.clone(), config)
        .with_clock(clock.clone());
    Harness {
        center: Arc::new(center),
        store,
        clock,
        bus,
    }
}

impl Harness {
    pub fn advance_minutes(&self, minutes: i64) {
        self.clock.advance(Duration::minutes(minutes));
    }
}

/// A normal-priority comment on `task` from a human sender.
pub fn task_comment(user_id: i64, task: i64) -> NewNotification {
    NewNotification::new(user_id, NotificationType::TaskComment, Category::Task, "New comment")
        .with_subject("task", task)
        .with_sender(9)
        .with_content(format!("comment on task {task}"))
}
