//! Row model for the `notifications` table.

use mota_core::notification::{MemberSummary, Notification};
use mota_core::types::{DbId, Timestamp};
use sqlx::types::Json;
use sqlx::FromRow;

use crate::store::StoreError;

/// A row from the `notifications` table.
#[derive(Debug, Clone, FromRow)]
pub struct NotificationRow {
    pub id: DbId,
    pub user_id: DbId,
    pub notification_type: String,
    pub category: String,
    pub priority: String,
    pub title: String,
    pub content: String,
    pub sender_id: Option<DbId>,
    pub sender_name: Option<String>,
    pub project_id: Option<DbId>,
    pub related_type: Option<String>,
    pub related_id: Option<DbId>,
    pub action_url: Option<String>,
    pub ai_classification: String,
    pub ai_score: i16,
    pub is_read: bool,
    pub read_at: Option<Timestamp>,
    pub is_pinned: bool,
    pub is_collapsed: bool,
    pub group_key: Option<String>,
    pub aggregated_count: i32,
    pub aggregated_members: Json<Vec<MemberSummary>>,
    pub group_closed: bool,
    pub version: i64,
    pub created_at: Timestamp,
}

fn corrupt(id: DbId, what: impl std::fmt::Display) -> StoreError {
    StoreError::Corrupt(format!("notification {id}: {what}"))
}

impl TryFrom<NotificationRow> for Notification {
    type Error = StoreError;

    fn try_from(row: NotificationRow) -> Result<Self, Self::Error> {
        let id = row.id;
        Ok(Notification {
            id,
            user_id: row.user_id,
            notification_type: row.notification_type.parse().map_err(|e| corrupt(id, e))?,
            category: row.category.parse().map_err(|e| corrupt(id, e))?,
            priority: row.priority.parse().map_err(|e| corrupt(id, e))?,
            title: row.title,
            content: row.content,
            created_at: row.created_at,
            sender_id: row.sender_id,
            sender_name: row.sender_name,
            project_id: row.project_id,
            related_type: row.related_type,
            related_id: row.related_id,
            action_url: row.action_url,
            ai_classification: row.ai_classification.parse().map_err(|e| corrupt(id, e))?,
            ai_score: u8::try_from(row.ai_score).map_err(|e| corrupt(id, e))?,
            is_read: row.is_read,
            read_at: row.read_at,
            is_pinned: row.is_pinned,
            is_collapsed: row.is_collapsed,
            group_key: row.group_key,
            aggregated_count: u32::try_from(row.aggregated_count).map_err(|e| corrupt(id, e))?,
            aggregated_members: row.aggregated_members.0,
            group_closed: row.group_closed,
            version: row.version,
        })
    }
}
