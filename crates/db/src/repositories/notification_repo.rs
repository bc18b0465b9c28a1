//! Repository for the `notifications` table.

use mota_core::notification::{Category, Notification, PendingNotification};
use mota_core::types::{DbId, Timestamp};
use sqlx::types::Json;
use sqlx::PgPool;

use crate::models::notification::NotificationRow;
use crate::store::{NotificationFilter, StoreError};

/// Column list for `notifications` queries.
const COLUMNS: &str = "id, user_id, notification_type, category, priority, title, content, \
    sender_id, sender_name, project_id, related_type, related_id, action_url, \
    ai_classification, ai_score, is_read, read_at, is_pinned, is_collapsed, group_key, \
    aggregated_count, aggregated_members, group_closed, version, created_at";

/// Provides CRUD operations for notifications.
pub struct NotificationRepo;

impl NotificationRepo {
    /// List a user's notifications, newest first.
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: DbId,
        filter: &NotificationFilter,
    ) -> Result<Vec<Notification>, StoreError> {
        let categories: Option<Vec<String>> = filter
            .categories
            .as_ref()
            .map(|c| c.iter().map(|c| Category::as_str(*c).to_string()).collect());
        let query = format!(
            "SELECT {COLUMNS} FROM notifications \
             WHERE user_id = $1 \
               AND ($2 = false OR is_read = false) \
               AND ($3::text[] IS NULL OR category = ANY($3)) \
               AND ($4::text IS NULL OR group_key = $4) \
               AND ($5::timestamptz IS NULL OR created_at >= $5) \
             ORDER BY created_at DESC, id DESC"
        );
        let rows = sqlx::query_as::<_, NotificationRow>(&query)
            .bind(user_id)
            .bind(filter.unread_only)
            .bind(categories)
            .bind(filter.group_key.as_deref())
            .bind(filter.created_since)
            .fetch_all(pool)
            .await?;
        rows.into_iter().map(Notification::try_from).collect()
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Notification>, StoreError> {
        let query = format!("SELECT {COLUMNS} FROM notifications WHERE id = $1");
        sqlx::query_as::<_, NotificationRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await?
            .map(Notification::try_from)
            .transpose()
    }

    /// Insert a single-member head. The partial unique index on open groups
    /// rejects a second open head for the same key.
    pub async fn create(
        pool: &PgPool,
        pending: PendingNotification,
    ) -> Result<Notification, StoreError> {
        let members = Json(vec![pending.member_summary()]);
        let group_key = pending.group_key.clone();
        let query = format!(
            "INSERT INTO notifications \
                (user_id, notification_type, category, priority, title, content, \
                 sender_id, sender_name, project_id, related_type, related_id, action_url, \
                 ai_classification, ai_score, is_pinned, is_collapsed, group_key, \
                 aggregated_members, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19) \
             RETURNING {COLUMNS}"
        );
        let row = sqlx::query_as::<_, NotificationRow>(&query)
            .bind(pending.user_id)
            .bind(pending.notification_type.as_str())
            .bind(pending.category.as_str())
            .bind(pending.priority.as_str())
            .bind(&pending.title)
            .bind(&pending.content)
            .bind(pending.sender_id)
            .bind(&pending.sender_name)
            .bind(pending.project_id)
            .bind(&pending.related_type)
            .bind(pending.related_id)
            .bind(&pending.action_url)
            .bind(pending.ai_classification.as_str())
            .bind(i16::from(pending.ai_score))
            .bind(pending.is_pinned)
            .bind(pending.is_collapsed)
            .bind(&pending.group_key)
            .bind(members)
            .bind(pending.created_at)
            .fetch_one(pool)
            .await
            .map_err(|e| match StoreError::from(e) {
                StoreError::OpenGroupExists { .. } => {
                    tracing::debug!(user_id = pending.user_id, "Open group head already exists");
                    StoreError::OpenGroupExists {
                        group_key: group_key.unwrap_or_default(),
                    }
                }
                other => other,
            })?;
        Notification::try_from(row)
    }

    /// Write the mutable fields and bump `version`.
    ///
    /// Returns `None` when no row matched `id` (and `expected_version`, if set).
    pub async fn update(
        pool: &PgPool,
        n: &Notification,
        expected_version: Option<i64>,
    ) -> Result<Option<Notification>, StoreError> {
        let aggregated_count = i32::try_from(n.aggregated_count)
            .map_err(|e| StoreError::Corrupt(format!("notification {}: {e}", n.id)))?;
        let query = format!(
            "UPDATE notifications SET \
                priority = $3, title = $4, content = $5, sender_id = $6, sender_name = $7, \
                action_url = $8, ai_classification = $9, ai_score = $10, is_read = $11, \
                read_at = $12, is_pinned = $13, is_collapsed = $14, aggregated_count = $15, \
                aggregated_members = $16, group_closed = $17, created_at = $18, \
                version = version + 1, updated_at = NOW() \
             WHERE id = $1 AND ($2::bigint IS NULL OR version = $2) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, NotificationRow>(&query)
            .bind(n.id)
            .bind(expected_version)
            .bind(n.priority.as_str())
            .bind(&n.title)
            .bind(&n.content)
            .bind(n.sender_id)
            .bind(&n.sender_name)
            .bind(&n.action_url)
            .bind(n.ai_classification.as_str())
            .bind(i16::from(n.ai_score))
            .bind(n.is_read)
            .bind(n.read_at)
            .bind(n.is_pinned)
            .bind(n.is_collapsed)
            .bind(aggregated_count)
            .bind(Json(&n.aggregated_members))
            .bind(n.group_closed)
            .bind(n.created_at)
            .fetch_optional(pool)
            .await?
            .map(Notification::try_from)
            .transpose()
    }

    /// Current version of a row, if it exists.
    pub async fn version_of(pool: &PgPool, id: DbId) -> Result<Option<i64>, StoreError> {
        Ok(
            sqlx::query_scalar("SELECT version FROM notifications WHERE id = $1")
                .bind(id)
                .fetch_optional(pool)
                .await?,
        )
    }

    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM notifications WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_for_user(pool: &PgPool, user_id: DbId) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM notifications WHERE user_id = $1")
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Delete notifications created before `cutoff`.
    pub async fn delete_created_before(
        pool: &PgPool,
        cutoff: Timestamp,
    ) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM notifications WHERE created_at < $1")
            .bind(cutoff)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
