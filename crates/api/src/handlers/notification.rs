//! Handlers for the `/notifications` resource.
//!
//! Everything except submission acts on behalf of the [`Caller`].

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use mota_core::notification::{AiClassification, Category, NewNotification, Notification};
use mota_core::presentation::{ListedNotification, NotificationStatistics, Tab, UnreadCounts};
use mota_core::types::DbId;
use mota_engine::SubmitOutcome;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::middleware::caller::Caller;
use crate::response::{CountResponse, DataResponse};
use crate::state::AppState;

/// Largest id list accepted by the batch endpoints.
const MAX_BATCH_IDS: usize = 500;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Query parameters for `GET /notifications`.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Defaults to `all`.
    pub tab: Option<Tab>,
    /// Include collapsed records. Defaults to `false`.
    pub show_collapsed: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct BatchRequest {
    pub ids: Vec<DbId>,
}

impl BatchRequest {
    fn checked(&self) -> AppResult<&[DbId]> {
        if self.ids.len() > MAX_BATCH_IDS {
            return Err(AppError::BadRequest(format!(
                "At most {MAX_BATCH_IDS} ids per batch, got {}",
                self.ids.len()
            )));
        }
        Ok(&self.ids)
    }
}

/// Body of `POST /notifications/batch`.
#[derive(Debug, Deserialize)]
pub struct SubmitBatchRequest {
    pub notifications: Vec<NewNotification>,
}

#[derive(Debug, Deserialize)]
pub struct ExpandRequest {
    pub expanded: bool,
}

#[derive(Debug, Deserialize)]
pub struct ClassificationRequest {
    pub classification: AiClassification,
}

// ---------------------------------------------------------------------------
// Listing and intake
// ---------------------------------------------------------------------------

/// GET /api/v1/notifications
pub async fn list_notifications(
    caller: Caller,
    State(state): State<AppState>,
    Query(params): Query<ListQuery>,
) -> AppResult<Json<DataResponse<Vec<ListedNotification>>>> {
    let listed = state
        .center
        .list(
            caller.user_id,
            params.tab.unwrap_or_default(),
            params.show_collapsed.unwrap_or(false),
        )
        .await?;
    Ok(Json(DataResponse::new(listed)))
}

/// POST /api/v1/notifications
///
/// Producer intake. Returns 201 for a new head and 200 when the submission
/// was folded into an existing one.
pub async fn submit_notification(
    State(state): State<AppState>,
    Json(input): Json<NewNotification>,
) -> AppResult<impl IntoResponse> {
    let outcome: SubmitOutcome = state.center.submit(input).await?;
    let status = if outcome.merged {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };
    Ok((status, Json(DataResponse::new(outcome))))
}

/// POST /api/v1/notifications/batch
///
/// Producer intake for several notifications at once. Outcomes are returned
/// in request order.
pub async fn submit_batch(
    State(state): State<AppState>,
    Json(input): Json<SubmitBatchRequest>,
) -> AppResult<impl IntoResponse> {
    let outcomes = state.center.submit_batch(input.notifications).await?;
    Ok((StatusCode::CREATED, Json(DataResponse::new(outcomes))))
}

/// GET /api/v1/notifications/statistics
pub async fn statistics(
    caller: Caller,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<NotificationStatistics>>> {
    let stats = state.center.statistics(caller.user_id).await?;
    Ok(Json(DataResponse::new(stats)))
}

/// GET /api/v1/notifications/unread-count
pub async fn unread_count(
    caller: Caller,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<UnreadCounts>>> {
    let counts = state.center.unread_counts(caller.user_id).await?;
    Ok(Json(DataResponse::new(counts)))
}

/// GET /api/v1/notifications/{id}
pub async fn get_notification(
    caller: Caller,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<ListedNotification>>> {
    let n = state.center.get(caller.user_id, id).await?;
    Ok(Json(DataResponse::new(n)))
}

// ---------------------------------------------------------------------------
// Read state
// ---------------------------------------------------------------------------

/// POST /api/v1/notifications/{id}/read
pub async fn mark_read(
    caller: Caller,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Notification>>> {
    let n = state.center.mark_read(caller.user_id, id).await?;
    Ok(Json(DataResponse::new(n)))
}

/// POST /api/v1/notifications/read-all
pub async fn mark_all_read(
    caller: Caller,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<CountResponse>>> {
    let count = state.center.mark_all_read(caller.user_id).await?;
    Ok(Json(DataResponse::new(CountResponse { count })))
}

/// POST /api/v1/notifications/category/{category}/read
pub async fn mark_category_read(
    caller: Caller,
    State(state): State<AppState>,
    Path(category): Path<Category>,
) -> AppResult<Json<DataResponse<CountResponse>>> {
    let count = state
        .center
        .mark_category_read(caller.user_id, category)
        .await?;
    Ok(Json(DataResponse::new(CountResponse { count })))
}

/// POST /api/v1/notifications/batch-read
pub async fn batch_mark_read(
    caller: Caller,
    State(state): State<AppState>,
    Json(input): Json<BatchRequest>,
) -> AppResult<Json<DataResponse<CountResponse>>> {
    let count = state
        .center
        .batch_mark_read(caller.user_id, input.checked()?)
        .await?;
    Ok(Json(DataResponse::new(CountResponse { count })))
}

// ---------------------------------------------------------------------------
// Presentation flags
// ---------------------------------------------------------------------------

/// POST /api/v1/notifications/{id}/pin
pub async fn toggle_pin(
    caller: Caller,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Notification>>> {
    let n = state.center.toggle_pin(caller.user_id, id).await?;
    Ok(Json(DataResponse::new(n)))
}

/// POST /api/v1/notifications/{id}/collapse
pub async fn toggle_collapse(
    caller: Caller,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Notification>>> {
    let n = state.center.toggle_collapse(caller.user_id, id).await?;
    Ok(Json(DataResponse::new(n)))
}

/// POST /api/v1/notifications/{id}/expand
pub async fn set_expanded(
    caller: Caller,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<ExpandRequest>,
) -> AppResult<Json<DataResponse<ListedNotification>>> {
    let n = state
        .center
        .set_group_expanded(caller.user_id, id, input.expanded)
        .await?;
    Ok(Json(DataResponse::new(n)))
}

/// POST /api/v1/notifications/collapse-low-priority
pub async fn collapse_low_priority(
    caller: Caller,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<CountResponse>>> {
    let count = state.center.collapse_low_priority(caller.user_id).await?;
    Ok(Json(DataResponse::new(CountResponse { count })))
}

/// PUT /api/v1/notifications/{id}/classification
pub async fn reclassify(
    caller: Caller,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<ClassificationRequest>,
) -> AppResult<Json<DataResponse<Notification>>> {
    let n = state
        .center
        .reclassify(caller.user_id, id, input.classification)
        .await?;
    Ok(Json(DataResponse::new(n)))
}

// ---------------------------------------------------------------------------
// Deletion
// ---------------------------------------------------------------------------

/// DELETE /api/v1/notifications/{id}
pub async fn delete_notification(
    caller: Caller,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    state.center.delete(caller.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/notifications/batch-delete
pub async fn batch_delete(
    caller: Caller,
    State(state): State<AppState>,
    Json(input): Json<BatchRequest>,
) -> AppResult<Json<DataResponse<CountResponse>>> {
    let count = state
        .center
        .batch_delete(caller.user_id, input.checked()?)
        .await?;
    Ok(Json(DataResponse::new(CountResponse { count })))
}

/// DELETE /api/v1/notifications
pub async fn delete_all(
    caller: Caller,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<CountResponse>>> {
    let count = state.center.delete_all(caller.user_id).await?;
    Ok(Json(DataResponse::new(CountResponse { count })))
}
