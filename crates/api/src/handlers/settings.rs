//! Handlers for DND, subscription and preference settings under
//! `/notifications`.

use axum::extract::{Path, State};
use axum::Json;
use mota_core::dnd::{DndPreset, DndSettings, DndUpdate, QuietStatus, DND_PRESETS};
use mota_core::notification::Category;
use mota_core::preferences::{NotificationPreferences, PreferencesUpdate};
use mota_core::subscription::{Subscription, SubscriptionUpdate};
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::middleware::caller::Caller;
use crate::response::DataResponse;
use crate::state::AppState;

/// Body for `POST /dnd/override`. `null` or absent minutes means until
/// turned off.
#[derive(Debug, Default, Deserialize)]
pub struct OverrideRequest {
    #[serde(default)]
    pub minutes: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DndStatusResponse {
    #[serde(flatten)]
    pub status: QuietStatus,
    pub presets: &'static [DndPreset],
}

// ---------------------------------------------------------------------------
// DND
// ---------------------------------------------------------------------------

/// GET /api/v1/notifications/dnd
pub async fn get_dnd(
    caller: Caller,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<DndSettings>>> {
    let settings = state.center.get_dnd_settings(caller.user_id).await?;
    Ok(Json(DataResponse::new(settings)))
}

/// PUT /api/v1/notifications/dnd
pub async fn update_dnd(
    caller: Caller,
    State(state): State<AppState>,
    Json(input): Json<DndUpdate>,
) -> AppResult<Json<DataResponse<DndSettings>>> {
    let settings = state
        .center
        .update_dnd_settings(caller.user_id, input)
        .await?;
    Ok(Json(DataResponse::new(settings)))
}

/// GET /api/v1/notifications/dnd/status
pub async fn dnd_status(
    caller: Caller,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<DndStatusResponse>>> {
    let status = state.center.dnd_status(caller.user_id).await?;
    Ok(Json(DataResponse::new(DndStatusResponse {
        status,
        presets: &DND_PRESETS,
    })))
}

/// POST /api/v1/notifications/dnd/override
pub async fn enable_override(
    caller: Caller,
    State(state): State<AppState>,
    Json(input): Json<OverrideRequest>,
) -> AppResult<Json<DataResponse<QuietStatus>>> {
    let status = state
        .center
        .enable_dnd_override(caller.user_id, input.minutes)
        .await?;
    Ok(Json(DataResponse::new(status)))
}

/// DELETE /api/v1/notifications/dnd/override
pub async fn disable_override(
    caller: Caller,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<QuietStatus>>> {
    let status = state.center.disable_dnd_override(caller.user_id).await?;
    Ok(Json(DataResponse::new(status)))
}

// ---------------------------------------------------------------------------
// Subscriptions
// ---------------------------------------------------------------------------

/// GET /api/v1/notifications/subscriptions
pub async fn get_subscriptions(
    caller: Caller,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<Subscription>>>> {
    let subs = state.center.get_subscriptions(caller.user_id).await?;
    Ok(Json(DataResponse::new(subs)))
}

/// PUT /api/v1/notifications/subscriptions/{category}
pub async fn update_subscription(
    caller: Caller,
    State(state): State<AppState>,
    Path(category): Path<Category>,
    Json(input): Json<SubscriptionUpdate>,
) -> AppResult<Json<DataResponse<Subscription>>> {
    let sub = state
        .center
        .update_subscription(caller.user_id, category, input)
        .await?;
    Ok(Json(DataResponse::new(sub)))
}

// ---------------------------------------------------------------------------
// Preferences
// ---------------------------------------------------------------------------

/// GET /api/v1/notifications/preferences
pub async fn get_preferences(
    caller: Caller,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<NotificationPreferences>>> {
    let prefs = state.center.get_preferences(caller.user_id).await?;
    Ok(Json(DataResponse::new(prefs)))
}

/// PUT /api/v1/notifications/preferences
pub async fn update_preferences(
    caller: Caller,
    State(state): State<AppState>,
    Json(input): Json<PreferencesUpdate>,
) -> AppResult<Json<DataResponse<NotificationPreferences>>> {
    let prefs = state
        .center
        .update_preferences(caller.user_id, input)
        .await?;
    Ok(Json(DataResponse::new(prefs)))
}
