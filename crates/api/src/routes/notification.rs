//! Route definitions for the `/notifications` resource.
//!
//! Every endpoint except the producer submissions (`POST /` and
//! `POST /batch`) requires an `X-User-Id` caller header.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::{notification, settings};
use crate::state::AppState;

/// Routes mounted at `/notifications`.
///
/// ```text
/// GET    /                              -> list_notifications
/// POST   /                              -> submit_notification
/// DELETE /                              -> delete_all
/// POST   /batch                         -> submit_batch
/// GET    /unread-count                  -> unread_count
/// GET    /statistics                    -> statistics
/// POST   /read-all                      -> mark_all_read
/// POST   /batch-read                    -> batch_mark_read
/// POST   /batch-delete                  -> batch_delete
/// POST   /collapse-low-priority         -> collapse_low_priority
/// POST   /category/{category}/read      -> mark_category_read
///
/// GET    /{id}                          -> get_notification
/// DELETE /{id}                          -> delete_notification
/// POST   /{id}/read                     -> mark_read
/// POST   /{id}/pin                      -> toggle_pin
/// POST   /{id}/collapse                 -> toggle_collapse
/// POST   /{id}/expand                   -> set_expanded
/// PUT    /{id}/classification           -> reclassify
///
/// GET    /dnd                           -> get_dnd
/// PUT    /dnd                           -> update_dnd
/// GET    /dnd/status                    -> dnd_status
/// POST   /dnd/override                  -> enable_override
/// DELETE /dnd/override                  -> disable_override
///
/// GET    /subscriptions                 -> get_subscriptions
/// PUT    /subscriptions/{category}      -> update_subscription
///
/// GET    /preferences                   -> get_preferences
/// PUT    /preferences                   -> update_preferences
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        // Collection endpoints
        .route(
            "/",
            get(notification::list_notifications)
                .post(notification::submit_notification)
                .delete(notification::delete_all),
        )
        .route("/batch", post(notification::submit_batch))
        .route("/unread-count", get(notification::unread_count))
        .route("/statistics", get(notification::statistics))
        .route("/read-all", post(notification::mark_all_read))
        .route("/batch-read", post(notification::batch_mark_read))
        .route("/batch-delete", post(notification::batch_delete))
        .route(
            "/collapse-low-priority",
            post(notification::collapse_low_priority),
        )
        .route(
            "/category/{category}/read",
            post(notification::mark_category_read),
        )
        // Single notification endpoints
        .route(
            "/{id}",
            get(notification::get_notification).delete(notification::delete_notification),
        )
        .route("/{id}/read", post(notification::mark_read))
        .route("/{id}/pin", post(notification::toggle_pin))
        .route("/{id}/collapse", post(notification::toggle_collapse))
        .route("/{id}/expand", post(notification::set_expanded))
        .route("/{id}/classification", put(notification::reclassify))
        // DND endpoints
        .route("/dnd", get(settings::get_dnd).put(settings::update_dnd))
        .route("/dnd/status", get(settings::dnd_status))
        .route(
            "/dnd/override",
            post(settings::enable_override).delete(settings::disable_override),
        )
        // Subscription endpoints
        .route("/subscriptions", get(settings::get_subscriptions))
        .route(
            "/subscriptions/{category}",
            put(settings::update_subscription),
        )
        // Preference endpoints
        .route(
            "/preferences",
            get(settings::get_preferences).put(settings::update_preferences),
        )
}
