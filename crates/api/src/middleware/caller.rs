//! Caller identity extractor.
//!
//! Authentication happens upstream; the gateway forwards the verified user id
//! in the `X-User-Id` header.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use mota_core::types::DbId;

use crate::error::AppError;

pub const CALLER_HEADER: &str = "x-user-id";

/// The user on whose behalf the request is made.
///
/// ```ignore
/// async fn my_handler(caller: Caller) -> AppResult<Json<()>> {
///     tracing::info!(user_id = caller.user_id, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Caller {
    pub user_id: DbId,
}

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(CALLER_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("Missing X-User-Id header".into()))?;

        let user_id: DbId = raw
            .trim()
            .parse()
            .ok()
            .filter(|id| *id > 0)
            .ok_or_else(|| AppError::Unauthorized(format!("Invalid X-User-Id header: {raw}")))?;

        Ok(Caller { user_id })
    }
}
