use std::sync::Arc;

use mota_engine::NotificationCenter;

use crate::config::AppConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
#[derive(Clone)]
pub struct AppState {
    pub center: Arc<NotificationCenter>,
    pub config: Arc<AppConfig>,
}
