//! Periodic purge of expired notifications.
//!
//! Deletes records older than [`EngineConfig::retention_days`] on a fixed
//! interval using `tokio::time::interval`. The first tick fires immediately.
//!
//! [`EngineConfig::retention_days`]: mota_engine::EngineConfig::retention_days

use std::sync::Arc;
use std::time::Duration;

use mota_engine::NotificationCenter;
use tokio_util::sync::CancellationToken;

/// Run the retention loop until `cancel` is triggered.
pub async fn run(center: Arc<NotificationCenter>, interval: Duration, cancel: CancellationToken) {
    tracing::info!(
        retention_days = center.config().retention_days,
        interval_secs = interval.as_secs(),
        "Notification retention job started"
    );

    let mut ticker = tokio::time::interval(interval);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Notification retention job stopping");
                break;
            }
            _ = ticker.tick() => {
                let cutoff = center.retention_cutoff();
                match center.purge_created_before(cutoff).await {
                    Ok(deleted) if deleted > 0 => {
                        tracing::info!(deleted, %cutoff, "Notification retention: purged old rows");
                    }
                    Ok(_) => {
                        tracing::debug!("Notification retention: no rows to purge");
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Notification retention: purge failed");
                    }
                }
            }
        }
    }
}
