//! Engine tunables.

use mota_core::aggregation::{DEFAULT_MAX_MEMBERS, DEFAULT_WINDOW_MINS};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Aggregation window for users without a stored preference.
    pub aggregation_window_minutes: u32,
    /// Member summaries retained per head.
    pub aggregation_max_members: usize,
    /// Notifications older than this are purged by the retention job.
    pub retention_days: u32,
    /// Hide categories with in-app disabled from non-category tabs.
    pub hide_unsubscribed_in_all: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            aggregation_window_minutes: DEFAULT_WINDOW_MINS as u32,
            aggregation_max_members: DEFAULT_MAX_MEMBERS,
            retention_days: 90,
            hide_unsubscribed_in_all: true,
        }
    }
}

impl EngineConfig {
    /// Load from environment variables, falling back to defaults.
    ///
    /// | Env var                      | Default |
    /// |------------------------------|---------|
    /// | `AGGREGATION_WINDOW_MINUTES` | `30`    |
    /// | `AGGREGATION_MAX_MEMBERS`    | `50`    |
    /// | `RETENTION_DAYS`             | `90`    |
    /// | `HIDE_UNSUBSCRIBED_IN_ALL`   | `true`  |
    pub fn from_env() -> Self {
        let aggregation_window_minutes: u32 = std::env::var("AGGREGATION_WINDOW_MINUTES")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("AGGREGATION_WINDOW_MINUTES must be a valid u32");

        let aggregation_max_members: usize = std::env::var("AGGREGATION_MAX_MEMBERS")
            .unwrap_or_else(|_| "50".into())
            .parse()
            .expect("AGGREGATION_MAX_MEMBERS must be a valid usize");

        let retention_days: u32 = std::env::var("RETENTION_DAYS")
            .unwrap_or_else(|_| "90".into())
            .parse()
            .expect("RETENTION_DAYS must be a valid u32");

        let hide_unsubscribed_in_all: bool = std::env::var("HIDE_UNSUBSCRIBED_IN_ALL")
            .unwrap_or_else(|_| "true".into())
            .parse()
            .expect("HIDE_UNSUBSCRIBED_IN_ALL must be true or false");

        Self {
            aggregation_window_minutes,
            aggregation_max_members,
            retention_days,
            hide_unsubscribed_in_all,
        }
    }
}
