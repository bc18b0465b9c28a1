//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that accept
//! `&PgPool` as the first argument.

pub mod notification_repo;
pub mod settings_repo;

pub use notification_repo::NotificationRepo;
pub use settings_repo::SettingsRepo;
