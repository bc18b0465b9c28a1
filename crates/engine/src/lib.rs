//! Notification center orchestration.
//!
//! [`NotificationCenter`] runs the intake pipeline (classify, aggregate,
//! persist with compare-and-set, publish) and serves the query and settings
//! surface over the store adapters.

pub mod center;
pub mod config;

pub use center::{NotificationCenter, SubmitOutcome, MAX_SUBMIT_BATCH, MAX_WRITE_ATTEMPTS};
pub use config::EngineConfig;
