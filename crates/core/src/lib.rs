pub mod aggregation;
pub mod channels;
pub mod classifier;
pub mod clock;
pub mod dnd;
pub mod error;
pub mod hashing;
pub mod notification;
pub mod preferences;
pub mod presentation;
pub mod subscription;
pub mod types;
