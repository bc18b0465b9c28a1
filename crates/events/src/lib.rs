//! Change feed for the notification center.
//!
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`CenterEvent`]: the envelope published after every committed mutation.

pub mod bus;

pub use bus::{CenterEvent, EventBus, EventKind};
