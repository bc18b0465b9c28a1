//! Delivery channels.
//!
//! The string forms must match the values stored in subscription rows and
//! accepted on the HTTP surface.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// In-app notification stored for the notification bell UI.
pub const CHANNEL_IN_APP: &str = "in_app";

/// Email notification delivered by an external mailer.
pub const CHANNEL_EMAIL: &str = "email";

/// Mobile/browser push notification delivered by an external push service.
pub const CHANNEL_PUSH: &str = "push";

/// A delivery surface gated independently per notification category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    InApp,
    Email,
    Push,
}

impl Channel {
    pub const ALL: [Channel; 3] = [Channel::InApp, Channel::Email, Channel::Push];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::InApp => CHANNEL_IN_APP,
            Self::Email => CHANNEL_EMAIL,
            Self::Push => CHANNEL_PUSH,
        }
    }

    /// External channels leave the platform and are deferred during quiet hours.
    pub fn is_external(self) -> bool {
        !matches!(self, Self::InApp)
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Channel {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            CHANNEL_IN_APP => Ok(Self::InApp),
            CHANNEL_EMAIL => Ok(Self::Email),
            CHANNEL_PUSH => Ok(Self::Push),
            other => Err(CoreError::Validation(format!(
                "Unknown channel '{other}'. Must be one of: {CHANNEL_IN_APP}, {CHANNEL_EMAIL}, {CHANNEL_PUSH}"
            ))),
        }
    }
}
