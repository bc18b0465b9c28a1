//! Do-not-disturb scheduling.
//!
//! Quietness is user-global and computed lazily against the supplied instant;
//! per-item exceptions are applied separately by
//! [`is_suppressed`].

use chrono::{Datelike, Duration, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::notification::{NotificationType, Priority};
use crate::types::{DbId, Timestamp};

/// Longest accepted override: one week.
pub const MAX_OVERRIDE_MINUTES: u32 = 10_080;

/// Largest accepted UTC offset (UTC+14 / UTC-14).
pub const MAX_UTC_OFFSET_MINUTES: i32 = 14 * 60;

/// Most senders a user may exempt from quiet hours.
pub const MAX_EXCEPT_SENDERS: usize = 100;

pub const DEFAULT_START_TIME: &str = "22:00";
pub const DEFAULT_END_TIME: &str = "08:00";

const TIME_FORMAT: &str = "%H:%M";

// ---------------------------------------------------------------------------
// Override
// ---------------------------------------------------------------------------

/// A schedule-independent quiet window ("quick DND").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "until", rename_all = "snake_case")]
pub enum DndOverride {
    Until(Timestamp),
    Indefinite,
}

impl DndOverride {
    /// Build an override starting at `now`. `None` means until cancelled.
    pub fn starting_at(now: Timestamp, minutes: Option<u32>) -> Result<Self, CoreError> {
        match minutes {
            None => Ok(Self::Indefinite),
            Some(m) if (1..=MAX_OVERRIDE_MINUTES).contains(&m) => {
                Ok(Self::Until(now + Duration::minutes(i64::from(m))))
            }
            Some(m) => Err(CoreError::Validation(format!(
                "Override duration must be between 1 and {MAX_OVERRIDE_MINUTES} minutes, got {m}"
            ))),
        }
    }

    pub fn is_active(&self, at: Timestamp) -> bool {
        match self {
            Self::Indefinite => true,
            Self::Until(until) => at < *until,
        }
    }

    pub fn until(&self) -> Option<Timestamp> {
        match self {
            Self::Until(until) => Some(*until),
            Self::Indefinite => None,
        }
    }
}

/// Caller-facing override durations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DndPreset {
    pub label: &'static str,
    pub minutes: Option<u32>,
}

pub const DND_PRESETS: [DndPreset; 4] = [
    DndPreset {
        label: "30 minutes",
        minutes: Some(30),
    },
    DndPreset {
        label: "1 hour",
        minutes: Some(60),
    },
    DndPreset {
        label: "2 hours",
        minutes: Some(120),
    },
    DndPreset {
        label: "Until turned off",
        minutes: None,
    },
];

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Per-user quiet hours.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DndSettings {
    pub enabled: bool,
    /// Local `HH:MM`.
    pub start_time: String,
    /// Local `HH:MM`; earlier than `start_time` when the window wraps midnight.
    pub end_time: String,
    /// 0 = Sunday .. 6 = Saturday.
    pub weekdays: Vec<u8>,
    pub allow_urgent: bool,
    pub allow_mentions: bool,
    /// Senders whose notifications bypass quiet hours.
    #[serde(default)]
    pub except_senders: Vec<DbId>,
    pub utc_offset_minutes: i32,
    #[serde(default, rename = "override")]
    pub dnd_override: Option<DndOverride>,
}

impl Default for DndSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            start_time: DEFAULT_START_TIME.to_string(),
            end_time: DEFAULT_END_TIME.to_string(),
            weekdays: (0..=6).collect(),
            allow_urgent: true,
            allow_mentions: true,
            except_senders: Vec::new(),
            utc_offset_minutes: 0,
            dnd_override: None,
        }
    }
}

impl DndSettings {
    /// Reject malformed times, out-of-range weekdays and an empty weekday set
    /// on an enabled schedule.
    pub fn validate(&self) -> Result<(), CoreError> {
        parse_time_of_day(&self.start_time)?;
        parse_time_of_day(&self.end_time)?;
        if let Some(day) = self.weekdays.iter().find(|d| **d > 6) {
            return Err(CoreError::Validation(format!(
                "Weekday {day} out of range; expected 0 (Sunday) to 6 (Saturday)"
            )));
        }
        if self.enabled && self.weekdays.is_empty() {
            return Err(CoreError::Validation(
                "At least one weekday is required while DND is enabled".to_string(),
            ));
        }
        if self.except_senders.len() > MAX_EXCEPT_SENDERS {
            return Err(CoreError::Validation(format!(
                "At most {MAX_EXCEPT_SENDERS} excepted senders are allowed"
            )));
        }
        if let Some(id) = self.except_senders.iter().find(|id| **id <= 0) {
            return Err(CoreError::Validation(format!("Invalid excepted sender id {id}")));
        }
        if self.utc_offset_minutes.abs() > MAX_UTC_OFFSET_MINUTES {
            return Err(CoreError::Validation(format!(
                "UTC offset {} minutes out of range",
                self.utc_offset_minutes
            )));
        }
        Ok(())
    }

    /// The override, if one is set and has not expired at `at`.
    pub fn active_override(&self, at: Timestamp) -> Option<DndOverride> {
        self.dnd_override.filter(|o| o.is_active(at))
    }

    /// Whether quiet hours are in effect at `at`.
    pub fn is_quiet(&self, at: Timestamp) -> bool {
        if self.active_override(at).is_some() {
            return true;
        }
        if !self.enabled {
            return false;
        }

        let local = (at + Duration::minutes(i64::from(self.utc_offset_minutes))).naive_utc();
        let weekday = local.weekday().num_days_from_sunday() as u8;
        if !self.weekdays.contains(&weekday) {
            return false;
        }

        // Stored settings are validated on write; unparseable rows never silence.
        let (Ok(start), Ok(end)) = (
            parse_time_of_day(&self.start_time),
            parse_time_of_day(&self.end_time),
        ) else {
            return false;
        };
        in_window(local.time(), start, end)
    }

    pub fn status(&self, at: Timestamp) -> QuietStatus {
        let active = self.active_override(at);
        QuietStatus {
            is_quiet: self.is_quiet(at),
            override_active: active.is_some(),
            override_until: active.and_then(|o| o.until()),
        }
    }
}

/// `[start, end)` membership, wrapping past midnight when `end < start`.
/// An empty window (`start == end`) is never quiet.
fn in_window(time: NaiveTime, start: NaiveTime, end: NaiveTime) -> bool {
    if start < end {
        start <= time && time < end
    } else if start > end {
        time >= start || time < end
    } else {
        false
    }
}

/// Parse a strict two-digit `HH:MM` time of day.
pub fn parse_time_of_day(value: &str) -> Result<NaiveTime, CoreError> {
    let invalid = || CoreError::Validation(format!("Invalid time of day '{value}', expected HH:MM"));
    if value.len() != 5 {
        return Err(invalid());
    }
    NaiveTime::parse_from_str(value, TIME_FORMAT).map_err(|_| invalid())
}

/// Snapshot returned by the status query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuietStatus {
    pub is_quiet: bool,
    pub override_active: bool,
    pub override_until: Option<Timestamp>,
}

/// Effective suppression of one item given user-global quietness.
pub fn is_suppressed(
    quiet: bool,
    settings: &DndSettings,
    priority: Priority,
    notification_type: NotificationType,
    sender_id: Option<DbId>,
) -> bool {
    if !quiet {
        return false;
    }
    let urgent_exempt = priority == Priority::Urgent && settings.allow_urgent;
    let mention_exempt = notification_type == NotificationType::Mention && settings.allow_mentions;
    let sender_exempt = sender_id.is_some_and(|id| settings.except_senders.contains(&id));
    !(urgent_exempt || mention_exempt || sender_exempt)
}

// ---------------------------------------------------------------------------
// Partial update
// ---------------------------------------------------------------------------

/// Partial settings update. Absent fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DndUpdate {
    pub enabled: Option<bool>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub weekdays: Option<Vec<u8>>,
    pub allow_urgent: Option<bool>,
    pub allow_mentions: Option<bool>,
    pub except_senders: Option<Vec<DbId>>,
    pub utc_offset_minutes: Option<i32>,
}

impl DndUpdate {
    /// Apply onto `current`, returning the validated result. `current` is
    /// never modified, so a rejected update leaves stored settings untouched.
    pub fn apply(&self, current: &DndSettings) -> Result<DndSettings, CoreError> {
        let mut next = current.clone();
        if let Some(enabled) = self.enabled {
            next.enabled = enabled;
        }
        if let Some(start) = &self.start_time {
            next.start_time = start.clone();
        }
        if let Some(end) = &self.end_time {
            next.end_time = end.clone();
        }
        if let Some(weekdays) = &self.weekdays {
            let mut days = weekdays.clone();
            days.sort_unstable();
            days.dedup();
            next.weekdays = days;
        }
        if let Some(allow) = self.allow_urgent {
            next.allow_urgent = allow;
        }
        if let Some(allow) = self.allow_mentions {
            next.allow_mentions = allow;
        }
        if let Some(senders) = &self.except_senders {
            let mut ids = senders.clone();
            ids.sort_unstable();
            ids.dedup();
            next.except_senders = ids;
        }
        if let Some(offset) = self.utc_offset_minutes {
            next.utc_offset_minutes = offset;
        }
        next.validate()?;
        Ok(next)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
