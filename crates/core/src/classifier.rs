//! Importance scoring and classification.
//!
//! [`Classifier`] is the swappable strategy seam; [`ScoringClassifier`] is the
//! rule-based implementation. Classification is a pure function of the
//! notification fields plus the [`ClassificationContext`] the engine gathers.

use serde::Serialize;

use crate::error::CoreError;
use crate::notification::{AiClassification, Category, PendingNotification, Priority};

// ---------------------------------------------------------------------------
// Score constants
// ---------------------------------------------------------------------------

pub const BASE_SCORE_URGENT: i32 = 90;
pub const BASE_SCORE_HIGH: i32 = 70;
pub const BASE_SCORE_NORMAL: i32 = 40;
pub const BASE_SCORE_LOW: i32 = 15;

/// Bonus for a mention of, or assignment to, the recipient.
pub const DIRECT_ADDRESS_BONUS: i32 = 10;

/// Penalty for automated senders in the `system` category.
pub const AUTOMATED_SYSTEM_PENALTY: i32 = 15;

/// Bonus per unresolved escalation signal.
pub const ESCALATION_BONUS: i32 = 5;

/// Lowest score classified as [`AiClassification::Important`].
pub const IMPORTANT_THRESHOLD: u8 = 75;

/// Lowest score classified as [`AiClassification::Normal`].
pub const NORMAL_THRESHOLD: u8 = 30;

/// Lowest score classified as [`AiClassification::LowPriority`].
pub const LOW_PRIORITY_THRESHOLD: u8 = 10;

/// Sender ids at or below this value belong to automated actors.
pub const SYSTEM_SENDER_ID: i64 = 0;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// The two derived classification fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Classification {
    pub classification: AiClassification,
    pub score: u8,
}

impl Classification {
    /// Used when classification is disabled or fails.
    pub const SAFE_DEFAULT: Classification = Classification {
        classification: AiClassification::Normal,
        score: BASE_SCORE_NORMAL as u8,
    };

    pub fn from_score(score: u8) -> Self {
        Self {
            classification: classify_score(score),
            score,
        }
    }
}

/// Signals gathered from the recipient's existing notifications.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassificationContext {
    /// Unresolved escalation signals, e.g. unread reminders already queued
    /// for the same group.
    pub escalation_signals: u32,
}

/// Strategy for deriving `(ai_classification, ai_score)`.
pub trait Classifier: Send + Sync {
    fn classify(
        &self,
        notification: &PendingNotification,
        context: &ClassificationContext,
    ) -> Result<Classification, CoreError>;
}

/// Rule-based classifier driven by priority, type and sender signals.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScoringClassifier;

impl Classifier for ScoringClassifier {
    fn classify(
        &self,
        notification: &PendingNotification,
        context: &ClassificationContext,
    ) -> Result<Classification, CoreError> {
        let mut score = base_score(notification.priority);

        if notification.notification_type.addresses_recipient() {
            score += DIRECT_ADDRESS_BONUS;
        }

        if notification.category == Category::System && is_automated_sender(notification.sender_id)
        {
            score -= AUTOMATED_SYSTEM_PENALTY;
        }

        let escalation = i64::from(context.escalation_signals) * i64::from(ESCALATION_BONUS);
        let score = (i64::from(score) + escalation).clamp(0, 100) as u8;

        Ok(Classification::from_score(score))
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Starting score for a priority.
pub fn base_score(priority: Priority) -> i32 {
    match priority {
        Priority::Urgent => BASE_SCORE_URGENT,
        Priority::High => BASE_SCORE_HIGH,
        Priority::Normal => BASE_SCORE_NORMAL,
        Priority::Low => BASE_SCORE_LOW,
    }
}

/// Map a score onto its class.
pub fn classify_score(score: u8) -> AiClassification {
    if score >= IMPORTANT_THRESHOLD {
        AiClassification::Important
    } else if score >= NORMAL_THRESHOLD {
        AiClassification::Normal
    } else if score >= LOW_PRIORITY_THRESHOLD {
        AiClassification::LowPriority
    } else {
        AiClassification::Spam
    }
}

/// Missing or reserved sender ids denote the platform itself.
pub fn is_automated_sender(sender_id: Option<i64>) -> bool {
    sender_id.map_or(true, |id| id <= SYSTEM_SENDER_ID)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
