//! Submit pipeline: classify, aggregate, persist, publish.

use mota_core::aggregation::{self, AggregationDecision, AggregationPolicy};
use mota_core::channels::Channel;
use mota_core::classifier::{Classification, ClassificationContext};
use mota_core::dnd::is_suppressed;
use mota_core::error::CoreError;
use mota_core::notification::{NewNotification, Notification, PendingNotification};
use mota_core::preferences::NotificationPreferences;
use mota_core::subscription::delivery_channels;
use mota_db::{NotificationFilter, StoreError};
use mota_events::{CenterEvent, EventKind};
use serde::Serialize;

use super::{NotificationCenter, MAX_WRITE_ATTEMPTS};

/// Largest number of notifications accepted by one batch submission.
pub const MAX_SUBMIT_BATCH: usize = 500;

/// Result of [`NotificationCenter::submit`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitOutcome {
    /// The head now representing the submission.
    pub notification: Notification,
    /// `true` when folded into an existing head.
    pub merged: bool,
    /// Quiet hours held back external delivery.
    pub suppressed: bool,
    pub channels: Vec<Channel>,
}

/// One pass of the decide-and-write loop.
enum Attempt {
    Committed(Notification, bool),
    Retry,
}

impl NotificationCenter {
    /// Ingest a raw notification.
    ///
    /// The record is never dropped for classification reasons; a failing
    /// classifier yields the safe default. Store failures and exhausted
    /// retries are returned to the producer.
    pub async fn submit(&self, raw: NewNotification) -> Result<SubmitOutcome, CoreError> {
        raw.validate_fields()?;
        let user_id = raw.user_id;
        let prefs = self.preferences_or_default(user_id).await?;
        let policy = prefs.aggregation_policy(self.config.aggregation_max_members);

        let mut pending = PendingNotification::from_new(raw, self.clock.now());
        let group_key = aggregation::group_key_for(&pending);
        pending.group_key = Some(group_key.clone());

        for attempt in 1..=MAX_WRITE_ATTEMPTS {
            let recent = self
                .notifications
                .get_by_user(user_id, &NotificationFilter::for_group(group_key.clone()))
                .await?;
            match self.try_commit(&mut pending, &recent, &prefs, &policy).await? {
                Attempt::Committed(notification, merged) => {
                    return Ok(self.announce(notification, merged, &pending).await);
                }
                Attempt::Retry => {
                    tracing::debug!(user_id, group_key = %group_key, attempt, "Intake conflict, re-deciding");
                }
            }
        }

        Err(CoreError::Conflict(format!(
            "could not place notification for user {user_id} after {MAX_WRITE_ATTEMPTS} attempts"
        )))
    }

    /// Ingest several notifications in order.
    ///
    /// Every entry is validated before anything is written, so a malformed
    /// entry rejects the whole batch. A store failure part way through is
    /// returned as is; entries before it stay committed.
    pub async fn submit_batch(
        &self,
        batch: Vec<NewNotification>,
    ) -> Result<Vec<SubmitOutcome>, CoreError> {
        if batch.len() > MAX_SUBMIT_BATCH {
            return Err(CoreError::Validation(format!(
                "At most {MAX_SUBMIT_BATCH} notifications per batch, got {}",
                batch.len()
            )));
        }
        for (index, raw) in batch.iter().enumerate() {
            raw.validate_fields().map_err(|e| match e {
                CoreError::Validation(msg) => {
                    CoreError::Validation(format!("notification {index}: {msg}"))
                }
                other => other,
            })?;
        }

        let mut outcomes = Vec::with_capacity(batch.len());
        for raw in batch {
            outcomes.push(self.submit(raw).await?);
        }
        let merged = outcomes.iter().filter(|o| o.merged).count();
        tracing::info!(count = outcomes.len(), merged, "Batch accepted");
        Ok(outcomes)
    }

    async fn try_commit(
        &self,
        pending: &mut PendingNotification,
        recent: &[Notification],
        prefs: &NotificationPreferences,
        policy: &AggregationPolicy,
    ) -> Result<Attempt, CoreError> {
        let classification = self.classify(pending, recent, prefs);
        pending.ai_classification = classification.classification;
        pending.ai_score = classification.score;
        prefs.apply_intake_flags(pending, classification);

        match aggregation::decide(pending, recent, policy) {
            AggregationDecision::MergeInto(head_id) => {
                let Some(found) = recent.iter().find(|n| n.id == head_id) else {
                    return Ok(Attempt::Retry);
                };
                let mut head = found.clone();
                aggregation::merge(&mut head, pending, classification, policy.max_members);
                head.is_pinned |= pending.is_pinned;
                prefs.release_intake_collapse(&mut head);
                match self.notifications.upsert(&head, Some(found.version)).await {
                    Ok(stored) => Ok(Attempt::Committed(stored, true)),
                    Err(StoreError::VersionConflict { .. } | StoreError::NotFound { .. }) => {
                        Ok(Attempt::Retry)
                    }
                    Err(e) => Err(e.into()),
                }
            }
            AggregationDecision::NewHead { stale_heads } => {
                for stale_id in stale_heads {
                    let Some(found) = recent.iter().find(|n| n.id == stale_id) else {
                        continue;
                    };
                    let mut closed = found.clone();
                    closed.group_closed = true;
                    match self.notifications.upsert(&closed, Some(found.version)).await {
                        Ok(_) => {
                            tracing::debug!(notification_id = stale_id, "Closed stale group head");
                        }
                        Err(StoreError::VersionConflict { .. }) => return Ok(Attempt::Retry),
                        Err(StoreError::NotFound { .. }) => {}
                        Err(e) => return Err(e.into()),
                    }
                }
                match self.notifications.insert(pending.clone()).await {
                    Ok(stored) => Ok(Attempt::Committed(stored, false)),
                    Err(StoreError::OpenGroupExists { .. }) => Ok(Attempt::Retry),
                    Err(e) => Err(e.into()),
                }
            }
        }
    }

    fn classify(
        &self,
        pending: &PendingNotification,
        recent: &[Notification],
        prefs: &NotificationPreferences,
    ) -> Classification {
        if !prefs.enable_ai_classification {
            return Classification::SAFE_DEFAULT;
        }
        let context = ClassificationContext {
            escalation_signals: aggregation::escalation_signals(pending, recent),
        };
        self.classifier
            .classify(pending, &context)
            .unwrap_or_else(|e| {
                tracing::warn!(
                    user_id = pending.user_id,
                    error = %e,
                    "Classification failed, using safe default"
                );
                Classification::SAFE_DEFAULT
            })
    }

    /// Resolve delivery for a committed record and publish it.
    ///
    /// The record is already stored, so settings lookup failures degrade to
    /// in-app delivery instead of failing the submission.
    async fn announce(
        &self,
        notification: Notification,
        merged: bool,
        pending: &PendingNotification,
    ) -> SubmitOutcome {
        let user_id = notification.user_id;
        let now = self.clock.now();

        let dnd = self.dnd_or_default(user_id).await.unwrap_or_else(|e| {
            tracing::warn!(user_id, error = %e, "DND lookup failed after commit");
            Default::default()
        });
        let subscriptions = self
            .settings
            .get_subscriptions(user_id)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!(user_id, error = %e, "Subscription lookup failed after commit");
                Vec::new()
            });

        let suppressed = is_suppressed(
            dnd.is_quiet(now),
            &dnd,
            pending.priority,
            pending.notification_type,
            pending.sender_id,
        );
        let channels = delivery_channels(&subscriptions, notification.category, suppressed);

        let kind = if merged {
            EventKind::Merged
        } else {
            EventKind::Created
        };
        self.bus.publish(
            CenterEvent::new(kind, user_id, now)
                .with_notification(notification.id)
                .with_channels(channels.clone())
                .with_payload(serde_json::json!({
                    "aggregatedCount": notification.aggregated_count,
                    "suppressed": suppressed,
                })),
        );

        tracing::info!(
            user_id,
            notification_id = notification.id,
            merged,
            suppressed,
            aggregated_count = notification.aggregated_count,
            classification = %notification.ai_classification,
            "Notification accepted"
        );

        SubmitOutcome {
            notification,
            merged,
            suppressed,
            channels,
        }
    }
}
