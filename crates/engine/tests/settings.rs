mod common;

use assert_matches::assert_matches;
use common::{harness, start, task_comment};
use mota_core::channels::Channel;
use mota_core::dnd::DndUpdate;
use mota_core::error::CoreError;
use mota_core::notification::{Category, NewNotification, NotificationType, Priority};
use mota_core::preferences::PreferencesUpdate;
use mota_core::presentation::Tab;
use mota_core::subscription::SubscriptionUpdate;
use mota_events::EventKind;

fn with_email() -> SubscriptionUpdate {
    SubscriptionUpdate {
        email_enabled: Some(true),
        ..SubscriptionUpdate::default()
    }
}

#[tokio::test]
async fn override_makes_user_quiet_until_it_lapses() {
    let h = harness();
    assert!(!h.center.is_quiet(1, start()).await.unwrap());

    let status = h.center.enable_dnd_override(1, Some(60)).await.unwrap();
    assert!(status.is_quiet);
    assert!(status.override_active);
    assert_eq!(status.override_until, Some(start() + chrono::Duration::minutes(60)));

    h.advance_minutes(59);
    assert!(h.center.dnd_status(1).await.unwrap().is_quiet);
    h.advance_minutes(1);
    let lapsed = h.center.dnd_status(1).await.unwrap();
    assert!(!lapsed.is_quiet);
    assert!(!lapsed.override_active);
    assert!(h.center.get_dnd_settings(1).await.unwrap().dnd_override.is_none());
}

#[tokio::test]
async fn indefinite_override_lasts_until_disabled() {
    let h = harness();
    h.center.enable_dnd_override(1, None).await.unwrap();
    h.advance_minutes(60 * 24 * 30);
    assert!(h.center.dnd_status(1).await.unwrap().is_quiet);

    let status = h.center.disable_dnd_override(1).await.unwrap();
    assert!(!status.is_quiet);
}

#[tokio::test]
async fn override_duration_is_bounded() {
    let h = harness();
    assert_matches!(
        h.center.enable_dnd_override(1, Some(0)).await,
        Err(CoreError::Validation(_))
    );
    assert_matches!(
        h.center.enable_dnd_override(1, Some(10_081)).await,
        Err(CoreError::Validation(_))
    );
}

#[tokio::test]
async fn schedule_updates_keep_the_override() {
    let h = harness();
    h.center.enable_dnd_override(1, Some(120)).await.unwrap();
    h.center
        .update_dnd_settings(
            1,
            DndUpdate {
                start_time: Some("23:00".into()),
                ..DndUpdate::default()
            },
        )
        .await
        .unwrap();

    let settings = h.center.get_dnd_settings(1).await.unwrap();
    assert_eq!(settings.start_time, "23:00");
    assert!(settings.dnd_override.is_some());
}

#[tokio::test]
async fn urgent_bypasses_quiet_hours_but_normal_defers_external_channels() {
    let h = harness();
    h.center
        .update_subscription(1, Category::Task, with_email())
        .await
        .unwrap();
    h.center.enable_dnd_override(1, Some(60)).await.unwrap();

    let urgent = h
        .center
        .submit(task_comment(1, 1).with_priority(Priority::Urgent))
        .await
        .unwrap();
    assert!(!urgent.suppressed);
    assert_eq!(urgent.channels, vec![Channel::InApp, Channel::Email]);

    let normal = h.center.submit(task_comment(1, 2)).await.unwrap();
    assert!(normal.suppressed);
    assert_eq!(normal.channels, vec![Channel::InApp]);

    let listed = h.center.list(1, Tab::All, false).await.unwrap();
    assert_eq!(listed.len(), 2);
    let flags: Vec<_> = listed.iter().map(|l| l.is_suppressed).collect();
    assert!(flags.contains(&true) && flags.contains(&false));
}

#[tokio::test]
async fn mentions_bypass_quiet_hours_unless_disallowed() {
    let h = harness();
    h.center.enable_dnd_override(1, None).await.unwrap();
    let mention = || {
        NewNotification::new(1, NotificationType::Mention, Category::Comment, "You were mentioned")
            .with_subject("comment", 5)
            .with_sender(2)
    };
    assert!(!h.center.submit(mention()).await.unwrap().suppressed);

    h.center
        .update_dnd_settings(
            1,
            DndUpdate {
                allow_mentions: Some(false),
                ..DndUpdate::default()
            },
        )
        .await
        .unwrap();
    assert!(h.center.submit(mention()).await.unwrap().suppressed);
}

#[tokio::test]
async fn excepted_senders_bypass_quiet_hours() {
    let h = harness();
    h.center
        .update_dnd_settings(
            1,
            DndUpdate {
                except_senders: Some(vec![9]),
                ..DndUpdate::default()
            },
        )
        .await
        .unwrap();
    h.center.enable_dnd_override(1, None).await.unwrap();

    // task_comment is sent by user 9.
    let trusted = h.center.submit(task_comment(1, 1)).await.unwrap();
    assert!(!trusted.suppressed);
    let other = h
        .center
        .submit(task_comment(1, 2).with_sender(4))
        .await
        .unwrap();
    assert!(other.suppressed);
    assert_eq!(h.center.get_dnd_settings(1).await.unwrap().except_senders, vec![9]);
}

#[tokio::test]
async fn scheduled_window_wraps_midnight_in_local_time() {
    let h = harness();
    h.center
        .update_dnd_settings(
            1,
            DndUpdate {
                enabled: Some(true),
                start_time: Some("22:00".into()),
                end_time: Some("08:00".into()),
                utc_offset_minutes: Some(120),
                ..DndUpdate::default()
            },
        )
        .await
        .unwrap();

    // 12:00 UTC is 14:00 local.
    assert!(!h.center.is_quiet(1, start()).await.unwrap());
    // 21:00 UTC is 23:00 local.
    assert!(h.center.is_quiet(1, start() + chrono::Duration::hours(9)).await.unwrap());
    // 05:30 UTC next day is 07:30 local.
    let early = start() + chrono::Duration::minutes(17 * 60 + 30);
    assert!(h.center.is_quiet(1, early).await.unwrap());
    // 06:00 UTC is 08:00 local; the end is exclusive.
    assert!(!h.center.is_quiet(1, start() + chrono::Duration::hours(18)).await.unwrap());
}

#[tokio::test]
async fn invalid_dnd_update_leaves_settings_untouched() {
    let h = harness();
    let before = h.center.get_dnd_settings(1).await.unwrap();

    for update in [
        DndUpdate {
            start_time: Some("25:00".into()),
            ..DndUpdate::default()
        },
        DndUpdate {
            weekdays: Some(vec![7]),
            ..DndUpdate::default()
        },
        DndUpdate {
            enabled: Some(true),
            weekdays: Some(Vec::new()),
            ..DndUpdate::default()
        },
        DndUpdate {
            utc_offset_minutes: Some(15 * 60),
            ..DndUpdate::default()
        },
    ] {
        assert_matches!(
            h.center.update_dnd_settings(1, update).await,
            Err(CoreError::Validation(_))
        );
    }
    assert_eq!(h.center.get_dnd_settings(1).await.unwrap(), before);
}

#[tokio::test]
async fn unsubscribed_category_is_hidden_from_all_but_shown_on_its_tab() {
    let h = harness();
    let plan = NewNotification::new(1, NotificationType::PlanApproved, Category::Plan, "Approved")
        .with_subject("plan", 3)
        .with_sender(2);
    h.center.submit(plan).await.unwrap();
    h.center.submit(task_comment(1, 1)).await.unwrap();

    h.center
        .update_subscription(
            1,
            Category::Plan,
            SubscriptionUpdate {
                enabled: Some(false),
                ..SubscriptionUpdate::default()
            },
        )
        .await
        .unwrap();

    let all = h.center.list(1, Tab::All, false).await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].notification.category, Category::Task);
    assert_eq!(h.center.list(1, Tab::Plan, false).await.unwrap().len(), 1);
    assert!(!h
        .center
        .is_channel_enabled(1, Category::Plan, Channel::InApp)
        .await
        .unwrap());
}

#[tokio::test]
async fn subscriptions_list_every_category() {
    let h = harness();
    h.center
        .update_subscription(1, Category::Feedback, with_email())
        .await
        .unwrap();
    let subs = h.center.get_subscriptions(1).await.unwrap();
    assert_eq!(subs.len(), Category::ALL.len());
    let feedback = subs.iter().find(|s| s.category == Category::Feedback).unwrap();
    assert!(feedback.enabled && feedback.email_enabled && !feedback.push_enabled);
}

#[tokio::test]
async fn preferences_are_validated_and_published() {
    let h = harness();
    let mut rx = h.bus.subscribe();
    assert_matches!(
        h.center
            .update_preferences(
                1,
                PreferencesUpdate {
                    aggregation_interval_minutes: Some(1),
                    ..PreferencesUpdate::default()
                },
            )
            .await,
        Err(CoreError::Validation(_))
    );

    let prefs = h
        .center
        .update_preferences(
            1,
            PreferencesUpdate {
                aggregation_interval_minutes: Some(60),
                ..PreferencesUpdate::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(prefs.aggregation_interval_minutes, 60);
    assert_eq!(h.center.get_preferences(1).await.unwrap(), prefs);
    assert_eq!(rx.recv().await.unwrap().kind, EventKind::PreferencesChanged);
}

#[tokio::test]
async fn longer_aggregation_interval_widens_the_window() {
    let h = harness();
    h.center
        .update_preferences(
            1,
            PreferencesUpdate {
                aggregation_interval_minutes: Some(60),
                ..PreferencesUpdate::default()
            },
        )
        .await
        .unwrap();
    h.center.submit(task_comment(1, 7)).await.unwrap();
    h.advance_minutes(45);
    assert!(h.center.submit(task_comment(1, 7)).await.unwrap().merged);
}
