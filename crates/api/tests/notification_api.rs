//! HTTP-level tests for the `/notifications` endpoints.
//!
//! Requests go straight to the router through `tower::ServiceExt::oneshot`.

mod common;

use axum::http::StatusCode;
use common::{
    body_json, delete, get, get_anonymous, post, post_json, put_json, submit, submit_batch,
    task_comment,
};
use serde_json::json;

const BASE: &str = "/api/v1/notifications";

async fn submit_id(app: &common::TestApp, body: serde_json::Value) -> i64 {
    let response = submit(app.app(), body).await;
    assert!(response.status().is_success());
    body_json(response).await["data"]["notification"]["id"]
        .as_i64()
        .unwrap()
}

// ---------------------------------------------------------------------------
// Intake
// ---------------------------------------------------------------------------

#[tokio::test]
async fn batch_submission_returns_outcomes_in_order() {
    let app = common::build_test_app();
    let response = submit_batch(
        app.app(),
        json!({ "notifications": [task_comment(1, 7), task_comment(1, 7), task_comment(1, 8)] }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    let merged: Vec<_> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|o| o["merged"].as_bool().unwrap())
        .collect();
    assert_eq!(merged, vec![false, true, false]);

    let mut bad = task_comment(1, 9);
    bad["title"] = json!("");
    let response = submit_batch(app.app(), json!({ "notifications": [task_comment(1, 9), bad] })).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let list = body_json(get(app.app(), BASE, 1).await).await;
    assert_eq!(list["data"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn statistics_report_totals_by_type() {
    let app = common::build_test_app();
    submit_id(&app, task_comment(1, 7)).await;
    submit_id(&app, task_comment(1, 7)).await;
    let other = submit_id(&app, task_comment(1, 8)).await;
    post(app.app(), &format!("{BASE}/{other}/read"), 1).await;

    let response = get(app.app(), &format!("{BASE}/statistics"), 1).await;
    assert_eq!(response.status(), StatusCode::OK);
    let stats = body_json(response).await;
    assert_eq!(stats["data"]["total"], 3);
    assert_eq!(stats["data"]["read"], 1);
    assert_eq!(stats["data"]["unread"], 2);
    assert_eq!(stats["data"]["unreadByType"]["task_comment"], 2);

    let anonymous = get_anonymous(app.app(), &format!("{BASE}/statistics")).await;
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn submit_creates_then_merges() {
    let app = common::build_test_app();

    let first = submit(app.app(), task_comment(1, 7)).await;
    assert_eq!(first.status(), StatusCode::CREATED);
    let first = body_json(first).await;
    assert_eq!(first["data"]["merged"], false);
    assert_eq!(first["data"]["channels"], json!(["in_app"]));

    let second = submit(app.app(), task_comment(1, 7)).await;
    assert_eq!(second.status(), StatusCode::OK);
    let second = body_json(second).await;
    assert_eq!(second["data"]["merged"], true);
    assert_eq!(second["data"]["notification"]["aggregatedCount"], 2);

    let list = body_json(get(app.app(), BASE, 1).await).await;
    let items = list["data"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["aggregatedMembers"].as_array().unwrap().len(), 2);
    assert_eq!(items[0]["isSuppressed"], false);
    assert_eq!(items[0]["isExpanded"], false);
}

#[tokio::test]
async fn invalid_submission_returns_400() {
    let app = common::build_test_app();
    let mut body = task_comment(1, 7);
    body["title"] = json!("");

    let response = submit(app.app(), body).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
}

// ---------------------------------------------------------------------------
// Caller identity
// ---------------------------------------------------------------------------

#[tokio::test]
async fn missing_caller_header_returns_401() {
    let app = common::build_test_app();
    let response = get_anonymous(app.app(), BASE).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn other_users_notification_returns_404() {
    let app = common::build_test_app();
    let id = submit_id(&app, task_comment(1, 7)).await;

    let response = get(app.app(), &format!("{BASE}/{id}"), 2).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["code"], "NOT_FOUND");

    let response = post(app.app(), &format!("{BASE}/{id}/read"), 2).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Read state and counts
// ---------------------------------------------------------------------------

#[tokio::test]
async fn read_endpoints_update_unread_counts() {
    let app = common::build_test_app();
    let first = submit_id(&app, task_comment(1, 1)).await;
    submit_id(&app, task_comment(1, 2)).await;
    submit_id(&app, task_comment(1, 2)).await;

    let counts = body_json(get(app.app(), &format!("{BASE}/unread-count"), 1).await).await;
    assert_eq!(counts["data"]["total"], 3);
    assert_eq!(counts["data"]["byCategory"]["task"], 3);

    let read = body_json(post(app.app(), &format!("{BASE}/{first}/read"), 1).await).await;
    assert_eq!(read["data"]["isRead"], true);

    let all = body_json(post(app.app(), &format!("{BASE}/read-all"), 1).await).await;
    assert_eq!(all["data"]["count"], 1);

    let unread = body_json(get(app.app(), &format!("{BASE}?tab=unread"), 1).await).await;
    assert!(unread["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn batch_and_category_reads() {
    let app = common::build_test_app();
    let a = submit_id(&app, task_comment(1, 1)).await;
    let b = submit_id(&app, task_comment(1, 2)).await;
    submit_id(
        &app,
        json!({
            "userId": 1,
            "type": "plan_submitted",
            "category": "plan",
            "title": "Plan submitted",
            "senderId": 4,
        }),
    )
    .await;

    let response = post_json(
        app.app(),
        &format!("{BASE}/batch-read"),
        1,
        json!({ "ids": [a, b, 999] }),
    )
    .await;
    assert_eq!(body_json(response).await["data"]["count"], 2);

    let response = post(app.app(), &format!("{BASE}/category/plan/read"), 1).await;
    assert_eq!(body_json(response).await["data"]["count"], 1);
}

// ---------------------------------------------------------------------------
// Presentation flags
// ---------------------------------------------------------------------------

#[tokio::test]
async fn pin_moves_record_to_pinned_tab() {
    let app = common::build_test_app();
    let id = submit_id(&app, task_comment(1, 1)).await;

    let pinned = body_json(post(app.app(), &format!("{BASE}/{id}/pin"), 1).await).await;
    assert_eq!(pinned["data"]["isPinned"], true);

    let tab = body_json(get(app.app(), &format!("{BASE}?tab=pinned"), 1).await).await;
    assert_eq!(tab["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn expand_is_reported_and_closes_the_group() {
    let app = common::build_test_app();
    let id = submit_id(&app, task_comment(1, 7)).await;

    let response = post_json(
        app.app(),
        &format!("{BASE}/{id}/expand"),
        1,
        json!({ "expanded": true }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["isExpanded"], true);
    assert_eq!(json["data"]["groupClosed"], true);

    let next = submit(app.app(), task_comment(1, 7)).await;
    assert_eq!(next.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn collapse_toggle_and_collapsed_listing() {
    let app = common::build_test_app();
    let id = submit_id(&app, task_comment(1, 1)).await;

    let collapsed = body_json(post(app.app(), &format!("{BASE}/{id}/collapse"), 1).await).await;
    assert_eq!(collapsed["data"]["isCollapsed"], true);

    let hidden = body_json(get(app.app(), BASE, 1).await).await;
    assert!(hidden["data"].as_array().unwrap().is_empty());
    let shown = body_json(get(app.app(), &format!("{BASE}?show_collapsed=true"), 1).await).await;
    assert_eq!(shown["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn reclassify_sets_class_and_validates_input() {
    let app = common::build_test_app();
    let id = submit_id(&app, task_comment(1, 1)).await;

    let response = put_json(
        app.app(),
        &format!("{BASE}/{id}/classification"),
        1,
        json!({ "classification": "spam" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["aiClassification"], "spam");
    assert_eq!(json["data"]["aiScore"], 40);

    let response = put_json(
        app.app(),
        &format!("{BASE}/{id}/classification"),
        1,
        json!({ "classification": "urgent-ish" }),
    )
    .await;
    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn collapse_low_priority_reports_count() {
    let app = common::build_test_app();
    put_json(
        app.app(),
        &format!("{BASE}/preferences"),
        1,
        json!({ "showLowPriorityCollapsed": false, "autoCollapseThreshold": 0 }),
    )
    .await;
    let mut low = task_comment(1, 1);
    low["priority"] = json!("low");
    submit_id(&app, low).await;
    submit_id(&app, task_comment(1, 2)).await;

    let response = post(app.app(), &format!("{BASE}/collapse-low-priority"), 1).await;
    assert_eq!(body_json(response).await["data"]["count"], 1);
}

// ---------------------------------------------------------------------------
// Deletion
// ---------------------------------------------------------------------------

#[tokio::test]
async fn delete_endpoints() {
    let app = common::build_test_app();
    let a = submit_id(&app, task_comment(1, 1)).await;
    let b = submit_id(&app, task_comment(1, 2)).await;
    let c = submit_id(&app, task_comment(1, 3)).await;
    submit_id(&app, task_comment(2, 1)).await;

    let response = delete(app.app(), &format!("{BASE}/{a}"), 1).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let again = delete(app.app(), &format!("{BASE}/{a}"), 1).await;
    assert_eq!(again.status(), StatusCode::NOT_FOUND);

    let response = post_json(
        app.app(),
        &format!("{BASE}/batch-delete"),
        1,
        json!({ "ids": [b] }),
    )
    .await;
    assert_eq!(body_json(response).await["data"]["count"], 1);

    let response = delete(app.app(), BASE, 1).await;
    assert_eq!(body_json(response).await["data"]["count"], 1);
    let gone = get(app.app(), &format!("{BASE}/{c}"), 1).await;
    assert_eq!(gone.status(), StatusCode::NOT_FOUND);

    let others = body_json(get(app.app(), BASE, 2).await).await;
    assert_eq!(others["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn oversized_batch_is_rejected() {
    let app = common::build_test_app();
    let ids: Vec<i64> = (1..=501).collect();
    let response = post_json(
        app.app(),
        &format!("{BASE}/batch-read"),
        1,
        json!({ "ids": ids }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "BAD_REQUEST");
}

// ---------------------------------------------------------------------------
// Store outage
// ---------------------------------------------------------------------------

#[tokio::test]
async fn store_outage_returns_503() {
    let app = common::build_test_app();
    app.store.set_available(false);

    let response = get(app.app(), BASE, 1).await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body_json(response).await["code"], "UPSTREAM_UNAVAILABLE");

    let response = submit(app.app(), task_comment(1, 1)).await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}
