mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use common::TestApp;
use serde_json::Value;
use tower::ServiceExt;

async fn parse_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_promotion_follows_waitlist_order() {
    let app = TestApp::new().await;
    let admin_id = app.bootstrap_admin().await;
    let event_id = app.create_event(&admin_id, "One Seat", Some(1)).await;

    let holder = app.create_member(&admin_id, "Holder").await;
    let early = app.create_member(&admin_id, "Early Waiter").await;
    let late = app.create_member(&admin_id, "Late Waiter").await;

    assert_eq!(app.rsvp(&holder, &event_id).await["status"], "CONFIRMED");
    assert_eq!(app.rsvp(&early, &event_id).await["status"], "WAITLISTED");
    assert_eq!(app.rsvp(&late, &event_id).await["status"], "WAITLISTED");

    // first cancellation promotes the earliest waiter
    let res = app.router.clone().oneshot(
        Request::builder().method("DELETE").uri(format!("/api/v1/events/{}/rsvp", event_id))
            .header("X-Member-Id", &holder)
            .body(Body::empty()).unwrap()
    ).await.unwrap();
    let body = parse_body(res).await;
    assert_eq!(body["promoted"]["member_id"], early.as_str());

    // and the next one promotes the remaining waiter
    let res = app.router.clone().oneshot(
        Request::builder().method("DELETE").uri(format!("/api/v1/events/{}/rsvp", event_id))
            .header("X-Member-Id", &early)
            .body(Body::empty()).unwrap()
    ).await.unwrap();
    let body = parse_body(res).await;
    assert_eq!(body["promoted"]["member_id"], late.as_str());
}

#[tokio::test]
async fn test_waitlisted_cancellation_does_not_promote() {
    let app = TestApp::new().await;
    let admin_id = app.bootstrap_admin().await;
    let event_id = app.create_event(&admin_id, "One Seat", Some(1)).await;

    let holder = app.create_member(&admin_id, "Holder").await;
    let w1 = app.create_member(&admin_id, "W1").await;
    let w2 = app.create_member(&admin_id, "W2").await;

    app.rsvp(&holder, &event_id).await;
    app.rsvp(&w1, &event_id).await;
    app.rsvp(&w2, &event_id).await;

    // a waitlisted member leaving frees no confirmed slot
    let res = app.router.clone().oneshot(
        Request::builder().method("DELETE").uri(format!("/api/v1/events/{}/rsvp", event_id))
            .header("X-Member-Id", &w1)
            .body(Body::empty()).unwrap()
    ).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = parse_body(res).await;
    assert!(body["promoted"].is_null());

    let res = app.router.clone().oneshot(
        Request::builder().method("GET").uri(format!("/api/v1/events/{}/rsvps?status=WAITLISTED", event_id))
            .header("X-Member-Id", &admin_id)
            .body(Body::empty()).unwrap()
    ).await.unwrap();
    let body = parse_body(res).await;
    let list = body.as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["member_id"], w2.as_str());
}

#[tokio::test]
async fn test_no_promotion_once_the_event_is_cancelled() {
    let app = TestApp::new().await;
    let admin_id = app.bootstrap_admin().await;
    let event_id = app.create_event(&admin_id, "One Seat", Some(1)).await;

    let holder = app.create_member(&admin_id, "Holder").await;
    let waiter = app.create_member(&admin_id, "Waiter").await;
    app.rsvp(&holder, &event_id).await;
    app.rsvp(&waiter, &event_id).await;

    app.router.clone().oneshot(
        Request::builder().method("POST").uri(format!("/api/v1/events/{}/cancel", event_id))
            .header("X-Member-Id", &admin_id)
            .body(Body::empty()).unwrap()
    ).await.unwrap();

    // backing out of a dead event must not confirm anyone a seat there
    let res = app.router.clone().oneshot(
        Request::builder().method("DELETE").uri(format!("/api/v1/events/{}/rsvp", event_id))
            .header("X-Member-Id", &holder)
            .body(Body::empty()).unwrap()
    ).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = parse_body(res).await;
    assert!(body["promoted"].is_null());

    let res = app.router.clone().oneshot(
        Request::builder().method("GET").uri(format!("/api/v1/events/{}/rsvps?status=WAITLISTED", event_id))
            .header("X-Member-Id", &admin_id)
            .body(Body::empty()).unwrap()
    ).await.unwrap();
    let body = parse_body(res).await;
    let list = body.as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["member_id"], waiter.as_str());
}

#[tokio::test]
async fn test_rejoining_after_cancel_goes_to_back_of_line() {
    let app = TestApp::new().await;
    let admin_id = app.bootstrap_admin().await;
    let event_id = app.create_event(&admin_id, "One Seat", Some(1)).await;

    let holder = app.create_member(&admin_id, "Holder").await;
    let w1 = app.create_member(&admin_id, "W1").await;
    let w2 = app.create_member(&admin_id, "W2").await;

    app.rsvp(&holder, &event_id).await;
    app.rsvp(&w1, &event_id).await;
    app.rsvp(&w2, &event_id).await;

    // W1 leaves the line and rejoins behind W2
    app.router.clone().oneshot(
        Request::builder().method("DELETE").uri(format!("/api/v1/events/{}/rsvp", event_id))
            .header("X-Member-Id", &w1)
            .body(Body::empty()).unwrap()
    ).await.unwrap();
    assert_eq!(app.rsvp(&w1, &event_id).await["status"], "WAITLISTED");

    let res = app.router.clone().oneshot(
        Request::builder().method("DELETE").uri(format!("/api/v1/events/{}/rsvp", event_id))
            .header("X-Member-Id", &holder)
            .body(Body::empty()).unwrap()
    ).await.unwrap();
    let body = parse_body(res).await;
    assert_eq!(body["promoted"]["member_id"], w2.as_str());
}
