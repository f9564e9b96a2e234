//! Integration tests for the public booking funnel.
//!
//! Covers:
//! - Pay-on-arrival booking requests and their notification emails
//! - Request validation (required fields, dates, unknown rooms)
//! - Hosted checkout creation and the session summary
//! - Payment provider failures

mod common;

use axum::http::Method;
use common::{days_from_now, response_json, TestApp, TestOptions};
use hostel_api::entities::booking::{self, PaymentStatus};
use sea_orm::EntityTrait;
use serde_json::{json, Value};

fn stay(room_id: &str, nights: i64, guests: i32) -> Value {
    json!({
        "room_id": room_id,
        "guest_name": "Lucía Benítez",
        "guest_email": "Lucia@Example.com",
        "guest_phone": "+595 981 123456",
        "check_in": days_from_now(7).to_string(),
        "check_out": days_from_now(7 + nights).to_string(),
        "guest_count": guests,
    })
}

#[tokio::test]
async fn booking_request_prices_dorm_per_bed_and_emails_both_parties() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/bookings",
            Some(stay(&app.dorm.id.to_string(), 3, 2)),
            None,
        )
        .await;
    assert_eq!(response.status(), 201);

    let body = response_json(response).await;
    assert_eq!(body["email_sent"], true);
    let receipt = &body["booking"];
    assert_eq!(receipt["nights"], 3);
    assert_eq!(receipt["total_price"], "72.00");
    assert_eq!(receipt["guest_email"], "lucia@example.com");
    assert_eq!(receipt["payment_method"], "on_arrival");
    assert_eq!(receipt["payment_status"], "pending");
    assert!(receipt.get("checkin_token").is_none());

    let recipients: Vec<String> = app
        .sent_emails()
        .into_iter()
        .flat_map(|m| m.to)
        .collect();
    assert!(recipients.contains(&app.state.config.hostel_email));
    assert!(recipients.contains(&"lucia@example.com".to_string()));
}

#[tokio::test]
async fn private_room_is_priced_per_room() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/bookings",
            Some(stay(&app.private_room.id.to_string(), 2, 2)),
            None,
        )
        .await;
    assert_eq!(response.status(), 201);
    let body = response_json(response).await;
    assert_eq!(body["booking"]["total_price"], "70.00");
}

#[tokio::test]
async fn booking_request_requires_a_phone_number() {
    let app = TestApp::new().await;
    let mut request = stay(&app.dorm.id.to_string(), 2, 1);
    request["guest_phone"] = Value::Null;

    let response = app
        .request(Method::POST, "/api/v1/bookings", Some(request), None)
        .await;
    assert_eq!(response.status(), 400);
    let body = response_json(response).await;
    assert!(body["message"].as_str().unwrap().contains("guest_phone"));
}

#[tokio::test]
async fn booking_request_rejects_past_and_inverted_dates() {
    let app = TestApp::new().await;
    let room_id = app.dorm.id.to_string();

    let mut past = stay(&room_id, 2, 1);
    past["check_in"] = json!(days_from_now(-3).to_string());
    past["check_out"] = json!(days_from_now(-1).to_string());
    let response = app
        .request(Method::POST, "/api/v1/bookings", Some(past), None)
        .await;
    assert_eq!(response.status(), 400);

    let mut inverted = stay(&room_id, 2, 1);
    inverted["check_out"] = json!(days_from_now(5).to_string());
    let response = app
        .request(Method::POST, "/api/v1/bookings", Some(inverted), None)
        .await;
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn booking_request_rejects_too_many_guests() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/bookings",
            Some(stay(&app.private_room.id.to_string(), 2, 3)),
            None,
        )
        .await;
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn unknown_room_is_not_found() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/bookings",
            Some(stay(&uuid::Uuid::new_v4().to_string(), 2, 1)),
            None,
        )
        .await;
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn checkout_opens_session_and_summary_finds_it() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/checkout",
            Some(stay(&app.private_room.id.to_string(), 2, 2)),
            None,
        )
        .await;
    assert_eq!(response.status(), 200);
    let body = response_json(response).await;
    let session_id = body["session_id"].as_str().unwrap().to_string();
    assert!(body["url"].as_str().unwrap().contains(&session_id));

    let sent = app.gateway.requests.lock().unwrap().clone();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].unit_amount_cents, 7000);
    assert_eq!(sent[0].product_name, "Private Double Room - 2 nights");
    assert!(sent[0].metadata.contains_key("booking_id"));
    assert!(sent[0]
        .success_url
        .starts_with("https://mandioca.test/booking/success"));

    let response = app
        .get(&format!("/api/v1/checkout/session/{}", session_id))
        .await;
    assert_eq!(response.status(), 200);
    let summary = response_json(response).await;
    assert_eq!(summary["booking"]["payment_status"], "processing");
    assert_eq!(summary["booking"]["payment_method"], "online");
}

#[tokio::test]
async fn unknown_checkout_session_is_not_found() {
    let app = TestApp::new().await;
    let response = app.get("/api/v1/checkout/session/cs_missing").await;
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn gateway_failure_marks_booking_failed() {
    let app = TestApp::with_options(TestOptions {
        gateway_fails: true,
        ..Default::default()
    })
    .await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/checkout",
            Some(stay(&app.dorm.id.to_string(), 2, 1)),
            None,
        )
        .await;
    assert_eq!(response.status(), 502);

    let bookings = booking::Entity::find()
        .all(&*app.state.db)
        .await
        .expect("list bookings");
    assert_eq!(bookings.len(), 1);
    assert_eq!(bookings[0].payment_status, PaymentStatus::Failed);
}
