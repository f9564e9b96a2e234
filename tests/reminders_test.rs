//! Reminder pass triggered through the cron endpoint.

mod common;

use axum::http::Method;
use chrono::{Duration, Utc};
use common::{days_from_now, response_json, TestApp, TestOptions};
use hostel_api::{
    entities::{
        booking::{BookingStatus, PaymentStatus},
        email_reminder,
    },
    services::pricing,
};
use sea_orm::{EntityTrait, PaginatorTrait};

const CRON_URI: &str = "/api/v1/cron/reminders";

#[tokio::test]
async fn arriving_guests_get_one_checkin_reminder() {
    let app = TestApp::new().await;
    let tomorrow = pricing::hostel_today(
        Utc::now(),
        app.state.config.hostel_timezone_offset_minutes,
    ) + Duration::days(1);
    let booking = app
        .insert_booking(
            &app.dorm,
            tomorrow,
            tomorrow + Duration::days(2),
            BookingStatus::Confirmed,
            PaymentStatus::Paid,
        )
        .await;
    // Unconfirmed bookings are not reminded.
    app.insert_booking(
        &app.dorm,
        tomorrow,
        tomorrow + Duration::days(1),
        BookingStatus::Cancelled,
        PaymentStatus::Paid,
    )
    .await;

    let response = app.get(CRON_URI).await;
    assert_eq!(response.status(), 200);
    let body = response_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["checkin_reminders"], 1);

    let reminders = app
        .sent_emails()
        .into_iter()
        .filter(|m| m.html.contains(&booking.checkin_token))
        .count();
    assert_eq!(reminders, 1);

    // A second pass finds the reminder already recorded.
    let again = response_json(app.get(CRON_URI).await).await;
    assert_eq!(again["checkin_reminders"], 0);
    assert_eq!(
        email_reminder::Entity::find()
            .count(&*app.state.db)
            .await
            .unwrap(),
        1
    );
}

#[tokio::test]
async fn bookings_further_out_are_left_alone() {
    let app = TestApp::new().await;
    app.insert_booking(
        &app.dorm,
        days_from_now(5),
        days_from_now(7),
        BookingStatus::Confirmed,
        PaymentStatus::Paid,
    )
    .await;

    let body = response_json(app.get(CRON_URI).await).await;
    assert_eq!(body["checkin_reminders"], 0);
    assert!(app.sent_emails().is_empty());
}

#[tokio::test]
async fn cron_secret_is_enforced_when_configured() {
    let mut options = TestOptions::default();
    options.config.cron_secret = Some("cron-s3cret".to_string());
    let app = TestApp::with_options(options).await;

    assert_eq!(app.get(CRON_URI).await.status(), 401);
    let wrong = app
        .request(Method::GET, CRON_URI, None, Some("nope"))
        .await;
    assert_eq!(wrong.status(), 401);
    let right = app
        .request(Method::GET, CRON_URI, None, Some("cron-s3cret"))
        .await;
    assert_eq!(right.status(), 200);
}

#[tokio::test]
async fn production_without_secret_is_closed() {
    let mut options = TestOptions::default();
    options.config.environment = "production".to_string();
    let app = TestApp::with_options(options).await;

    assert_eq!(app.get(CRON_URI).await.status(), 401);
}

#[tokio::test]
async fn reminders_need_an_email_provider() {
    let app = TestApp::with_options(TestOptions {
        email_enabled: false,
        ..Default::default()
    })
    .await;

    let response = app.get(CRON_URI).await;
    assert_eq!(response.status(), 500);
    assert_eq!(
        response_json(response).await["message"],
        "Email service not configured"
    );
}
