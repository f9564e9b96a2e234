//! Guest self check-in over multipart form data.

mod common;

use axum::{
    body::Body,
    http::{Method, Request},
};
use common::{days_from_now, response_json, TestApp, TestOptions};
use hostel_api::entities::{
    booking::{self, BookingStatus, PaymentStatus},
    check_in, consent_log, guest,
};
use rstest::rstest;
use sea_orm::{EntityTrait, PaginatorTrait};

const BOUNDARY: &str = "----hostel-test-boundary";
// 1x1 transparent PNG header bytes, enough to decode as base64.
const SIGNATURE: &str = "data:image/png;base64,iVBORw0KGgo=";

enum Part<'a> {
    Text(&'a str, String),
    File(&'a str, &'a str, &'a str, &'a [u8]),
}

fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Part::File(name, file_name, content_type, data) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                        name, file_name, content_type
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(data);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn complete_form() -> Vec<Part<'static>> {
    vec![
        Part::Text("nationality", "Argentina".into()),
        Part::Text("dateOfBirth", "1994-05-17".into()),
        Part::Text("passportNumber", "AAB123456".into()),
        Part::Text("passportExpiry", days_from_now(800).to_string()),
        Part::Text("emergencyName", "Marta Benítez".into()),
        Part::Text("emergencyPhone", "+54 11 5555 0000".into()),
        Part::Text("emergencyRelation", "Mother".into()),
        Part::Text("arrivalTime", "18:00".into()),
        Part::Text("rulesAccepted", "true".into()),
        Part::Text("gdprConsent", "on".into()),
        Part::Text("signatureDataUrl", SIGNATURE.into()),
    ]
}

/// The complete form with one text field replaced, or dropped when `value` is `None`.
fn form_with(field: &str, value: Option<String>) -> Vec<Part<'static>> {
    complete_form()
        .into_iter()
        .filter_map(|part| match part {
            Part::Text(name, _) if name == field => value.clone().map(|v| Part::Text(name, v)),
            other => Some(other),
        })
        .collect()
}

fn submit(token: &str, parts: &[Part<'_>]) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(format!("/api/v1/checkin/{}", token))
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .header("user-agent", "CheckinTest/1.0")
        .header("x-forwarded-for", "203.0.113.9")
        .body(Body::from(multipart_body(parts)))
        .unwrap()
}

async fn confirmed_booking(app: &TestApp) -> booking::Model {
    app.insert_booking(
        &app.dorm,
        days_from_now(1),
        days_from_now(4),
        BookingStatus::Confirmed,
        PaymentStatus::Paid,
    )
    .await
}

#[tokio::test]
async fn checkin_page_shows_booking_and_rules() {
    let app = TestApp::new().await;
    let booking = confirmed_booking(&app).await;

    let response = app
        .get(&format!("/api/v1/checkin/{}", booking.checkin_token))
        .await;
    assert_eq!(response.status(), 200);
    let body = response_json(response).await;
    assert_eq!(body["already_completed"], false);
    assert_eq!(body["booking"]["id"], booking.id.to_string());
    assert_eq!(body["room"]["name"], app.dorm.name);
    assert!(body["rules"].is_array());
}

#[tokio::test]
async fn short_token_is_invalid_and_unknown_token_is_not_found() {
    let app = TestApp::new().await;

    assert_eq!(app.get("/api/v1/checkin/abc").await.status(), 400);
    assert_eq!(
        app.get("/api/v1/checkin/ZZZZZZZZZZZZZZZZZZZZZZZZZZZZZZZZ")
            .await
            .status(),
        404
    );
}

#[tokio::test]
async fn cancelled_booking_cannot_check_in() {
    let app = TestApp::new().await;
    let booking = app
        .insert_booking(
            &app.dorm,
            days_from_now(1),
            days_from_now(2),
            BookingStatus::Cancelled,
            PaymentStatus::Paid,
        )
        .await;

    let response = app
        .get(&format!("/api/v1/checkin/{}", booking.checkin_token))
        .await;
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn completing_checkin_records_guest_consents_and_uploads() {
    let app = TestApp::new().await;
    let booking = confirmed_booking(&app).await;

    let mut parts = complete_form();
    parts.push(Part::File(
        "passportImage",
        "passport.jpg",
        "image/jpeg",
        b"\xFF\xD8\xFF\xE0fake-jpeg",
    ));
    let response = app.send(submit(&booking.checkin_token, &parts)).await;
    assert_eq!(response.status(), 200);
    let body = response_json(response).await;
    assert_eq!(body["success"], true);

    let updated = booking::Entity::find_by_id(booking.id)
        .one(&*app.state.db)
        .await
        .unwrap()
        .unwrap();
    assert!(updated.checkin_completed_at.is_some());
    assert!(updated.rules_accepted && updated.gdpr_consent);
    assert_eq!(updated.arrival_time.as_deref(), Some("18:00"));
    let guest_id = updated.guest_id.expect("guest linked");

    let guest = guest::Entity::find_by_id(guest_id)
        .one(&*app.state.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(guest.nationality.as_deref(), Some("Argentina"));
    assert_eq!(guest.passport_number.as_deref(), Some("AAB123456"));

    let record = check_in::Entity::find()
        .one(&*app.state.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.ip_address.as_deref(), Some("203.0.113.9"));
    assert_eq!(record.device_info.as_deref(), Some("CheckinTest/1.0"));
    assert!(record.passport_image_url.unwrap().contains("passport_"));
    assert!(record.signature_url.unwrap().contains("signature_"));

    assert_eq!(
        consent_log::Entity::find()
            .count(&*app.state.db)
            .await
            .unwrap(),
        2
    );
    let uploads = app.storage.uploads.lock().unwrap().clone();
    assert_eq!(uploads.len(), 2);
    assert!(uploads.iter().any(|(_, ct)| ct == "image/png"));
}

#[tokio::test]
async fn second_submission_is_rejected() {
    let app = TestApp::new().await;
    let booking = confirmed_booking(&app).await;

    let first = app
        .send(submit(&booking.checkin_token, &complete_form()))
        .await;
    assert_eq!(first.status(), 200);

    let second = app
        .send(submit(&booking.checkin_token, &complete_form()))
        .await;
    assert_eq!(second.status(), 400);
    assert_eq!(
        response_json(second).await["message"],
        "Check-in already completed"
    );

    let page = response_json(
        app.get(&format!("/api/v1/checkin/{}", booking.checkin_token))
            .await,
    )
    .await;
    assert_eq!(page["already_completed"], true);
}

#[rstest]
#[case::missing_passport_number("passportNumber", None, "Missing required identity fields")]
#[case::blank_nationality("nationality", Some("   ".into()), "Missing required identity fields")]
#[case::missing_emergency_phone("emergencyPhone", None, "Missing emergency contact")]
#[case::missing_gdpr_consent("gdprConsent", None, "You must accept the rules and privacy policy")]
#[case::rules_not_accepted(
    "rulesAccepted",
    Some("false".into()),
    "You must accept the rules and privacy policy"
)]
#[case::missing_signature("signatureDataUrl", None, "Signature is required")]
#[case::jpeg_signature(
    "signatureDataUrl",
    Some("data:image/jpeg;base64,/9j/4AAQSkZJRg==".into()),
    "Signature is required"
)]
#[case::undecodable_signature(
    "signatureDataUrl",
    Some("data:image/png;base64,not*base64".into()),
    "Invalid signature image"
)]
#[case::malformed_birth_date(
    "dateOfBirth",
    Some("17/05/1994".into()),
    "Invalid dateOfBirth: expected YYYY-MM-DD"
)]
#[case::birth_date_in_future(
    "dateOfBirth",
    Some(days_from_now(3).to_string()),
    "Date of birth must be in the past"
)]
#[case::expired_passport(
    "passportExpiry",
    Some(days_from_now(-3).to_string()),
    "Passport has expired"
)]
#[tokio::test]
async fn invalid_submissions_are_rejected(
    #[case] field: &str,
    #[case] value: Option<String>,
    #[case] message: &str,
) {
    let app = TestApp::new().await;
    let booking = confirmed_booking(&app).await;

    let response = app
        .send(submit(&booking.checkin_token, &form_with(field, value)))
        .await;
    assert_eq!(response.status(), 400);
    assert_eq!(response_json(response).await["message"], message);

    assert_eq!(check_in::Entity::find().count(&*app.state.db).await.unwrap(), 0);
    assert!(app.storage.uploads.lock().unwrap().is_empty());
    let unchanged = booking::Entity::find_by_id(booking.id)
        .one(&*app.state.db)
        .await
        .unwrap()
        .unwrap();
    assert!(unchanged.checkin_completed_at.is_none());
}

#[tokio::test]
async fn non_image_passport_upload_is_rejected() {
    let app = TestApp::new().await;
    let booking = confirmed_booking(&app).await;

    let mut parts = complete_form();
    parts.push(Part::File(
        "passportImage",
        "passport.pdf",
        "application/pdf",
        b"%PDF-1.4",
    ));
    let response = app.send(submit(&booking.checkin_token, &parts)).await;
    assert_eq!(response.status(), 400);
    assert_eq!(
        response_json(response).await["message"],
        "Passport image must be an image file"
    );
}

#[tokio::test]
async fn oversized_passport_upload_is_rejected() {
    let mut options = TestOptions::default();
    options.config.max_upload_bytes = 1024;
    let app = TestApp::with_options(options).await;
    let booking = confirmed_booking(&app).await;

    let scan = vec![0xAB_u8; 1025];
    let mut parts: Vec<Part<'_>> = complete_form();
    parts.push(Part::File("passportImage", "passport.jpg", "image/jpeg", &scan[..]));
    let response = app.send(submit(&booking.checkin_token, &parts)).await;
    assert_eq!(response.status(), 400);
    assert_eq!(
        response_json(response).await["message"],
        "Passport image is too large"
    );
    assert!(app.storage.uploads.lock().unwrap().is_empty());
}

#[tokio::test]
async fn completed_checkins_show_up_for_admins() {
    let app = TestApp::new().await;
    let booking = confirmed_booking(&app).await;
    app.send(submit(&booking.checkin_token, &complete_form()))
        .await;

    let token = app.admin_token().await;
    let response = app
        .request(Method::GET, "/api/v1/admin/checkins", None, Some(&token))
        .await;
    assert_eq!(response.status(), 200);
    let body = response_json(response).await;
    let rows = body["data"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["booking_id"], booking.id.to_string());
}
