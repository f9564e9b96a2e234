//! Fixtures shared by the unit tests.

use crate::{
    config::AppConfig,
    db,
    entities::{
        booking::{self, BookingStatus, PaymentMethod, PaymentStatus},
        hostel,
        room::{self, RoomType},
    },
    services::pricing,
};
use chrono::{NaiveDate, Utc};
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use std::sync::Arc;
use uuid::Uuid;

pub fn test_config() -> AppConfig {
    AppConfig::new("sqlite::memory:".into(), "k".repeat(64), "development".into())
}

/// Migrated in-memory database with the configured hostel in place.
pub async fn seeded_db(config: &AppConfig) -> Arc<DatabaseConnection> {
    let conn = db::establish_connection("sqlite::memory:").await.unwrap();
    db::run_migrations(&conn).await.unwrap();
    let now = Utc::now();
    hostel::ActiveModel {
        id: Set(config.hostel_id),
        name: Set(config.hostel_name.clone()),
        slug: Set("test-hostel".into()),
        city: Set("Asuncion".into()),
        country: Set("Paraguay".into()),
        address: Set(None),
        description: Set(None),
        email: Set(Some(config.hostel_email.clone())),
        phone: Set(None),
        timezone_offset_minutes: Set(config.hostel_timezone_offset_minutes),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&conn)
    .await
    .unwrap();
    Arc::new(conn)
}

pub async fn insert_room(
    db: &DatabaseConnection,
    hostel_id: Uuid,
    room_type: RoomType,
    price_cents: i64,
    max_guests: i32,
) -> room::Model {
    let now = Utc::now();
    room::ActiveModel {
        id: Set(Uuid::new_v4()),
        hostel_id: Set(hostel_id),
        name: Set(match room_type {
            RoomType::Dorm => "Mixed Dorm".into(),
            RoomType::Private => "Private Double".into(),
        }),
        description: Set(None),
        room_type: Set(room_type),
        bed_count: Set(max_guests),
        max_guests: Set(max_guests),
        price_per_night_cents: Set(price_cents),
        currency: Set("USD".into()),
        is_active: Set(true),
        display_order: Set(0),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .unwrap()
}

pub async fn insert_booking(
    db: &DatabaseConnection,
    room: &room::Model,
    check_in: NaiveDate,
    check_out: NaiveDate,
    status: BookingStatus,
) -> booking::Model {
    let now = Utc::now();
    let nights = (check_out - check_in).num_days();
    booking::ActiveModel {
        id: Set(Uuid::new_v4()),
        hostel_id: Set(room.hostel_id),
        room_id: Set(room.id),
        guest_id: Set(None),
        guest_name: Set("Ana Silva".into()),
        guest_email: Set("ana@example.com".into()),
        guest_phone: Set(Some("+595 981 000000".into())),
        check_in: Set(check_in),
        check_out: Set(check_out),
        guest_count: Set(1),
        nights: Set(nights as i32),
        total_price_cents: Set(room.price_per_night_cents * nights),
        currency: Set(room.currency.clone()),
        status: Set(status),
        payment_status: Set(PaymentStatus::Paid),
        payment_method: Set(PaymentMethod::Online),
        stripe_session_id: Set(None),
        stripe_payment_intent_id: Set(None),
        paid_at: Set(None),
        checkin_token: Set(pricing::generate_token(pricing::CHECKIN_TOKEN_LEN)),
        checkin_completed_at: Set(None),
        arrival_time: Set(None),
        rules_accepted: Set(false),
        rules_accepted_at: Set(None),
        gdpr_consent: Set(false),
        gdpr_consent_at: Set(None),
        special_requests: Set(None),
        notes: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .unwrap()
}
