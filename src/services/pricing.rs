use crate::entities::room::{self, RoomType};
use crate::errors::ServiceError;
use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};
use rand::{distributions::Alphanumeric, Rng};

pub const CHECKIN_TOKEN_LEN: usize = 32;
pub const MIN_CHECKIN_TOKEN_LEN: usize = 10;

/// Server-computed price of a stay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StayQuote {
    pub nights: i64,
    pub total_cents: i64,
}

/// Random alphanumeric token of `len` characters.
pub fn generate_token(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

pub fn hostel_offset(offset_minutes: i32) -> FixedOffset {
    FixedOffset::east_opt(offset_minutes * 60).unwrap_or_else(|| Utc.fix())
}

/// Wall-clock time at the hostel.
pub fn hostel_now(now: DateTime<Utc>, offset_minutes: i32) -> DateTime<FixedOffset> {
    now.with_timezone(&hostel_offset(offset_minutes))
}

pub fn hostel_today(now: DateTime<Utc>, offset_minutes: i32) -> NaiveDate {
    hostel_now(now, offset_minutes).date_naive()
}

pub fn parse_date(field: &str, value: &str) -> Result<NaiveDate, ServiceError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| ServiceError::BadRequest(format!("Invalid date for {}: expected YYYY-MM-DD", field)))
}

/// Checks the stay dates against the hostel's calendar.
pub fn validate_stay(
    check_in: NaiveDate,
    check_out: NaiveDate,
    today: NaiveDate,
    max_stay_nights: i64,
) -> Result<i64, ServiceError> {
    if check_in < today {
        return Err(ServiceError::BadRequest(
            "Check-in date cannot be in the past".to_string(),
        ));
    }
    if check_out <= check_in {
        return Err(ServiceError::BadRequest(
            "Check-out date must be after check-in date".to_string(),
        ));
    }
    let nights = (check_out - check_in).num_days();
    if nights > max_stay_nights {
        return Err(ServiceError::BadRequest(format!(
            "Stays are limited to {} nights",
            max_stay_nights
        )));
    }
    Ok(nights)
}

/// Prices a stay: dorms are charged per bed, private rooms per room.
pub fn quote(room: &room::Model, nights: i64, guest_count: i32) -> Result<StayQuote, ServiceError> {
    if guest_count < 1 {
        return Err(ServiceError::BadRequest(
            "Guest count must be at least 1".to_string(),
        ));
    }
    if guest_count > room.max_guests {
        return Err(ServiceError::BadRequest(format!(
            "This room accommodates at most {} guests",
            room.max_guests
        )));
    }

    let units = match room.room_type {
        RoomType::Dorm => i64::from(guest_count),
        RoomType::Private => 1,
    };
    let total_cents = room
        .price_per_night_cents
        .checked_mul(units)
        .and_then(|per_night| per_night.checked_mul(nights))
        .ok_or_else(|| ServiceError::BadRequest("Stay is too long to price".to_string()))?;

    Ok(StayQuote {
        nights,
        total_cents,
    })
}

/// "{room} - {n} night(s)" as shown on the checkout page.
pub fn stay_label(room_name: &str, nights: i64) -> String {
    format!(
        "{} - {} night{}",
        room_name,
        nights,
        if nights == 1 { "" } else { "s" }
    )
}
