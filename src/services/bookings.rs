use crate::{
    config::AppConfig,
    entities::{
        booking::{self, BookingStatus, PaymentMethod, PaymentStatus},
        check_in, consent_log, email_reminder,
        room,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::{
        email_templates::BookingDetails,
        notifications::Notifier,
        payments::{CheckoutSessionRequest, PaymentGateway},
        pricing::{self, StayQuote},
    },
};
use chrono::{DateTime, NaiveDate, Utc};
use metrics::counter;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

/// Stay request as submitted by the public booking form.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct StayRequest {
    pub room_id: Option<String>,
    pub guest_name: Option<String>,
    pub guest_email: Option<String>,
    pub guest_phone: Option<String>,
    #[schema(example = "2025-03-10")]
    pub check_in: Option<String>,
    #[schema(example = "2025-03-13")]
    pub check_out: Option<String>,
    pub guest_count: Option<i32>,
    pub special_requests: Option<String>,
}

/// A stay request that passed validation and has been priced.
#[derive(Debug, Clone)]
struct ValidatedStay {
    room: room::Model,
    guest_name: String,
    guest_email: String,
    guest_phone: Option<String>,
    check_in: NaiveDate,
    check_out: NaiveDate,
    guest_count: i32,
    quote: StayQuote,
    special_requests: Option<String>,
}

/// Booking as shown back to the guest. The check-in token is left out.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BookingReceipt {
    pub id: Uuid,
    pub room_id: Uuid,
    pub room_name: String,
    pub guest_name: String,
    pub guest_email: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub nights: i32,
    pub guest_count: i32,
    #[schema(value_type = String, example = "72.00")]
    pub total_price: Decimal,
    pub currency: String,
    pub status: BookingStatus,
    pub payment_status: PaymentStatus,
    pub payment_method: PaymentMethod,
}

impl BookingReceipt {
    pub(crate) fn new(booking: &booking::Model, room_name: &str) -> Self {
        Self {
            id: booking.id,
            room_id: booking.room_id,
            room_name: room_name.to_string(),
            guest_name: booking.guest_name.clone(),
            guest_email: booking.guest_email.clone(),
            check_in: booking.check_in,
            check_out: booking.check_out,
            nights: booking.nights,
            guest_count: booking.guest_count,
            total_price: booking.total_price(),
            currency: booking.currency.clone(),
            status: booking.status,
            payment_status: booking.payment_status,
            payment_method: booking.payment_method,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BookingCreated {
    pub message: String,
    pub booking: BookingReceipt,
    pub email_sent: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CheckoutCreated {
    pub session_id: String,
    pub url: Option<String>,
}

/// What the success page shows after returning from checkout.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CheckoutSessionSummary {
    pub booking: BookingReceipt,
    /// Present once payment is confirmed
    pub checkin_url: Option<String>,
}

/// Admin list filters. `status=all` means no status filter.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct BookingFilter {
    pub status: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub room_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AdminBookingView {
    #[serde(flatten)]
    pub booking: booking::Model,
    #[schema(value_type = String, example = "72.00")]
    pub total_price: Decimal,
    pub room_name: Option<String>,
}

impl AdminBookingView {
    fn new(booking: booking::Model, room: Option<room::Model>) -> Self {
        Self {
            total_price: booking.total_price(),
            room_name: room.map(|r| r.name),
            booking,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct BookingUpdate {
    pub status: Option<BookingStatus>,
    pub payment_status: Option<PaymentStatus>,
    pub room_id: Option<Uuid>,
    pub guest_name: Option<String>,
    pub guest_email: Option<String>,
    pub guest_phone: Option<String>,
    pub check_in: Option<NaiveDate>,
    pub check_out: Option<NaiveDate>,
    pub guest_count: Option<i32>,
    pub arrival_time: Option<String>,
    pub special_requests: Option<String>,
    pub notes: Option<String>,
}

fn require<'a>(field: &str, value: &'a Option<String>) -> Result<&'a str, ServiceError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ServiceError::BadRequest(format!("Missing required field: {}", field)))
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn check_email(email: &str) -> Result<(), ServiceError> {
    if validator::validate_email(email) {
        Ok(())
    } else {
        Err(ServiceError::BadRequest("Invalid email format".to_string()))
    }
}

/// Booking intake, checkout and the admin booking desk.
#[derive(Clone)]
pub struct BookingService {
    db: Arc<DatabaseConnection>,
    config: Arc<AppConfig>,
    notifier: Arc<Notifier>,
    gateway: Arc<dyn PaymentGateway>,
    event_sender: Arc<EventSender>,
}

impl BookingService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        config: Arc<AppConfig>,
        notifier: Arc<Notifier>,
        gateway: Arc<dyn PaymentGateway>,
        event_sender: Arc<EventSender>,
    ) -> Self {
        Self {
            db,
            config,
            notifier,
            gateway,
            event_sender,
        }
    }

    async fn active_room(&self, raw_id: &str) -> Result<room::Model, ServiceError> {
        let not_found = || ServiceError::NotFound("Room not found".to_string());
        let room_id = Uuid::parse_str(raw_id).map_err(|_| not_found())?;

        room::Entity::find_by_id(room_id)
            .filter(room::Column::HostelId.eq(self.config.hostel_id))
            .filter(room::Column::IsActive.eq(true))
            .one(&*self.db)
            .await?
            .ok_or_else(not_found)
    }

    async fn validate_stay(
        &self,
        request: &StayRequest,
        phone_required: bool,
        now: DateTime<Utc>,
    ) -> Result<ValidatedStay, ServiceError> {
        let room_id = require("room_id", &request.room_id)?;
        let guest_name = require("guest_name", &request.guest_name)?;
        let guest_email = require("guest_email", &request.guest_email)?;
        if phone_required {
            require("guest_phone", &request.guest_phone)?;
        }
        let check_in = require("check_in", &request.check_in)?;
        let check_out = require("check_out", &request.check_out)?;

        check_email(guest_email)?;

        let check_in = pricing::parse_date("check_in", check_in)?;
        let check_out = pricing::parse_date("check_out", check_out)?;
        let today = pricing::hostel_today(now, self.config.hostel_timezone_offset_minutes);
        let nights = pricing::validate_stay(check_in, check_out, today, self.config.max_stay_nights)?;

        let room = self.active_room(room_id).await?;
        let guest_count = request.guest_count.unwrap_or(1);
        let quote = pricing::quote(&room, nights, guest_count)?;

        Ok(ValidatedStay {
            room,
            guest_name: guest_name.to_string(),
            guest_email: guest_email.to_lowercase(),
            guest_phone: non_empty(&request.guest_phone),
            check_in,
            check_out,
            guest_count,
            quote,
            special_requests: non_empty(&request.special_requests),
        })
    }

    async fn insert_booking(
        &self,
        stay: &ValidatedStay,
        payment_status: PaymentStatus,
        payment_method: PaymentMethod,
        now: DateTime<Utc>,
    ) -> Result<booking::Model, ServiceError> {
        let model = booking::ActiveModel {
            id: Set(Uuid::new_v4()),
            hostel_id: Set(self.config.hostel_id),
            room_id: Set(stay.room.id),
            guest_id: Set(None),
            guest_name: Set(stay.guest_name.clone()),
            guest_email: Set(stay.guest_email.clone()),
            guest_phone: Set(stay.guest_phone.clone()),
            check_in: Set(stay.check_in),
            check_out: Set(stay.check_out),
            guest_count: Set(stay.guest_count),
            nights: Set(stay.quote.nights as i32),
            total_price_cents: Set(stay.quote.total_cents),
            currency: Set(self.config.currency.clone()),
            status: Set(BookingStatus::Pending),
            payment_status: Set(payment_status),
            payment_method: Set(payment_method),
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
            special_requests: Set(stay.special_requests.clone()),
            notes: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };
        Ok(model.insert(&*self.db).await?)
    }

    /// Records a pay-on-arrival booking request and notifies both parties.
    #[instrument(skip(self, request))]
    pub async fn request_booking(
        &self,
        request: StayRequest,
        now: DateTime<Utc>,
    ) -> Result<BookingCreated, ServiceError> {
        let stay = self.validate_stay(&request, true, now).await?;
        let booking = self
            .insert_booking(&stay, PaymentStatus::Pending, PaymentMethod::OnArrival, now)
            .await?;

        let email_sent = self
            .notifier
            .booking_requested(&BookingDetails::from_booking(&booking, &stay.room.name))
            .await;

        counter!("hostel_bookings.created", 1);
        self.event_sender.emit(Event::BookingRequested {
            booking_id: booking.id,
            guest_email: booking.guest_email.clone(),
            room_id: stay.room.id,
            room_name: stay.room.name.clone(),
            nights: stay.quote.nights,
            guest_count: booking.guest_count,
            total_price: booking.total_price().to_string(),
            check_in: booking.check_in,
            check_out: booking.check_out,
        });

        info!(booking_id = %booking.id, email_sent, "Booking request received");
        Ok(BookingCreated {
            message: "Booking request received successfully".to_string(),
            booking: BookingReceipt::new(&booking, &stay.room.name),
            email_sent,
        })
    }

    /// Persists the booking, then opens a hosted checkout session for it.
    #[instrument(skip(self, request))]
    pub async fn start_checkout(
        &self,
        request: StayRequest,
        now: DateTime<Utc>,
    ) -> Result<CheckoutCreated, ServiceError> {
        let stay = self.validate_stay(&request, false, now).await?;
        let booking = self
            .insert_booking(&stay, PaymentStatus::Processing, PaymentMethod::Online, now)
            .await?;

        let mut metadata = BTreeMap::new();
        metadata.insert("booking_id".to_string(), booking.id.to_string());
        metadata.insert("hostel_id".to_string(), booking.hostel_id.to_string());
        metadata.insert("room_id".to_string(), booking.room_id.to_string());
        metadata.insert("guest_name".to_string(), booking.guest_name.clone());
        metadata.insert("check_in".to_string(), booking.check_in.to_string());
        metadata.insert("check_out".to_string(), booking.check_out.to_string());
        metadata.insert("guest_count".to_string(), booking.guest_count.to_string());

        let base = self.config.base_url();
        let session_request = CheckoutSessionRequest {
            currency: booking.currency.clone(),
            unit_amount_cents: booking.total_price_cents,
            product_name: pricing::stay_label(&stay.room.name, stay.quote.nights),
            product_description: format!(
                "Check-in: {} | Check-out: {} | Guests: {}",
                booking.check_in, booking.check_out, booking.guest_count
            ),
            customer_email: booking.guest_email.clone(),
            success_url: format!("{}/booking/success?session_id={{CHECKOUT_SESSION_ID}}", base),
            cancel_url: format!("{}/booking/cancel", base),
            metadata,
        };

        let session = match self.gateway.create_checkout_session(session_request).await {
            Ok(session) => session,
            Err(e) => {
                error!(booking_id = %booking.id, "Checkout session creation failed: {}", e);
                let mut failed: booking::ActiveModel = booking.into();
                failed.payment_status = Set(PaymentStatus::Failed);
                failed.updated_at = Set(Utc::now());
                if let Err(db_err) = failed.update(&*self.db).await {
                    warn!("Could not mark booking payment as failed: {}", db_err);
                }
                return Err(ServiceError::PaymentProviderError(
                    "Failed to create checkout session".to_string(),
                ));
            }
        };

        let booking_id = booking.id;
        let mut update: booking::ActiveModel = booking.clone().into();
        update.stripe_session_id = Set(Some(session.id.clone()));
        update.updated_at = Set(Utc::now());
        update.update(&*self.db).await?;

        counter!("hostel_checkouts.created", 1);
        self.event_sender.emit(Event::CheckoutCreated {
            booking_id,
            guest_email: booking.guest_email.clone(),
            room_id: stay.room.id,
            room_name: stay.room.name.clone(),
            nights: stay.quote.nights,
            guest_count: booking.guest_count,
            total_price: booking.total_price().to_string(),
            check_in: booking.check_in,
            check_out: booking.check_out,
            stripe_session_id: session.id.clone(),
        });

        info!(%booking_id, session_id = %session.id, "Checkout session created");
        Ok(CheckoutCreated {
            session_id: session.id,
            url: session.url,
        })
    }

    #[instrument(skip(self))]
    pub async fn checkout_summary(&self, session_id: &str) -> Result<CheckoutSessionSummary, ServiceError> {
        let (booking, room) = booking::Entity::find()
            .filter(booking::Column::StripeSessionId.eq(session_id))
            .filter(booking::Column::HostelId.eq(self.config.hostel_id))
            .find_also_related(room::Entity)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Booking not found".to_string()))?;

        let room_name = room.map(|r| r.name).unwrap_or_default();
        let checkin_url = (booking.payment_status == PaymentStatus::Paid)
            .then(|| self.config.checkin_link(&booking.checkin_token));

        Ok(CheckoutSessionSummary {
            booking: BookingReceipt::new(&booking, &room_name),
            checkin_url,
        })
    }

    #[instrument(skip(self))]
    pub async fn list(&self, filter: BookingFilter) -> Result<Vec<AdminBookingView>, ServiceError> {
        let mut query = booking::Entity::find()
            .filter(booking::Column::HostelId.eq(self.config.hostel_id));

        if let Some(status) = filter.status.as_deref().filter(|s| *s != "all") {
            let status: BookingStatus = serde_json::from_value(serde_json::Value::String(status.to_string()))
                .map_err(|_| ServiceError::BadRequest(format!("Unknown booking status: {}", status)))?;
            query = query.filter(booking::Column::Status.eq(status));
        }
        if let Some(start) = filter.start_date {
            query = query.filter(booking::Column::CheckIn.gte(start));
        }
        if let Some(end) = filter.end_date {
            query = query.filter(booking::Column::CheckOut.lte(end));
        }
        if let Some(room_id) = filter.room_id {
            query = query.filter(booking::Column::RoomId.eq(room_id));
        }

        let rows = query
            .order_by_asc(booking::Column::CheckIn)
            .find_also_related(room::Entity)
            .all(&*self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(booking, room)| AdminBookingView::new(booking, room))
            .collect())
    }

    async fn find(&self, id: Uuid) -> Result<booking::Model, ServiceError> {
        booking::Entity::find_by_id(id)
            .filter(booking::Column::HostelId.eq(self.config.hostel_id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Booking not found".to_string()))
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> Result<AdminBookingView, ServiceError> {
        let booking = self.find(id).await?;
        let room = room::Entity::find_by_id(booking.room_id).one(&*self.db).await?;
        Ok(AdminBookingView::new(booking, room))
    }

    /// Applies an admin edit. Status changes follow the booking and payment state machines.
    #[instrument(skip(self, update))]
    pub async fn update(&self, id: Uuid, update: BookingUpdate) -> Result<AdminBookingView, ServiceError> {
        let current = self.find(id).await?;
        let mut active: booking::ActiveModel = current.clone().into();

        if let Some(status) = update.status {
            if !current.status.can_transition_to(status) {
                return Err(ServiceError::BadRequest(format!(
                    "Cannot change booking status from {:?} to {:?}",
                    current.status, status
                )));
            }
            active.status = Set(status);
        }

        if let Some(payment_status) = update.payment_status {
            if !current.payment_status.can_transition_to(payment_status) {
                return Err(ServiceError::BadRequest(format!(
                    "Cannot change payment status from {:?} to {:?}",
                    current.payment_status, payment_status
                )));
            }
            if payment_status == PaymentStatus::Paid && current.paid_at.is_none() {
                active.paid_at = Set(Some(Utc::now()));
            }
            active.payment_status = Set(payment_status);
        }

        if let Some(name) = non_empty(&update.guest_name) {
            active.guest_name = Set(name);
        }
        if let Some(email) = non_empty(&update.guest_email) {
            check_email(&email)?;
            active.guest_email = Set(email.to_lowercase());
        }
        if update.guest_phone.is_some() {
            active.guest_phone = Set(non_empty(&update.guest_phone));
        }
        if update.arrival_time.is_some() {
            active.arrival_time = Set(non_empty(&update.arrival_time));
        }
        if update.special_requests.is_some() {
            active.special_requests = Set(non_empty(&update.special_requests));
        }
        if update.notes.is_some() {
            active.notes = Set(non_empty(&update.notes));
        }

        let reprice = update.room_id.is_some()
            || update.check_in.is_some()
            || update.check_out.is_some()
            || update.guest_count.is_some();

        if reprice {
            let room_id = update.room_id.unwrap_or(current.room_id);
            let room = room::Entity::find_by_id(room_id)
                .filter(room::Column::HostelId.eq(self.config.hostel_id))
                .one(&*self.db)
                .await?
                .ok_or_else(|| ServiceError::NotFound("Room not found".to_string()))?;

            let check_in = update.check_in.unwrap_or(current.check_in);
            let check_out = update.check_out.unwrap_or(current.check_out);
            if check_out <= check_in {
                return Err(ServiceError::BadRequest(
                    "Check-out date must be after check-in date".to_string(),
                ));
            }
            let nights = (check_out - check_in).num_days();
            if nights > self.config.max_stay_nights {
                return Err(ServiceError::BadRequest(format!(
                    "Stays are limited to {} nights",
                    self.config.max_stay_nights
                )));
            }
            let guest_count = update.guest_count.unwrap_or(current.guest_count);
            let quote = pricing::quote(&room, nights, guest_count)?;

            active.room_id = Set(room.id);
            active.check_in = Set(check_in);
            active.check_out = Set(check_out);
            active.guest_count = Set(guest_count);
            active.nights = Set(quote.nights as i32);
            active.total_price_cents = Set(quote.total_cents);
        }

        active.updated_at = Set(Utc::now());
        let updated = active.update(&*self.db).await?;
        info!(booking_id = %id, "Booking updated by admin");
        self.get(updated.id).await
    }

    /// Removes a booking with its reminders, consent trail and check-in.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        let booking = self.find(id).await?;
        let txn = self.db.begin().await?;

        email_reminder::Entity::delete_many()
            .filter(email_reminder::Column::BookingId.eq(booking.id))
            .exec(&txn)
            .await?;
        consent_log::Entity::delete_many()
            .filter(consent_log::Column::BookingId.eq(booking.id))
            .exec(&txn)
            .await?;
        check_in::Entity::delete_many()
            .filter(check_in::Column::BookingId.eq(booking.id))
            .exec(&txn)
            .await?;
        booking::Entity::delete_by_id(booking.id).exec(&txn).await?;

        txn.commit().await?;
        info!(booking_id = %id, "Booking deleted");
        Ok(())
    }
}
