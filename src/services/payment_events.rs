use crate::{
    config::AppConfig,
    entities::{
        booking::{self, BookingStatus, PaymentStatus},
        room,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::{email_templates::BookingDetails, notifications::Notifier},
};
use chrono::Utc;
use dashmap::{mapref::entry::Entry, DashMap};
use metrics::counter;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

const PROCESSED_EVENT_TTL: Duration = Duration::from_secs(24 * 3600);

#[derive(Debug, Clone, Deserialize)]
pub struct StripeEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: StripeEventData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeEventData {
    pub object: Value,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct CheckoutSessionObject {
    id: String,
    #[serde(default)]
    metadata: HashMap<String, String>,
    payment_intent: Option<String>,
    customer_email: Option<String>,
    amount_total: Option<i64>,
    currency: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct PaymentError {
    message: Option<String>,
    code: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct PaymentIntentObject {
    id: String,
    receipt_email: Option<String>,
    #[serde(default)]
    metadata: HashMap<String, String>,
    last_payment_error: Option<PaymentError>,
}

fn parse_object<T: serde::de::DeserializeOwned>(object: Value) -> Result<T, ServiceError> {
    serde_json::from_value(object)
        .map_err(|e| ServiceError::BadRequest(format!("Invalid event payload: {}", e)))
}

/// Applies verified payment-processor events to bookings.
#[derive(Clone)]
pub struct PaymentEventService {
    db: Arc<DatabaseConnection>,
    config: Arc<AppConfig>,
    notifier: Arc<Notifier>,
    event_sender: Arc<EventSender>,
    processed: Arc<DashMap<String, Instant>>,
}

impl PaymentEventService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        config: Arc<AppConfig>,
        notifier: Arc<Notifier>,
        event_sender: Arc<EventSender>,
    ) -> Self {
        Self {
            db,
            config,
            notifier,
            event_sender,
            processed: Arc::new(DashMap::new()),
        }
    }

    /// Marks `event_id` as taken. False when the same event was already
    /// taken within the dedupe window.
    fn claim(&self, event_id: &str) -> bool {
        self.processed
            .retain(|_, seen| seen.elapsed() < PROCESSED_EVENT_TTL);
        match self.processed.entry(event_id.to_string()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(Instant::now());
                true
            }
        }
    }

    #[instrument(skip(self, event), fields(event_id = %event.id, event_type = %event.event_type))]
    pub async fn handle(&self, event: StripeEvent) -> Result<(), ServiceError> {
        counter!("hostel_webhooks.received", 1);

        if !self.claim(&event.id) {
            info!("Webhook event already processed");
            return Ok(());
        }

        let event_id = event.id.clone();
        if let Err(e) = self.dispatch(event).await {
            // Let the processor's retry through.
            self.processed.remove(&event_id);
            return Err(e);
        }
        Ok(())
    }

    async fn dispatch(&self, event: StripeEvent) -> Result<(), ServiceError> {
        match event.event_type.as_str() {
            "checkout.session.completed" => {
                let session: CheckoutSessionObject = parse_object(event.data.object)?;
                self.session_completed(session).await
            }
            "checkout.session.expired" => {
                let session: CheckoutSessionObject = parse_object(event.data.object)?;
                self.session_expired(session).await
            }
            "payment_intent.payment_failed" => {
                let intent: PaymentIntentObject = parse_object(event.data.object)?;
                self.payment_intent_failed(intent);
                Ok(())
            }
            other => {
                debug!("Unhandled webhook event type: {}", other);
                Ok(())
            }
        }
    }

    async fn booking_for_session(
        &self,
        session: &CheckoutSessionObject,
    ) -> Result<Option<booking::Model>, ServiceError> {
        let by_metadata = session
            .metadata
            .get("booking_id")
            .and_then(|raw| Uuid::parse_str(raw).ok());

        if let Some(id) = by_metadata {
            let found = booking::Entity::find_by_id(id)
                .filter(booking::Column::HostelId.eq(self.config.hostel_id))
                .one(&*self.db)
                .await?;
            if found.is_some() {
                return Ok(found);
            }
        }

        Ok(booking::Entity::find()
            .filter(booking::Column::StripeSessionId.eq(session.id.as_str()))
            .filter(booking::Column::HostelId.eq(self.config.hostel_id))
            .one(&*self.db)
            .await?)
    }

    async fn session_completed(&self, session: CheckoutSessionObject) -> Result<(), ServiceError> {
        let Some(booking) = self.booking_for_session(&session).await? else {
            warn!(session_id = %session.id, "Completed checkout session has no matching booking");
            return Ok(());
        };

        if booking.payment_status == PaymentStatus::Paid {
            info!(booking_id = %booking.id, "Booking already paid, nothing to do");
            return Ok(());
        }
        if !booking.payment_status.can_transition_to(PaymentStatus::Paid) {
            warn!(
                booking_id = %booking.id,
                payment_status = ?booking.payment_status,
                "Ignoring payment completion for booking in terminal payment state"
            );
            return Ok(());
        }

        let now = Utc::now();
        let mut changes = booking::ActiveModel {
            payment_status: Set(PaymentStatus::Paid),
            stripe_payment_intent_id: Set(session.payment_intent.clone()),
            paid_at: Set(Some(now)),
            updated_at: Set(now),
            ..Default::default()
        };
        if booking.status.can_transition_to(BookingStatus::Confirmed) {
            changes.status = Set(BookingStatus::Confirmed);
        } else {
            warn!(booking_id = %booking.id, status = ?booking.status, "Paid booking keeps its status");
        }
        if booking.stripe_session_id.is_none() {
            changes.stripe_session_id = Set(Some(session.id.clone()));
        }

        // Only one delivery may move the booking to paid and send the emails.
        let result = booking::Entity::update_many()
            .set(changes)
            .filter(booking::Column::Id.eq(booking.id))
            .filter(booking::Column::PaymentStatus.is_in([
                PaymentStatus::Pending,
                PaymentStatus::Processing,
                PaymentStatus::Failed,
            ]))
            .exec(&*self.db)
            .await?;
        if result.rows_affected == 0 {
            info!(booking_id = %booking.id, "Booking was paid by another delivery, nothing to do");
            return Ok(());
        }

        let booking = booking::Entity::find_by_id(booking.id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Booking not found".to_string()))?;

        let room_name = room::Entity::find_by_id(booking.room_id)
            .one(&*self.db)
            .await?
            .map(|r| r.name)
            .unwrap_or_default();
        let details = BookingDetails::from_booking(&booking, &room_name);
        let emails_sent = self
            .notifier
            .payment_confirmed(&details, &self.config.checkin_link(&booking.checkin_token))
            .await;

        counter!("hostel_payments.completed", 1);
        let amount_cents = session.amount_total.unwrap_or(booking.total_price_cents);
        self.event_sender.emit(Event::PaymentCompleted {
            booking_id: booking.id,
            guest_email: session
                .customer_email
                .clone()
                .unwrap_or_else(|| booking.guest_email.clone()),
            room_id: booking.room_id,
            amount_total: rust_decimal::Decimal::new(amount_cents, 2).to_string(),
            currency: session.currency.clone().unwrap_or_else(|| booking.currency.clone()),
            stripe_session_id: session.id.clone(),
            stripe_payment_intent_id: session.payment_intent.clone(),
        });

        info!(booking_id = %booking.id, emails_sent, "Payment succeeded for booking");
        Ok(())
    }

    async fn session_expired(&self, session: CheckoutSessionObject) -> Result<(), ServiceError> {
        let booking = self.booking_for_session(&session).await?;

        if let Some(booking) = &booking {
            if booking.payment_status != PaymentStatus::Failed
                && booking.payment_status.can_transition_to(PaymentStatus::Failed)
            {
                let mut active: booking::ActiveModel = booking.clone().into();
                active.payment_status = Set(PaymentStatus::Failed);
                active.updated_at = Set(Utc::now());
                active.update(&*self.db).await?;
                info!(booking_id = %booking.id, "Payment expired for booking");
            }
        } else {
            warn!(session_id = %session.id, "Expired checkout session has no matching booking");
        }

        counter!("hostel_payments.failed", 1);
        self.event_sender.emit(Event::PaymentFailed {
            booking_id: booking.as_ref().map(|b| b.id),
            distinct_id: session
                .customer_email
                .clone()
                .or_else(|| session.metadata.get("guest_name").cloned())
                .unwrap_or_else(|| "anonymous".to_string()),
            failure_reason: "checkout_expired".to_string(),
            stripe_session_id: Some(session.id),
            stripe_payment_intent_id: None,
            error_message: None,
        });
        Ok(())
    }

    fn payment_intent_failed(&self, intent: PaymentIntentObject) {
        let error = intent.last_payment_error.unwrap_or_default();
        warn!(
            payment_intent = %intent.id,
            code = error.code.as_deref().unwrap_or("unknown"),
            "Payment failed"
        );

        counter!("hostel_payments.failed", 1);
        self.event_sender.emit(Event::PaymentFailed {
            booking_id: intent
                .metadata
                .get("booking_id")
                .and_then(|raw| Uuid::parse_str(raw).ok()),
            distinct_id: intent
                .receipt_email
                .unwrap_or_else(|| "anonymous".to_string()),
            failure_reason: "payment_intent_failed".to_string(),
            stripe_session_id: None,
            stripe_payment_intent_id: Some(intent.id),
            error_message: error.message,
        });
    }
}
