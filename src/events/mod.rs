use crate::services::analytics::{AnalyticsEvent, AnalyticsSink};
use chrono::{NaiveDate, Utc};
use metrics::counter;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Funnel events emitted by the booking, payment, check-in and admin flows.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Event {
    BookingRequested {
        booking_id: Uuid,
        guest_email: String,
        room_id: Uuid,
        room_name: String,
        nights: i64,
        guest_count: i32,
        total_price: String,
        check_in: NaiveDate,
        check_out: NaiveDate,
    },
    CheckoutCreated {
        booking_id: Uuid,
        guest_email: String,
        room_id: Uuid,
        room_name: String,
        nights: i64,
        guest_count: i32,
        total_price: String,
        check_in: NaiveDate,
        check_out: NaiveDate,
        stripe_session_id: String,
    },
    PaymentCompleted {
        booking_id: Uuid,
        guest_email: String,
        room_id: Uuid,
        amount_total: String,
        currency: String,
        stripe_session_id: String,
        stripe_payment_intent_id: Option<String>,
    },
    PaymentFailed {
        booking_id: Option<Uuid>,
        distinct_id: String,
        failure_reason: String,
        stripe_session_id: Option<String>,
        stripe_payment_intent_id: Option<String>,
        error_message: Option<String>,
    },
    CheckinCompleted {
        booking_id: Uuid,
        check_in_id: Uuid,
        guest_email: String,
        nationality: String,
    },
    AdminLoginSuccess {
        username: String,
        ip_address: String,
    },
    AdminLoginFailed {
        username: String,
        ip_address: String,
        failure_reason: String,
    },
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::BookingRequested { .. } => "booking_requested",
            Event::CheckoutCreated { .. } => "checkout_created",
            Event::PaymentCompleted { .. } => "payment_completed",
            Event::PaymentFailed { .. } => "payment_failed",
            Event::CheckinCompleted { .. } => "checkin_completed",
            Event::AdminLoginSuccess { .. } => "admin_login_success",
            Event::AdminLoginFailed { .. } => "admin_login_failed",
        }
    }

    /// Identity the analytics collector groups the event under.
    pub fn distinct_id(&self) -> String {
        match self {
            Event::BookingRequested { guest_email, .. }
            | Event::CheckoutCreated { guest_email, .. }
            | Event::PaymentCompleted { guest_email, .. }
            | Event::CheckinCompleted { guest_email, .. } => guest_email.clone(),
            Event::PaymentFailed { distinct_id, .. } => distinct_id.clone(),
            Event::AdminLoginSuccess { username, .. } | Event::AdminLoginFailed { username, .. } => {
                format!("admin_{}", username)
            }
        }
    }

    pub fn properties(&self) -> Value {
        match self {
            Event::BookingRequested {
                booking_id,
                room_id,
                room_name,
                nights,
                guest_count,
                total_price,
                check_in,
                check_out,
                ..
            } => json!({
                "booking_id": booking_id,
                "room_id": room_id,
                "room_name": room_name,
                "nights": nights,
                "guest_count": guest_count,
                "total_price": total_price,
                "check_in": check_in,
                "check_out": check_out,
                "payment_method": "on_arrival",
            }),
            Event::CheckoutCreated {
                booking_id,
                room_id,
                room_name,
                nights,
                guest_count,
                total_price,
                check_in,
                check_out,
                stripe_session_id,
                ..
            } => json!({
                "booking_id": booking_id,
                "room_id": room_id,
                "room_name": room_name,
                "nights": nights,
                "guest_count": guest_count,
                "total_price": total_price,
                "check_in": check_in,
                "check_out": check_out,
                "stripe_session_id": stripe_session_id,
            }),
            Event::PaymentCompleted {
                booking_id,
                room_id,
                amount_total,
                currency,
                stripe_session_id,
                stripe_payment_intent_id,
                ..
            } => json!({
                "booking_id": booking_id,
                "room_id": room_id,
                "amount_total": amount_total,
                "currency": currency,
                "stripe_session_id": stripe_session_id,
                "stripe_payment_intent_id": stripe_payment_intent_id,
            }),
            Event::PaymentFailed {
                booking_id,
                failure_reason,
                stripe_session_id,
                stripe_payment_intent_id,
                error_message,
                ..
            } => json!({
                "booking_id": booking_id,
                "failure_reason": failure_reason,
                "stripe_session_id": stripe_session_id,
                "stripe_payment_intent_id": stripe_payment_intent_id,
                "error_message": error_message,
            }),
            Event::CheckinCompleted {
                booking_id,
                check_in_id,
                nationality,
                ..
            } => json!({
                "booking_id": booking_id,
                "check_in_id": check_in_id,
                "nationality": nationality,
            }),
            Event::AdminLoginSuccess {
                username,
                ip_address,
            } => json!({
                "username": username,
                "ip_address": ip_address,
                "role": "admin",
            }),
            Event::AdminLoginFailed {
                username,
                ip_address,
                failure_reason,
            } => json!({
                "username": username,
                "ip_address": ip_address,
                "failure_reason": failure_reason,
            }),
        }
    }

    pub fn to_analytics(&self) -> AnalyticsEvent {
        AnalyticsEvent {
            event: self.name().to_string(),
            distinct_id: self.distinct_id(),
            properties: self.properties(),
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event, waiting for channel capacity
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Queues an event without waiting. A full or closed channel drops the event.
    pub fn emit(&self, event: Event) {
        let name = event.name();
        if let Err(e) = self.sender.try_send(event) {
            counter!("hostel_events.dropped", 1);
            warn!(event = name, "Dropping analytics event: {}", e);
        }
    }
}

/// Forwards queued events to the analytics sink until every sender is dropped.
pub async fn process_events(mut rx: mpsc::Receiver<Event>, sink: Arc<dyn AnalyticsSink>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        debug!(event = event.name(), "Forwarding analytics event");
        if let Err(e) = sink.capture(event.to_analytics()).await {
            counter!("hostel_events.capture_failures", 1);
            error!(event = event.name(), "Failed to capture analytics event: {}", e);
        }
    }

    info!("Event processing loop finished");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::analytics::RecordingSink;

    #[test]
    fn admin_events_use_prefixed_identity() {
        let event = Event::AdminLoginFailed {
            username: "admin".into(),
            ip_address: "203.0.113.9".into(),
            failure_reason: "invalid_credentials".into(),
        };
        assert_eq!(event.name(), "admin_login_failed");
        assert_eq!(event.distinct_id(), "admin_admin");
        assert_eq!(event.properties()["failure_reason"], "invalid_credentials");
    }

    #[tokio::test]
    async fn processor_forwards_events_to_sink() {
        let sink = Arc::new(RecordingSink::default());
        let (tx, rx) = mpsc::channel(8);
        let sender = EventSender::new(tx);

        sender.emit(Event::PaymentFailed {
            booking_id: None,
            distinct_id: "anonymous".into(),
            failure_reason: "payment_intent_failed".into(),
            stripe_session_id: None,
            stripe_payment_intent_id: Some("pi_123".into()),
            error_message: Some("Your card was declined.".into()),
        });
        drop(sender);

        process_events(rx, sink.clone()).await;

        let captured = sink.events();
        assert_eq!(captured.len(), 1);
        assert_eq!(captured[0].event, "payment_failed");
        assert_eq!(captured[0].properties["stripe_payment_intent_id"], "pi_123");
    }
}
