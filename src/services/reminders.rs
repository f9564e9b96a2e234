use crate::{
    config::AppConfig,
    entities::{
        booking::{self, BookingStatus},
        email_reminder::{self, ReminderStatus, ReminderType},
        room,
    },
    errors::ServiceError,
    services::{email_templates::BookingDetails, notifications::Notifier, pricing},
};
use chrono::{DateTime, Duration, Timelike, Utc};
use metrics::counter;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    Set,
};
use serde::Serialize;
use std::{collections::HashMap, sync::Arc};
use tracing::{debug, error, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

/// Local hours (inclusive) during which check-out reminders go out.
const CHECKOUT_WINDOW: std::ops::RangeInclusive<u32> = 7..=10;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ReminderRunResult {
    pub success: bool,
    pub timestamp: DateTime<Utc>,
    pub checkin_reminders: u32,
    pub checkout_reminders: u32,
    pub errors: Vec<String>,
}

#[derive(Clone)]
pub struct ReminderService {
    db: Arc<DatabaseConnection>,
    config: Arc<AppConfig>,
    notifier: Arc<Notifier>,
}

impl ReminderService {
    pub fn new(db: Arc<DatabaseConnection>, config: Arc<AppConfig>, notifier: Arc<Notifier>) -> Self {
        Self {
            db,
            config,
            notifier,
        }
    }

    async fn already_sent(&self, booking_id: Uuid, kind: ReminderType) -> Result<bool, ServiceError> {
        let count = email_reminder::Entity::find()
            .filter(email_reminder::Column::BookingId.eq(booking_id))
            .filter(email_reminder::Column::ReminderType.eq(kind))
            .filter(email_reminder::Column::Status.eq(ReminderStatus::Sent))
            .count(&*self.db)
            .await?;
        Ok(count > 0)
    }

    async fn record(
        &self,
        booking_id: Uuid,
        kind: ReminderType,
        error: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<(), ServiceError> {
        email_reminder::ActiveModel {
            id: Set(Uuid::new_v4()),
            booking_id: Set(booking_id),
            reminder_type: Set(kind),
            status: Set(if error.is_none() {
                ReminderStatus::Sent
            } else {
                ReminderStatus::Failed
            }),
            error: Set(error),
            sent_at: Set(now),
        }
        .insert(&*self.db)
        .await?;
        Ok(())
    }

    async fn room_names(&self) -> Result<HashMap<Uuid, String>, ServiceError> {
        Ok(room::Entity::find()
            .filter(room::Column::HostelId.eq(self.config.hostel_id))
            .all(&*self.db)
            .await?
            .into_iter()
            .map(|r| (r.id, r.name))
            .collect())
    }

    /// Runs one reminder pass. Every attempt leaves an `email_reminder` row.
    #[instrument(skip(self))]
    pub async fn run(&self, now: DateTime<Utc>) -> Result<ReminderRunResult, ServiceError> {
        if !self.notifier.is_configured() {
            return Err(ServiceError::NotConfigured(
                "Email service not configured".to_string(),
            ));
        }

        let local_now = pricing::hostel_now(now, self.config.hostel_timezone_offset_minutes);
        let today = local_now.date_naive();
        let tomorrow = today + Duration::days(1);
        let rooms = self.room_names().await?;

        let mut result = ReminderRunResult {
            success: true,
            timestamp: now,
            checkin_reminders: 0,
            checkout_reminders: 0,
            errors: Vec::new(),
        };

        let arriving = booking::Entity::find()
            .filter(booking::Column::HostelId.eq(self.config.hostel_id))
            .filter(booking::Column::CheckIn.eq(tomorrow))
            .filter(booking::Column::Status.eq(BookingStatus::Confirmed))
            .filter(booking::Column::CheckinCompletedAt.is_null())
            .all(&*self.db)
            .await?;

        for booking in arriving {
            if self.already_sent(booking.id, ReminderType::Checkin1Day).await? {
                debug!(booking_id = %booking.id, "Check-in reminder already sent");
                continue;
            }
            let room_name = rooms.get(&booking.room_id).map(String::as_str).unwrap_or_default();
            let details = BookingDetails::from_booking(&booking, room_name);
            let link = self.config.checkin_link(&booking.checkin_token);

            match self.notifier.checkin_reminder(&details, &link).await {
                Ok(_) => {
                    self.record(booking.id, ReminderType::Checkin1Day, None, now).await?;
                    result.checkin_reminders += 1;
                    counter!("hostel_reminders.sent", 1, "type" => "checkin_1day");
                }
                Err(e) => {
                    warn!(booking_id = %booking.id, "Check-in reminder failed: {}", e);
                    self.record(booking.id, ReminderType::Checkin1Day, Some(e.to_string()), now)
                        .await?;
                    result
                        .errors
                        .push(format!("checkin_1day {}: {}", booking.id, e));
                    counter!("hostel_reminders.failed", 1, "type" => "checkin_1day");
                }
            }
        }

        if CHECKOUT_WINDOW.contains(&local_now.hour()) {
            let departing = booking::Entity::find()
                .filter(booking::Column::HostelId.eq(self.config.hostel_id))
                .filter(booking::Column::CheckOut.eq(today))
                .filter(
                    booking::Column::Status
                        .is_in([BookingStatus::Confirmed, BookingStatus::Pending]),
                )
                .all(&*self.db)
                .await?;

            for booking in departing {
                if self
                    .already_sent(booking.id, ReminderType::CheckoutMorning)
                    .await?
                {
                    continue;
                }
                match self
                    .notifier
                    .checkout_reminder(&booking.guest_email, &booking.guest_name)
                    .await
                {
                    Ok(_) => {
                        self.record(booking.id, ReminderType::CheckoutMorning, None, now)
                            .await?;
                        result.checkout_reminders += 1;
                        counter!("hostel_reminders.sent", 1, "type" => "checkout_morning");
                    }
                    Err(e) => {
                        warn!(booking_id = %booking.id, "Check-out reminder failed: {}", e);
                        self.record(
                            booking.id,
                            ReminderType::CheckoutMorning,
                            Some(e.to_string()),
                            now,
                        )
                        .await?;
                        result
                            .errors
                            .push(format!("checkout_morning {}: {}", booking.id, e));
                        counter!("hostel_reminders.failed", 1, "type" => "checkout_morning");
                    }
                }
            }
        }

        info!(
            checkin = result.checkin_reminders,
            checkout = result.checkout_reminders,
            errors = result.errors.len(),
            "Reminder pass finished"
        );
        Ok(result)
    }
}

/// Runs the reminder pass on a fixed interval until the task is aborted.
pub async fn run_reminder_scheduler(service: ReminderService, interval: std::time::Duration) {
    info!(?interval, "Starting reminder scheduler");
    let mut timer = tokio::time::interval(interval);
    timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        timer.tick().await;
        if let Err(e) = service.run(Utc::now()).await {
            error!("Scheduled reminder pass failed: {}", e);
        }
    }
}
