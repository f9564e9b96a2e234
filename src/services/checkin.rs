use crate::{
    config::AppConfig,
    entities::{
        booking::{self, BookingStatus},
        check_in,
        consent_log::{self, ConsentType},
        guest, hostel_rule, room,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    middleware_helpers::ClientInfo,
    services::{bookings::BookingReceipt, pricing, storage::BlobStorage},
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::Bytes;
use chrono::{DateTime, NaiveDate, Utc};
use metrics::counter;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait, TryIntoModel,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

const SIGNATURE_PREFIX: &str = "data:image/png;base64,";

pub const RULES_CONSENT_TEXT: &str = "I have read and agree to the hostel rules and policies. \
I understand that violation may result in removal without refund.";
pub const GDPR_CONSENT_TEXT: &str = "I consent to Mandioca Hostel storing and processing my personal \
data for accommodation management purposes, in accordance with GDPR.";

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Bytes,
}

/// Self check-in form as received from the guest.
#[derive(Debug, Clone, Default)]
pub struct CheckinSubmission {
    pub nationality: Option<String>,
    pub date_of_birth: Option<String>,
    pub passport_number: Option<String>,
    pub passport_expiry: Option<String>,
    pub emergency_name: Option<String>,
    pub emergency_phone: Option<String>,
    pub emergency_relation: Option<String>,
    pub dietary_restrictions: Option<String>,
    pub special_requests: Option<String>,
    pub arrival_time: Option<String>,
    pub signature_data_url: Option<String>,
    pub rules_accepted: bool,
    pub gdpr_consent: bool,
    pub passport_image: Option<UploadedFile>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CheckinView {
    pub booking: BookingReceipt,
    pub room: Option<room::Model>,
    pub rules: Vec<hostel_rule::Model>,
    pub already_completed: bool,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CheckinCompleted {
    pub success: bool,
    pub message: String,
    pub check_in_id: Uuid,
}

/// Admin document review row.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CheckinRecord {
    pub check_in: check_in::Model,
    pub guest: Option<guest::Model>,
    pub booking_id: Uuid,
    pub guest_name: String,
    pub check_in_date: NaiveDate,
    pub check_out_date: NaiveDate,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn invalid_date(field: &str, value: &str) -> Result<NaiveDate, ServiceError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| ServiceError::BadRequest(format!("Invalid {}: expected YYYY-MM-DD", field)))
}

fn file_extension(file: &UploadedFile) -> String {
    let from_name = file
        .file_name
        .as_deref()
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric()));

    from_name.unwrap_or_else(|| {
        match file.content_type.as_deref() {
            Some("image/png") => "png",
            Some("image/webp") => "webp",
            Some("image/heic") => "heic",
            _ => "jpg",
        }
        .to_string()
    })
}

/// Validated form values, borrowed from the submission.
struct ValidatedCheckin<'a> {
    nationality: &'a str,
    date_of_birth: NaiveDate,
    passport_number: &'a str,
    passport_expiry: NaiveDate,
    emergency_name: &'a str,
    emergency_phone: &'a str,
    signature_png: Vec<u8>,
}

#[derive(Clone)]
pub struct CheckinService {
    db: Arc<DatabaseConnection>,
    config: Arc<AppConfig>,
    storage: Arc<dyn BlobStorage>,
    event_sender: Arc<EventSender>,
}

impl CheckinService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        config: Arc<AppConfig>,
        storage: Arc<dyn BlobStorage>,
        event_sender: Arc<EventSender>,
    ) -> Self {
        Self {
            db,
            config,
            storage,
            event_sender,
        }
    }

    async fn booking_for_token(&self, token: &str) -> Result<booking::Model, ServiceError> {
        if token.len() < pricing::MIN_CHECKIN_TOKEN_LEN {
            return Err(ServiceError::BadRequest("Invalid token".to_string()));
        }

        let booking = booking::Entity::find()
            .filter(booking::Column::CheckinToken.eq(token))
            .filter(booking::Column::HostelId.eq(self.config.hostel_id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Booking not found".to_string()))?;

        if booking.status == BookingStatus::Cancelled {
            return Err(ServiceError::BadRequest(
                "This booking has been cancelled".to_string(),
            ));
        }
        Ok(booking)
    }

    #[instrument(skip(self, token))]
    pub async fn view(&self, token: &str) -> Result<CheckinView, ServiceError> {
        let booking = self.booking_for_token(token).await?;
        let room = room::Entity::find_by_id(booking.room_id).one(&*self.db).await?;
        let rules = hostel_rule::Entity::find()
            .filter(hostel_rule::Column::HostelId.eq(self.config.hostel_id))
            .filter(hostel_rule::Column::IsActive.eq(true))
            .order_by_asc(hostel_rule::Column::DisplayOrder)
            .all(&*self.db)
            .await?;

        let room_name = room.as_ref().map(|r| r.name.clone()).unwrap_or_default();
        Ok(CheckinView {
            already_completed: booking.is_checkin_completed(),
            booking: BookingReceipt::new(&booking, &room_name),
            room,
            rules,
        })
    }

    fn validate<'a>(
        &self,
        form: &'a CheckinSubmission,
        today: NaiveDate,
    ) -> Result<ValidatedCheckin<'a>, ServiceError> {
        let (Some(nationality), Some(dob), Some(passport_number), Some(expiry)) = (
            present(&form.nationality),
            present(&form.date_of_birth),
            present(&form.passport_number),
            present(&form.passport_expiry),
        ) else {
            return Err(ServiceError::BadRequest(
                "Missing required identity fields".to_string(),
            ));
        };

        let (Some(emergency_name), Some(emergency_phone)) =
            (present(&form.emergency_name), present(&form.emergency_phone))
        else {
            return Err(ServiceError::BadRequest("Missing emergency contact".to_string()));
        };

        if !form.rules_accepted || !form.gdpr_consent {
            return Err(ServiceError::BadRequest(
                "You must accept the rules and privacy policy".to_string(),
            ));
        }

        let signature = present(&form.signature_data_url)
            .and_then(|s| s.strip_prefix(SIGNATURE_PREFIX))
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ServiceError::BadRequest("Signature is required".to_string()))?;
        let signature_png = STANDARD
            .decode(signature)
            .map_err(|_| ServiceError::BadRequest("Invalid signature image".to_string()))?;

        let date_of_birth = invalid_date("dateOfBirth", dob)?;
        if date_of_birth >= today {
            return Err(ServiceError::BadRequest(
                "Date of birth must be in the past".to_string(),
            ));
        }
        let passport_expiry = invalid_date("passportExpiry", expiry)?;
        if passport_expiry < today {
            return Err(ServiceError::BadRequest("Passport has expired".to_string()));
        }

        if let Some(file) = form.passport_image.as_ref().filter(|f| !f.data.is_empty()) {
            if file.data.len() > self.config.max_upload_bytes {
                return Err(ServiceError::BadRequest(
                    "Passport image is too large".to_string(),
                ));
            }
            let is_image = file
                .content_type
                .as_deref()
                .map(|ct| ct.starts_with("image/"))
                .unwrap_or(false);
            if !is_image {
                return Err(ServiceError::BadRequest(
                    "Passport image must be an image file".to_string(),
                ));
            }
        }

        Ok(ValidatedCheckin {
            nationality,
            date_of_birth,
            passport_number,
            passport_expiry,
            emergency_name,
            emergency_phone,
            signature_png,
        })
    }

    async fn upload_passport(&self, booking_id: Uuid, file: &UploadedFile, ts: i64) -> Option<String> {
        let path = format!("passport_{}_{}.{}", booking_id, ts, file_extension(file));
        let content_type = file.content_type.as_deref().unwrap_or("image/jpeg");
        match self.storage.upload(&path, file.data.clone(), content_type).await {
            Ok(url) => Some(url),
            Err(e) => {
                warn!(%booking_id, "Passport upload failed, continuing without it: {}", e);
                None
            }
        }
    }

    async fn upload_signature(
        &self,
        booking_id: Uuid,
        png: Vec<u8>,
        data_url: &str,
        ts: i64,
    ) -> String {
        let path = format!("signature_{}_{}.png", booking_id, ts);
        match self.storage.upload(&path, Bytes::from(png), "image/png").await {
            Ok(url) => url,
            Err(e) => {
                warn!(%booking_id, "Signature upload failed, storing data URL: {}", e);
                data_url.to_string()
            }
        }
    }

    /// Completes self check-in for the booking behind `token`.
    #[instrument(skip(self, token, form, client))]
    pub async fn complete(
        &self,
        token: &str,
        form: CheckinSubmission,
        client: ClientInfo,
        now: DateTime<Utc>,
    ) -> Result<CheckinCompleted, ServiceError> {
        let booking = self.booking_for_token(token).await?;
        if booking.is_checkin_completed() {
            return Err(ServiceError::BadRequest(
                "Check-in already completed".to_string(),
            ));
        }

        let today = pricing::hostel_today(now, self.config.hostel_timezone_offset_minutes);
        let valid = self.validate(&form, today)?;

        let ts = now.timestamp_millis();
        let passport_image_url = match form.passport_image.as_ref().filter(|f| !f.data.is_empty()) {
            Some(file) => self.upload_passport(booking.id, file, ts).await,
            None => None,
        };
        let signature_url = self
            .upload_signature(
                booking.id,
                valid.signature_png,
                form.signature_data_url.as_deref().unwrap_or_default(),
                ts,
            )
            .await;

        let ip = client.ip_or_unknown().to_string();
        let user_agent = client.user_agent.clone().unwrap_or_else(|| "Unknown".to_string());
        let special_requests = present(&form.special_requests).map(str::to_string);

        let booking_id = booking.id;
        let guest_email = booking.guest_email.clone();
        let mut claim = booking::ActiveModel {
            checkin_completed_at: Set(Some(now)),
            arrival_time: Set(present(&form.arrival_time).map(str::to_string)),
            rules_accepted: Set(true),
            rules_accepted_at: Set(Some(now)),
            gdpr_consent: Set(true),
            gdpr_consent_at: Set(Some(now)),
            updated_at: Set(now),
            ..Default::default()
        };
        if special_requests.is_some() {
            claim.special_requests = Set(special_requests.clone());
        }

        let txn = self.db.begin().await?;

        // A submission racing this one may have completed since the read above.
        let claimed = booking::Entity::update_many()
            .set(claim)
            .filter(booking::Column::Id.eq(booking_id))
            .filter(booking::Column::CheckinCompletedAt.is_null())
            .exec(&txn)
            .await?;
        if claimed.rows_affected == 0 {
            txn.rollback().await?;
            warn!(%booking_id, "Check-in was completed by a concurrent submission");
            return Err(ServiceError::BadRequest(
                "Check-in already completed".to_string(),
            ));
        }

        let existing_guest = guest::Entity::find()
            .filter(guest::Column::Email.eq(booking.guest_email.as_str()))
            .one(&txn)
            .await?;
        let mut guest_model = match existing_guest {
            Some(existing) => existing.into(),
            None => guest::ActiveModel {
                id: Set(Uuid::new_v4()),
                email: Set(booking.guest_email.clone()),
                created_at: Set(now),
                ..Default::default()
            },
        };
        guest_model.full_name = Set(booking.guest_name.clone());
        guest_model.phone = Set(booking.guest_phone.clone());
        guest_model.nationality = Set(Some(valid.nationality.to_string()));
        guest_model.date_of_birth = Set(Some(valid.date_of_birth));
        guest_model.passport_number = Set(Some(valid.passport_number.to_string()));
        guest_model.passport_expiry = Set(Some(valid.passport_expiry));
        guest_model.emergency_contact_name = Set(Some(valid.emergency_name.to_string()));
        guest_model.emergency_contact_phone = Set(Some(valid.emergency_phone.to_string()));
        guest_model.emergency_contact_relation =
            Set(present(&form.emergency_relation).map(str::to_string));
        guest_model.dietary_restrictions =
            Set(present(&form.dietary_restrictions).map(str::to_string));
        guest_model.updated_at = Set(now);
        let guest_id = guest_model.save(&txn).await?.try_into_model()?.id;

        let check_in = check_in::ActiveModel {
            id: Set(Uuid::new_v4()),
            booking_id: Set(booking.id),
            guest_id: Set(guest_id),
            checked_in_by: Set("self".to_string()),
            device_info: Set(Some(user_agent.clone())),
            ip_address: Set(Some(ip.clone())),
            passport_image_url: Set(passport_image_url),
            signature_url: Set(Some(signature_url)),
            rules_accepted: Set(true),
            rules_accepted_at: Set(Some(now)),
            gdpr_consent: Set(true),
            gdpr_consent_at: Set(Some(now)),
            arrival_notes: Set(special_requests.clone()),
            created_at: Set(now),
        }
        .insert(&txn)
        .await?;

        booking::Entity::update_many()
            .col_expr(booking::Column::GuestId, Expr::value(guest_id))
            .filter(booking::Column::Id.eq(booking_id))
            .exec(&txn)
            .await?;

        for (consent_type, text) in [
            (ConsentType::Rules, RULES_CONSENT_TEXT),
            (ConsentType::Gdpr, GDPR_CONSENT_TEXT),
        ] {
            consent_log::ActiveModel {
                id: Set(Uuid::new_v4()),
                booking_id: Set(booking_id),
                guest_id: Set(guest_id),
                consent_type: Set(consent_type),
                consent_text: Set(text.to_string()),
                accepted: Set(true),
                ip_address: Set(Some(ip.clone())),
                user_agent: Set(Some(user_agent.clone())),
                created_at: Set(now),
            }
            .insert(&txn)
            .await?;
        }

        txn.commit().await?;

        counter!("hostel_checkins.completed", 1);
        self.event_sender.emit(Event::CheckinCompleted {
            booking_id,
            check_in_id: check_in.id,
            guest_email,
            nationality: valid.nationality.to_string(),
        });

        info!(%booking_id, check_in_id = %check_in.id, "Self check-in completed");
        Ok(CheckinCompleted {
            success: true,
            message: "Check-in completed successfully".to_string(),
            check_in_id: check_in.id,
        })
    }

    /// Completed check-ins with guest identity, newest first.
    #[instrument(skip(self))]
    pub async fn list_completed(&self) -> Result<Vec<CheckinRecord>, ServiceError> {
        let rows = check_in::Entity::find()
            .find_also_related(booking::Entity)
            .filter(booking::Column::HostelId.eq(self.config.hostel_id))
            .order_by_desc(check_in::Column::CreatedAt)
            .all(&*self.db)
            .await?;

        let mut records = Vec::with_capacity(rows.len());
        for (check_in, booking) in rows {
            let Some(booking) = booking else { continue };
            let guest = guest::Entity::find_by_id(check_in.guest_id).one(&*self.db).await?;
            records.push(CheckinRecord {
                booking_id: booking.id,
                guest_name: booking.guest_name,
                check_in_date: booking.check_in,
                check_out_date: booking.check_out,
                check_in,
                guest,
            });
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        entities::room::RoomType,
        services::ExternalError,
        test_support::{insert_booking, insert_room, seeded_db, test_config},
    };
    use assert_matches::assert_matches;
    use async_trait::async_trait;
    use chrono::Duration;
    use tokio::sync::mpsc;

    /// Storage whose uploads land while another submission for the same
    /// booking commits.
    struct RacingStorage {
        db: Arc<DatabaseConnection>,
        booking_id: Uuid,
    }

    #[async_trait]
    impl BlobStorage for RacingStorage {
        async fn upload(
            &self,
            path: &str,
            _data: Bytes,
            _content_type: &str,
        ) -> Result<String, ExternalError> {
            booking::Entity::update_many()
                .col_expr(booking::Column::CheckinCompletedAt, Expr::value(Utc::now()))
                .filter(booking::Column::Id.eq(self.booking_id))
                .exec(&*self.db)
                .await
                .unwrap();
            Ok(format!("https://storage.test/{}", path))
        }
    }

    fn submission() -> CheckinSubmission {
        CheckinSubmission {
            nationality: Some("Argentina".into()),
            date_of_birth: Some("1994-03-21".into()),
            passport_number: Some("AAB123456".into()),
            passport_expiry: Some("2035-01-01".into()),
            emergency_name: Some("Marta Silva".into()),
            emergency_phone: Some("+54 11 5555 0000".into()),
            signature_data_url: Some(format!("{}iVBORw0KGgo=", SIGNATURE_PREFIX)),
            rules_accepted: true,
            gdpr_consent: true,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn submission_losing_a_race_is_rejected_cleanly() {
        let config = test_config();
        let db = seeded_db(&config).await;
        let room = insert_room(&db, config.hostel_id, RoomType::Private, 5000, 2).await;
        let today = Utc::now().date_naive();
        let booking = insert_booking(
            &db,
            &room,
            today + Duration::days(3),
            today + Duration::days(5),
            BookingStatus::Confirmed,
        )
        .await;

        let (tx, _rx) = mpsc::channel(8);
        let storage = Arc::new(RacingStorage {
            db: db.clone(),
            booking_id: booking.id,
        });
        let service = CheckinService::new(
            db.clone(),
            Arc::new(config),
            storage,
            Arc::new(EventSender::new(tx)),
        );

        let err = service
            .complete(&booking.checkin_token, submission(), ClientInfo::default(), Utc::now())
            .await
            .unwrap_err();
        assert_matches!(err, ServiceError::BadRequest(msg) if msg == "Check-in already completed");

        assert!(check_in::Entity::find().all(&*db).await.unwrap().is_empty());
        assert!(consent_log::Entity::find().all(&*db).await.unwrap().is_empty());
        assert!(guest::Entity::find().all(&*db).await.unwrap().is_empty());
    }

    #[test]
    fn extension_prefers_file_name() {
        let file = UploadedFile {
            file_name: Some("Passport.JPEG".into()),
            content_type: Some("image/jpeg".into()),
            data: Bytes::from_static(b"x"),
        };
        assert_eq!(file_extension(&file), "jpeg");

        let nameless = UploadedFile {
            file_name: Some("scan".into()),
            content_type: Some("image/png".into()),
            data: Bytes::from_static(b"x"),
        };
        assert_eq!(file_extension(&nameless), "png");
    }
}
