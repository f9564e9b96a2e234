#![allow(dead_code)]

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};

use async_trait::async_trait;
use axum::{
    body::{self, Body},
    http::{Method, Request},
    response::Response,
    Router,
};
use bytes::Bytes;
use chrono::{Duration, NaiveDate, Utc};
use hostel_api::{
    auth,
    config::AppConfig,
    db,
    entities::{
        booking::{self, BookingStatus, PaymentMethod, PaymentStatus},
        hostel,
        room::{self, RoomType},
    },
    events::{self, EventSender},
    handlers::Providers,
    health::HealthState,
    rate_limiter::{LoginThrottle, ThrottleConfig},
    services::{
        analytics::{AnalyticsEvent, AnalyticsSink},
        notifications::{EmailMessage, EmailSender},
        payments::{CheckoutSession, CheckoutSessionRequest, PaymentGateway},
        pricing,
        storage::BlobStorage,
        ExternalError,
    },
    AppState,
};
use sea_orm::{ActiveModelTrait, Set};
use serde_json::Value;
use tokio::sync::mpsc;
use tower::ServiceExt;
use uuid::Uuid;

pub const ADMIN_USERNAME: &str = "admin";
pub const ADMIN_PASSWORD: &str = "correct-horse-battery";
pub const WEBHOOK_SECRET: &str = "whsec_test_secret";

/// Records checkout requests and hands out sequential session ids.
#[derive(Default)]
pub struct FakeGateway {
    pub fail: bool,
    pub requests: Mutex<Vec<CheckoutSessionRequest>>,
    counter: AtomicUsize,
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn create_checkout_session(
        &self,
        request: CheckoutSessionRequest,
    ) -> Result<CheckoutSession, ExternalError> {
        self.requests.lock().unwrap().push(request);
        if self.fail {
            return Err(ExternalError::Status {
                service: "stripe",
                status: 500,
                body: "boom".into(),
            });
        }
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(CheckoutSession {
            id: format!("cs_test_{}", n),
            url: Some(format!("https://checkout.stripe.test/pay/cs_test_{}", n)),
        })
    }
}

#[derive(Default)]
pub struct RecordingEmail {
    pub sent: Mutex<Vec<EmailMessage>>,
}

#[async_trait]
impl EmailSender for RecordingEmail {
    async fn send(&self, message: EmailMessage) -> Result<(), ExternalError> {
        self.sent.lock().unwrap().push(message);
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryStorage {
    pub uploads: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl BlobStorage for MemoryStorage {
    async fn upload(&self, path: &str, _data: Bytes, content_type: &str) -> Result<String, ExternalError> {
        self.uploads
            .lock()
            .unwrap()
            .push((path.to_string(), content_type.to_string()));
        Ok(format!("https://storage.test/documents/{}", path))
    }
}

#[derive(Default)]
pub struct RecordingSink {
    pub events: Mutex<Vec<AnalyticsEvent>>,
}

#[async_trait]
impl AnalyticsSink for RecordingSink {
    async fn capture(&self, event: AnalyticsEvent) -> Result<(), ExternalError> {
        self.events.lock().unwrap().push(event);
        Ok(())
    }
}

/// Knobs for building a [`TestApp`].
pub struct TestOptions {
    pub config: AppConfig,
    pub email_enabled: bool,
    pub gateway_fails: bool,
}

impl Default for TestOptions {
    fn default() -> Self {
        let mut config = AppConfig::new(
            "sqlite::memory:".to_string(),
            "test_secret_key_for_testing_purposes_only_64_characters_long_xx".to_string(),
            "test".to_string(),
        );
        config.admin_username = ADMIN_USERNAME.to_string();
        config.admin_password_hash =
            Some(auth::hash_password(ADMIN_PASSWORD).expect("hash admin password"));
        config.stripe_secret_key = Some("sk_test_123".to_string());
        config.stripe_webhook_secret = Some(WEBHOOK_SECRET.to_string());
        config.public_base_url = "https://mandioca.test".to_string();
        Self {
            config,
            email_enabled: true,
            gateway_fails: false,
        }
    }
}

/// Full application router over a migrated in-memory database with one
/// dorm and one private room.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    pub dorm: room::Model,
    pub private_room: room::Model,
    pub gateway: Arc<FakeGateway>,
    pub email: Arc<RecordingEmail>,
    pub storage: Arc<MemoryStorage>,
    pub analytics: Arc<RecordingSink>,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_options(TestOptions::default()).await
    }

    pub async fn with_options(options: TestOptions) -> Self {
        let cfg = Arc::new(options.config);
        let pool = db::establish_connection(&cfg.database_url)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let now = Utc::now();
        hostel::ActiveModel {
            id: Set(cfg.hostel_id),
            name: Set(cfg.hostel_name.clone()),
            slug: Set("mandioca-hostel".into()),
            city: Set("Asunción".into()),
            country: Set("Paraguay".into()),
            address: Set(None),
            description: Set(None),
            email: Set(Some(cfg.hostel_email.clone())),
            phone: Set(None),
            timezone_offset_minutes: Set(cfg.hostel_timezone_offset_minutes),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&pool)
        .await
        .expect("seed hostel");

        let dorm = insert_room(&pool, &cfg, "4-Bed Mixed Dorm", RoomType::Dorm, 1200, 4).await;
        let private_room =
            insert_room(&pool, &cfg, "Private Double Room", RoomType::Private, 3500, 2).await;

        let gateway = Arc::new(FakeGateway {
            fail: options.gateway_fails,
            ..Default::default()
        });
        let email = Arc::new(RecordingEmail::default());
        let storage = Arc::new(MemoryStorage::default());
        let analytics = Arc::new(RecordingSink::default());
        let providers = Providers {
            gateway: gateway.clone(),
            email: options
                .email_enabled
                .then(|| email.clone() as Arc<dyn EmailSender>),
            storage: storage.clone(),
            analytics: analytics.clone(),
        };

        let db_arc = Arc::new(pool);
        let (event_tx, event_rx) = mpsc::channel(256);
        let event_sender = Arc::new(EventSender::new(event_tx));
        let event_task = tokio::spawn(events::process_events(event_rx, providers.analytics.clone()));

        let throttle = LoginThrottle::in_memory(ThrottleConfig::from(&*cfg));
        let state = AppState::new(db_arc.clone(), cfg.clone(), event_sender, &providers, throttle);
        let health = Arc::new(HealthState::new(db_arc, cfg));
        let router = hostel_api::app_router(state.clone(), health);

        Self {
            router,
            state,
            dorm,
            private_room,
            gateway,
            email,
            storage,
            analytics,
            _event_task: event_task,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// JSON request with an optional bearer token.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(tok) = token {
            builder = builder.header("authorization", format!("Bearer {}", tok));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(serde_json::to_vec(&json).expect("serialize request body"))
            }
            None => Body::empty(),
        };
        self.send(builder.body(body).expect("build request")).await
    }

    pub async fn get(&self, uri: &str) -> Response {
        self.request(Method::GET, uri, None, None).await
    }

    /// Logs in with the configured admin pair and returns the session token.
    pub async fn admin_token(&self) -> String {
        let response = self
            .request(
                Method::POST,
                "/api/v1/admin/login",
                Some(serde_json::json!({
                    "username": ADMIN_USERNAME,
                    "password": ADMIN_PASSWORD,
                })),
                None,
            )
            .await;
        assert_eq!(response.status(), 200, "admin login should succeed");
        let body = response_json(response).await;
        body["data"]["token"].as_str().expect("token").to_string()
    }

    pub async fn insert_booking(
        &self,
        room: &room::Model,
        check_in: NaiveDate,
        check_out: NaiveDate,
        status: BookingStatus,
        payment_status: PaymentStatus,
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
            payment_status: Set(payment_status),
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
        .insert(&*self.state.db)
        .await
        .expect("insert booking")
    }

    pub fn sent_emails(&self) -> Vec<EmailMessage> {
        self.email.sent.lock().unwrap().clone()
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self._event_task.abort();
    }
}

async fn insert_room(
    db: &sea_orm::DatabaseConnection,
    cfg: &AppConfig,
    name: &str,
    room_type: RoomType,
    price_cents: i64,
    max_guests: i32,
) -> room::Model {
    let now = Utc::now();
    room::ActiveModel {
        id: Set(Uuid::new_v4()),
        hostel_id: Set(cfg.hostel_id),
        name: Set(name.to_string()),
        description: Set(None),
        room_type: Set(room_type),
        bed_count: Set(max_guests),
        max_guests: Set(max_guests),
        price_per_night_cents: Set(price_cents),
        currency: Set(cfg.currency.clone()),
        is_active: Set(true),
        display_order: Set(0),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .expect("seed room")
}

/// A date `days` from today, far enough ahead to be valid in any hostel timezone.
pub fn days_from_now(days: i64) -> NaiveDate {
    Utc::now().date_naive() + Duration::days(days)
}

pub async fn response_json(response: Response) -> Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    serde_json::from_slice(&bytes).expect("json response")
}
