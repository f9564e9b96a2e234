pub mod admin;
pub mod bookings;
pub mod checkin;
pub mod checkout;
pub mod cron;
pub mod payment_webhooks;
pub mod public;

use crate::{
    config::AppConfig,
    db::DbPool,
    events::EventSender,
    services::{
        analytics::{AnalyticsSink, NoopSink, PostHogSink},
        bookings::BookingService,
        checkin::CheckinService,
        content::ContentService,
        http_client,
        invitations::InvitationService,
        notifications::{EmailSender, Notifier, ResendEmailSender},
        payment_events::PaymentEventService,
        payments::{PaymentGateway, StripeGateway, UnconfiguredGateway},
        reminders::ReminderService,
        rooms::RoomService,
        storage::{BlobStorage, SupabaseStorage, UnconfiguredStorage},
    },
};
use std::sync::Arc;
use tracing::{info, warn};

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Outbound integrations. Each one falls back to a stand-in when its keys are absent.
#[derive(Clone)]
pub struct Providers {
    pub gateway: Arc<dyn PaymentGateway>,
    pub email: Option<Arc<dyn EmailSender>>,
    pub storage: Arc<dyn BlobStorage>,
    pub analytics: Arc<dyn AnalyticsSink>,
}

impl Providers {
    pub fn from_config(config: &AppConfig) -> Self {
        let client = http_client(config.http_client_timeout_secs);

        let gateway: Arc<dyn PaymentGateway> = match config.stripe_secret_key.clone() {
            Some(key) => Arc::new(StripeGateway::new(
                client.clone(),
                key,
                config.stripe_api_base.clone(),
            )),
            None => {
                warn!("APP__STRIPE_SECRET_KEY not set; online checkout is disabled");
                Arc::new(UnconfiguredGateway)
            }
        };

        let email: Option<Arc<dyn EmailSender>> = match config.resend_api_key.clone() {
            Some(key) => Some(Arc::new(ResendEmailSender::new(
                client.clone(),
                key,
                config.resend_api_base.clone(),
            ))),
            None => {
                warn!("APP__RESEND_API_KEY not set; emails will be skipped");
                None
            }
        };

        let storage: Arc<dyn BlobStorage> =
            match (config.storage_url.clone(), config.storage_service_key.clone()) {
                (Some(url), Some(key)) => Arc::new(SupabaseStorage::new(
                    client.clone(),
                    url,
                    key,
                    config.storage_documents_bucket.clone(),
                )),
                _ => {
                    warn!("Storage not configured; check-in documents will not be uploaded");
                    Arc::new(UnconfiguredStorage)
                }
            };

        let analytics: Arc<dyn AnalyticsSink> = match config.posthog_api_key.clone() {
            Some(key) => {
                info!("PostHog analytics enabled");
                Arc::new(PostHogSink::new(client, key, config.posthog_host.clone()))
            }
            None => Arc::new(NoopSink),
        };

        Self {
            gateway,
            email,
            storage,
            analytics,
        }
    }
}

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub bookings: Arc<BookingService>,
    pub payment_events: Arc<PaymentEventService>,
    pub checkin: Arc<CheckinService>,
    pub reminders: Arc<ReminderService>,
    pub rooms: Arc<RoomService>,
    pub content: Arc<ContentService>,
    pub invitations: Arc<InvitationService>,
}

impl AppServices {
    pub fn new(
        db_pool: Arc<DbPool>,
        config: Arc<AppConfig>,
        event_sender: Arc<EventSender>,
        providers: &Providers,
    ) -> Self {
        let notifier = Arc::new(Notifier::new(providers.email.clone(), &config));

        let bookings = Arc::new(BookingService::new(
            db_pool.clone(),
            config.clone(),
            notifier.clone(),
            providers.gateway.clone(),
            event_sender.clone(),
        ));
        let payment_events = Arc::new(PaymentEventService::new(
            db_pool.clone(),
            config.clone(),
            notifier.clone(),
            event_sender.clone(),
        ));
        let checkin = Arc::new(CheckinService::new(
            db_pool.clone(),
            config.clone(),
            providers.storage.clone(),
            event_sender,
        ));
        let reminders = Arc::new(ReminderService::new(
            db_pool.clone(),
            config.clone(),
            notifier.clone(),
        ));
        let rooms = Arc::new(RoomService::new(db_pool.clone(), config.clone()));
        let content = Arc::new(ContentService::new(db_pool.clone(), config.clone()));
        let invitations = Arc::new(InvitationService::new(db_pool, config, notifier));

        Self {
            bookings,
            payment_events,
            checkin,
            reminders,
            rooms,
            content,
            invitations,
        }
    }
}
