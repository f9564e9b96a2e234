//! Hostel API Library
//!
//! Booking, payment, self check-in and content backend for Mandioca Hostel.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod health;
pub mod middleware_helpers;
pub mod openapi;
pub mod rate_limiter;
pub mod services;
pub mod tracing;
pub mod webhooks;

#[cfg(test)]
mod test_support;

use axum::{extract::State, middleware, response::Json, routing::get, Router};
use chrono::Utc;
use sea_orm::DatabaseConnection;
use serde::Serialize;
use serde_json::{json, Value};
use std::{sync::Arc, time::Duration};
use tower_http::{compression::CompressionLayer, timeout::TimeoutLayer};
use utoipa::ToSchema;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: Arc<config::AppConfig>,
    pub event_sender: Arc<events::EventSender>,
    pub services: handlers::AppServices,
    pub admin_auth: Arc<auth::AdminAuth>,
    pub login_throttle: rate_limiter::LoginThrottle,
}

impl AppState {
    pub fn new(
        db: Arc<DatabaseConnection>,
        config: Arc<config::AppConfig>,
        event_sender: Arc<events::EventSender>,
        providers: &handlers::Providers,
        login_throttle: rate_limiter::LoginThrottle,
    ) -> Self {
        let services =
            handlers::AppServices::new(db.clone(), config.clone(), event_sender.clone(), providers);
        let admin_auth = Arc::new(auth::AdminAuth::new(&config));
        Self {
            db,
            config,
            event_sender,
            services,
            admin_auth,
            login_throttle,
        }
    }
}

/// Envelope for admin and public-content JSON bodies.
#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMeta>,
}

#[derive(Serialize, ToSchema)]
pub struct ResponseMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    pub timestamp: String,
}

impl ResponseMeta {
    fn now() -> Self {
        Self {
            request_id: crate::tracing::current_request_id().map(|rid| rid.to_string()),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            meta: Some(ResponseMeta::now()),
        }
    }
}

impl ApiResponse<()> {
    /// Body for deletes and other operations with nothing to return.
    pub fn done(message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: None,
            message: Some(message.into()),
            meta: Some(ResponseMeta::now()),
        }
    }
}


/// Standard API result type for JSON responses
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, errors::ServiceError>;

pub fn api_v1_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/status", get(api_status))
        // Booking funnel
        .nest("/bookings", handlers::bookings::booking_routes())
        .nest("/checkout", handlers::checkout::checkout_routes())
        .nest("/webhooks", handlers::payment_webhooks::webhook_routes())
        .nest(
            "/checkin",
            handlers::checkin::checkin_routes(state.config.max_upload_bytes),
        )
        .nest("/cron", handlers::cron::cron_routes())
        // Website content
        .merge(handlers::public::public_routes())
        // Admin console (session-gated inside)
        .nest(
            "/admin",
            handlers::admin::admin_routes(state.admin_auth.clone()),
        )
}

/// Full application router: API, health checks, docs and the shared layers.
/// CORS is left to the caller because it depends on deployment settings.
pub fn app_router(state: AppState, health: Arc<health::HealthState>) -> Router {
    let request_timeout = Duration::from_secs(state.config.request_timeout_secs);
    let security_policy = middleware_helpers::SecurityPolicy::from(&*state.config);

    Router::new()
        .route("/", get(|| async { "hostel-api up" }))
        .nest("/api/v1", api_v1_routes(&state))
        .with_state(state)
        .nest("/health", health::health_routes(health))
        .merge(openapi::swagger_ui())
        .layer(TimeoutLayer::new(request_timeout))
        .layer(CompressionLayer::new())
        .layer(middleware::from_fn_with_state(
            security_policy,
            middleware_helpers::security_headers_middleware,
        ))
        // HTTP tracing layer for consistent request/response telemetry
        .layer(crate::tracing::configure_http_tracing())
        // Ensure every request carries a request id for traceability
        .layer(middleware::from_fn(
            middleware_helpers::request_id_middleware,
        ))
}

async fn api_status(State(state): State<AppState>) -> ApiResult<Value> {
    let version = env!("CARGO_PKG_VERSION");
    let git = option_env!("GIT_HASH").unwrap_or("unknown");
    let build_time = option_env!("BUILD_TIME").unwrap_or("unknown");
    let status_data = json!({
        "status": "ok",
        "version": version,
        "git": git,
        "build_time": build_time,
        "service": "hostel-api",
        "hostel": state.config.hostel_name,
        "timestamp": Utc::now().to_rfc3339(),
        "environment": state.config.environment,
    });

    Ok(Json(ApiResponse::success(status_data)))
}
