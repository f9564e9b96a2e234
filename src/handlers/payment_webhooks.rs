use crate::{
    errors::{ErrorResponse, ServiceError},
    services::payment_events::StripeEvent,
    webhooks::stripe_signature::verify_stripe_signature,
    AppState,
};
use axum::{
    extract::State,
    http::HeaderMap,
    response::Json,
    routing::post,
    Router,
};
use bytes::Bytes;
use chrono::Utc;
use serde_json::{json, Value};
use tracing::{error, warn};

pub const SIGNATURE_HEADER: &str = "stripe-signature";

pub fn webhook_routes() -> Router<AppState> {
    Router::new().route("/stripe", post(stripe_webhook))
}

// POST /api/v1/webhooks/stripe
#[utoipa::path(
    post,
    path = "/api/v1/webhooks/stripe",
    request_body = String,
    responses(
        (status = 200, description = "Event acknowledged"),
        (status = 400, description = "Missing or invalid signature", body = ErrorResponse),
        (status = 500, description = "Webhook secret not configured", body = ErrorResponse)
    ),
    tag = "Payments"
)]
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, ServiceError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ServiceError::BadRequest("No signature".to_string()))?;

    let secret = state.config.stripe_webhook_secret.as_deref().ok_or_else(|| {
        error!("Stripe webhook received but APP__STRIPE_WEBHOOK_SECRET is not set");
        ServiceError::NotConfigured("Webhook not configured".to_string())
    })?;

    if let Err(e) = verify_stripe_signature(
        &body,
        signature,
        secret,
        state.config.stripe_webhook_tolerance_secs,
        Utc::now().timestamp(),
    ) {
        warn!("Stripe webhook signature verification failed: {}", e);
        return Err(ServiceError::BadRequest("Invalid signature".to_string()));
    }

    let event: StripeEvent = serde_json::from_slice(&body)
        .map_err(|e| ServiceError::BadRequest(format!("Invalid event payload: {}", e)))?;

    state.services.payment_events.handle(event).await?;

    Ok(Json(json!({ "received": true })))
}
