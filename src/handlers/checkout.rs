use crate::{
    errors::{ErrorResponse, ServiceError},
    services::bookings::{CheckoutCreated, CheckoutSessionSummary, StayRequest},
    AppState,
};
use axum::{
    extract::{Path, State},
    response::Json,
    routing::{get, post},
    Router,
};
use chrono::Utc;

pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_checkout))
        .route("/session/:session_id", get(get_checkout_session))
}

/// Open a hosted card checkout for a new booking
#[utoipa::path(
    post,
    path = "/api/v1/checkout",
    request_body = StayRequest,
    responses(
        (status = 200, description = "Checkout session created", body = CheckoutCreated),
        (status = 400, description = "Missing or invalid fields", body = ErrorResponse),
        (status = 404, description = "Room not found", body = ErrorResponse),
        (status = 502, description = "Payment provider failure", body = ErrorResponse)
    ),
    tag = "Bookings"
)]
pub async fn create_checkout(
    State(state): State<AppState>,
    Json(request): Json<StayRequest>,
) -> Result<Json<CheckoutCreated>, ServiceError> {
    let created = state
        .services
        .bookings
        .start_checkout(request, Utc::now())
        .await?;
    Ok(Json(created))
}

/// Booking summary for the post-payment success page
#[utoipa::path(
    get,
    path = "/api/v1/checkout/session/{session_id}",
    params(("session_id" = String, Path, description = "Checkout session id")),
    responses(
        (status = 200, description = "Booking for the session", body = CheckoutSessionSummary),
        (status = 404, description = "No booking for this session", body = ErrorResponse)
    ),
    tag = "Bookings"
)]
pub async fn get_checkout_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<CheckoutSessionSummary>, ServiceError> {
    Ok(Json(
        state.services.bookings.checkout_summary(&session_id).await?,
    ))
}
