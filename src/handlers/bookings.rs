use crate::{
    errors::{ErrorResponse, ServiceError},
    services::bookings::{BookingCreated, StayRequest},
    AppState,
};
use axum::{extract::State, http::StatusCode, response::Json, routing::post, Router};
use chrono::Utc;

pub fn booking_routes() -> Router<AppState> {
    Router::new().route("/", post(create_booking))
}

/// Request a stay that is paid on arrival
#[utoipa::path(
    post,
    path = "/api/v1/bookings",
    request_body = StayRequest,
    responses(
        (status = 201, description = "Booking request recorded", body = BookingCreated),
        (status = 400, description = "Missing or invalid fields", body = ErrorResponse),
        (status = 404, description = "Room not found", body = ErrorResponse)
    ),
    tag = "Bookings"
)]
pub async fn create_booking(
    State(state): State<AppState>,
    Json(request): Json<StayRequest>,
) -> Result<(StatusCode, Json<BookingCreated>), ServiceError> {
    let created = state
        .services
        .bookings
        .request_booking(request, Utc::now())
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}
