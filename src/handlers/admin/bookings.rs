use crate::{
    errors::ErrorResponse,
    services::bookings::{AdminBookingView, BookingFilter, BookingUpdate},
    ApiResponse, ApiResult, AppState,
};
use axum::{
    extract::{Path, Query, State},
    response::Json,
    routing::get,
    Router,
};
use uuid::Uuid;

pub fn booking_routes() -> Router<AppState> {
    Router::new().route("/", get(list_bookings)).route(
        "/:id",
        get(get_booking)
            .put(update_booking)
            .patch(update_booking)
            .delete(delete_booking),
    )
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/bookings",
    params(
        ("status" = Option<String>, Query, description = "Booking status, or `all`"),
        ("start_date" = Option<String>, Query, description = "Check-in on or after (YYYY-MM-DD)"),
        ("end_date" = Option<String>, Query, description = "Check-out on or before (YYYY-MM-DD)"),
        ("room_id" = Option<Uuid>, Query, description = "Only this room")
    ),
    responses((status = 200, description = "Bookings ordered by check-in", body = ApiResponse<Vec<AdminBookingView>>)),
    security(("admin_session" = [])),
    tag = "Admin"
)]
pub async fn list_bookings(
    State(state): State<AppState>,
    Query(filter): Query<BookingFilter>,
) -> ApiResult<Vec<AdminBookingView>> {
    Ok(Json(ApiResponse::success(
        state.services.bookings.list(filter).await?,
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/bookings/{id}",
    params(("id" = Uuid, Path, description = "Booking id")),
    responses(
        (status = 200, description = "Booking", body = ApiResponse<AdminBookingView>),
        (status = 404, description = "Booking not found", body = ErrorResponse)
    ),
    security(("admin_session" = [])),
    tag = "Admin"
)]
pub async fn get_booking(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<AdminBookingView> {
    Ok(Json(ApiResponse::success(
        state.services.bookings.get(id).await?,
    )))
}

/// Edits a booking; status changes must be legal transitions
#[utoipa::path(
    put,
    path = "/api/v1/admin/bookings/{id}",
    params(("id" = Uuid, Path, description = "Booking id")),
    request_body = BookingUpdate,
    responses(
        (status = 200, description = "Booking updated", body = ApiResponse<AdminBookingView>),
        (status = 400, description = "Invalid change", body = ErrorResponse),
        (status = 404, description = "Booking not found", body = ErrorResponse)
    ),
    security(("admin_session" = [])),
    tag = "Admin"
)]
pub async fn update_booking(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(update): Json<BookingUpdate>,
) -> ApiResult<AdminBookingView> {
    Ok(Json(ApiResponse::success(
        state.services.bookings.update(id, update).await?,
    )))
}

/// Removes the booking with its reminders, consent logs and check-in
#[utoipa::path(
    delete,
    path = "/api/v1/admin/bookings/{id}",
    params(("id" = Uuid, Path, description = "Booking id")),
    responses(
        (status = 200, description = "Booking deleted"),
        (status = 404, description = "Booking not found", body = ErrorResponse)
    ),
    security(("admin_session" = [])),
    tag = "Admin"
)]
pub async fn delete_booking(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<()> {
    state.services.bookings.delete(id).await?;
    Ok(Json(ApiResponse::done("Booking deleted")))
}
