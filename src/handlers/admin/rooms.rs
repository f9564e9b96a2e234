use crate::{
    errors::{ErrorResponse, ServiceError},
    services::rooms::{CreateRoomRequest, RoomView, UpdateRoomRequest},
    ApiResponse, ApiResult, AppState,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, put},
    Router,
};
use chrono::Utc;
use uuid::Uuid;

pub fn room_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_rooms).post(create_room))
        .route("/:id", put(update_room).patch(update_room).delete(delete_room))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/rooms",
    responses((status = 200, description = "All rooms", body = ApiResponse<Vec<RoomView>>)),
    security(("admin_session" = [])),
    tag = "Admin"
)]
pub async fn list_rooms(State(state): State<AppState>) -> ApiResult<Vec<RoomView>> {
    Ok(Json(ApiResponse::success(state.services.rooms.list().await?)))
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/rooms",
    request_body = CreateRoomRequest,
    responses(
        (status = 201, description = "Room created", body = ApiResponse<RoomView>),
        (status = 400, description = "Invalid room", body = ErrorResponse)
    ),
    security(("admin_session" = [])),
    tag = "Admin"
)]
pub async fn create_room(
    State(state): State<AppState>,
    Json(request): Json<CreateRoomRequest>,
) -> Result<(StatusCode, Json<ApiResponse<RoomView>>), ServiceError> {
    let room = state.services.rooms.create(request, Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(room))))
}

#[utoipa::path(
    put,
    path = "/api/v1/admin/rooms/{id}",
    params(("id" = Uuid, Path, description = "Room id")),
    request_body = UpdateRoomRequest,
    responses(
        (status = 200, description = "Room updated", body = ApiResponse<RoomView>),
        (status = 404, description = "Room not found", body = ErrorResponse)
    ),
    security(("admin_session" = [])),
    tag = "Admin"
)]
pub async fn update_room(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateRoomRequest>,
) -> ApiResult<RoomView> {
    let room = state.services.rooms.update(id, request, Utc::now()).await?;
    Ok(Json(ApiResponse::success(room)))
}

/// Rooms with bookings answer 409; deactivate them instead
#[utoipa::path(
    delete,
    path = "/api/v1/admin/rooms/{id}",
    params(("id" = Uuid, Path, description = "Room id")),
    responses(
        (status = 200, description = "Room deleted"),
        (status = 404, description = "Room not found", body = ErrorResponse),
        (status = 409, description = "Room has bookings", body = ErrorResponse)
    ),
    security(("admin_session" = [])),
    tag = "Admin"
)]
pub async fn delete_room(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<()> {
    state.services.rooms.delete(id).await?;
    Ok(Json(ApiResponse::done("Room deleted")))
}
