use crate::{
    entities::faq,
    errors::{ErrorResponse, ServiceError},
    services::content::{DisplayOrderUpdate, FaqInput, FaqPatch},
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

pub fn faq_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_faq).post(create_faq).put(reorder_faq))
        .route("/:id", put(update_faq).patch(update_faq).delete(delete_faq))
}

/// Every entry, including inactive ones
#[utoipa::path(
    get,
    path = "/api/v1/admin/faq",
    responses((status = 200, description = "FAQ entries", body = ApiResponse<Vec<faq::Model>>)),
    security(("admin_session" = [])),
    tag = "Admin"
)]
pub async fn list_faq(State(state): State<AppState>) -> ApiResult<Vec<faq::Model>> {
    Ok(Json(ApiResponse::success(
        state.services.content.list_faq(false).await?,
    )))
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/faq",
    request_body = FaqInput,
    responses(
        (status = 201, description = "Entry created", body = ApiResponse<faq::Model>),
        (status = 400, description = "Question or answer missing", body = ErrorResponse)
    ),
    security(("admin_session" = [])),
    tag = "Admin"
)]
pub async fn create_faq(
    State(state): State<AppState>,
    Json(input): Json<FaqInput>,
) -> Result<(StatusCode, Json<ApiResponse<faq::Model>>), ServiceError> {
    let entry = state.services.content.create_faq(input, Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(entry))))
}

/// Batch reorder in one transaction
#[utoipa::path(
    put,
    path = "/api/v1/admin/faq",
    request_body = Vec<DisplayOrderUpdate>,
    responses(
        (status = 200, description = "Order saved"),
        (status = 404, description = "Unknown entry; nothing was changed", body = ErrorResponse)
    ),
    security(("admin_session" = [])),
    tag = "Admin"
)]
pub async fn reorder_faq(
    State(state): State<AppState>,
    Json(items): Json<Vec<DisplayOrderUpdate>>,
) -> ApiResult<()> {
    state.services.content.reorder_faq(items, Utc::now()).await?;
    Ok(Json(ApiResponse::done("FAQ order updated")))
}

#[utoipa::path(
    put,
    path = "/api/v1/admin/faq/{id}",
    params(("id" = Uuid, Path, description = "FAQ entry id")),
    request_body = FaqPatch,
    responses(
        (status = 200, description = "Entry updated", body = ApiResponse<faq::Model>),
        (status = 404, description = "Entry not found", body = ErrorResponse)
    ),
    security(("admin_session" = [])),
    tag = "Admin"
)]
pub async fn update_faq(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<FaqPatch>,
) -> ApiResult<faq::Model> {
    let entry = state
        .services
        .content
        .update_faq(id, patch, Utc::now())
        .await?;
    Ok(Json(ApiResponse::success(entry)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/admin/faq/{id}",
    params(("id" = Uuid, Path, description = "FAQ entry id")),
    responses(
        (status = 200, description = "Entry deleted"),
        (status = 404, description = "Entry not found", body = ErrorResponse)
    ),
    security(("admin_session" = [])),
    tag = "Admin"
)]
pub async fn delete_faq(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<()> {
    state.services.content.delete_faq(id).await?;
    Ok(Json(ApiResponse::done("FAQ entry deleted")))
}
