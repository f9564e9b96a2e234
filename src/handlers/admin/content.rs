use crate::{
    entities::content,
    errors::ErrorResponse,
    handlers::public::SectionQuery,
    services::content::{ContentPatch, ContentUpsert},
    ApiResponse, ApiResult, AppState,
};
use axum::{
    extract::{Path, Query, State},
    response::Json,
    routing::{get, put},
    Router,
};
use chrono::Utc;
use uuid::Uuid;

pub fn content_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_content).post(upsert_content))
        .route(
            "/:id",
            put(update_content).patch(update_content).delete(delete_content),
        )
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/content",
    params(SectionQuery),
    responses((status = 200, description = "Content blocks by section and key", body = ApiResponse<Vec<content::Model>>)),
    security(("admin_session" = [])),
    tag = "Admin"
)]
pub async fn list_content(
    State(state): State<AppState>,
    Query(query): Query<SectionQuery>,
) -> ApiResult<Vec<content::Model>> {
    let blocks = state
        .services
        .content
        .list_content(query.section.as_deref())
        .await?;
    Ok(Json(ApiResponse::success(blocks)))
}

/// Creates or replaces the block at (section, key)
#[utoipa::path(
    post,
    path = "/api/v1/admin/content",
    request_body = ContentUpsert,
    responses(
        (status = 200, description = "Block saved", body = ApiResponse<content::Model>),
        (status = 400, description = "Section or key missing", body = ErrorResponse)
    ),
    security(("admin_session" = [])),
    tag = "Admin"
)]
pub async fn upsert_content(
    State(state): State<AppState>,
    Json(input): Json<ContentUpsert>,
) -> ApiResult<content::Model> {
    let block = state
        .services
        .content
        .upsert_content(input, Utc::now())
        .await?;
    Ok(Json(ApiResponse::success(block)))
}

#[utoipa::path(
    put,
    path = "/api/v1/admin/content/{id}",
    params(("id" = Uuid, Path, description = "Content block id")),
    request_body = ContentPatch,
    responses(
        (status = 200, description = "Block updated", body = ApiResponse<content::Model>),
        (status = 404, description = "Block not found", body = ErrorResponse)
    ),
    security(("admin_session" = [])),
    tag = "Admin"
)]
pub async fn update_content(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<ContentPatch>,
) -> ApiResult<content::Model> {
    let block = state
        .services
        .content
        .update_content(id, patch, Utc::now())
        .await?;
    Ok(Json(ApiResponse::success(block)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/admin/content/{id}",
    params(("id" = Uuid, Path, description = "Content block id")),
    responses(
        (status = 200, description = "Block deleted"),
        (status = 404, description = "Block not found", body = ErrorResponse)
    ),
    security(("admin_session" = [])),
    tag = "Admin"
)]
pub async fn delete_content(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<()> {
    state.services.content.delete_content(id).await?;
    Ok(Json(ApiResponse::done("Content deleted")))
}
