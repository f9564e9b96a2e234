use crate::{
    entities::hostel_image,
    errors::{ErrorResponse, ServiceError},
    services::content::{ImageBatchItem, ImageInput, ImagePatch},
    ApiResponse, ApiResult, AppState,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, put},
    Router,
};
use chrono::Utc;
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ImageQuery {
    /// Category filter; `all` lists everything
    pub category: Option<String>,
}

pub fn image_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(list_images).post(create_image).put(batch_update_images),
        )
        .route("/:id", put(update_image).patch(update_image).delete(delete_image))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/images",
    params(ImageQuery),
    responses((status = 200, description = "Images by display order", body = ApiResponse<Vec<hostel_image::Model>>)),
    security(("admin_session" = [])),
    tag = "Admin"
)]
pub async fn list_images(
    State(state): State<AppState>,
    Query(query): Query<ImageQuery>,
) -> ApiResult<Vec<hostel_image::Model>> {
    let images = state
        .services
        .content
        .list_images(query.category.as_deref())
        .await?;
    Ok(Json(ApiResponse::success(images)))
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/images",
    request_body = ImageInput,
    responses(
        (status = 201, description = "Image created", body = ApiResponse<hostel_image::Model>),
        (status = 400, description = "Invalid image", body = ErrorResponse)
    ),
    security(("admin_session" = [])),
    tag = "Admin"
)]
pub async fn create_image(
    State(state): State<AppState>,
    Json(input): Json<ImageInput>,
) -> Result<(StatusCode, Json<ApiResponse<hostel_image::Model>>), ServiceError> {
    let image = state.services.content.create_image(input, Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(image))))
}

/// Batch update of ordering, category and alt texts
#[utoipa::path(
    put,
    path = "/api/v1/admin/images",
    request_body = Vec<ImageBatchItem>,
    responses(
        (status = 200, description = "Images updated"),
        (status = 404, description = "Unknown image; nothing was changed", body = ErrorResponse)
    ),
    security(("admin_session" = [])),
    tag = "Admin"
)]
pub async fn batch_update_images(
    State(state): State<AppState>,
    Json(items): Json<Vec<ImageBatchItem>>,
) -> ApiResult<()> {
    state.services.content.batch_update_images(items).await?;
    Ok(Json(ApiResponse::done("Images updated")))
}

#[utoipa::path(
    put,
    path = "/api/v1/admin/images/{id}",
    params(("id" = Uuid, Path, description = "Image id")),
    request_body = ImagePatch,
    responses(
        (status = 200, description = "Image updated", body = ApiResponse<hostel_image::Model>),
        (status = 404, description = "Image not found", body = ErrorResponse)
    ),
    security(("admin_session" = [])),
    tag = "Admin"
)]
pub async fn update_image(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<ImagePatch>,
) -> ApiResult<hostel_image::Model> {
    let image = state.services.content.update_image(id, patch).await?;
    Ok(Json(ApiResponse::success(image)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/admin/images/{id}",
    params(("id" = Uuid, Path, description = "Image id")),
    responses(
        (status = 200, description = "Image deleted"),
        (status = 404, description = "Image not found", body = ErrorResponse)
    ),
    security(("admin_session" = [])),
    tag = "Admin"
)]
pub async fn delete_image(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<()> {
    state.services.content.delete_image(id).await?;
    Ok(Json(ApiResponse::done("Image deleted")))
}
