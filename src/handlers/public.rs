//! Read-only content for the public website.

use crate::{
    entities::{content, faq},
    services::{content::HeroImage, rooms::RoomView},
    ApiResponse, ApiResult, AppState,
};
use axum::{
    extract::{Query, State},
    response::Json,
    routing::get,
    Router,
};
use serde::Deserialize;
use utoipa::IntoParams;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SectionQuery {
    /// Only blocks in this section
    pub section: Option<String>,
}

pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/rooms", get(list_rooms))
        .route("/faq", get(list_faq))
        .route("/content", get(list_content))
        .route("/hero-images", get(hero_images))
}

/// Active rooms with nightly prices
#[utoipa::path(
    get,
    path = "/api/v1/rooms",
    responses((status = 200, description = "Active rooms", body = ApiResponse<Vec<RoomView>>)),
    tag = "Public"
)]
pub async fn list_rooms(State(state): State<AppState>) -> ApiResult<Vec<RoomView>> {
    let rooms = state.services.rooms.list_active().await?;
    Ok(Json(ApiResponse::success(rooms)))
}

#[utoipa::path(
    get,
    path = "/api/v1/faq",
    responses((status = 200, description = "Active FAQ entries", body = ApiResponse<Vec<faq::Model>>)),
    tag = "Public"
)]
pub async fn list_faq(State(state): State<AppState>) -> ApiResult<Vec<faq::Model>> {
    let entries = state.services.content.list_faq(true).await?;
    Ok(Json(ApiResponse::success(entries)))
}

#[utoipa::path(
    get,
    path = "/api/v1/content",
    params(SectionQuery),
    responses((status = 200, description = "Editable text blocks", body = ApiResponse<Vec<content::Model>>)),
    tag = "Public"
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

/// Landing page hero images; falls back to the built-in set
#[utoipa::path(
    get,
    path = "/api/v1/hero-images",
    responses((status = 200, description = "Hero images", body = ApiResponse<Vec<HeroImage>>)),
    tag = "Public"
)]
pub async fn hero_images(State(state): State<AppState>) -> ApiResult<Vec<HeroImage>> {
    Ok(Json(ApiResponse::success(
        state.services.content.hero_images().await,
    )))
}
