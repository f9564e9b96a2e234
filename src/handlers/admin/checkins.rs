use crate::{services::checkin::CheckinRecord, ApiResponse, ApiResult, AppState};
use axum::{extract::State, response::Json, routing::get, Router};

pub fn checkin_routes() -> Router<AppState> {
    Router::new().route("/", get(list_checkins))
}

/// Completed check-ins with guest identity and document links
#[utoipa::path(
    get,
    path = "/api/v1/admin/checkins",
    responses((status = 200, description = "Completed check-ins", body = ApiResponse<Vec<CheckinRecord>>)),
    security(("admin_session" = [])),
    tag = "Admin"
)]
pub async fn list_checkins(State(state): State<AppState>) -> ApiResult<Vec<CheckinRecord>> {
    Ok(Json(ApiResponse::success(
        state.services.checkin.list_completed().await?,
    )))
}
