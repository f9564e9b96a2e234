use crate::{
    auth::AdminUser,
    entities::invitation,
    errors::{ErrorResponse, ServiceError},
    services::invitations::CreateInvitationRequest,
    ApiResponse, ApiResult, AppState,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{delete, get},
    Extension, Router,
};
use chrono::Utc;
use uuid::Uuid;

pub fn invitation_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_invitations).post(create_invitation))
        .route("/:id", delete(revoke_invitation))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/invitations",
    responses((status = 200, description = "Invitations, newest first", body = ApiResponse<Vec<invitation::Model>>)),
    security(("admin_session" = [])),
    tag = "Admin"
)]
pub async fn list_invitations(State(state): State<AppState>) -> ApiResult<Vec<invitation::Model>> {
    Ok(Json(ApiResponse::success(
        state.services.invitations.list().await?,
    )))
}

/// Invite a staff member by email
#[utoipa::path(
    post,
    path = "/api/v1/admin/invitations",
    request_body = CreateInvitationRequest,
    responses(
        (status = 201, description = "Invitation sent", body = ApiResponse<invitation::Model>),
        (status = 400, description = "Missing email or role, or invalid role", body = ErrorResponse),
        (status = 409, description = "A pending invitation already exists", body = ErrorResponse),
        (status = 502, description = "Failed to send invitation email", body = ErrorResponse)
    ),
    security(("admin_session" = [])),
    tag = "Admin"
)]
pub async fn create_invitation(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminUser>,
    Json(request): Json<CreateInvitationRequest>,
) -> Result<(StatusCode, Json<ApiResponse<invitation::Model>>), ServiceError> {
    let created = state
        .services
        .invitations
        .create(request, &admin.username, Utc::now())
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(created))))
}

#[utoipa::path(
    delete,
    path = "/api/v1/admin/invitations/{id}",
    params(("id" = Uuid, Path, description = "Invitation id")),
    responses(
        (status = 200, description = "Invitation revoked", body = ApiResponse<invitation::Model>),
        (status = 404, description = "Invitation not found", body = ErrorResponse)
    ),
    security(("admin_session" = [])),
    tag = "Admin"
)]
pub async fn revoke_invitation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<invitation::Model> {
    Ok(Json(ApiResponse::success(
        state.services.invitations.revoke(id).await?,
    )))
}
