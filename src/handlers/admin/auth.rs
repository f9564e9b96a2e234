use crate::{
    errors::{ErrorResponse, ServiceError},
    events::Event,
    middleware_helpers::ClientInfo,
    rate_limiter::{login_key_for_ip, ThrottleStatus},
    ApiResponse, AppState,
};
use axum::{
    extract::State,
    http::{header, HeaderValue},
    response::{IntoResponse, Json, Response},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[schema(example = "admin")]
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    pub username: String,
    /// Session lifetime in seconds
    pub expires_in: i64,
}

fn with_cookie<T: Serialize>(body: ApiResponse<T>, cookie: &str) -> Result<Response, ServiceError> {
    let cookie = HeaderValue::from_str(cookie)
        .map_err(|e| ServiceError::InternalError(format!("invalid cookie header: {}", e)))?;
    let mut response = Json(body).into_response();
    response.headers_mut().insert(header::SET_COOKIE, cookie);
    Ok(response)
}

/// Exchange admin credentials for a session
#[utoipa::path(
    post,
    path = "/api/v1/admin/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session issued; also set as the admin_session cookie", body = ApiResponse<LoginResponse>),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 429, description = "Too many login attempts", body = ErrorResponse)
    ),
    tag = "Admin"
)]
pub async fn login(
    State(state): State<AppState>,
    client: ClientInfo,
    Json(request): Json<LoginRequest>,
) -> Result<Response, ServiceError> {
    let ip = client.ip_or_unknown().to_string();
    let key = login_key_for_ip(&ip);

    if let ThrottleStatus::Locked { retry_after } = state.login_throttle.check(&key).await {
        warn!(ip = %ip, "Admin login locked out");
        state.event_sender.emit(Event::AdminLoginFailed {
            username: request.username.clone(),
            ip_address: ip,
            failure_reason: "rate_limited".to_string(),
        });
        return Err(ServiceError::rate_limited(
            "Too many login attempts",
            retry_after.as_secs(),
        ));
    }

    if !state
        .admin_auth
        .verify_credentials(&request.username, &request.password)
    {
        state.login_throttle.record_failure(&key).await;
        state.event_sender.emit(Event::AdminLoginFailed {
            username: request.username,
            ip_address: ip,
            failure_reason: "invalid_credentials".to_string(),
        });
        return Err(ServiceError::Unauthorized("Invalid credentials".to_string()));
    }

    state.login_throttle.reset(&key).await;
    let token = state.admin_auth.issue_token(&request.username, Utc::now())?;
    info!(username = %request.username, "Admin logged in");
    state.event_sender.emit(Event::AdminLoginSuccess {
        username: request.username.clone(),
        ip_address: ip,
    });

    let cookie = state.admin_auth.session_cookie(&token);
    with_cookie(
        ApiResponse::success(LoginResponse {
            token,
            username: request.username,
            expires_in: state.admin_auth.session_secs(),
        }),
        &cookie,
    )
}

/// Clear the admin session cookie
#[utoipa::path(
    post,
    path = "/api/v1/admin/logout",
    responses((status = 200, description = "Session cookie cleared")),
    tag = "Admin"
)]
pub async fn logout(State(state): State<AppState>) -> Result<Response, ServiceError> {
    with_cookie(
        ApiResponse::done("Logged out"),
        &state.admin_auth.clear_cookie(),
    )
}
