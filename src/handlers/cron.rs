use crate::{
    config::AppConfig,
    errors::{ErrorResponse, ServiceError},
    services::reminders::ReminderRunResult,
    AppState,
};
use axum::{
    extract::State,
    http::{header, HeaderMap},
    response::Json,
    routing::get,
    Router,
};
use chrono::Utc;
use tracing::warn;

pub fn cron_routes() -> Router<AppState> {
    Router::new().route("/reminders", get(run_reminders))
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes().zip(b.bytes()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Without a configured secret the endpoint is open outside production only.
fn authorize(config: &AppConfig, headers: &HeaderMap) -> Result<(), ServiceError> {
    let Some(secret) = config.cron_secret.as_deref() else {
        if config.is_production() {
            warn!("Cron request rejected: APP__CRON_SECRET is not set in production");
            return Err(ServiceError::Unauthorized("Unauthorized".to_string()));
        }
        return Ok(());
    };

    let presented = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    match presented {
        Some(token) if constant_time_eq(token, secret) => Ok(()),
        _ => Err(ServiceError::Unauthorized("Unauthorized".to_string())),
    }
}

/// Trigger one reminder pass (used by an external scheduler)
#[utoipa::path(
    get,
    path = "/api/v1/cron/reminders",
    responses(
        (status = 200, description = "Reminder pass finished", body = ReminderRunResult),
        (status = 401, description = "Missing or wrong cron secret", body = ErrorResponse),
        (status = 500, description = "Email service not configured", body = ErrorResponse)
    ),
    security(("cron_secret" = [])),
    tag = "Operations"
)]
pub async fn run_reminders(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ReminderRunResult>, ServiceError> {
    authorize(&state.config, &headers)?;
    Ok(Json(state.services.reminders.run(Utc::now()).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_config;
    use assert_matches::assert_matches;
    use axum::http::HeaderValue;

    fn bearer(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
        );
        headers
    }

    #[test]
    fn requires_matching_secret() {
        let mut config = test_config();
        config.cron_secret = Some("s3cret".into());

        assert!(authorize(&config, &bearer("s3cret")).is_ok());
        assert_matches!(
            authorize(&config, &bearer("nope")),
            Err(ServiceError::Unauthorized(_))
        );
        assert_matches!(
            authorize(&config, &HeaderMap::new()),
            Err(ServiceError::Unauthorized(_))
        );
    }

    #[test]
    fn secret_comparison_needs_every_byte() {
        assert!(constant_time_eq("s3cret", "s3cret"));
        assert!(!constant_time_eq("s3cres", "s3cret"));
        assert!(!constant_time_eq("x3cret", "s3cret"));
        assert!(!constant_time_eq("s3cret ", "s3cret"));
        assert!(!constant_time_eq("", "s3cret"));

        let mut config = test_config();
        config.cron_secret = Some("s3cret".into());
        assert_matches!(
            authorize(&config, &bearer("s3cre")),
            Err(ServiceError::Unauthorized(_))
        );
    }

    #[test]
    fn open_without_secret_outside_production() {
        let mut config = test_config();
        config.cron_secret = None;
        assert!(authorize(&config, &HeaderMap::new()).is_ok());

        config.environment = "production".into();
        assert_matches!(
            authorize(&config, &HeaderMap::new()),
            Err(ServiceError::Unauthorized(_))
        );
    }
}
