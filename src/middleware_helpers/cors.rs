use crate::config::AppConfig;
use axum::http::{header, HeaderName, HeaderValue, Method};
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

const ALLOWED_METHODS: [Method; 6] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::PATCH,
    Method::DELETE,
    Method::OPTIONS,
];

/// Parses `cors_allowed_origins`, skipping blanks and values that are not
/// valid header values.
pub fn allowed_origins(cfg: &AppConfig) -> Vec<HeaderValue> {
    let Some(raw) = cfg.cors_allowed_origins.as_deref() else {
        return Vec::new();
    };
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect()
}

/// CORS for the hostel website and admin console.
///
/// Explicit origins get an explicit method and header list, since browsers
/// refuse wildcards on credentialed requests and the admin session is a
/// cookie. Without origins the layer is permissive; config validation only
/// lets that through in development or with `cors_allow_any_origin`.
pub fn cors_layer(cfg: &AppConfig) -> CorsLayer {
    let origins = allowed_origins(cfg);
    if origins.is_empty() {
        info!(
            environment = %cfg.environment,
            "No CORS origins configured; allowing any origin"
        );
        return CorsLayer::permissive();
    }

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(ALLOWED_METHODS)
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-request-id"),
        ])
        .expose_headers([HeaderName::from_static("x-request-id"), header::RETRY_AFTER])
        .allow_credentials(cfg.cors_allow_credentials)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request, routing::get, Router};
    use tower::ServiceExt;

    fn config(origins: Option<&str>) -> AppConfig {
        let mut cfg = AppConfig::new("sqlite::memory:".into(), "x".repeat(64), "production".into());
        cfg.cors_allowed_origins = origins.map(str::to_string);
        cfg.cors_allow_credentials = true;
        cfg
    }

    #[test]
    fn parses_comma_separated_origins() {
        let cfg = config(Some(" https://mandiocahostel.com, ,https://admin.mandiocahostel.com "));
        assert_eq!(
            allowed_origins(&cfg),
            vec![
                HeaderValue::from_static("https://mandiocahostel.com"),
                HeaderValue::from_static("https://admin.mandiocahostel.com"),
            ]
        );
        assert!(allowed_origins(&config(None)).is_empty());
    }

    #[tokio::test]
    async fn credentialed_preflight_from_the_website_is_allowed() {
        let app = Router::new()
            .route("/api/v1/admin/rooms", get(|| async { "rooms" }))
            .layer(cors_layer(&config(Some("https://mandiocahostel.com"))));

        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/api/v1/admin/rooms")
                    .header(header::ORIGIN, "https://mandiocahostel.com")
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "DELETE")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let headers = response.headers();
        assert_eq!(
            headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "https://mandiocahostel.com"
        );
        assert_eq!(
            headers.get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).unwrap(),
            "true"
        );
    }
}
