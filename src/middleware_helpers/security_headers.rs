use crate::config::AppConfig;
use axum::{
    extract::{Request, State},
    http::{header, HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};

const API_CSP: &str = "default-src 'none'; frame-ancestors 'none'";
// Swagger UI loads its own bundle, styles and inline bootstrap script.
const DOCS_CSP: &str = "default-src 'self'; script-src 'self' 'unsafe-inline'; \
                        style-src 'self' 'unsafe-inline'; img-src 'self' data:; frame-ancestors 'none'";
const HSTS: &str = "max-age=31536000; includeSubDomains";

#[derive(Debug, Clone, Copy, Default)]
pub struct SecurityPolicy {
    /// Send Strict-Transport-Security; only meaningful behind TLS.
    pub hsts: bool,
}

impl From<&AppConfig> for SecurityPolicy {
    fn from(config: &AppConfig) -> Self {
        Self {
            hsts: config.is_production(),
        }
    }
}

/// Response headers applied to every API response.
///
/// Guest documents and admin data flow through this API, so responses are
/// marked non-cacheable unless a handler set its own cache policy.
pub async fn security_headers_middleware(
    State(policy): State<SecurityPolicy>,
    req: Request,
    next: Next,
) -> Response {
    let is_docs = req.uri().path().starts_with("/swagger-ui");
    let mut res = next.run(req).await;
    let headers = res.headers_mut();

    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(
        header::REFERRER_POLICY,
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );
    headers.insert(
        header::CONTENT_SECURITY_POLICY,
        HeaderValue::from_static(if is_docs { DOCS_CSP } else { API_CSP }),
    );
    headers.insert(
        HeaderName::from_static("permissions-policy"),
        HeaderValue::from_static("camera=(), microphone=(), geolocation=()"),
    );
    if policy.hsts {
        headers.insert(
            header::STRICT_TRANSPORT_SECURITY,
            HeaderValue::from_static(HSTS),
        );
    }
    if !headers.contains_key(header::CACHE_CONTROL) {
        headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    }

    res
}
