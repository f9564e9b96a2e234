use crate::tracing::{scope_request_id, RequestId};
use axum::{
    extract::Request,
    http::{header::HeaderName, HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};

pub const REQUEST_ID_HEADER: &str = "x-request-id";

fn incoming_request_id(headers: &HeaderMap) -> RequestId {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(RequestId::from_header)
        .unwrap_or_default()
}

fn stamp(headers: &mut HeaderMap, value: &HeaderValue) {
    headers.insert(HeaderName::from_static(REQUEST_ID_HEADER), value.clone());
}

/// Assigns the request id, scopes it for error bodies and echoes it back.
///
/// Booking widgets send their own id so a failed submission can be matched
/// with server logs; anything unusable is replaced with a fresh UUID.
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let request_id = incoming_request_id(request.headers());
    let header_value = HeaderValue::from_str(request_id.as_str()).ok();

    if let Some(value) = &header_value {
        stamp(request.headers_mut(), value);
    }
    request.extensions_mut().insert(request_id.clone());

    let mut response = scope_request_id(request_id, next.run(request)).await;
    if let Some(value) = &header_value {
        stamp(response.headers_mut(), value);
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ServiceError;
    use axum::{
        body::{to_bytes, Body},
        http::{Request as HttpRequest, StatusCode},
        routing::get,
        Router,
    };
    use tower::ServiceExt;

    async fn failing_handler() -> Result<&'static str, ServiceError> {
        Err(ServiceError::NotFound("Booking not found".to_string()))
    }

    fn app() -> Router {
        Router::new()
            .route("/bookings/missing", get(failing_handler))
            .layer(axum::middleware::from_fn(request_id_middleware))
    }

    fn get_request(request_id: Option<&str>) -> HttpRequest<Body> {
        let mut builder = HttpRequest::builder().uri("/bookings/missing");
        if let Some(id) = request_id {
            builder = builder.header(REQUEST_ID_HEADER, id);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn error_body_reports_the_echoed_request_id() {
        let response = app().oneshot(get_request(None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let header = response
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .expect("request id header");
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["request_id"], header);
    }

    #[tokio::test]
    async fn client_supplied_id_is_kept() {
        let response = app()
            .oneshot(get_request(Some("booking-form-42")))
            .await
            .unwrap();
        assert_eq!(
            response.headers().get(REQUEST_ID_HEADER).unwrap(),
            "booking-form-42"
        );
    }

    #[tokio::test]
    async fn unusable_client_id_is_replaced() {
        let response = app()
            .oneshot(get_request(Some("has spaces in it")))
            .await
            .unwrap();
        let echoed = response.headers().get(REQUEST_ID_HEADER).unwrap();
        assert_ne!(echoed, "has spaces in it");
        assert!(uuid::Uuid::parse_str(echoed.to_str().unwrap()).is_ok());
    }
}
