use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::auth::SESSION_COOKIE;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "admin_session",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new(SESSION_COOKIE))),
            );
            components.add_security_scheme(
                "admin_bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
            components.add_security_scheme(
                "cron_secret",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Hostel API",
        version = "0.1.0",
        description = r#"
# Mandioca Hostel API

Booking, payment, self check-in and content backend for the hostel website.

## Booking funnel

- `POST /bookings` records a pay-on-arrival request.
- `POST /checkout` opens a hosted card checkout; the Stripe webhook confirms it.
- `GET /checkin/{token}` and `POST /checkin/{token}` drive guest self check-in.

## Authentication

Admin endpoints accept the `admin_session` cookie set by `POST /admin/login`, or the same
token as `Authorization: Bearer <token>`.

## Error Handling

Errors share one shape:

```json
{
  "error": "Bad Request",
  "message": "Missing required field: guest_email",
  "request_id": "2b1f...",
  "timestamp": "2025-01-01T00:00:00Z"
}
```
        "#,
        contact(name = "Mandioca Hostel", email = "info@mandiocahostel.com")
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "Bookings", description = "Booking requests and checkout"),
        (name = "Payments", description = "Payment processor webhooks"),
        (name = "Check-in", description = "Guest self check-in"),
        (name = "Public", description = "Website content"),
        (name = "Admin", description = "Admin console"),
        (name = "Operations", description = "Scheduled jobs")
    ),
    paths(
        // Booking funnel
        crate::handlers::bookings::create_booking,
        crate::handlers::checkout::create_checkout,
        crate::handlers::checkout::get_checkout_session,
        crate::handlers::payment_webhooks::stripe_webhook,
        crate::handlers::checkin::get_checkin,
        crate::handlers::checkin::submit_checkin,
        crate::handlers::cron::run_reminders,

        // Public content
        crate::handlers::public::list_rooms,
        crate::handlers::public::list_faq,
        crate::handlers::public::list_content,
        crate::handlers::public::hero_images,

        // Admin
        crate::handlers::admin::auth::login,
        crate::handlers::admin::auth::logout,
        crate::handlers::admin::rooms::list_rooms,
        crate::handlers::admin::rooms::create_room,
        crate::handlers::admin::rooms::update_room,
        crate::handlers::admin::rooms::delete_room,
        crate::handlers::admin::faq::list_faq,
        crate::handlers::admin::faq::create_faq,
        crate::handlers::admin::faq::reorder_faq,
        crate::handlers::admin::faq::update_faq,
        crate::handlers::admin::faq::delete_faq,
        crate::handlers::admin::content::list_content,
        crate::handlers::admin::content::upsert_content,
        crate::handlers::admin::content::update_content,
        crate::handlers::admin::content::delete_content,
        crate::handlers::admin::images::list_images,
        crate::handlers::admin::images::create_image,
        crate::handlers::admin::images::batch_update_images,
        crate::handlers::admin::images::update_image,
        crate::handlers::admin::images::delete_image,
        crate::handlers::admin::bookings::list_bookings,
        crate::handlers::admin::bookings::get_booking,
        crate::handlers::admin::bookings::update_booking,
        crate::handlers::admin::bookings::delete_booking,
        crate::handlers::admin::checkins::list_checkins,
        crate::handlers::admin::invitations::list_invitations,
        crate::handlers::admin::invitations::create_invitation,
        crate::handlers::admin::invitations::revoke_invitation,
    ),
    components(
        schemas(
            crate::ApiResponse<serde_json::Value>,
            crate::errors::ErrorResponse
        )
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDocV1;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDocV1::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_funnel_and_admin_paths() {
        let json = serde_json::to_string(&ApiDocV1::openapi()).unwrap();
        assert!(json.contains("Hostel API"));
        assert!(json.contains("/api/v1/checkout/session/{session_id}"));
        assert!(json.contains("/api/v1/admin/invitations/{id}"));
        assert!(json.contains("admin_session"));
    }
}
