use crate::{
    errors::{ErrorResponse, ServiceError},
    middleware_helpers::ClientInfo,
    services::checkin::{CheckinCompleted, CheckinSubmission, CheckinView, UploadedFile},
    AppState,
};
use axum::{
    extract::{multipart::Field, DefaultBodyLimit, Multipart, Path, State},
    response::Json,
    routing::get,
    Router,
};
use chrono::Utc;
use tracing::debug;

/// Multipart overhead allowed on top of the passport image itself.
const FORM_OVERHEAD_BYTES: usize = 1024 * 1024;

pub fn checkin_routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/:token", get(get_checkin).post(submit_checkin))
        .layer(DefaultBodyLimit::max(max_upload_bytes + FORM_OVERHEAD_BYTES))
}

/// Booking, room and house rules for the self check-in page
#[utoipa::path(
    get,
    path = "/api/v1/checkin/{token}",
    params(("token" = String, Path, description = "Check-in token from the confirmation email")),
    responses(
        (status = 200, description = "Check-in page data", body = CheckinView),
        (status = 400, description = "Invalid token or cancelled booking", body = ErrorResponse),
        (status = 404, description = "Booking not found", body = ErrorResponse)
    ),
    tag = "Check-in"
)]
pub async fn get_checkin(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<CheckinView>, ServiceError> {
    Ok(Json(state.services.checkin.view(&token).await?))
}

/// Submit the self check-in form (multipart/form-data)
#[utoipa::path(
    post,
    path = "/api/v1/checkin/{token}",
    params(("token" = String, Path, description = "Check-in token from the confirmation email")),
    request_body(content_type = "multipart/form-data", description = "Identity, emergency contact, consents, signature and optional passportImage"),
    responses(
        (status = 200, description = "Check-in completed", body = CheckinCompleted),
        (status = 400, description = "Missing fields, invalid token or already completed", body = ErrorResponse),
        (status = 404, description = "Booking not found", body = ErrorResponse)
    ),
    tag = "Check-in"
)]
pub async fn submit_checkin(
    State(state): State<AppState>,
    Path(token): Path<String>,
    client: ClientInfo,
    multipart: Multipart,
) -> Result<Json<CheckinCompleted>, ServiceError> {
    let form = read_submission(multipart).await?;
    let completed = state
        .services
        .checkin
        .complete(&token, form, client, Utc::now())
        .await?;
    Ok(Json(completed))
}

fn is_checked(value: &str) -> bool {
    matches!(value.trim(), "true" | "on" | "1" | "yes")
}

async fn text(field: Field<'_>) -> Result<Option<String>, ServiceError> {
    let value = field
        .text()
        .await
        .map_err(|e| ServiceError::BadRequest(format!("Invalid form data: {}", e)))?;
    Ok(Some(value))
}

/// Maps the camelCase form fields onto a submission. Unknown fields are ignored.
async fn read_submission(mut multipart: Multipart) -> Result<CheckinSubmission, ServiceError> {
    let mut form = CheckinSubmission::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServiceError::BadRequest(format!("Invalid form data: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "nationality" => form.nationality = text(field).await?,
            "dateOfBirth" => form.date_of_birth = text(field).await?,
            "passportNumber" => form.passport_number = text(field).await?,
            "passportExpiry" => form.passport_expiry = text(field).await?,
            "emergencyName" => form.emergency_name = text(field).await?,
            "emergencyPhone" => form.emergency_phone = text(field).await?,
            "emergencyRelation" => form.emergency_relation = text(field).await?,
            "dietaryRestrictions" => form.dietary_restrictions = text(field).await?,
            "specialRequests" => form.special_requests = text(field).await?,
            "arrivalTime" => form.arrival_time = text(field).await?,
            "signatureDataUrl" => form.signature_data_url = text(field).await?,
            "rulesAccepted" => {
                form.rules_accepted = text(field).await?.as_deref().map(is_checked).unwrap_or(false)
            }
            "gdprConsent" => {
                form.gdpr_consent = text(field).await?.as_deref().map(is_checked).unwrap_or(false)
            }
            "passportImage" => {
                let file_name = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);
                let data = field.bytes().await.map_err(|e| {
                    ServiceError::BadRequest(format!("Passport image could not be read: {}", e))
                })?;
                if !data.is_empty() {
                    form.passport_image = Some(UploadedFile {
                        file_name,
                        content_type,
                        data,
                    });
                }
            }
            other => debug!("Ignoring unknown check-in field {}", other),
        }
    }

    Ok(form)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("true", true)]
    #[case("on", true)]
    #[case(" 1 ", true)]
    #[case("false", false)]
    #[case("", false)]
    fn checkbox_values(#[case] raw: &str, #[case] expected: bool) {
        assert_eq!(is_checked(raw), expected);
    }
}
