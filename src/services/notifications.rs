use super::email_templates::{self, BookingDetails, RenderedEmail};
use super::ExternalError;
use crate::config::AppConfig;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use metrics::counter;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmailMessage {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub html: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,
}

#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, message: EmailMessage) -> Result<(), ExternalError>;
}

/// Resend transactional email API client
#[derive(Clone)]
pub struct ResendEmailSender {
    client: reqwest::Client,
    api_key: String,
    api_base: String,
}

impl ResendEmailSender {
    pub fn new(client: reqwest::Client, api_key: String, api_base: String) -> Self {
        Self {
            client,
            api_key,
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl EmailSender for ResendEmailSender {
    #[instrument(skip(self, message), fields(subject = %message.subject))]
    async fn send(&self, message: EmailMessage) -> Result<(), ExternalError> {
        let response = self
            .client
            .post(format!("{}/emails", self.api_base))
            .bearer_auth(&self.api_key)
            .json(&message)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ExternalError::from_response("resend", response).await);
        }
        Ok(())
    }
}

/// Renders and delivers the service's emails.
///
/// Without a configured sender every delivery is skipped and reported as not sent.
#[derive(Clone)]
pub struct Notifier {
    sender: Option<Arc<dyn EmailSender>>,
    from: String,
    hostel_name: String,
    hostel_email: String,
}

impl Notifier {
    pub fn new(sender: Option<Arc<dyn EmailSender>>, config: &AppConfig) -> Self {
        Self {
            sender,
            from: config.email_from.clone(),
            hostel_name: config.hostel_name.clone(),
            hostel_email: config.hostel_email.clone(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.sender.is_some()
    }

    /// Returns `Ok(false)` when email is not configured.
    pub async fn deliver(
        &self,
        to: &str,
        email: RenderedEmail,
        reply_to: Option<&str>,
    ) -> Result<bool, ExternalError> {
        let Some(sender) = &self.sender else {
            info!(subject = %email.subject, "Email skipped, no provider configured");
            return Ok(false);
        };

        let result = sender
            .send(EmailMessage {
                from: self.from.clone(),
                to: vec![to.to_string()],
                subject: email.subject,
                html: email.html,
                reply_to: reply_to.map(str::to_string),
            })
            .await;

        match &result {
            Ok(()) => {
                counter!("hostel_emails.sent", 1);
            }
            Err(e) => {
                counter!("hostel_emails.failed", 1);
                warn!("Email delivery failed: {}", e);
            }
        }
        result.map(|_| true)
    }

    /// Hostel notification plus guest acknowledgement. Failures never propagate.
    pub async fn booking_requested(&self, details: &BookingDetails) -> bool {
        let hostel = self
            .deliver(
                &self.hostel_email,
                email_templates::hostel_booking_notification(details),
                Some(&details.guest_email),
            )
            .await;
        let guest = self
            .deliver(
                &details.guest_email,
                email_templates::guest_booking_received(&self.hostel_name, &self.hostel_email, details),
                None,
            )
            .await;
        matches!((hostel, guest), (Ok(true), Ok(true)))
    }

    pub async fn payment_confirmed(&self, details: &BookingDetails, checkin_link: &str) -> bool {
        let hostel = self
            .deliver(
                &self.hostel_email,
                email_templates::hostel_payment_received(details),
                Some(&details.guest_email),
            )
            .await;
        let guest = self
            .deliver(
                &details.guest_email,
                email_templates::guest_payment_confirmed(
                    &self.hostel_name,
                    &self.hostel_email,
                    details,
                    checkin_link,
                ),
                None,
            )
            .await;
        matches!((hostel, guest), (Ok(true), Ok(true)))
    }

    pub async fn checkin_reminder(
        &self,
        details: &BookingDetails,
        checkin_link: &str,
    ) -> Result<bool, ExternalError> {
        self.deliver(
            &details.guest_email,
            email_templates::checkin_reminder(&self.hostel_name, details, checkin_link),
            None,
        )
        .await
    }

    pub async fn checkout_reminder(
        &self,
        guest_email: &str,
        guest_name: &str,
    ) -> Result<bool, ExternalError> {
        self.deliver(
            guest_email,
            email_templates::checkout_reminder(&self.hostel_name, guest_name),
            None,
        )
        .await
    }

    pub async fn staff_invitation(
        &self,
        email: &str,
        role: &str,
        accept_link: &str,
        message: Option<&str>,
        expires_at: DateTime<Utc>,
    ) -> Result<bool, ExternalError> {
        self.deliver(
            email,
            email_templates::staff_invitation(&self.hostel_name, role, accept_link, message, expires_at),
            Some(&self.hostel_email),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::mock;
    use mockall::predicate::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    mock! {
        Sender {}

        #[async_trait]
        impl EmailSender for Sender {
            async fn send(&self, message: EmailMessage) -> Result<(), ExternalError>;
        }
    }

    fn config() -> AppConfig {
        AppConfig::new("sqlite::memory:".into(), "k".repeat(64), "development".into())
    }

    #[tokio::test]
    async fn resend_posts_json_with_bearer_key() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/emails"))
            .and(header("authorization", "Bearer re_test"))
            .and(body_partial_json(json!({
                "to": ["guest@example.com"],
                "subject": "Hello",
                "reply_to": "info@mandiocahostel.com"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "em_1"})))
            .expect(1)
            .mount(&server)
            .await;

        let sender = ResendEmailSender::new(reqwest::Client::new(), "re_test".into(), server.uri());
        sender
            .send(EmailMessage {
                from: "Mandioca Hostel <bookings@mandiocahostel.com>".into(),
                to: vec!["guest@example.com".into()],
                subject: "Hello".into(),
                html: "<p>Hi</p>".into(),
                reply_to: Some("info@mandiocahostel.com".into()),
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn unconfigured_notifier_skips_delivery() {
        let notifier = Notifier::new(None, &config());
        let sent = notifier
            .checkout_reminder("guest@example.com", "Ana")
            .await
            .unwrap();
        assert!(!sent);
        assert!(!notifier.is_configured());
    }

    #[tokio::test]
    async fn booking_request_emails_hostel_then_guest() {
        let mut sender = MockSender::new();
        sender
            .expect_send()
            .with(function(|m: &EmailMessage| {
                m.to == vec!["info@mandiocahostel.com".to_string()]
                    && m.reply_to.as_deref() == Some("ana@example.com")
            }))
            .times(1)
            .returning(|_| Ok(()));
        sender
            .expect_send()
            .with(function(|m: &EmailMessage| m.to == vec!["ana@example.com".to_string()]))
            .times(1)
            .returning(|_| {
                Err(ExternalError::Status {
                    service: "resend",
                    status: 500,
                    body: "down".into(),
                })
            });

        let notifier = Notifier::new(Some(Arc::new(sender)), &config());
        let details = BookingDetails {
            guest_name: "Ana".into(),
            guest_email: "ana@example.com".into(),
            guest_phone: Some("+595 981 000000".into()),
            room_name: "Private Double Room".into(),
            check_in: chrono::NaiveDate::from_ymd_opt(2025, 5, 1).unwrap(),
            check_out: chrono::NaiveDate::from_ymd_opt(2025, 5, 3).unwrap(),
            nights: 2,
            guest_count: 2,
            total: rust_decimal_macros::dec!(70.00),
            special_requests: None,
        };

        assert!(!notifier.booking_requested(&details).await);
    }
}
