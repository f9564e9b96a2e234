// Booking funnel
pub mod bookings;
pub mod pricing;
pub mod payment_events;
pub mod checkin;
pub mod reminders;

// Admin console
pub mod content;
pub mod invitations;
pub mod rooms;

// External providers
pub mod analytics;
pub mod email_templates;
pub mod notifications;
pub mod payments;
pub mod storage;

use thiserror::Error;

/// Failure talking to an outbound provider (payments, email, storage, analytics).
#[derive(Debug, Error)]
pub enum ExternalError {
    #[error("{0} is not configured")]
    NotConfigured(&'static str),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{service} returned {status}: {body}")]
    Status {
        service: &'static str,
        status: u16,
        body: String,
    },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl ExternalError {
    /// Reads a failed response into a `Status` error, keeping the body for the logs.
    pub async fn from_response(service: &'static str, response: reqwest::Response) -> Self {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        ExternalError::Status {
            service,
            status,
            body,
        }
    }
}

/// Shared outbound HTTP client with the configured timeout.
pub fn http_client(timeout_secs: u64) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}
