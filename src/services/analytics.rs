use super::ExternalError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, instrument};

#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsEvent {
    pub event: String,
    pub distinct_id: String,
    pub properties: Value,
    pub timestamp: DateTime<Utc>,
}

#[async_trait]
pub trait AnalyticsSink: Send + Sync {
    async fn capture(&self, event: AnalyticsEvent) -> Result<(), ExternalError>;
}

/// PostHog capture API client
#[derive(Clone)]
pub struct PostHogSink {
    client: reqwest::Client,
    api_key: String,
    host: String,
}

impl PostHogSink {
    pub fn new(client: reqwest::Client, api_key: String, host: String) -> Self {
        Self {
            client,
            api_key,
            host: host.trim_end_matches('/').to_string(),
        }
    }
}

#[derive(Serialize)]
struct CapturePayload<'a> {
    api_key: &'a str,
    event: &'a str,
    distinct_id: &'a str,
    properties: &'a Value,
    timestamp: String,
}

#[async_trait]
impl AnalyticsSink for PostHogSink {
    #[instrument(skip(self, event), fields(event = %event.event))]
    async fn capture(&self, event: AnalyticsEvent) -> Result<(), ExternalError> {
        let payload = CapturePayload {
            api_key: &self.api_key,
            event: &event.event,
            distinct_id: &event.distinct_id,
            properties: &event.properties,
            timestamp: event.timestamp.to_rfc3339(),
        };

        let response = self
            .client
            .post(format!("{}/capture/", self.host))
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ExternalError::from_response("posthog", response).await);
        }
        Ok(())
    }
}

/// Used when no analytics key is configured.
#[derive(Debug, Clone, Default)]
pub struct NoopSink;

#[async_trait]
impl AnalyticsSink for NoopSink {
    async fn capture(&self, event: AnalyticsEvent) -> Result<(), ExternalError> {
        debug!(event = %event.event, "Analytics disabled, event discarded");
        Ok(())
    }
}

#[cfg(test)]
#[derive(Default)]
pub struct RecordingSink {
    events: std::sync::Mutex<Vec<AnalyticsEvent>>,
}

#[cfg(test)]
impl RecordingSink {
    pub fn events(&self) -> Vec<AnalyticsEvent> {
        self.events.lock().unwrap().clone()
    }
}

#[cfg(test)]
#[async_trait]
impl AnalyticsSink for RecordingSink {
    async fn capture(&self, event: AnalyticsEvent) -> Result<(), ExternalError> {
        self.events.lock().unwrap().push(event);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn event() -> AnalyticsEvent {
        AnalyticsEvent {
            event: "checkout_created".into(),
            distinct_id: "guest@example.com".into(),
            properties: json!({ "nights": 3 }),
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn posts_capture_payload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/capture/"))
            .and(body_partial_json(json!({
                "api_key": "phc_test",
                "event": "checkout_created",
                "distinct_id": "guest@example.com",
                "properties": { "nights": 3 }
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let sink = PostHogSink::new(reqwest::Client::new(), "phc_test".into(), server.uri());
        sink.capture(event()).await.unwrap();
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
            .mount(&server)
            .await;

        let sink = PostHogSink::new(reqwest::Client::new(), "phc_test".into(), server.uri());
        let err = sink.capture(event()).await.unwrap_err();
        assert_matches!(err, ExternalError::Status { status: 401, .. });
    }
}
