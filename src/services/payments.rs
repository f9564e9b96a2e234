use super::ExternalError;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::{info, instrument, warn};

/// Everything needed to open a hosted checkout page for one booking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSessionRequest {
    pub currency: String,
    pub unit_amount_cents: i64,
    pub product_name: String,
    pub product_description: String,
    pub customer_email: String,
    pub success_url: String,
    pub cancel_url: String,
    pub metadata: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    pub url: Option<String>,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_checkout_session(
        &self,
        request: CheckoutSessionRequest,
    ) -> Result<CheckoutSession, ExternalError>;
}

#[derive(Clone)]
pub struct StripeGateway {
    client: reqwest::Client,
    secret_key: String,
    api_base: String,
}

impl StripeGateway {
    pub fn new(client: reqwest::Client, secret_key: String, api_base: String) -> Self {
        Self {
            client,
            secret_key,
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }

    /// Flattens the request into Stripe's bracketed form encoding.
    pub fn form_params(request: &CheckoutSessionRequest) -> Vec<(String, String)> {
        let mut params = vec![
            ("mode".to_string(), "payment".to_string()),
            ("payment_method_types[0]".to_string(), "card".to_string()),
            ("line_items[0][quantity]".to_string(), "1".to_string()),
            (
                "line_items[0][price_data][currency]".to_string(),
                request.currency.clone(),
            ),
            (
                "line_items[0][price_data][unit_amount]".to_string(),
                request.unit_amount_cents.to_string(),
            ),
            (
                "line_items[0][price_data][product_data][name]".to_string(),
                request.product_name.clone(),
            ),
            (
                "line_items[0][price_data][product_data][description]".to_string(),
                request.product_description.clone(),
            ),
            ("customer_email".to_string(), request.customer_email.clone()),
            ("success_url".to_string(), request.success_url.clone()),
            ("cancel_url".to_string(), request.cancel_url.clone()),
        ];

        for (key, value) in &request.metadata {
            params.push((format!("metadata[{}]", key), value.clone()));
        }
        params
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    #[instrument(skip(self, request), fields(amount = request.unit_amount_cents))]
    async fn create_checkout_session(
        &self,
        request: CheckoutSessionRequest,
    ) -> Result<CheckoutSession, ExternalError> {
        let params = Self::form_params(&request);

        let response = self
            .client
            .post(format!("{}/v1/checkout/sessions", self.api_base))
            .basic_auth(&self.secret_key, Some(""))
            .form(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            let err = ExternalError::from_response("stripe", response).await;
            warn!("Stripe API error: {}", err);
            return Err(err);
        }

        let session: CheckoutSession = response
            .json()
            .await
            .map_err(|e| ExternalError::InvalidResponse(format!("Failed to parse Stripe response: {}", e)))?;

        info!("Checkout session created: {}", session.id);
        Ok(session)
    }
}

/// Stand-in when no Stripe key is configured.
#[derive(Debug, Clone, Default)]
pub struct UnconfiguredGateway;

#[async_trait]
impl PaymentGateway for UnconfiguredGateway {
    async fn create_checkout_session(
        &self,
        _request: CheckoutSessionRequest,
    ) -> Result<CheckoutSession, ExternalError> {
        Err(ExternalError::NotConfigured("stripe"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request() -> CheckoutSessionRequest {
        let mut metadata = BTreeMap::new();
        metadata.insert("booking_id".to_string(), "b-1".to_string());
        CheckoutSessionRequest {
            currency: "usd".into(),
            unit_amount_cents: 3600,
            product_name: "4-Bed Mixed Dorm - 3 nights".into(),
            product_description: "Check-in: 2025-03-10 | Check-out: 2025-03-13 | Guests: 1".into(),
            customer_email: "ana@example.com".into(),
            success_url: "http://localhost:3000/booking/success?session_id={CHECKOUT_SESSION_ID}".into(),
            cancel_url: "http://localhost:3000/booking/cancel".into(),
            metadata,
        }
    }

    #[test]
    fn form_params_use_bracketed_keys() {
        let params = StripeGateway::form_params(&request());
        assert!(params.contains(&(
            "line_items[0][price_data][unit_amount]".to_string(),
            "3600".to_string()
        )));
        assert!(params.contains(&("metadata[booking_id]".to_string(), "b-1".to_string())));
        assert!(params.contains(&("mode".to_string(), "payment".to_string())));
    }

    #[tokio::test]
    async fn creates_session_with_basic_auth() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/checkout/sessions"))
            .and(header_exists("authorization"))
            .and(body_string_contains("metadata%5Bbooking_id%5D=b-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "cs_test_123",
                "url": "https://checkout.stripe.com/c/pay/cs_test_123"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let gateway = StripeGateway::new(reqwest::Client::new(), "sk_test".into(), server.uri());
        let session = gateway.create_checkout_session(request()).await.unwrap();
        assert_eq!(session.id, "cs_test_123");
        assert_eq!(
            session.url.as_deref(),
            Some("https://checkout.stripe.com/c/pay/cs_test_123")
        );
    }

    #[tokio::test]
    async fn declined_request_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(402).set_body_json(json!({"error": {"message": "nope"}})))
            .mount(&server)
            .await;

        let gateway = StripeGateway::new(reqwest::Client::new(), "sk_test".into(), server.uri());
        let err = gateway.create_checkout_session(request()).await.unwrap_err();
        assert_matches!(err, ExternalError::Status { status: 402, .. });
    }
}
