//! Stripe implementation of [`PaymentProvider`] via the REST API.
//!
//! Plain form posts against `api.stripe.com`, no SDK dependency. Only the
//! two calls the storefront needs are implemented.

use async_trait::async_trait;
use domain::Money;

use crate::error::PaymentError;
use crate::provider::{CheckoutSession, PaymentProvider, Refund, SessionRequest};

const API_BASE: &str = "https://api.stripe.com/v1";

/// Stripe-backed payment provider.
pub struct StripeProvider {
    client: reqwest::Client,
    secret_key: String,
    api_base: String,
}

impl StripeProvider {
    /// Creates a provider using the given secret key.
    pub fn new(secret_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            secret_key: secret_key.into(),
            api_base: API_BASE.to_string(),
        }
    }

    /// Overrides the API base URL. Used to point at a local stub.
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into();
        self
    }

    async fn post_form(
        &self,
        path: &str,
        params: &[(String, String)],
    ) -> Result<serde_json::Value, PaymentError> {
        let response = self
            .client
            .post(format!("{}{path}", self.api_base))
            .basic_auth(&self.secret_key, None::<&str>)
            .form(params)
            .send()
            .await?;

        let status = response.status();
        let body: serde_json::Value = response.json().await?;
        if !status.is_success() {
            let message = body["error"]["message"].as_str().unwrap_or("unknown error");
            return Err(PaymentError::Provider(format!(
                "{path} returned {status}: {message}"
            )));
        }
        Ok(body)
    }
}

fn require_str(body: &serde_json::Value, field: &str) -> Result<String, PaymentError> {
    body[field]
        .as_str()
        .map(String::from)
        .ok_or_else(|| PaymentError::Provider(format!("response missing `{field}`: {body}")))
}

#[async_trait]
impl PaymentProvider for StripeProvider {
    async fn create_checkout_session(
        &self,
        request: SessionRequest,
    ) -> Result<CheckoutSession, PaymentError> {
        let mut params: Vec<(String, String)> = vec![
            ("mode".into(), "payment".into()),
            ("customer_email".into(), request.customer_email),
            ("success_url".into(), request.success_url),
            ("cancel_url".into(), request.cancel_url),
            ("metadata[cart]".into(), request.cart_metadata),
        ];
        for (i, item) in request.line_items.iter().enumerate() {
            params.push((
                format!("line_items[{i}][price_data][currency]"),
                request.currency.clone(),
            ));
            params.push((
                format!("line_items[{i}][price_data][product_data][name]"),
                item.name.clone(),
            ));
            params.push((
                format!("line_items[{i}][price_data][unit_amount]"),
                item.unit_amount.minor().to_string(),
            ));
            params.push((format!("line_items[{i}][quantity]"), item.quantity.to_string()));
        }

        let body = self.post_form("/checkout/sessions", &params).await?;
        Ok(CheckoutSession {
            id: require_str(&body, "id")?,
            url: require_str(&body, "url")?,
        })
    }

    async fn create_refund(
        &self,
        payment_intent_id: &str,
        amount: Option<Money>,
        reason: Option<&str>,
    ) -> Result<Refund, PaymentError> {
        let mut params: Vec<(String, String)> =
            vec![("payment_intent".into(), payment_intent_id.to_string())];
        if let Some(amount) = amount {
            params.push(("amount".into(), amount.minor().to_string()));
        }
        if let Some(reason) = reason {
            params.push(("metadata[reason]".into(), reason.to_string()));
        }

        let body = self.post_form("/refunds", &params).await?;
        Ok(Refund {
            id: require_str(&body, "id")?,
            status: require_str(&body, "status")?,
        })
    }
}
