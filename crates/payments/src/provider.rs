//! Payment provider trait and request/response types.

use async_trait::async_trait;
use domain::Money;

use crate::error::PaymentError;

/// One display line in a hosted checkout session.
///
/// `unit_amount` is in minor currency units, matching the provider's wire
/// format; the quantity is repeated to the provider so the session mirrors
/// the cart exactly.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionLineItem {
    pub name: String,
    pub unit_amount: Money,
    pub quantity: u32,
}

/// Everything needed to create a hosted checkout session.
#[derive(Debug, Clone)]
pub struct SessionRequest {
    pub line_items: Vec<SessionLineItem>,
    pub currency: String,
    pub customer_email: String,
    pub success_url: String,
    pub cancel_url: String,
    /// Opaque payload round-tripped through the provider and returned in
    /// the completion webhook. The provider stores it verbatim.
    pub cart_metadata: String,
}

/// A created checkout session: the id we key idempotency on and the URL
/// the customer is redirected to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSession {
    pub id: String,
    pub url: String,
}

/// A refund issued against a payment intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Refund {
    pub id: String,
    pub status: String,
}

/// The payment provider seam.
///
/// The workflow code is written against this trait; production wires in
/// [`crate::StripeProvider`], tests wire in [`crate::InMemoryProvider`].
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Creates a hosted checkout session.
    async fn create_checkout_session(
        &self,
        request: SessionRequest,
    ) -> Result<CheckoutSession, PaymentError>;

    /// Refunds a payment. `amount = None` refunds the full charge.
    async fn create_refund(
        &self,
        payment_intent_id: &str,
        amount: Option<Money>,
        reason: Option<&str>,
    ) -> Result<Refund, PaymentError>;
}
