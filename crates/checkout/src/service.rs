//! Checkout initiation: cart validation and session creation.

use std::sync::Arc;

use common::UserId;
use domain::{Address, CartItem, CartMetadata, Money};
use payments::{PaymentProvider, SessionLineItem, SessionRequest};
use store::Catalog;

use crate::error::{CheckoutError, Result};

/// Pricing and redirect settings for checkout sessions.
#[derive(Debug, Clone)]
pub struct CheckoutConfig {
    /// Lowercase ISO currency code, e.g. `"gbp"`.
    pub currency: String,
    /// Orders at or above this subtotal ship free.
    pub free_shipping_threshold: Money,
    /// Flat shipping charge below the threshold.
    pub standard_shipping: Money,
    pub success_url: String,
    pub cancel_url: String,
}

/// A checkout request from an authenticated user or a guest.
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub items: Vec<CartItem>,
    /// Explicit email; guests must supply one.
    pub email: Option<String>,
    /// Present when the caller is authenticated. The email is taken from
    /// the token when the request carries none.
    pub user: Option<(UserId, String)>,
    pub shipping_address: Option<Address>,
    pub billing_address: Option<Address>,
}

/// Where to send the customer to pay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutRedirect {
    pub session_id: String,
    pub url: String,
}

/// Validates carts and opens hosted payment sessions.
///
/// Creates no orders and mutates no stock; everything downstream happens
/// in [`crate::PaymentEventHandler`] once payment is confirmed.
pub struct CheckoutService<C, P> {
    catalog: Arc<C>,
    provider: Arc<P>,
    config: CheckoutConfig,
}

impl<C, P> CheckoutService<C, P>
where
    C: Catalog,
    P: PaymentProvider,
{
    /// Creates a new checkout service.
    pub fn new(catalog: Arc<C>, provider: Arc<P>, config: CheckoutConfig) -> Self {
        Self {
            catalog,
            provider,
            config,
        }
    }

    /// Validates the cart and opens a payment session.
    ///
    /// Every line is checked against the live catalog; any failure aborts
    /// the whole checkout before the provider is contacted.
    #[tracing::instrument(skip(self, request), fields(lines = request.items.len()))]
    pub async fn begin(&self, request: CheckoutRequest) -> Result<CheckoutRedirect> {
        if request.items.is_empty() {
            return Err(CheckoutError::Validation("cart is empty".to_string()));
        }

        let email = request
            .email
            .clone()
            .or_else(|| request.user.as_ref().map(|(_, email)| email.clone()))
            .ok_or_else(|| CheckoutError::Validation("no email for checkout".to_string()))?;

        let mut line_items = Vec::with_capacity(request.items.len() + 1);
        let mut subtotal = Money::zero();
        for item in &request.items {
            if item.quantity == 0 {
                return Err(CheckoutError::Validation(format!(
                    "zero quantity for product {}",
                    item.product_id
                )));
            }
            let product = self
                .catalog
                .get(item.product_id)
                .await?
                .ok_or_else(|| {
                    CheckoutError::Validation(format!("unknown product {}", item.product_id))
                })?;
            if !product.available {
                return Err(CheckoutError::Validation(format!(
                    "product not available: {}",
                    product.name
                )));
            }
            if product.stock < item.quantity {
                return Err(CheckoutError::Validation(format!(
                    "insufficient stock for {}: {} requested, {} available",
                    product.name, item.quantity, product.stock
                )));
            }
            subtotal += product.price.multiply(item.quantity);
            line_items.push(SessionLineItem {
                name: product.name,
                unit_amount: product.price,
                quantity: item.quantity,
            });
        }

        if subtotal < self.config.free_shipping_threshold {
            line_items.push(SessionLineItem {
                name: "Shipping".to_string(),
                unit_amount: self.config.standard_shipping,
                quantity: 1,
            });
        }

        let metadata = CartMetadata {
            shipping_address: request.shipping_address,
            billing_address: request.billing_address,
            ..CartMetadata::new(
                request.items,
                email.clone(),
                request.user.map(|(id, _)| id),
            )
        };

        let session = self
            .provider
            .create_checkout_session(SessionRequest {
                line_items,
                currency: self.config.currency.clone(),
                customer_email: email,
                success_url: self.config.success_url.clone(),
                cancel_url: self.config.cancel_url.clone(),
                cart_metadata: metadata.encode()?,
            })
            .await?;

        metrics::counter!("checkout_sessions_total").increment(1);
        tracing::info!(session_id = %session.id, "checkout session created");

        Ok(CheckoutRedirect {
            session_id: session.id,
            url: session.url,
        })
    }
}
