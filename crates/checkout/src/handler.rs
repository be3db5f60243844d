//! Payment webhook processing: order creation and stock decrement.

use std::sync::Arc;

use domain::{
    Actor, CartMetadata, LineItem, MetadataError, Money, NewOrder, OrderStatus, OrderUpdate,
    PaymentStatus, StatusHistoryEntry,
};
use payments::{CompletedSession, WebhookEvent};
use store::{Catalog, Orders};

use crate::error::Result;

/// What processing an event amounted to. Drives logging and the caller's
/// metrics; every variant is acknowledged with success upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handled {
    /// A new order was created from a completed session.
    OrderCreated(common::OrderId),
    /// An existing order's payment status changed.
    Updated(common::OrderId),
    /// The session already produced an order; nothing was done.
    Duplicate(common::OrderId),
    /// Unrecognized event type or no matching order.
    Ignored,
}

/// Turns verified provider events into order-store writes.
///
/// Signature verification happens at the HTTP boundary against the raw
/// payload; by the time an event reaches [`handle`](Self::handle) it is
/// authentic.
pub struct PaymentEventHandler<C, O> {
    catalog: Arc<C>,
    orders: Arc<O>,
}

impl<C, O> PaymentEventHandler<C, O>
where
    C: Catalog,
    O: Orders,
{
    /// Creates a new handler.
    pub fn new(catalog: Arc<C>, orders: Arc<O>) -> Self {
        Self { catalog, orders }
    }

    /// Processes one verified event.
    ///
    /// Errors on recognized events propagate so the provider retries the
    /// delivery; duplicates are suppressed only by the session-id check.
    #[tracing::instrument(skip(self, event), fields(event_type = event.type_name()))]
    pub async fn handle(&self, event: WebhookEvent) -> Result<Handled> {
        metrics::counter!("webhook_events_total").increment(1);
        match event {
            WebhookEvent::CheckoutCompleted(session) => self.on_session_completed(session).await,
            WebhookEvent::PaymentSucceeded { payment_intent_id } => {
                self.on_payment_result(&payment_intent_id, PaymentStatus::Paid).await
            }
            WebhookEvent::PaymentFailed { payment_intent_id } => {
                self.on_payment_result(&payment_intent_id, PaymentStatus::Failed).await
            }
            WebhookEvent::Other(event_type) => {
                tracing::debug!(%event_type, "ignoring unhandled event type");
                Ok(Handled::Ignored)
            }
        }
    }

    async fn on_session_completed(&self, session: CompletedSession) -> Result<Handled> {
        // One order per session, no matter how many times the event lands.
        if let Some(existing) = self.orders.find_by_session(&session.session_id).await? {
            tracing::info!(
                session_id = %session.session_id,
                order_id = %existing.id,
                "duplicate completed session"
            );
            return Ok(Handled::Duplicate(existing.id));
        }

        let raw = session
            .metadata
            .get("cart")
            .ok_or(MetadataError::Missing)?;
        let cart = CartMetadata::decode(raw)?;

        let mut items = Vec::with_capacity(cart.items.len());
        for item in &cart.items {
            // A product deleted between checkout and payment is skipped;
            // the customer paid for it, which is for support to resolve.
            match self.catalog.get(item.product_id).await? {
                Some(product) => items.push(LineItem {
                    product_id: product.id,
                    name: product.name,
                    quantity: item.quantity,
                    unit_price: product.price,
                }),
                None => tracing::warn!(
                    product_id = %item.product_id,
                    session_id = %session.session_id,
                    "product missing at payment time, line skipped"
                ),
            }
        }

        let order = self
            .orders
            .create(NewOrder {
                user_id: cart.user_id,
                customer_email: cart.email,
                items: items.clone(),
                status: OrderStatus::Processing,
                payment_status: PaymentStatus::Paid,
                session_id: Some(session.session_id.clone()),
                payment_intent_id: session.payment_intent_id,
                status_history: vec![StatusHistoryEntry::now(
                    OrderStatus::Processing,
                    Actor::System,
                    Some("payment confirmed".to_string()),
                )],
                shipping_address: cart.shipping_address,
                billing_address: cart.billing_address,
                total: Money::from_minor(session.amount_total),
                currency: session.currency,
                payment_date: Some(chrono::Utc::now()),
            })
            .await?;

        for item in &items {
            self.catalog
                .decrement_stock(item.product_id, item.quantity)
                .await?;
        }

        metrics::counter!("orders_created_total").increment(1);
        tracing::info!(
            order_id = %order.id,
            order_number = %order.order_number,
            session_id = %session.session_id,
            "order created from completed session"
        );
        Ok(Handled::OrderCreated(order.id))
    }

    async fn on_payment_result(
        &self,
        payment_intent_id: &str,
        result: PaymentStatus,
    ) -> Result<Handled> {
        let Some(order) = self.orders.find_by_payment_intent(payment_intent_id).await? else {
            tracing::debug!(%payment_intent_id, "no order for payment intent");
            return Ok(Handled::Ignored);
        };

        let update = match result {
            PaymentStatus::Paid => OrderUpdate {
                payment_status: Some(PaymentStatus::Paid),
                status: Some(OrderStatus::Processing),
                ..Default::default()
            },
            PaymentStatus::Failed => OrderUpdate {
                payment_status: Some(PaymentStatus::Failed),
                status: Some(OrderStatus::Cancelled),
                append_history: Some(StatusHistoryEntry::now(
                    OrderStatus::Cancelled,
                    Actor::System,
                    Some("payment failed".to_string()),
                )),
                ..Default::default()
            },
            PaymentStatus::Unpaid => return Ok(Handled::Ignored),
        };

        let updated = self.orders.update(order.id, update).await?;
        tracing::info!(
            order_id = %updated.id,
            payment_status = %updated.payment_status,
            "payment status updated"
        );
        Ok(Handled::Updated(updated.id))
    }
}
