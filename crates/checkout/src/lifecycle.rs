//! Post-creation order transitions: cancel, status updates, refunds.

use std::sync::Arc;

use chrono::Utc;
use common::{OrderId, UserId};
use domain::{Actor, Money, Order, OrderStatus, OrderUpdate, StatusHistoryEntry};
use payments::PaymentProvider;
use store::{Catalog, Orders};

use crate::error::{CheckoutError, Result};

/// Drives order state changes after the payment event handler has minted
/// the order.
pub struct OrderLifecycle<C, O, P> {
    catalog: Arc<C>,
    orders: Arc<O>,
    provider: Arc<P>,
}

impl<C, O, P> OrderLifecycle<C, O, P>
where
    C: Catalog,
    O: Orders,
    P: PaymentProvider,
{
    /// Creates a new lifecycle manager.
    pub fn new(catalog: Arc<C>, orders: Arc<O>, provider: Arc<P>) -> Self {
        Self {
            catalog,
            orders,
            provider,
        }
    }

    /// Cancels an order and restores its stock.
    ///
    /// Only `pending` and `processing` orders can be cancelled; customers
    /// may only cancel their own.
    #[tracing::instrument(skip(self), fields(%order_id))]
    pub async fn cancel(
        &self,
        order_id: OrderId,
        actor: Actor,
        reason: Option<String>,
    ) -> Result<Order> {
        let order = self.load(order_id).await?;
        authorize(&order, actor)?;

        if !order.status.is_cancellable() {
            return Err(CheckoutError::Conflict(format!(
                "cannot cancel order in {} status",
                order.status
            )));
        }

        // Stock goes back before the status flips; a deleted product just
        // drops its quantity.
        for item in &order.items {
            self.catalog
                .restore_stock(item.product_id, item.quantity)
                .await?;
        }

        let updated = self
            .orders
            .update(
                order_id,
                OrderUpdate {
                    status: Some(OrderStatus::Cancelled),
                    cancelled_at: Some(Utc::now()),
                    cancellation_reason: reason.clone(),
                    append_history: Some(StatusHistoryEntry::now(
                        OrderStatus::Cancelled,
                        actor,
                        reason,
                    )),
                    ..Default::default()
                },
            )
            .await?;

        metrics::counter!("order_cancellations_total").increment(1);
        tracing::info!(order_number = %updated.order_number, "order cancelled");
        Ok(updated)
    }

    /// Admin status update with optional tracking number and note.
    ///
    /// `shipped` and `delivered` stamp their timestamps; stock is never
    /// touched here.
    #[tracing::instrument(skip(self, note), fields(%order_id, target = %target))]
    pub async fn update_status(
        &self,
        order_id: OrderId,
        target: OrderStatus,
        admin: UserId,
        tracking_number: Option<String>,
        note: Option<String>,
    ) -> Result<Order> {
        // Existence check up front so a bad id is a 404, not a blind write.
        self.load(order_id).await?;

        let now = Utc::now();
        let updated = self
            .orders
            .update(
                order_id,
                OrderUpdate {
                    status: Some(target),
                    shipped_at: (target == OrderStatus::Shipped).then_some(now),
                    delivered_at: (target == OrderStatus::Delivered).then_some(now),
                    tracking_number,
                    append_history: Some(StatusHistoryEntry::now(
                        target,
                        Actor::Admin(admin),
                        note,
                    )),
                    ..Default::default()
                },
            )
            .await?;

        tracing::info!(order_number = %updated.order_number, "order status updated");
        Ok(updated)
    }

    /// Refunds a payment, fully (`amount = None`) or partially.
    ///
    /// The order is located by payment intent. Stock is deliberately not
    /// restored on refund; only cancellation returns inventory.
    #[tracing::instrument(skip(self, reason), fields(%payment_intent_id))]
    pub async fn refund(
        &self,
        payment_intent_id: &str,
        amount: Option<Money>,
        reason: Option<String>,
        actor: Actor,
    ) -> Result<Order> {
        let order = self
            .orders
            .find_by_payment_intent(payment_intent_id)
            .await?
            .ok_or_else(|| CheckoutError::PaymentIntentNotFound(payment_intent_id.to_string()))?;
        authorize(&order, actor)?;

        let refund = self
            .provider
            .create_refund(payment_intent_id, amount, reason.as_deref())
            .await?;

        let full = amount.is_none_or(|a| a >= order.total);
        let status = if full {
            OrderStatus::Refunded
        } else {
            OrderStatus::PartiallyRefunded
        };
        let refund_amount = amount.unwrap_or(order.total);

        let updated = self
            .orders
            .update(
                order.id,
                OrderUpdate {
                    status: Some(status),
                    refund_id: Some(refund.id),
                    refund_amount: Some(refund_amount),
                    refunded_at: Some(Utc::now()),
                    append_history: Some(StatusHistoryEntry::now(status, actor, reason)),
                    ..Default::default()
                },
            )
            .await?;

        metrics::counter!("refunds_total").increment(1);
        tracing::info!(
            order_number = %updated.order_number,
            amount = %refund_amount,
            full,
            "refund issued"
        );
        Ok(updated)
    }

    async fn load(&self, order_id: OrderId) -> Result<Order> {
        self.orders
            .get(order_id)
            .await?
            .ok_or(CheckoutError::OrderNotFound(order_id))
    }
}

fn authorize(order: &Order, actor: Actor) -> Result<()> {
    if let Actor::Customer(user) = actor
        && !order.is_owned_by(user)
    {
        return Err(CheckoutError::Authorization(
            "order belongs to another customer".to_string(),
        ));
    }
    Ok(())
}
