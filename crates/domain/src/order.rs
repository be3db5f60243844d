//! Order entity with purchase-time line-item snapshots.

use chrono::{DateTime, Utc};
use common::{OrderId, ProductId, UserId};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::status::{OrderStatus, PaymentStatus, StatusHistoryEntry};

/// A line item as captured at purchase time.
///
/// Name and unit price are snapshots, not references into the live
/// catalog: deleting or repricing a product must not corrupt history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub product_id: ProductId,
    pub name: String,
    pub quantity: u32,
    pub unit_price: Money,
}

impl LineItem {
    /// Returns the total for this line (quantity × unit price).
    pub fn total(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }
}

/// A postal address snapshot attached to an order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub name: String,
    pub line1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line2: Option<String>,
    pub city: String,
    pub postal_code: String,
    pub country: String,
}

/// A customer order.
///
/// Minted only by the payment event handler on confirmed payment and
/// mutated afterwards through the lifecycle operations; `total` is fixed
/// at creation and `status_history` is append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub order_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    pub customer_email: String,
    pub items: Vec<LineItem>,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_intent_id: Option<String>,
    pub status_history: Vec<StatusHistoryEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipping_address: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub billing_address: Option<Address>,
    pub total: Money,
    pub currency: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracking_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancelled_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancellation_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipped_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivered_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refund_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refund_amount: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refunded_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Returns true if the given user owns this order.
    pub fn is_owned_by(&self, user: UserId) -> bool {
        self.user_id == Some(user)
    }
}

/// Fields the payment event handler supplies when minting an order.
///
/// Id, order number, and timestamps are generated by the order store.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: Option<UserId>,
    pub customer_email: String,
    pub items: Vec<LineItem>,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub session_id: Option<String>,
    pub payment_intent_id: Option<String>,
    pub status_history: Vec<StatusHistoryEntry>,
    pub shipping_address: Option<Address>,
    pub billing_address: Option<Address>,
    pub total: Money,
    pub currency: String,
    pub payment_date: Option<DateTime<Utc>>,
}

impl NewOrder {
    /// Materializes the order with the given identity and timestamps.
    pub fn into_order(self, id: OrderId, order_number: String, now: DateTime<Utc>) -> Order {
        Order {
            id,
            order_number,
            user_id: self.user_id,
            customer_email: self.customer_email,
            items: self.items,
            status: self.status,
            payment_status: self.payment_status,
            session_id: self.session_id,
            payment_intent_id: self.payment_intent_id,
            status_history: self.status_history,
            shipping_address: self.shipping_address,
            billing_address: self.billing_address,
            total: self.total,
            currency: self.currency,
            tracking_number: None,
            cancelled_at: None,
            cancellation_reason: None,
            shipped_at: None,
            delivered_at: None,
            refund_id: None,
            refund_amount: None,
            refunded_at: None,
            payment_date: self.payment_date,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update applied through the order store; `None` leaves the
/// field unchanged. Status-history entries are appended, never replaced.
#[derive(Debug, Clone, Default)]
pub struct OrderUpdate {
    pub status: Option<OrderStatus>,
    pub payment_status: Option<PaymentStatus>,
    pub append_history: Option<StatusHistoryEntry>,
    pub tracking_number: Option<String>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub cancellation_reason: Option<String>,
    pub shipped_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub refund_id: Option<String>,
    pub refund_amount: Option<Money>,
    pub refunded_at: Option<DateTime<Utc>>,
}

impl OrderUpdate {
    /// Applies the update in place and bumps `updated_at`.
    pub fn apply_to(self, order: &mut Order) {
        if let Some(status) = self.status {
            order.status = status;
        }
        if let Some(payment_status) = self.payment_status {
            order.payment_status = payment_status;
        }
        if let Some(entry) = self.append_history {
            order.status_history.push(entry);
        }
        if let Some(tracking_number) = self.tracking_number {
            order.tracking_number = Some(tracking_number);
        }
        if let Some(cancelled_at) = self.cancelled_at {
            order.cancelled_at = Some(cancelled_at);
        }
        if let Some(reason) = self.cancellation_reason {
            order.cancellation_reason = Some(reason);
        }
        if let Some(shipped_at) = self.shipped_at {
            order.shipped_at = Some(shipped_at);
        }
        if let Some(delivered_at) = self.delivered_at {
            order.delivered_at = Some(delivered_at);
        }
        if let Some(refund_id) = self.refund_id {
            order.refund_id = Some(refund_id);
        }
        if let Some(refund_amount) = self.refund_amount {
            order.refund_amount = Some(refund_amount);
        }
        if let Some(refunded_at) = self.refunded_at {
            order.refunded_at = Some(refunded_at);
        }
        order.updated_at = Utc::now();
    }
}

const ORDER_NUMBER_CHARSET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Generates a human-readable order number.
///
/// Timestamp-plus-random, collision-resistant for display purposes only;
/// the order store retries on the rare collision.
pub fn generate_order_number() -> String {
    let millis = Utc::now().timestamp_millis() % 1_000_000;
    let mut rng = rand::thread_rng();
    let suffix: String = (0..4)
        .map(|_| {
            let idx = rng.gen_range(0..ORDER_NUMBER_CHARSET.len());
            ORDER_NUMBER_CHARSET[idx] as char
        })
        .collect();
    format!("ORD-{millis:06}{suffix}")
}
