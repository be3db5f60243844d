//! Order store: orders collection.

use std::path::Path;

use async_trait::async_trait;
use chrono::Utc;
use common::{OrderId, UserId};
use domain::{NewOrder, Order, OrderUpdate, generate_order_number};

use crate::collection::JsonCollection;
use crate::error::{Result, StoreError};

/// The order persistence interface.
///
/// Lookups by provider identifiers (`session_id`, `payment_intent_id`)
/// exist for the payment event handler, which receives provider events
/// carrying no order id of its own.
#[async_trait]
pub trait Orders: Send + Sync {
    /// Returns all orders.
    async fn all(&self) -> Result<Vec<Order>>;

    /// Returns an order by id.
    async fn get(&self, id: OrderId) -> Result<Option<Order>>;

    /// Returns the orders belonging to a user, newest first.
    async fn for_user(&self, user: UserId) -> Result<Vec<Order>>;

    /// Finds the order created from a checkout session, if any.
    async fn find_by_session(&self, session_id: &str) -> Result<Option<Order>>;

    /// Finds the order holding a given payment intent, if any.
    async fn find_by_payment_intent(&self, payment_intent_id: &str) -> Result<Option<Order>>;

    /// Mints a new order: assigns id, order number, and timestamps.
    async fn create(&self, new_order: NewOrder) -> Result<Order>;

    /// Applies a partial update, returning the updated order.
    async fn update(&self, id: OrderId, update: OrderUpdate) -> Result<Order>;
}

/// JSON-file-backed order store.
pub struct JsonOrders {
    orders: JsonCollection<Order>,
}

impl JsonOrders {
    /// Opens the order store at `<data_dir>/orders.json`.
    pub fn open(data_dir: impl AsRef<Path>) -> Self {
        Self {
            orders: JsonCollection::new(data_dir.as_ref().join("orders.json")),
        }
    }
}

#[async_trait]
impl Orders for JsonOrders {
    async fn all(&self) -> Result<Vec<Order>> {
        self.orders.read_all().await
    }

    async fn get(&self, id: OrderId) -> Result<Option<Order>> {
        let orders = self.orders.read_all().await?;
        Ok(orders.into_iter().find(|o| o.id == id))
    }

    async fn for_user(&self, user: UserId) -> Result<Vec<Order>> {
        let mut orders: Vec<Order> = self
            .orders
            .read_all()
            .await?
            .into_iter()
            .filter(|o| o.is_owned_by(user))
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    async fn find_by_session(&self, session_id: &str) -> Result<Option<Order>> {
        let orders = self.orders.read_all().await?;
        Ok(orders
            .into_iter()
            .find(|o| o.session_id.as_deref() == Some(session_id)))
    }

    async fn find_by_payment_intent(&self, payment_intent_id: &str) -> Result<Option<Order>> {
        let orders = self.orders.read_all().await?;
        Ok(orders
            .into_iter()
            .find(|o| o.payment_intent_id.as_deref() == Some(payment_intent_id)))
    }

    async fn create(&self, new_order: NewOrder) -> Result<Order> {
        self.orders
            .try_mutate(move |orders| {
                // Order numbers are display identifiers; regenerate on the
                // rare collision while holding the writer lock.
                let mut order_number = generate_order_number();
                while orders.iter().any(|o| o.order_number == order_number) {
                    order_number = generate_order_number();
                }
                let order = new_order.into_order(OrderId::new(), order_number, Utc::now());
                orders.push(order.clone());
                Ok(order)
            })
            .await
    }

    async fn update(&self, id: OrderId, update: OrderUpdate) -> Result<Order> {
        self.orders
            .try_mutate(move |orders| {
                let order = orders
                    .iter_mut()
                    .find(|o| o.id == id)
                    .ok_or(StoreError::OrderNotFound(id))?;
                update.apply_to(order);
                Ok(order.clone())
            })
            .await
    }
}
