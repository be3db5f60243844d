//! End-to-end workflow tests: checkout → webhook → lifecycle, against the
//! real JSON-file stores and the in-memory payment provider.

use std::collections::HashMap;
use std::sync::Arc;

use checkout::{
    CheckoutConfig, CheckoutError, CheckoutRequest, CheckoutService, Handled, OrderLifecycle,
    PaymentEventHandler,
};
use common::UserId;
use domain::{
    Actor, CartItem, CartMetadata, Money, NewProduct, OrderStatus, PaymentStatus, Product,
};
use payments::{CompletedSession, InMemoryProvider, WebhookEvent};
use store::{Catalog, JsonCatalog, JsonOrders, Orders};

struct World {
    catalog: Arc<JsonCatalog>,
    orders: Arc<JsonOrders>,
    provider: Arc<InMemoryProvider>,
    checkout: CheckoutService<JsonCatalog, InMemoryProvider>,
    handler: PaymentEventHandler<JsonCatalog, JsonOrders>,
    lifecycle: OrderLifecycle<JsonCatalog, JsonOrders, InMemoryProvider>,
}

fn world(dir: &tempfile::TempDir) -> World {
    let catalog = Arc::new(JsonCatalog::open(dir.path()));
    let orders = Arc::new(JsonOrders::open(dir.path()));
    let provider = Arc::new(InMemoryProvider::new());
    let config = CheckoutConfig {
        currency: "gbp".to_string(),
        free_shipping_threshold: Money::from_minor(5000),
        standard_shipping: Money::from_minor(450),
        success_url: "https://shop.test/success".to_string(),
        cancel_url: "https://shop.test/cancel".to_string(),
    };
    World {
        checkout: CheckoutService::new(catalog.clone(), provider.clone(), config),
        handler: PaymentEventHandler::new(catalog.clone(), orders.clone()),
        lifecycle: OrderLifecycle::new(catalog.clone(), orders.clone(), provider.clone()),
        catalog,
        orders,
        provider,
    }
}

async fn seed(world: &World, name: &str, price_minor: i64, stock: u32) -> Product {
    world
        .catalog
        .insert(
            NewProduct {
                name: name.to_string(),
                description: format!("{name} description"),
                price: Money::from_minor(price_minor),
                category: "prints".to_string(),
                collection: None,
                stock,
                available: true,
                featured: false,
                images: Vec::new(),
                braille_message: None,
                decoded_message: None,
                dimensions: None,
                materials: None,
            }
            .into_product(),
        )
        .await
        .unwrap()
}

/// Simulates the provider confirming payment for the last created session:
/// replays the session's own cart metadata in a completion event, the way
/// the real webhook does.
async fn complete_last_session(world: &World, session_id: &str) -> Handled {
    let session = world.provider.last_session().unwrap();
    let cart = CartMetadata::decode(&session.cart_metadata).unwrap();
    let amount_total: i64 = session
        .line_items
        .iter()
        .map(|l| l.unit_amount.minor() * i64::from(l.quantity))
        .sum();
    world
        .handler
        .handle(WebhookEvent::CheckoutCompleted(CompletedSession {
            session_id: session_id.to_string(),
            payment_intent_id: Some(format!("pi_{session_id}")),
            amount_total,
            currency: "gbp".to_string(),
            metadata: HashMap::from([("cart".to_string(), cart.encode().unwrap())]),
        }))
        .await
        .unwrap()
}

#[tokio::test]
async fn purchase_flow_creates_one_paid_order_and_decrements_stock() {
    let dir = tempfile::tempdir().unwrap();
    let w = world(&dir);
    // P1: stock 5, price 10.00
    let p1 = seed(&w, "P1", 1000, 5).await;

    let redirect = w
        .checkout
        .begin(CheckoutRequest {
            items: vec![CartItem {
                product_id: p1.id,
                quantity: 2,
            }],
            email: Some("buyer@example.com".to_string()),
            user: None,
            shipping_address: None,
            billing_address: None,
        })
        .await
        .unwrap();

    let session = w.provider.last_session().unwrap();
    assert_eq!(session.line_items[0].unit_amount.minor(), 1000);
    assert_eq!(session.line_items[0].quantity, 2);

    let handled = complete_last_session(&w, &redirect.session_id).await;
    let Handled::OrderCreated(order_id) = handled else {
        panic!("expected an order, got {handled:?}");
    };

    let order = w.orders.get(order_id).await.unwrap().unwrap();
    assert_eq!(order.payment_status, PaymentStatus::Paid);
    assert_eq!(order.status, OrderStatus::Processing);
    // 20.00 for the goods plus 4.50 shipping (under the 50.00 threshold)
    assert_eq!(order.total.minor(), 2450);
    assert_eq!(w.catalog.get(p1.id).await.unwrap().unwrap().stock, 3);
    assert_eq!(w.orders.all().await.unwrap().len(), 1);
}

#[tokio::test]
async fn over_stock_checkout_fails_with_no_session_or_order() {
    let dir = tempfile::tempdir().unwrap();
    let w = world(&dir);
    let p1 = seed(&w, "P1", 1000, 1).await;

    let err = w
        .checkout
        .begin(CheckoutRequest {
            items: vec![CartItem {
                product_id: p1.id,
                quantity: 2,
            }],
            email: Some("buyer@example.com".to_string()),
            user: None,
            shipping_address: None,
            billing_address: None,
        })
        .await
        .unwrap_err();

    assert!(matches!(err, CheckoutError::Validation(msg) if msg.contains("P1")));
    assert_eq!(w.provider.session_count(), 0);
    assert!(w.orders.all().await.unwrap().is_empty());
    assert_eq!(w.catalog.get(p1.id).await.unwrap().unwrap().stock, 1);
}

#[tokio::test]
async fn replayed_completion_event_stays_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let w = world(&dir);
    let p1 = seed(&w, "P1", 1000, 5).await;

    let redirect = w
        .checkout
        .begin(CheckoutRequest {
            items: vec![CartItem {
                product_id: p1.id,
                quantity: 2,
            }],
            email: Some("buyer@example.com".to_string()),
            user: None,
            shipping_address: None,
            billing_address: None,
        })
        .await
        .unwrap();

    let first = complete_last_session(&w, &redirect.session_id).await;
    let second = complete_last_session(&w, &redirect.session_id).await;
    let third = complete_last_session(&w, &redirect.session_id).await;

    let Handled::OrderCreated(order_id) = first else {
        panic!("expected creation");
    };
    assert_eq!(second, Handled::Duplicate(order_id));
    assert_eq!(third, Handled::Duplicate(order_id));
    assert_eq!(w.orders.all().await.unwrap().len(), 1);
    assert_eq!(w.catalog.get(p1.id).await.unwrap().unwrap().stock, 3);
}

#[tokio::test]
async fn cancellation_after_purchase_restores_stock_once() {
    let dir = tempfile::tempdir().unwrap();
    let w = world(&dir);
    let p1 = seed(&w, "P1", 5, 5).await;
    let user = UserId::new();

    let redirect = w
        .checkout
        .begin(CheckoutRequest {
            items: vec![CartItem {
                product_id: p1.id,
                quantity: 3,
            }],
            email: None,
            user: Some((user, "buyer@example.com".to_string())),
            shipping_address: None,
            billing_address: None,
        })
        .await
        .unwrap();
    let Handled::OrderCreated(order_id) = complete_last_session(&w, &redirect.session_id).await
    else {
        panic!("expected creation");
    };
    assert_eq!(w.catalog.get(p1.id).await.unwrap().unwrap().stock, 2);

    let cancelled = w
        .lifecycle
        .cancel(
            order_id,
            Actor::Customer(user),
            Some("ordered twice".to_string()),
        )
        .await
        .unwrap();
    assert_eq!(cancelled.status, OrderStatus::Cancelled);
    assert_eq!(cancelled.status_history.len(), 2);
    assert_eq!(w.catalog.get(p1.id).await.unwrap().unwrap().stock, 5);

    // A second cancel is a conflict and does not restore again
    let err = w
        .lifecycle
        .cancel(order_id, Actor::Customer(user), None)
        .await
        .unwrap_err();
    assert!(matches!(err, CheckoutError::Conflict(_)));
    assert_eq!(w.catalog.get(p1.id).await.unwrap().unwrap().stock, 5);
}

#[tokio::test]
async fn order_total_is_immutable_through_lifecycle() {
    let dir = tempfile::tempdir().unwrap();
    let w = world(&dir);
    let p1 = seed(&w, "P1", 1000, 5).await;

    let redirect = w
        .checkout
        .begin(CheckoutRequest {
            items: vec![CartItem {
                product_id: p1.id,
                quantity: 2,
            }],
            email: Some("buyer@example.com".to_string()),
            user: None,
            shipping_address: None,
            billing_address: None,
        })
        .await
        .unwrap();
    let Handled::OrderCreated(order_id) = complete_last_session(&w, &redirect.session_id).await
    else {
        panic!("expected creation");
    };
    let total = w.orders.get(order_id).await.unwrap().unwrap().total;

    // Reprice the product; the order keeps its purchase-time total
    w.catalog
        .update(
            p1.id,
            domain::ProductUpdate {
                price: Some(Money::from_minor(9999)),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let admin = UserId::new();
    w.lifecycle
        .update_status(order_id, OrderStatus::Shipped, admin, None, None)
        .await
        .unwrap();

    let after = w.orders.get(order_id).await.unwrap().unwrap();
    assert_eq!(after.total, total);
    assert_eq!(after.items[0].unit_price.minor(), 1000);
}

#[tokio::test]
async fn refund_flow_marks_order_without_touching_stock() {
    let dir = tempfile::tempdir().unwrap();
    let w = world(&dir);
    let p1 = seed(&w, "P1", 1000, 5).await;

    let redirect = w
        .checkout
        .begin(CheckoutRequest {
            items: vec![CartItem {
                product_id: p1.id,
                quantity: 2,
            }],
            email: Some("buyer@example.com".to_string()),
            user: None,
            shipping_address: None,
            billing_address: None,
        })
        .await
        .unwrap();
    let Handled::OrderCreated(order_id) = complete_last_session(&w, &redirect.session_id).await
    else {
        panic!("expected creation");
    };

    let refunded = w
        .lifecycle
        .refund(
            &format!("pi_{}", redirect.session_id),
            None,
            Some("damaged in transit".to_string()),
            Actor::Admin(UserId::new()),
        )
        .await
        .unwrap();

    assert_eq!(refunded.id, order_id);
    assert_eq!(refunded.status, OrderStatus::Refunded);
    assert_eq!(w.provider.refunds().len(), 1);
    assert_eq!(w.catalog.get(p1.id).await.unwrap().unwrap().stock, 3);
}
