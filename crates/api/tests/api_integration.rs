//! Integration tests for the API server.

use std::sync::{Arc, OnceLock};

use api::AppState;
use api::auth::Claims;
use api::config::Config;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::UserId;
use domain::{Money, NewProduct, Product};
use jsonwebtoken::{EncodingKey, Header, encode};
use metrics_exporter_prometheus::PrometheusHandle;
use payments::InMemoryProvider;
use store::{Catalog, Orders};
use tower::ServiceExt;

const JWT_SECRET: &str = "integration-test-jwt-secret";
const WEBHOOK_SECRET: &str = "whsec_integration_test";

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            builder
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

struct TestApp {
    app: axum::Router,
    state: Arc<AppState<InMemoryProvider>>,
    provider: Arc<InMemoryProvider>,
    _dir: tempfile::TempDir,
}

fn setup() -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let config = Config {
        data_dir: dir.path().to_string_lossy().into_owned(),
        jwt_secret: JWT_SECRET.to_string(),
        webhook_secret: WEBHOOK_SECRET.to_string(),
        ..Config::default()
    };
    let provider = Arc::new(InMemoryProvider::new());
    let state = api::create_state(&config, provider.clone());
    let app = api::create_app(state.clone(), get_metrics_handle());
    TestApp {
        app,
        state,
        provider,
        _dir: dir,
    }
}

fn token_for(user: UserId, role: &str) -> String {
    let claims = Claims {
        sub: user.to_string(),
        email: format!("{role}@example.com"),
        role: role.to_string(),
        exp: chrono::Utc::now().timestamp() + 3600,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .unwrap()
}

async fn seed_product(state: &AppState<InMemoryProvider>, name: &str, price: i64, stock: u32, available: bool) -> Product {
    state
        .catalog
        .insert(
            NewProduct {
                name: name.to_string(),
                description: format!("{name} description"),
                price: Money::from_minor(price),
                category: "prints".to_string(),
                collection: None,
                stock,
                available,
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

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

fn json_request(method: &str, uri: &str, token: Option<&str>, body: serde_json::Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn signed_webhook(body: serde_json::Value) -> Request<Body> {
    let payload = body.to_string();
    let signature = payments::sign_payload(
        payload.as_bytes(),
        WEBHOOK_SECRET,
        chrono::Utc::now().timestamp(),
    );
    Request::builder()
        .method("POST")
        .uri("/webhooks/payment")
        .header("content-type", "application/json")
        .header("stripe-signature", signature)
        .body(Body::from(payload))
        .unwrap()
}

fn completed_event(session_id: &str, cart: &domain::CartMetadata, amount_total: i64) -> serde_json::Value {
    serde_json::json!({
        "id": "evt_test",
        "type": "checkout.session.completed",
        "data": {
            "object": {
                "id": session_id,
                "payment_intent": format!("pi_{session_id}"),
                "amount_total": amount_total,
                "currency": "gbp",
                "metadata": { "cart": cart.encode().unwrap() }
            }
        }
    })
}

#[tokio::test]
async fn health_check() {
    let t = setup();

    let response = t.app.oneshot(get("/health", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["service"], "storefront-api");
}

#[tokio::test]
async fn product_list_hides_unavailable_from_anonymous() {
    let t = setup();
    seed_product(&t.state, "Visible", 1000, 5, true).await;
    seed_product(&t.state, "Hidden", 1000, 5, false).await;

    let response = t.app.clone().oneshot(get("/products", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["total"], 1);
    assert_eq!(json["products"][0]["name"], "Visible");

    // Admin sees both
    let admin = token_for(UserId::new(), "admin");
    let response = t
        .app
        .oneshot(get("/products", Some(&admin)))
        .await
        .unwrap();
    let json = body_json(response).await;
    assert_eq!(json["total"], 2);
}

#[tokio::test]
async fn product_filters_and_search() {
    let t = setup();
    seed_product(&t.state, "Hope Print", 1000, 5, true).await;
    seed_product(&t.state, "Love Print", 3000, 5, true).await;

    let response = t
        .app
        .clone()
        .oneshot(get("/products?q=hope", None))
        .await
        .unwrap();
    let json = body_json(response).await;
    assert_eq!(json["total"], 1);
    assert_eq!(json["products"][0]["name"], "Hope Print");

    let response = t
        .app
        .oneshot(get("/products?max_price=2000", None))
        .await
        .unwrap();
    let json = body_json(response).await;
    assert_eq!(json["total"], 1);
}

#[tokio::test]
async fn product_list_tolerates_out_of_range_page() {
    let t = setup();
    seed_product(&t.state, "Only", 1000, 5, true).await;

    let uri = format!("/products?page={}", usize::MAX);
    let response = t.app.oneshot(get(&uri, None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["total"], 1);
    assert_eq!(json["products"].as_array().map(|p| p.len()), Some(0));
}

#[tokio::test]
async fn hidden_product_get_is_404_for_non_admin() {
    let t = setup();
    let hidden = seed_product(&t.state, "Hidden", 1000, 5, false).await;

    let response = t
        .app
        .clone()
        .oneshot(get(&format!("/products/{}", hidden.id), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let admin = token_for(UserId::new(), "admin");
    let response = t
        .app
        .oneshot(get(&format!("/products/{}", hidden.id), Some(&admin)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn product_crud_requires_admin() {
    let t = setup();
    let body = serde_json::json!({
        "name": "New Print",
        "description": "fresh off the press",
        "price": 2500,
        "category": "prints",
        "stock": 10
    });

    // No token
    let response = t
        .app
        .clone()
        .oneshot(json_request("POST", "/products", None, body.clone()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Customer token
    let customer = token_for(UserId::new(), "customer");
    let response = t
        .app
        .clone()
        .oneshot(json_request("POST", "/products", Some(&customer), body.clone()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Admin token
    let admin = token_for(UserId::new(), "admin");
    let response = t
        .app
        .clone()
        .oneshot(json_request("POST", "/products", Some(&admin), body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;
    let id = created["id"].as_str().unwrap().to_string();

    // Partial update
    let response = t
        .app
        .clone()
        .oneshot(json_request(
            "PATCH",
            &format!("/products/{id}"),
            Some(&admin),
            serde_json::json!({ "stock": 3 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["stock"], 3);

    // Delete
    let response = t
        .app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/products/{id}"))
                .header("authorization", format!("Bearer {admin}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = t
        .app
        .oneshot(get(&format!("/products/{id}"), Some(&admin)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn guest_checkout_opens_session() {
    let t = setup();
    let p = seed_product(&t.state, "P1", 1000, 5, true).await;

    let response = t
        .app
        .clone()
        .oneshot(json_request(
            "POST",
            "/checkout/session",
            None,
            serde_json::json!({
                "items": [{ "product_id": p.id, "quantity": 2 }],
                "email": "guest@example.com"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["session_id"], "cs_test_0001");
    assert!(json["url"].as_str().unwrap().starts_with("https://"));
    assert_eq!(t.provider.session_count(), 1);
}

#[tokio::test]
async fn over_stock_checkout_is_400_with_no_session() {
    let t = setup();
    let p = seed_product(&t.state, "P1", 1000, 1, true).await;

    let response = t
        .app
        .oneshot(json_request(
            "POST",
            "/checkout/session",
            None,
            serde_json::json!({
                "items": [{ "product_id": p.id, "quantity": 2 }],
                "email": "guest@example.com"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("P1"));
    assert_eq!(t.provider.session_count(), 0);
}

#[tokio::test]
async fn webhook_rejects_bad_signature() {
    let t = setup();

    let payload = serde_json::json!({"type": "checkout.session.completed", "data": {"object": {}}});
    let response = t
        .app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/webhooks/payment")
                .header("stripe-signature", "t=1,v1=deadbeef")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Missing header entirely
    let response = t
        .app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/webhooks/payment")
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Rejections are counted
    let response = t.app.oneshot(get("/metrics", None)).await.unwrap();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8_lossy(&bytes);
    assert!(text.contains("webhook_signature_failures_total"));
}

#[tokio::test]
async fn signed_webhook_creates_order_idempotently() {
    let t = setup();
    let p = seed_product(&t.state, "P1", 1000, 5, true).await;
    let user = UserId::new();

    let cart = domain::CartMetadata::new(
        vec![domain::CartItem {
            product_id: p.id,
            quantity: 2,
        }],
        "buyer@example.com",
        Some(user),
    );
    let event = completed_event("cs_http_1", &cart, 2450);

    let response = t.app.clone().oneshot(signed_webhook(event.clone())).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["received"], true);

    // Replay the exact same event
    let response = t.app.clone().oneshot(signed_webhook(event)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let orders = t.state.orders.all().await.unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].total.minor(), 2450);
    assert_eq!(
        t.state.catalog.get(p.id).await.unwrap().unwrap().stock,
        3
    );

    // The owner sees the order over HTTP
    let token = token_for(user, "customer");
    let response = t.app.oneshot(get("/orders", Some(&token))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["total"], 1);
}

#[tokio::test]
async fn orders_require_authentication_and_ownership() {
    let t = setup();
    let p = seed_product(&t.state, "P1", 1000, 5, true).await;
    let owner = UserId::new();

    let cart = domain::CartMetadata::new(
        vec![domain::CartItem {
            product_id: p.id,
            quantity: 1,
        }],
        "buyer@example.com",
        Some(owner),
    );
    t.app
        .clone()
        .oneshot(signed_webhook(completed_event("cs_own", &cart, 1450)))
        .await
        .unwrap();
    let order_id = t.state.orders.all().await.unwrap()[0].id;

    // Anonymous
    let response = t.app.clone().oneshot(get("/orders", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Another customer cannot see it
    let stranger = token_for(UserId::new(), "customer");
    let response = t
        .app
        .clone()
        .oneshot(get(&format!("/orders/{order_id}"), Some(&stranger)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Owner and admin can
    let owner_token = token_for(owner, "customer");
    let response = t
        .app
        .clone()
        .oneshot(get(&format!("/orders/{order_id}"), Some(&owner_token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let admin = token_for(UserId::new(), "admin");
    let response = t
        .app
        .oneshot(get(&format!("/orders/{order_id}"), Some(&admin)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn cancel_over_http_restores_stock_then_conflicts() {
    let t = setup();
    let p = seed_product(&t.state, "P1", 1000, 5, true).await;
    let owner = UserId::new();

    let cart = domain::CartMetadata::new(
        vec![domain::CartItem {
            product_id: p.id,
            quantity: 3,
        }],
        "buyer@example.com",
        Some(owner),
    );
    t.app
        .clone()
        .oneshot(signed_webhook(completed_event("cs_cancel", &cart, 3000)))
        .await
        .unwrap();
    let order_id = t.state.orders.all().await.unwrap()[0].id;
    assert_eq!(t.state.catalog.get(p.id).await.unwrap().unwrap().stock, 2);

    let token = token_for(owner, "customer");
    let response = t
        .app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/orders/{order_id}/cancel"),
            Some(&token),
            serde_json::json!({ "reason": "ordered twice" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "cancelled");
    assert_eq!(t.state.catalog.get(p.id).await.unwrap().unwrap().stock, 5);

    // Second attempt conflicts
    let response = t
        .app
        .oneshot(json_request(
            "POST",
            &format!("/orders/{order_id}/cancel"),
            Some(&token),
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn status_update_is_admin_only() {
    let t = setup();
    let p = seed_product(&t.state, "P1", 1000, 5, true).await;

    let cart = domain::CartMetadata::new(
        vec![domain::CartItem {
            product_id: p.id,
            quantity: 1,
        }],
        "buyer@example.com",
        None,
    );
    t.app
        .clone()
        .oneshot(signed_webhook(completed_event("cs_ship", &cart, 1450)))
        .await
        .unwrap();
    let order_id = t.state.orders.all().await.unwrap()[0].id;

    let body = serde_json::json!({ "status": "shipped", "tracking_number": "TRK99" });

    let customer = token_for(UserId::new(), "customer");
    let response = t
        .app
        .clone()
        .oneshot(json_request(
            "PATCH",
            &format!("/orders/{order_id}/status"),
            Some(&customer),
            body.clone(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let admin = token_for(UserId::new(), "admin");
    let response = t
        .app
        .oneshot(json_request(
            "PATCH",
            &format!("/orders/{order_id}/status"),
            Some(&admin),
            body,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "shipped");
    assert_eq!(json["tracking_number"], "TRK99");
    assert!(json["shipped_at"].is_string());
}

#[tokio::test]
async fn admin_refund_marks_order_refunded() {
    let t = setup();
    let p = seed_product(&t.state, "P1", 1000, 5, true).await;

    let cart = domain::CartMetadata::new(
        vec![domain::CartItem {
            product_id: p.id,
            quantity: 2,
        }],
        "buyer@example.com",
        None,
    );
    t.app
        .clone()
        .oneshot(signed_webhook(completed_event("cs_refund", &cart, 2450)))
        .await
        .unwrap();

    let admin = token_for(UserId::new(), "admin");
    let response = t
        .app
        .clone()
        .oneshot(json_request(
            "POST",
            "/orders/refund",
            Some(&admin),
            serde_json::json!({ "payment_intent_id": "pi_cs_refund" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "refunded");
    assert_eq!(json["refund_amount"], 2450);
    assert_eq!(t.provider.refunds().len(), 1);

    // Refund does not restore stock
    assert_eq!(t.state.catalog.get(p.id).await.unwrap().unwrap().stock, 3);

    // Admin order list shows it filtered by status
    let response = t
        .app
        .oneshot(get("/admin/orders?status=refunded", Some(&admin)))
        .await
        .unwrap();
    let json = body_json(response).await;
    assert_eq!(json["total"], 1);
}

#[tokio::test]
async fn metrics_endpoint_renders() {
    let t = setup();

    let response = t.app.oneshot(get("/metrics", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
