//! HTTP API server for the storefront.
//!
//! REST endpoints for the catalog, checkout, payment webhooks, and order
//! management, with structured logging (tracing) and Prometheus metrics.

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, patch, post};
use checkout::{CheckoutService, OrderLifecycle, PaymentEventHandler};
use metrics_exporter_prometheus::PrometheusHandle;
use payments::PaymentProvider;
use store::{JsonCatalog, JsonOrders};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use auth::{HasVerifier, JwtVerifier};
use config::Config;

/// Shared application state accessible from all handlers.
pub struct AppState<P> {
    pub catalog: Arc<JsonCatalog>,
    pub orders: Arc<JsonOrders>,
    pub checkout: CheckoutService<JsonCatalog, P>,
    pub payment_events: PaymentEventHandler<JsonCatalog, JsonOrders>,
    pub lifecycle: OrderLifecycle<JsonCatalog, JsonOrders, P>,
    pub jwt: JwtVerifier,
    pub webhook_secret: String,
}

impl<P> HasVerifier for AppState<P> {
    fn verifier(&self) -> &JwtVerifier {
        &self.jwt
    }
}

/// Builds the application state around the JSON stores in
/// `config.data_dir` and the given payment provider.
pub fn create_state<P: PaymentProvider>(config: &Config, provider: Arc<P>) -> Arc<AppState<P>> {
    let catalog = Arc::new(JsonCatalog::open(&config.data_dir));
    let orders = Arc::new(JsonOrders::open(&config.data_dir));

    Arc::new(AppState {
        checkout: CheckoutService::new(catalog.clone(), provider.clone(), config.checkout()),
        payment_events: PaymentEventHandler::new(catalog.clone(), orders.clone()),
        lifecycle: OrderLifecycle::new(catalog.clone(), orders.clone(), provider),
        jwt: JwtVerifier::new(&config.jwt_secret),
        webhook_secret: config.webhook_secret.clone(),
        catalog,
        orders,
    })
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<P: PaymentProvider + 'static>(
    state: Arc<AppState<P>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::render))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/products", get(routes::products::list::<P>))
        .route("/products", post(routes::products::create::<P>))
        .route("/products/{id}", get(routes::products::get::<P>))
        .route("/products/{id}", patch(routes::products::update::<P>))
        .route(
            "/products/{id}",
            axum::routing::delete(routes::products::delete::<P>),
        )
        .route("/checkout/session", post(routes::checkout::session::<P>))
        .route("/webhooks/payment", post(routes::webhook::payment::<P>))
        .route("/orders", get(routes::orders::list::<P>))
        .route("/orders/{id}", get(routes::orders::get::<P>))
        .route("/orders/{id}/cancel", post(routes::orders::cancel::<P>))
        .route(
            "/orders/{id}/status",
            patch(routes::orders::update_status::<P>),
        )
        .route("/orders/refund", post(routes::orders::refund::<P>))
        .route("/admin/orders", get(routes::orders::admin_list::<P>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
