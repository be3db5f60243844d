//! Checkout session endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use checkout::CheckoutRequest;
use domain::{Address, CartItem};
use payments::PaymentProvider;
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::auth::OptionalAuthUser;
use crate::error::ApiError;

#[derive(Deserialize)]
pub struct SessionRequest {
    pub items: Vec<CartItem>,
    /// Required for guests; overrides the token email when present.
    pub email: Option<String>,
    pub shipping_address: Option<Address>,
    pub billing_address: Option<Address>,
}

#[derive(Serialize)]
pub struct SessionResponse {
    pub session_id: String,
    pub url: String,
}

/// POST /checkout/session — validate the cart and open a payment session.
///
/// Works for authenticated customers and guests alike; a guest must
/// supply an email.
#[tracing::instrument(skip(state, user, req))]
pub async fn session<P: PaymentProvider>(
    State(state): State<Arc<AppState<P>>>,
    user: OptionalAuthUser,
    Json(req): Json<SessionRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    let redirect = state
        .checkout
        .begin(CheckoutRequest {
            items: req.items,
            email: req.email,
            user: user.0.map(|u| (u.id, u.email)),
            shipping_address: req.shipping_address,
            billing_address: req.billing_address,
        })
        .await?;

    Ok(Json(SessionResponse {
        session_id: redirect.session_id,
        url: redirect.url,
    }))
}
