//! Order endpoints: customer reads and lifecycle, admin management.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use common::OrderId;
use domain::{Actor, Money, Order, OrderStatus, PaymentStatus};
use payments::PaymentProvider;
use serde::Deserialize;
use store::Orders;

use crate::AppState;
use crate::auth::AuthUser;
use crate::error::ApiError;

const DEFAULT_PAGE_SIZE: usize = 20;
const MAX_PAGE_SIZE: usize = 100;

#[derive(Debug, Default, Deserialize)]
pub struct OrderListQuery {
    pub status: Option<OrderStatus>,
    pub payment_status: Option<PaymentStatus>,
    pub page: Option<usize>,
    pub per_page: Option<usize>,
}

#[derive(serde::Serialize)]
pub struct OrderListResponse {
    pub orders: Vec<Order>,
    pub total: usize,
    pub page: usize,
    pub per_page: usize,
}

fn paginate(mut orders: Vec<Order>, query: &OrderListQuery) -> OrderListResponse {
    if let Some(status) = query.status {
        orders.retain(|o| o.status == status);
    }
    if let Some(payment_status) = query.payment_status {
        orders.retain(|o| o.payment_status == payment_status);
    }
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let total = orders.len();
    let per_page = query
        .per_page
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    let page = query.page.unwrap_or(1).max(1);
    let orders = orders
        .into_iter()
        .skip(page.saturating_sub(1).saturating_mul(per_page))
        .take(per_page)
        .collect();

    OrderListResponse {
        orders,
        total,
        page,
        per_page,
    }
}

/// GET /orders — the caller's own orders, newest first.
#[tracing::instrument(skip(state, user, query))]
pub async fn list<P: Send + Sync>(
    State(state): State<Arc<AppState<P>>>,
    user: AuthUser,
    Query(query): Query<OrderListQuery>,
) -> Result<Json<OrderListResponse>, ApiError> {
    let orders = state.orders.for_user(user.id).await?;
    Ok(Json(paginate(orders, &query)))
}

/// GET /admin/orders — every order, with filters.
#[tracing::instrument(skip(state, user, query))]
pub async fn admin_list<P: Send + Sync>(
    State(state): State<Arc<AppState<P>>>,
    user: AuthUser,
    Query(query): Query<OrderListQuery>,
) -> Result<Json<OrderListResponse>, ApiError> {
    user.require_admin()?;
    let orders = state.orders.all().await?;
    Ok(Json(paginate(orders, &query)))
}

/// GET /orders/:id — owner or admin.
#[tracing::instrument(skip(state, user))]
pub async fn get<P: Send + Sync>(
    State(state): State<Arc<AppState<P>>>,
    user: AuthUser,
    Path(id): Path<OrderId>,
) -> Result<Json<Order>, ApiError> {
    let order = state
        .orders
        .get(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("order {id} not found")))?;

    if !user.admin && !order.is_owned_by(user.id) {
        // Hide other customers' orders entirely
        return Err(ApiError::NotFound(format!("order {id} not found")));
    }
    Ok(Json(order))
}

#[derive(Default, Deserialize)]
pub struct CancelRequest {
    pub reason: Option<String>,
}

/// POST /orders/:id/cancel — customer (or admin) cancellation.
#[tracing::instrument(skip(state, user, req))]
pub async fn cancel<P: PaymentProvider>(
    State(state): State<Arc<AppState<P>>>,
    user: AuthUser,
    Path(id): Path<OrderId>,
    Json(req): Json<CancelRequest>,
) -> Result<Json<Order>, ApiError> {
    let actor = if user.admin {
        Actor::Admin(user.id)
    } else {
        Actor::Customer(user.id)
    };
    let order = state.lifecycle.cancel(id, actor, req.reason).await?;
    Ok(Json(order))
}

#[derive(Deserialize)]
pub struct StatusUpdateRequest {
    pub status: OrderStatus,
    pub tracking_number: Option<String>,
    pub note: Option<String>,
}

/// PATCH /orders/:id/status — admin status update.
#[tracing::instrument(skip(state, user, req))]
pub async fn update_status<P: PaymentProvider>(
    State(state): State<Arc<AppState<P>>>,
    user: AuthUser,
    Path(id): Path<OrderId>,
    Json(req): Json<StatusUpdateRequest>,
) -> Result<Json<Order>, ApiError> {
    user.require_admin()?;
    let order = state
        .lifecycle
        .update_status(id, req.status, user.id, req.tracking_number, req.note)
        .await?;
    Ok(Json(order))
}

#[derive(Deserialize)]
pub struct RefundRequest {
    pub payment_intent_id: String,
    /// Minor units; omit for a full refund.
    pub amount: Option<i64>,
    pub reason: Option<String>,
}

/// POST /orders/refund — refund by payment intent, admin or owner.
#[tracing::instrument(skip(state, user, req))]
pub async fn refund<P: PaymentProvider>(
    State(state): State<Arc<AppState<P>>>,
    user: AuthUser,
    Json(req): Json<RefundRequest>,
) -> Result<Json<Order>, ApiError> {
    if req.amount.is_some_and(|a| a <= 0) {
        return Err(ApiError::BadRequest(
            "refund amount must be positive".to_string(),
        ));
    }
    let actor = if user.admin {
        Actor::Admin(user.id)
    } else {
        Actor::Customer(user.id)
    };
    let order = state
        .lifecycle
        .refund(
            &req.payment_intent_id,
            req.amount.map(Money::from_minor),
            req.reason,
            actor,
        )
        .await?;
    Ok(Json(order))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paginate_tolerates_out_of_range_page() {
        let query = OrderListQuery {
            page: Some(usize::MAX),
            per_page: Some(50),
            ..OrderListQuery::default()
        };
        let response = paginate(Vec::new(), &query);
        assert_eq!(response.total, 0);
        assert!(response.orders.is_empty());
    }
}
