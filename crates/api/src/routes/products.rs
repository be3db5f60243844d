//! Catalog endpoints: public reads, admin CRUD.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use common::ProductId;
use domain::{Money, NewProduct, Product, ProductUpdate};
use serde::Deserialize;
use store::Catalog;

use crate::AppState;
use crate::auth::{AuthUser, OptionalAuthUser};
use crate::error::ApiError;

const DEFAULT_PAGE_SIZE: usize = 20;
const MAX_PAGE_SIZE: usize = 100;

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub category: Option<String>,
    pub collection: Option<String>,
    pub featured: Option<bool>,
    pub available: Option<bool>,
    /// Minor units.
    pub min_price: Option<i64>,
    /// Minor units.
    pub max_price: Option<i64>,
    /// Case-insensitive text match over name, description, and decoded
    /// message.
    pub q: Option<String>,
    pub page: Option<usize>,
    pub per_page: Option<usize>,
}

#[derive(serde::Serialize)]
pub struct ProductListResponse {
    pub products: Vec<Product>,
    pub total: usize,
    pub page: usize,
    pub per_page: usize,
}

fn matches(product: &Product, query: &ListQuery) -> bool {
    if let Some(category) = &query.category
        && !product.category.eq_ignore_ascii_case(category)
    {
        return false;
    }
    if let Some(collection) = &query.collection
        && product.collection.as_deref() != Some(collection.as_str())
    {
        return false;
    }
    if let Some(featured) = query.featured
        && product.featured != featured
    {
        return false;
    }
    if let Some(available) = query.available
        && product.available != available
    {
        return false;
    }
    if let Some(min) = query.min_price
        && product.price < Money::from_minor(min)
    {
        return false;
    }
    if let Some(max) = query.max_price
        && product.price > Money::from_minor(max)
    {
        return false;
    }
    if let Some(q) = &query.q {
        let needle = q.to_lowercase();
        let haystack = [
            Some(product.name.as_str()),
            Some(product.description.as_str()),
            product.decoded_message.as_deref(),
        ];
        if !haystack
            .into_iter()
            .flatten()
            .any(|field| field.to_lowercase().contains(&needle))
        {
            return false;
        }
    }
    true
}

/// GET /products — public list with filters and pagination.
///
/// Hidden products only show up for admins.
#[tracing::instrument(skip(state, user, query))]
pub async fn list<P: Send + Sync>(
    State(state): State<Arc<AppState<P>>>,
    user: OptionalAuthUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<ProductListResponse>, ApiError> {
    let admin = user.0.as_ref().is_some_and(|u| u.admin);

    let mut products: Vec<Product> = state
        .catalog
        .all()
        .await?
        .into_iter()
        .filter(|p| (admin || p.available) && matches(p, &query))
        .collect();

    // Featured first, then newest
    products.sort_by(|a, b| {
        b.featured
            .cmp(&a.featured)
            .then(b.created_at.cmp(&a.created_at))
    });

    let total = products.len();
    let per_page = query
        .per_page
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    let page = query.page.unwrap_or(1).max(1);
    let products = products
        .into_iter()
        .skip(page.saturating_sub(1).saturating_mul(per_page))
        .take(per_page)
        .collect();

    Ok(Json(ProductListResponse {
        products,
        total,
        page,
        per_page,
    }))
}

/// GET /products/:id — public get; hidden products 404 for non-admins.
#[tracing::instrument(skip(state, user))]
pub async fn get<P: Send + Sync>(
    State(state): State<Arc<AppState<P>>>,
    user: OptionalAuthUser,
    Path(id): Path<ProductId>,
) -> Result<Json<Product>, ApiError> {
    let admin = user.0.as_ref().is_some_and(|u| u.admin);
    let product = state
        .catalog
        .get(id)
        .await?
        .filter(|p| admin || p.available)
        .ok_or_else(|| ApiError::NotFound(format!("product {id} not found")))?;
    Ok(Json(product))
}

/// POST /products — admin create.
#[tracing::instrument(skip(state, user, req))]
pub async fn create<P: Send + Sync>(
    State(state): State<Arc<AppState<P>>>,
    user: AuthUser,
    Json(req): Json<NewProduct>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    user.require_admin()?;
    if req.name.trim().is_empty() {
        return Err(ApiError::BadRequest("product name is required".to_string()));
    }
    if req.price.is_negative() {
        return Err(ApiError::BadRequest("price cannot be negative".to_string()));
    }

    let product = state.catalog.insert(req.into_product()).await?;
    tracing::info!(product_id = %product.id, "product created");
    Ok((StatusCode::CREATED, Json(product)))
}

/// PATCH /products/:id — admin partial update.
#[tracing::instrument(skip(state, user, req))]
pub async fn update<P: Send + Sync>(
    State(state): State<Arc<AppState<P>>>,
    user: AuthUser,
    Path(id): Path<ProductId>,
    Json(req): Json<ProductUpdate>,
) -> Result<Json<Product>, ApiError> {
    user.require_admin()?;
    if req.price.is_some_and(|p| p.is_negative()) {
        return Err(ApiError::BadRequest("price cannot be negative".to_string()));
    }
    let product = state.catalog.update(id, req).await?;
    Ok(Json(product))
}

/// DELETE /products/:id — admin delete.
#[tracing::instrument(skip(state, user))]
pub async fn delete<P: Send + Sync>(
    State(state): State<Arc<AppState<P>>>,
    user: AuthUser,
    Path(id): Path<ProductId>,
) -> Result<StatusCode, ApiError> {
    user.require_admin()?;
    state.catalog.delete(id).await?;
    tracing::info!(product_id = %id, "product deleted");
    Ok(StatusCode::NO_CONTENT)
}
