//! Catalog and shop route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;
use zone7_core::ProductId;
use zone7_core::catalog::{CategoryCount, Product};
use zone7_core::filters::{FilterAction, ShopFilters};

use crate::error::Result;
use crate::services::{ProductDetail, ShopPage, apply_filter_action, load_filters};
use crate::state::AppState;
use crate::store::SessionStore;

/// Product listing query.
#[derive(Debug, Deserialize)]
pub struct ProductsQuery {
    /// Name search term.
    pub q: Option<String>,
}

/// List products, or search them by name when `q` is given.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<ProductsQuery>,
) -> Result<Json<Vec<Product>>> {
    let products = match query.q.as_deref() {
        Some(term) => state.catalog().search(term).await?,
        None => state.catalog().products().await?,
    };
    Ok(Json(products))
}

/// Product detail with related products.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ProductDetail>> {
    Ok(Json(state.catalog().detail(ProductId::new(id)).await?))
}

/// Products sharing this product's first category.
#[instrument(skip(state))]
pub async fn related(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<Product>>> {
    Ok(Json(state.catalog().related(ProductId::new(id)).await?))
}

/// Categories with product counts.
pub async fn categories(State(state): State<AppState>) -> Result<Json<Vec<CategoryCount>>> {
    Ok(Json(state.catalog().categories().await?))
}

/// The shop page for the visitor's stored filters.
#[instrument(skip_all)]
pub async fn shop(State(state): State<AppState>, session: Session) -> Result<Json<ShopPage>> {
    let filters = load_filters(&SessionStore::new(session)).await?;
    Ok(Json(state.catalog().shop(filters).await?))
}

/// The visitor's stored filters.
pub async fn filters(session: Session) -> Result<Json<ShopFilters>> {
    Ok(Json(load_filters(&SessionStore::new(session)).await?))
}

/// Apply one filter action and return the new state.
#[instrument(skip(session))]
pub async fn update_filters(
    session: Session,
    Json(action): Json<FilterAction>,
) -> Result<Json<ShopFilters>> {
    Ok(Json(
        apply_filter_action(&SessionStore::new(session), &action).await?,
    ))
}
