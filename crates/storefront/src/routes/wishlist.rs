//! Wishlist route handlers. Every endpoint requires a logged-in shopper.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use zone7_core::ProductId;
use zone7_core::wishlist::WishlistSnapshot;

use super::cart::CartView;
use crate::error::Result;
use crate::middleware::OptionalAuth;
use crate::services::{CartError, Toggled};
use crate::state::AppState;

/// Toggle request.
#[derive(Debug, Deserialize)]
pub struct ToggleItem {
    pub product_id: ProductId,
}

/// Move-to-cart request. The product comes from the path.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct MoveItem {
    pub size: Option<String>,
    pub quantity: Option<u32>,
}

/// Cart and wishlist after a move.
#[derive(Debug, Serialize)]
pub struct Moved {
    pub cart: CartView,
    pub wishlist: WishlistSnapshot,
}

/// Show the wishlist.
#[instrument(skip_all)]
pub async fn show(
    State(state): State<AppState>,
    OptionalAuth(auth): OptionalAuth,
) -> Result<Json<WishlistSnapshot>> {
    Ok(Json(state.wishlist().load(auth.as_ref()).await?))
}

/// Save or unsave a product.
#[instrument(skip(state, auth))]
pub async fn toggle(
    State(state): State<AppState>,
    OptionalAuth(auth): OptionalAuth,
    Json(item): Json<ToggleItem>,
) -> Result<Json<Toggled>> {
    let product = state.catalog().product(item.product_id).await?;
    let toggled = state
        .wishlist()
        .toggle(auth.as_ref(), &product.wishlist_entry())
        .await?;
    Ok(Json(toggled))
}

/// Move a saved product into the cart.
#[instrument(skip(state, auth))]
pub async fn move_to_cart(
    State(state): State<AppState>,
    OptionalAuth(auth): OptionalAuth,
    Path(product_id): Path<i64>,
    body: Option<Json<MoveItem>>,
) -> Result<Json<Moved>> {
    let Json(item) = body.unwrap_or_default();
    let product = state.catalog().product(ProductId::new(product_id)).await?;
    let line = product
        .cart_line_or_default(item.size.as_deref(), item.quantity.unwrap_or(1))
        .map_err(CartError::from)?;

    let (cart, wishlist) = state
        .wishlist()
        .move_to_cart(state.cart(), auth.as_ref(), line)
        .await?;
    Ok(Json(Moved {
        cart: CartView::remote(&cart, state.cart().policy()),
        wishlist,
    }))
}

/// Remove a product from the wishlist.
#[instrument(skip(state, auth))]
pub async fn remove(
    State(state): State<AppState>,
    OptionalAuth(auth): OptionalAuth,
    Path(product_id): Path<i64>,
) -> Result<Json<WishlistSnapshot>> {
    Ok(Json(
        state
            .wishlist()
            .remove(auth.as_ref(), ProductId::new(product_id))
            .await?,
    ))
}

/// Empty the wishlist.
#[instrument(skip_all)]
pub async fn clear(
    State(state): State<AppState>,
    OptionalAuth(auth): OptionalAuth,
) -> Result<Json<WishlistSnapshot>> {
    Ok(Json(state.wishlist().clear(auth.as_ref()).await?))
}
