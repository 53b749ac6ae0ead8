//! Cart route handlers.
//!
//! Logged-in shoppers work against their CMS cart. Anonymous visitors get a
//! guest cart kept in the session; its lines are addressed by
//! `"{product_id}:{size}"` since they have no remote id.

use axum::{
    Json,
    extract::{Path, State},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;
use zone7_core::cart::{CartLine, CartSnapshot, GuestCart, NewCartLine, ShippingPolicy, Totals};
use zone7_core::{DocumentId, ProductId};

use crate::error::{AppError, Result};
use crate::middleware::OptionalAuth;
use crate::services::cart::{
    CartError, add_guest_line, load_guest_cart, remove_guest_line, save_guest_cart,
    set_guest_quantity,
};
use crate::state::AppState;
use crate::store::SessionStore;

/// One cart line as shown to the shopper.
#[derive(Debug, Clone, Serialize)]
pub struct CartLineView {
    /// CMS document id, or the guest line key.
    pub id: String,
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: Decimal,
    pub quantity: u32,
    pub size: String,
    pub max_stock: u32,
    pub image_url: Option<String>,
    pub line_total: Decimal,
    pub at_max_stock: bool,
}

/// The cart as returned by every cart endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub guest: bool,
    pub lines: Vec<CartLineView>,
    pub totals: Totals,
    /// Percentage of the way to free shipping.
    pub free_shipping_progress: Decimal,
}

impl From<&CartLine> for CartLineView {
    fn from(line: &CartLine) -> Self {
        Self {
            id: line.id.to_string(),
            product_id: line.product_id,
            name: line.name.clone(),
            unit_price: line.unit_price,
            quantity: line.quantity,
            size: line.size.clone(),
            max_stock: line.max_stock,
            image_url: line.image_url.clone(),
            line_total: line.line_total(),
            at_max_stock: line.at_max_stock(),
        }
    }
}

impl From<&NewCartLine> for CartLineView {
    fn from(line: &NewCartLine) -> Self {
        Self {
            id: GuestCart::line_key(line.product_id, &line.size),
            product_id: line.product_id,
            name: line.name.clone(),
            unit_price: line.unit_price,
            quantity: line.quantity,
            size: line.size.clone(),
            max_stock: line.max_stock,
            image_url: line.image_url.clone(),
            line_total: line.line_total(),
            at_max_stock: line.quantity >= line.max_stock,
        }
    }
}

impl CartView {
    pub(super) fn remote(snapshot: &CartSnapshot, policy: &ShippingPolicy) -> Self {
        Self {
            guest: false,
            lines: snapshot.lines.iter().map(CartLineView::from).collect(),
            totals: snapshot.totals,
            free_shipping_progress: policy.free_shipping_progress(snapshot.totals.subtotal),
        }
    }

    pub(super) fn guest(cart: &GuestCart, policy: &ShippingPolicy) -> Self {
        let totals = cart.totals(policy);
        Self {
            guest: true,
            lines: cart.lines.iter().map(CartLineView::from).collect(),
            totals,
            free_shipping_progress: policy.free_shipping_progress(totals.subtotal),
        }
    }
}

/// Add-to-cart request.
#[derive(Debug, Deserialize)]
pub struct AddItem {
    pub product_id: ProductId,
    /// Defaults to the product's first size.
    pub size: Option<String>,
    #[serde(default = "one")]
    pub quantity: u32,
}

const fn one() -> u32 {
    1
}

/// Quantity update request.
#[derive(Debug, Deserialize)]
pub struct UpdateItem {
    pub quantity: u32,
}

fn guest_key(line_id: &str) -> Result<(ProductId, String)> {
    GuestCart::parse_line_key(line_id)
        .ok_or_else(|| AppError::BadRequest(format!("invalid cart line id: {line_id}")))
}

/// Show the cart.
#[instrument(skip_all)]
pub async fn show(
    State(state): State<AppState>,
    OptionalAuth(auth): OptionalAuth,
    session: Session,
) -> Result<Json<CartView>> {
    let policy = state.cart().policy();
    if let Some(auth) = auth {
        let snapshot = state.cart().load(Some(&auth)).await?;
        return Ok(Json(CartView::remote(&snapshot, policy)));
    }
    let guest = load_guest_cart(&SessionStore::new(session)).await?;
    Ok(Json(CartView::guest(&guest, policy)))
}

/// Add a product to the cart.
#[instrument(skip(state, auth, session))]
pub async fn add(
    State(state): State<AppState>,
    OptionalAuth(auth): OptionalAuth,
    session: Session,
    Json(item): Json<AddItem>,
) -> Result<Json<CartView>> {
    let product = state.catalog().product(item.product_id).await?;
    let line = product
        .cart_line_or_default(item.size.as_deref(), item.quantity)
        .map_err(CartError::from)?;
    let policy = state.cart().policy();

    if let Some(auth) = auth {
        let snapshot = state.cart().add(Some(&auth), line).await?;
        return Ok(Json(CartView::remote(&snapshot, policy)));
    }
    let guest = add_guest_line(&SessionStore::new(session), line).await?;
    Ok(Json(CartView::guest(&guest, policy)))
}

/// Change a line's quantity.
#[instrument(skip(state, auth, session))]
pub async fn update(
    State(state): State<AppState>,
    OptionalAuth(auth): OptionalAuth,
    session: Session,
    Path(line_id): Path<String>,
    Json(item): Json<UpdateItem>,
) -> Result<Json<CartView>> {
    let policy = state.cart().policy();
    if let Some(auth) = auth {
        let snapshot = state
            .cart()
            .update_quantity(Some(&auth), &DocumentId::new(line_id), item.quantity)
            .await?;
        return Ok(Json(CartView::remote(&snapshot, policy)));
    }
    let (product_id, size) = guest_key(&line_id)?;
    let guest =
        set_guest_quantity(&SessionStore::new(session), product_id, &size, item.quantity).await?;
    Ok(Json(CartView::guest(&guest, policy)))
}

/// Remove a line.
#[instrument(skip(state, auth, session))]
pub async fn remove(
    State(state): State<AppState>,
    OptionalAuth(auth): OptionalAuth,
    session: Session,
    Path(line_id): Path<String>,
) -> Result<Json<CartView>> {
    let policy = state.cart().policy();
    if let Some(auth) = auth {
        let snapshot = state
            .cart()
            .remove(Some(&auth), &DocumentId::new(line_id))
            .await?;
        return Ok(Json(CartView::remote(&snapshot, policy)));
    }
    let (product_id, size) = guest_key(&line_id)?;
    let guest = remove_guest_line(&SessionStore::new(session), product_id, &size).await?;
    Ok(Json(CartView::guest(&guest, policy)))
}

/// Empty the cart.
#[instrument(skip_all)]
pub async fn clear(
    State(state): State<AppState>,
    OptionalAuth(auth): OptionalAuth,
    session: Session,
) -> Result<Json<CartView>> {
    let policy = state.cart().policy();
    if let Some(auth) = auth {
        let snapshot = state.cart().clear(Some(&auth)).await?;
        return Ok(Json(CartView::remote(&snapshot, policy)));
    }
    let empty = GuestCart::default();
    save_guest_cart(&SessionStore::new(session), &empty).await?;
    Ok(Json(CartView::guest(&empty, policy)))
}
