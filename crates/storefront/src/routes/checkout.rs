//! Checkout and order history handlers.

use axum::{Json, extract::State, http::StatusCode};
use tracing::instrument;
use zone7_core::order::{CheckoutForm, Order};

use crate::error::Result;
use crate::middleware::{OptionalAuth, RequireAuth};
use crate::services::{CheckoutReview, PlacedOrder};
use crate::state::AppState;

/// Revalidated cart and totals, without placing an order.
#[instrument(skip_all)]
pub async fn review(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
) -> Result<Json<CheckoutReview>> {
    Ok(Json(state.checkout().review(&auth).await?))
}

/// Place an order for the cart.
#[instrument(skip_all)]
pub async fn place(
    State(state): State<AppState>,
    OptionalAuth(auth): OptionalAuth,
    Json(form): Json<CheckoutForm>,
) -> Result<(StatusCode, Json<PlacedOrder>)> {
    let placed = state.checkout().place_order(auth.as_ref(), form).await?;
    Ok((StatusCode::CREATED, Json(placed)))
}

/// The shopper's orders, newest first.
#[instrument(skip_all)]
pub async fn orders(
    State(state): State<AppState>,
    OptionalAuth(auth): OptionalAuth,
) -> Result<Json<Vec<Order>>> {
    Ok(Json(state.orders().list(auth.as_ref()).await?))
}
