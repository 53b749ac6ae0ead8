//! Checkout with server-side revalidation.
//!
//! Cart totals shown while browsing are computed from whatever was loaded
//! last. Before an order is posted the cart is reloaded and every line is
//! checked against a fresh product fetch: stock must still cover the
//! quantity and the unit price is replaced by the current final price. The
//! cart is cleared only once the CMS has accepted the order.

use serde::Serialize;
use thiserror::Error;
use tracing::instrument;
use zone7_core::OrderStatus;
use zone7_core::cart::{CartSnapshot, Totals};
use zone7_core::order::{CheckoutForm, CheckoutFormError, NewOrder, Order, OrderItem};

use super::cart::{CartError, CartService};
use crate::cms::{CartRepository, CatalogRepository, CmsError, OrderRepository};
use crate::models::AuthSession;

/// Errors that can occur at checkout.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("please log in to check out")]
    Unauthorized,

    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("we do not deliver to {0}")]
    UnsupportedCity(String),

    #[error("your cart is empty")]
    EmptyCart,

    #[error("only {available} of {product} (size {size}) left, but your cart has {requested}")]
    StockChanged {
        product: String,
        size: String,
        available: u32,
        requested: u32,
    },

    #[error(transparent)]
    Cart(#[from] CartError),

    #[error("checkout service error: {0}")]
    Cms(#[from] CmsError),
}

impl From<CheckoutFormError> for CheckoutError {
    fn from(err: CheckoutFormError) -> Self {
        match err {
            CheckoutFormError::MissingField(field) => Self::MissingField(field),
            CheckoutFormError::UnsupportedCity(city) => Self::UnsupportedCity(city),
        }
    }
}

/// Revalidated cart contents, ready to be ordered.
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutReview {
    pub items: Vec<OrderItem>,
    pub totals: Totals,
}

/// A placed order.
#[derive(Debug, Clone, Serialize)]
pub struct PlacedOrder {
    pub order: Order,
    pub totals: Totals,
    /// The cart after clearing, or `None` if clearing failed.
    pub cart: Option<CartSnapshot>,
}

/// Checkout over a CMS that serves carts, products and orders.
#[derive(Debug, Clone)]
pub struct CheckoutService<R> {
    repo: R,
    cart: CartService<R>,
}

impl<R> CheckoutService<R>
where
    R: CartRepository + CatalogRepository + OrderRepository,
{
    #[must_use]
    pub const fn new(repo: R, cart: CartService<R>) -> Self {
        Self { repo, cart }
    }

    /// Reload the cart and revalidate every line against current stock and
    /// prices.
    ///
    /// # Errors
    ///
    /// Returns `EmptyCart`, `StockChanged` for the first line that can no
    /// longer be fulfilled, or a CMS error.
    #[instrument(skip_all, fields(user_id = %auth.user_id()))]
    pub async fn review(&self, auth: &AuthSession) -> Result<CheckoutReview, CheckoutError> {
        let snapshot = self.cart.load(Some(auth)).await?;
        if snapshot.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let mut items = Vec::with_capacity(snapshot.lines.len());
        for line in &snapshot.lines {
            let product = match self.repo.fetch_product_fresh(line.product_id).await {
                Ok(product) => Some(product),
                Err(CmsError::NotFound(_)) => None,
                Err(e) => return Err(e.into()),
            };

            let available = product
                .as_ref()
                .and_then(|p| p.size(&line.size))
                .map_or(0, |s| s.stock);
            if available < line.quantity {
                return Err(CheckoutError::StockChanged {
                    product: line.name.clone(),
                    size: line.size.clone(),
                    available,
                    requested: line.quantity,
                });
            }

            let mut item = OrderItem::from(line);
            if let Some(product) = product {
                let price = product.final_price();
                if price != item.unit_price {
                    tracing::info!(
                        product_id = %line.product_id,
                        old = %item.unit_price,
                        new = %price,
                        "Cart price refreshed at checkout"
                    );
                }
                item.unit_price = price;
            }
            items.push(item);
        }

        let totals = Totals::compute(
            items.iter().map(|i| (i.unit_price, i.quantity)),
            self.cart.policy(),
        );
        Ok(CheckoutReview { items, totals })
    }

    /// Validate the form, revalidate the cart, post the order and clear the
    /// cart.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized`, a form error, any [`Self::review`] error, or
    /// the CMS error from posting the order. The cart is untouched on error.
    #[instrument(skip_all)]
    pub async fn place_order(
        &self,
        auth: Option<&AuthSession>,
        form: CheckoutForm,
    ) -> Result<PlacedOrder, CheckoutError> {
        let auth = auth.ok_or(CheckoutError::Unauthorized)?;
        let form = form.validate()?;
        let review = self.review(auth).await?;

        let new_order = NewOrder {
            user_id: auth.user_id(),
            form,
            items: review.items,
            grand_total: review.totals.grand_total,
            status: OrderStatus::Pending,
        };
        let order = self.repo.create_order(auth, &new_order).await?;
        tracing::info!(order_id = %order.id, total = %order.grand_total, "Order placed");

        let cart = match self.cart.clear(Some(auth)).await {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                tracing::error!(error = %e, order_id = %order.id, "Order placed but cart not cleared");
                None
            }
        };

        Ok(PlacedOrder {
            order,
            totals: review.totals,
            cart,
        })
    }
}
