//! Checkout and order history.

use zone7_core::order::CheckoutForm;

use crate::context::{CliError, Context};
use crate::output::{print_json, print_message};

/// Revalidate the cart against current stock and prices.
///
/// # Errors
///
/// Returns `NotLoggedIn`, or the revalidation error (e.g. stock changed).
pub async fn review(ctx: &Context) -> Result<(), CliError> {
    let auth = ctx.require_session().await?;
    print_json(&ctx.checkout.review(&auth).await?)?;
    Ok(())
}

/// Place an order for the cart.
///
/// # Errors
///
/// Returns a form, revalidation or CMS error. The cart is kept on error.
pub async fn place(ctx: &Context, form: CheckoutForm) -> Result<(), CliError> {
    let auth = ctx.session().await?;
    let placed = ctx.checkout.place_order(auth.as_ref(), form).await?;
    if placed.cart.is_none() {
        tracing::warn!("Order placed but the cart could not be cleared");
    }
    print_json(&placed)?;
    print_message(&format!(
        "Order {} placed, total {}",
        placed.order.id,
        placed.totals.grand_total_price()
    ));
    Ok(())
}

/// List orders, newest first.
///
/// # Errors
///
/// Returns an error without a login or if the CMS fails.
pub async fn orders(ctx: &Context) -> Result<(), CliError> {
    let auth = ctx.session().await?;
    print_json(&ctx.orders.list(auth.as_ref()).await?)?;
    Ok(())
}
