//! Cart commands.
//!
//! Logged in, these work on the CMS cart and lines are addressed by their
//! CMS document id. Otherwise they work on the guest cart in the state file,
//! addressed as `{product_id}:{size}`.

use serde::Serialize;
use zone7_core::cart::{CartSnapshot, GuestCart, ShippingPolicy, Totals};
use zone7_core::{DocumentId, ProductId};
use zone7_storefront::services::cart::{
    CartError, add_guest_line, load_guest_cart, remove_guest_line, save_guest_cart,
    set_guest_quantity,
};

use crate::context::{CliError, Context};
use crate::output::print_json;

#[derive(Serialize)]
struct CartOutput<'a, L> {
    guest: bool,
    lines: &'a [L],
    totals: Totals,
}

fn print_remote(snapshot: &CartSnapshot) -> Result<(), CliError> {
    print_json(&CartOutput {
        guest: false,
        lines: &snapshot.lines,
        totals: snapshot.totals,
    })?;
    Ok(())
}

fn print_guest(cart: &GuestCart, policy: &ShippingPolicy) -> Result<(), CliError> {
    print_json(&CartOutput {
        guest: true,
        lines: &cart.lines,
        totals: cart.totals(policy),
    })?;
    Ok(())
}

fn guest_key(line_id: &str) -> Result<(ProductId, String), CliError> {
    GuestCart::parse_line_key(line_id).ok_or_else(|| CliError::InvalidLineId(line_id.to_owned()))
}

/// Show the cart.
///
/// # Errors
///
/// Returns a CMS or state file error.
pub async fn show(ctx: &Context) -> Result<(), CliError> {
    match ctx.session().await? {
        Some(auth) => print_remote(&ctx.cart.load(Some(&auth)).await?),
        None => print_guest(&load_guest_cart(&ctx.store).await?, ctx.cart.policy()),
    }
}

/// Add a product, defaulting to its first size.
///
/// # Errors
///
/// Returns an error if the size is unavailable or the quantity would
/// exceed stock.
pub async fn add(
    ctx: &Context,
    product_id: i64,
    size: Option<&str>,
    quantity: u32,
) -> Result<(), CliError> {
    let product = ctx.catalog.product(ProductId::new(product_id)).await?;
    let line = product
        .cart_line_or_default(size, quantity)
        .map_err(CartError::from)?;

    match ctx.session().await? {
        Some(auth) => print_remote(&ctx.cart.add(Some(&auth), line).await?),
        None => print_guest(&add_guest_line(&ctx.store, line).await?, ctx.cart.policy()),
    }
}

/// Set a line's quantity, clamped to the available stock.
///
/// # Errors
///
/// Returns an error if the line does not exist.
pub async fn set(ctx: &Context, line_id: &str, quantity: u32) -> Result<(), CliError> {
    if let Some(auth) = ctx.session().await? {
        let id = DocumentId::new(line_id);
        return print_remote(&ctx.cart.update_quantity(Some(&auth), &id, quantity).await?);
    }
    let (product_id, size) = guest_key(line_id)?;
    let cart = set_guest_quantity(&ctx.store, product_id, &size, quantity).await?;
    print_guest(&cart, ctx.cart.policy())
}

/// Remove a line.
///
/// # Errors
///
/// Returns an error if the line does not exist.
pub async fn remove(ctx: &Context, line_id: &str) -> Result<(), CliError> {
    if let Some(auth) = ctx.session().await? {
        let id = DocumentId::new(line_id);
        return print_remote(&ctx.cart.remove(Some(&auth), &id).await?);
    }
    let (product_id, size) = guest_key(line_id)?;
    let cart = remove_guest_line(&ctx.store, product_id, &size).await?;
    print_guest(&cart, ctx.cart.policy())
}

/// Empty the cart.
///
/// # Errors
///
/// Returns a CMS or state file error.
pub async fn clear(ctx: &Context) -> Result<(), CliError> {
    if let Some(auth) = ctx.session().await? {
        return print_remote(&ctx.cart.clear(Some(&auth)).await?);
    }
    let empty = GuestCart::default();
    save_guest_cart(&ctx.store, &empty).await?;
    print_guest(&empty, ctx.cart.policy())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_guest_key_parses_product_and_size() {
        let (product_id, size) = guest_key("12:XL").unwrap();
        assert_eq!(product_id, ProductId::new(12));
        assert_eq!(size, "XL");
        assert!(matches!(guest_key("nope"), Err(CliError::InvalidLineId(_))));
    }
}
