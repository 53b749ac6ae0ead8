//! Wishlist commands. All require a login.

use serde::Serialize;
use zone7_core::ProductId;
use zone7_core::cart::CartSnapshot;
use zone7_core::wishlist::WishlistSnapshot;
use zone7_storefront::services::CartError;

use crate::context::{CliError, Context};
use crate::output::print_json;

#[derive(Serialize)]
struct MovedOutput<'a> {
    cart: &'a CartSnapshot,
    wishlist: &'a WishlistSnapshot,
}

/// Show the wishlist.
///
/// # Errors
///
/// Returns `Unauthorized` without a login, or a CMS error.
pub async fn show(ctx: &Context) -> Result<(), CliError> {
    let auth = ctx.session().await?;
    print_json(&ctx.wishlist.load(auth.as_ref()).await?)?;
    Ok(())
}

/// Save or unsave a product.
///
/// # Errors
///
/// Returns `Unauthorized` without a login, or a CMS error.
pub async fn toggle(ctx: &Context, product_id: i64) -> Result<(), CliError> {
    let auth = ctx.session().await?;
    let product = ctx.catalog.product(ProductId::new(product_id)).await?;
    let toggled = ctx
        .wishlist
        .toggle(auth.as_ref(), &product.wishlist_entry())
        .await?;
    print_json(&toggled)?;
    Ok(())
}

/// Move a saved product into the cart.
///
/// # Errors
///
/// Returns the cart error if the line is rejected; the entry stays saved.
pub async fn move_to_cart(
    ctx: &Context,
    product_id: i64,
    size: Option<&str>,
    quantity: u32,
) -> Result<(), CliError> {
    let auth = ctx.session().await?;
    let product = ctx.catalog.product(ProductId::new(product_id)).await?;
    let line = product
        .cart_line_or_default(size, quantity)
        .map_err(CartError::from)?;

    let (cart, wishlist) = ctx
        .wishlist
        .move_to_cart(&ctx.cart, auth.as_ref(), line)
        .await?;
    print_json(&MovedOutput {
        cart: &cart,
        wishlist: &wishlist,
    })?;
    Ok(())
}

/// Remove a product from the wishlist.
///
/// # Errors
///
/// Returns `Unauthorized` without a login, or a CMS error.
pub async fn remove(ctx: &Context, product_id: i64) -> Result<(), CliError> {
    let auth = ctx.session().await?;
    let snapshot = ctx
        .wishlist
        .remove(auth.as_ref(), ProductId::new(product_id))
        .await?;
    print_json(&snapshot)?;
    Ok(())
}

/// Empty the wishlist.
///
/// # Errors
///
/// Returns `Unauthorized` without a login, or a CMS error.
pub async fn clear(ctx: &Context) -> Result<(), CliError> {
    let auth = ctx.session().await?;
    print_json(&ctx.wishlist.clear(auth.as_ref()).await?)?;
    Ok(())
}
