//! Storefront services.
//!
//! Each service is generic over the repository traits in [`crate::cms`] and
//! is cheap to clone. Mutations reload the authoritative state from the CMS
//! before returning it.
//!
//! # Services
//!
//! - [`cart`] - Cart reconciliation and the guest cart
//! - [`wishlist`] - Wishlist reconciliation and move-to-cart
//! - [`auth`] - Login, registration, logout and guest cart merge
//! - [`checkout`] - Revalidated order placement
//! - [`orders`] - Order history
//! - [`catalog`] - Product listing, search and the shop page
//! - [`filters`] - Persisted shop filter state

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod filters;
pub mod in_flight;
pub mod orders;
pub mod wishlist;

#[cfg(test)]
pub(crate) mod testing;

pub use auth::{AuthError, AuthService, Registration, SignedIn};
pub use cart::{CartError, CartService, MergeReport, load_guest_cart, save_guest_cart};
pub use catalog::{CatalogService, ProductDetail, ShopPage};
pub use checkout::{CheckoutError, CheckoutReview, CheckoutService, PlacedOrder};
pub use filters::{apply_filter_action, load_filters, save_filters};
pub use in_flight::InFlight;
pub use orders::OrderService;
pub use wishlist::{MoveToCartError, ToggleOutcome, Toggled, WishlistError, WishlistService};
