//! Repository seams over the CMS.
//!
//! Services are generic over these traits; [`super::CmsClient`] implements all
//! of them against the REST API and tests substitute in-memory fakes.

use std::future::Future;

use zone7_core::cart::{CartLine, NewCartLine};
use zone7_core::catalog::{Category, Product};
use zone7_core::order::{NewOrder, Order};
use zone7_core::wishlist::{NewWishlistEntry, WishlistEntry};
use zone7_core::{DocumentId, ProductId};

use super::CmsError;
use crate::models::AuthSession;

/// Remote cart rows owned by the authenticated user.
pub trait CartRepository: Send + Sync {
    /// All of the user's cart lines.
    fn list_cart(
        &self,
        auth: &AuthSession,
    ) -> impl Future<Output = Result<Vec<CartLine>, CmsError>> + Send;

    fn create_cart_line(
        &self,
        auth: &AuthSession,
        line: &NewCartLine,
    ) -> impl Future<Output = Result<(), CmsError>> + Send;

    /// Set a line's quantity. `max_stock`, when given, replaces the stored
    /// stock cap as well.
    fn update_cart_quantity(
        &self,
        auth: &AuthSession,
        id: &DocumentId,
        quantity: u32,
        max_stock: Option<u32>,
    ) -> impl Future<Output = Result<(), CmsError>> + Send;

    fn delete_cart_line(
        &self,
        auth: &AuthSession,
        id: &DocumentId,
    ) -> impl Future<Output = Result<(), CmsError>> + Send;
}

/// Remote wishlist rows owned by the authenticated user.
pub trait WishlistRepository: Send + Sync {
    fn list_wishlist(
        &self,
        auth: &AuthSession,
    ) -> impl Future<Output = Result<Vec<WishlistEntry>, CmsError>> + Send;

    fn create_wishlist_entry(
        &self,
        auth: &AuthSession,
        entry: &NewWishlistEntry,
    ) -> impl Future<Output = Result<(), CmsError>> + Send;

    fn delete_wishlist_entry(
        &self,
        auth: &AuthSession,
        id: &DocumentId,
    ) -> impl Future<Output = Result<(), CmsError>> + Send;
}

/// Read-only product catalog.
pub trait CatalogRepository: Send + Sync {
    /// Every product. May be served from cache.
    fn list_products(&self) -> impl Future<Output = Result<Vec<Product>, CmsError>> + Send;

    /// One product. May be served from cache.
    fn get_product(
        &self,
        id: ProductId,
    ) -> impl Future<Output = Result<Product, CmsError>> + Send;

    /// One product, always fetched from the CMS.
    fn fetch_product_fresh(
        &self,
        id: ProductId,
    ) -> impl Future<Output = Result<Product, CmsError>> + Send;

    fn list_categories(&self) -> impl Future<Output = Result<Vec<Category>, CmsError>> + Send;
}

/// Orders placed by the authenticated user.
pub trait OrderRepository: Send + Sync {
    fn create_order(
        &self,
        auth: &AuthSession,
        order: &NewOrder,
    ) -> impl Future<Output = Result<Order, CmsError>> + Send;

    /// The user's orders, newest first.
    fn list_orders(
        &self,
        auth: &AuthSession,
    ) -> impl Future<Output = Result<Vec<Order>, CmsError>> + Send;
}

/// Credential exchange with the CMS user store.
pub trait AuthRepository: Send + Sync {
    fn login(
        &self,
        identifier: &str,
        password: &str,
    ) -> impl Future<Output = Result<AuthSession, CmsError>> + Send;

    fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<AuthSession, CmsError>> + Send;
}
