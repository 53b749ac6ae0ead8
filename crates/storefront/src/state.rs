//! Application state shared across handlers.

use std::sync::Arc;

use crate::cms::{CmsClient, CmsError};
use crate::config::StorefrontConfig;
use crate::services::{
    AuthService, CartService, CatalogService, CheckoutService, InFlight, OrderService,
    WishlistService,
};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc`. Every service talks to the
/// CMS through the same [`CmsClient`], so they share one connection pool and
/// one catalog cache.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    cms: CmsClient,
    catalog: CatalogService<CmsClient>,
    cart: CartService<CmsClient>,
    wishlist: WishlistService<CmsClient>,
    auth: AuthService<CmsClient, CmsClient>,
    checkout: CheckoutService<CmsClient>,
    orders: OrderService<CmsClient>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the CMS client cannot be built from the config.
    pub fn new(config: StorefrontConfig) -> Result<Self, CmsError> {
        let cms = CmsClient::new(&config.client.cms)?;
        let cart = CartService::new(cms.clone(), config.client.shipping, InFlight::new());

        Ok(Self {
            inner: Arc::new(AppStateInner {
                catalog: CatalogService::new(cms.clone()),
                wishlist: WishlistService::new(cms.clone(), InFlight::new()),
                auth: AuthService::new(cms.clone(), cart.clone()),
                checkout: CheckoutService::new(cms.clone(), cart.clone()),
                orders: OrderService::new(cms.clone()),
                cart,
                cms,
                config,
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// The raw CMS client.
    #[must_use]
    pub fn cms(&self) -> &CmsClient {
        &self.inner.cms
    }

    #[must_use]
    pub fn catalog(&self) -> &CatalogService<CmsClient> {
        &self.inner.catalog
    }

    #[must_use]
    pub fn cart(&self) -> &CartService<CmsClient> {
        &self.inner.cart
    }

    #[must_use]
    pub fn wishlist(&self) -> &WishlistService<CmsClient> {
        &self.inner.wishlist
    }

    #[must_use]
    pub fn auth(&self) -> &AuthService<CmsClient, CmsClient> {
        &self.inner.auth
    }

    #[must_use]
    pub fn checkout(&self) -> &CheckoutService<CmsClient> {
        &self.inner.checkout
    }

    #[must_use]
    pub fn orders(&self) -> &OrderService<CmsClient> {
        &self.inner.orders
    }
}
