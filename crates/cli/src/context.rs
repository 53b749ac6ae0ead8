//! Services wired to the CMS and the on-disk state file.

use std::path::PathBuf;

use thiserror::Error;
use zone7_storefront::cms::{CmsClient, CmsError};
use zone7_storefront::config::{ClientConfig, ConfigError};
use zone7_storefront::models::AuthSession;
use zone7_storefront::services::{
    AuthError, AuthService, CartError, CartService, CatalogService, CheckoutError,
    CheckoutService, InFlight, MoveToCartError, OrderService, WishlistError, WishlistService,
};
use zone7_storefront::store::{FileStore, StoreError};

/// State file used when `ZONE7_STATE_FILE` is unset.
pub const DEFAULT_STATE_FILE: &str = ".zone7-state.json";

/// Errors surfaced to the user.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("not logged in (run `z7 auth login`)")]
    NotLoggedIn,

    #[error("invalid cart line id: {0}")]
    InvalidLineId(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Cms(#[from] CmsError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Cart(#[from] CartError),

    #[error(transparent)]
    Wishlist(#[from] WishlistError),

    #[error(transparent)]
    MoveToCart(#[from] MoveToCartError),

    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("could not write output: {0}")]
    Output(#[from] serde_json::Error),
}

/// Everything a command needs.
pub struct Context {
    pub store: FileStore,
    pub catalog: CatalogService<CmsClient>,
    pub cart: CartService<CmsClient>,
    pub wishlist: WishlistService<CmsClient>,
    pub auth: AuthService<CmsClient, CmsClient>,
    pub checkout: CheckoutService<CmsClient>,
    pub orders: OrderService<CmsClient>,
}

impl Context {
    /// Build the services from environment configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the CMS settings are missing or invalid.
    pub fn from_env() -> Result<Self, CliError> {
        let config = ClientConfig::from_env()?;
        let state_file = std::env::var("ZONE7_STATE_FILE")
            .map_or_else(|_| PathBuf::from(DEFAULT_STATE_FILE), PathBuf::from);
        Self::new(&config, FileStore::new(state_file))
    }

    /// Build the services against an explicit config and store.
    ///
    /// # Errors
    ///
    /// Returns an error if the CMS client cannot be built.
    pub fn new(config: &ClientConfig, store: FileStore) -> Result<Self, CliError> {
        let cms = CmsClient::new(&config.cms)?;
        let cart = CartService::new(cms.clone(), config.shipping, InFlight::new());
        tracing::debug!(state_file = %store.path().display(), "Using state file");

        Ok(Self {
            store,
            catalog: CatalogService::new(cms.clone()),
            wishlist: WishlistService::new(cms.clone(), InFlight::new()),
            auth: AuthService::new(cms.clone(), cart.clone()),
            checkout: CheckoutService::new(cms.clone(), cart.clone()),
            orders: OrderService::new(cms),
            cart,
        })
    }

    /// The stored login, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the state file cannot be read.
    pub async fn session(&self) -> Result<Option<AuthSession>, CliError> {
        Ok(self.auth.current(&self.store).await?)
    }

    /// The stored login, or `NotLoggedIn`.
    ///
    /// # Errors
    ///
    /// Returns `NotLoggedIn` when there is no session.
    pub async fn require_session(&self) -> Result<AuthSession, CliError> {
        self.session().await?.ok_or(CliError::NotLoggedIn)
    }
}
