//! Headless CMS REST client.
//!
//! # Architecture
//!
//! - The CMS is the source of truth for carts, wishlists, products and orders.
//!   Nothing is synced locally; every mutation is followed by a re-fetch.
//! - Product lists and categories are cached in memory via `moka`.
//! - User-owned rows are filtered by `users_permissions_user` and addressed
//!   by `documentId` for updates and deletes.
//!
//! # Example
//!
//! ```rust,ignore
//! use zone7_storefront::cms::{CmsClient, CatalogRepository};
//!
//! let client = CmsClient::new(&config.cms)?;
//! let products = client.list_products().await?;
//! ```

mod cache;
mod client;
mod conversions;
pub mod repository;
pub mod types;

pub use client::CmsClient;
pub use conversions::resolve_media_url;
pub use repository::{
    AuthRepository, CartRepository, CatalogRepository, OrderRepository, WishlistRepository,
};

use thiserror::Error;

/// Errors that can occur when talking to the CMS.
#[derive(Debug, Error)]
pub enum CmsError {
    /// HTTP request failed (connection, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body did not match the expected shape.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// An endpoint URL could not be built.
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Missing, expired or insufficient credentials.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Rate limited by the CMS.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Any other non-success response, with the CMS's own message.
    #[error("CMS error {status}: {message}")]
    Api { status: u16, message: String },
}

impl CmsError {
    /// Whether the CMS rejected the request itself (a 4xx other than auth).
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(self, Self::Api { status, .. } if *status >= 400 && *status < 500)
    }
}
