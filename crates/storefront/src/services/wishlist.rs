//! Wishlist reconciliation.
//!
//! Same shape as the cart, without quantities. Membership checks are a scan
//! over the last loaded snapshot.

use serde::Serialize;
use thiserror::Error;
use tracing::instrument;
use zone7_core::ProductId;
use zone7_core::cart::{CartSnapshot, NewCartLine};
use zone7_core::wishlist::{NewWishlistEntry, WishlistSnapshot};

use super::cart::{CartError, CartService};
use super::in_flight::{InFlight, InFlightGuard};
use crate::cms::{CartRepository, CmsError, WishlistRepository};
use crate::models::AuthSession;

/// Errors from wishlist operations.
#[derive(Debug, Error)]
pub enum WishlistError {
    #[error("please log in to use your wishlist")]
    Unauthorized,

    #[error("an update for this product is already in progress")]
    Busy,

    #[error("wishlist service error: {0}")]
    Cms(#[from] CmsError),
}

/// Errors from moving a wishlist entry into the cart.
#[derive(Debug, Error)]
pub enum MoveToCartError {
    #[error(transparent)]
    Cart(#[from] CartError),

    #[error(transparent)]
    Wishlist(#[from] WishlistError),
}

/// What a toggle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToggleOutcome {
    Added,
    Removed,
}

/// Result of a toggle: the outcome and the reloaded wishlist.
#[derive(Debug, Clone, Serialize)]
pub struct Toggled {
    pub outcome: ToggleOutcome,
    pub snapshot: WishlistSnapshot,
}

fn require(auth: Option<&AuthSession>) -> Result<&AuthSession, WishlistError> {
    auth.ok_or(WishlistError::Unauthorized)
}

/// Wishlist operations for the authenticated user.
#[derive(Debug, Clone)]
pub struct WishlistService<R> {
    repo: R,
    in_flight: InFlight,
}

impl<R: WishlistRepository> WishlistService<R> {
    #[must_use]
    pub const fn new(repo: R, in_flight: InFlight) -> Self {
        Self { repo, in_flight }
    }

    fn claim(
        &self,
        auth: &AuthSession,
        product_id: ProductId,
    ) -> Result<InFlightGuard, WishlistError> {
        self.in_flight
            .try_acquire(auth.user_id(), product_id)
            .ok_or(WishlistError::Busy)
    }

    async fn reload(&self, auth: &AuthSession) -> Result<WishlistSnapshot, WishlistError> {
        Ok(WishlistSnapshot::new(self.repo.list_wishlist(auth).await?))
    }

    /// Load the authoritative wishlist.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` without a session, or a CMS error.
    #[instrument(skip_all)]
    pub async fn load(&self, auth: Option<&AuthSession>) -> Result<WishlistSnapshot, WishlistError> {
        self.reload(require(auth)?).await
    }

    /// Save a product. Saving one already present changes nothing.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized`, `Busy` or a CMS error.
    #[instrument(skip_all, fields(product_id = %entry.product_id))]
    pub async fn add(
        &self,
        auth: Option<&AuthSession>,
        entry: &NewWishlistEntry,
    ) -> Result<WishlistSnapshot, WishlistError> {
        let auth = require(auth)?;
        let guard = self.claim(auth, entry.product_id)?;

        let current = self.reload(auth).await?;
        if current.contains(entry.product_id) {
            return Ok(current);
        }
        self.repo.create_wishlist_entry(auth, entry).await?;

        drop(guard);
        self.reload(auth).await
    }

    /// Remove every entry for a product. Removing an absent product changes
    /// nothing.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized`, `Busy` or a CMS error.
    #[instrument(skip_all, fields(product_id = %product_id))]
    pub async fn remove(
        &self,
        auth: Option<&AuthSession>,
        product_id: ProductId,
    ) -> Result<WishlistSnapshot, WishlistError> {
        let auth = require(auth)?;
        let guard = self.claim(auth, product_id)?;

        let current = self.reload(auth).await?;
        for entry in current.entries.iter().filter(|e| e.product_id == product_id) {
            self.repo.delete_wishlist_entry(auth, &entry.id).await?;
        }

        drop(guard);
        self.reload(auth).await
    }

    /// Remove the product if saved, otherwise save it.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized`, `Busy` or a CMS error.
    #[instrument(skip_all, fields(product_id = %entry.product_id))]
    pub async fn toggle(
        &self,
        auth: Option<&AuthSession>,
        entry: &NewWishlistEntry,
    ) -> Result<Toggled, WishlistError> {
        let auth = require(auth)?;
        let guard = self.claim(auth, entry.product_id)?;

        let current = self.reload(auth).await?;
        let existing: Vec<_> = current
            .entries
            .iter()
            .filter(|e| e.product_id == entry.product_id)
            .collect();

        let outcome = if existing.is_empty() {
            self.repo.create_wishlist_entry(auth, entry).await?;
            ToggleOutcome::Added
        } else {
            for e in existing {
                self.repo.delete_wishlist_entry(auth, &e.id).await?;
            }
            ToggleOutcome::Removed
        };

        drop(guard);
        Ok(Toggled {
            outcome,
            snapshot: self.reload(auth).await?,
        })
    }

    /// Delete every entry, one at a time, then reload.
    ///
    /// # Errors
    ///
    /// Stops at the first failed delete.
    #[instrument(skip_all)]
    pub async fn clear(&self, auth: Option<&AuthSession>) -> Result<WishlistSnapshot, WishlistError> {
        let auth = require(auth)?;
        let current = self.reload(auth).await?;
        for entry in &current.entries {
            self.repo.delete_wishlist_entry(auth, &entry.id).await?;
        }
        self.reload(auth).await
    }

    /// Add a saved product to the cart, then drop it from the wishlist.
    ///
    /// The wishlist entry is kept if the cart rejects the line.
    ///
    /// # Errors
    ///
    /// Returns the cart error (e.g. `StockExceeded`) or the wishlist error.
    #[instrument(skip_all, fields(product_id = %line.product_id, size = %line.size))]
    pub async fn move_to_cart<C: CartRepository>(
        &self,
        cart: &CartService<C>,
        auth: Option<&AuthSession>,
        line: NewCartLine,
    ) -> Result<(CartSnapshot, WishlistSnapshot), MoveToCartError> {
        let product_id = line.product_id;
        let cart_snapshot = cart.add(auth, line).await?;
        let wishlist = self.remove(auth, product_id).await?;
        Ok((cart_snapshot, wishlist))
    }
}
