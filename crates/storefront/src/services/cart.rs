//! Cart reconciliation.
//!
//! The CMS holds the authoritative cart. Every mutation here is
//! read-check-write followed by a full reload, so the returned
//! [`CartSnapshot`] always reflects what the CMS stored. Quantity rules come
//! from [`zone7_core::cart`] and are applied before anything is written.

use serde::Serialize;
use thiserror::Error;
use tracing::instrument;
use zone7_core::cart::{
    CartSnapshot, GuestCart, NewCartLine, QuantityError, ShippingPolicy, clamp_quantity,
    increased_quantity, initial_quantity,
};
use zone7_core::catalog::SizeUnavailable;
use zone7_core::{DocumentId, ProductId};

use super::in_flight::{InFlight, InFlightGuard};
use crate::cms::{CartRepository, CmsError};
use crate::models::AuthSession;
use crate::store::{LocalStore, StoreError, keys};

/// Errors from cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    #[error("please log in to use your cart")]
    Unauthorized,

    #[error("quantity must be at least 1")]
    InvalidQuantity,

    #[error("only {available} more in stock")]
    StockExceeded { available: u32, requested: u32 },

    #[error(transparent)]
    SizeUnavailable(#[from] SizeUnavailable),

    #[error("cart item not found")]
    NotFound,

    #[error("an update for this product is already in progress")]
    Busy,

    #[error("cart service error: {0}")]
    Cms(#[from] CmsError),

    #[error("could not save cart: {0}")]
    Store(#[from] StoreError),
}

impl CartError {
    fn from_quantity(err: QuantityError, requested: u32) -> Self {
        match err {
            QuantityError::Zero => Self::InvalidQuantity,
            QuantityError::OutOfStock => Self::StockExceeded {
                available: 0,
                requested,
            },
            QuantityError::StockExceeded {
                available,
                requested,
            } => Self::StockExceeded {
                available,
                requested,
            },
        }
    }
}

fn require(auth: Option<&AuthSession>) -> Result<&AuthSession, CartError> {
    auth.ok_or(CartError::Unauthorized)
}

/// One guest line's fate during a merge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergeLine {
    pub product_id: ProductId,
    pub name: String,
    pub size: String,
    pub requested: u32,
    pub added: u32,
}

/// Outcome of merging a guest cart into the user's cart.
#[derive(Debug, Clone, Serialize)]
pub struct MergeReport {
    /// Added in full.
    pub merged: Vec<MergeLine>,
    /// Added, but trimmed to the remaining stock.
    pub capped: Vec<MergeLine>,
    /// Not added: no stock left for the size.
    pub skipped: Vec<MergeLine>,
    /// Not added: the CMS rejected the write.
    pub failed: Vec<MergeLine>,
    pub snapshot: CartSnapshot,
}

impl MergeReport {
    /// Whether every guest line made it into the cart unchanged.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.capped.is_empty() && self.skipped.is_empty() && self.failed.is_empty()
    }
}

// =============================================================================
// CartService
// =============================================================================

/// Cart operations for the authenticated user.
#[derive(Debug, Clone)]
pub struct CartService<R> {
    repo: R,
    policy: ShippingPolicy,
    in_flight: InFlight,
}

impl<R: CartRepository> CartService<R> {
    #[must_use]
    pub const fn new(repo: R, policy: ShippingPolicy, in_flight: InFlight) -> Self {
        Self {
            repo,
            policy,
            in_flight,
        }
    }

    #[must_use]
    pub const fn policy(&self) -> &ShippingPolicy {
        &self.policy
    }

    fn claim(&self, auth: &AuthSession, product_id: ProductId) -> Result<InFlightGuard, CartError> {
        self.in_flight
            .try_acquire(auth.user_id(), product_id)
            .ok_or(CartError::Busy)
    }

    async fn reload(&self, auth: &AuthSession) -> Result<CartSnapshot, CartError> {
        let lines = self.repo.list_cart(auth).await?;
        Ok(CartSnapshot::new(lines, &self.policy))
    }

    /// Load the authoritative cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Unauthorized` without a session, or a CMS error.
    #[instrument(skip_all)]
    pub async fn load(&self, auth: Option<&AuthSession>) -> Result<CartSnapshot, CartError> {
        self.reload(require(auth)?).await
    }

    /// Add a line, merging into an existing (product, size) line.
    ///
    /// # Errors
    ///
    /// Fails with `InvalidQuantity` for zero, `StockExceeded` rather than
    /// overshooting the size's stock, and `Busy` if another change to the
    /// same product is still running.
    #[instrument(skip_all, fields(product_id = %line.product_id, size = %line.size, quantity = line.quantity))]
    pub async fn add(
        &self,
        auth: Option<&AuthSession>,
        line: NewCartLine,
    ) -> Result<CartSnapshot, CartError> {
        let auth = require(auth)?;
        if line.quantity == 0 {
            return Err(CartError::InvalidQuantity);
        }
        let guard = self.claim(auth, line.product_id)?;

        let current = self.repo.list_cart(auth).await?;
        if let Some(existing) = current
            .iter()
            .find(|l| l.matches(line.product_id, &line.size))
        {
            let quantity = increased_quantity(existing.quantity, line.quantity, line.max_stock)
                .map_err(|e| CartError::from_quantity(e, line.quantity))?;
            self.repo
                .update_cart_quantity(auth, &existing.id, quantity, Some(line.max_stock))
                .await?;
        } else {
            let quantity = initial_quantity(line.quantity, line.max_stock)
                .map_err(|e| CartError::from_quantity(e, line.quantity))?;
            self.repo
                .create_cart_line(auth, &NewCartLine { quantity, ..line })
                .await?;
        }

        drop(guard);
        self.reload(auth).await
    }

    /// Set a line's quantity, clamped to `[1, max_stock]`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the line is not in the user's cart.
    #[instrument(skip_all, fields(line_id = %line_id, quantity = quantity))]
    pub async fn update_quantity(
        &self,
        auth: Option<&AuthSession>,
        line_id: &DocumentId,
        quantity: u32,
    ) -> Result<CartSnapshot, CartError> {
        let auth = require(auth)?;
        let current = self.reload(auth).await?;
        let line = current.get(line_id).ok_or(CartError::NotFound)?;
        let guard = self.claim(auth, line.product_id)?;

        let quantity = clamp_quantity(quantity, line.max_stock);
        self.repo
            .update_cart_quantity(auth, line_id, quantity, None)
            .await?;

        drop(guard);
        self.reload(auth).await
    }

    /// Delete a line.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the line is not in the user's cart.
    #[instrument(skip_all, fields(line_id = %line_id))]
    pub async fn remove(
        &self,
        auth: Option<&AuthSession>,
        line_id: &DocumentId,
    ) -> Result<CartSnapshot, CartError> {
        let auth = require(auth)?;
        let current = self.reload(auth).await?;
        let line = current.get(line_id).ok_or(CartError::NotFound)?;
        let guard = self.claim(auth, line.product_id)?;

        self.repo.delete_cart_line(auth, line_id).await?;

        drop(guard);
        self.reload(auth).await
    }

    /// Delete every line, one at a time, then reload.
    ///
    /// # Errors
    ///
    /// Stops at the first failed delete.
    #[instrument(skip_all)]
    pub async fn clear(&self, auth: Option<&AuthSession>) -> Result<CartSnapshot, CartError> {
        let auth = require(auth)?;
        let current = self.repo.list_cart(auth).await?;
        for line in &current {
            self.repo.delete_cart_line(auth, &line.id).await?;
        }
        self.reload(auth).await
    }

    /// Merge a guest cart into the user's cart after login.
    ///
    /// Unlike [`Self::add`], lines that would overshoot are trimmed to the
    /// remaining stock rather than rejected, and lines with nothing left are
    /// skipped. A failed write is recorded and the merge carries on.
    ///
    /// # Errors
    ///
    /// Returns a CMS error only if the cart cannot be loaded.
    #[instrument(skip_all, fields(lines = guest.lines.len()))]
    pub async fn merge_guest(
        &self,
        auth: &AuthSession,
        guest: &GuestCart,
    ) -> Result<MergeReport, CartError> {
        let current = self.repo.list_cart(auth).await?;
        let mut merged = Vec::new();
        let mut capped = Vec::new();
        let mut skipped = Vec::new();
        let mut failed = Vec::new();

        for line in &guest.lines {
            let existing = current
                .iter()
                .find(|l| l.matches(line.product_id, &line.size));
            let held = existing.map_or(0, |l| l.quantity);
            let remaining = line.max_stock.saturating_sub(held);
            let added = line.quantity.min(remaining);

            let mut report = MergeLine {
                product_id: line.product_id,
                name: line.name.clone(),
                size: line.size.clone(),
                requested: line.quantity,
                added,
            };

            if added == 0 {
                skipped.push(report);
                continue;
            }

            let written = match existing {
                Some(existing) => {
                    self.repo
                        .update_cart_quantity(
                            auth,
                            &existing.id,
                            held + added,
                            Some(line.max_stock),
                        )
                        .await
                }
                None => {
                    self.repo
                        .create_cart_line(
                            auth,
                            &NewCartLine {
                                quantity: added,
                                ..line.clone()
                            },
                        )
                        .await
                }
            };

            match written {
                Ok(()) if added < line.quantity => capped.push(report),
                Ok(()) => merged.push(report),
                Err(e) => {
                    tracing::warn!(error = %e, product_id = %line.product_id, "Guest cart line not merged");
                    report.added = 0;
                    failed.push(report);
                }
            }
        }

        Ok(MergeReport {
            merged,
            capped,
            skipped,
            failed,
            snapshot: self.reload(auth).await?,
        })
    }
}

// =============================================================================
// Guest cart storage
// =============================================================================

/// Load the guest cart. A corrupt value is discarded with a warning.
///
/// # Errors
///
/// Returns an error if the store itself fails.
pub async fn load_guest_cart<S: LocalStore>(store: &S) -> Result<GuestCart, StoreError> {
    match store.get_json::<GuestCart>(keys::GUEST_CART).await {
        Ok(cart) => Ok(cart.unwrap_or_default()),
        Err(StoreError::Serialization(e)) => {
            tracing::warn!(error = %e, "Discarding corrupt guest cart");
            Ok(GuestCart::default())
        }
        Err(e) => Err(e),
    }
}

/// Persist the guest cart. An empty cart removes the key.
///
/// # Errors
///
/// Returns an error if the store fails.
pub async fn save_guest_cart<S: LocalStore>(store: &S, cart: &GuestCart) -> Result<(), StoreError> {
    if cart.is_empty() {
        store.remove(keys::GUEST_CART).await
    } else {
        store.set_json(keys::GUEST_CART, cart).await
    }
}

/// Add a line to the stored guest cart, merging with the same product and
/// size.
///
/// # Errors
///
/// Same quantity rules as [`CartService::add`], or a store error.
pub async fn add_guest_line<S: LocalStore>(
    store: &S,
    line: NewCartLine,
) -> Result<GuestCart, CartError> {
    let requested = line.quantity;
    let mut cart = load_guest_cart(store).await?;
    cart.add(line)
        .map_err(|e| CartError::from_quantity(e, requested))?;
    save_guest_cart(store, &cart).await?;
    Ok(cart)
}

/// Set a guest line's quantity, clamped to `[1, max_stock]`.
///
/// # Errors
///
/// Returns `NotFound` if there is no such line, or a store error.
pub async fn set_guest_quantity<S: LocalStore>(
    store: &S,
    product_id: ProductId,
    size: &str,
    quantity: u32,
) -> Result<GuestCart, CartError> {
    let mut cart = load_guest_cart(store).await?;
    cart.set_quantity(product_id, size, quantity)
        .ok_or(CartError::NotFound)?;
    save_guest_cart(store, &cart).await?;
    Ok(cart)
}

/// Remove a guest line.
///
/// # Errors
///
/// Returns `NotFound` if there is no such line, or a store error.
pub async fn remove_guest_line<S: LocalStore>(
    store: &S,
    product_id: ProductId,
    size: &str,
) -> Result<GuestCart, CartError> {
    let mut cart = load_guest_cart(store).await?;
    if !cart.remove(product_id, size) {
        return Err(CartError::NotFound);
    }
    save_guest_cart(store, &cart).await?;
    Ok(cart)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::testing::{FakeCms, product, session};
    use crate::store::MemoryStore;
    use rust_decimal::Decimal;

    fn service(cms: &FakeCms) -> CartService<FakeCms> {
        CartService::new(cms.clone(), ShippingPolicy::default(), InFlight::new())
    }

    fn tee_line(quantity: u32) -> NewCartLine {
        product(1, "Runner Tee", 600, 3).cart_line("M", quantity).unwrap()
    }

    #[tokio::test]
    async fn test_requires_auth() {
        let cms = FakeCms::default();
        let err = service(&cms).load(None).await.unwrap_err();
        assert!(matches!(err, CartError::Unauthorized));
    }

    #[tokio::test]
    async fn test_add_merges_same_product_and_size() {
        let cms = FakeCms::default();
        let cart = service(&cms);
        let auth = session();

        cart.add(Some(&auth), tee_line(1)).await.unwrap();
        let snapshot = cart.add(Some(&auth), tee_line(1)).await.unwrap();

        assert_eq!(snapshot.lines.len(), 1);
        assert_eq!(snapshot.lines[0].quantity, 2);
        // 2 x 600 crosses the free shipping threshold
        assert_eq!(snapshot.totals.subtotal, Decimal::new(1200, 0));
        assert_eq!(snapshot.totals.grand_total, Decimal::new(1200, 0));
    }

    #[tokio::test]
    async fn test_add_rejects_overshoot_without_writing() {
        let cms = FakeCms::default();
        let cart = service(&cms);
        let auth = session();

        cart.add(Some(&auth), tee_line(2)).await.unwrap();
        let writes = cms.state.lock().unwrap().cart_writes;

        let err = cart.add(Some(&auth), tee_line(2)).await.unwrap_err();
        assert!(matches!(
            err,
            CartError::StockExceeded {
                available: 1,
                requested: 2
            }
        ));
        assert_eq!(cms.state.lock().unwrap().cart_writes, writes);
        assert_eq!(cms.cart()[0].quantity, 2);
    }

    #[tokio::test]
    async fn test_add_after_restock_stores_new_stock_cap() {
        let cms = FakeCms::default();
        let cart = service(&cms);
        let auth = session();

        cart.add(Some(&auth), tee_line(2)).await.unwrap();
        let restocked = product(1, "Runner Tee", 600, 5).cart_line("M", 3).unwrap();
        let snapshot = cart.add(Some(&auth), restocked).await.unwrap();

        let line = &snapshot.lines[0];
        assert_eq!(line.quantity, 5);
        assert_eq!(line.max_stock, 5);
        assert!(line.at_max_stock());

        // The refreshed cap survives a later clamp
        let id = line.id.clone();
        let snapshot = cart.update_quantity(Some(&auth), &id, 9).await.unwrap();
        assert_eq!(snapshot.lines[0].quantity, 5);
    }

    #[tokio::test]
    async fn test_merge_guest_after_restock_stores_new_stock_cap() {
        let cms = FakeCms::default();
        let cart = service(&cms);
        let auth = session();

        cart.add(Some(&auth), tee_line(3)).await.unwrap();

        let mut guest = GuestCart::default();
        guest
            .add(product(1, "Runner Tee", 600, 6).cart_line("M", 2).unwrap())
            .unwrap();

        let report = cart.merge_guest(&auth, &guest).await.unwrap();
        assert_eq!(report.merged.len(), 1);
        let line = &report.snapshot.lines[0];
        assert_eq!(line.quantity, 5);
        assert_eq!(line.max_stock, 6);
    }

    #[tokio::test]
    async fn test_add_new_line_over_stock_is_rejected() {
        let cms = FakeCms::default();
        let err = service(&cms)
            .add(Some(&session()), tee_line(4))
            .await
            .unwrap_err();
        assert!(matches!(err, CartError::StockExceeded { .. }));
        assert!(cms.cart().is_empty());
    }

    #[tokio::test]
    async fn test_add_zero_is_invalid() {
        let cms = FakeCms::default();
        let err = service(&cms)
            .add(Some(&session()), tee_line(0))
            .await
            .unwrap_err();
        assert!(matches!(err, CartError::InvalidQuantity));
    }

    #[tokio::test]
    async fn test_add_while_pending_is_busy() {
        let cms = FakeCms::default();
        let registry = InFlight::new();
        let cart = CartService::new(cms.clone(), ShippingPolicy::default(), registry.clone());
        let auth = session();

        let _pending = registry.try_acquire(auth.user_id(), ProductId::new(1));
        let err = cart.add(Some(&auth), tee_line(1)).await.unwrap_err();
        assert!(matches!(err, CartError::Busy));
    }

    #[tokio::test]
    async fn test_update_quantity_clamps() {
        let cms = FakeCms::default();
        let cart = service(&cms);
        let auth = session();

        let snapshot = cart.add(Some(&auth), tee_line(1)).await.unwrap();
        let id = snapshot.lines[0].id.clone();

        let snapshot = cart.update_quantity(Some(&auth), &id, 10).await.unwrap();
        assert_eq!(snapshot.lines[0].quantity, 3);

        let snapshot = cart.update_quantity(Some(&auth), &id, 0).await.unwrap();
        assert_eq!(snapshot.lines[0].quantity, 1);

        let err = cart
            .update_quantity(Some(&auth), &DocumentId::from("nope"), 1)
            .await
            .unwrap_err();
        assert!(matches!(err, CartError::NotFound));
    }

    #[tokio::test]
    async fn test_remove_and_clear() {
        let cms = FakeCms::default();
        let cart = service(&cms);
        let auth = session();

        cart.add(Some(&auth), tee_line(1)).await.unwrap();
        let shorts = product(2, "Shorts", 200, 5).cart_line("M", 2).unwrap();
        let snapshot = cart.add(Some(&auth), shorts).await.unwrap();
        assert_eq!(snapshot.lines.len(), 2);
        assert_eq!(snapshot.totals.shipping, Decimal::new(50, 0));

        let id = snapshot.lines[0].id.clone();
        let snapshot = cart.remove(Some(&auth), &id).await.unwrap();
        assert_eq!(snapshot.lines.len(), 1);

        let snapshot = cart.clear(Some(&auth)).await.unwrap();
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.totals.subtotal, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_merge_guest_caps_and_skips() {
        let cms = FakeCms::default();
        let cart = service(&cms);
        let auth = session();

        // User already holds 2 of 3 tees
        cart.add(Some(&auth), tee_line(2)).await.unwrap();

        let mut guest = GuestCart::default();
        guest.add(tee_line(2)).unwrap();
        guest
            .add(product(2, "Shorts", 200, 5).cart_line("M", 1).unwrap())
            .unwrap();
        guest
            .add(product(3, "Cap", 100, 1).cart_line("M", 1).unwrap())
            .unwrap();

        // Cap sold out while the visitor was browsing
        {
            let mut state = cms.state.lock().unwrap();
            state.cart.push(zone7_core::cart::CartLine {
                id: DocumentId::from("other"),
                product_id: ProductId::new(3),
                name: "Cap".to_string(),
                unit_price: Decimal::new(100, 0),
                quantity: 1,
                size: "M".to_string(),
                max_stock: 1,
                image_url: None,
            });
        }

        let report = cart.merge_guest(&auth, &guest).await.unwrap();
        assert_eq!(report.capped.len(), 1);
        assert_eq!(report.capped[0].added, 1);
        assert_eq!(report.merged.len(), 1);
        assert_eq!(report.skipped.len(), 1);
        assert!(!report.is_clean());

        for line in &report.snapshot.lines {
            assert!(line.quantity >= 1 && line.quantity <= line.max_stock);
        }
        assert_eq!(
            report
                .snapshot
                .find(ProductId::new(1), "M")
                .unwrap()
                .quantity,
            3
        );
    }

    #[tokio::test]
    async fn test_merge_guest_records_failed_writes() {
        let cms = FakeCms::default();
        cms.state.lock().unwrap().fail_cart_creates = true;

        let mut guest = GuestCart::default();
        guest.add(tee_line(1)).unwrap();

        let report = service(&cms).merge_guest(&session(), &guest).await.unwrap();
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].added, 0);
        assert!(report.snapshot.is_empty());
    }

    #[tokio::test]
    async fn test_guest_cart_storage() {
        let store = MemoryStore::new();
        assert!(load_guest_cart(&store).await.unwrap().is_empty());

        let mut guest = GuestCart::default();
        guest.add(tee_line(1)).unwrap();
        save_guest_cart(&store, &guest).await.unwrap();
        assert_eq!(load_guest_cart(&store).await.unwrap(), guest);

        save_guest_cart(&store, &GuestCart::default()).await.unwrap();
        assert_eq!(store.get(keys::GUEST_CART).await.unwrap(), None);

        store
            .set(keys::GUEST_CART, "[broken".to_string())
            .await
            .unwrap();
        assert!(load_guest_cart(&store).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_guest_line_operations() {
        let store = MemoryStore::new();
        let tee = ProductId::new(1);

        add_guest_line(&store, tee_line(2)).await.unwrap();
        let err = add_guest_line(&store, tee_line(2)).await.unwrap_err();
        assert!(matches!(
            err,
            CartError::StockExceeded {
                available: 1,
                requested: 2
            }
        ));

        let cart = set_guest_quantity(&store, tee, "M", 10).await.unwrap();
        assert_eq!(cart.lines[0].quantity, 3);

        let err = set_guest_quantity(&store, tee, "L", 1).await.unwrap_err();
        assert!(matches!(err, CartError::NotFound));

        let cart = remove_guest_line(&store, tee, "M").await.unwrap();
        assert!(cart.is_empty());
        assert!(load_guest_cart(&store).await.unwrap().is_empty());
    }
}
