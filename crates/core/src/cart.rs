//! Cart lines, quantity rules and derived totals.
//!
//! Every cart line obeys `1 <= quantity <= max_stock`, and a cart holds at
//! most one line per (product, size). The rules live here so the remote user
//! cart and the local guest cart enforce them identically.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{DocumentId, ImageId, Price, ProductId};

/// Why a requested quantity cannot be applied to a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum QuantityError {
    /// Quantities start at one.
    #[error("quantity must be at least 1")]
    Zero,
    /// The size has no stock left at all.
    #[error("this size is out of stock")]
    OutOfStock,
    /// The line would exceed the stock for its size.
    #[error("only {available} more in stock (requested {requested})")]
    StockExceeded {
        /// How many more units could still be added.
        available: u32,
        /// How many units were asked for.
        requested: u32,
    },
}

/// A line in the authenticated user's remote cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    /// Remote row id.
    pub id: DocumentId,
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: Decimal,
    pub quantity: u32,
    pub size: String,
    pub max_stock: u32,
    pub image_url: Option<String>,
}

impl CartLine {
    /// `unit_price * quantity`.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }

    /// Whether this line is the (product, size) slot.
    #[must_use]
    pub fn matches(&self, product_id: ProductId, size: &str) -> bool {
        self.product_id == product_id && self.size == size
    }

    /// Whether the quantity has reached the stock cap.
    #[must_use]
    pub const fn at_max_stock(&self) -> bool {
        self.quantity >= self.max_stock
    }
}

/// A line that has not been stored remotely yet.
///
/// This is both the payload of an add-to-cart action and the shape of a guest
/// cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCartLine {
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: Decimal,
    pub quantity: u32,
    pub size: String,
    pub max_stock: u32,
    pub image_url: Option<String>,
    /// CMS media id of `image_url`, used to link the image on write.
    #[serde(default)]
    pub image_id: Option<ImageId>,
}

impl NewCartLine {
    /// `unit_price * quantity`.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }

    /// Whether this line is the (product, size) slot.
    #[must_use]
    pub fn matches(&self, product_id: ProductId, size: &str) -> bool {
        self.product_id == product_id && self.size == size
    }
}

/// Clamp a requested quantity into `[1, max_stock]`.
///
/// A `max_stock` of zero is treated as one so the result is always a valid
/// line quantity.
#[must_use]
pub fn clamp_quantity(requested: u32, max_stock: u32) -> u32 {
    requested.clamp(1, max_stock.max(1))
}

/// Quantity for a brand new line.
///
/// # Errors
///
/// Fails if `requested` is zero, the size is out of stock, or `requested`
/// exceeds `max_stock`.
pub const fn initial_quantity(requested: u32, max_stock: u32) -> Result<u32, QuantityError> {
    increased_quantity(0, requested, max_stock)
}

/// Quantity after adding `requested` units to a line holding `current`.
///
/// Never overshoots: a request past the cap is rejected rather than trimmed.
///
/// # Errors
///
/// Fails if `requested` is zero, the size is out of stock, or the sum would
/// exceed `max_stock`.
pub const fn increased_quantity(
    current: u32,
    requested: u32,
    max_stock: u32,
) -> Result<u32, QuantityError> {
    if requested == 0 {
        return Err(QuantityError::Zero);
    }
    if max_stock == 0 || current >= max_stock {
        if max_stock == 0 {
            return Err(QuantityError::OutOfStock);
        }
        return Err(QuantityError::StockExceeded {
            available: 0,
            requested,
        });
    }
    let available = max_stock - current;
    if requested > available {
        return Err(QuantityError::StockExceeded {
            available,
            requested,
        });
    }
    Ok(current + requested)
}

/// Shipping rule: free at or above a threshold, flat rate below it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingPolicy {
    pub free_shipping_threshold: Decimal,
    pub flat_rate: Decimal,
}

impl Default for ShippingPolicy {
    fn default() -> Self {
        Self {
            free_shipping_threshold: Decimal::new(1000, 0),
            flat_rate: Decimal::new(50, 0),
        }
    }
}

impl ShippingPolicy {
    /// Shipping charged for a given subtotal.
    #[must_use]
    pub fn shipping_for(&self, subtotal: Decimal) -> Decimal {
        if self.qualifies_for_free_shipping(subtotal) {
            Decimal::ZERO
        } else {
            self.flat_rate
        }
    }

    #[must_use]
    pub fn qualifies_for_free_shipping(&self, subtotal: Decimal) -> bool {
        subtotal >= self.free_shipping_threshold
    }

    /// How much more must be spent before shipping becomes free.
    #[must_use]
    pub fn remaining_for_free_shipping(&self, subtotal: Decimal) -> Decimal {
        (self.free_shipping_threshold - subtotal).max(Decimal::ZERO)
    }

    /// Progress towards free shipping, as a percentage in `0..=100`.
    #[must_use]
    pub fn free_shipping_progress(&self, subtotal: Decimal) -> Decimal {
        if self.free_shipping_threshold <= Decimal::ZERO {
            return Decimal::ONE_HUNDRED;
        }
        (subtotal * Decimal::ONE_HUNDRED / self.free_shipping_threshold)
            .clamp(Decimal::ZERO, Decimal::ONE_HUNDRED)
    }
}

/// Totals derived from a set of lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    pub subtotal: Decimal,
    pub shipping: Decimal,
    pub grand_total: Decimal,
    pub item_count: u32,
    pub free_shipping: bool,
    pub remaining_for_free_shipping: Decimal,
}

impl Totals {
    /// Compute totals from `(unit_price, quantity)` pairs.
    #[must_use]
    pub fn compute<I>(amounts: I, policy: &ShippingPolicy) -> Self
    where
        I: IntoIterator<Item = (Decimal, u32)>,
    {
        let (subtotal, item_count) = amounts.into_iter().fold(
            (Decimal::ZERO, 0u32),
            |(sum, count), (price, qty)| {
                (sum + price * Decimal::from(qty), count.saturating_add(qty))
            },
        );
        let shipping = policy.shipping_for(subtotal);
        Self {
            subtotal,
            shipping,
            grand_total: subtotal + shipping,
            item_count,
            free_shipping: policy.qualifies_for_free_shipping(subtotal),
            remaining_for_free_shipping: policy.remaining_for_free_shipping(subtotal),
        }
    }

    /// Totals of remote cart lines.
    #[must_use]
    pub fn of_lines(lines: &[CartLine], policy: &ShippingPolicy) -> Self {
        Self::compute(lines.iter().map(|l| (l.unit_price, l.quantity)), policy)
    }

    /// Totals of the empty cart.
    #[must_use]
    pub fn empty(policy: &ShippingPolicy) -> Self {
        Self::compute(std::iter::empty(), policy)
    }

    #[must_use]
    pub fn grand_total_price(&self) -> Price {
        Price::egp(self.grand_total)
    }
}

/// The authoritative cart as last loaded from the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartSnapshot {
    pub lines: Vec<CartLine>,
    pub totals: Totals,
}

impl CartSnapshot {
    /// Build a snapshot and derive its totals.
    #[must_use]
    pub fn new(lines: Vec<CartLine>, policy: &ShippingPolicy) -> Self {
        let totals = Totals::of_lines(&lines, policy);
        Self { lines, totals }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    #[must_use]
    pub fn find(&self, product_id: ProductId, size: &str) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.matches(product_id, size))
    }

    #[must_use]
    pub fn get(&self, id: &DocumentId) -> Option<&CartLine> {
        self.lines.iter().find(|l| &l.id == id)
    }
}

// =============================================================================
// Guest Cart
// =============================================================================

/// Cart kept in local storage before the shopper logs in.
///
/// Lines are keyed by (product, size) since they have no remote id yet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuestCart {
    #[serde(default)]
    pub lines: Vec<NewCartLine>,
}

impl GuestCart {
    /// Stable key used to address a guest line from the outside.
    #[must_use]
    pub fn line_key(product_id: ProductId, size: &str) -> String {
        format!("{product_id}:{size}")
    }

    /// Inverse of [`Self::line_key`].
    #[must_use]
    pub fn parse_line_key(key: &str) -> Option<(ProductId, String)> {
        let (product, size) = key.split_once(':')?;
        let product = product.parse::<i64>().ok()?;
        Some((ProductId::new(product), size.to_owned()))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Add a line, merging with an existing (product, size) line.
    ///
    /// # Errors
    ///
    /// Returns a [`QuantityError`] instead of overshooting the stock cap.
    pub fn add(&mut self, line: NewCartLine) -> Result<(), QuantityError> {
        if let Some(existing) = self
            .lines
            .iter_mut()
            .find(|l| l.matches(line.product_id, &line.size))
        {
            existing.quantity =
                increased_quantity(existing.quantity, line.quantity, line.max_stock)?;
            existing.max_stock = line.max_stock;
            existing.unit_price = line.unit_price;
            return Ok(());
        }

        let quantity = initial_quantity(line.quantity, line.max_stock)?;
        self.lines.push(NewCartLine { quantity, ..line });
        Ok(())
    }

    /// Set a line's quantity, clamped to `[1, max_stock]`.
    ///
    /// Returns the stored quantity, or `None` if there is no such line.
    pub fn set_quantity(&mut self, product_id: ProductId, size: &str, quantity: u32) -> Option<u32> {
        let line = self.lines.iter_mut().find(|l| l.matches(product_id, size))?;
        line.quantity = clamp_quantity(quantity, line.max_stock);
        Some(line.quantity)
    }

    /// Remove a line. Returns whether a line was removed.
    pub fn remove(&mut self, product_id: ProductId, size: &str) -> bool {
        let before = self.lines.len();
        self.lines.retain(|l| !l.matches(product_id, size));
        self.lines.len() != before
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    #[must_use]
    pub fn totals(&self, policy: &ShippingPolicy) -> Totals {
        Totals::compute(self.lines.iter().map(|l| (l.unit_price, l.quantity)), policy)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn dec(n: i64) -> Decimal {
        Decimal::new(n, 0)
    }

    fn guest_line(product: i64, size: &str, qty: u32, max: u32) -> NewCartLine {
        NewCartLine {
            product_id: ProductId::new(product),
            name: format!("Product {product}"),
            unit_price: dec(100),
            quantity: qty,
            size: size.to_string(),
            max_stock: max,
            image_url: None,
            image_id: None,
        }
    }

    #[test]
    fn test_totals_over_threshold_ship_free() {
        let totals = Totals::compute([(dec(600), 2)], &ShippingPolicy::default());
        assert_eq!(totals.subtotal, dec(1200));
        assert_eq!(totals.shipping, Decimal::ZERO);
        assert_eq!(totals.grand_total, dec(1200));
        assert!(totals.free_shipping);
    }

    #[test]
    fn test_totals_under_threshold_pay_flat_rate() {
        let totals = Totals::compute([(dec(200), 2)], &ShippingPolicy::default());
        assert_eq!(totals.subtotal, dec(400));
        assert_eq!(totals.shipping, dec(50));
        assert_eq!(totals.grand_total, dec(450));
        assert_eq!(totals.remaining_for_free_shipping, dec(600));
    }

    #[test]
    fn test_totals_exactly_at_threshold() {
        let totals = Totals::compute([(dec(1000), 1)], &ShippingPolicy::default());
        assert_eq!(totals.grand_total, totals.subtotal);
    }

    #[test]
    fn test_empty_totals() {
        let totals = Totals::empty(&ShippingPolicy::default());
        assert_eq!(totals.subtotal, Decimal::ZERO);
        assert_eq!(totals.item_count, 0);
    }

    #[test]
    fn test_free_shipping_progress() {
        let policy = ShippingPolicy::default();
        assert_eq!(policy.free_shipping_progress(dec(250)), dec(25));
        assert_eq!(policy.free_shipping_progress(dec(5000)), dec(100));
    }

    #[test]
    fn test_clamp_quantity() {
        assert_eq!(clamp_quantity(0, 5), 1);
        assert_eq!(clamp_quantity(3, 5), 3);
        assert_eq!(clamp_quantity(9, 5), 5);
        assert_eq!(clamp_quantity(9, 0), 1);
    }

    #[test]
    fn test_increased_quantity_rejects_overshoot() {
        assert_eq!(increased_quantity(2, 3, 5), Ok(5));
        assert_eq!(
            increased_quantity(4, 2, 5),
            Err(QuantityError::StockExceeded {
                available: 1,
                requested: 2
            })
        );
        assert_eq!(
            increased_quantity(5, 1, 5),
            Err(QuantityError::StockExceeded {
                available: 0,
                requested: 1
            })
        );
        assert_eq!(increased_quantity(0, 1, 0), Err(QuantityError::OutOfStock));
        assert_eq!(increased_quantity(1, 0, 5), Err(QuantityError::Zero));
    }

    #[test]
    fn test_guest_cart_merges_same_product_and_size() {
        let mut cart = GuestCart::default();
        cart.add(guest_line(1, "M", 1, 5)).unwrap();
        cart.add(guest_line(1, "M", 2, 5)).unwrap();
        cart.add(guest_line(1, "L", 1, 5)).unwrap();

        assert_eq!(cart.lines.len(), 2);
        assert_eq!(cart.lines[0].quantity, 3);
    }

    #[test]
    fn test_guest_cart_never_overshoots() {
        let mut cart = GuestCart::default();
        cart.add(guest_line(1, "M", 4, 5)).unwrap();
        let err = cart.add(guest_line(1, "M", 2, 5)).unwrap_err();
        assert!(matches!(err, QuantityError::StockExceeded { .. }));
        assert_eq!(cart.lines[0].quantity, 4);

        assert!(cart.add(guest_line(2, "S", 6, 5)).is_err());
        assert_eq!(cart.lines.len(), 1);
    }

    #[test]
    fn test_guest_cart_set_quantity_clamps() {
        let mut cart = GuestCart::default();
        cart.add(guest_line(1, "M", 1, 3)).unwrap();
        assert_eq!(cart.set_quantity(ProductId::new(1), "M", 10), Some(3));
        assert_eq!(cart.set_quantity(ProductId::new(1), "M", 0), Some(1));
        assert_eq!(cart.set_quantity(ProductId::new(9), "M", 1), None);
    }

    #[test]
    fn test_guest_cart_remove_and_clear() {
        let mut cart = GuestCart::default();
        cart.add(guest_line(1, "M", 1, 3)).unwrap();
        cart.add(guest_line(2, "M", 1, 3)).unwrap();
        assert!(cart.remove(ProductId::new(1), "M"));
        assert!(!cart.remove(ProductId::new(1), "M"));
        cart.clear();
        assert!(cart.is_empty());
        assert_eq!(cart.totals(&ShippingPolicy::default()).subtotal, Decimal::ZERO);
    }

    #[test]
    fn test_line_key_roundtrip() {
        let key = GuestCart::line_key(ProductId::new(12), "XL");
        assert_eq!(key, "12:XL");
        assert_eq!(
            GuestCart::parse_line_key(&key),
            Some((ProductId::new(12), "XL".to_string()))
        );
        assert_eq!(GuestCart::parse_line_key("garbage"), None);
    }
}
