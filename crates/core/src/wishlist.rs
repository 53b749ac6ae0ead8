//! Wishlist entries.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{DocumentId, ImageId, ProductId};

/// A saved-for-later product in the user's remote wishlist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WishlistEntry {
    /// Remote row id.
    pub id: DocumentId,
    pub product_id: ProductId,
    pub product_document_id: Option<DocumentId>,
    pub name: String,
    pub price: Decimal,
    pub rating: Option<f64>,
    pub image_url: Option<String>,
}

/// Payload for creating a wishlist entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewWishlistEntry {
    pub product_id: ProductId,
    pub product_document_id: Option<DocumentId>,
    pub name: String,
    pub price: Decimal,
    pub rating: Option<f64>,
    pub image_url: Option<String>,
    #[serde(default)]
    pub image_id: Option<ImageId>,
}

/// The wishlist as last loaded from the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WishlistSnapshot {
    pub entries: Vec<WishlistEntry>,
}

impl WishlistSnapshot {
    #[must_use]
    pub const fn new(entries: Vec<WishlistEntry>) -> Self {
        Self { entries }
    }

    /// Linear membership test over the loaded entries.
    #[must_use]
    pub fn contains(&self, product_id: ProductId) -> bool {
        self.entries.iter().any(|e| e.product_id == product_id)
    }

    #[must_use]
    pub fn find(&self, product_id: ProductId) -> Option<&WishlistEntry> {
        self.entries.iter().find(|e| e.product_id == product_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
