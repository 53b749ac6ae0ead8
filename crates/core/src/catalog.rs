//! Products, categories and price derivation.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cart::NewCartLine;
use crate::types::{CategoryId, DocumentId, ImageId, ProductId, apply_discount};
use crate::wishlist::NewWishlistEntry;

/// Availability string the CMS uses for purchasable products.
pub const IN_STOCK: &str = "in stock";

/// A size the shopper tried to buy is missing or sold out.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("please select an available size (\"{size}\" is unavailable)")]
pub struct SizeUnavailable {
    pub size: String,
}

/// A purchasable size with its stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSize {
    pub size: String,
    pub stock: u32,
}

/// A product image. `url` is absolute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductImage {
    pub id: Option<ImageId>,
    pub url: String,
}

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub document_id: Option<DocumentId>,
    pub name: String,
    pub description: Option<String>,
    /// Base price before any discount.
    pub price: Decimal,
    pub has_discount: bool,
    /// Discount as a whole percentage.
    pub discount_value: Decimal,
    pub rating: Option<f64>,
    pub availability: Option<String>,
    /// Category names as stored in the CMS.
    pub categories: Vec<String>,
    pub sizes: Vec<ProductSize>,
    pub images: Vec<ProductImage>,
}

impl Product {
    /// Price the shopper pays: the base price minus the discount, if any.
    #[must_use]
    pub fn final_price(&self) -> Decimal {
        if self.has_discount {
            apply_discount(self.price, self.discount_value)
        } else {
            self.price
        }
    }

    #[must_use]
    pub fn is_in_stock(&self) -> bool {
        self.availability
            .as_deref()
            .is_some_and(|a| a.trim().eq_ignore_ascii_case(IN_STOCK))
    }

    /// Case-insensitive category membership.
    #[must_use]
    pub fn has_category(&self, name: &str) -> bool {
        self.categories.iter().any(|c| c.eq_ignore_ascii_case(name))
    }

    #[must_use]
    pub fn size(&self, size: &str) -> Option<&ProductSize> {
        self.sizes.iter().find(|s| s.size == size)
    }

    /// Size preselected on the product page (the first listed).
    #[must_use]
    pub fn default_size(&self) -> Option<&ProductSize> {
        self.sizes.first()
    }

    #[must_use]
    pub fn primary_image_url(&self) -> Option<&str> {
        self.images.first().map(|i| i.url.as_str())
    }

    #[must_use]
    pub fn primary_image_id(&self) -> Option<ImageId> {
        self.images.first().and_then(|i| i.id)
    }

    /// Build an add-to-cart payload for one of this product's sizes.
    ///
    /// The line carries the discounted price and the size's stock as its cap.
    ///
    /// # Errors
    ///
    /// Returns [`SizeUnavailable`] if the size does not exist or has no stock.
    pub fn cart_line(&self, size: &str, quantity: u32) -> Result<NewCartLine, SizeUnavailable> {
        let selected = self
            .size(size)
            .filter(|s| s.stock > 0)
            .ok_or_else(|| SizeUnavailable {
                size: size.to_owned(),
            })?;

        Ok(NewCartLine {
            product_id: self.id,
            name: self.name.clone(),
            unit_price: self.final_price(),
            quantity,
            size: selected.size.clone(),
            max_stock: selected.stock,
            image_url: self.primary_image_url().map(String::from),
            image_id: self.primary_image_id(),
        })
    }

    /// Like [`Product::cart_line`], falling back to the default size when
    /// none is chosen.
    ///
    /// # Errors
    ///
    /// Returns [`SizeUnavailable`] if the product has no sizes, or the chosen
    /// size is missing or sold out.
    pub fn cart_line_or_default(
        &self,
        size: Option<&str>,
        quantity: u32,
    ) -> Result<NewCartLine, SizeUnavailable> {
        match size {
            Some(size) => self.cart_line(size, quantity),
            None => {
                let size = self.default_size().ok_or_else(|| SizeUnavailable {
                    size: String::new(),
                })?;
                self.cart_line(&size.size, quantity)
            }
        }
    }

    /// Build a wishlist payload for this product.
    ///
    /// Wishlist entries remember the base price, not the discounted one.
    #[must_use]
    pub fn wishlist_entry(&self) -> NewWishlistEntry {
        NewWishlistEntry {
            product_id: self.id,
            product_document_id: self.document_id.clone(),
            name: self.name.clone(),
            price: self.price,
            rating: self.rating,
            image_url: self.primary_image_url().map(String::from),
            image_id: self.primary_image_id(),
        }
    }
}

/// A catalog category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
}

/// A category with the number of products that carry it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCount {
    pub id: CategoryId,
    pub name: String,
    pub count: usize,
}

/// Count products per category for the filter sidebar.
#[must_use]
pub fn category_counts(categories: &[Category], products: &[Product]) -> Vec<CategoryCount> {
    categories
        .iter()
        .map(|c| CategoryCount {
            id: c.id,
            name: c.name.clone(),
            count: products.iter().filter(|p| p.has_category(&c.name)).count(),
        })
        .collect()
}

/// Products sharing `product`'s first category, excluding itself.
#[must_use]
pub fn related_products<'a>(product: &Product, all: &'a [Product]) -> Vec<&'a Product> {
    let Some(category) = product.categories.first() else {
        return Vec::new();
    };
    all.iter()
        .filter(|p| p.id != product.id && p.has_category(category))
        .collect()
}

/// Case-insensitive substring search on product names.
///
/// An empty (or whitespace-only) term matches nothing.
#[must_use]
pub fn search<'a>(products: &'a [Product], term: &str) -> Vec<&'a Product> {
    let term = term.trim().to_lowercase();
    if term.is_empty() {
        return Vec::new();
    }
    products
        .iter()
        .filter(|p| p.name.to_lowercase().contains(&term))
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn product(id: i64, name: &str, price: i64, categories: &[&str]) -> Product {
        Product {
            id: ProductId::new(id),
            document_id: Some(DocumentId::new(format!("doc-{id}"))),
            name: name.to_string(),
            description: None,
            price: Decimal::new(price, 0),
            has_discount: false,
            discount_value: Decimal::ZERO,
            rating: Some(4.0),
            availability: Some(IN_STOCK.to_string()),
            categories: categories.iter().map(|c| (*c).to_string()).collect(),
            sizes: vec![
                ProductSize {
                    size: "M".to_string(),
                    stock: 3,
                },
                ProductSize {
                    size: "L".to_string(),
                    stock: 0,
                },
            ],
            images: vec![ProductImage {
                id: Some(ImageId::new(1)),
                url: "http://cms.test/uploads/a.jpg".to_string(),
            }],
        }
    }

    #[test]
    fn test_cart_line_or_default_uses_first_size() {
        let p = product(1, "Tee", 500, &[]);
        let line = p.cart_line_or_default(None, 2).unwrap();
        assert_eq!(line.size, "M");
        assert_eq!(line.max_stock, 3);

        assert!(p.cart_line_or_default(Some("L"), 1).is_err());

        let mut bare = p;
        bare.sizes.clear();
        assert_eq!(
            bare.cart_line_or_default(None, 1).unwrap_err().size,
            String::new()
        );
    }

    #[test]
    fn test_final_price_applies_discount() {
        let mut p = product(1, "Tee", 500, &[]);
        assert_eq!(p.final_price(), Decimal::new(500, 0));
        p.has_discount = true;
        p.discount_value = Decimal::new(20, 0);
        assert_eq!(p.final_price(), Decimal::new(400, 0));
    }

    #[test]
    fn test_cart_line_uses_size_stock_and_final_price() {
        let mut p = product(1, "Tee", 500, &[]);
        p.has_discount = true;
        p.discount_value = Decimal::new(10, 0);

        let line = p.cart_line("M", 2).unwrap();
        assert_eq!(line.max_stock, 3);
        assert_eq!(line.unit_price, Decimal::new(450, 0));
        assert_eq!(line.image_url.as_deref(), Some("http://cms.test/uploads/a.jpg"));
        assert_eq!(line.image_id, Some(ImageId::new(1)));

        assert!(p.cart_line("L", 1).is_err());
        assert!(p.cart_line("XXL", 1).is_err());
    }

    #[test]
    fn test_wishlist_entry_keeps_base_price() {
        let mut p = product(1, "Tee", 500, &[]);
        p.has_discount = true;
        p.discount_value = Decimal::new(50, 0);
        assert_eq!(p.wishlist_entry().price, Decimal::new(500, 0));
    }

    #[test]
    fn test_category_counts_case_insensitive() {
        let products = vec![
            product(1, "Tee", 100, &["Men"]),
            product(2, "Shorts", 100, &["men", "Running"]),
            product(3, "Bra", 100, &["Women"]),
        ];
        let categories = vec![
            Category {
                id: CategoryId::new(1),
                name: "MEN".to_string(),
            },
            Category {
                id: CategoryId::new(2),
                name: "Kids".to_string(),
            },
        ];
        let counts = category_counts(&categories, &products);
        assert_eq!(counts[0].count, 2);
        assert_eq!(counts[1].count, 0);
    }

    #[test]
    fn test_related_products_share_first_category() {
        let products = vec![
            product(1, "Tee", 100, &["Men", "Running"]),
            product(2, "Shorts", 100, &["men"]),
            product(3, "Bra", 100, &["Running"]),
        ];
        let related = related_products(&products[0], &products);
        assert_eq!(related.len(), 1);
        assert_eq!(related[0].id, ProductId::new(2));
    }

    #[test]
    fn test_search_by_name() {
        let products = vec![
            product(1, "Running Tee", 100, &[]),
            product(2, "Gym Shorts", 100, &[]),
        ];
        assert_eq!(search(&products, "tee").len(), 1);
        assert_eq!(search(&products, "  ").len(), 0);
        assert_eq!(search(&products, "xyz").len(), 0);
    }

    #[test]
    fn test_availability_check() {
        let mut p = product(1, "Tee", 100, &[]);
        assert!(p.is_in_stock());
        p.availability = Some("out of stock".to_string());
        assert!(!p.is_in_stock());
        p.availability = None;
        assert!(!p.is_in_stock());
    }
}
