//! Shop filter state, the filter predicate and pagination.
//!
//! [`ShopFilters`] serializes to the same camelCase JSON that is kept in local
//! storage under [`ShopFilters::STORAGE_KEY`], so state written by one front
//! end can be rehydrated by another.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::catalog::Product;

/// Products shown per shop page.
pub const PRODUCTS_PER_PAGE: usize = 9;

/// Default price slider bounds.
pub const DEFAULT_PRICE_RANGE: (Decimal, Decimal) =
    (Decimal::ZERO, Decimal::from_parts(5000, 0, 0, false, 0));

/// `priceRange` is stored as a pair of JSON numbers, fractions included.
mod price_bounds {
    use rust_decimal::Decimal;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize, Deserialize)]
    struct Bounds(
        #[serde(with = "rust_decimal::serde::float")] Decimal,
        #[serde(with = "rust_decimal::serde::float")] Decimal,
    );

    pub fn serialize<S: Serializer>(
        range: &(Decimal, Decimal),
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        Bounds(range.0, range.1).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<(Decimal, Decimal), D::Error> {
        let Bounds(min, max) = Bounds::deserialize(deserializer)?;
        Ok((min, max))
    }
}

/// A collapsible filter section in the shop sidebar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterSection {
    Price,
    Categories,
    Stock,
}

impl std::str::FromStr for FilterSection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "price" => Ok(Self::Price),
            "categories" | "category" => Ok(Self::Categories),
            "stock" => Ok(Self::Stock),
            other => Err(format!("unknown filter section: {other}")),
        }
    }
}

/// Which sidebar sections are expanded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpandedSections {
    pub price: bool,
    pub categories: bool,
    pub stock: bool,
}

impl Default for ExpandedSections {
    fn default() -> Self {
        Self {
            price: true,
            categories: true,
            stock: true,
        }
    }
}

impl ExpandedSections {
    fn toggle(&mut self, section: FilterSection) {
        let flag = match section {
            FilterSection::Price => &mut self.price,
            FilterSection::Categories => &mut self.categories,
            FilterSection::Stock => &mut self.stock,
        };
        *flag = !*flag;
    }
}

/// A single change to the filter state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum FilterAction {
    ToggleCategory { name: String },
    ToggleSubcategory { name: String },
    SetPriceRange {
        #[serde(with = "rust_decimal::serde::float")]
        min: Decimal,
        #[serde(with = "rust_decimal::serde::float")]
        max: Decimal,
    },
    SetInStockOnly { value: bool },
    Paginate { page: usize },
    ResetPagination,
    ResetFilter { section: FilterSection },
    ResetAll,
    ToggleSection { section: FilterSection },
}

/// Ephemeral shop filter state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShopFilters {
    /// Lowercased category names.
    pub selected_categories: Vec<String>,
    /// Lowercased subcategory names.
    pub selected_subcategories: Vec<String>,
    pub in_stock_only: bool,
    #[serde(with = "price_bounds")]
    pub price_range: (Decimal, Decimal),
    /// 1-based page number.
    pub current_page: usize,
    pub expanded_sections: ExpandedSections,
}

impl Default for ShopFilters {
    fn default() -> Self {
        Self {
            selected_categories: Vec::new(),
            selected_subcategories: Vec::new(),
            in_stock_only: false,
            price_range: DEFAULT_PRICE_RANGE,
            current_page: 1,
            expanded_sections: ExpandedSections::default(),
        }
    }
}

fn toggle_membership(list: &mut Vec<String>, name: &str) {
    let name = name.trim().to_lowercase();
    if let Some(pos) = list.iter().position(|c| *c == name) {
        list.remove(pos);
    } else {
        list.push(name);
    }
}

impl ShopFilters {
    /// Local storage key.
    pub const STORAGE_KEY: &'static str = "shopFilters";

    /// Apply one action. Changes to what is filtered reset the page to 1.
    pub fn apply(&mut self, action: &FilterAction) {
        match action {
            FilterAction::ToggleCategory { name } => self.toggle_category(name),
            FilterAction::ToggleSubcategory { name } => self.toggle_subcategory(name),
            FilterAction::SetPriceRange { min, max } => self.set_price_range(*min, *max),
            FilterAction::SetInStockOnly { value } => self.set_in_stock_only(*value),
            FilterAction::Paginate { page } => self.paginate(*page),
            FilterAction::ResetPagination => self.reset_pagination(),
            FilterAction::ResetFilter { section } => self.reset_filter(*section),
            FilterAction::ResetAll => self.reset_all(),
            FilterAction::ToggleSection { section } => self.expanded_sections.toggle(*section),
        }
    }

    pub fn toggle_category(&mut self, name: &str) {
        toggle_membership(&mut self.selected_categories, name);
        self.reset_pagination();
    }

    pub fn toggle_subcategory(&mut self, name: &str) {
        toggle_membership(&mut self.selected_subcategories, name);
        self.reset_pagination();
    }

    /// Set the price bounds. Reversed bounds are swapped.
    pub fn set_price_range(&mut self, min: Decimal, max: Decimal) {
        self.price_range = if min <= max { (min, max) } else { (max, min) };
        self.reset_pagination();
    }

    pub fn set_in_stock_only(&mut self, value: bool) {
        self.in_stock_only = value;
        self.reset_pagination();
    }

    /// Jump to a 1-based page. Page 0 is read as page 1.
    pub fn paginate(&mut self, page: usize) {
        self.current_page = page.max(1);
    }

    pub const fn reset_pagination(&mut self) {
        self.current_page = 1;
    }

    /// Reset one section's filter. Categories also clears subcategories.
    pub fn reset_filter(&mut self, section: FilterSection) {
        match section {
            FilterSection::Price => self.price_range = DEFAULT_PRICE_RANGE,
            FilterSection::Categories => {
                self.selected_categories.clear();
                self.selected_subcategories.clear();
            }
            FilterSection::Stock => self.in_stock_only = false,
        }
        self.reset_pagination();
    }

    /// Reset every filter. Section expansion is left as the shopper set it.
    pub fn reset_all(&mut self) {
        let expanded_sections = self.expanded_sections;
        *self = Self {
            expanded_sections,
            ..Self::default()
        };
    }

    /// Whether a product passes the category, stock and price filters.
    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        if !self.selected_categories.is_empty()
            && !self
                .selected_categories
                .iter()
                .any(|c| product.has_category(c))
        {
            return false;
        }

        if self.in_stock_only && !product.is_in_stock() {
            return false;
        }

        let (min, max) = self.price_range;
        product.price >= min && product.price <= max
    }

    /// Products passing the filters, in catalog order.
    #[must_use]
    pub fn filter<'a>(&self, products: &'a [Product]) -> Vec<&'a Product> {
        products.iter().filter(|p| self.matches(p)).collect()
    }

    /// The current page of filtered products.
    #[must_use]
    pub fn page<'a>(&self, products: &'a [Product]) -> Page<&'a Product> {
        Page::of(self.filter(products), self.current_page, PRODUCTS_PER_PAGE)
    }
}

/// One page of a larger list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-based page number.
    pub page: usize,
    pub per_page: usize,
    pub total_items: usize,
    pub total_pages: usize,
}

impl<T> Page<T> {
    /// Slice `items` to the requested page. Pages past the end are empty.
    #[must_use]
    pub fn of(items: Vec<T>, page: usize, per_page: usize) -> Self {
        let page = page.max(1);
        let per_page = per_page.max(1);
        let total_items = items.len();
        let total_pages = total_items.div_ceil(per_page);
        let start = (page - 1).saturating_mul(per_page);

        let items = items.into_iter().skip(start).take(per_page).collect();

        Self {
            items,
            page,
            per_page,
            total_items,
            total_pages,
        }
    }

    /// Transform the items, keeping the paging data.
    #[must_use]
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            per_page: self.per_page,
            total_items: self.total_items,
            total_pages: self.total_pages,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::catalog::tests::product;

    fn dec(n: i64) -> Decimal {
        Decimal::new(n, 0)
    }

    #[test]
    fn test_defaults() {
        let filters = ShopFilters::default();
        assert_eq!(filters.price_range, (Decimal::ZERO, dec(5000)));
        assert_eq!(filters.current_page, 1);
        assert!(filters.expanded_sections.price);
    }

    #[test]
    fn test_toggle_category_lowercases_and_toggles() {
        let mut filters = ShopFilters::default();
        filters.toggle_category("Men");
        assert_eq!(filters.selected_categories, vec!["men"]);
        filters.toggle_category("MEN");
        assert!(filters.selected_categories.is_empty());
    }

    #[test]
    fn test_filter_changes_reset_page() {
        let mut filters = ShopFilters::default();
        filters.paginate(3);
        filters.set_in_stock_only(true);
        assert_eq!(filters.current_page, 1);

        filters.paginate(2);
        filters.apply(&FilterAction::SetPriceRange {
            min: dec(10),
            max: dec(20),
        });
        assert_eq!(filters.current_page, 1);

        filters.paginate(2);
        filters.apply(&FilterAction::ToggleSection {
            section: FilterSection::Price,
        });
        assert_eq!(filters.current_page, 2);
        assert!(!filters.expanded_sections.price);
    }

    #[test]
    fn test_reset_categories_clears_subcategories() {
        let mut filters = ShopFilters::default();
        filters.toggle_category("men");
        filters.toggle_subcategory("tops");
        filters.reset_filter(FilterSection::Categories);
        assert!(filters.selected_categories.is_empty());
        assert!(filters.selected_subcategories.is_empty());
    }

    #[test]
    fn test_reset_all_keeps_expansion() {
        let mut filters = ShopFilters::default();
        filters.toggle_category("men");
        filters.set_price_range(dec(100), dec(200));
        filters.apply(&FilterAction::ToggleSection {
            section: FilterSection::Stock,
        });
        filters.reset_all();
        assert!(filters.selected_categories.is_empty());
        assert_eq!(filters.price_range, DEFAULT_PRICE_RANGE);
        assert!(!filters.expanded_sections.stock);
    }

    #[test]
    fn test_reversed_price_range_is_swapped() {
        let mut filters = ShopFilters::default();
        filters.set_price_range(dec(900), dec(100));
        assert_eq!(filters.price_range, (dec(100), dec(900)));
    }

    #[test]
    fn test_matches_applies_all_predicates() {
        let mut tee = product(1, "Tee", 300, &["Men"]);
        let shorts = product(2, "Shorts", 800, &["Women"]);
        let mut filters = ShopFilters::default();

        filters.toggle_category("men");
        assert!(filters.matches(&tee));
        assert!(!filters.matches(&shorts));

        filters.set_price_range(dec(400), dec(1000));
        assert!(!filters.matches(&tee));

        filters.reset_all();
        filters.set_in_stock_only(true);
        tee.availability = Some("out of stock".to_string());
        assert!(!filters.matches(&tee));
        assert!(filters.matches(&shorts));
    }

    #[test]
    fn test_price_bounds_are_inclusive() {
        let tee = product(1, "Tee", 300, &[]);
        let mut filters = ShopFilters::default();
        filters.set_price_range(dec(300), dec(300));
        assert!(filters.matches(&tee));
    }

    #[test]
    fn test_fractional_price_bounds() {
        let tee = product(1, "Tee", 300, &[]);
        let mut filters = ShopFilters::default();
        filters.set_price_range(Decimal::new(2995, 1), Decimal::new(3005, 1));
        assert!(filters.matches(&tee));
        filters.set_price_range(Decimal::new(3001, 1), dec(400));
        assert!(!filters.matches(&tee));
    }

    #[test]
    fn test_pagination() {
        let page = Page::of((1..=20).collect::<Vec<_>>(), 3, 9);
        assert_eq!(page.items, vec![19, 20]);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.total_items, 20);

        let past_end = Page::of((1..=20).collect::<Vec<_>>(), 4, 9);
        assert!(past_end.items.is_empty());

        let empty = Page::of(Vec::<u8>::new(), 1, 9);
        assert_eq!(empty.total_pages, 0);
    }

    #[test]
    fn test_rehydrate_tolerates_missing_fields() {
        let filters: ShopFilters =
            serde_json::from_str(r#"{"selectedCategories":["men"],"priceRange":[10,99]}"#)
                .unwrap();
        assert_eq!(filters.selected_categories, vec!["men"]);
        assert_eq!(filters.price_range, (dec(10), dec(99)));
        assert_eq!(filters.current_page, 1);
        assert!(filters.expanded_sections.categories);
    }

    #[test]
    fn test_rehydrate_keeps_fractional_price_range() {
        let filters: ShopFilters = serde_json::from_str(
            r#"{"selectedCategories":["men"],"priceRange":[0,4999.5],"currentPage":2}"#,
        )
        .unwrap();
        assert_eq!(filters.selected_categories, vec!["men"]);
        assert_eq!(filters.price_range, (Decimal::ZERO, Decimal::new(49995, 1)));
        assert_eq!(filters.current_page, 2);

        let stored = serde_json::to_value(&filters).unwrap();
        assert_eq!(stored["priceRange"], serde_json::json!([0.0, 4999.5]));
    }

    #[test]
    fn test_set_price_range_action_accepts_fractions() {
        let action: FilterAction =
            serde_json::from_str(r#"{"action":"set_price_range","min":10.25,"max":99}"#).unwrap();
        assert_eq!(
            action,
            FilterAction::SetPriceRange {
                min: Decimal::new(1025, 2),
                max: dec(99),
            }
        );
    }

    #[test]
    fn test_action_wire_format() {
        let action: FilterAction =
            serde_json::from_str(r#"{"action":"reset_filter","section":"price"}"#).unwrap();
        assert_eq!(
            action,
            FilterAction::ResetFilter {
                section: FilterSection::Price
            }
        );
    }
}
