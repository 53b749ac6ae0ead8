//! Product browsing: listing, search, detail and the filtered shop page.

use serde::Serialize;
use tracing::instrument;
use zone7_core::ProductId;
use zone7_core::catalog::{self, CategoryCount, Product};
use zone7_core::filters::{Page, ShopFilters};

use crate::cms::{CatalogRepository, CmsError};

/// A product with the others from its first category.
#[derive(Debug, Clone, Serialize)]
pub struct ProductDetail {
    pub product: Product,
    pub final_price: rust_decimal::Decimal,
    pub related: Vec<Product>,
}

/// One page of the shop, with the state that produced it.
#[derive(Debug, Clone, Serialize)]
pub struct ShopPage {
    pub products: Page<Product>,
    pub categories: Vec<CategoryCount>,
    pub filters: ShopFilters,
}

/// Read-only catalog queries. Filtering happens over the full product list.
#[derive(Debug, Clone)]
pub struct CatalogService<R> {
    repo: R,
}

impl<R: CatalogRepository> CatalogService<R> {
    #[must_use]
    pub const fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Every product.
    ///
    /// # Errors
    ///
    /// Returns a CMS error.
    pub async fn products(&self) -> Result<Vec<Product>, CmsError> {
        self.repo.list_products().await
    }

    /// Products whose name contains `term`, ignoring case.
    ///
    /// # Errors
    ///
    /// Returns a CMS error.
    #[instrument(skip(self))]
    pub async fn search(&self, term: &str) -> Result<Vec<Product>, CmsError> {
        let products = self.repo.list_products().await?;
        Ok(catalog::search(&products, term).into_iter().cloned().collect())
    }

    /// A single product.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown id, or another CMS error.
    pub async fn product(&self, id: ProductId) -> Result<Product, CmsError> {
        self.repo.get_product(id).await
    }

    /// A product and its related products.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown id, or another CMS error.
    #[instrument(skip(self))]
    pub async fn detail(&self, id: ProductId) -> Result<ProductDetail, CmsError> {
        let product = self.repo.get_product(id).await?;
        let related = self.related_to(&product).await?;
        Ok(ProductDetail {
            final_price: product.final_price(),
            product,
            related,
        })
    }

    /// Products sharing `id`'s first category.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown id, or another CMS error.
    pub async fn related(&self, id: ProductId) -> Result<Vec<Product>, CmsError> {
        let product = self.repo.get_product(id).await?;
        self.related_to(&product).await
    }

    async fn related_to(&self, product: &Product) -> Result<Vec<Product>, CmsError> {
        let all = self.repo.list_products().await?;
        Ok(catalog::related_products(product, &all)
            .into_iter()
            .cloned()
            .collect())
    }

    /// Categories with the number of products in each.
    ///
    /// # Errors
    ///
    /// Returns a CMS error.
    pub async fn categories(&self) -> Result<Vec<CategoryCount>, CmsError> {
        let (categories, products) =
            tokio::try_join!(self.repo.list_categories(), self.repo.list_products())?;
        Ok(catalog::category_counts(&categories, &products))
    }

    /// The current page of products passing `filters`.
    ///
    /// # Errors
    ///
    /// Returns a CMS error.
    #[instrument(skip_all, fields(page = filters.current_page))]
    pub async fn shop(&self, filters: ShopFilters) -> Result<ShopPage, CmsError> {
        let (categories, products) =
            tokio::try_join!(self.repo.list_categories(), self.repo.list_products())?;
        let page = filters.page(&products).map(Product::clone);
        Ok(ShopPage {
            products: page,
            categories: catalog::category_counts(&categories, &products),
            filters,
        })
    }
}
