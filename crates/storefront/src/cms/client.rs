//! CMS client implementation.
//!
//! Uses `reqwest` 0.13 for HTTP. Product lists and categories are cached with
//! `moka` for the configured TTL.

use std::sync::Arc;

use moka::future::Cache;
use reqwest::{RequestBuilder, StatusCode, header};
use secrecy::SecretString;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;
use zone7_core::cart::{CartLine, NewCartLine};
use zone7_core::catalog::{Category, Product};
use zone7_core::order::{NewOrder, Order};
use zone7_core::wishlist::{NewWishlistEntry, WishlistEntry};
use zone7_core::{DocumentId, ProductId, UserId};

use super::CmsError;
use super::cache::{CacheKey, CacheValue};
use super::conversions::{
    cart_row_input, convert_cart_row, convert_category, convert_order, convert_product,
    convert_wishlist_row, order_input, wishlist_row_input,
};
use super::repository::{
    AuthRepository, CartRepository, CatalogRepository, OrderRepository, WishlistRepository,
};
use super::types::{
    AuthResponse, CartQuantityInput, CartRow, CategoryRecord, DataBody, Envelope, ErrorBody,
    LoginRequest, OrderRecord, ProductRecord, RegisterRequest, WishlistRow,
};
use crate::config::{CmsConfig, bearer};
use crate::models::AuthSession;

/// Rows requested per page when listing a collection.
const PAGE_SIZE: u32 = 100;

/// Upper bound on pages fetched for one listing.
const MAX_PAGES: u32 = 50;

type Query = Vec<(&'static str, String)>;

fn preview(body: &str) -> String {
    body.chars().take(500).collect()
}

/// `{origin}/api/`, keeping any path prefix on the origin.
fn api_base(origin: &Url) -> Result<Url, CmsError> {
    let mut base = origin.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    Ok(base.join("api/")?)
}

fn owner_filter(user_id: UserId) -> (&'static str, String) {
    (
        "filters[users_permissions_user][id][$eq]",
        user_id.to_string(),
    )
}

// =============================================================================
// CmsClient
// =============================================================================

/// Client for the CMS REST API.
///
/// Cheap to clone; clones share the HTTP connection pool and the cache.
#[derive(Clone)]
pub struct CmsClient {
    inner: Arc<CmsClientInner>,
}

struct CmsClientInner {
    client: reqwest::Client,
    origin: Url,
    api_base: Url,
    api_token: Option<SecretString>,
    cache: Cache<CacheKey, CacheValue>,
}

impl std::fmt::Debug for CmsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CmsClient")
            .field("api_base", &self.inner.api_base.as_str())
            .field("api_token", &self.inner.api_token.as_ref().map(|_| "[REDACTED]"))
            .finish_non_exhaustive()
    }
}

impl CmsClient {
    /// Create a new CMS client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built or the API base
    /// URL cannot be derived from the configured origin.
    pub fn new(config: &CmsConfig) -> Result<Self, CmsError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;

        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(config.catalog_cache_ttl)
            .build();

        Ok(Self {
            inner: Arc::new(CmsClientInner {
                client,
                origin: config.base_url.clone(),
                api_base: api_base(&config.base_url)?,
                api_token: config.api_token.clone(),
                cache,
            }),
        })
    }

    fn endpoint(&self, path: &str, query: &[(&'static str, String)]) -> Result<Url, CmsError> {
        let mut url = self.inner.api_base.join(path)?;
        if !query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));
        }
        Ok(url)
    }

    /// Attach the user's token, or the configured API token for public reads.
    fn authorize(&self, request: RequestBuilder, auth: Option<&AuthSession>) -> RequestBuilder {
        let token = auth
            .map(AuthSession::token)
            .or(self.inner.api_token.as_ref());
        match token {
            Some(token) => request.header(header::AUTHORIZATION, bearer(token)),
            None => request,
        }
    }

    /// Send a request and return the body of a successful response.
    async fn send(&self, request: RequestBuilder) -> Result<String, CmsError> {
        let response = request.send().await?;
        let status = response.status();

        // Check for rate limiting
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(CmsError::RateLimited(retry_after));
        }

        let body = response.text().await?;
        if status.is_success() {
            return Ok(body);
        }

        let message = serde_json::from_str::<ErrorBody>(&body).map_or_else(
            |_| {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            },
            |b| b.error.message,
        );

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                tracing::warn!(status = %status, message = %message, "CMS rejected credentials");
                Err(CmsError::Unauthorized(message))
            }
            StatusCode::NOT_FOUND => Err(CmsError::NotFound(message)),
            _ => {
                tracing::error!(
                    status = %status,
                    body = %preview(&body),
                    "CMS returned non-success status"
                );
                Err(CmsError::Api {
                    status: status.as_u16(),
                    message,
                })
            }
        }
    }

    /// Send a request and parse the JSON body.
    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, CmsError> {
        let body = self.send(request).await?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %preview(&body),
                "Failed to parse CMS response"
            );
            CmsError::Parse(e)
        })
    }

    /// Fetch every row of a collection, following pagination.
    async fn fetch_all<T: DeserializeOwned>(
        &self,
        path: &str,
        query: Query,
        auth: Option<&AuthSession>,
    ) -> Result<Vec<T>, CmsError> {
        let mut rows = Vec::new();
        let mut page = 1;

        loop {
            let mut params = query.clone();
            params.push(("pagination[page]", page.to_string()));
            params.push(("pagination[pageSize]", PAGE_SIZE.to_string()));

            let url = self.endpoint(path, &params)?;
            let request = self.authorize(self.inner.client.get(url), auth);
            let envelope: Envelope<Vec<T>> = self.execute(request).await?;
            rows.extend(envelope.data);

            match envelope.meta.pagination {
                Some(p) if p.page < p.page_count && page < MAX_PAGES => page = p.page + 1,
                Some(p) if p.page < p.page_count => {
                    tracing::warn!(path, pages = p.page_count, "Listing truncated");
                    break;
                }
                _ => break,
            }
        }

        Ok(rows)
    }

    async fn fetch_product(&self, id: ProductId) -> Result<Product, CmsError> {
        let url = self.endpoint(
            "products",
            &[
                ("filters[id][$eq]", id.to_string()),
                ("populate", "*".to_string()),
            ],
        )?;
        let request = self.authorize(self.inner.client.get(url), None);
        let envelope: Envelope<Vec<ProductRecord>> = self.execute(request).await?;

        envelope
            .data
            .into_iter()
            .next()
            .map(|record| convert_product(record, &self.inner.origin))
            .ok_or_else(|| CmsError::NotFound(format!("Product not found: {id}")))
    }
}

// =============================================================================
// Catalog
// =============================================================================

impl CatalogRepository for CmsClient {
    #[instrument(skip(self))]
    async fn list_products(&self) -> Result<Vec<Product>, CmsError> {
        if let Some(CacheValue::Products(products)) =
            self.inner.cache.get(&CacheKey::Products).await
        {
            debug!("Cache hit for products");
            return Ok(products.as_ref().clone());
        }

        let records: Vec<ProductRecord> = self
            .fetch_all("products", vec![("populate", "*".to_string())], None)
            .await?;
        let products: Vec<Product> = records
            .into_iter()
            .map(|r| convert_product(r, &self.inner.origin))
            .collect();

        self.inner
            .cache
            .insert(
                CacheKey::Products,
                CacheValue::Products(Arc::new(products.clone())),
            )
            .await;

        Ok(products)
    }

    #[instrument(skip(self), fields(product_id = %id))]
    async fn get_product(&self, id: ProductId) -> Result<Product, CmsError> {
        let cache_key = CacheKey::Product(id);

        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let product = self.fetch_product(id).await?;
        self.inner
            .cache
            .insert(cache_key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }

    #[instrument(skip(self), fields(product_id = %id))]
    async fn fetch_product_fresh(&self, id: ProductId) -> Result<Product, CmsError> {
        let product = self.fetch_product(id).await?;
        self.inner
            .cache
            .insert(
                CacheKey::Product(id),
                CacheValue::Product(Box::new(product.clone())),
            )
            .await;
        Ok(product)
    }

    #[instrument(skip(self))]
    async fn list_categories(&self) -> Result<Vec<Category>, CmsError> {
        if let Some(CacheValue::Categories(categories)) =
            self.inner.cache.get(&CacheKey::Categories).await
        {
            debug!("Cache hit for categories");
            return Ok(categories.as_ref().clone());
        }

        let records: Vec<CategoryRecord> = self
            .fetch_all("categories", vec![("populate", "*".to_string())], None)
            .await?;
        let categories: Vec<Category> = records.into_iter().map(convert_category).collect();

        self.inner
            .cache
            .insert(
                CacheKey::Categories,
                CacheValue::Categories(Arc::new(categories.clone())),
            )
            .await;

        Ok(categories)
    }
}

// =============================================================================
// Cart
// =============================================================================

impl CartRepository for CmsClient {
    #[instrument(skip(self, auth), fields(user_id = %auth.user_id()))]
    async fn list_cart(&self, auth: &AuthSession) -> Result<Vec<CartLine>, CmsError> {
        let rows: Vec<CartRow> = self
            .fetch_all(
                "carts",
                vec![owner_filter(auth.user_id()), ("populate", "image".to_string())],
                Some(auth),
            )
            .await?;
        Ok(rows
            .into_iter()
            .map(|row| convert_cart_row(row, &self.inner.origin))
            .collect())
    }

    #[instrument(skip(self, auth, line), fields(user_id = %auth.user_id(), product_id = %line.product_id, size = %line.size))]
    async fn create_cart_line(&self, auth: &AuthSession, line: &NewCartLine) -> Result<(), CmsError> {
        let url = self.endpoint("carts", &[])?;
        let body = DataBody {
            data: cart_row_input(auth.user_id().as_i64(), line),
        };
        let request = self.authorize(self.inner.client.post(url).json(&body), Some(auth));
        self.send(request).await?;
        Ok(())
    }

    #[instrument(skip(self, auth), fields(user_id = %auth.user_id(), line_id = %id))]
    async fn update_cart_quantity(
        &self,
        auth: &AuthSession,
        id: &DocumentId,
        quantity: u32,
        max_stock: Option<u32>,
    ) -> Result<(), CmsError> {
        let url = self.endpoint(&format!("carts/{id}"), &[])?;
        let body = DataBody {
            data: CartQuantityInput {
                quantity,
                max_stock,
            },
        };
        let request = self.authorize(self.inner.client.put(url).json(&body), Some(auth));
        self.send(request).await?;
        Ok(())
    }

    #[instrument(skip(self, auth), fields(user_id = %auth.user_id(), line_id = %id))]
    async fn delete_cart_line(&self, auth: &AuthSession, id: &DocumentId) -> Result<(), CmsError> {
        let url = self.endpoint(&format!("carts/{id}"), &[])?;
        let request = self.authorize(self.inner.client.delete(url), Some(auth));
        self.send(request).await?;
        Ok(())
    }
}

// =============================================================================
// Wishlist
// =============================================================================

impl WishlistRepository for CmsClient {
    #[instrument(skip(self, auth), fields(user_id = %auth.user_id()))]
    async fn list_wishlist(&self, auth: &AuthSession) -> Result<Vec<WishlistEntry>, CmsError> {
        let rows: Vec<WishlistRow> = self
            .fetch_all(
                "wishlists",
                vec![owner_filter(auth.user_id()), ("populate", "image".to_string())],
                Some(auth),
            )
            .await?;
        Ok(rows
            .into_iter()
            .map(|row| convert_wishlist_row(row, &self.inner.origin))
            .collect())
    }

    #[instrument(skip(self, auth, entry), fields(user_id = %auth.user_id(), product_id = %entry.product_id))]
    async fn create_wishlist_entry(
        &self,
        auth: &AuthSession,
        entry: &NewWishlistEntry,
    ) -> Result<(), CmsError> {
        let url = self.endpoint("wishlists", &[])?;
        let body = DataBody {
            data: wishlist_row_input(auth.user_id().as_i64(), entry),
        };
        let request = self.authorize(self.inner.client.post(url).json(&body), Some(auth));
        self.send(request).await?;
        Ok(())
    }

    #[instrument(skip(self, auth), fields(user_id = %auth.user_id(), entry_id = %id))]
    async fn delete_wishlist_entry(
        &self,
        auth: &AuthSession,
        id: &DocumentId,
    ) -> Result<(), CmsError> {
        let url = self.endpoint(&format!("wishlists/{id}"), &[])?;
        let request = self.authorize(self.inner.client.delete(url), Some(auth));
        self.send(request).await?;
        Ok(())
    }
}

// =============================================================================
// Orders
// =============================================================================

impl OrderRepository for CmsClient {
    #[instrument(skip(self, auth, order), fields(user_id = %auth.user_id(), items = order.items.len()))]
    async fn create_order(&self, auth: &AuthSession, order: &NewOrder) -> Result<Order, CmsError> {
        let url = self.endpoint("orders", &[])?;
        let body = DataBody {
            data: order_input(order),
        };
        let request = self.authorize(self.inner.client.post(url).json(&body), Some(auth));
        let envelope: Envelope<OrderRecord> = self.execute(request).await?;
        Ok(convert_order(envelope.data))
    }

    #[instrument(skip(self, auth), fields(user_id = %auth.user_id()))]
    async fn list_orders(&self, auth: &AuthSession) -> Result<Vec<Order>, CmsError> {
        let records: Vec<OrderRecord> = self
            .fetch_all(
                "orders",
                vec![
                    owner_filter(auth.user_id()),
                    ("sort", "createdAt:desc".to_string()),
                ],
                Some(auth),
            )
            .await?;

        let mut orders: Vec<Order> = records.into_iter().map(convert_order).collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(orders)
    }
}

// =============================================================================
// Auth
// =============================================================================

impl AuthRepository for CmsClient {
    #[instrument(skip(self, password))]
    async fn login(&self, identifier: &str, password: &str) -> Result<AuthSession, CmsError> {
        let url = self.endpoint("auth/local", &[])?;
        let body = LoginRequest {
            identifier,
            password,
        };
        let response: AuthResponse = self
            .execute(self.inner.client.post(url).json(&body))
            .await?;
        Ok(AuthSession::new(response.jwt, response.user))
    }

    #[instrument(skip(self, password))]
    async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, CmsError> {
        let url = self.endpoint("auth/local/register", &[])?;
        let body = RegisterRequest {
            username,
            email,
            password,
        };
        let response: AuthResponse = self
            .execute(self.inner.client.post(url).json(&body))
            .await?;
        Ok(AuthSession::new(response.jwt, response.user))
    }
}
