//! Wire types for the headless CMS REST API.
//!
//! Responses are wrapped in `{ "data": ..., "meta": { "pagination": ... } }`
//! and writes are sent as `{ "data": { ... } }`. Field names follow the CMS
//! content types, so several records accept more than one spelling.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use zone7_core::OrderStatus;

// =============================================================================
// Envelope
// =============================================================================

/// Standard response envelope.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub data: T,
    #[serde(default)]
    pub meta: Meta,
}

#[derive(Debug, Default, Deserialize)]
pub struct Meta {
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

/// Page-based pagination metadata.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub page_size: u32,
    pub page_count: u32,
    pub total: u32,
}

/// Request body wrapper for writes.
#[derive(Debug, Serialize)]
pub struct DataBody<T> {
    pub data: T,
}

/// Error body: `{ "error": { "status", "name", "message" } }`.
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
pub struct ErrorDetail {
    #[serde(default)]
    pub status: Option<u16>,
    #[serde(default)]
    pub name: Option<String>,
    pub message: String,
}

// =============================================================================
// Catalog
// =============================================================================

/// A media attribute: a single file, a list of files, or a bare media id
/// when the relation was not populated.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum MediaField {
    Many(Vec<MediaRecord>),
    One(MediaRecord),
    Unpopulated(i64),
}

impl MediaField {
    pub fn into_vec(self) -> Vec<MediaRecord> {
        match self {
            Self::Many(files) => files,
            Self::One(file) => vec![file],
            Self::Unpopulated(_) => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MediaRecord {
    #[serde(default)]
    pub id: Option<i64>,
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SizeRecord {
    pub size: String,
    #[serde(default)]
    pub stock: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CategoryRecord {
    pub id: i64,
    #[serde(alias = "name")]
    pub category_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProductRecord {
    pub id: i64,
    #[serde(rename = "documentId", default)]
    pub document_id: Option<String>,
    pub product_name: String,
    /// Plain text or rich-text blocks.
    #[serde(default)]
    pub description: Option<serde_json::Value>,
    pub product_price: Decimal,
    #[serde(rename = "hasDiscount", default)]
    pub has_discount: Option<bool>,
    #[serde(default)]
    pub discount_value: Option<Decimal>,
    #[serde(default)]
    pub product_rating: Option<f64>,
    #[serde(default)]
    pub product_availability: Option<String>,
    #[serde(default)]
    pub categories: Option<Vec<CategoryRecord>>,
    #[serde(default)]
    pub sizes: Option<Vec<SizeRecord>>,
    #[serde(default)]
    pub image: Option<MediaField>,
}

// =============================================================================
// Cart
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct CartRow {
    pub id: i64,
    #[serde(rename = "documentId")]
    pub document_id: String,
    pub product_id: i64,
    #[serde(alias = "name")]
    pub product_name: String,
    pub price: Decimal,
    pub quantity: u32,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(alias = "maxStock")]
    pub max_stock: u32,
    #[serde(default)]
    pub image: Option<MediaField>,
}

/// Cart row write. Attribute names follow the `cart` content type.
#[derive(Debug, Serialize)]
pub struct CartRowInput<'a> {
    pub users_permissions_user: i64,
    pub product_id: i64,
    #[serde(rename = "name")]
    pub product_name: &'a str,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub quantity: u32,
    pub size: &'a str,
    #[serde(rename = "maxStock")]
    pub max_stock: u32,
    /// Media id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct CartQuantityInput {
    pub quantity: u32,
    #[serde(rename = "maxStock", skip_serializing_if = "Option::is_none")]
    pub max_stock: Option<u32>,
}

// =============================================================================
// Wishlist
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct WishlistRow {
    pub id: i64,
    #[serde(rename = "documentId")]
    pub document_id: String,
    pub product_id: i64,
    #[serde(default, alias = "product_documentId")]
    pub product_document_id: Option<String>,
    #[serde(alias = "product_name")]
    pub name: String,
    #[serde(default, alias = "product_price")]
    pub price: Option<Decimal>,
    #[serde(default, alias = "product_rating")]
    pub rating: Option<f64>,
    #[serde(default)]
    pub image: Option<MediaField>,
}

/// Wishlist row write. Attribute names follow the `wishlist` content type.
#[derive(Debug, Serialize)]
pub struct WishlistRowInput<'a> {
    pub users_permissions_user: i64,
    pub product_id: i64,
    #[serde(rename = "product_documentId")]
    pub product_document_id: Option<&'a str>,
    #[serde(rename = "product_name")]
    pub name: &'a str,
    #[serde(rename = "product_price", with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(rename = "product_rating")]
    pub rating: Option<f64>,
    /// Media id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<i64>,
}

// =============================================================================
// Orders
// =============================================================================

/// One item inside an order's `items` JSON field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItemRecord {
    pub product_id: i64,
    #[serde(alias = "product_name")]
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub quantity: u32,
    #[serde(default)]
    pub size: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRecord {
    pub id: i64,
    #[serde(default)]
    pub document_id: Option<String>,
    #[serde(default)]
    pub cust_name: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub shipping_address: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub payment_method: Option<String>,
    /// A JSON array, or the same array encoded as a string.
    #[serde(default)]
    pub items: serde_json::Value,
    #[serde(default)]
    pub grand_total: Option<Decimal>,
    #[serde(rename = "status_O", default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderInput<'a> {
    #[serde(rename = "users_permissions_user")]
    pub users_permissions_user: i64,
    pub items: Vec<OrderItemRecord>,
    #[serde(with = "rust_decimal::serde::float")]
    pub grand_total: Decimal,
    pub phone_number: &'a str,
    pub shipping_address: &'a str,
    pub country: &'a str,
    pub city: &'a str,
    pub payment_method: &'a str,
    pub cust_name: Option<&'a str>,
    #[serde(rename = "status_O")]
    pub status: &'a str,
}

// =============================================================================
// Auth
// =============================================================================

#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub identifier: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub struct RegisterRequest<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

/// Body returned by login and registration.
#[derive(Debug, Deserialize)]
pub struct AuthResponse {
    pub jwt: String,
    pub user: zone7_core::user::UserProfile,
}
