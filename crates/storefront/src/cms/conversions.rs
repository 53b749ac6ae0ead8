//! Conversions from CMS wire records to domain types.

use rust_decimal::Decimal;
use url::Url;
use zone7_core::cart::{CartLine, NewCartLine};
use zone7_core::catalog::{Category, Product, ProductImage, ProductSize};
use zone7_core::order::{NewOrder, Order, OrderItem};
use zone7_core::wishlist::{NewWishlistEntry, WishlistEntry};
use zone7_core::{CategoryId, DocumentId, ImageId, OrderId, ProductId};

use super::types::{
    CartRow, CartRowInput, CategoryRecord, MediaField, OrderInput, OrderItemRecord, OrderRecord,
    ProductRecord, WishlistRow, WishlistRowInput,
};

/// Make a media URL absolute. Upload paths are relative to the CMS origin.
pub fn resolve_media_url(origin: &Url, raw: &str) -> String {
    if raw.starts_with("http://") || raw.starts_with("https://") {
        return raw.to_owned();
    }
    origin
        .join(raw)
        .map_or_else(|_| raw.to_owned(), String::from)
}

/// URL of the first file in a populated media field.
fn first_media_url(field: Option<MediaField>, origin: &Url) -> Option<String> {
    field
        .map(MediaField::into_vec)
        .and_then(|files| files.into_iter().next())
        .map(|file| resolve_media_url(origin, &file.url))
}

fn clamp_stock(stock: Option<i64>) -> u32 {
    u32::try_from(stock.unwrap_or(0).max(0)).unwrap_or(u32::MAX)
}

/// Flatten a description that may be plain text or rich-text blocks.
fn description_text(value: serde_json::Value) -> Option<String> {
    fn collect(value: &serde_json::Value, out: &mut Vec<String>) {
        match value {
            serde_json::Value::String(s) => out.push(s.clone()),
            serde_json::Value::Array(items) => items.iter().for_each(|v| collect(v, out)),
            serde_json::Value::Object(map) => {
                if let Some(serde_json::Value::String(text)) = map.get("text") {
                    out.push(text.clone());
                }
                if let Some(children) = map.get("children") {
                    collect(children, out);
                }
            }
            _ => {}
        }
    }

    let mut parts = Vec::new();
    collect(&value, &mut parts);
    let text = parts.concat();
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_owned())
}

pub fn convert_category(record: CategoryRecord) -> Category {
    Category {
        id: CategoryId::new(record.id),
        name: record.category_name,
    }
}

pub fn convert_product(record: ProductRecord, origin: &Url) -> Product {
    Product {
        id: ProductId::new(record.id),
        document_id: record.document_id.map(DocumentId::new),
        name: record.product_name,
        description: record.description.and_then(description_text),
        price: record.product_price,
        has_discount: record.has_discount.unwrap_or(false),
        discount_value: record.discount_value.unwrap_or(Decimal::ZERO),
        rating: record.product_rating,
        availability: record.product_availability,
        categories: record
            .categories
            .unwrap_or_default()
            .into_iter()
            .map(|c| c.category_name)
            .collect(),
        sizes: record
            .sizes
            .unwrap_or_default()
            .into_iter()
            .map(|s| ProductSize {
                size: s.size,
                stock: clamp_stock(s.stock),
            })
            .collect(),
        images: record
            .image
            .map(MediaField::into_vec)
            .unwrap_or_default()
            .into_iter()
            .map(|m| ProductImage {
                id: m.id.map(ImageId::new),
                url: resolve_media_url(origin, &m.url),
            })
            .collect(),
    }
}

pub fn convert_cart_row(row: CartRow, origin: &Url) -> CartLine {
    CartLine {
        id: DocumentId::new(row.document_id),
        product_id: ProductId::new(row.product_id),
        name: row.product_name,
        unit_price: row.price,
        quantity: row.quantity,
        size: row.size.unwrap_or_default(),
        max_stock: row.max_stock,
        image_url: first_media_url(row.image, origin),
    }
}

pub fn cart_row_input(user_id: i64, line: &NewCartLine) -> CartRowInput<'_> {
    CartRowInput {
        users_permissions_user: user_id,
        product_id: line.product_id.as_i64(),
        product_name: &line.name,
        price: line.unit_price,
        quantity: line.quantity,
        size: &line.size,
        max_stock: line.max_stock,
        image: line.image_id.map(|id| id.as_i64()),
    }
}

pub fn convert_wishlist_row(row: WishlistRow, origin: &Url) -> WishlistEntry {
    WishlistEntry {
        id: DocumentId::new(row.document_id),
        product_id: ProductId::new(row.product_id),
        product_document_id: row.product_document_id.map(DocumentId::new),
        name: row.name,
        price: row.price.unwrap_or(Decimal::ZERO),
        rating: row.rating,
        image_url: first_media_url(row.image, origin),
    }
}

pub fn wishlist_row_input(user_id: i64, entry: &NewWishlistEntry) -> WishlistRowInput<'_> {
    WishlistRowInput {
        users_permissions_user: user_id,
        product_id: entry.product_id.as_i64(),
        product_document_id: entry.product_document_id.as_ref().map(DocumentId::as_str),
        name: &entry.name,
        price: entry.price,
        rating: entry.rating,
        image: entry.image_id.map(|id| id.as_i64()),
    }
}

fn convert_order_item(record: OrderItemRecord) -> OrderItem {
    OrderItem {
        product_id: ProductId::new(record.product_id),
        name: record.name,
        unit_price: record.price,
        quantity: record.quantity,
        size: record.size,
        image_url: record.image_url,
    }
}

/// Parse an order's `items`, which may be an array or a JSON-encoded array.
///
/// Anything malformed yields an empty list.
pub fn parse_order_items(value: serde_json::Value) -> Vec<OrderItem> {
    let value = match value {
        serde_json::Value::String(raw) => match serde_json::from_str(&raw) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(error = %e, "Order items string is not valid JSON");
                return Vec::new();
            }
        },
        serde_json::Value::Null => return Vec::new(),
        other => other,
    };

    match serde_json::from_value::<Vec<OrderItemRecord>>(value) {
        Ok(records) => records.into_iter().map(convert_order_item).collect(),
        Err(e) => {
            tracing::warn!(error = %e, "Ignoring malformed order items");
            Vec::new()
        }
    }
}

pub fn convert_order(record: OrderRecord) -> Order {
    Order {
        id: OrderId::new(record.id),
        document_id: record.document_id.map(DocumentId::new),
        customer_name: record.cust_name.filter(|n| !n.trim().is_empty()),
        phone_number: record.phone_number.unwrap_or_default(),
        shipping_address: record.shipping_address.unwrap_or_default(),
        country: record.country.unwrap_or_default(),
        city: record.city.unwrap_or_default(),
        payment_method: record.payment_method.unwrap_or_default(),
        items: parse_order_items(record.items),
        grand_total: record.grand_total.unwrap_or(Decimal::ZERO),
        status: record.status,
        created_at: record.created_at,
    }
}

pub fn order_input(order: &NewOrder) -> OrderInput<'_> {
    OrderInput {
        users_permissions_user: order.user_id.as_i64(),
        items: order
            .items
            .iter()
            .map(|item| OrderItemRecord {
                product_id: item.product_id.as_i64(),
                name: item.name.clone(),
                price: item.unit_price,
                quantity: item.quantity,
                size: item.size.clone(),
                image_url: item.image_url.clone(),
            })
            .collect(),
        grand_total: order.grand_total,
        phone_number: &order.form.phone_number,
        shipping_address: &order.form.shipping_address,
        country: &order.form.country,
        city: &order.form.city,
        payment_method: order.form.payment_method.as_str(),
        cust_name: order.form.customer_name.as_deref(),
        status: order.status.as_str(),
    }
}
