//! In-memory CMS used by service tests.

#![allow(clippy::unwrap_used)]

use std::sync::{Arc, Mutex};

use rust_decimal::Decimal;
use zone7_core::cart::{CartLine, NewCartLine};
use zone7_core::catalog::{Category, IN_STOCK, Product, ProductImage, ProductSize};
use zone7_core::order::{NewOrder, Order};
use zone7_core::user::UserProfile;
use zone7_core::wishlist::{NewWishlistEntry, WishlistEntry};
use zone7_core::{DocumentId, ImageId, OrderId, ProductId, UserId};

use crate::cms::{
    AuthRepository, CartRepository, CatalogRepository, CmsError, OrderRepository,
    WishlistRepository,
};
use crate::models::AuthSession;

#[derive(Debug, Default)]
pub struct FakeState {
    pub cart: Vec<CartLine>,
    pub wishlist: Vec<WishlistEntry>,
    pub products: Vec<Product>,
    pub categories: Vec<Category>,
    pub orders: Vec<Order>,
    pub next_id: u32,
    pub cart_writes: usize,
    pub product_fetches: usize,
    pub fail_orders: bool,
    pub fail_cart_creates: bool,
}

#[derive(Debug, Clone, Default)]
pub struct FakeCms {
    pub state: Arc<Mutex<FakeState>>,
}

impl FakeCms {
    pub fn with_products(products: Vec<Product>) -> Self {
        let cms = Self::default();
        cms.state.lock().unwrap().products = products;
        cms
    }

    pub fn cart(&self) -> Vec<CartLine> {
        self.state.lock().unwrap().cart.clone()
    }

    pub fn set_stock(&self, product_id: ProductId, size: &str, stock: u32) {
        let mut state = self.state.lock().unwrap();
        let product = state
            .products
            .iter_mut()
            .find(|p| p.id == product_id)
            .unwrap();
        product
            .sizes
            .iter_mut()
            .find(|s| s.size == size)
            .unwrap()
            .stock = stock;
    }

    fn next_id(state: &mut FakeState, prefix: &str) -> DocumentId {
        state.next_id += 1;
        DocumentId::new(format!("{prefix}{}", state.next_id))
    }
}

pub fn session() -> AuthSession {
    AuthSession::new(
        "jwt",
        UserProfile {
            id: UserId::new(7),
            username: "mona".to_string(),
            email: "mona@zone7.eg".to_string(),
            document_id: None,
        },
    )
}

/// A product with sizes M (stock `m_stock`) and L (stock 0).
pub fn product(id: i64, name: &str, price: i64, m_stock: u32) -> Product {
    Product {
        id: ProductId::new(id),
        document_id: Some(DocumentId::new(format!("p{id}"))),
        name: name.to_string(),
        description: None,
        price: Decimal::new(price, 0),
        has_discount: false,
        discount_value: Decimal::ZERO,
        rating: Some(4.0),
        availability: Some(IN_STOCK.to_string()),
        categories: vec!["Tops".to_string()],
        sizes: vec![
            ProductSize {
                size: "M".to_string(),
                stock: m_stock,
            },
            ProductSize {
                size: "L".to_string(),
                stock: 0,
            },
        ],
        images: vec![ProductImage {
            id: Some(ImageId::new(id)),
            url: format!("http://cms.test/uploads/{id}.jpg"),
        }],
    }
}

impl CartRepository for FakeCms {
    async fn list_cart(&self, _auth: &AuthSession) -> Result<Vec<CartLine>, CmsError> {
        Ok(self.cart())
    }

    async fn create_cart_line(&self, _auth: &AuthSession, line: &NewCartLine) -> Result<(), CmsError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_cart_creates {
            return Err(CmsError::Api {
                status: 500,
                message: "boom".to_string(),
            });
        }
        let id = Self::next_id(&mut state, "c");
        state.cart_writes += 1;
        state.cart.push(CartLine {
            id,
            product_id: line.product_id,
            name: line.name.clone(),
            unit_price: line.unit_price,
            quantity: line.quantity,
            size: line.size.clone(),
            max_stock: line.max_stock,
            image_url: line.image_url.clone(),
        });
        Ok(())
    }

    async fn update_cart_quantity(
        &self,
        _auth: &AuthSession,
        id: &DocumentId,
        quantity: u32,
        max_stock: Option<u32>,
    ) -> Result<(), CmsError> {
        let mut state = self.state.lock().unwrap();
        state.cart_writes += 1;
        let line = state
            .cart
            .iter_mut()
            .find(|l| &l.id == id)
            .ok_or_else(|| CmsError::NotFound(id.to_string()))?;
        line.quantity = quantity;
        if let Some(max_stock) = max_stock {
            line.max_stock = max_stock;
        }
        Ok(())
    }

    async fn delete_cart_line(&self, _auth: &AuthSession, id: &DocumentId) -> Result<(), CmsError> {
        let mut state = self.state.lock().unwrap();
        state.cart_writes += 1;
        state.cart.retain(|l| &l.id != id);
        Ok(())
    }
}

impl WishlistRepository for FakeCms {
    async fn list_wishlist(&self, _auth: &AuthSession) -> Result<Vec<WishlistEntry>, CmsError> {
        Ok(self.state.lock().unwrap().wishlist.clone())
    }

    async fn create_wishlist_entry(
        &self,
        _auth: &AuthSession,
        entry: &NewWishlistEntry,
    ) -> Result<(), CmsError> {
        let mut state = self.state.lock().unwrap();
        let id = Self::next_id(&mut state, "w");
        state.wishlist.push(WishlistEntry {
            id,
            product_id: entry.product_id,
            product_document_id: entry.product_document_id.clone(),
            name: entry.name.clone(),
            price: entry.price,
            rating: entry.rating,
            image_url: entry.image_url.clone(),
        });
        Ok(())
    }

    async fn delete_wishlist_entry(
        &self,
        _auth: &AuthSession,
        id: &DocumentId,
    ) -> Result<(), CmsError> {
        self.state.lock().unwrap().wishlist.retain(|e| &e.id != id);
        Ok(())
    }
}

impl CatalogRepository for FakeCms {
    async fn list_products(&self) -> Result<Vec<Product>, CmsError> {
        Ok(self.state.lock().unwrap().products.clone())
    }

    async fn get_product(&self, id: ProductId) -> Result<Product, CmsError> {
        self.state
            .lock()
            .unwrap()
            .products
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or_else(|| CmsError::NotFound(format!("Product not found: {id}")))
    }

    async fn fetch_product_fresh(&self, id: ProductId) -> Result<Product, CmsError> {
        self.state.lock().unwrap().product_fetches += 1;
        self.get_product(id).await
    }

    async fn list_categories(&self) -> Result<Vec<Category>, CmsError> {
        Ok(self.state.lock().unwrap().categories.clone())
    }
}

impl OrderRepository for FakeCms {
    async fn create_order(&self, _auth: &AuthSession, order: &NewOrder) -> Result<Order, CmsError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_orders {
            return Err(CmsError::Api {
                status: 500,
                message: "order service down".to_string(),
            });
        }
        let document_id = Self::next_id(&mut state, "o");
        let created = Order {
            id: OrderId::new(i64::from(state.next_id)),
            document_id: Some(document_id),
            customer_name: order.form.customer_name.clone(),
            phone_number: order.form.phone_number.clone(),
            shipping_address: order.form.shipping_address.clone(),
            country: order.form.country.clone(),
            city: order.form.city.clone(),
            payment_method: order.form.payment_method.to_string(),
            items: order.items.clone(),
            grand_total: order.grand_total,
            status: order.status,
            created_at: None,
        };
        state.orders.insert(0, created.clone());
        Ok(created)
    }

    async fn list_orders(&self, _auth: &AuthSession) -> Result<Vec<Order>, CmsError> {
        Ok(self.state.lock().unwrap().orders.clone())
    }
}

impl AuthRepository for FakeCms {
    async fn login(&self, identifier: &str, password: &str) -> Result<AuthSession, CmsError> {
        if identifier == "mona@zone7.eg" && password == "Secret1" {
            Ok(session())
        } else {
            Err(CmsError::Api {
                status: 400,
                message: "Invalid identifier or password".to_string(),
            })
        }
    }

    async fn register(
        &self,
        username: &str,
        email: &str,
        _password: &str,
    ) -> Result<AuthSession, CmsError> {
        if email == "taken@zone7.eg" {
            return Err(CmsError::Api {
                status: 400,
                message: "Email or Username are already taken".to_string(),
            });
        }
        Ok(AuthSession::new(
            "jwt",
            UserProfile {
                id: UserId::new(8),
                username: username.to_string(),
                email: email.to_string(),
                document_id: None,
            },
        ))
    }
}
