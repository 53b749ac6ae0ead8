//! End-to-end tests for the Zone7 storefront.
//!
//! [`FakeCms`] is a wiremock server that keeps carts, wishlists and orders in
//! memory, so writes made by the storefront show up in later reads.
//! [`TestApp`] serves the storefront on an ephemeral port against it and
//! talks to it with a cookie-keeping HTTP client, like a browser would.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p zone7-integration-tests
//! ```

#![allow(clippy::missing_panics_doc)]

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use wiremock::matchers::{method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};
use zone7_core::cart::ShippingPolicy;
use zone7_storefront::config::{ClientConfig, CmsConfig, StorefrontConfig};
use zone7_storefront::routes;
use zone7_storefront::state::AppState;

/// Id of the user the fake CMS logs everyone in as.
pub const USER_ID: i64 = 7;

/// A writable CMS collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Carts,
    Wishlists,
    Orders,
}

impl Collection {
    const ALL: [Self; 3] = [Self::Carts, Self::Wishlists, Self::Orders];

    const fn name(self) -> &'static str {
        match self {
            Self::Carts => "carts",
            Self::Wishlists => "wishlists",
            Self::Orders => "orders",
        }
    }
}

#[derive(Debug, Default)]
struct Tables {
    carts: Vec<Value>,
    wishlists: Vec<Value>,
    orders: Vec<Value>,
    next_id: i64,
}

impl Tables {
    const fn rows_mut(&mut self, collection: Collection) -> &mut Vec<Value> {
        match collection {
            Collection::Carts => &mut self.carts,
            Collection::Wishlists => &mut self.wishlists,
            Collection::Orders => &mut self.orders,
        }
    }

    /// Give a row an id, document id and creation time, then store it.
    fn insert(&mut self, collection: Collection, mut row: Value) -> Value {
        self.next_id += 1;
        let id = self.next_id;
        row["id"] = json!(id);
        row["documentId"] = json!(format!("{}-{id}", collection.name()));
        row["createdAt"] = json!(format!("2026-01-01T00:00:{:02}Z", id % 60));
        self.rows_mut(collection).push(row.clone());
        row
    }
}

type Shared = Arc<Mutex<Tables>>;

fn lock(tables: &Shared) -> MutexGuard<'_, Tables> {
    tables.lock().unwrap_or_else(PoisonError::into_inner)
}

fn page_of(rows: Vec<Value>) -> Value {
    let total = rows.len();
    json!({
        "data": rows,
        "meta": {"pagination": {"page": 1, "pageSize": 100, "pageCount": 1, "total": total}}
    })
}

fn cms_error(status: u16, name: &str, message: &str) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_json(json!({
        "data": null,
        "error": {"status": status, "name": name, "message": message}
    }))
}

fn document_id(request: &Request) -> String {
    request
        .url
        .path_segments()
        .and_then(Iterator::last)
        .unwrap_or_default()
        .to_string()
}

struct ListRows {
    tables: Shared,
    collection: Collection,
}

impl Respond for ListRows {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        let rows = lock(&self.tables).rows_mut(self.collection).clone();
        ResponseTemplate::new(200).set_body_json(page_of(rows))
    }
}

struct CreateRow {
    tables: Shared,
    collection: Collection,
}

impl Respond for CreateRow {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let Ok(body) = request.body_json::<Value>() else {
            return cms_error(400, "ValidationError", "Invalid JSON body");
        };
        let row = body["data"].clone();
        if !row.is_object() {
            return cms_error(400, "ValidationError", "Missing \"data\" payload");
        }
        let row = lock(&self.tables).insert(self.collection, row);
        ResponseTemplate::new(201).set_body_json(json!({"data": row, "meta": {}}))
    }
}

struct UpdateRow {
    tables: Shared,
    collection: Collection,
}

impl Respond for UpdateRow {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let Ok(body) = request.body_json::<Value>() else {
            return cms_error(400, "ValidationError", "Invalid JSON body");
        };
        let id = document_id(request);
        let mut tables = lock(&self.tables);
        let Some(row) = tables
            .rows_mut(self.collection)
            .iter_mut()
            .find(|r| r["documentId"] == id.as_str())
        else {
            return cms_error(404, "NotFoundError", "Not Found");
        };
        if let (Some(row), Some(changes)) = (row.as_object_mut(), body["data"].as_object()) {
            for (key, value) in changes {
                row.insert(key.clone(), value.clone());
            }
        }
        ResponseTemplate::new(200).set_body_json(json!({"data": row.clone(), "meta": {}}))
    }
}

struct DeleteRow {
    tables: Shared,
    collection: Collection,
}

impl Respond for DeleteRow {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let id = document_id(request);
        let mut tables = lock(&self.tables);
        let rows = tables.rows_mut(self.collection);
        match rows.iter().position(|r| r["documentId"] == id.as_str()) {
            Some(index) => ResponseTemplate::new(200)
                .set_body_json(json!({"data": rows.remove(index), "meta": {}})),
            None => cms_error(404, "NotFoundError", "Not Found"),
        }
    }
}

/// A product record as the CMS returns it, with one size.
#[must_use]
pub fn product(id: i64, name: &str, price: i64, category: &str, size: &str, stock: u32) -> Value {
    json!({
        "id": id,
        "documentId": format!("product-{id}"),
        "product_name": name,
        "product_price": price,
        "hasDiscount": false,
        "discount_value": 0,
        "product_rating": 4.5,
        "product_availability": "in stock",
        "categories": [{"id": 1, "category_name": category}],
        "sizes": [{"size": size, "stock": stock}],
        "image": [{"id": id, "url": format!("/uploads/{id}.jpg")}]
    })
}

/// In-memory stand-in for the headless CMS.
pub struct FakeCms {
    server: MockServer,
    tables: Shared,
}

impl FakeCms {
    /// Start the server with a fixed catalog.
    pub async fn start(products: Vec<Value>) -> Self {
        let server = MockServer::start().await;
        let tables = Shared::default();

        for product in &products {
            Mock::given(method("GET"))
                .and(path("/api/products"))
                .and(query_param("filters[id][$eq]", product["id"].to_string()))
                .respond_with(ResponseTemplate::new(200).set_body_json(page_of(vec![product.clone()])))
                .mount(&server)
                .await;
        }
        Mock::given(method("GET"))
            .and(path("/api/products"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page_of(products)))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/categories"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page_of(vec![
                json!({"id": 1, "category_name": "Tops"}),
                json!({"id": 2, "category_name": "Shoes"}),
            ])))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/auth/local"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jwt": "user-jwt",
                "user": {"id": USER_ID, "username": "mona", "email": "mona@zone7.eg"}
            })))
            .mount(&server)
            .await;

        for collection in Collection::ALL {
            let collection_path = format!("/api/{}", collection.name());
            let row_path = format!("^/api/{}/[^/]+$", collection.name());

            Mock::given(method("GET"))
                .and(path(collection_path.as_str()))
                .respond_with(ListRows {
                    tables: tables.clone(),
                    collection,
                })
                .mount(&server)
                .await;
            Mock::given(method("POST"))
                .and(path(collection_path.as_str()))
                .respond_with(CreateRow {
                    tables: tables.clone(),
                    collection,
                })
                .mount(&server)
                .await;
            Mock::given(method("PUT"))
                .and(path_regex(row_path.as_str()))
                .respond_with(UpdateRow {
                    tables: tables.clone(),
                    collection,
                })
                .mount(&server)
                .await;
            Mock::given(method("DELETE"))
                .and(path_regex(row_path.as_str()))
                .respond_with(DeleteRow {
                    tables: tables.clone(),
                    collection,
                })
                .mount(&server)
                .await;
        }

        Self { server, tables }
    }

    #[must_use]
    pub fn uri(&self) -> String {
        self.server.uri()
    }

    /// Insert a row as if another device had written it.
    pub fn seed(&self, collection: Collection, row: Value) -> Value {
        lock(&self.tables).insert(collection, row)
    }

    /// Current rows of a collection.
    #[must_use]
    pub fn rows(&self, collection: Collection) -> Vec<Value> {
        lock(&self.tables).rows_mut(collection).clone()
    }
}

/// The storefront served over HTTP against a [`FakeCms`].
pub struct TestApp {
    pub cms: FakeCms,
    pub base_url: String,
    pub client: Client,
}

impl TestApp {
    /// Start the CMS and the storefront.
    pub async fn spawn(products: Vec<Value>) -> Self {
        let cms = FakeCms::start(products).await;

        let config = StorefrontConfig {
            client: ClientConfig {
                cms: CmsConfig::new(&cms.uri()).expect("Invalid CMS URL"),
                shipping: ShippingPolicy::default(),
            },
            host: "127.0.0.1".parse().expect("Invalid host"),
            port: 0,
            base_url: "http://127.0.0.1".to_string(),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        };
        let state = AppState::new(config).expect("Failed to build app state");

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("No local address");
        tokio::spawn(async move {
            axum::serve(listener, routes::app(state))
                .await
                .expect("Storefront server failed");
        });

        let client = Client::builder()
            .cookie_store(true)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            cms,
            base_url: format!("http://{addr}"),
            client,
        }
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> (StatusCode, Value) {
        let response = request.send().await.expect("Request failed");
        let status = response.status();
        let body = response.text().await.expect("Failed to read body");
        (status, serde_json::from_str(&body).unwrap_or(Value::Null))
    }

    pub async fn get(&self, path: &str) -> (StatusCode, Value) {
        self.send(self.client.get(format!("{}{path}", self.base_url)))
            .await
    }

    pub async fn post(&self, path: &str, body: &Value) -> (StatusCode, Value) {
        self.send(self.client.post(format!("{}{path}", self.base_url)).json(body))
            .await
    }

    pub async fn put(&self, path: &str, body: &Value) -> (StatusCode, Value) {
        self.send(self.client.put(format!("{}{path}", self.base_url)).json(body))
            .await
    }

    pub async fn delete(&self, path: &str) -> (StatusCode, Value) {
        self.send(self.client.delete(format!("{}{path}", self.base_url)))
            .await
    }

    /// Log in as the fake CMS user and return the response body.
    pub async fn login(&self) -> Value {
        let (status, body) = self
            .post(
                "/api/auth/login",
                &json!({"email": "mona@zone7.eg", "password": "Secret1"}),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");
        body
    }
}

/// Read a decimal amount serialized as a string or number.
#[must_use]
pub fn amount(value: &Value) -> f64 {
    match value {
        Value::String(s) => s.parse().unwrap_or(f64::NAN),
        other => other.as_f64().unwrap_or(f64::NAN),
    }
}
