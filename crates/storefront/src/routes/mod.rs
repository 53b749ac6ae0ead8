//! HTTP route handlers for the storefront JSON API.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                              - Health check
//!
//! # Catalog
//! GET    /api/products?q=                     - Product listing / name search
//! GET    /api/products/{id}                   - Product detail with related products
//! GET    /api/products/{id}/related           - Related products
//! GET    /api/categories                      - Categories with product counts
//! GET    /api/shop                            - Filtered page for the session's filters
//! GET    /api/shop/filters                    - Current filter state
//! POST   /api/shop/filters                    - Apply a filter action
//!
//! # Cart (guest cart when anonymous)
//! GET    /api/cart
//! POST   /api/cart/items
//! PUT    /api/cart/items/{line_id}
//! DELETE /api/cart/items/{line_id}
//! DELETE /api/cart
//!
//! # Wishlist (requires auth)
//! GET    /api/wishlist
//! POST   /api/wishlist/toggle
//! POST   /api/wishlist/{product_id}/move-to-cart
//! DELETE /api/wishlist/{product_id}
//! DELETE /api/wishlist
//!
//! # Checkout (requires auth)
//! GET    /api/checkout                        - Revalidated review
//! POST   /api/checkout                        - Place order
//! GET    /api/orders                          - Order history
//!
//! # Auth
//! POST   /api/auth/login
//! POST   /api/auth/register
//! POST   /api/auth/logout
//! GET    /api/auth/me
//! ```

pub mod auth;
pub mod cart;
pub mod checkout;
pub mod products;
pub mod wishlist;

use axum::{
    Router, middleware as axum_middleware,
    routing::{delete, get, post, put},
};
use tower_http::trace::TraceLayer;

use crate::middleware::{
    create_session_layer, request_id_middleware, security_headers_middleware,
};
use crate::state::AppState;

/// Create the catalog routes router.
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(products::index))
        .route("/products/{id}", get(products::show))
        .route("/products/{id}/related", get(products::related))
        .route("/categories", get(products::categories))
        .route("/shop", get(products::shop))
        .route(
            "/shop/filters",
            get(products::filters).post(products::update_filters),
        )
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).delete(cart::clear))
        .route("/items", post(cart::add))
        .route("/items/{line_id}", put(cart::update).delete(cart::remove))
}

/// Create the wishlist routes router.
pub fn wishlist_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(wishlist::show).delete(wishlist::clear))
        .route("/toggle", post(wishlist::toggle))
        .route("/{product_id}", delete(wishlist::remove))
        .route("/{product_id}/move-to-cart", post(wishlist::move_to_cart))
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(auth::login))
        .route("/register", post(auth::register))
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
}

/// Create all API routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(catalog_routes())
        .nest("/cart", cart_routes())
        .nest("/wishlist", wishlist_routes())
        .route("/checkout", get(checkout::review).post(checkout::place))
        .route("/orders", get(checkout::orders))
        .nest("/auth", auth_routes())
}

/// Liveness health check. Does not check the CMS.
async fn health() -> &'static str {
    "ok"
}

/// The full application: routes plus the session, request-id, security
/// header and tracing layers. Sentry layers are added by the binary.
pub fn app(state: AppState) -> Router {
    let session_layer = create_session_layer(state.config());

    Router::new()
        .route("/health", get(health))
        .nest("/api", routes())
        .layer(axum_middleware::from_fn(security_headers_middleware))
        .layer(session_layer)
        .layer(axum_middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use serde_json::{Value, json};
    use tower::ServiceExt;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::config::{ClientConfig, CmsConfig, StorefrontConfig};
    use zone7_core::cart::ShippingPolicy;

    fn config(cms_url: &str) -> StorefrontConfig {
        StorefrontConfig {
            client: ClientConfig {
                cms: CmsConfig::new(cms_url).unwrap(),
                shipping: ShippingPolicy::default(),
            },
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        }
    }

    async fn cms() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/products"))
            .and(query_param("filters[id][$eq]", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [product_json()],
                "meta": {}
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/products"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [product_json()],
                "meta": {"pagination": {"page": 1, "pageSize": 100, "pageCount": 1, "total": 1}}
            })))
            .mount(&server)
            .await;
        server
    }

    fn product_json() -> Value {
        json!({
            "id": 1,
            "documentId": "p1",
            "product_name": "Runner Tee",
            "product_price": 600,
            "hasDiscount": false,
            "discount_value": 0,
            "product_rating": 4.5,
            "product_availability": "in stock",
            "categories": [{"id": 1, "category_name": "Tops"}],
            "sizes": [{"size": "M", "stock": 3}],
            "image": [{"id": 1, "url": "/uploads/tee.jpg"}]
        })
    }

    fn app_for(server: &MockServer) -> Router {
        app(AppState::new(config(&server.uri())).unwrap())
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Option<String>, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .map(|v| v.to_str().unwrap().split(';').next().unwrap().to_string());
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, cookie, body)
    }

    fn json_request(method: &str, uri: &str, cookie: Option<&str>, body: &Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn get_request(uri: &str, cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let server = MockServer::start().await;
        let (status, _, _) = send(&app_for(&server), get_request("/health", None)).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_guest_cart_lives_in_session() {
        let server = cms().await;
        let app = app_for(&server);

        let (status, cookie, body) = send(
            &app,
            json_request("POST", "/api/cart/items", None, &json!({"product_id": 1, "quantity": 2})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["guest"], true);
        assert_eq!(body["lines"][0]["id"], "1:M");
        let cookie = cookie.unwrap();
        assert!(cookie.starts_with("z7_session="));

        let (status, _, body) = send(
            &app,
            json_request("POST", "/api/cart/items", Some(&cookie), &json!({"product_id": 1, "quantity": 2})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(body["error"].as_str().unwrap().contains("in stock"));

        let (status, _, body) = send(
            &app,
            json_request("PUT", "/api/cart/items/1:M", Some(&cookie), &json!({"quantity": 9})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["lines"][0]["quantity"], 3);
        assert_eq!(body["totals"]["shipping"], "0");

        let (status, _, body) = send(&app, get_request("/api/cart", Some(&cookie))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["totals"]["item_count"], 3);
    }

    #[tokio::test]
    async fn test_wishlist_requires_login() {
        let server = MockServer::start().await;
        let (status, _, body) = send(&app_for(&server), get_request("/api/wishlist", None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body["error"].is_string());

        let (status, _, _) = send(&app_for(&server), get_request("/api/auth/me", None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_filters_persist_in_session() {
        let server = cms().await;
        let app = app_for(&server);

        let (status, cookie, body) = send(
            &app,
            json_request(
                "POST",
                "/api/shop/filters",
                None,
                &json!({"action": "toggle_category", "name": "Tops"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["selectedCategories"][0], "tops");

        let (_, _, body) = send(&app, get_request("/api/shop/filters", cookie.as_deref())).await;
        assert_eq!(body["selectedCategories"][0], "tops");
    }

    #[tokio::test]
    async fn test_login_then_me() {
        let server = cms().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/local"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jwt": "token-123",
                "user": {"id": 7, "username": "mona", "email": "mona@zone7.eg"}
            })))
            .mount(&server)
            .await;
        let app = app_for(&server);

        let (status, cookie, body) = send(
            &app,
            json_request(
                "POST",
                "/api/auth/login",
                None,
                &json!({"email": "mona@zone7.eg", "password": "Secret1"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["username"], "mona");
        assert!(body["merge"].is_null());

        let (status, _, body) = send(&app, get_request("/api/auth/me", cookie.as_deref())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["email"], "mona@zone7.eg");
    }

    #[tokio::test]
    async fn test_login_validation_error_is_bad_request() {
        let server = MockServer::start().await;
        let (status, _, body) = send(
            &app_for(&server),
            json_request(
                "POST",
                "/api/auth/login",
                None,
                &json!({"identifier": "nope", "password": "Secret1"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("email"));
    }
}
