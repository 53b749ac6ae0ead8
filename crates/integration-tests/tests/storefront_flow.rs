//! End-to-end shopper journeys through the storefront API.
//!
//! Each test starts a fresh simulated CMS and storefront server, then drives
//! the API with a cookie-keeping client.

use reqwest::StatusCode;
use serde_json::{Value, json};
use zone7_integration_tests::{Collection, TestApp, USER_ID, amount, product};

fn catalog() -> Vec<Value> {
    vec![
        product(1, "Runner Tee", 600, "Tops", "M", 3),
        product(2, "Trail Shoe", 900, "Shoes", "42", 5),
    ]
}

fn lines(cart: &Value) -> &Vec<Value> {
    cart["lines"].as_array().expect("cart has no lines array")
}

// ============================================================================
// Guest cart and login merge
// ============================================================================

#[tokio::test]
async fn test_guest_cart_merges_on_login() {
    let app = TestApp::spawn(catalog()).await;

    let (status, cart) = app
        .post("/api/cart/items", &json!({"product_id": 1, "quantity": 2}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["guest"], true);

    let login = app.login().await;
    let merged = login["merge"]["merged"].as_array().expect("merge report");
    assert_eq!(merged.len(), 1);
    assert_eq!(merged[0]["added"], 2);

    let (status, cart) = app.get("/api/cart").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["guest"], false);
    assert_eq!(lines(&cart).len(), 1);
    assert_eq!(lines(&cart)[0]["quantity"], 2);
    assert_eq!(app.cms.rows(Collection::Carts).len(), 1);

    // The merged lines left the guest cart.
    let (status, _) = app.post("/api/auth/logout", &json!({})).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, cart) = app.get("/api/cart").await;
    assert_eq!(cart["guest"], true);
    assert!(lines(&cart).is_empty());
}

#[tokio::test]
async fn test_merge_caps_to_remaining_stock() {
    let app = TestApp::spawn(catalog()).await;
    app.cms.seed(
        Collection::Carts,
        json!({
            "users_permissions_user": USER_ID,
            "product_id": 1,
            "name": "Runner Tee",
            "price": 600,
            "quantity": 2,
            "size": "M",
            "maxStock": 3
        }),
    );

    app.post("/api/cart/items", &json!({"product_id": 1, "quantity": 2}))
        .await;
    let login = app.login().await;

    let capped = login["merge"]["capped"].as_array().expect("merge report");
    assert_eq!(capped.len(), 1);
    assert_eq!(capped[0]["requested"], 2);
    assert_eq!(capped[0]["added"], 1);

    let (_, cart) = app.get("/api/cart").await;
    assert_eq!(lines(&cart).len(), 1);
    assert_eq!(lines(&cart)[0]["quantity"], 3);
    assert_eq!(lines(&cart)[0]["at_max_stock"], true);
}

// ============================================================================
// Authenticated cart
// ============================================================================

#[tokio::test]
async fn test_remote_cart_rejects_quantity_over_stock() {
    let app = TestApp::spawn(catalog()).await;
    app.login().await;

    let (status, _) = app
        .post("/api/cart/items", &json!({"product_id": 1, "quantity": 3}))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .post("/api/cart/items", &json!({"product_id": 1}))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].is_string());

    let rows = app.cms.rows(Collection::Carts);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["quantity"], 3);
    assert_eq!(rows[0]["name"], "Runner Tee");
    assert_eq!(rows[0]["maxStock"], 3);
    assert_eq!(rows[0]["image"], 1);
}

#[tokio::test]
async fn test_remote_cart_update_and_remove() {
    let app = TestApp::spawn(catalog()).await;
    app.login().await;

    let (_, cart) = app
        .post("/api/cart/items", &json!({"product_id": 2, "size": "42"}))
        .await;
    let line_id = lines(&cart)[0]["id"].as_str().expect("line id").to_string();

    let (status, cart) = app
        .put(&format!("/api/cart/items/{line_id}"), &json!({"quantity": 50}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(lines(&cart)[0]["quantity"], 5);

    let (status, cart) = app.delete(&format!("/api/cart/items/{line_id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(lines(&cart).is_empty());

    let (status, _) = app.delete(&format!("/api/cart/items/{line_id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ============================================================================
// Wishlist
// ============================================================================

#[tokio::test]
async fn test_wishlist_toggle_and_move_to_cart() {
    let app = TestApp::spawn(catalog()).await;

    let (status, _) = app.get("/api/wishlist").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    app.login().await;

    let (status, toggled) = app
        .post("/api/wishlist/toggle", &json!({"product_id": 2}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(toggled["outcome"], "added");
    let saved = app.cms.rows(Collection::Wishlists);
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0]["product_name"], "Trail Shoe");
    assert_eq!(saved[0]["product_documentId"], "product-2");

    let (status, moved) = app.post("/api/wishlist/2/move-to-cart", &json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(lines(&moved["cart"])[0]["product_id"], 2);
    assert!(moved["wishlist"]["entries"].as_array().expect("entries").is_empty());
    assert!(app.cms.rows(Collection::Wishlists).is_empty());
}

// ============================================================================
// Checkout
// ============================================================================

#[tokio::test]
async fn test_checkout_places_order_and_clears_cart() {
    let app = TestApp::spawn(catalog()).await;
    app.login().await;
    app.post("/api/cart/items", &json!({"product_id": 1, "quantity": 2}))
        .await;

    let (status, review) = app.get("/api/checkout").await;
    assert_eq!(status, StatusCode::OK);
    assert!((amount(&review["totals"]["subtotal"]) - 1200.0).abs() < f64::EPSILON);

    let (status, placed) = app
        .post(
            "/api/checkout",
            &json!({
                "phone_number": "01000000000",
                "shipping_address": "1 Nile St",
                "city": "cairo"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{placed}");
    assert!((amount(&placed["totals"]["grand_total"]) - 1200.0).abs() < f64::EPSILON);
    assert_eq!(placed["totals"]["free_shipping"], true);
    assert!(lines(&placed["cart"]).is_empty());
    assert!(app.cms.rows(Collection::Carts).is_empty());

    let (status, orders) = app.get("/api/orders").await;
    assert_eq!(status, StatusCode::OK);
    let orders = orders.as_array().expect("orders array");
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0]["city"], "Cairo");
    assert_eq!(orders[0]["items"][0]["quantity"], 2);
}

#[tokio::test]
async fn test_checkout_rejects_bad_form_and_keeps_cart() {
    let app = TestApp::spawn(catalog()).await;

    let (status, _) = app.post("/api/checkout", &json!({})).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    app.login().await;
    app.post("/api/cart/items", &json!({"product_id": 1})).await;

    let (status, body) = app
        .post(
            "/api/checkout",
            &json!({"phone_number": "010", "shipping_address": "1 Nile St", "city": "Paris"}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().expect("message").contains("Paris"));
    assert_eq!(app.cms.rows(Collection::Carts).len(), 1);
    assert!(app.cms.rows(Collection::Orders).is_empty());
}

// ============================================================================
// Shop filters
// ============================================================================

#[tokio::test]
async fn test_filters_survive_logout() {
    let app = TestApp::spawn(catalog()).await;

    let (status, _) = app
        .post(
            "/api/shop/filters",
            &json!({"action": "toggle_category", "name": "Tops"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, shop) = app.get("/api/shop").await;
    let items = shop["products"]["items"].as_array().expect("items");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["name"], "Runner Tee");

    app.login().await;
    app.post("/api/auth/logout", &json!({})).await;

    let (status, _) = app.get("/api/auth/me").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (_, filters) = app.get("/api/shop/filters").await;
    assert_eq!(filters["selectedCategories"][0], "tops");
}
