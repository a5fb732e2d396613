//! Wire-contract tests for the HTTP client.
//!
//! Runs the real `ApiClient` against an in-process fake server and checks
//! paths, methods, headers, bodies and status mapping.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use axum::http::Method;
use rust_decimal::Decimal;
use serde_json::json;
use shophub_core::{DeliveryAddress, LineItem, OrderId, PhoneNumber, ProductId};
use shophub_integration_tests::{
    ADDRESS, COFFEE, FakeCommerceServer, HONEY, PHONE, TOKEN, customer, product_json, qty,
};
use shophub_storefront::api::{ApiError, CommerceApi, NETWORK_ERROR_MESSAGE, NewOrder};
use shophub_storefront::checkout::Redirect;
use shophub_storefront::session::BearerToken;
use shophub_storefront::{ShopSession, StorefrontError};

fn token() -> BearerToken {
    BearerToken::new(TOKEN)
}

fn bearer() -> Option<String> {
    Some(format!("Bearer {TOKEN}"))
}

// ============================================================================
// Products
// ============================================================================

#[tokio::test]
async fn test_fetch_product_is_public_and_cached() {
    let server = FakeCommerceServer::start().await;
    let path = format!("/products/singleProduct/{COFFEE}");
    server.respond(Method::GET, &path, 200, &product_json(COFFEE, "Coffee", 450, 8));
    let client = server.client();

    let product = client.fetch_product(&ProductId::new(COFFEE)).await.unwrap();
    assert_eq!(product.id.as_str(), COFFEE);
    assert_eq!(product.price, Decimal::from(450));
    assert_eq!(product.stock, 8);
    assert_eq!(product.primary_image(), Some("https://cdn.shophub.test/p-coffee.jpg"));

    // Served from the product cache the second time
    client.fetch_product(&ProductId::new(COFFEE)).await.unwrap();

    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, Method::GET);
    assert_eq!(requests[0].path, path);
    assert_eq!(requests[0].authorization, None);
}

#[tokio::test]
async fn test_missing_product_maps_to_not_found() {
    let server = FakeCommerceServer::start().await;
    server.respond(
        Method::GET,
        "/products/singleProduct/gone",
        404,
        &json!({"message": "Product not found"}),
    );

    let err = server
        .client()
        .fetch_product(&ProductId::new("gone"))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::NotFound(ref m) if m == "Product not found"));
    assert_eq!(err.user_message(), "Product not found");
}

#[tokio::test]
async fn test_product_id_is_a_single_path_segment() {
    let server = FakeCommerceServer::start().await;
    server.respond(
        Method::GET,
        "/products/singleProduct/x%2Fy",
        200,
        &product_json("x/y", "Slashed", 120, 1),
    );
    let client = server.client();

    let product = client.fetch_product(&ProductId::new("x/y")).await.unwrap();
    assert_eq!(product.id.as_str(), "x/y");

    for id in ["a?b=1", "../../cart/mycart", "c#d"] {
        let err = client.fetch_product(&ProductId::new(id)).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    assert_eq!(
        server.routes(),
        vec![
            "GET /products/singleProduct/x%2Fy",
            "GET /products/singleProduct/a%3Fb%3D1",
            "GET /products/singleProduct/..%2F..%2Fcart%2Fmycart",
            "GET /products/singleProduct/c%23d",
        ]
    );
    assert!(server.requests().iter().all(|r| r.authorization.is_none()));
}

// ============================================================================
// Cart
// ============================================================================

#[tokio::test]
async fn test_fetch_cart_sends_bearer_token() {
    let server = FakeCommerceServer::start().await;
    server.respond(
        Method::GET,
        "/cart/mycart",
        200,
        &json!({
            "cart": {
                "products": [
                    {"productId": COFFEE, "quantity": 2},
                    {"productId": HONEY, "quantity": 0}
                ],
                "totalItems": 2
            }
        }),
    );

    let cart = server.client().fetch_cart(&token()).await.unwrap();
    assert_eq!(cart.products.len(), 2);
    assert_eq!(cart.products[1].quantity, 0);
    assert!(cart.products[1].to_line_item().is_none());

    let requests = server.requests();
    assert_eq!(requests[0].path, "/cart/mycart");
    assert_eq!(requests[0].authorization, bearer());
}

#[tokio::test]
async fn test_fetch_cart_without_cart_is_empty() {
    let server = FakeCommerceServer::start().await;
    server.respond(Method::GET, "/cart/mycart", 200, &json!({"success": true}));

    let cart = server.client().fetch_cart(&token()).await.unwrap();
    assert!(cart.products.is_empty());
}

#[tokio::test]
async fn test_replace_cart_patches_full_contents() {
    let server = FakeCommerceServer::start().await;
    server.respond(
        Method::PATCH,
        "/cart/updateCart",
        200,
        &json!({"message": "Cart updated"}),
    );

    let items = vec![LineItem::new(COFFEE, qty(2)), LineItem::new(HONEY, qty(1))];
    let ack = server
        .client()
        .replace_cart(&token(), &items)
        .await
        .unwrap();
    assert_eq!(ack.message.as_deref(), Some("Cart updated"));

    let request = &server.requests()[0];
    assert_eq!(request.method, Method::PATCH);
    assert_eq!(request.authorization, bearer());
    assert_eq!(
        request.body,
        Some(json!({
            "products": [
                {"productId": COFFEE, "quantity": 2},
                {"productId": HONEY, "quantity": 1}
            ]
        }))
    );
}

#[tokio::test]
async fn test_replace_with_empty_cart_sends_empty_list() {
    let server = FakeCommerceServer::start().await;
    server.respond(Method::PATCH, "/cart/updateCart", 200, &json!({}));

    server.client().replace_cart(&token(), &[]).await.unwrap();
    assert_eq!(server.requests()[0].body, Some(json!({"products": []})));
}

#[tokio::test]
async fn test_add_to_cart_posts_items() {
    let server = FakeCommerceServer::start().await;
    server.respond(
        Method::POST,
        "/cart/addToCart",
        200,
        &json!({"message": "Product added to cart"}),
    );

    server
        .client()
        .add_to_cart(&token(), &[LineItem::new(COFFEE, qty(3))])
        .await
        .unwrap();

    let request = &server.requests()[0];
    assert_eq!(request.method, Method::POST);
    assert_eq!(
        request.body,
        Some(json!({"products": [{"productId": COFFEE, "quantity": 3}]}))
    );
}

// ============================================================================
// Orders & payment
// ============================================================================

fn new_order() -> NewOrder {
    NewOrder {
        items: vec![LineItem::new(COFFEE, qty(2))],
        phone_number: PhoneNumber::parse(PHONE).unwrap(),
        address: DeliveryAddress::parse(ADDRESS).unwrap(),
    }
}

#[tokio::test]
async fn test_create_order_body_and_id() {
    let server = FakeCommerceServer::start().await;
    server.respond(
        Method::POST,
        "/order/createOrder",
        201,
        &json!({"success": true, "order": {"orderId": "ord-41"}}),
    );

    let id = server
        .client()
        .create_order(&token(), &new_order())
        .await
        .unwrap();
    assert_eq!(id, OrderId::new("ord-41"));

    let request = &server.requests()[0];
    assert_eq!(request.authorization, bearer());
    assert_eq!(
        request.body,
        Some(json!({
            "items": [{"productId": COFFEE, "quantity": 2}],
            "phoneNumber": PHONE,
            "address": ADDRESS
        }))
    );
}

#[tokio::test]
async fn test_create_order_without_id_is_parse_error() {
    let server = FakeCommerceServer::start().await;
    server.respond(Method::POST, "/order/createOrder", 201, &json!({"order": {}}));

    let err = server
        .client()
        .create_order(&token(), &new_order())
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Parse(_)));
    assert_eq!(err.user_message(), NETWORK_ERROR_MESSAGE);
}

#[tokio::test]
async fn test_initiate_payment_body() {
    let server = FakeCommerceServer::start().await;
    server.respond(
        Method::POST,
        "/order/initiatePayment",
        200,
        &json!({"paymentUrl": "https://checkout.chapa.co/pay/abc"}),
    );

    let payment = server
        .client()
        .initiate_payment(&token(), &OrderId::new("ord-41"))
        .await
        .unwrap();
    assert_eq!(payment.payment_url(), Some("https://checkout.chapa.co/pay/abc"));
    assert_eq!(server.requests()[0].body, Some(json!({"orderId": "ord-41"})));
}

// ============================================================================
// Error mapping
// ============================================================================

#[tokio::test]
async fn test_rejected_token_maps_to_unauthorized() {
    let server = FakeCommerceServer::start().await;
    server.respond(
        Method::GET,
        "/cart/mycart",
        401,
        &json!({"message": "Invalid token"}),
    );

    let err = server.client().fetch_cart(&token()).await.unwrap_err();
    assert!(err.is_unauthorized());
}

#[tokio::test]
async fn test_rate_limit_reads_retry_after() {
    let server = FakeCommerceServer::start().await;
    server.rate_limit(Method::PATCH, "/cart/updateCart", 7);

    let err = server.client().replace_cart(&token(), &[]).await.unwrap_err();
    assert!(matches!(err, ApiError::RateLimited(7)));
}

#[tokio::test]
async fn test_client_error_keeps_server_message() {
    let server = FakeCommerceServer::start().await;
    server.respond(
        Method::POST,
        "/order/createOrder",
        400,
        &json!({"message": "Insufficient stock for Coffee"}),
    );

    let err = server
        .client()
        .create_order(&token(), &new_order())
        .await
        .unwrap_err();
    assert_eq!(err.user_message(), "Insufficient stock for Coffee");
}

#[tokio::test]
async fn test_unreadable_error_body_is_network_error() {
    let server = FakeCommerceServer::start().await;
    server.respond_raw(
        Method::POST,
        "/order/initiatePayment",
        502,
        "<html>Bad Gateway</html>",
    );

    let err = server
        .client()
        .initiate_payment(&token(), &OrderId::new("ord-1"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ApiError::Api { status: 502, ref message } if message == NETWORK_ERROR_MESSAGE
    ));
}

#[tokio::test]
async fn test_empty_error_message_falls_back() {
    let server = FakeCommerceServer::start().await;
    server.respond(Method::PATCH, "/cart/updateCart", 422, &json!({"message": ""}));

    let err = server.client().replace_cart(&token(), &[]).await.unwrap_err();
    assert_eq!(err.user_message(), "Something went wrong");
}

// ============================================================================
// End to end over HTTP
// ============================================================================

#[tokio::test]
async fn test_session_checkout_request_order() {
    let server = FakeCommerceServer::start().await;
    server.respond(
        Method::GET,
        "/cart/mycart",
        200,
        &json!({"cart": {"products": [{"productId": COFFEE, "quantity": 1}]}}),
    );
    server.respond(
        Method::GET,
        &format!("/products/singleProduct/{COFFEE}"),
        200,
        &product_json(COFFEE, "Coffee", 450, 8),
    );
    server.respond(Method::PATCH, "/cart/updateCart", 200, &json!({"message": "ok"}));
    server.respond(
        Method::POST,
        "/order/createOrder",
        201,
        &json!({"order": {"orderId": "ord-9"}}),
    );
    server.respond(Method::POST, "/order/initiatePayment", 200, &json!({}));

    let mut shop = ShopSession::new(server.client(), customer());
    shop.load().await.unwrap();
    let outcome = shop.checkout(PHONE, ADDRESS).await.unwrap();

    assert_eq!(outcome.redirect, Redirect::OrderStatus("/orders/ord-9".to_string()));
    assert_eq!(
        server.routes(),
        vec![
            "GET /cart/mycart".to_string(),
            format!("GET /products/singleProduct/{COFFEE}"),
            "PATCH /cart/updateCart".to_string(),
            "POST /order/createOrder".to_string(),
            "PATCH /cart/updateCart".to_string(),
            "POST /order/initiatePayment".to_string(),
        ]
    );
    // The clear sends an empty cart
    assert_eq!(server.requests()[4].body, Some(json!({"products": []})));
}

#[tokio::test]
async fn test_session_cart_404_is_empty_cart() {
    let server = FakeCommerceServer::start().await;

    let mut shop = ShopSession::new(server.client(), customer());
    let view = shop.load().await.unwrap();

    assert!(view.is_empty());
    assert_eq!(server.routes(), vec!["GET /cart/mycart".to_string()]);
}

#[tokio::test]
async fn test_session_expired_token_is_reported() {
    let server = FakeCommerceServer::start().await;
    server.respond(Method::GET, "/cart/mycart", 401, &json!({"message": "jwt expired"}));

    let mut shop = ShopSession::new(server.client(), customer());
    let err = shop.load().await.unwrap_err();

    assert!(matches!(err, StorefrontError::Api(ref e) if e.is_unauthorized()));
    let notices = shop.take_notices();
    assert_eq!(
        notices[0].message,
        "Your session has expired. Please sign in again."
    );
}
