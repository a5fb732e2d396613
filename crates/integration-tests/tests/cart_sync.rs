//! Cart behavior across the session, store and synchronizer.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use shophub_core::{CurrencyCode, LineItem, Price, ProductId, UserRole};
use shophub_integration_tests::{BERBERE, COFFEE, HONEY, account, catalog, customer, qty, shop};
use shophub_storefront::api::RemoteCartLine;
use shophub_storefront::api::mock::ApiCall;
use shophub_storefront::cart::{
    CartStore, CartSynchronizer, PLACEHOLDER_IMAGE, UNAVAILABLE_PRODUCT_NAME,
};
use shophub_storefront::error::ValidationError;
use shophub_storefront::session::{AuthError, AuthSession, BearerToken};
use shophub_storefront::{ShopSession, StorefrontError};

fn remote(id: &str, quantity: i64) -> RemoteCartLine {
    RemoteCartLine {
        product_id: ProductId::new(id),
        quantity,
    }
}

fn quantity_of(shop: &ShopSession<impl shophub_storefront::CommerceApi>, id: &str) -> u32 {
    shop.cart().get(&ProductId::new(id)).unwrap().quantity.get()
}

// ============================================================================
// Loading
// ============================================================================

#[tokio::test]
async fn test_load_mirrors_server_cart_and_drops_invalid_lines() {
    let api = catalog().with_remote_cart(vec![
        remote(COFFEE, 2),
        remote(HONEY, 0),
        remote(BERBERE, -3),
    ]);
    let mut shop = ShopSession::new(api, customer());

    let view = shop.load().await.unwrap();

    assert_eq!(view.len(), 1);
    assert_eq!(view.items[0].name, "Yirgacheffe Coffee");
    assert_eq!(shop.cart().len(), 1);
    assert_eq!(quantity_of(&shop, COFFEE), 2);
    assert!(shop.cart().is_synced());
}

#[tokio::test]
async fn test_load_collapses_duplicate_server_lines() {
    let api = catalog().with_remote_cart(vec![remote(COFFEE, 1), remote(COFFEE, 2)]);
    let mut shop = ShopSession::new(api, customer());

    shop.load().await.unwrap();

    assert_eq!(shop.cart().len(), 1);
    assert_eq!(quantity_of(&shop, COFFEE), 3);
}

#[tokio::test]
async fn test_load_failure_keeps_local_cart() {
    let mut shop = shop();
    shop.add_item(COFFEE, qty(1)).await.unwrap();
    shop.api().set_fail_fetch_cart(true);

    assert!(shop.load().await.is_err());
    assert_eq!(quantity_of(&shop, COFFEE), 1);
    assert!(shop.take_notices().last().unwrap().is_error());
}

// ============================================================================
// Uniqueness & quantity floor
// ============================================================================

#[tokio::test]
async fn test_adding_existing_product_merges_lines() {
    let mut shop = shop();
    shop.add_item(COFFEE, qty(1)).await.unwrap();
    shop.add_item(HONEY, qty(1)).await.unwrap();
    let view = shop.add_item(COFFEE, qty(2)).await.unwrap();

    assert_eq!(view.len(), 2);
    assert_eq!(quantity_of(&shop, COFFEE), 3);

    let pushed = shop.api().remote_cart();
    assert_eq!(pushed, vec![remote(COFFEE, 3), remote(HONEY, 1)]);
}

#[tokio::test]
async fn test_quantity_never_drops_below_one() {
    let mut shop = shop();
    shop.add_item(COFFEE, qty(2)).await.unwrap();

    for _ in 0..3 {
        shop.decrement(COFFEE).await.unwrap();
    }
    assert_eq!(quantity_of(&shop, COFFEE), 1);

    let err = shop.set_quantity(COFFEE, 0).await.unwrap_err();
    assert!(matches!(
        err,
        StorefrontError::Validation(ValidationError::Quantity(_))
    ));
    assert_eq!(quantity_of(&shop, COFFEE), 1);
    assert_eq!(shop.api().remote_cart(), vec![remote(COFFEE, 1)]);
}

#[tokio::test]
async fn test_decrement_at_floor_does_not_push() {
    let mut shop = shop();
    shop.add_item(COFFEE, qty(1)).await.unwrap();
    shop.api().clear_calls();

    shop.decrement(COFFEE).await.unwrap();

    let calls = shop.api().calls();
    assert!(calls.iter().all(|call| !matches!(call, ApiCall::ReplaceCart(_))));
}

#[tokio::test]
async fn test_mutating_absent_product_is_a_no_op() {
    let mut shop = shop();
    shop.add_item(COFFEE, qty(1)).await.unwrap();
    let revision = shop.cart().revision();

    shop.set_quantity(HONEY, 4).await.unwrap();
    shop.increment(HONEY).await.unwrap();
    shop.remove_item(HONEY).await.unwrap();

    assert_eq!(shop.cart().revision(), revision);
    assert_eq!(shop.cart().len(), 1);
}

// ============================================================================
// Hydration
// ============================================================================

#[tokio::test]
async fn test_failed_detail_fetch_only_affects_its_line() {
    let mut shop = shop();
    shop.api().fail_product(HONEY);

    shop.add_item(COFFEE, qty(2)).await.unwrap();
    let view = shop.add_item(HONEY, qty(1)).await.unwrap();

    assert_eq!(view.len(), 2);
    let coffee = view.get(&ProductId::new(COFFEE)).unwrap();
    assert!(!coffee.is_placeholder());

    let honey = view.get(&ProductId::new(HONEY)).unwrap();
    assert!(honey.is_placeholder());
    assert_eq!(honey.name, UNAVAILABLE_PRODUCT_NAME);
    assert_eq!(honey.image, PLACEHOLDER_IMAGE);
    assert_eq!(honey.quantity, qty(1));

    assert_eq!(view.unavailable_count(), 1);
    assert_eq!(
        view.subtotal(),
        Price::new(rust_decimal::Decimal::from(900), CurrencyCode::ETB)
    );

    // The push still carries every line
    assert_eq!(shop.api().remote_cart().len(), 2);
}

#[tokio::test]
async fn test_unknown_product_is_a_placeholder() {
    let mut shop = shop();
    let view = shop.add_item("p-discontinued", qty(1)).await.unwrap();

    assert!(view.items[0].is_placeholder());
    assert!(shop.cart().is_synced());
}

#[tokio::test]
async fn test_every_line_is_fetched_once_per_cycle() {
    let mut shop = shop();
    shop.add_item(COFFEE, qty(1)).await.unwrap();
    shop.add_item(HONEY, qty(1)).await.unwrap();
    shop.api().clear_calls();

    shop.add_item(BERBERE, qty(1)).await.unwrap();

    let fetched: Vec<_> = shop
        .api()
        .calls()
        .into_iter()
        .filter_map(|call| match call {
            ApiCall::FetchProduct(id) => Some(id),
            _ => None,
        })
        .collect();
    assert_eq!(
        fetched,
        vec![
            ProductId::new(COFFEE),
            ProductId::new(HONEY),
            ProductId::new(BERBERE)
        ]
    );
}

// ============================================================================
// Pushing
// ============================================================================

#[tokio::test]
async fn test_push_is_idempotent() {
    let sync = CartSynchronizer::new(catalog());
    let token = BearerToken::new("t");
    let items = vec![LineItem::new(COFFEE, qty(2)), LineItem::new(HONEY, qty(1))];

    sync.push(&token, &items).await.unwrap();
    let first = sync.api().remote_cart();
    sync.push(&token, &items).await.unwrap();

    assert_eq!(sync.api().remote_cart(), first);
}

#[tokio::test]
async fn test_push_happens_after_all_fetches() {
    let mut shop = shop();
    shop.add_item(COFFEE, qty(1)).await.unwrap();
    shop.api().clear_calls();

    shop.add_item(HONEY, qty(1)).await.unwrap();

    let calls = shop.api().calls();
    assert!(matches!(calls.last(), Some(ApiCall::ReplaceCart(_))));
    let pushes = calls
        .iter()
        .filter(|call| matches!(call, ApiCall::ReplaceCart(_)))
        .count();
    assert_eq!(pushes, 1);
}

#[tokio::test]
async fn test_failed_push_keeps_local_change_and_recovers() {
    let mut shop = shop();
    shop.api().set_fail_replace_cart(true);

    shop.add_item(COFFEE, qty(2)).await.unwrap();
    assert_eq!(quantity_of(&shop, COFFEE), 2);
    assert!(!shop.cart().is_synced());
    assert!(shop.api().remote_cart().is_empty());
    assert!(shop.take_notices()[0].is_error());

    // The next successful cycle pushes the whole cart
    shop.api().set_fail_replace_cart(false);
    shop.add_item(HONEY, qty(1)).await.unwrap();

    assert!(shop.cart().is_synced());
    assert_eq!(
        shop.api().remote_cart(),
        vec![remote(COFFEE, 2), remote(HONEY, 1)]
    );
}

#[tokio::test]
async fn test_unsynced_cart_retries_without_change() {
    let mut shop = shop();
    shop.add_item(COFFEE, qty(1)).await.unwrap();
    shop.api().set_fail_replace_cart(true);
    shop.increment(COFFEE).await.unwrap();
    shop.api().set_fail_replace_cart(false);

    assert!(!shop.cart().is_synced());
    assert_eq!(shop.api().remote_cart(), vec![remote(COFFEE, 1)]);

    // Setting the quantity it already has changes nothing locally, but the
    // stale server cart is still brought up to date.
    let revision = shop.cart().revision();
    shop.set_quantity(COFFEE, 2).await.unwrap();

    assert_eq!(shop.cart().revision(), revision);
    assert!(shop.cart().is_synced());
    assert_eq!(shop.api().remote_cart(), vec![remote(COFFEE, 2)]);
}

#[tokio::test]
async fn test_clear_empties_both_sides() {
    let mut shop = shop();
    shop.add_item(COFFEE, qty(1)).await.unwrap();
    shop.add_item(HONEY, qty(1)).await.unwrap();

    let view = shop.clear().await.unwrap();

    assert!(view.is_empty());
    assert!(shop.cart().is_empty());
    assert!(shop.api().remote_cart().is_empty());
}

#[tokio::test]
async fn test_quick_add_merges_on_server() {
    let api = catalog().with_remote_cart(vec![remote(COFFEE, 1)]);
    let mut shop = ShopSession::new(api, customer());

    let view = shop.quick_add(COFFEE, qty(2)).await.unwrap();

    assert_eq!(view.len(), 1);
    assert_eq!(quantity_of(&shop, COFFEE), 3);
    assert_eq!(
        shop.take_notices()[0].message,
        "Product added to cart"
    );
}

// ============================================================================
// Access
// ============================================================================

#[tokio::test]
async fn test_signed_out_cart_makes_no_calls() {
    let mut shop = ShopSession::new(catalog(), AuthSession::anonymous());

    let err = shop.add_item(COFFEE, qty(1)).await.unwrap_err();

    assert!(matches!(err, StorefrontError::Auth(AuthError::MissingToken)));
    assert!(shop.cart().is_empty());
    assert!(shop.api().calls().is_empty());
}

#[tokio::test]
async fn test_admin_is_redirected_to_admin_area() {
    let mut shop = ShopSession::new(catalog(), account(UserRole::Admin));

    let err = shop.load().await.unwrap_err();

    assert!(matches!(
        err,
        StorefrontError::Auth(AuthError::AccessDenied { ref redirect }) if redirect == "/admin"
    ));
    assert!(shop.api().calls().is_empty());
}

#[tokio::test]
async fn test_store_revision_tracks_changes_only() {
    let mut store = CartStore::new();
    store.add_item(LineItem::new(COFFEE, qty(1)));
    let revision = store.revision();

    assert!(!store.update_item(&ProductId::new(HONEY), qty(2)));
    assert!(!store.remove_item(&ProductId::new(HONEY)));
    assert_eq!(store.revision(), revision);

    store.set_cart(vec![LineItem::new(COFFEE, qty(1))]);
    assert_eq!(store.revision(), revision);
}
