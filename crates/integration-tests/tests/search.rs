//! Integration tests for debounced search and failure fallbacks over HTTP.
//!
//! Run with: cargo test -p qkart-integration-tests

#![allow(clippy::indexing_slicing)]

use std::time::Duration;

use axum::http::StatusCode;
use qkart_core::Product;
use qkart_integration_tests::{
    FakeBackend, drain_notices, open_storefront, product, unreachable_config,
};
use qkart_storefront::error::{
    CART_UNAVAILABLE_MESSAGE, CATALOG_SERVER_ERROR_MESSAGE, PRODUCTS_UNAVAILABLE_MESSAGE,
};
use qkart_storefront::{BackendClient, SearchPhase, SearchView, SessionContext, Storefront};

async fn backend() -> FakeBackend {
    FakeBackend::start(vec![
        product("P1", "Basketball", "Sports", 100),
        product("P2", "iPhone XR", "Phones", 50),
        product("P3", "Football", "Sports", 80),
    ])
    .await
    .expect("Failed to start fake backend")
}

/// Wait until the search controller has applied a result.
async fn settled(storefront: &Storefront<BackendClient>) -> SearchView {
    let mut updates = storefront.search().subscribe();
    let view = tokio::time::timeout(
        Duration::from_secs(5),
        updates.wait_for(|view| {
            !matches!(view.phase, SearchPhase::Debouncing | SearchPhase::Loading(_))
        }),
    )
    .await
    .expect("Search did not settle")
    .expect("Search controller closed");
    view.clone()
}

fn names(products: &[Product]) -> Vec<&str> {
    products.iter().map(|p| p.name.as_str()).collect()
}

// ============================================================================
// Search
// ============================================================================

#[tokio::test]
async fn test_search_shows_matches() {
    let backend = backend().await;
    let (storefront, mut notices) = backend
        .open(SessionContext::anonymous())
        .await
        .expect("Failed to open storefront");

    storefront.search().on_query_changed("ball");
    let view = settled(&storefront).await;

    assert_eq!(view.phase, SearchPhase::Results);
    assert_eq!(names(&view.products), vec!["Basketball", "Football"]);
    assert_eq!(
        storefront.search().last_issued_query().as_deref(),
        Some("ball")
    );
    assert!(drain_notices(&mut notices).is_empty());
}

#[tokio::test]
async fn test_typing_burst_issues_single_request() {
    let backend = backend().await;
    let (storefront, _notices) = backend
        .open(SessionContext::anonymous())
        .await
        .expect("Failed to open storefront");

    for prefix in ["i", "iP", "iPh", "iPho", "iPhone"] {
        storefront.search().on_query_changed(prefix);
    }
    let view = settled(&storefront).await;

    assert_eq!(names(&view.products), vec!["iPhone XR"]);
    assert_eq!(
        backend.requests_matching("GET /products/search"),
        vec!["GET /products/search?value=iPhone"]
    );
}

#[tokio::test]
async fn test_search_text_with_reserved_characters_is_encoded() {
    let backend = FakeBackend::start(vec![
        product("P1", "Salt & Pepper Shaker", "Kitchen", 20),
        product("P2", "100% Cotton Tee", "Fashion", 15),
        product("P3", "Pepper Mill", "Kitchen", 30),
    ])
    .await
    .expect("Failed to start fake backend");
    let (storefront, mut notices) = backend
        .open(SessionContext::anonymous())
        .await
        .expect("Failed to open storefront");

    storefront.search().on_query_changed("salt & pep");
    let view = settled(&storefront).await;
    assert_eq!(view.phase, SearchPhase::Results);
    assert_eq!(names(&view.products), vec!["Salt & Pepper Shaker"]);

    storefront.search().on_query_changed("100%");
    let view = settled(&storefront).await;
    assert_eq!(names(&view.products), vec!["100% Cotton Tee"]);

    assert_eq!(
        backend.requests_matching("GET /products/search"),
        vec![
            "GET /products/search?value=salt & pep",
            "GET /products/search?value=100%",
        ]
    );
    assert!(drain_notices(&mut notices).is_empty());
}

#[tokio::test]
async fn test_search_without_matches_shows_empty_list() {
    let backend = backend().await;
    let (storefront, mut notices) = backend
        .open(SessionContext::anonymous())
        .await
        .expect("Failed to open storefront");

    storefront.search().on_query_changed("zzz");
    let view = settled(&storefront).await;

    assert_eq!(view.phase, SearchPhase::NoMatches);
    assert!(view.products.is_empty());
    assert!(drain_notices(&mut notices).is_empty());
}

#[tokio::test]
async fn test_search_server_error_falls_back_to_catalog() {
    let backend = backend().await;
    backend.fail_search(StatusCode::INTERNAL_SERVER_ERROR);
    let (storefront, mut notices) = backend
        .open(SessionContext::anonymous())
        .await
        .expect("Failed to open storefront");

    storefront.search().on_query_changed("ball");
    let view = settled(&storefront).await;

    assert_eq!(view.phase, SearchPhase::Failed);
    assert_eq!(view.products, storefront.catalog().products());

    let notices = drain_notices(&mut notices);
    assert_eq!(notices.len(), 1);
    assert!(notices[0].message.contains("Search index offline"));
}

#[tokio::test]
async fn test_clearing_query_restores_catalog_without_request() {
    let backend = backend().await;
    let (storefront, _notices) = backend
        .open(SessionContext::anonymous())
        .await
        .expect("Failed to open storefront");

    storefront.search().on_query_changed("ball");
    settled(&storefront).await;

    storefront.search().on_query_changed("   ");
    let view = settled(&storefront).await;

    assert_eq!(view.phase, SearchPhase::Idle);
    assert_eq!(view.products.len(), 3);
    assert_eq!(backend.requests_matching("GET /products/search").len(), 1);
}

// ============================================================================
// Catalog Failures
// ============================================================================

#[tokio::test]
async fn test_catalog_server_error_reports_backend_console_hint() {
    let backend = backend().await;
    backend.fail_products(StatusCode::INTERNAL_SERVER_ERROR);
    let (storefront, mut notices) = backend
        .open(SessionContext::anonymous())
        .await
        .expect("Failed to open storefront");

    assert!(storefront.catalog().is_empty());

    let notices = drain_notices(&mut notices);
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].message, CATALOG_SERVER_ERROR_MESSAGE);
}

#[tokio::test]
async fn test_garbled_catalog_is_reported_as_unavailable() {
    let backend = backend().await;
    backend.garble_products();
    let (storefront, mut notices) = backend
        .open(SessionContext::anonymous())
        .await
        .expect("Failed to open storefront");

    assert!(storefront.catalog().is_empty());

    let notices = drain_notices(&mut notices);
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].message, PRODUCTS_UNAVAILABLE_MESSAGE);
}

#[tokio::test]
async fn test_unreachable_backend_degrades_to_empty_state() {
    let config = unreachable_config()
        .await
        .expect("Failed to build unreachable config");
    let (storefront, mut notices) =
        open_storefront(&config, SessionContext::with_token("token-crio-user"))
            .await
            .expect("Failed to open storefront");

    assert!(storefront.catalog().is_empty());
    assert!(storefront.cart().cart().is_empty());

    let messages: Vec<String> = drain_notices(&mut notices)
        .into_iter()
        .map(|n| n.message)
        .collect();
    assert!(messages.iter().any(|m| m == PRODUCTS_UNAVAILABLE_MESSAGE));
    assert!(messages.iter().any(|m| m == CART_UNAVAILABLE_MESSAGE));

    // Search failures without a response leave the display unchanged.
    storefront.search().on_query_changed("ball");
    let view = settled(&storefront).await;
    assert_eq!(view.phase, SearchPhase::Failed);
    assert!(view.products.is_empty());
}
