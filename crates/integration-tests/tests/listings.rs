//! Integration tests for browsing, searching and managing listings.

#![allow(clippy::unwrap_used)]

use axum::http::Method;
use ramm_client::Route;
use ramm_client::listings::{
    BrowseQuery, DeleteOutcome, EditForm, ListingCollection, SearchForm, SearchMode,
};
use ramm_client::routes::PendingPurchase;
use ramm_core::{ListingId, ListingStatus, UserId};
use ramm_integration_tests::{MockServer, product, session};
use serde_json::json;

const PRODUCTS: &str = "/api/products/";

fn stub_mixed(server: &MockServer) {
    server.stub(
        Method::GET,
        PRODUCTS,
        200,
        json!([
            product(1, "Lamp", 25.0, "unsold", "seller-1"),
            product(2, "Desk", 120.0, "sold", "seller-1"),
            product(3, "Chair", 40.0, "removed", "seller-2"),
        ]),
    );
}

// ============================================================================
// Visibility
// ============================================================================

#[tokio::test]
async fn test_buyers_never_see_sold_listings() {
    let server = MockServer::start().await;
    stub_mixed(&server);
    let api = server.api_client();
    let buyer = session("buyer-1", "b@example.com", "buyer");

    let mut collection = ListingCollection::new(&api, &buyer, BrowseQuery);
    let items = collection.load().await.unwrap();
    assert_eq!(items.len(), 2);
    assert!(items.iter().all(|l| l.status != ListingStatus::Sold));
    assert_eq!(collection.title(), "Available Products");

    let request = &server.requests_to(&Method::GET, PRODUCTS)[0];
    assert!(request.query_param("seller_id").is_none());
}

#[tokio::test]
async fn test_seller_sees_own_listings_including_sold() {
    let server = MockServer::start().await;
    stub_mixed(&server);
    let api = server.api_client();
    let seller = session("seller-1", "s@example.com", "seller");

    let mut collection = ListingCollection::new(&api, &seller, BrowseQuery);
    assert_eq!(collection.load().await.unwrap().len(), 3);
    assert_eq!(collection.title(), "My Products");
    assert_eq!(collection.create_route(), Some(Route::AddProduct));

    let request = &server.requests_to(&Method::GET, PRODUCTS)[0];
    assert_eq!(request.query_param("seller_id").as_deref(), Some("seller-1"));
}

#[tokio::test]
async fn test_load_failure_empties_collection() {
    let server = MockServer::start().await;
    stub_mixed(&server);
    server.stub(Method::GET, PRODUCTS, 500, json!({ "detail": "boom" }));
    let api = server.api_client();
    let buyer = session("buyer-1", "b@example.com", "buyer");

    let mut collection = ListingCollection::new(&api, &buyer, BrowseQuery);
    collection.load().await.unwrap();
    assert!(collection.load().await.is_err());
    assert!(collection.items().is_empty());
}

#[tokio::test]
async fn test_get_listing_maps_wire_shape_and_not_found() {
    let server = MockServer::start().await;
    server.stub(
        Method::GET,
        "/api/products/7",
        200,
        product(7, "Rug", 60.0, "removed", "seller-3"),
    );
    let api = server.api_client();

    let listing = api.get_listing(ListingId::new(7)).await.unwrap();
    assert_eq!(listing.title, "Rug");
    assert_eq!(listing.status, ListingStatus::Removed);
    assert_eq!(listing.seller_id, UserId::from("seller-3"));
    assert_eq!(listing.image_key.as_deref(), Some("products/7.png"));

    let err = api.get_listing(ListingId::new(8)).await.unwrap_err();
    assert_eq!(err.kind(), ramm_client::ErrorKind::Backend);
}

// ============================================================================
// Update and delete
// ============================================================================

#[tokio::test]
async fn test_update_sends_only_changed_fields() {
    let server = MockServer::start().await;
    stub_mixed(&server);
    server.stub(
        Method::PUT,
        "/api/products/1",
        200,
        json!({ "updated": true, "product": product(1, "Lamp", 19.99, "unsold", "seller-1") }),
    );
    let api = server.api_client();
    let seller = session("seller-1", "s@example.com", "seller");

    let mut collection = ListingCollection::new(&api, &seller, BrowseQuery);
    collection.load().await.unwrap();
    let mut form = EditForm::from_listing(&collection.items()[0]);
    form.price = "19.99".to_string();

    let updated = collection.update(ListingId::new(1), &form).await.unwrap();
    assert_eq!(updated.price.to_string(), "$19.99");

    let body = server.requests_to(&Method::PUT, "/api/products/1")[0].body_text();
    assert!(body.contains(r#"{"price":19.99}"#), "{body}");
    assert!(body.contains("seller-1"));
    assert!(!body.contains(r#""name""#), "{body}");
}

#[tokio::test]
async fn test_update_without_changes_sends_nothing() {
    let server = MockServer::start().await;
    stub_mixed(&server);
    let api = server.api_client();
    let seller = session("seller-1", "s@example.com", "seller");

    let mut collection = ListingCollection::new(&api, &seller, BrowseQuery);
    collection.load().await.unwrap();
    let form = EditForm::from_listing(&collection.items()[0]);

    assert!(collection.update(ListingId::new(1), &form).await.is_err());
    assert!(server.requests_to(&Method::PUT, "/api/products/1").is_empty());
}

#[tokio::test]
async fn test_delete_requires_confirmation() {
    let server = MockServer::start().await;
    stub_mixed(&server);
    server.stub(Method::DELETE, "/api/products/1", 200, json!({ "message": "deleted" }));
    let api = server.api_client();
    let seller = session("seller-1", "s@example.com", "seller");

    let mut collection = ListingCollection::new(&api, &seller, BrowseQuery);
    collection.load().await.unwrap();

    let decline = |_: &str| false;
    let outcome = collection.delete(ListingId::new(1), &decline).await.unwrap();
    assert_eq!(outcome, DeleteOutcome::Cancelled);
    assert!(server.requests_to(&Method::DELETE, "/api/products/1").is_empty());

    let accept = |_: &str| true;
    let outcome = collection.delete(ListingId::new(1), &accept).await.unwrap();
    assert_eq!(outcome, DeleteOutcome::Deleted);
    assert_eq!(collection.items().len(), 2);

    let request = &server.requests_to(&Method::DELETE, "/api/products/1")[0];
    assert_eq!(request.form_param("seller_id").as_deref(), Some("seller-1"));
    // No refetch after a delete
    assert_eq!(server.requests_to(&Method::GET, PRODUCTS).len(), 1);
}

// ============================================================================
// Buy and search
// ============================================================================

#[tokio::test]
async fn test_buy_routes_to_orders_with_purchase() {
    let server = MockServer::start().await;
    stub_mixed(&server);
    let api = server.api_client();
    let buyer = session("buyer-1", "b@example.com", "buyer");

    let mut collection = ListingCollection::new(&api, &buyer, BrowseQuery);
    collection.load().await.unwrap();

    assert_eq!(
        collection.buy(ListingId::new(1)).unwrap(),
        Route::Orders(Some(PendingPurchase {
            listing_id: ListingId::new(1),
            seller_id: UserId::from("seller-1"),
        }))
    );
    // Sold listings were never shown
    assert!(collection.buy(ListingId::new(2)).is_err());
}

#[tokio::test]
async fn test_search_by_price_range() {
    let server = MockServer::start().await;
    server.stub(
        Method::GET,
        "/api/search/",
        200,
        json!([product(1, "Lamp", 25.0, "unsold", "seller-1")]),
    );
    let api = server.api_client();
    let buyer = session("buyer-1", "b@example.com", "buyer");

    let form = SearchForm {
        mode: SearchMode::PriceRange,
        min_price: "10.5".to_string(),
        max_price: "30.25".to_string(),
        ..SearchForm::default()
    };
    let mut collection = ListingCollection::new(&api, &buyer, form.validate().unwrap());
    assert_eq!(collection.load().await.unwrap().len(), 1);

    let request = &server.requests_to(&Method::GET, "/api/search/")[0];
    assert_eq!(request.query_param("min_price").as_deref(), Some("10.5"));
    assert_eq!(request.query_param("max_price").as_deref(), Some("30.25"));
}

#[tokio::test]
async fn test_search_sends_negative_min_and_drops_negative_max() {
    let server = MockServer::start().await;
    server.stub(Method::GET, "/api/search/", 200, json!([]));
    let api = server.api_client();
    let buyer = session("buyer-1", "b@example.com", "buyer");

    let form = SearchForm {
        mode: SearchMode::PriceRange,
        min_price: "-2.5".to_string(),
        max_price: "-1.5".to_string(),
        ..SearchForm::default()
    };
    let mut collection = ListingCollection::new(&api, &buyer, form.validate().unwrap());
    assert!(collection.load().await.unwrap().is_empty());

    let request = &server.requests_to(&Method::GET, "/api/search/")[0];
    assert_eq!(request.query_param("min_price").as_deref(), Some("-2.5"));
    assert!(request.query_param("max_price").is_none());
}

#[tokio::test]
async fn test_invalid_search_sends_nothing() {
    let server = MockServer::start().await;
    let form = SearchForm {
        mode: SearchMode::ProductId,
        term: "0".to_string(),
        ..SearchForm::default()
    };

    assert!(form.validate().is_err());
    assert!(server.requests().is_empty());
}
