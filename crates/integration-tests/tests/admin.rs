//! Integration tests for the administration view.

#![allow(clippy::unwrap_used)]

use axum::http::Method;
use ramm_client::admin::{AdminSection, AdminView, ModerationAction};
use ramm_client::session::Session;
use ramm_core::{ListingId, ListingStatus};
use ramm_integration_tests::{MockServer, product, session};
use serde_json::json;

const USERS: &str = "/api/admin/users";
const LISTINGS: &str = "/api/products";

fn stub_listings(server: &MockServer) {
    server.stub(
        Method::GET,
        LISTINGS,
        200,
        json!([
            product(1, "Lamp", 25.0, "unsold", "seller-1"),
            product(2, "Chair", 40.0, "removed", "seller-1"),
            product(3, "Desk", 120.0, "sold", "seller-2"),
        ]),
    );
}

// ============================================================================
// Access gate
// ============================================================================

#[tokio::test]
async fn test_denied_roles_fetch_nothing() {
    let server = MockServer::start().await;
    stub_listings(&server);
    let api = server.api_client();

    for denied in [
        session("u-1", "b@example.com", "buyer"),
        session("u-2", "s@example.com", "seller"),
        Session::default(),
    ] {
        assert!(AdminView::open(&api, &denied).is_err());
    }
    assert!(server.requests().is_empty());
}

#[tokio::test]
async fn test_admin_role_is_case_insensitive() {
    let server = MockServer::start().await;
    let api = server.api_client();

    for role in ["admin", "Admin", "ADMIN"] {
        assert!(AdminView::open(&api, &session("a-1", "a@example.com", role)).is_ok());
    }
    // Opening alone fetches nothing
    assert!(server.requests().is_empty());
}

// ============================================================================
// Sections
// ============================================================================

#[tokio::test]
async fn test_sections_are_fetched_lazily_once() {
    let server = MockServer::start().await;
    server.stub(
        Method::GET,
        USERS,
        200,
        json!([
            { "id": "u-1", "email": "b@example.com", "role": "buyer" },
            { "id": "u-2", "email": "s@example.com", "role": "seller" }
        ]),
    );
    stub_listings(&server);
    let api = server.api_client();
    let admin = session("a-1", "a@example.com", "admin");

    let mut view = AdminView::open(&api, &admin).unwrap();
    view.select(AdminSection::Users).await.unwrap();
    assert_eq!(view.users().await.unwrap().len(), 2);
    assert!(server.requests_to(&Method::GET, LISTINGS).is_empty());

    view.select(AdminSection::Listings).await.unwrap();
    view.select(AdminSection::Users).await.unwrap();
    assert_eq!(view.section(), AdminSection::Users);

    assert_eq!(server.requests_to(&Method::GET, USERS).len(), 1);
    assert_eq!(server.requests_to(&Method::GET, LISTINGS).len(), 1);

    let request = &server.requests_to(&Method::GET, USERS)[0];
    assert_eq!(request.header("authorization"), Some("Bearer id-token"));
}

#[tokio::test]
async fn test_users_failure_message() {
    let server = MockServer::start().await;
    server.stub(Method::GET, USERS, 403, json!({ "detail": "Not authorized" }));
    let api = server.api_client();
    let admin = session("a-1", "a@example.com", "admin");

    let mut view = AdminView::open(&api, &admin).unwrap();
    let err = view.users().await.unwrap_err();
    assert_eq!(
        ramm_client::admin::error_message(AdminSection::Users, &err),
        "Failed to fetch users: Not authorized"
    );
}

// ============================================================================
// Moderation
// ============================================================================

#[tokio::test]
async fn test_toggle_removes_active_listing_and_refetches() {
    let server = MockServer::start().await;
    stub_listings(&server);
    server.stub(
        Method::GET,
        LISTINGS,
        200,
        json!([
            product(1, "Lamp", 25.0, "removed", "seller-1"),
            product(2, "Chair", 40.0, "removed", "seller-1"),
            product(3, "Desk", 120.0, "sold", "seller-2"),
        ]),
    );
    server.stub(Method::DELETE, "/api/admin/1", 200, json!({ "message": "Product removed" }));
    let api = server.api_client();
    let admin = session("a-1", "a@example.com", "admin");

    let mut view = AdminView::open(&api, &admin).unwrap();
    let action = view.toggle_listing(ListingId::new(1)).await.unwrap();
    assert_eq!(action, ModerationAction::Remove);

    let toggle = &server.requests_to(&Method::DELETE, "/api/admin/1")[0];
    assert_eq!(toggle.header("authorization"), Some("Bearer id-token"));
    assert_eq!(server.requests_to(&Method::GET, LISTINGS).len(), 2);

    let listings = view.listings().await.unwrap();
    assert_eq!(listings[0].status, ListingStatus::Removed);
}

#[tokio::test]
async fn test_toggle_keeps_removed_listing() {
    let server = MockServer::start().await;
    stub_listings(&server);
    server.stub(Method::DELETE, "/api/admin/2", 200, json!({ "message": "Product restored" }));
    let api = server.api_client();
    let admin = session("a-1", "a@example.com", "admin");

    let mut view = AdminView::open(&api, &admin).unwrap();
    let action = view.toggle_listing(ListingId::new(2)).await.unwrap();
    assert_eq!(action, ModerationAction::Keep);
    assert_eq!(action.label(), "Keep");
}

#[tokio::test]
async fn test_sold_listing_cannot_be_toggled() {
    let server = MockServer::start().await;
    stub_listings(&server);
    let api = server.api_client();
    let admin = session("a-1", "a@example.com", "admin");

    let mut view = AdminView::open(&api, &admin).unwrap();
    assert!(view.toggle_listing(ListingId::new(3)).await.is_err());
    assert!(server.requests_to(&Method::DELETE, "/api/admin/3").is_empty());
}
