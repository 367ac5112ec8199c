//! Live API tests against a running library server

use std::{sync::Arc, time::Duration};

use chrono::Local;
use serde_json::Value;

use library_client::{
    api::ReqwestTransport,
    models::BookQuery,
    navigation::NoopNavigator,
    session::{MemorySessionStore, SessionStore},
    ApiClient, Services,
};

const BASE_URL: &str = "http://localhost:8000/api";

/// Services over a fresh in-memory session
fn live_services() -> (Services, Arc<MemorySessionStore>) {
    let store = Arc::new(MemorySessionStore::new());
    let transport = ReqwestTransport::new(Duration::from_secs(10)).expect("Failed to build transport");
    let client = ApiClient::new(
        BASE_URL,
        Arc::new(transport),
        store.clone(),
        Arc::new(NoopNavigator),
    );
    (Services::new(client), store)
}

/// Helper to get a signed-in set of services
async fn signed_in() -> (Services, Arc<MemorySessionStore>) {
    let (services, store) = live_services();
    services
        .auth
        .login("admin", "admin")
        .await
        .expect("Failed to log in");
    (services, store)
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_available_books_without_login() {
    let (services, _) = live_services();

    let books = services
        .catalog
        .search_available(&BookQuery::search(""))
        .await
        .expect("Failed to list books");

    assert!(books.items().iter().all(|book| book.is_available()));
}

#[tokio::test]
#[ignore]
async fn test_login_stores_session() {
    let (services, store) = signed_in().await;

    assert!(store.access_token().unwrap().is_some());
    assert!(store.refresh_token().unwrap().is_some());
    assert!(services.auth.restore().unwrap().is_some());
}

#[tokio::test]
#[ignore]
async fn test_login_invalid_credentials() {
    let (services, store) = live_services();

    let err = services
        .auth
        .login("admin", "wrong")
        .await
        .expect_err("Login should fail");

    assert!(!err.user_message().is_empty());
    assert!(!store.has_user().unwrap());
}

#[tokio::test]
#[ignore]
async fn test_expired_access_token_is_refreshed() {
    let (services, store) = signed_in().await;
    store.set_access_token("not-a-valid-token").unwrap();

    let profile = services
        .profile
        .my_profile()
        .await
        .expect("Request should succeed after refresh");

    assert_eq!(profile.username, "admin");
    assert_ne!(store.access_token().unwrap().as_deref(), Some("not-a-valid-token"));
}

#[tokio::test]
#[ignore]
async fn test_my_books_and_history() {
    let (services, _) = signed_in().await;
    let today = Local::now().date_naive();

    let mine = services.loans.my_books().await.expect("Failed to list loans");
    assert!(mine.items().iter().all(|tx| !tx.is_returned()));

    let history = services
        .loans
        .transaction_history()
        .await
        .expect("Failed to list history");
    for tx in history.items() {
        assert!(["returned", "overdue", "borrowed"].contains(&tx.status(today)));
    }
}

#[tokio::test]
#[ignore]
async fn test_dashboard() {
    let (services, _) = signed_in().await;

    let stats = services.stats.dashboard().await;
    assert!(stats.available_books <= stats.total_books);
}

#[tokio::test]
#[ignore]
async fn test_logout_clears_session() {
    let (services, store) = signed_in().await;

    services.auth.logout().await.expect("Failed to log out");

    assert!(store.access_token().unwrap().is_none());
    assert!(services.client.get::<Value>("/my-books/").await.is_err());
}
