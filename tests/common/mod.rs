//! Shared fakes for the integration tests
#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use mockall::mock;
use serde_json::Value;

use library_client::{
    api::{HttpTransport, PendingRequest, RawResponse},
    navigation::ScreenNavigator,
    session::{MemorySessionStore, SessionKey},
    ApiClient, ClientResult,
};

mock! {
    pub Transport {}

    #[async_trait]
    impl HttpTransport for Transport {
        async fn send(&self, request: &PendingRequest) -> ClientResult<RawResponse>;
    }
}

pub const BASE: &str = "http://library.test/api";
pub const USER: &str = r#"{"id":1,"username":"ada","email":"ada@example.org","role":"member"}"#;

pub fn respond(status: u16, body: Value) -> ClientResult<RawResponse> {
    Ok(RawResponse {
        status,
        body: serde_json::to_vec(&body).unwrap(),
    })
}

pub fn signed_in_store() -> Arc<MemorySessionStore> {
    Arc::new(MemorySessionStore::with_values([
        (SessionKey::AccessToken, "stale-access"),
        (SessionKey::RefreshToken, "refresh-1"),
        (SessionKey::User, USER),
    ]))
}

pub fn client(
    transport: MockTransport,
    store: Arc<MemorySessionStore>,
    nav: Arc<ScreenNavigator>,
) -> ApiClient {
    ApiClient::new(BASE, Arc::new(transport), store, nav)
}
