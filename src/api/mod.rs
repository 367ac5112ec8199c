//! Authenticated client for the library REST API.
//!
//! Every request goes out with the stored access token as a bearer
//! credential. A 401 on a request that has not been replayed yet triggers
//! one refresh exchange and one replay; anything else reaches the caller
//! as-is.

pub mod request;
pub mod transport;

use reqwest::Method;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::{
    error::{ClientError, ClientResult},
    models::user::{RefreshRequest, RefreshResponse},
    navigation::{is_entry_screen, Navigator, LOGIN_PATH},
    session::SessionStore,
};

pub use request::{PendingRequest, RetryState};
pub use transport::{HttpTransport, RawResponse, ReqwestTransport};

pub const REFRESH_PATH: &str = "/token/refresh/";

/// Paths anonymous visitors may read. A failed refresh on these never
/// logs the user out.
pub const PUBLIC_ENDPOINTS: [&str; 2] = ["/available-books/", "/books/"];

pub fn is_public_endpoint(path: &str) -> bool {
    PUBLIC_ENDPOINTS.iter().any(|public| path.contains(public))
}

#[derive(Clone)]
pub struct ApiClient {
    base_url: Arc<str>,
    transport: Arc<dyn HttpTransport>,
    session: Arc<dyn SessionStore>,
    navigator: Arc<dyn Navigator>,
    /// Serializes refresh exchanges across clones of this client
    refresh_gate: Arc<Mutex<()>>,
}

impl ApiClient {
    pub fn new(
        base_url: &str,
        transport: Arc<dyn HttpTransport>,
        session: Arc<dyn SessionStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            base_url: Arc::from(base_url.trim_end_matches('/')),
            transport,
            session,
            navigator,
            refresh_gate: Arc::new(Mutex::new(())),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &Arc<dyn SessionStore> {
        &self.session
    }

    pub fn navigator(&self) -> &Arc<dyn Navigator> {
        &self.navigator
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        self.request(Method::GET, path, None, Vec::new()).await
    }

    /// GET with query parameters taken from a serializable struct or map
    pub async fn get_with_query<T, Q>(&self, path: &str, query: &Q) -> ClientResult<T>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let query = request::query_pairs(encode(query)?);
        self.request(Method::GET, path, None, query).await
    }

    pub async fn post<T, B>(&self, path: &str, body: &B) -> ClientResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(Method::POST, path, Some(encode(body)?), Vec::new())
            .await
    }

    pub async fn put<T, B>(&self, path: &str, body: &B) -> ClientResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(Method::PUT, path, Some(encode(body)?), Vec::new())
            .await
    }

    pub async fn patch<T, B>(&self, path: &str, body: &B) -> ClientResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(Method::PATCH, path, Some(encode(body)?), Vec::new())
            .await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        self.request(Method::DELETE, path, None, Vec::new()).await
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
        query: Vec<(String, String)>,
    ) -> ClientResult<T> {
        let mut request = PendingRequest::new(method, &self.base_url, path).with_query(query);
        request.body = body;

        let response = self.execute(request).await?;
        decode(&response)
    }

    /// Send a request through the credential lifecycle and return the
    /// successful response.
    pub async fn execute(&self, mut request: PendingRequest) -> ClientResult<RawResponse> {
        let sent_with = self.session.access_token()?;
        if let Some(token) = &sent_with {
            request.set_bearer(token);
        }

        match self.dispatch(&request).await {
            Err(err) if err.is_unauthorized() && !request.is_retried() => {
                self.refresh_and_retry(request, sent_with, err).await
            }
            outcome => outcome,
        }
    }

    async fn refresh_and_retry(
        &self,
        mut request: PendingRequest,
        sent_with: Option<String>,
        original: ClientError,
    ) -> ClientResult<RawResponse> {
        request.retry = RetryState::Retried;

        match self.renew_access_token(sent_with.as_deref()).await {
            Ok(Some(token)) => {
                tracing::debug!("Replaying {} {} with renewed token", request.method, request.path);
                request.set_bearer(&token);
                self.dispatch(&request).await
            }
            Ok(None) => {
                tracing::debug!("No refresh token stored, {} stays unauthorized", request.path);
                Err(original)
            }
            Err(refresh_error) => {
                tracing::warn!("Token refresh failed: {}", refresh_error);
                if let Err(e) = self.invalidate_session(&request) {
                    tracing::error!("Failed to invalidate session: {}", e);
                }
                Err(original)
            }
        }
    }

    /// Obtain a usable access token after a 401.
    ///
    /// Returns `None` when there is no refresh token to exchange. If another
    /// request already replaced the token this one was sent with while we
    /// waited for the gate, that token is reused without a new exchange.
    async fn renew_access_token(&self, sent_with: Option<&str>) -> ClientResult<Option<String>> {
        let _gate = self.refresh_gate.lock().await;

        if let Some(current) = self.session.access_token()? {
            if sent_with != Some(current.as_str()) {
                tracing::debug!("Access token already renewed by a concurrent request");
                return Ok(Some(current));
            }
        }

        let refresh = match self.session.refresh_token()? {
            Some(refresh) => refresh,
            None => return Ok(None),
        };

        let exchange = PendingRequest::new(Method::POST, &self.base_url, REFRESH_PATH)
            .with_body(encode(&RefreshRequest { refresh: &refresh })?);
        let response = self.dispatch(&exchange).await?;
        let tokens: RefreshResponse = decode(&response)?;

        self.session.set_access_token(&tokens.access)?;
        if let Some(rotated) = &tokens.refresh {
            self.session.set_refresh_token(rotated)?;
        }
        tracing::info!("Access token renewed");

        Ok(Some(tokens.access))
    }

    /// After a failed refresh: drop the session of a signed-in user who hit a
    /// protected resource and send them to login.
    fn invalidate_session(&self, request: &PendingRequest) -> ClientResult<()> {
        if !self.session.has_user()? {
            tracing::debug!("Anonymous session, keeping stored state");
            return Ok(());
        }
        if is_public_endpoint(&request.path) {
            tracing::debug!("Public endpoint {}, keeping stored state", request.path);
            return Ok(());
        }

        self.session.clear()?;
        tracing::warn!("Session expired, stored credentials cleared");

        let current = self.navigator.current_path();
        if !is_entry_screen(&current) {
            self.navigator.navigate(LOGIN_PATH);
        }
        Ok(())
    }

    /// One round trip, with error statuses turned into categorized errors
    async fn dispatch(&self, request: &PendingRequest) -> ClientResult<RawResponse> {
        tracing::debug!("{} {}", request.method, request.url);

        let response = self.transport.send(request).await?;
        if response.is_success() {
            Ok(response)
        } else {
            tracing::debug!("{} {} -> {}", request.method, request.path, response.status);
            Err(ClientError::from_status(response.status, response.json()))
        }
    }
}

fn encode<B: Serialize + ?Sized>(body: &B) -> ClientResult<serde_json::Value> {
    serde_json::to_value(body).map_err(|e| ClientError::InvalidInput(e.to_string()))
}

fn decode<T: DeserializeOwned>(response: &RawResponse) -> ClientResult<T> {
    let parsed = if response.body.iter().all(u8::is_ascii_whitespace) {
        serde_json::from_value(serde_json::Value::Null)
    } else {
        serde_json::from_slice(&response.body)
    };
    parsed.map_err(|e| ClientError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigation::ScreenNavigator;
    use crate::session::{MemorySessionStore, SessionKey};
    use serde_json::{json, Value};
    use transport::MockHttpTransport;

    const BASE: &str = "http://library.test/api";

    fn respond(status: u16, body: Value) -> ClientResult<RawResponse> {
        Ok(RawResponse {
            status,
            body: serde_json::to_vec(&body).unwrap(),
        })
    }

    fn client(
        transport: MockHttpTransport,
        store: Arc<MemorySessionStore>,
        nav: Arc<ScreenNavigator>,
    ) -> ApiClient {
        ApiClient::new(BASE, Arc::new(transport), store, nav)
    }

    #[test]
    fn test_public_endpoints() {
        assert!(is_public_endpoint("/books/"));
        assert!(is_public_endpoint("/books/12/"));
        assert!(is_public_endpoint("/available-books/"));
        assert!(!is_public_endpoint("/my-books/"));
        assert!(!is_public_endpoint("/overdue-books/"));
        assert!(!is_public_endpoint("/checkout/"));
    }

    #[tokio::test]
    async fn test_empty_body_decodes_to_unit() {
        let mut transport = MockHttpTransport::new();
        transport.expect_send().times(1).returning(|_| {
            Ok(RawResponse {
                status: 204,
                body: Vec::new(),
            })
        });
        let api = client(
            transport,
            Arc::new(MemorySessionStore::new()),
            Arc::new(ScreenNavigator::default()),
        );

        let outcome: ClientResult<()> = api.delete("/books/3/").await;
        tokio_test::assert_ok!(outcome);
    }

    #[tokio::test]
    async fn test_rotated_refresh_token_is_stored() {
        let store = Arc::new(MemorySessionStore::with_values([
            (SessionKey::AccessToken, "old"),
            (SessionKey::RefreshToken, "r1"),
        ]));
        let mut transport = MockHttpTransport::new();
        transport
            .expect_send()
            .withf(|req| req.path == "/my-profile/" && req.bearer_token() == Some("old"))
            .times(1)
            .returning(|_| respond(401, json!({"detail": "Token is invalid or expired"})));
        transport
            .expect_send()
            .withf(|req| req.path == REFRESH_PATH)
            .times(1)
            .returning(|_| respond(200, json!({"access": "new", "refresh": "r2"})));
        transport
            .expect_send()
            .withf(|req| req.path == "/my-profile/" && req.bearer_token() == Some("new"))
            .times(1)
            .returning(|_| respond(200, json!({"username": "ada"})));

        let api = client(transport, store.clone(), Arc::new(ScreenNavigator::default()));
        let profile: Value = api.get("/my-profile/").await.unwrap();

        assert_eq!(profile["username"], "ada");
        assert_eq!(store.refresh_token().unwrap().as_deref(), Some("r2"));
    }

    #[tokio::test]
    async fn test_token_renewed_elsewhere_skips_exchange() {
        // The stored token already differs from the one the failed request
        // carried, so the replay uses it directly.
        let store = Arc::new(MemorySessionStore::with_values([
            (SessionKey::AccessToken, "fresh"),
            (SessionKey::RefreshToken, "r1"),
        ]));
        let api_store = store.clone();
        let mut transport = MockHttpTransport::new();
        transport
            .expect_send()
            .withf(|req| req.path == REFRESH_PATH)
            .times(0)
            .returning(|_| respond(500, Value::Null));
        transport
            .expect_send()
            .withf(|req| req.bearer_token() == Some("fresh"))
            .times(1)
            .returning(|_| respond(200, json!([])));

        let api = client(transport, api_store, Arc::new(ScreenNavigator::default()));
        let mut request = PendingRequest::new(Method::GET, BASE, "/my-books/");
        request.set_bearer("stale");
        let outcome = api
            .refresh_and_retry(request, Some("stale".to_string()), ClientError::Unauthorized(Value::Null))
            .await;

        assert_eq!(tokio_test::assert_ok!(outcome).status, 200);
        assert_eq!(store.access_token().unwrap().as_deref(), Some("fresh"));
    }

    #[tokio::test]
    async fn test_no_refresh_token_propagates_401() {
        let store = Arc::new(MemorySessionStore::with_values([
            (SessionKey::AccessToken, "old"),
            (SessionKey::User, r#"{"username":"ada"}"#),
        ]));
        let nav = Arc::new(ScreenNavigator::new("/my-books"));
        let mut transport = MockHttpTransport::new();
        transport
            .expect_send()
            .times(1)
            .returning(|_| respond(401, json!({"detail": "expired"})));

        let api = client(transport, store.clone(), nav.clone());
        let outcome: ClientResult<Value> = api.get("/my-books/").await;

        assert!(tokio_test::assert_err!(outcome).is_unauthorized());
        assert!(store.has_user().unwrap());
        assert!(nav.redirects().is_empty());
    }

    #[tokio::test]
    async fn test_forced_logout_stays_put_on_entry_screen() {
        let store = Arc::new(MemorySessionStore::with_values([
            (SessionKey::AccessToken, "old"),
            (SessionKey::RefreshToken, "r1"),
            (SessionKey::User, r#"{"username":"ada"}"#),
        ]));
        let nav = Arc::new(ScreenNavigator::new("/"));
        let mut transport = MockHttpTransport::new();
        transport
            .expect_send()
            .withf(|req| req.path == REFRESH_PATH)
            .times(1)
            .returning(|_| respond(401, json!({"detail": "Token is blacklisted"})));
        transport
            .expect_send()
            .withf(|req| req.path == "/my-books/")
            .times(1)
            .returning(|_| respond(401, Value::Null));

        let api = client(transport, store.clone(), nav.clone());
        let outcome: ClientResult<Value> = api.get("/my-books/").await;

        assert!(tokio_test::assert_err!(outcome).is_unauthorized());
        assert_eq!(store.access_token().unwrap(), None);
        assert!(nav.redirects().is_empty());
        assert_eq!(nav.current_path(), "/");
    }

    /// Store whose removals always fail
    struct StuckStore(MemorySessionStore);

    impl SessionStore for StuckStore {
        fn get(&self, key: SessionKey) -> ClientResult<Option<String>> {
            self.0.get(key)
        }

        fn set(&self, key: SessionKey, value: &str) -> ClientResult<()> {
            self.0.set(key, value)
        }

        fn remove(&self, _key: SessionKey) -> ClientResult<()> {
            Err(ClientError::Session("disk full".to_string()))
        }
    }

    #[tokio::test]
    async fn test_store_failure_during_logout_keeps_original_401() {
        let store = Arc::new(StuckStore(MemorySessionStore::with_values([
            (SessionKey::AccessToken, "old"),
            (SessionKey::RefreshToken, "r1"),
            (SessionKey::User, r#"{"username":"ada"}"#),
        ])));
        let nav = Arc::new(ScreenNavigator::new("/my-books"));
        let mut transport = MockHttpTransport::new();
        transport
            .expect_send()
            .withf(|req| req.path == REFRESH_PATH)
            .times(1)
            .returning(|_| respond(401, json!({"detail": "Token is blacklisted"})));
        transport
            .expect_send()
            .withf(|req| req.path == "/my-books/")
            .times(1)
            .returning(|_| respond(401, json!({"detail": "Token expired"})));

        let api = ApiClient::new(BASE, Arc::new(transport), store, nav);
        let outcome: ClientResult<Value> = api.get("/my-books/").await;

        let err = tokio_test::assert_err!(outcome);
        assert!(err.is_unauthorized());
        assert_eq!(err.user_message(), "Token expired");
    }

    #[tokio::test]
    async fn test_other_errors_pass_through() {
        let store = Arc::new(MemorySessionStore::with_values([
            (SessionKey::AccessToken, "old"),
            (SessionKey::RefreshToken, "r1"),
        ]));
        let mut transport = MockHttpTransport::new();
        transport
            .expect_send()
            .times(1)
            .returning(|_| respond(400, json!({"error": "No copies available for checkout"})));

        let api = client(transport, store, Arc::new(ScreenNavigator::default()));
        let err = api
            .post::<Value, _>("/checkout/", &json!({"book": 1}))
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(400));
        assert_eq!(err.user_message(), "No copies available for checkout");
    }

    #[tokio::test]
    async fn test_network_failure_passes_through() {
        let mut transport = MockHttpTransport::new();
        transport
            .expect_send()
            .times(1)
            .returning(|_| Err(ClientError::Network("connection refused".to_string())));

        let api = client(
            transport,
            Arc::new(MemorySessionStore::new()),
            Arc::new(ScreenNavigator::default()),
        );
        let outcome: ClientResult<Value> = api.get("/books/").await;
        assert!(matches!(outcome, Err(ClientError::Network(_))));
    }
}
