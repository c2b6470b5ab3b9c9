//! Bitebox backend API client.
//!
//! Every request carries `Authorization: Bearer <token>` when a session is
//! stored. A 401 triggers one refresh-and-replay; concurrent 401s share a
//! single refresh. A request that never reaches the primary base URL is
//! retried once against the fallback base when the two differ.
//!
//! Restaurant lists and menus are cached using `moka`.

mod addresses;
mod auth;
mod cache;
mod catalog;
pub mod conversions;
mod delivery;
mod group;
mod orders;
#[cfg(test)]
pub(crate) mod test_server;

pub use addresses::NewAddress;
pub use auth::{AuthTokens, LoginRequest, Session, SignupRequest, SignupResponse};
pub use catalog::HealthStatus;
pub use conversions::{CreateOrderRequest, CreatedOrder, ItemChoice, OrderItemPayload, PlacePayload};
pub use group::{GroupHandle, GroupItemRequest};

use std::sync::Arc;

use bitebox_core::User;
use moka::future::Cache;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::storage::{KeyValueStore, keys};

use cache::{CacheKey, CacheValue};

// =============================================================================
// ApiClient
// =============================================================================

/// Client for the Bitebox REST backend.
///
/// Cheap to clone; clones share the HTTP connection pool, the catalog cache
/// and the refresh guard.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    http: reqwest::Client,
    base_url: String,
    fallback_base_url: String,
    store: Arc<dyn KeyValueStore>,
    /// Held while a refresh is in flight
    refresh_lock: Mutex<()>,
    cache: Cache<CacheKey, CacheValue>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url)
            .field("fallback_base_url", &self.inner.fallback_base_url)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// Tokens are read from (and refreshed tokens written to) `store`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Transport` if the HTTP client cannot be built.
    pub fn new(config: &ClientConfig, store: Arc<dyn KeyValueStore>) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        let cache = Cache::builder()
            .max_capacity(256)
            .time_to_live(config.catalog_cache_ttl)
            .build();

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                http,
                base_url: config.api_base_url.clone(),
                fallback_base_url: config.fallback_base_url.clone(),
                store,
                refresh_lock: Mutex::new(()),
                cache,
            }),
        })
    }

    /// Primary base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// Storage the client reads tokens from.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.inner.store
    }

    /// Drop cached restaurant lists and menus.
    pub fn invalidate_catalog(&self) {
        self.inner.cache.invalidate_all();
    }

    /// The user stored with the current session.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotSignedIn` if no user is stored.
    pub fn current_user(&self) -> Result<User, ApiError> {
        let raw = self
            .inner
            .store
            .get(keys::USER)?
            .ok_or(ApiError::NotSignedIn)?;
        Ok(serde_json::from_str(&raw)?)
    }

    // =========================================================================
    // Request pipeline
    // =========================================================================

    /// Send a request and decode a JSON body.
    ///
    /// Fails with `ApiError::Decode` if the backend answered without a JSON body.
    pub(crate) async fn fetch<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<T, ApiError> {
        let value = self
            .send(method, path, body)
            .await?
            .ok_or_else(|| ApiError::decode(format!("empty response from {path}")))?;
        Ok(serde_json::from_value(value)?)
    }

    /// Send a request whose response body is optional.
    pub(crate) async fn fetch_optional<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Option<T>, ApiError> {
        match self.send(method, path, body).await? {
            Some(Value::Null) | None => Ok(None),
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
        }
    }

    /// Full pipeline: bearer token, fallback base, refresh-and-replay, status check.
    #[instrument(skip(self, body), fields(method = %method))]
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Option<Value>, ApiError> {
        let token = self.access_token()?;
        let mut response = self
            .dispatch(&method, path, body, token.as_ref())
            .await?;

        if response.status() == StatusCode::UNAUTHORIZED
            && let Some(fresh) = self.refresh_after_unauthorized(token.as_ref()).await
        {
            debug!(path, "Replaying request with refreshed token");
            response = self.dispatch(&method, path, body, Some(&fresh)).await?;
        }

        read_body(response).await
    }

    /// Send once, retrying against the fallback base on transport failure.
    async fn dispatch(
        &self,
        method: &Method,
        path: &str,
        body: Option<&Value>,
        token: Option<&SecretString>,
    ) -> Result<Response, ApiError> {
        let url = format!("{}{path}", self.inner.base_url);
        debug!(%method, %url, "API request");

        match self.build(method, &url, body, token).send().await {
            Ok(response) => Ok(response),
            Err(e) if self.inner.base_url != self.inner.fallback_base_url => {
                let fallback = format!("{}{path}", self.inner.fallback_base_url);
                warn!(error = %e, %fallback, "API unreachable, retrying via fallback base");
                Ok(self.build(method, &fallback, body, token).send().await?)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn build(
        &self,
        method: &Method,
        url: &str,
        body: Option<&Value>,
        token: Option<&SecretString>,
    ) -> reqwest::RequestBuilder {
        let mut request = self.inner.http.request(method.clone(), url);
        if let Some(token) = token {
            request = request.bearer_auth(token.expose_secret());
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        request
    }

    fn access_token(&self) -> Result<Option<SecretString>, ApiError> {
        Ok(self
            .inner
            .store
            .get(keys::ACCESS_TOKEN)?
            .filter(|t| !t.is_empty())
            .map(SecretString::from))
    }

    /// Obtain a token to replay a request that got 401 with `stale`.
    ///
    /// Returns `None` when there is nothing to replay with, in which case the
    /// original 401 surfaces to the caller.
    async fn refresh_after_unauthorized(
        &self,
        stale: Option<&SecretString>,
    ) -> Option<SecretString> {
        let _guard = self.inner.refresh_lock.lock().await;

        // Another request may have refreshed while we waited for the lock
        let current = self.access_token().ok().flatten();
        if let Some(current) = current
            && stale.is_none_or(|s| s.expose_secret() != current.expose_secret())
        {
            return Some(current);
        }

        let refresh_token = self
            .inner
            .store
            .get(keys::REFRESH_TOKEN)
            .ok()
            .flatten()
            .filter(|t| !t.is_empty())?;

        match self.refresh(&SecretString::from(refresh_token)).await {
            Ok(token) => {
                if let Err(e) = self
                    .inner
                    .store
                    .set(keys::ACCESS_TOKEN, token.expose_secret())
                {
                    warn!(error = %e, "Failed to persist refreshed access token");
                }
                Some(token)
            }
            Err(e) => {
                warn!(error = %e, "Token refresh failed");
                None
            }
        }
    }
}

/// Turn a response into its JSON body, or an error carrying status and text.
async fn read_body(response: Response) -> Result<Option<Value>, ApiError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ApiError::Http {
            status: status.as_u16(),
            body,
        });
    }

    let is_json = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.contains("application/json"));
    if !is_json {
        return Ok(None);
    }

    let text = response.text().await?;
    if text.trim().is_empty() {
        return Ok(None);
    }
    Ok(Some(serde_json::from_str(&text)?))
}

/// Percent-encode a single path segment.
pub(crate) fn segment(raw: &str) -> std::borrow::Cow<'_, str> {
    urlencoding::encode(raw)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use bitebox_core::UserRole;
    use serde_json::json;

    use super::test_server::{Recorded, Reply, TestServer, unreachable_base_url};
    use super::*;
    use crate::storage::MemoryStore;
    use crate::stores::AuthSession;

    fn client(store: Arc<MemoryStore>) -> ApiClient {
        ApiClient::new(&ClientConfig::default(), store).unwrap()
    }

    fn client_for(base: &str, fallback: &str, store: Arc<MemoryStore>) -> ApiClient {
        let config = ClientConfig {
            api_base_url: base.to_string(),
            fallback_base_url: fallback.to_string(),
            request_timeout: Duration::from_secs(5),
            ..ClientConfig::default()
        };
        ApiClient::new(&config, store).unwrap()
    }

    fn signed_in(access: &str, refresh: Option<&str>) -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        store.set(keys::ACCESS_TOKEN, access).unwrap();
        if let Some(refresh) = refresh {
            store.set(keys::REFRESH_TOKEN, refresh).unwrap();
        }
        store
    }

    fn healthy() -> Reply {
        (200, r#"{"ok":true,"env":"test"}"#.to_string())
    }

    /// `/health` only accepts `at-2`; `/auth/refresh` answers with `refresh`.
    fn rotating(refresh: Reply) -> impl Fn(&Recorded) -> Reply + Send + Sync + 'static {
        move |req: &Recorded| match req.path.as_str() {
            "/auth/refresh" => refresh.clone(),
            _ if req.authorization.as_deref() == Some("Bearer at-2") => healthy(),
            _ => (401, r#"{"message":"jwt expired"}"#.to_string()),
        }
    }

    fn fresh_token() -> Reply {
        (200, r#"{"accessToken":"at-2"}"#.to_string())
    }

    #[test]
    fn test_current_user_requires_session() {
        let store = Arc::new(MemoryStore::new());
        let api = client(store.clone());
        assert!(matches!(api.current_user(), Err(ApiError::NotSignedIn)));

        store
            .set(
                keys::USER,
                r#"{"id":"u1","email":"ada@bitebox.ng","name":"Ada","phone":"","role":"customer","avatar":null,"createdAt":"2025-01-01T00:00:00Z"}"#,
            )
            .unwrap();
        assert_eq!(api.current_user().unwrap().name, "Ada");
    }

    #[test]
    fn test_empty_access_token_is_no_token() {
        let store = Arc::new(MemoryStore::new());
        store.set(keys::ACCESS_TOKEN, "").unwrap();
        assert!(client(store).access_token().unwrap().is_none());
    }

    #[test]
    fn test_segment_encoding() {
        assert_eq!(segment("user 1/2"), "user%201%2F2");
    }

    #[test]
    fn test_debug_hides_store() {
        let api = client(Arc::new(MemoryStore::new()));
        let debug = format!("{api:?}");
        assert!(debug.contains("localhost:4003"));
    }

    // =========================================================================
    // Request pipeline
    // =========================================================================

    #[tokio::test]
    async fn test_bearer_token_is_attached_when_stored() {
        let server = TestServer::start(|_: &Recorded| healthy()).await;

        let api = client_for(&server.base_url, &server.base_url, signed_in("at-2", None));
        api.health().await.unwrap();
        let anonymous = client_for(&server.base_url, &server.base_url, Arc::new(MemoryStore::new()));
        anonymous.health().await.unwrap();

        let auth: Vec<Option<String>> =
            server.requests().into_iter().map(|r| r.authorization).collect();
        assert_eq!(auth, vec![Some("Bearer at-2".to_string()), None]);
    }

    #[tokio::test]
    async fn test_unauthorized_refreshes_and_replays_once() {
        let server = TestServer::start(rotating(fresh_token())).await;
        let store = signed_in("at-1", Some("rt-1"));
        let api = client_for(&server.base_url, &server.base_url, store.clone());

        let health = api.health().await.unwrap();
        assert!(health.ok);

        let requests = server.requests();
        let trail: Vec<(&str, Option<&str>)> = requests
            .iter()
            .map(|r| (r.path.as_str(), r.authorization.as_deref()))
            .collect();
        assert_eq!(
            trail,
            vec![
                ("/health", Some("Bearer at-1")),
                ("/auth/refresh", None),
                ("/health", Some("Bearer at-2")),
            ]
        );
        assert_eq!(
            requests.get(1).unwrap().body,
            Some(json!({"refreshToken": "rt-1"}))
        );
        assert_eq!(store.get(keys::ACCESS_TOKEN).unwrap().as_deref(), Some("at-2"));
    }

    #[tokio::test]
    async fn test_failed_refresh_surfaces_original_unauthorized() {
        let rejected = (401, r#"{"message":"refresh token revoked"}"#.to_string());
        let server = TestServer::start(rotating(rejected)).await;
        let store = signed_in("at-1", Some("rt-1"));
        let api = client_for(&server.base_url, &server.base_url, store.clone());

        let err = api.health().await.unwrap_err();
        assert!(err.is_unauthorized());
        assert!(err.to_string().contains("jwt expired"));
        assert_eq!(server.hits("/auth/refresh"), 1);
        assert_eq!(server.hits("/health"), 1);
        assert_eq!(store.get(keys::ACCESS_TOKEN).unwrap().as_deref(), Some("at-1"));
    }

    #[tokio::test]
    async fn test_unauthorized_without_refresh_token_is_not_retried() {
        let server = TestServer::start(rotating(fresh_token())).await;
        let api = client_for(&server.base_url, &server.base_url, signed_in("at-1", None));

        assert!(api.health().await.unwrap_err().is_unauthorized());
        assert_eq!(server.hits("/auth/refresh"), 0);
        assert_eq!(server.hits("/health"), 1);
    }

    #[tokio::test]
    async fn test_concurrent_unauthorized_share_one_refresh() {
        let server = TestServer::start(rotating(fresh_token())).await;
        let api = client_for(
            &server.base_url,
            &server.base_url,
            signed_in("at-1", Some("rt-1")),
        );

        let (first, second) = tokio::join!(api.health(), api.health());
        assert!(first.unwrap().ok);
        assert!(second.unwrap().ok);
        assert_eq!(server.hits("/auth/refresh"), 1);
    }

    #[tokio::test]
    async fn test_unreachable_primary_falls_back_once() {
        let server = TestServer::start(|_: &Recorded| healthy()).await;
        let dead = unreachable_base_url().await;
        let api = client_for(&dead, &server.base_url, Arc::new(MemoryStore::new()));

        assert_eq!(api.health().await.unwrap().env, "test");
        assert_eq!(server.hits("/health"), 1);
    }

    #[tokio::test]
    async fn test_unreachable_without_distinct_fallback_is_transport_error() {
        let dead = unreachable_base_url().await;
        let api = client_for(&dead, &dead, Arc::new(MemoryStore::new()));
        assert!(matches!(api.health().await, Err(ApiError::Transport(_))));
    }

    #[tokio::test]
    async fn test_non_success_status_carries_body() {
        let server =
            TestServer::start(|_: &Recorded| (503, "Service unavailable".to_string())).await;
        let api = client_for(&server.base_url, &server.base_url, Arc::new(MemoryStore::new()));

        let err = api.health().await.unwrap_err();
        assert_eq!(err.status(), Some(503));
        assert_eq!(err.to_string(), "HTTP 503: Service unavailable");
        // Server errors are not retried against the fallback
        assert_eq!(server.hits("/health"), 1);
    }

    #[tokio::test]
    async fn test_session_sees_refreshed_token() {
        let server = TestServer::start(|req: &Recorded| match req.path.as_str() {
            "/auth/login" => (
                200,
                json!({
                    "user": {"id": 5, "email": "Kola@Bitebox.ng", "role": "admin"},
                    "accessToken": "at-1",
                    "refreshToken": "rt-1",
                })
                .to_string(),
            ),
            _ => rotating(fresh_token())(req),
        })
        .await;
        let store = Arc::new(MemoryStore::new());
        let api = client_for(&server.base_url, &server.base_url, store.clone());
        let mut auth = AuthSession::new(api.clone(), store);

        let user = auth
            .login(
                "Kola@Bitebox.ng",
                SecretString::from("secret"),
                UserRole::Delivery,
            )
            .await
            .unwrap();
        assert_eq!(user.role, UserRole::Delivery);
        let login = server.requests().into_iter().next().unwrap();
        assert_eq!(
            login.body.unwrap().get("email"),
            Some(&json!("Kola@Bitebox.ng"))
        );

        api.health().await.unwrap();
        assert_eq!(auth.access_token().unwrap().expose_secret(), "at-2");
        assert!(auth.is_authenticated());
    }
}
