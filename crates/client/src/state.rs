//! Application state: the one place the client's parts are wired together.

use std::sync::Arc;

use bitebox_core::{Address, CartEngine, Order};

use crate::api::ApiClient;
use crate::checkout::{Checkout, CheckoutError, CheckoutOptions};
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::group::GroupOrder;
use crate::storage::{FileStore, KeyValueStore};
use crate::stores::{AuthSession, DriverSession, OrderStore};

/// Everything a running app holds.
///
/// Owned by the UI layer and passed by `&mut` to whatever needs to change it.
pub struct AppState {
    config: ClientConfig,
    store: Arc<dyn KeyValueStore>,
    api: ApiClient,
    cart: CartEngine,
    orders: OrderStore<ApiClient>,
    auth: AuthSession<ApiClient>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("api", &self.api)
            .field("cart", &self.cart)
            .field("orders", &self.orders.orders().len())
            .field("auth", &self.auth)
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Build state backed by files under `config.data_dir`, then restore any
    /// saved session.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the data directory or HTTP client cannot be set up.
    pub fn open(config: ClientConfig) -> Result<Self, ApiError> {
        let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::open(&config.data_dir)?);
        let mut state = Self::with_store(config, store)?;
        if let Err(e) = state.auth.load_user() {
            tracing::warn!(error = %e, "Could not restore saved session");
        }
        Ok(state)
    }

    /// Build state on an existing store without touching it.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the HTTP client cannot be built.
    pub fn with_store(config: ClientConfig, store: Arc<dyn KeyValueStore>) -> Result<Self, ApiError> {
        let api = ApiClient::new(&config, Arc::clone(&store))?;
        Ok(Self {
            cart: CartEngine::new(config.tax_rate),
            orders: OrderStore::new(api.clone()),
            auth: AuthSession::new(api.clone(), Arc::clone(&store)),
            api,
            store,
            config,
        })
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    #[must_use]
    pub fn store(&self) -> &dyn KeyValueStore {
        self.store.as_ref()
    }

    #[must_use]
    pub const fn api(&self) -> &ApiClient {
        &self.api
    }

    #[must_use]
    pub const fn cart(&self) -> &CartEngine {
        &self.cart
    }

    pub const fn cart_mut(&mut self) -> &mut CartEngine {
        &mut self.cart
    }

    #[must_use]
    pub const fn orders(&self) -> &OrderStore<ApiClient> {
        &self.orders
    }

    pub const fn orders_mut(&mut self) -> &mut OrderStore<ApiClient> {
        &mut self.orders
    }

    #[must_use]
    pub const fn auth(&self) -> &AuthSession<ApiClient> {
        &self.auth
    }

    pub const fn auth_mut(&mut self) -> &mut AuthSession<ApiClient> {
        &mut self.auth
    }

    // =========================================================================
    // Derived sessions
    // =========================================================================

    /// Check out the current cart as the signed-in user.
    ///
    /// # Errors
    ///
    /// `CheckoutError::Api(ApiError::NotSignedIn)` without a session, otherwise
    /// as [`Checkout::place_order`].
    pub async fn place_order(
        &mut self,
        delivery_address: Option<&Address>,
        options: CheckoutOptions,
    ) -> Result<Order, CheckoutError> {
        let user = self
            .auth
            .user()
            .filter(|_| self.auth.is_authenticated())
            .ok_or(ApiError::NotSignedIn)?;
        Checkout::new(self.api.clone())
            .place_order(&mut self.cart, &mut self.orders, user, delivery_address, options)
            .await
    }

    /// A group-order session for the signed-in user.
    #[must_use]
    pub fn group_order(&self) -> Option<GroupOrder<ApiClient>> {
        let user = self.auth.user().filter(|_| self.auth.is_authenticated())?;
        Some(GroupOrder::new(self.api.clone(), user.id.clone()))
    }

    /// A driver session, when the signed-in user is a driver.
    #[must_use]
    pub fn driver_session(&self) -> Option<DriverSession<ApiClient>> {
        let user = self
            .auth
            .user()
            .filter(|u| u.is_driver() && self.auth.is_authenticated())?;
        Some(DriverSession::new(user.id.clone(), self.api.clone()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use bitebox_core::{TaxRate, User, UserId, UserRole};
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;

    use super::*;
    use crate::storage::{MemoryStore, keys};

    fn saved_session(role: UserRole) -> Arc<dyn KeyValueStore> {
        let user = User {
            id: UserId::new("u1"),
            email: "kemi@example.com".to_string(),
            name: "Kemi".to_string(),
            phone: "0801".to_string(),
            role,
            avatar: None,
            created_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
        };
        let store = MemoryStore::new();
        store
            .set(keys::USER, &serde_json::to_string(&user).unwrap())
            .unwrap();
        store.set(keys::ACCESS_TOKEN, "tok").unwrap();
        Arc::new(store)
    }

    #[test]
    fn test_cart_uses_configured_tax_rate() {
        let config = ClientConfig {
            tax_rate: TaxRate::new(Decimal::new(8, 2)).unwrap(),
            ..ClientConfig::default()
        };
        let state = AppState::with_store(config, Arc::new(MemoryStore::new())).unwrap();
        assert_eq!(state.cart().tax_rate().as_fraction(), Decimal::new(8, 2));
        assert!(state.group_order().is_none());
    }

    #[test]
    fn test_driver_session_only_for_drivers() {
        let mut state =
            AppState::with_store(ClientConfig::default(), saved_session(UserRole::Delivery))
                .unwrap();
        assert!(state.driver_session().is_none());
        state.auth_mut().load_user().unwrap();
        let driver = state.driver_session().unwrap();
        assert_eq!(driver.driver_id().as_str(), "u1");

        let mut state =
            AppState::with_store(ClientConfig::default(), saved_session(UserRole::Customer))
                .unwrap();
        state.auth_mut().load_user().unwrap();
        assert!(state.driver_session().is_none());
        assert!(state.group_order().is_some());
    }

    #[test]
    fn test_open_creates_data_dir_and_restores() {
        let dir = tempfile::tempdir().unwrap();
        let config = ClientConfig {
            data_dir: dir.path().join("session"),
            ..ClientConfig::default()
        };
        let state = AppState::open(config).unwrap();
        assert!(dir.path().join("session").is_dir());
        assert!(!state.auth().is_authenticated());
        assert!(!state.auth().is_loading());
    }

    #[tokio::test]
    async fn test_place_order_requires_sign_in() {
        let mut state =
            AppState::with_store(ClientConfig::default(), Arc::new(MemoryStore::new())).unwrap();
        let err = state
            .place_order(None, CheckoutOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::Api(ApiError::NotSignedIn)));
    }
}
