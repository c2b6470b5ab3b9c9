//! Integration tests for Bitebox.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p bitebox-integration-tests
//! ```
//!
//! The scenarios in `tests/` drive the client stores end to end against
//! [`FakeBackend`], an in-memory stand-in for the gateway that implements
//! every backend trait. No network or database is needed.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bitebox_client::ApiError;
use bitebox_client::api::conversions::{RawUser, convert_user};
use bitebox_client::api::{
    AuthTokens, CreateOrderRequest, CreatedOrder, LoginRequest, Session, SignupRequest,
    SignupResponse,
};
use bitebox_client::backend::{AuthBackend, CheckoutBackend, DeliveryBackend, OrderBackend};
use bitebox_core::{
    Address, AddressId, DeliveryOrder, DeliveryStats, Email, LatLng, MenuItem, MenuItemId, Order,
    OrderId, OrderStatus, OrderType, OtpCode, Place, Restaurant, RestaurantId, Totals, User,
    UserId, UserRole,
};
use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;

// =============================================================================
// Fake gateway
// =============================================================================

/// What the fake gateway knows.
#[derive(Debug, Default)]
pub struct FakeState {
    /// email -> (password, user record as the backend would send it)
    pub accounts: HashMap<String, (String, Value)>,
    pub orders: HashMap<OrderId, Order>,
    pub queue: Vec<DeliveryOrder>,
    pub stats: DeliveryStats,
    pub created: Vec<CreateOrderRequest>,
    pub completed: Vec<OrderId>,
    pub locations: Vec<LatLng>,
    pub fail_complete: bool,
    next_order: u32,
}

/// In-memory gateway shared by every store under test.
#[derive(Debug, Clone, Default)]
pub struct FakeBackend {
    state: Arc<Mutex<FakeState>>,
}

impl FakeBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inspect or change the gateway's state.
    pub fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add an account; `user` is the raw JSON the login endpoint returns.
    pub fn register(&self, email: &str, password: &str, user: Value) {
        self.state()
            .accounts
            .insert(email.to_string(), (password.to_string(), user));
    }
}

fn http(status: u16, body: &str) -> ApiError {
    ApiError::Http {
        status,
        body: body.to_string(),
    }
}

impl AuthBackend for FakeBackend {
    async fn login(&self, request: &LoginRequest) -> Result<Session, ApiError> {
        let record = self.state().accounts.get(request.email.as_str()).cloned();
        let Some((password, raw)) = record else {
            return Err(http(401, "Invalid credentials"));
        };
        if password != request.password.expose_secret() {
            return Err(http(401, "Invalid credentials"));
        }
        let raw: RawUser = serde_json::from_value(raw)?;
        let user = convert_user(raw, Some(request.role));
        Ok(Session {
            tokens: AuthTokens {
                access_token: SecretString::from(format!("access-{}", user.id)),
                refresh_token: Some(SecretString::from(format!("refresh-{}", user.id))),
            },
            user,
        })
    }

    async fn signup(&self, _request: &SignupRequest) -> Result<SignupResponse, ApiError> {
        Ok(SignupResponse::VerificationRequired)
    }

    async fn verify_otp(&self, _email: &Email, _code: &OtpCode) -> Result<Session, ApiError> {
        Err(http(400, "Invalid code"))
    }

    async fn resend_otp(&self, _email: &Email) -> Result<(), ApiError> {
        Ok(())
    }
}

impl OrderBackend for FakeBackend {
    async fn user_orders(&self, user_id: &UserId) -> Result<Vec<Order>, ApiError> {
        Ok(self
            .state()
            .orders
            .values()
            .filter(|o| &o.customer_id == user_id)
            .cloned()
            .collect())
    }

    async fn order(&self, id: &OrderId) -> Result<Order, ApiError> {
        self.state()
            .orders
            .get(id)
            .cloned()
            .ok_or_else(|| http(404, "Order not found"))
    }
}

impl CheckoutBackend for FakeBackend {
    async fn create_order(&self, request: &CreateOrderRequest) -> Result<CreatedOrder, ApiError> {
        let mut state = self.state();
        state.next_order += 1;
        let id = OrderId::new(format!("ord_{}", state.next_order));
        state.created.push(request.clone());
        Ok(CreatedOrder {
            id,
            status: OrderStatus::Pending,
            created_at: Utc::now(),
            total: None,
        })
    }
}

impl DeliveryBackend for FakeBackend {
    async fn available_orders(&self) -> Result<Vec<DeliveryOrder>, ApiError> {
        Ok(self.state().queue.clone())
    }

    async fn accept_order(
        &self,
        _driver_id: &UserId,
        order_id: &OrderId,
    ) -> Result<Option<DeliveryOrder>, ApiError> {
        let mut state = self.state();
        let before = state.queue.len();
        state.queue.retain(|o| o.id() != order_id);
        if state.queue.len() == before {
            return Err(http(409, "Order already taken"));
        }
        Ok(None)
    }

    async fn push_location(&self, _driver_id: &UserId, location: LatLng) -> Result<(), ApiError> {
        self.state().locations.push(location);
        Ok(())
    }

    async fn stats(&self, _driver_id: &UserId) -> Result<DeliveryStats, ApiError> {
        Ok(self.state().stats.clone())
    }

    async fn complete_order(&self, order_id: &OrderId) -> Result<(), ApiError> {
        let mut state = self.state();
        if state.fail_complete {
            return Err(http(503, "Service unavailable"));
        }
        state.completed.push(order_id.clone());
        state.stats.total_deliveries += 1;
        state.stats.today_deliveries += 1;
        Ok(())
    }
}

// =============================================================================
// Fixtures
// =============================================================================

#[must_use]
pub fn restaurant(id: &str, delivery_fee: i64) -> Restaurant {
    Restaurant {
        id: RestaurantId::new(id),
        name: format!("Restaurant {id}"),
        image: String::new(),
        rating: 4.6,
        review_count: 120,
        delivery_time: "20-30 min".to_string(),
        delivery_fee: Decimal::from(delivery_fee),
        minimum_order: Decimal::ZERO,
        address: Some("14 Allen Avenue, Ikeja".to_string()),
        cuisines: vec!["Nigerian".to_string()],
        is_open: true,
        distance: 2.4,
        latitude: 6.6018,
        longitude: 3.3515,
    }
}

#[must_use]
pub fn menu_item(id: &str, restaurant_id: &str, price: i64) -> MenuItem {
    MenuItem {
        id: MenuItemId::new(id),
        restaurant_id: RestaurantId::new(restaurant_id),
        name: format!("Item {id}"),
        description: String::new(),
        image: String::new(),
        price: Decimal::from(price),
        category: "Mains".to_string(),
        is_available: true,
        option_groups: Vec::new(),
        preparation_time: 20,
    }
}

#[must_use]
pub fn customer() -> User {
    User {
        id: UserId::new("cust_1"),
        email: "tolu@example.com".to_string(),
        name: "Tolu".to_string(),
        phone: "+2348000000000".to_string(),
        role: UserRole::Customer,
        avatar: None,
        created_at: Utc
            .with_ymd_and_hms(2025, 1, 5, 9, 0, 0)
            .single()
            .unwrap_or_else(Utc::now),
    }
}

#[must_use]
pub fn home_address() -> Address {
    Address {
        id: AddressId::new("addr_home"),
        label: "Home".to_string(),
        street: "3 Admiralty Way".to_string(),
        city: "Lekki".to_string(),
        state: "Lagos".to_string(),
        zip_code: "105102".to_string(),
        latitude: 6.4474,
        longitude: 3.4720,
        instructions: Some("Gate 2".to_string()),
    }
}

/// An order waiting for a driver.
#[must_use]
pub fn delivery_order(id: &str, earnings: Decimal) -> DeliveryOrder {
    let placed = Utc::now();
    DeliveryOrder {
        order: Order {
            id: OrderId::new(id),
            order_number: id.to_uppercase(),
            customer_id: UserId::new("cust_1"),
            customer: None,
            restaurant_id: RestaurantId::new("rest_1"),
            restaurant: None,
            items: Vec::new(),
            totals: Totals::default(),
            status: OrderStatus::ReadyForPickup,
            order_type: OrderType::Delivery,
            delivery_address: None,
            pickup_address: None,
            scheduled_for: None,
            created_at: placed,
            updated_at: placed,
            driver_id: None,
            driver: None,
            estimated_delivery_time: None,
            driver_location: None,
        },
        pickup_location: Place {
            latitude: 6.6018,
            longitude: 3.3515,
            address: "14 Allen Avenue, Ikeja".to_string(),
        },
        delivery_location: Place {
            latitude: 6.4474,
            longitude: 3.4720,
            address: "3 Admiralty Way, Lekki".to_string(),
        },
        earnings,
        distance: 19.5,
    }
}
