//! Backend seams used by the session stores.
//!
//! [`ApiClient`] implements every trait here; tests substitute in-memory
//! fakes.

use std::future::Future;

use bitebox_core::{
    DeliveryOrder, DeliveryStats, Email, GroupOrderId, LatLng, Order, OrderId, OtpCode,
    RestaurantId, UserId,
};
use thiserror::Error;

use crate::api::{
    ApiClient, CreateOrderRequest, CreatedOrder, GroupHandle, GroupItemRequest, LoginRequest,
    PlacePayload, Session, SignupRequest, SignupResponse,
};
use crate::error::ApiError;

// =============================================================================
// Traits
// =============================================================================

/// Remote side of [`crate::stores::AuthSession`].
pub trait AuthBackend: Send + Sync {
    fn login(&self, request: &LoginRequest)
    -> impl Future<Output = Result<Session, ApiError>> + Send;

    fn signup(
        &self,
        request: &SignupRequest,
    ) -> impl Future<Output = Result<SignupResponse, ApiError>> + Send;

    fn verify_otp(
        &self,
        email: &Email,
        code: &OtpCode,
    ) -> impl Future<Output = Result<Session, ApiError>> + Send;

    fn resend_otp(&self, email: &Email) -> impl Future<Output = Result<(), ApiError>> + Send;
}

/// Remote side of [`crate::stores::OrderStore`].
pub trait OrderBackend: Send + Sync {
    fn user_orders(
        &self,
        user_id: &UserId,
    ) -> impl Future<Output = Result<Vec<Order>, ApiError>> + Send;

    fn order(&self, id: &OrderId) -> impl Future<Output = Result<Order, ApiError>> + Send;
}

/// Remote side of [`crate::stores::DriverSession`].
pub trait DeliveryBackend: Send + Sync {
    fn available_orders(&self)
    -> impl Future<Output = Result<Vec<DeliveryOrder>, ApiError>> + Send;

    fn accept_order(
        &self,
        driver_id: &UserId,
        order_id: &OrderId,
    ) -> impl Future<Output = Result<Option<DeliveryOrder>, ApiError>> + Send;

    fn push_location(
        &self,
        driver_id: &UserId,
        location: LatLng,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;

    fn stats(
        &self,
        driver_id: &UserId,
    ) -> impl Future<Output = Result<DeliveryStats, ApiError>> + Send;

    fn complete_order(&self, order_id: &OrderId)
    -> impl Future<Output = Result<(), ApiError>> + Send;
}

/// Remote side of [`crate::checkout::Checkout`].
pub trait CheckoutBackend: Send + Sync {
    fn create_order(
        &self,
        request: &CreateOrderRequest,
    ) -> impl Future<Output = Result<CreatedOrder, ApiError>> + Send;
}

/// Remote side of [`crate::group::GroupOrder`].
pub trait GroupBackend: Send + Sync {
    fn create_group(
        &self,
        user_id: &UserId,
        restaurant_id: &RestaurantId,
    ) -> impl Future<Output = Result<GroupHandle, ApiError>> + Send;

    fn join_group(
        &self,
        user_id: &UserId,
        invite_code: &str,
    ) -> impl Future<Output = Result<GroupOrderId, ApiError>> + Send;

    fn add_group_item(
        &self,
        request: &GroupItemRequest,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;

    fn finalize_group(
        &self,
        group_id: &GroupOrderId,
        pickup: Option<&PlacePayload>,
        delivery: Option<&PlacePayload>,
    ) -> impl Future<Output = Result<Order, ApiError>> + Send;
}

/// Push notification token source.
///
/// Failures never block sign-in; they are logged and the token omitted.
pub trait PushTokenProvider: Send + Sync {
    fn push_token(&self) -> impl Future<Output = Result<Option<String>, PushTokenError>> + Send;
}

/// Failure to obtain a push notification token.
#[derive(Debug, Error)]
#[error("Push token unavailable: {0}")]
pub struct PushTokenError(pub String);

/// Provider for environments without push notifications.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPushToken;

impl PushTokenProvider for NoPushToken {
    async fn push_token(&self) -> Result<Option<String>, PushTokenError> {
        Ok(None)
    }
}

// =============================================================================
// ApiClient implementations
// =============================================================================

impl AuthBackend for ApiClient {
    async fn login(&self, request: &LoginRequest) -> Result<Session, ApiError> {
        Self::login(self, request).await
    }

    async fn signup(&self, request: &SignupRequest) -> Result<SignupResponse, ApiError> {
        Self::signup(self, request).await
    }

    async fn verify_otp(&self, email: &Email, code: &OtpCode) -> Result<Session, ApiError> {
        Self::verify_otp(self, email, code).await
    }

    async fn resend_otp(&self, email: &Email) -> Result<(), ApiError> {
        Self::resend_otp(self, email).await
    }
}

impl OrderBackend for ApiClient {
    async fn user_orders(&self, user_id: &UserId) -> Result<Vec<Order>, ApiError> {
        Self::user_orders(self, user_id).await
    }

    async fn order(&self, id: &OrderId) -> Result<Order, ApiError> {
        Self::order(self, id).await
    }
}

impl DeliveryBackend for ApiClient {
    async fn available_orders(&self) -> Result<Vec<DeliveryOrder>, ApiError> {
        self.delivery_queue().await
    }

    async fn accept_order(
        &self,
        driver_id: &UserId,
        order_id: &OrderId,
    ) -> Result<Option<DeliveryOrder>, ApiError> {
        self.accept_delivery(driver_id, order_id).await
    }

    async fn push_location(&self, driver_id: &UserId, location: LatLng) -> Result<(), ApiError> {
        self.push_driver_location(driver_id, location).await
    }

    async fn stats(&self, driver_id: &UserId) -> Result<DeliveryStats, ApiError> {
        self.delivery_stats(driver_id).await
    }

    async fn complete_order(&self, order_id: &OrderId) -> Result<(), ApiError> {
        self.complete_delivery(order_id).await
    }
}

impl CheckoutBackend for ApiClient {
    async fn create_order(&self, request: &CreateOrderRequest) -> Result<CreatedOrder, ApiError> {
        Self::create_order(self, request).await
    }
}

impl GroupBackend for ApiClient {
    async fn create_group(
        &self,
        user_id: &UserId,
        restaurant_id: &RestaurantId,
    ) -> Result<GroupHandle, ApiError> {
        Self::create_group(self, user_id, restaurant_id).await
    }

    async fn join_group(
        &self,
        user_id: &UserId,
        invite_code: &str,
    ) -> Result<GroupOrderId, ApiError> {
        Self::join_group(self, user_id, invite_code).await
    }

    async fn add_group_item(&self, request: &GroupItemRequest) -> Result<(), ApiError> {
        Self::add_group_item(self, request).await
    }

    async fn finalize_group(
        &self,
        group_id: &GroupOrderId,
        pickup: Option<&PlacePayload>,
        delivery: Option<&PlacePayload>,
    ) -> Result<Order, ApiError> {
        Self::finalize_group(self, group_id, pickup, delivery).await
    }
}
