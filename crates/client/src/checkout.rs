//! Turning the cart into a placed order.

use bitebox_core::{
    Address, AddressId, CartEngine, CustomerSnapshot, Order, OrderType, Restaurant, User,
};
use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{info, instrument};

use crate::api::{CreateOrderRequest, OrderItemPayload, PlacePayload};
use crate::backend::{CheckoutBackend, OrderBackend};
use crate::error::ApiError;
use crate::stores::OrderStore;

/// Errors from [`Checkout::place_order`].
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("Your cart is empty")]
    EmptyCart,

    #[error("Choose a delivery address")]
    MissingDeliveryAddress,

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Choices made on the checkout screen besides the address.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckoutOptions {
    pub order_type: OrderType,
    pub gift: bool,
    pub gift_message: Option<String>,
    pub recipient_name: Option<String>,
    pub scheduled_for: Option<DateTime<Utc>>,
}

/// Places orders against a [`CheckoutBackend`].
#[derive(Debug, Clone)]
pub struct Checkout<B> {
    backend: B,
}

impl<B: CheckoutBackend> Checkout<B> {
    pub const fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Submit the cart as a single order.
    ///
    /// On success the order is added to `orders` (becoming the active order)
    /// and the cart is cleared. Nothing is sent if the cart is empty or a
    /// delivery order has no address; on a backend failure the cart is kept.
    ///
    /// # Errors
    ///
    /// - `CheckoutError::EmptyCart` if there is nothing to order
    /// - `CheckoutError::MissingDeliveryAddress` for a delivery without an address
    /// - `CheckoutError::Api` if the backend rejects the order
    #[instrument(skip_all, fields(user_id = %user.id))]
    pub async fn place_order<O: OrderBackend>(
        &self,
        cart: &mut CartEngine,
        orders: &mut OrderStore<O>,
        user: &User,
        delivery_address: Option<&Address>,
        options: CheckoutOptions,
    ) -> Result<Order, CheckoutError> {
        let snapshot = cart.cart().ok_or(CheckoutError::EmptyCart)?;
        let delivery_address = match (options.order_type, delivery_address) {
            (OrderType::Delivery, None) => return Err(CheckoutError::MissingDeliveryAddress),
            (OrderType::Delivery, Some(address)) => Some(address),
            (OrderType::Pickup, _) => None,
        };

        let request = CreateOrderRequest {
            user_id: user.id.clone(),
            restaurant_id: snapshot.restaurant_id.clone(),
            items: snapshot.items.iter().map(OrderItemPayload::from).collect(),
            order_type: options.order_type,
            pickup_address: PlacePayload::pickup_for(&snapshot.restaurant),
            delivery_address: delivery_address.map(PlacePayload::from),
            gift: options.gift,
            gift_message: options.gift_message.filter(|m| !m.trim().is_empty()),
            recipient_name: options.recipient_name.filter(|n| !n.trim().is_empty()),
        };
        let created = self.backend.create_order(&request).await?;

        let order = Order {
            order_number: created.id.to_string(),
            id: created.id,
            customer_id: user.id.clone(),
            customer: Some(CustomerSnapshot {
                name: user.name.clone(),
                phone: user.phone.clone(),
                avatar: user.avatar.clone(),
            }),
            restaurant_id: snapshot.restaurant_id.clone(),
            restaurant: Some(snapshot.restaurant.clone()),
            items: snapshot.items.clone(),
            totals: snapshot.totals,
            status: created.status,
            order_type: options.order_type,
            delivery_address: delivery_address.cloned(),
            pickup_address: Some(pickup_address(&snapshot.restaurant)),
            scheduled_for: options.scheduled_for,
            created_at: created.created_at,
            updated_at: Utc::now(),
            driver_id: None,
            driver: None,
            estimated_delivery_time: None,
            driver_location: None,
        };

        info!(order_id = %order.id, total = %order.totals.total, "Order placed");
        orders.add_order(order.clone());
        cart.clear_cart();
        Ok(order)
    }
}

fn pickup_address(restaurant: &Restaurant) -> Address {
    Address {
        id: AddressId::new(format!("pickup_{}", restaurant.id)),
        label: restaurant.name.clone(),
        street: restaurant
            .address
            .clone()
            .unwrap_or_else(|| "Restaurant pickup".to_string()),
        city: String::new(),
        state: String::new(),
        zip_code: String::new(),
        latitude: restaurant.latitude,
        longitude: restaurant.longitude,
        instructions: None,
    }
}
