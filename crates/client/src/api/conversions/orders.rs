//! Order payloads and order/delivery conversion functions.

use bitebox_core::{
    Address, CartItem, CustomerSnapshot, DeliveryOrder, DriverSnapshot, LatLng, MenuItemId, Order,
    OrderId, OrderStatus, OrderType, OptionId, Place, Restaurant, RestaurantId, SelectedOption,
    Totals, UserId,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::account::{RawAddress, convert_address};
use super::catalog::{RawRestaurant, convert_restaurant};
use super::{de_id, de_opt_id, lenient};

// =============================================================================
// Request payloads
// =============================================================================

/// Selected options of a line, grouped the way the order endpoints expect.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemChoice {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_id: Option<OptionId>,
    pub add_on_ids: Vec<OptionId>,
    pub extra_ids: Vec<OptionId>,
}

impl ItemChoice {
    /// Sort selections by whether their group id mentions size, addon or extra.
    #[must_use]
    pub fn from_selected(selected: &[SelectedOption]) -> Self {
        let mut choice = Self::default();
        for option in selected {
            let group = option.group_id.as_str().to_lowercase();
            if group.contains("size") {
                if choice.size_id.is_none() {
                    choice.size_id = Some(option.option_id.clone());
                }
            } else if group.contains("addon") {
                choice.add_on_ids.push(option.option_id.clone());
            } else if group.contains("extra") {
                choice.extra_ids.push(option.option_id.clone());
            }
        }
        choice
    }
}

/// One line of an order or group-order payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemPayload {
    pub item_id: MenuItemId,
    pub quantity: u32,
    pub choice: ItemChoice,
}

impl From<&CartItem> for OrderItemPayload {
    fn from(item: &CartItem) -> Self {
        Self {
            item_id: item.menu_item.id.clone(),
            quantity: item.quantity.max(1),
            choice: ItemChoice::from_selected(&item.selected_options),
        }
    }
}

/// An address as the order endpoints accept it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacePayload {
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
}

impl PlacePayload {
    /// Pickup point of `restaurant`, or a generic label when it has no address.
    #[must_use]
    pub fn pickup_for(restaurant: &Restaurant) -> Self {
        Self {
            address: restaurant
                .address
                .clone()
                .unwrap_or_else(|| "Restaurant pickup".to_string()),
            latitude: None,
            longitude: None,
        }
    }
}

impl From<&Address> for PlacePayload {
    fn from(address: &Address) -> Self {
        Self {
            address: address.one_line(),
            latitude: Some(address.latitude),
            longitude: Some(address.longitude),
        }
    }
}

/// Body of `POST /orders`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub user_id: UserId,
    pub restaurant_id: RestaurantId,
    pub items: Vec<OrderItemPayload>,
    #[serde(rename = "type")]
    pub order_type: OrderType,
    pub pickup_address: PlacePayload,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_address: Option<PlacePayload>,
    pub gift: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gift_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient_name: Option<String>,
}

/// Response of `POST /orders`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCreatedOrder {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    pub status: Option<OrderStatus>,
    pub created_at: Option<DateTime<Utc>>,
    pub total: Option<Decimal>,
}

/// What the backend confirmed about a newly created order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedOrder {
    pub id: OrderId,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub total: Option<Decimal>,
}

impl From<RawCreatedOrder> for CreatedOrder {
    fn from(raw: RawCreatedOrder) -> Self {
        Self {
            id: OrderId::new(raw.id),
            status: raw.status.unwrap_or_default(),
            created_at: raw.created_at.unwrap_or_else(Utc::now),
            total: raw.total,
        }
    }
}

// =============================================================================
// Orders
// =============================================================================

/// An order as returned by the order and delivery endpoints.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawOrder {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    pub order_number: Option<String>,
    #[serde(default, alias = "userId", deserialize_with = "de_opt_id")]
    pub customer_id: Option<String>,
    pub customer: Option<Value>,
    #[serde(default, deserialize_with = "de_opt_id")]
    pub restaurant_id: Option<String>,
    pub restaurant: Option<Value>,
    pub items: Option<Vec<Value>>,
    pub subtotal: Option<Decimal>,
    pub delivery_fee: Option<Decimal>,
    pub tax: Option<Decimal>,
    pub total: Option<Decimal>,
    pub status: Option<OrderStatus>,
    #[serde(rename = "type")]
    pub order_type: Option<OrderType>,
    pub delivery_address: Option<RawAddress>,
    pub pickup_address: Option<RawAddress>,
    pub scheduled_for: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "de_opt_id")]
    pub driver_id: Option<String>,
    pub driver: Option<Value>,
    pub estimated_delivery_time: Option<DateTime<Utc>>,
    pub driver_location: Option<LatLng>,
}

/// Convert a raw order.
#[must_use]
pub fn convert_order(raw: RawOrder) -> Order {
    let restaurant = lenient::<RawRestaurant>(raw.restaurant, "restaurant").map(convert_restaurant);
    let items: Vec<CartItem> = raw
        .items
        .unwrap_or_default()
        .into_iter()
        .filter_map(|v| lenient(Some(v), "order item"))
        .collect();

    let subtotal = raw.subtotal.unwrap_or_default();
    let delivery_fee = raw
        .delivery_fee
        .or_else(|| restaurant.as_ref().map(|r| r.delivery_fee))
        .unwrap_or_default();
    let tax = raw.tax.unwrap_or_default();
    let total = raw.total.unwrap_or(subtotal + delivery_fee + tax);
    let created_at = raw.created_at.unwrap_or_else(Utc::now);

    Order {
        order_number: raw.order_number.unwrap_or_else(|| raw.id.clone()),
        id: OrderId::new(raw.id),
        customer_id: UserId::new(raw.customer_id.unwrap_or_default()),
        customer: lenient::<CustomerSnapshot>(raw.customer, "customer"),
        restaurant_id: raw.restaurant_id.map_or_else(
            || {
                restaurant
                    .as_ref()
                    .map_or_else(|| RestaurantId::new(""), |r| r.id.clone())
            },
            RestaurantId::new,
        ),
        restaurant,
        items,
        totals: Totals {
            subtotal,
            delivery_fee,
            tax,
            total,
        },
        status: raw.status.unwrap_or_default(),
        order_type: raw.order_type.unwrap_or_default(),
        delivery_address: raw.delivery_address.map(convert_address),
        pickup_address: raw.pickup_address.map(convert_address),
        scheduled_for: raw.scheduled_for,
        created_at,
        updated_at: raw.updated_at.unwrap_or(created_at),
        driver_id: raw.driver_id.map(UserId::new),
        driver: lenient::<DriverSnapshot>(raw.driver, "driver"),
        estimated_delivery_time: raw.estimated_delivery_time,
        driver_location: raw.driver_location,
    }
}

// =============================================================================
// Delivery orders
// =============================================================================

/// A point with an address, as sent with delivery orders.
#[derive(Debug, Deserialize)]
pub struct RawPlace {
    #[serde(alias = "lat")]
    pub latitude: Option<f64>,
    #[serde(alias = "lng")]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub address: Option<String>,
}

/// An order from the driver endpoints.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawDeliveryOrder {
    #[serde(flatten)]
    pub order: RawOrder,
    pub pickup_location: Option<RawPlace>,
    pub delivery_location: Option<RawPlace>,
    pub earnings: Option<Decimal>,
    pub distance: Option<f64>,
}

fn place_from_address(address: &Address) -> Place {
    Place {
        latitude: address.latitude,
        longitude: address.longitude,
        address: if address.street.is_empty() {
            address.one_line()
        } else {
            address.street.clone()
        },
    }
}

fn place_or(raw: Option<RawPlace>, fallback: Option<Place>) -> Place {
    let fallback = fallback.unwrap_or(Place {
        latitude: 0.0,
        longitude: 0.0,
        address: String::new(),
    });
    match raw {
        Some(raw) => Place {
            latitude: raw.latitude.unwrap_or(fallback.latitude),
            longitude: raw.longitude.unwrap_or(fallback.longitude),
            address: raw.address.unwrap_or(fallback.address),
        },
        None => fallback,
    }
}

/// Convert a raw delivery order.
///
/// Missing pickup/delivery points are derived from the order's addresses,
/// then from the restaurant's location.
#[must_use]
pub fn convert_delivery_order(raw: RawDeliveryOrder) -> DeliveryOrder {
    let order = convert_order(raw.order);

    let pickup_fallback = order.pickup_address.as_ref().map(place_from_address).or_else(|| {
        order.restaurant.as_ref().map(|r| Place {
            latitude: r.latitude,
            longitude: r.longitude,
            address: r.address.clone().unwrap_or_else(|| r.name.clone()),
        })
    });
    let delivery_fallback = order.delivery_address.as_ref().map(place_from_address);

    DeliveryOrder {
        pickup_location: place_or(raw.pickup_location, pickup_fallback),
        delivery_location: place_or(raw.delivery_location, delivery_fallback),
        earnings: raw.earnings.unwrap_or_default(),
        distance: raw.distance.unwrap_or(0.0),
        order,
    }
}
