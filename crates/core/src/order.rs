//! Placed orders, the driver's view of them, and tracking progress.

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::account::Address;
use crate::cart::CartItem;
use crate::catalog::Restaurant;
use crate::types::{LatLng, OrderId, OrderStatus, OrderType, RestaurantId, Totals, UserId};

/// Contact details of the customer, frozen at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerSnapshot {
    pub name: String,
    pub phone: String,
    pub avatar: Option<String>,
}

/// The assigned driver, as shown to the customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverSnapshot {
    pub id: UserId,
    pub name: String,
    pub phone: String,
    pub avatar: Option<String>,
    pub vehicle_type: String,
    pub license_plate: String,
}

/// A placed order.
///
/// Identity is fixed at creation; only `status`, `updated_at` and
/// `driver_location` change afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub order_number: String,
    pub customer_id: UserId,
    pub customer: Option<CustomerSnapshot>,
    pub restaurant_id: RestaurantId,
    pub restaurant: Option<Restaurant>,
    pub items: Vec<CartItem>,
    #[serde(flatten)]
    pub totals: Totals,
    pub status: OrderStatus,
    #[serde(rename = "type")]
    pub order_type: OrderType,
    pub delivery_address: Option<Address>,
    pub pickup_address: Option<Address>,
    pub scheduled_for: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub driver_id: Option<UserId>,
    pub driver: Option<DriverSnapshot>,
    pub estimated_delivery_time: Option<DateTime<Utc>>,
    pub driver_location: Option<LatLng>,
}

impl Order {
    /// Record a new status.
    pub fn set_status(&mut self, status: OrderStatus, at: DateTime<Utc>) {
        self.status = status;
        self.updated_at = at;
    }

    /// Record the driver's latest position.
    pub fn set_driver_location(&mut self, location: LatLng, at: DateTime<Utc>) {
        self.driver_location = Some(location);
        self.updated_at = at;
    }

    /// Progress through the tracking steps.
    #[must_use]
    pub fn timeline(&self) -> Vec<TimelineStep> {
        tracking_timeline(self.status)
    }
}

/// A point on the map with a printable address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub latitude: f64,
    pub longitude: f64,
    pub address: String,
}

impl Place {
    /// Coordinates of the place.
    #[must_use]
    pub const fn coords(&self) -> LatLng {
        LatLng::new(self.latitude, self.longitude)
    }
}

/// An order as offered to and fulfilled by a driver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryOrder {
    #[serde(flatten)]
    pub order: Order,
    pub pickup_location: Place,
    pub delivery_location: Place,
    /// Driver payout for this delivery.
    pub earnings: Decimal,
    /// Trip length in kilometers.
    pub distance: f64,
}

impl DeliveryOrder {
    /// Order ID.
    #[must_use]
    pub const fn id(&self) -> &OrderId {
        &self.order.id
    }

    /// Current status.
    #[must_use]
    pub const fn status(&self) -> OrderStatus {
        self.order.status
    }
}

/// Earnings for one day of the week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyEarnings {
    pub day: String,
    pub amount: Decimal,
}

/// A driver's delivery counters and earnings.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeliveryStats {
    pub total_deliveries: u32,
    pub today_deliveries: u32,
    pub total_earnings: Decimal,
    pub today_earnings: Decimal,
    pub average_rating: f64,
    pub completion_rate: f64,
    pub weekly_earnings: Vec<DailyEarnings>,
}

impl DeliveryStats {
    /// Count one completed delivery worth `earnings`, rounded to kobo/cents.
    pub fn record_completion(&mut self, earnings: Decimal) {
        self.total_deliveries += 1;
        self.today_deliveries += 1;
        self.total_earnings = round_money(self.total_earnings + earnings);
        self.today_earnings = round_money(self.today_earnings + earnings);
    }
}

fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// A labelled step on the customer's tracking screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackingStep {
    pub status: OrderStatus,
    pub label: &'static str,
}

/// Steps shown on the tracking screen, in order.
///
/// `pending` and `cancelled` are deliberately absent: an order in either
/// renders with no current step and nothing completed.
pub const TRACKING_STEPS: [TrackingStep; 6] = [
    TrackingStep {
        status: OrderStatus::Confirmed,
        label: "Order Confirmed",
    },
    TrackingStep {
        status: OrderStatus::Preparing,
        label: "Preparing",
    },
    TrackingStep {
        status: OrderStatus::ReadyForPickup,
        label: "Ready",
    },
    TrackingStep {
        status: OrderStatus::PickedUp,
        label: "Picked Up",
    },
    TrackingStep {
        status: OrderStatus::OnTheWay,
        label: "On the Way",
    },
    TrackingStep {
        status: OrderStatus::Delivered,
        label: "Delivered",
    },
];

/// Index of `status` in [`TRACKING_STEPS`], or `None` if it has no step.
#[must_use]
pub fn tracking_step_index(status: OrderStatus) -> Option<usize> {
    TRACKING_STEPS.iter().position(|s| s.status == status)
}

/// A tracking step with its render state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimelineStep {
    pub step: TrackingStep,
    pub completed: bool,
    pub current: bool,
}

/// Render state of every tracking step for an order in `status`.
#[must_use]
pub fn tracking_timeline(status: OrderStatus) -> Vec<TimelineStep> {
    let current = tracking_step_index(status);
    TRACKING_STEPS
        .iter()
        .enumerate()
        .map(|(i, step)| TimelineStep {
            step: *step,
            completed: current.is_some_and(|c| i <= c),
            current: current == Some(i),
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_step_index_for_each_status() {
        assert_eq!(tracking_step_index(OrderStatus::Confirmed), Some(0));
        assert_eq!(tracking_step_index(OrderStatus::OnTheWay), Some(4));
        assert_eq!(tracking_step_index(OrderStatus::Pending), None);
        assert_eq!(tracking_step_index(OrderStatus::Cancelled), None);
    }

    #[test]
    fn test_timeline_marks_completed_and_current() {
        let timeline = tracking_timeline(OrderStatus::ReadyForPickup);
        let completed: Vec<bool> = timeline.iter().map(|s| s.completed).collect();
        assert_eq!(completed, vec![true, true, true, false, false, false]);
        assert_eq!(timeline.iter().filter(|s| s.current).count(), 1);
        assert!(timeline.get(2).unwrap().current);
    }

    #[test]
    fn test_cancelled_timeline_is_degenerate_not_an_error() {
        let timeline = tracking_timeline(OrderStatus::Cancelled);
        assert_eq!(timeline.len(), TRACKING_STEPS.len());
        assert!(timeline.iter().all(|s| !s.completed && !s.current));
    }

    #[test]
    fn test_record_completion_rounds_earnings() {
        let mut stats = DeliveryStats {
            total_deliveries: 10,
            today_deliveries: 2,
            total_earnings: Decimal::new(1_000_010, 2),
            today_earnings: Decimal::new(150_000, 2),
            ..DeliveryStats::default()
        };
        stats.record_completion(Decimal::new(1_250_005, 3));
        assert_eq!(stats.total_deliveries, 11);
        assert_eq!(stats.today_deliveries, 3);
        assert_eq!(stats.today_earnings, Decimal::new(275_001, 2));
        assert_eq!(stats.total_earnings, Decimal::new(1_125_011, 2));
    }

    #[test]
    fn test_delivery_stats_tolerate_missing_fields() {
        let stats: DeliveryStats =
            serde_json::from_str(r#"{"totalDeliveries": 4, "todayEarnings": 1200}"#).unwrap();
        assert_eq!(stats.total_deliveries, 4);
        assert_eq!(stats.today_earnings, Decimal::from(1200));
        assert!(stats.weekly_earnings.is_empty());
    }
}
