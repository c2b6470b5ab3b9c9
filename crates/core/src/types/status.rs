//! Status enums for orders, deliveries and accounts.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle status of an order, shared by the customer and driver views.
///
/// The happy path is strictly ordered:
/// `pending → confirmed → preparing → ready_for_pickup → picked_up →
/// on_the_way → delivered`. `cancelled` is an absorbing terminal state that
/// can be reached from any status except `delivered`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Preparing,
    ReadyForPickup,
    PickedUp,
    OnTheWay,
    Delivered,
    Cancelled,
}

/// A status change that the lifecycle does not allow.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("cannot move order from {from} to {to}")]
pub struct TransitionError {
    /// Status the order was in.
    pub from: OrderStatus,
    /// Status that was requested.
    pub to: OrderStatus,
}

impl OrderStatus {
    /// Happy-path statuses in lifecycle order.
    pub const LIFECYCLE: [Self; 7] = [
        Self::Pending,
        Self::Confirmed,
        Self::Preparing,
        Self::ReadyForPickup,
        Self::PickedUp,
        Self::OnTheWay,
        Self::Delivered,
    ];

    /// Position on the happy path, `None` for `cancelled`.
    #[must_use]
    pub fn position(self) -> Option<usize> {
        Self::LIFECYCLE.iter().position(|s| *s == self)
    }

    /// The next status on the happy path, if any.
    #[must_use]
    pub fn next(self) -> Option<Self> {
        self.position()
            .and_then(|i| Self::LIFECYCLE.get(i + 1))
            .copied()
    }

    /// Whether no further transitions are possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }

    /// Whether a single-step move to `to` is allowed.
    #[must_use]
    pub fn can_transition_to(self, to: Self) -> bool {
        if to == Self::Cancelled {
            return !self.is_terminal();
        }
        self.next() == Some(to)
    }

    /// Validate a single-step move to `to`.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError`] if the move skips a step, goes backwards,
    /// or leaves a terminal status.
    pub fn transition(self, to: Self) -> Result<Self, TransitionError> {
        if self.can_transition_to(to) {
            Ok(to)
        } else {
            Err(TransitionError { from: self, to })
        }
    }

    /// The action a driver can take from this status, if any.
    #[must_use]
    pub const fn driver_action(self) -> Option<DriverAction> {
        match self {
            Self::ReadyForPickup => Some(DriverAction::MarkPickedUp),
            Self::PickedUp => Some(DriverAction::StartNavigation),
            Self::OnTheWay => Some(DriverAction::MarkDelivered),
            _ => None,
        }
    }

    /// Whether the driver's device should be streaming its location.
    #[must_use]
    pub const fn tracks_driver_location(self) -> bool {
        matches!(self, Self::PickedUp | Self::OnTheWay)
    }

    /// Wire name (`snake_case`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Preparing => "preparing",
            Self::ReadyForPickup => "ready_for_pickup",
            Self::PickedUp => "picked_up",
            Self::OnTheWay => "on_the_way",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::LIFECYCLE
            .iter()
            .chain(std::iter::once(&Self::Cancelled))
            .find(|status| status.as_str() == s)
            .copied()
            .ok_or_else(|| format!("invalid order status: {s}"))
    }
}

/// The driver's primary action on the active-delivery screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DriverAction {
    /// `ready_for_pickup → picked_up`.
    MarkPickedUp,
    /// `picked_up → on_the_way`.
    StartNavigation,
    /// `on_the_way → delivered`, which also completes the delivery.
    MarkDelivered,
}

impl DriverAction {
    /// Button label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::MarkPickedUp => "Mark as Picked Up",
            Self::StartNavigation => "Start Navigation",
            Self::MarkDelivered => "Mark as Delivered",
        }
    }

    /// Status the delivery moves to.
    #[must_use]
    pub const fn target(self) -> OrderStatus {
        match self {
            Self::MarkPickedUp => OrderStatus::PickedUp,
            Self::StartNavigation => OrderStatus::OnTheWay,
            Self::MarkDelivered => OrderStatus::Delivered,
        }
    }
}

/// How the customer receives the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    #[default]
    Delivery,
    Pickup,
}

/// Account role.
///
/// The backend sometimes calls drivers `driver`; it is accepted on input and
/// normalised to `delivery`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Customer,
    #[serde(alias = "driver")]
    Delivery,
}

impl UserRole {
    /// Name used by the signup endpoint, which expects `driver`.
    #[must_use]
    pub const fn signup_name(self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Delivery => "driver",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Customer => f.write_str("customer"),
            Self::Delivery => f.write_str("delivery"),
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(Self::Customer),
            "delivery" | "driver" => Ok(Self::Delivery),
            _ => Err(format!("invalid role: {s}")),
        }
    }
}
