//! The driver's side: online state, the offer queue and the active delivery.

use bitebox_core::{
    DeliveryOrder, DeliveryStats, DriverAction, LatLng, OrderId, OrderStatus, TransitionError,
    UserId,
};
use chrono::Utc;
use thiserror::Error;
use tracing::{error, info, instrument};

use crate::backend::DeliveryBackend;
use crate::error::ApiError;
use crate::route::{InterpolatedRouteProvider, RoutePreview, RouteProvider};

/// Errors from [`DriverSession`].
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("You are offline. Go online to accept orders.")]
    Offline,

    #[error("Finish delivery {0} before accepting another order")]
    AlreadyActive(OrderId),

    #[error("No active delivery")]
    NoActiveDelivery,

    #[error("Order {0} is no longer available")]
    NotAvailable(OrderId),

    #[error("Nothing to do for an order that is {0}")]
    NoAction(OrderStatus),

    #[error(transparent)]
    Transition(#[from] TransitionError),
}

/// A driver's working session.
///
/// Holds at most one active delivery. Counters and earnings change only
/// after the backend has confirmed a completion.
#[derive(Debug)]
pub struct DriverSession<D, R = InterpolatedRouteProvider> {
    driver_id: UserId,
    backend: D,
    route: RoutePreview<R>,
    is_online: bool,
    available_orders: Vec<DeliveryOrder>,
    active_delivery: Option<DeliveryOrder>,
    stats: DeliveryStats,
}

impl<D: DeliveryBackend> DriverSession<D, InterpolatedRouteProvider> {
    /// Start a session for `driver_id` with the offline route provider.
    pub fn new(driver_id: UserId, backend: D) -> Self {
        Self::with_routes(driver_id, backend, InterpolatedRouteProvider::default())
    }
}

impl<D: DeliveryBackend, R: RouteProvider> DriverSession<D, R> {
    /// Start a session with a specific route provider. Drivers start online.
    pub fn with_routes(driver_id: UserId, backend: D, routes: R) -> Self {
        Self {
            driver_id,
            backend,
            route: RoutePreview::new(routes),
            is_online: true,
            available_orders: Vec::new(),
            active_delivery: None,
            stats: DeliveryStats::default(),
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    #[must_use]
    pub const fn driver_id(&self) -> &UserId {
        &self.driver_id
    }

    #[must_use]
    pub const fn is_online(&self) -> bool {
        self.is_online
    }

    /// Orders on offer, as of the last [`Self::load_available_orders`].
    #[must_use]
    pub fn available_orders(&self) -> &[DeliveryOrder] {
        &self.available_orders
    }

    #[must_use]
    pub const fn active_delivery(&self) -> Option<&DeliveryOrder> {
        self.active_delivery.as_ref()
    }

    #[must_use]
    pub const fn stats(&self) -> &DeliveryStats {
        &self.stats
    }

    /// Route from the driver to the customer; empty until the driver is
    /// on the way.
    #[must_use]
    pub fn route_preview(&self) -> &[LatLng] {
        self.route.polyline()
    }

    /// The next step the driver can take on the active delivery.
    #[must_use]
    pub fn primary_action(&self) -> Option<DriverAction> {
        self.active_delivery
            .as_ref()
            .and_then(|d| d.status().driver_action())
    }

    // =========================================================================
    // Online state
    // =========================================================================

    pub fn set_online(&mut self, online: bool) {
        self.is_online = online;
        info!(online, "Driver availability changed");
    }

    /// Flip online state and return the new value.
    pub fn toggle_online(&mut self) -> bool {
        self.set_online(!self.is_online);
        self.is_online
    }

    // =========================================================================
    // Queue and stats
    // =========================================================================

    /// Replace the offer queue with the backend's.
    ///
    /// # Errors
    ///
    /// Returns `DeliveryError::Api` if the queue cannot be fetched; the
    /// previous queue is kept.
    #[instrument(skip(self))]
    pub async fn load_available_orders(&mut self) -> Result<(), DeliveryError> {
        self.available_orders = self.backend.available_orders().await?;
        Ok(())
    }

    /// Fetch authoritative stats. Failures are logged and the current stats kept.
    #[instrument(skip(self), fields(driver_id = %self.driver_id))]
    pub async fn load_stats(&mut self) {
        match self.backend.stats(&self.driver_id).await {
            Ok(stats) => self.stats = stats,
            Err(e) => error!(error = %e, "Failed to load driver stats"),
        }
    }

    // =========================================================================
    // Active delivery
    // =========================================================================

    /// Claim `order` and make it the active delivery.
    ///
    /// # Errors
    ///
    /// - `DeliveryError::Offline` if the driver is offline
    /// - `DeliveryError::AlreadyActive` if a delivery is in progress
    /// - `DeliveryError::Api` if the backend refuses; nothing changes
    #[instrument(skip(self, order), fields(order_id = %order.id()))]
    pub async fn accept_order(
        &mut self,
        order: DeliveryOrder,
    ) -> Result<&DeliveryOrder, DeliveryError> {
        if !self.is_online {
            return Err(DeliveryError::Offline);
        }
        if let Some(active) = &self.active_delivery {
            return Err(DeliveryError::AlreadyActive(active.id().clone()));
        }

        let accepted = self
            .backend
            .accept_order(&self.driver_id, order.id())
            .await?;

        self.available_orders.retain(|o| o.id() != order.id());
        self.route.reset();
        info!("Delivery accepted");
        Ok(self.active_delivery.insert(accepted.unwrap_or(order)))
    }

    /// Claim an order from the queue by id.
    ///
    /// # Errors
    ///
    /// `DeliveryError::NotAvailable` if the id is not in the queue, otherwise
    /// as [`Self::accept_order`].
    pub async fn accept_order_by_id(
        &mut self,
        order_id: &OrderId,
    ) -> Result<&DeliveryOrder, DeliveryError> {
        let order = self
            .available_orders
            .iter()
            .find(|o| o.id() == order_id)
            .cloned()
            .ok_or_else(|| DeliveryError::NotAvailable(order_id.clone()))?;
        self.accept_order(order).await
    }

    /// Move the active delivery one step along its lifecycle.
    ///
    /// # Errors
    ///
    /// `DeliveryError::NoActiveDelivery`, or `DeliveryError::Transition` if
    /// `status` is not the next step.
    pub fn set_active_delivery_status(&mut self, status: OrderStatus) -> Result<(), DeliveryError> {
        let delivery = self
            .active_delivery
            .as_mut()
            .ok_or(DeliveryError::NoActiveDelivery)?;
        let next = delivery.status().transition(status)?;
        delivery.order.set_status(next, Utc::now());
        Ok(())
    }

    /// Perform the primary action; delivering also completes the order.
    ///
    /// # Errors
    ///
    /// As [`Self::set_active_delivery_status`] and [`Self::complete_delivery`].
    pub async fn advance(&mut self) -> Result<OrderStatus, DeliveryError> {
        let status = self
            .active_delivery
            .as_ref()
            .ok_or(DeliveryError::NoActiveDelivery)?
            .status();
        let action = status
            .driver_action()
            .ok_or(DeliveryError::NoAction(status))?;

        match action {
            DriverAction::MarkDelivered => {
                self.complete_delivery().await?;
            }
            DriverAction::MarkPickedUp | DriverAction::StartNavigation => {
                self.set_active_delivery_status(action.target())?;
            }
        }
        Ok(action.target())
    }

    /// Tell the backend the active delivery is done, then credit it.
    ///
    /// On success the delivery's earnings are added to the counters, the
    /// active delivery is cleared and stats are re-fetched. On failure nothing
    /// changes.
    ///
    /// # Errors
    ///
    /// `DeliveryError::NoActiveDelivery`, or `DeliveryError::Api` if the
    /// backend does not confirm.
    #[instrument(skip(self))]
    pub async fn complete_delivery(&mut self) -> Result<(), DeliveryError> {
        let delivery = self
            .active_delivery
            .as_ref()
            .ok_or(DeliveryError::NoActiveDelivery)?;
        let order_id = delivery.id().clone();
        let earnings = delivery.earnings;

        if let Err(e) = self.backend.complete_order(&order_id).await {
            error!(order_id = %order_id, error = %e, "Failed to complete delivery");
            return Err(e.into());
        }

        self.stats.record_completion(earnings);
        self.active_delivery = None;
        self.route.reset();
        info!(order_id = %order_id, %earnings, "Delivery completed");

        self.load_stats().await;
        Ok(())
    }

    /// Record the driver's position.
    ///
    /// Pushes to the backend first; only then is the active delivery updated
    /// and, while on the way, the route preview refreshed.
    ///
    /// # Errors
    ///
    /// Returns `DeliveryError::Api` if the push fails; local state is unchanged.
    pub async fn update_driver_location(
        &mut self,
        latitude: f64,
        longitude: f64,
    ) -> Result<(), DeliveryError> {
        let location = LatLng::new(latitude, longitude);
        self.backend
            .push_location(&self.driver_id, location)
            .await?;

        let Some(delivery) = self.active_delivery.as_mut() else {
            return Ok(());
        };
        delivery.order.set_driver_location(location, Utc::now());

        if delivery.status() == OrderStatus::OnTheWay {
            let destination = delivery.delivery_location.coords();
            self.route.update(location, destination).await;
        } else if delivery.status().tracks_driver_location() {
            // Picked up but not yet navigating
            self.route.reset();
        }
        Ok(())
    }
}
