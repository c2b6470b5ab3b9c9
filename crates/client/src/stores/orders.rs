//! Customer order history and the order being tracked.

use bitebox_core::{Order, OrderId, OrderStatus, UserId};
use chrono::Utc;
use tracing::{debug, instrument, warn};

use crate::backend::OrderBackend;
use crate::error::ApiError;

/// The customer's orders and the one shown on the tracking screen.
///
/// The active order is a copy of a list entry when both exist; every status
/// change is applied to both so they never disagree.
#[derive(Debug)]
pub struct OrderStore<B> {
    backend: B,
    orders: Vec<Order>,
    active_order: Option<Order>,
    is_loading: bool,
    error: Option<String>,
}

impl<B: OrderBackend> OrderStore<B> {
    /// Create an empty store.
    pub const fn new(backend: B) -> Self {
        Self {
            backend,
            orders: Vec::new(),
            active_order: None,
            is_loading: false,
            error: None,
        }
    }

    /// Orders, newest first.
    #[must_use]
    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    /// Order shown on the tracking screen.
    #[must_use]
    pub const fn active_order(&self) -> Option<&Order> {
        self.active_order.as_ref()
    }

    /// Whether [`Self::load_orders`] is in progress.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.is_loading
    }

    /// Message from the last failed load.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Record a freshly placed order and start tracking it.
    pub fn add_order(&mut self, order: Order) {
        self.orders.insert(0, order.clone());
        self.active_order = Some(order);
    }

    /// Set the status of `order_id` in the list and, if it is the one being
    /// tracked, on the active order. Returns whether any copy was updated.
    pub fn update_order_status(&mut self, order_id: &OrderId, status: OrderStatus) -> bool {
        let now = Utc::now();
        let mut updated = false;
        for order in self.orders.iter_mut().filter(|o| &o.id == order_id) {
            order.set_status(status, now);
            updated = true;
        }
        if let Some(active) = self.active_order.as_mut().filter(|o| &o.id == order_id) {
            active.set_status(status, now);
            updated = true;
        }
        if !updated {
            debug!(order_id = %order_id, "Status update for unknown order");
        }
        updated
    }

    /// Choose the order shown on the tracking screen.
    pub fn set_active_order(&mut self, order: Option<Order>) {
        self.active_order = order;
    }

    /// Replace the list with `user_id`'s history.
    ///
    /// Failures are stored in [`Self::error`] rather than returned.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn load_orders(&mut self, user_id: &UserId) {
        self.is_loading = true;
        self.error = None;
        match self.backend.user_orders(user_id).await {
            Ok(orders) => self.orders = orders,
            Err(e) => {
                warn!(error = %e, "Failed to load orders");
                self.error = Some(e.to_string());
            }
        }
        self.is_loading = false;
    }

    /// Fetch an order by id and start tracking it.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the order cannot be fetched.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn open_order(&mut self, order_id: &OrderId) -> Result<&Order, ApiError> {
        let order = self.backend.order(order_id).await?;
        Ok(self.active_order.insert(order))
    }

    /// Re-fetch an order and apply its current status and driver position.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the order cannot be fetched.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn refresh_order(&mut self, order_id: &OrderId) -> Result<OrderStatus, ApiError> {
        let fresh = self.backend.order(order_id).await?;
        self.update_order_status(order_id, fresh.status);

        if let Some(location) = fresh.driver_location {
            let now = Utc::now();
            self.orders
                .iter_mut()
                .chain(self.active_order.as_mut())
                .filter(|o| &o.id == order_id)
                .for_each(|o| o.set_driver_location(location, now));
        }
        Ok(fresh.status)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use bitebox_core::{LatLng, OrderType, RestaurantId, Totals};
    use chrono::{TimeZone, Utc};

    use super::*;

    fn order(id: &str, status: OrderStatus) -> Order {
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        Order {
            id: OrderId::new(id),
            order_number: id.to_string(),
            customer_id: UserId::new("u1"),
            customer: None,
            restaurant_id: RestaurantId::new("r1"),
            restaurant: None,
            items: Vec::new(),
            totals: Totals::default(),
            status,
            order_type: OrderType::Delivery,
            delivery_address: None,
            pickup_address: None,
            scheduled_for: None,
            created_at: at,
            updated_at: at,
            driver_id: None,
            driver: None,
            estimated_delivery_time: None,
            driver_location: None,
        }
    }

    #[derive(Default)]
    struct FakeOrders {
        by_id: Mutex<HashMap<String, Order>>,
        fail: bool,
    }

    impl OrderBackend for FakeOrders {
        async fn user_orders(&self, _user_id: &UserId) -> Result<Vec<Order>, ApiError> {
            if self.fail {
                return Err(ApiError::Http {
                    status: 500,
                    body: "boom".to_string(),
                });
            }
            Ok(self.by_id.lock().unwrap().values().cloned().collect())
        }

        async fn order(&self, id: &OrderId) -> Result<Order, ApiError> {
            self.by_id
                .lock()
                .unwrap()
                .get(id.as_str())
                .cloned()
                .ok_or(ApiError::Http {
                    status: 404,
                    body: "not found".to_string(),
                })
        }
    }

    #[test]
    fn test_add_order_prepends_and_activates() {
        let mut store = OrderStore::new(FakeOrders::default());
        store.add_order(order("o1", OrderStatus::Pending));
        store.add_order(order("o2", OrderStatus::Pending));
        let ids: Vec<&str> = store.orders().iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["o2", "o1"]);
        assert_eq!(store.active_order().unwrap().id.as_str(), "o2");
    }

    #[test]
    fn test_status_update_keeps_copies_in_sync() {
        let mut store = OrderStore::new(FakeOrders::default());
        store.add_order(order("o1", OrderStatus::Pending));

        assert!(store.update_order_status(&OrderId::new("o1"), OrderStatus::Preparing));
        let listed = store.orders().first().unwrap();
        let active = store.active_order().unwrap();
        assert_eq!(listed.status, OrderStatus::Preparing);
        assert_eq!(listed.status, active.status);
        assert_eq!(listed.updated_at, active.updated_at);
        assert!(listed.updated_at > listed.created_at);
    }

    #[test]
    fn test_status_update_leaves_other_active_order_alone() {
        let mut store = OrderStore::new(FakeOrders::default());
        store.add_order(order("o1", OrderStatus::Pending));
        store.set_active_order(Some(order("o9", OrderStatus::Confirmed)));

        store.update_order_status(&OrderId::new("o1"), OrderStatus::Cancelled);
        assert_eq!(store.active_order().unwrap().status, OrderStatus::Confirmed);
        assert!(!store.update_order_status(&OrderId::new("missing"), OrderStatus::Delivered));
    }

    #[tokio::test]
    async fn test_load_failure_is_stored_not_returned() {
        let mut store = OrderStore::new(FakeOrders {
            fail: true,
            ..FakeOrders::default()
        });
        store.load_orders(&UserId::new("u1")).await;
        assert!(!store.is_loading());
        assert_eq!(store.error(), Some("HTTP 500: boom"));
    }

    #[tokio::test]
    async fn test_open_and_refresh_order() {
        let backend = FakeOrders::default();
        backend
            .by_id
            .lock()
            .unwrap()
            .insert("o1".to_string(), order("o1", OrderStatus::Confirmed));
        let mut store = OrderStore::new(backend);

        store.load_orders(&UserId::new("u1")).await;
        assert_eq!(store.orders().len(), 1);
        assert!(store.error().is_none());

        store.open_order(&OrderId::new("o1")).await.unwrap();
        assert_eq!(store.active_order().unwrap().status, OrderStatus::Confirmed);

        {
            let mut by_id = store.backend.by_id.lock().unwrap();
            let remote = by_id.get_mut("o1").unwrap();
            remote.status = OrderStatus::OnTheWay;
            remote.driver_location = Some(LatLng::new(6.45, 3.43));
        }
        let status = store.refresh_order(&OrderId::new("o1")).await.unwrap();
        assert_eq!(status, OrderStatus::OnTheWay);
        assert_eq!(store.orders().first().unwrap().status, OrderStatus::OnTheWay);
        assert_eq!(
            store.active_order().unwrap().driver_location,
            Some(LatLng::new(6.45, 3.43))
        );

        assert!(store.open_order(&OrderId::new("nope")).await.is_err());
    }
}
