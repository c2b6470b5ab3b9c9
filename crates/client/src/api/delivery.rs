//! Driver endpoints.

use bitebox_core::{DeliveryOrder, DeliveryStats, LatLng, OrderId, UserId};
use reqwest::Method;
use serde_json::{Value, json};
use tracing::instrument;

use super::conversions::{RawDeliveryOrder, convert_delivery_order, lenient};
use super::{ApiClient, segment};
use crate::error::ApiError;

impl ApiClient {
    /// Orders waiting for a driver.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self))]
    pub async fn delivery_queue(&self) -> Result<Vec<DeliveryOrder>, ApiError> {
        let raw: Option<Vec<RawDeliveryOrder>> = self
            .fetch_optional(Method::GET, "/delivery/queue", None)
            .await?;
        Ok(raw
            .unwrap_or_default()
            .into_iter()
            .map(convert_delivery_order)
            .collect())
    }

    /// Claim an order for `driver_id`.
    ///
    /// Returns the backend's view of the accepted order when it sends one. An
    /// acknowledgement that is not an order yields `None`; the claim still
    /// stands.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the backend refuses the claim.
    #[instrument(skip(self), fields(driver_id = %driver_id, order_id = %order_id))]
    pub async fn accept_delivery(
        &self,
        driver_id: &UserId,
        order_id: &OrderId,
    ) -> Result<Option<DeliveryOrder>, ApiError> {
        let body = json!({ "driverId": driver_id, "orderId": order_id });
        let raw: Option<Value> = self
            .fetch_optional(Method::POST, "/delivery/accept", Some(&body))
            .await?;
        Ok(lenient::<RawDeliveryOrder>(raw, "accepted order").map(convert_delivery_order))
    }

    /// Report the driver's position.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self), fields(driver_id = %driver_id))]
    pub async fn push_driver_location(
        &self,
        driver_id: &UserId,
        location: LatLng,
    ) -> Result<(), ApiError> {
        let body = json!({
            "driverId": driver_id,
            "lat": location.latitude,
            "lng": location.longitude,
        });
        self.send(Method::POST, "/delivery/location", Some(&body))
            .await
            .map(|_| ())
    }

    /// Delivery counters and earnings of `driver_id`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self), fields(driver_id = %driver_id))]
    pub async fn delivery_stats(&self, driver_id: &UserId) -> Result<DeliveryStats, ApiError> {
        let path = format!("/delivery/stats/{}", segment(driver_id.as_str()));
        self.fetch(Method::GET, &path, None).await
    }

    /// Mark an order delivered.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the backend does not confirm.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn complete_delivery(&self, order_id: &OrderId) -> Result<(), ApiError> {
        let path = format!("/delivery/complete/{}", segment(order_id.as_str()));
        self.send(Method::POST, &path, None).await.map(|_| ())
    }
}
