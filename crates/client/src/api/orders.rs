//! Order endpoints.

use bitebox_core::{Order, OrderId, UserId};
use reqwest::Method;
use tracing::instrument;

use super::conversions::{
    CreateOrderRequest, CreatedOrder, RawCreatedOrder, RawOrder, convert_order,
};
use super::{ApiClient, segment};
use crate::error::ApiError;

impl ApiClient {
    /// Place an order.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the backend rejects the order.
    #[instrument(skip(self, request), fields(restaurant_id = %request.restaurant_id, items = request.items.len()))]
    pub async fn create_order(&self, request: &CreateOrderRequest) -> Result<CreatedOrder, ApiError> {
        let body = serde_json::to_value(request)?;
        let raw: RawCreatedOrder = self.fetch(Method::POST, "/orders", Some(&body)).await?;
        Ok(raw.into())
    }

    /// One order.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn order(&self, id: &OrderId) -> Result<Order, ApiError> {
        let path = format!("/orders/{}", segment(id.as_str()));
        let raw: RawOrder = self.fetch(Method::GET, &path, None).await?;
        Ok(convert_order(raw))
    }

    /// Order history of `user_id`, newest first as the backend returns it.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn user_orders(&self, user_id: &UserId) -> Result<Vec<Order>, ApiError> {
        let path = format!("/orders/user/{}", segment(user_id.as_str()));
        let raw: Option<Vec<RawOrder>> = self.fetch_optional(Method::GET, &path, None).await?;
        Ok(raw
            .unwrap_or_default()
            .into_iter()
            .map(convert_order)
            .collect())
    }
}
