//! Group ordering endpoints.

use bitebox_core::{GroupOrderId, Order, RestaurantId, UserId};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::instrument;

use super::ApiClient;
use super::conversions::{OrderItemPayload, PlacePayload, RawOrder, convert_order, de_id};
use crate::error::ApiError;

/// A group order that others can join with `invite_code`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupHandle {
    pub group_id: GroupOrderId,
    pub invite_code: String,
}

/// Body of `POST /group/add-item`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupItemRequest {
    pub group_id: GroupOrderId,
    pub user_id: UserId,
    #[serde(flatten)]
    pub item: OrderItemPayload,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawGroup {
    #[serde(deserialize_with = "de_id")]
    id: String,
    #[serde(default)]
    invite_code: String,
}

#[derive(Debug, Deserialize)]
struct RawFinalized {
    order: RawOrder,
}

impl ApiClient {
    /// Open a group order at `restaurant_id`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self), fields(user_id = %user_id, restaurant_id = %restaurant_id))]
    pub async fn create_group(
        &self,
        user_id: &UserId,
        restaurant_id: &RestaurantId,
    ) -> Result<GroupHandle, ApiError> {
        let body = json!({
            "userId": user_id,
            "restaurantId": restaurant_id,
            "type": "delivery",
        });
        let raw: RawGroup = self
            .fetch(Method::POST, "/group/create", Some(&body))
            .await?;
        Ok(GroupHandle {
            group_id: GroupOrderId::new(raw.id),
            invite_code: raw.invite_code,
        })
    }

    /// Join a group order by invite code.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the code is unknown.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn join_group(
        &self,
        user_id: &UserId,
        invite_code: &str,
    ) -> Result<GroupOrderId, ApiError> {
        let body = json!({ "userId": user_id, "inviteCode": invite_code });
        let raw: RawGroup = self.fetch(Method::POST, "/group/join", Some(&body)).await?;
        Ok(GroupOrderId::new(raw.id))
    }

    /// Add one line to a group order.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self, request), fields(group_id = %request.group_id, item_id = %request.item.item_id))]
    pub async fn add_group_item(&self, request: &GroupItemRequest) -> Result<(), ApiError> {
        let body = serde_json::to_value(request)?;
        self.send(Method::POST, "/group/add-item", Some(&body))
            .await
            .map(|_| ())
    }

    /// Close a group order and turn it into a single order.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self, pickup, delivery), fields(group_id = %group_id))]
    pub async fn finalize_group(
        &self,
        group_id: &GroupOrderId,
        pickup: Option<&PlacePayload>,
        delivery: Option<&PlacePayload>,
    ) -> Result<Order, ApiError> {
        let body = json!({
            "groupId": group_id,
            "pickupAddress": pickup,
            "deliveryAddress": delivery,
        });
        let raw: RawFinalized = self
            .fetch(Method::POST, "/group/finalize", Some(&body))
            .await?;
        Ok(convert_order(raw.order))
    }
}
