//! Shared group orders: one person opens a group, others join by invite code
//! and add their items, and the host finalizes it into a single order.

use bitebox_core::{CartEngine, CartItem, GroupOrderId, Order, RestaurantId, UserId};
use thiserror::Error;
use tracing::{info, instrument};

use crate::api::{GroupHandle, GroupItemRequest, OrderItemPayload, PlacePayload};
use crate::backend::{GroupBackend, OrderBackend};
use crate::error::ApiError;
use crate::stores::OrderStore;

/// Errors from [`GroupOrder`].
#[derive(Debug, Error)]
pub enum GroupOrderError {
    #[error("Create or join a group order first")]
    NoActiveGroup,

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// The current user's participation in a group order.
#[derive(Debug)]
pub struct GroupOrder<B> {
    backend: B,
    user_id: UserId,
    group_id: Option<GroupOrderId>,
    invite_code: Option<String>,
}

impl<B: GroupBackend> GroupOrder<B> {
    pub const fn new(backend: B, user_id: UserId) -> Self {
        Self {
            backend,
            user_id,
            group_id: None,
            invite_code: None,
        }
    }

    #[must_use]
    pub const fn group_id(&self) -> Option<&GroupOrderId> {
        self.group_id.as_ref()
    }

    /// Code to share with others; only known to the creator.
    #[must_use]
    pub fn invite_code(&self) -> Option<&str> {
        self.invite_code.as_deref()
    }

    /// Open a new group at `restaurant_id`.
    ///
    /// # Errors
    ///
    /// Returns `GroupOrderError::Api` if the backend refuses.
    #[instrument(skip(self), fields(user_id = %self.user_id))]
    pub async fn create(
        &mut self,
        restaurant_id: &RestaurantId,
    ) -> Result<GroupHandle, GroupOrderError> {
        let handle = self
            .backend
            .create_group(&self.user_id, restaurant_id)
            .await?;
        info!(group_id = %handle.group_id, "Group order created");
        self.group_id = Some(handle.group_id.clone());
        self.invite_code = Some(handle.invite_code.clone());
        Ok(handle)
    }

    /// Join someone else's group.
    ///
    /// # Errors
    ///
    /// Returns `GroupOrderError::Api` if the code is unknown or the request fails.
    #[instrument(skip(self), fields(user_id = %self.user_id))]
    pub async fn join(&mut self, invite_code: &str) -> Result<&GroupOrderId, GroupOrderError> {
        let group_id = self
            .backend
            .join_group(&self.user_id, invite_code.trim())
            .await?;
        info!(group_id = %group_id, "Joined group order");
        self.invite_code = None;
        Ok(self.group_id.insert(group_id))
    }

    /// Post each cart line to the group, in order.
    ///
    /// Stops at the first failure; earlier lines stay in the group.
    ///
    /// # Errors
    ///
    /// `GroupOrderError::NoActiveGroup` before create/join, otherwise
    /// `GroupOrderError::Api`.
    #[instrument(skip_all, fields(count = items.len()))]
    pub async fn add_items(&self, items: &[CartItem]) -> Result<(), GroupOrderError> {
        let group_id = self.group_id.as_ref().ok_or(GroupOrderError::NoActiveGroup)?;
        for item in items {
            let request = GroupItemRequest {
                group_id: group_id.clone(),
                user_id: self.user_id.clone(),
                item: OrderItemPayload::from(item),
            };
            self.backend.add_group_item(&request).await?;
        }
        Ok(())
    }

    /// Close the group into one order.
    ///
    /// The order is added to `orders` and the local cart cleared. The group
    /// is left afterwards.
    ///
    /// # Errors
    ///
    /// `GroupOrderError::NoActiveGroup` before create/join, otherwise
    /// `GroupOrderError::Api`; nothing local changes on failure.
    #[instrument(skip_all)]
    pub async fn finalize<O: OrderBackend>(
        &mut self,
        pickup: Option<&PlacePayload>,
        delivery: Option<&PlacePayload>,
        orders: &mut OrderStore<O>,
        cart: &mut CartEngine,
    ) -> Result<Order, GroupOrderError> {
        let group_id = self.group_id.as_ref().ok_or(GroupOrderError::NoActiveGroup)?;
        let order = self
            .backend
            .finalize_group(group_id, pickup, delivery)
            .await?;
        info!(group_id = %group_id, order_id = %order.id, "Group order finalized");

        orders.add_order(order.clone());
        cart.clear_cart();
        self.group_id = None;
        self.invite_code = None;
        Ok(order)
    }
}
