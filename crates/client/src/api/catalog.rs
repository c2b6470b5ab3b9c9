//! Restaurant, menu and health endpoints.

use std::sync::Arc;

use bitebox_core::{MenuItem, MenuItemId, Restaurant, RestaurantId};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::cache::{CacheKey, CacheValue};
use super::conversions::{RawMenuItem, RawRestaurant, convert_menu_item, convert_restaurant};
use super::{ApiClient, segment};
use crate::error::ApiError;

/// Response of `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub ok: bool,
    #[serde(default)]
    pub env: String,
}

impl ApiClient {
    /// Check the backend is up.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the backend is unreachable.
    #[instrument(skip(self))]
    pub async fn health(&self) -> Result<HealthStatus, ApiError> {
        self.fetch(Method::GET, "/health", None).await
    }

    /// All restaurants.
    ///
    /// Results are cached for the configured catalog TTL.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails or an entry lacks an id or name.
    #[instrument(skip(self))]
    pub async fn restaurants(&self) -> Result<Arc<Vec<Restaurant>>, ApiError> {
        if let Some(CacheValue::Restaurants(list)) =
            self.inner.cache.get(&CacheKey::Restaurants).await
        {
            debug!("Cache hit for restaurants");
            return Ok(list);
        }

        let raw: Vec<RawRestaurant> = self
            .fetch(Method::GET, "/menu/restaurants", None)
            .await?;
        let list = Arc::new(raw.into_iter().map(convert_restaurant).collect::<Vec<_>>());

        self.inner
            .cache
            .insert(CacheKey::Restaurants, CacheValue::Restaurants(list.clone()))
            .await;
        Ok(list)
    }

    /// One restaurant, resolved from the list.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound("Restaurant")` if no restaurant has `id`.
    pub async fn restaurant(&self, id: &RestaurantId) -> Result<Restaurant, ApiError> {
        self.restaurants()
            .await?
            .iter()
            .find(|r| &r.id == id)
            .cloned()
            .ok_or(ApiError::NotFound("Restaurant"))
    }

    /// Restaurants whose name or any cuisine contains `query`, ignoring case.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the restaurant list cannot be fetched.
    pub async fn search_restaurants(&self, query: &str) -> Result<Vec<Restaurant>, ApiError> {
        Ok(self
            .restaurants()
            .await?
            .iter()
            .filter(|r| r.matches(query))
            .cloned()
            .collect())
    }

    /// Menu of one restaurant.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self), fields(restaurant_id = %restaurant_id))]
    pub async fn menu(&self, restaurant_id: &RestaurantId) -> Result<Arc<Vec<MenuItem>>, ApiError> {
        let key = CacheKey::Menu(restaurant_id.clone());
        if let Some(CacheValue::Menu(items)) = self.inner.cache.get(&key).await {
            debug!("Cache hit for menu");
            return Ok(items);
        }

        let path = format!("/menu/restaurants/{}/items", segment(restaurant_id.as_str()));
        let raw: Vec<RawMenuItem> = self.fetch(Method::GET, &path, None).await?;
        let items = Arc::new(
            raw.into_iter()
                .map(|item| convert_menu_item(item, restaurant_id))
                .collect::<Vec<_>>(),
        );

        self.inner
            .cache
            .insert(key, CacheValue::Menu(items.clone()))
            .await;
        Ok(items)
    }

    /// Find a menu item by scanning every restaurant's menu.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound("Menu item")` if no menu contains `id`.
    pub async fn menu_item(&self, id: &MenuItemId) -> Result<MenuItem, ApiError> {
        for restaurant in self.restaurants().await?.iter() {
            if let Some(item) = self.menu(&restaurant.id).await?.iter().find(|i| &i.id == id) {
                return Ok(item.clone());
            }
        }
        Err(ApiError::NotFound("Menu item"))
    }
}
