//! Cache types for catalog responses.

use std::sync::Arc;

use bitebox_core::{MenuItem, Restaurant, RestaurantId};

/// Cache key for restaurant lists and menus.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Restaurants,
    Menu(RestaurantId),
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Restaurants(Arc<Vec<Restaurant>>),
    Menu(Arc<Vec<MenuItem>>),
}
