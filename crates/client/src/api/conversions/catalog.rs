//! Restaurant and menu conversion functions.

use bitebox_core::{
    MenuItem, MenuItemId, MenuOption, OptionGroup, OptionGroupId, OptionId, Restaurant,
    RestaurantId,
};
use rust_decimal::Decimal;
use serde::Deserialize;

use super::{de_id, de_opt_id, first_non_empty};

const DEFAULT_DELIVERY_TIME: &str = "20-30 min";
const DEFAULT_DELIVERY_FEE: i64 = 500;
const DEFAULT_DISTANCE_KM: f64 = 1.0;
const DEFAULT_CATEGORY: &str = "Menu";
const DEFAULT_PREPARATION_MINUTES: u32 = 20;
const PLACEHOLDER_ITEM_IMAGE: &str =
    "https://images.unsplash.com/photo-1526318472351-c75fcf070305?w=1200&auto=format&fit=crop&q=60";

/// A restaurant as returned by `GET /menu/restaurants`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRestaurant {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    pub name: String,
    pub image: Option<String>,
    pub image_url: Option<String>,
    pub rating: Option<f64>,
    pub review_count: Option<u32>,
    pub delivery_time: Option<String>,
    pub delivery_fee: Option<Decimal>,
    pub minimum_order: Option<Decimal>,
    pub address: Option<String>,
    pub cuisines: Option<Vec<String>>,
    pub categories: Option<Vec<String>>,
    pub is_open: Option<bool>,
    pub distance: Option<f64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Convert a raw restaurant, filling display defaults.
#[must_use]
pub fn convert_restaurant(raw: RawRestaurant) -> Restaurant {
    Restaurant {
        id: RestaurantId::new(raw.id),
        name: raw.name,
        image: first_non_empty([raw.image, raw.image_url]).unwrap_or_default(),
        rating: raw.rating.unwrap_or(0.0),
        review_count: raw.review_count.unwrap_or(0),
        delivery_time: raw
            .delivery_time
            .unwrap_or_else(|| DEFAULT_DELIVERY_TIME.to_string()),
        delivery_fee: raw
            .delivery_fee
            .unwrap_or_else(|| Decimal::from(DEFAULT_DELIVERY_FEE)),
        minimum_order: raw.minimum_order.unwrap_or_default(),
        address: raw.address.filter(|a| !a.trim().is_empty()),
        cuisines: raw.cuisines.or(raw.categories).unwrap_or_default(),
        is_open: raw.is_open.unwrap_or(true),
        distance: raw.distance.unwrap_or(DEFAULT_DISTANCE_KM),
        latitude: raw.latitude.unwrap_or(0.0),
        longitude: raw.longitude.unwrap_or(0.0),
    }
}

/// A menu item as returned by `GET /menu/restaurants/:id/items`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMenuItem {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    #[serde(default, deserialize_with = "de_opt_id")]
    pub restaurant_id: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub image_url: Option<String>,
    pub price: Decimal,
    pub category: Option<String>,
    pub options: Option<RawMenuOptions>,
}

/// Nested option lists of a raw menu item.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMenuOptions {
    pub sizes: Option<Vec<RawOption>>,
    pub add_ons: Option<Vec<RawOption>>,
    pub extras: Option<Vec<RawOption>>,
}

/// One choice inside [`RawMenuOptions`].
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawOption {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    pub name: String,
    pub price_delta: Option<Decimal>,
}

/// Convert a raw menu item listed under `restaurant_id`.
///
/// Sizes become a required single-select `size` group; add-ons and extras
/// become optional `addon`/`extra` groups allowing every option.
#[must_use]
pub fn convert_menu_item(raw: RawMenuItem, restaurant_id: &RestaurantId) -> MenuItem {
    let RawMenuOptions {
        sizes,
        add_ons,
        extras,
    } = raw.options.unwrap_or_default();

    let option_groups = [
        option_group("size", "Size", true, Some(1), sizes),
        option_group("addon", "Add-ons", false, None, add_ons),
        option_group("extra", "Extras", false, None, extras),
    ]
    .into_iter()
    .flatten()
    .collect();

    MenuItem {
        id: MenuItemId::new(raw.id),
        restaurant_id: raw
            .restaurant_id
            .map_or_else(|| restaurant_id.clone(), RestaurantId::new),
        name: raw.name,
        description: raw.description.unwrap_or_default(),
        image: first_non_empty([raw.image, raw.image_url])
            .unwrap_or_else(|| PLACEHOLDER_ITEM_IMAGE.to_string()),
        price: raw.price,
        category: raw
            .category
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
        is_available: true,
        option_groups,
        preparation_time: DEFAULT_PREPARATION_MINUTES,
    }
}

fn option_group(
    id: &str,
    name: &str,
    required: bool,
    max_selection: Option<u32>,
    options: Option<Vec<RawOption>>,
) -> Option<OptionGroup> {
    let options = options.unwrap_or_default();
    if options.is_empty() {
        return None;
    }
    let max_selection =
        max_selection.unwrap_or_else(|| u32::try_from(options.len()).unwrap_or(u32::MAX));
    Some(OptionGroup {
        id: OptionGroupId::new(id),
        name: name.to_string(),
        required,
        max_selection,
        options: options
            .into_iter()
            .map(|o| MenuOption {
                id: OptionId::new(o.id),
                name: o.name,
                price: o.price_delta.unwrap_or_default(),
            })
            .collect(),
    })
}
