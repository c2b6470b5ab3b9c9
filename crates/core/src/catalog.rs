//! Restaurants, menus, and menu option selection.
//!
//! Catalog records are read-only snapshots of what the backend returned.
//! The only client-side rules here are how option groups constrain a
//! customer's choices and how those choices price a line.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{LatLng, MenuItemId, OptionGroupId, OptionId, RestaurantId};

/// A restaurant as listed in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Restaurant {
    pub id: RestaurantId,
    pub name: String,
    /// Cover image URL (may be empty).
    pub image: String,
    pub rating: f64,
    pub review_count: u32,
    /// Human-readable estimate, e.g. `"20-30 min"`.
    pub delivery_time: String,
    pub delivery_fee: Decimal,
    pub minimum_order: Decimal,
    /// Street address used as the pickup point, when known.
    pub address: Option<String>,
    pub cuisines: Vec<String>,
    pub is_open: bool,
    /// Distance from the customer in kilometers.
    pub distance: f64,
    pub latitude: f64,
    pub longitude: f64,
}

impl Restaurant {
    /// Location of the restaurant.
    #[must_use]
    pub const fn location(&self) -> LatLng {
        LatLng::new(self.latitude, self.longitude)
    }

    /// Case-insensitive match on name or any cuisine.
    #[must_use]
    pub fn matches(&self, query: &str) -> bool {
        let q = query.to_lowercase();
        self.name.to_lowercase().contains(&q)
            || self.cuisines.iter().any(|c| c.to_lowercase().contains(&q))
    }
}

/// One choosable option, e.g. "Large" or "Extra cheese".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuOption {
    pub id: OptionId,
    pub name: String,
    /// Amount added to the item's base price.
    pub price: Decimal,
}

/// A named set of related options with a selection bound.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionGroup {
    pub id: OptionGroupId,
    pub name: String,
    pub required: bool,
    /// `1` means single-select; anything larger is a multi-select bound.
    pub max_selection: u32,
    pub options: Vec<MenuOption>,
}

impl OptionGroup {
    /// Whether choosing a new option replaces the previous one.
    #[must_use]
    pub const fn is_single_select(&self) -> bool {
        self.max_selection == 1
    }

    /// Look up an option by ID.
    #[must_use]
    pub fn option(&self, id: &OptionId) -> Option<&MenuOption> {
        self.options.iter().find(|o| &o.id == id)
    }
}

/// A dish on a restaurant's menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    pub id: MenuItemId,
    pub restaurant_id: RestaurantId,
    pub name: String,
    pub description: String,
    pub image: String,
    /// Base price before options.
    pub price: Decimal,
    pub category: String,
    pub is_available: bool,
    /// Empty when the item has no options.
    #[serde(default)]
    pub option_groups: Vec<OptionGroup>,
    /// Minutes.
    pub preparation_time: u32,
}

impl MenuItem {
    /// Look up an option group by ID.
    #[must_use]
    pub fn group(&self, id: &OptionGroupId) -> Option<&OptionGroup> {
        self.option_groups.iter().find(|g| &g.id == id)
    }

    /// Base price plus the price of every selected option.
    ///
    /// Selections that do not resolve against this item's groups contribute
    /// nothing.
    #[must_use]
    pub fn unit_price(&self, selected: &[SelectedOption]) -> Decimal {
        selected
            .iter()
            .filter_map(|s| self.group(&s.group_id)?.option(&s.option_id))
            .map(|o| o.price)
            .fold(self.price, |acc, p| acc + p)
    }
}

/// A `(group, option)` pair chosen for a cart line.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedOption {
    pub group_id: OptionGroupId,
    pub option_id: OptionId,
}

impl SelectedOption {
    /// Create a selection.
    #[must_use]
    pub fn new(group_id: impl Into<OptionGroupId>, option_id: impl Into<OptionId>) -> Self {
        Self {
            group_id: group_id.into(),
            option_id: option_id.into(),
        }
    }
}

/// The options a customer has picked for one menu item, kept within each
/// group's bounds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptionSelection {
    selected: Vec<SelectedOption>,
}

impl OptionSelection {
    /// An empty selection.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            selected: Vec::new(),
        }
    }

    /// Toggle `option` in `group` for `item`. Returns whether anything changed.
    ///
    /// - Single-select groups: the new option replaces any previous choice.
    /// - Multi-select groups: re-selecting deselects; selecting past
    ///   `max_selection` does nothing.
    /// - Unknown groups or options are ignored.
    pub fn toggle(&mut self, item: &MenuItem, group: &OptionGroupId, option: &OptionId) -> bool {
        let Some(group) = item.group(group) else {
            return false;
        };
        if group.option(option).is_none() {
            return false;
        }

        if group.is_single_select() {
            if self.is_selected(&group.id, option) {
                return false;
            }
            self.selected.retain(|s| s.group_id != group.id);
            self.selected
                .push(SelectedOption::new(group.id.clone(), option.clone()));
            return true;
        }

        if self.is_selected(&group.id, option) {
            self.selected
                .retain(|s| !(s.group_id == group.id && &s.option_id == option));
            return true;
        }

        let in_group = self.count_in_group(&group.id);
        if u32::try_from(in_group).unwrap_or(u32::MAX) >= group.max_selection {
            return false;
        }
        self.selected
            .push(SelectedOption::new(group.id.clone(), option.clone()));
        true
    }

    /// Whether `option` in `group` is currently selected.
    #[must_use]
    pub fn is_selected(&self, group: &OptionGroupId, option: &OptionId) -> bool {
        self.selected
            .iter()
            .any(|s| &s.group_id == group && &s.option_id == option)
    }

    /// Number of selections in `group`.
    #[must_use]
    pub fn count_in_group(&self, group: &OptionGroupId) -> usize {
        self.selected.iter().filter(|s| &s.group_id == group).count()
    }

    /// Required groups of `item` that have nothing selected.
    #[must_use]
    pub fn missing_required<'a>(&self, item: &'a MenuItem) -> Vec<&'a OptionGroup> {
        item.option_groups
            .iter()
            .filter(|g| g.required && self.count_in_group(&g.id) == 0)
            .collect()
    }

    /// Selections in the order they were made.
    #[must_use]
    pub fn as_slice(&self) -> &[SelectedOption] {
        &self.selected
    }

    /// Consume into the list of selections.
    #[must_use]
    pub fn into_vec(self) -> Vec<SelectedOption> {
        self.selected
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub fn option(id: &str, price: i64) -> MenuOption {
        MenuOption {
            id: OptionId::new(id),
            name: id.to_uppercase(),
            price: Decimal::from(price),
        }
    }

    pub fn jollof() -> MenuItem {
        MenuItem {
            id: MenuItemId::new("item_jollof"),
            restaurant_id: RestaurantId::new("rest_mama"),
            name: "Jollof Rice".to_string(),
            description: "Smoky party jollof".to_string(),
            image: String::new(),
            price: Decimal::from(2000),
            category: "Mains".to_string(),
            is_available: true,
            option_groups: vec![
                OptionGroup {
                    id: OptionGroupId::new("size"),
                    name: "Size".to_string(),
                    required: true,
                    max_selection: 1,
                    options: vec![option("regular", 0), option("large", 500)],
                },
                OptionGroup {
                    id: OptionGroupId::new("addon"),
                    name: "Add-ons".to_string(),
                    required: false,
                    max_selection: 2,
                    options: vec![
                        option("plantain", 300),
                        option("chicken", 1200),
                        option("egg", 200),
                    ],
                },
            ],
            preparation_time: 20,
        }
    }

    fn ids(group: &str, opt: &str) -> (OptionGroupId, OptionId) {
        (OptionGroupId::new(group), OptionId::new(opt))
    }

    #[test]
    fn test_unit_price_adds_matched_options() {
        let item = jollof();
        let selected = vec![
            SelectedOption::new("size", "large"),
            SelectedOption::new("addon", "chicken"),
        ];
        assert_eq!(item.unit_price(&selected), Decimal::from(3700));
    }

    #[test]
    fn test_unit_price_ignores_unknown_ids() {
        let item = jollof();
        let selected = vec![
            SelectedOption::new("sauce", "pepper"),
            SelectedOption::new("size", "jumbo"),
        ];
        assert_eq!(item.unit_price(&selected), Decimal::from(2000));
    }

    #[test]
    fn test_single_select_replaces_previous_choice() {
        let item = jollof();
        let mut sel = OptionSelection::new();
        let (g, regular) = ids("size", "regular");
        let (_, large) = ids("size", "large");

        assert!(sel.toggle(&item, &g, &regular));
        assert!(sel.toggle(&item, &g, &large));
        assert_eq!(sel.count_in_group(&g), 1);
        assert!(sel.is_selected(&g, &large));
        assert!(!sel.is_selected(&g, &regular));

        // Picking the same option again keeps exactly one selection.
        assert!(!sel.toggle(&item, &g, &large));
        assert_eq!(sel.count_in_group(&g), 1);
    }

    #[test]
    fn test_multi_select_is_bounded_and_reselect_deselects() {
        let item = jollof();
        let mut sel = OptionSelection::new();
        let (g, plantain) = ids("addon", "plantain");
        let (_, chicken) = ids("addon", "chicken");
        let (_, egg) = ids("addon", "egg");

        assert!(sel.toggle(&item, &g, &plantain));
        assert!(sel.toggle(&item, &g, &chicken));
        assert!(!sel.toggle(&item, &g, &egg), "third add-on exceeds the bound");
        assert_eq!(sel.count_in_group(&g), 2);

        assert!(sel.toggle(&item, &g, &plantain));
        assert!(!sel.is_selected(&g, &plantain));
        assert!(sel.toggle(&item, &g, &egg));
        assert_eq!(sel.count_in_group(&g), 2);
    }

    #[test]
    fn test_unknown_group_or_option_is_ignored() {
        let item = jollof();
        let mut sel = OptionSelection::new();
        let (g, o) = ids("drinks", "coke");
        assert!(!sel.toggle(&item, &g, &o));
        let (g, o) = ids("size", "family");
        assert!(!sel.toggle(&item, &g, &o));
        assert!(sel.as_slice().is_empty());
    }

    #[test]
    fn test_missing_required_groups() {
        let item = jollof();
        let mut sel = OptionSelection::new();
        let missing: Vec<_> = sel.missing_required(&item).iter().map(|g| g.name.clone()).collect();
        assert_eq!(missing, vec!["Size".to_string()]);

        let (g, o) = ids("size", "regular");
        sel.toggle(&item, &g, &o);
        assert!(sel.missing_required(&item).is_empty());
    }

    #[test]
    fn test_restaurant_search_matches_name_or_cuisine() {
        let restaurant = Restaurant {
            id: RestaurantId::new("rest_mama"),
            name: "Mama Put".to_string(),
            image: String::new(),
            rating: 4.6,
            review_count: 120,
            delivery_time: "20-30 min".to_string(),
            delivery_fee: Decimal::from(500),
            minimum_order: Decimal::ZERO,
            address: None,
            cuisines: vec!["Nigerian".to_string(), "Grill".to_string()],
            is_open: true,
            distance: 1.2,
            latitude: 6.5,
            longitude: 3.4,
        };
        assert!(restaurant.matches("mama"));
        assert!(restaurant.matches("GRILL"));
        assert!(!restaurant.matches("sushi"));
    }
}
