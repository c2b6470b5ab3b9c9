//! The single active shopping cart.
//!
//! A cart only ever holds items from one restaurant. Every mutation
//! recomputes subtotal, tax and total from scratch, and removing the last
//! line drops the cart entirely: there is no such thing as an empty cart
//! object, only "no cart".

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::catalog::{MenuItem, Restaurant, SelectedOption};
use crate::types::{CartItemId, RestaurantId, TaxRate, Totals};

/// One line in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub id: CartItemId,
    pub menu_item: MenuItem,
    pub quantity: u32,
    pub selected_options: Vec<SelectedOption>,
    pub special_instructions: Option<String>,
    /// Unit price frozen when the line was added.
    pub price: Decimal,
}

impl CartItem {
    /// `price * quantity`.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }

    /// Display names of the selected options, in selection order.
    #[must_use]
    pub fn option_names(&self) -> Vec<&str> {
        self.selected_options
            .iter()
            .filter_map(|s| {
                self.menu_item
                    .group(&s.group_id)?
                    .option(&s.option_id)
                    .map(|o| o.name.as_str())
            })
            .collect()
    }
}

/// A non-empty cart for a single restaurant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub restaurant_id: RestaurantId,
    pub restaurant: Restaurant,
    pub items: Vec<CartItem>,
    #[serde(flatten)]
    pub totals: Totals,
}

impl Cart {
    /// Sum of line totals.
    #[must_use]
    pub const fn subtotal(&self) -> Decimal {
        self.totals.subtotal
    }

    /// Restaurant delivery fee.
    #[must_use]
    pub const fn delivery_fee(&self) -> Decimal {
        self.totals.delivery_fee
    }

    /// Tax on the subtotal.
    #[must_use]
    pub const fn tax(&self) -> Decimal {
        self.totals.tax
    }

    /// Amount payable.
    #[must_use]
    pub const fn total(&self) -> Decimal {
        self.totals.total
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// Find a line by ID.
    #[must_use]
    pub fn item(&self, id: &CartItemId) -> Option<&CartItem> {
        self.items.iter().find(|i| &i.id == id)
    }

    /// Whether the restaurant's minimum order is met.
    #[must_use]
    pub fn meets_minimum_order(&self) -> bool {
        self.totals.subtotal >= self.restaurant.minimum_order
    }

    fn recompute(&mut self, rate: TaxRate) {
        self.totals = Totals::compute(
            self.items.iter().map(|i| (i.price, i.quantity)),
            self.totals.delivery_fee,
            rate,
        );
    }
}

/// What `add_item` did to the cart.
#[derive(Debug, Clone, PartialEq)]
pub enum AddOutcome {
    /// Appended to the existing cart.
    Added(CartItemId),
    /// There was no cart; a new one was started.
    Started(CartItemId),
    /// The existing cart belonged to another restaurant and was discarded.
    Replaced {
        /// The new line.
        item_id: CartItemId,
        /// The cart that was thrown away.
        discarded: Box<Cart>,
    },
    /// Quantity was zero; nothing changed.
    Ignored,
}

impl AddOutcome {
    /// ID of the new line, if one was added.
    #[must_use]
    pub const fn item_id(&self) -> Option<&CartItemId> {
        match self {
            Self::Added(id) | Self::Started(id) | Self::Replaced { item_id: id, .. } => Some(id),
            Self::Ignored => None,
        }
    }
}

/// Errors from the rejecting variant of `add_item`.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CartError {
    /// The item belongs to a different restaurant than the current cart.
    #[error("your cart has items from {current_name}; clear it before ordering from another restaurant")]
    DifferentRestaurant {
        /// Restaurant the cart belongs to.
        current: RestaurantId,
        /// Its display name.
        current_name: String,
        /// Restaurant of the rejected item.
        requested: RestaurantId,
    },
}

/// Owner of the active cart.
#[derive(Debug, Clone, Default)]
pub struct CartEngine {
    cart: Option<Cart>,
    tax_rate: TaxRate,
}

impl CartEngine {
    /// Create an engine with no cart.
    #[must_use]
    pub const fn new(tax_rate: TaxRate) -> Self {
        Self {
            cart: None,
            tax_rate,
        }
    }

    /// Unit price of `menu_item` with `selected_options`.
    #[must_use]
    pub fn compute_item_price(menu_item: &MenuItem, selected_options: &[SelectedOption]) -> Decimal {
        menu_item.unit_price(selected_options)
    }

    /// The active cart, or `None` when empty.
    #[must_use]
    pub const fn cart(&self) -> Option<&Cart> {
        self.cart.as_ref()
    }

    /// Whether there is nothing in the cart.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.cart.is_none()
    }

    /// Rate applied to the subtotal.
    #[must_use]
    pub const fn tax_rate(&self) -> TaxRate {
        self.tax_rate
    }

    /// Add a line. A cart for a different restaurant is replaced and handed
    /// back in [`AddOutcome::Replaced`] so the caller can warn or undo.
    pub fn add_item(
        &mut self,
        restaurant: &Restaurant,
        menu_item: &MenuItem,
        quantity: u32,
        selected_options: Vec<SelectedOption>,
        special_instructions: Option<String>,
    ) -> AddOutcome {
        if quantity == 0 {
            return AddOutcome::Ignored;
        }

        let item = CartItem {
            id: CartItemId::generate(),
            price: Self::compute_item_price(menu_item, &selected_options),
            menu_item: menu_item.clone(),
            quantity,
            selected_options,
            special_instructions: special_instructions.filter(|s| !s.trim().is_empty()),
        };
        let item_id = item.id.clone();

        let rate = self.tax_rate;
        if let Some(cart) = self
            .cart
            .as_mut()
            .filter(|c| c.restaurant_id == restaurant.id)
        {
            cart.items.push(item);
            cart.recompute(rate);
            return AddOutcome::Added(item_id);
        }

        let fresh = self.start_cart(restaurant, item);
        match self.cart.replace(fresh) {
            Some(old) => AddOutcome::Replaced {
                item_id,
                discarded: Box::new(old),
            },
            None => AddOutcome::Started(item_id),
        }
    }

    /// Add a line, refusing items from a restaurant other than the cart's.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::DifferentRestaurant`] and leaves the cart
    /// untouched if the restaurants differ.
    pub fn try_add_item(
        &mut self,
        restaurant: &Restaurant,
        menu_item: &MenuItem,
        quantity: u32,
        selected_options: Vec<SelectedOption>,
        special_instructions: Option<String>,
    ) -> Result<AddOutcome, CartError> {
        if let Some(cart) = &self.cart
            && cart.restaurant_id != restaurant.id
        {
            return Err(CartError::DifferentRestaurant {
                current: cart.restaurant_id.clone(),
                current_name: cart.restaurant.name.clone(),
                requested: restaurant.id.clone(),
            });
        }
        Ok(self.add_item(
            restaurant,
            menu_item,
            quantity,
            selected_options,
            special_instructions,
        ))
    }

    /// Remove a line. Removing the last line clears the cart. Returns
    /// whether a line was removed.
    pub fn remove_item(&mut self, item_id: &CartItemId) -> bool {
        let Some(cart) = self.cart.as_mut() else {
            return false;
        };
        let before = cart.items.len();
        cart.items.retain(|i| &i.id != item_id);
        let removed = cart.items.len() != before;

        if cart.items.is_empty() {
            self.cart = None;
        } else if removed {
            cart.recompute(self.tax_rate);
        }
        removed
    }

    /// Set a line's quantity; zero removes the line. No upper bound.
    pub fn update_item_quantity(&mut self, item_id: &CartItemId, quantity: u32) {
        if quantity == 0 {
            self.remove_item(item_id);
            return;
        }
        let Some(cart) = self.cart.as_mut() else {
            return;
        };
        if let Some(item) = cart.items.iter_mut().find(|i| &i.id == item_id) {
            item.quantity = quantity;
            cart.recompute(self.tax_rate);
        }
    }

    /// Add `delta` (possibly negative) to a line's quantity; reaching zero
    /// removes it.
    pub fn adjust_item_quantity(&mut self, item_id: &CartItemId, delta: i64) {
        let Some(current) = self.cart.as_ref().and_then(|c| c.item(item_id)).map(|i| i.quantity)
        else {
            return;
        };
        let next = (i64::from(current) + delta).clamp(0, i64::from(u32::MAX));
        self.update_item_quantity(item_id, u32::try_from(next).unwrap_or(0));
    }

    /// Drop the cart.
    pub fn clear_cart(&mut self) {
        self.cart = None;
    }

    fn start_cart(&self, restaurant: &Restaurant, item: CartItem) -> Cart {
        let mut cart = Cart {
            restaurant_id: restaurant.id.clone(),
            restaurant: restaurant.clone(),
            items: vec![item],
            totals: Totals {
                delivery_fee: restaurant.delivery_fee,
                ..Totals::default()
            },
        };
        cart.recompute(self.tax_rate);
        cart
    }
}
