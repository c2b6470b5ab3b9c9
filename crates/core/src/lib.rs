//! Bitebox Core - Domain types and client-side rules.
//!
//! This crate provides what every Bitebox component shares:
//! - `client` - API gateway client, sessions and stores
//! - `cli` - Command-line front end
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no HTTP
//! clients, no storage. Everything here is synchronous and deterministic,
//! which keeps cart pricing and status rules trivially testable.
//!
//! # Modules
//!
//! - [`types`] - IDs, credentials, money, statuses, coordinates
//! - [`catalog`] - Restaurants, menus and option selection
//! - [`account`] - Users and addresses
//! - [`cart`] - The single-restaurant cart engine
//! - [`order`] - Orders, delivery orders, driver stats and tracking steps

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod account;
pub mod cart;
pub mod catalog;
pub mod order;
pub mod types;

pub use account::{Address, User};
pub use cart::{AddOutcome, Cart, CartEngine, CartError, CartItem};
pub use catalog::{MenuItem, MenuOption, OptionGroup, OptionSelection, Restaurant, SelectedOption};
pub use order::{
    CustomerSnapshot, DailyEarnings, DeliveryOrder, DeliveryStats, DriverSnapshot, Order, Place,
    TRACKING_STEPS, TimelineStep, TrackingStep, tracking_step_index, tracking_timeline,
};
pub use types::*;
