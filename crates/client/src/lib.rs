//! Bitebox Client - API gateway access and session state.
//!
//! Everything here sits between the screens and the Bitebox backend:
//!
//! - [`api`] - HTTP client for the `/api` gateway, with token refresh,
//!   fallback base URL and a catalog cache
//! - [`backend`] - Traits the stores depend on, implemented by [`ApiClient`]
//! - [`storage`] - Persisted key/value session data
//! - [`stores`] - Auth session, order history and the driver session
//! - [`checkout`] and [`group`] - Placing orders, alone or as a group
//! - [`route`] - Debounced route preview for the active delivery
//! - [`state`] - [`AppState`], which wires it all together
//!
//! # Example
//!
//! ```rust,ignore
//! use bitebox_client::{AppState, ClientConfig};
//!
//! let mut state = AppState::open(ClientConfig::from_env()?)?;
//! let restaurants = state.api().restaurants().await?;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod backend;
pub mod checkout;
pub mod config;
pub mod error;
pub mod group;
pub mod route;
pub mod state;
pub mod storage;
pub mod stores;

pub use api::ApiClient;
pub use checkout::{Checkout, CheckoutError, CheckoutOptions};
pub use config::{ClientConfig, ConfigError};
pub use error::ApiError;
pub use group::{GroupOrder, GroupOrderError};
pub use state::AppState;
pub use storage::{FileStore, KeyValueStore, MemoryStore, StorageError};
pub use stores::{AuthError, AuthSession, DeliveryError, DriverSession, OrderStore};
