//! Session state the screens read from.
//!
//! Each store owns its backend so tests can drive it with an in-memory fake.

mod auth;
mod delivery;
mod orders;

pub use auth::{AuthError, AuthSession, SignupData, SignupOutcome};
pub use delivery::{DeliveryError, DriverSession};
pub use orders::OrderStore;
