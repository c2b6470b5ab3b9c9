//! Core types for Bitebox.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod credential;
pub mod geo;
pub mod id;
pub mod price;
pub mod status;

pub use credential::{Email, EmailError, OtpCode, OtpError};
pub use geo::{EARTH_RADIUS_M, LatLng, haversine_m};
pub use id::*;
pub use price::{TaxRate, TaxRateError, Totals};
pub use status::*;
