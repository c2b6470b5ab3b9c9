//! Decoding of backend response shapes into domain types.
//!
//! The backend is loose about field names and presence. Every fallback
//! default lives here so that callers only ever see complete domain values.

pub mod account;
pub mod catalog;
pub mod orders;

pub use account::{RawAddress, RawUser, convert_address, convert_user};
pub use catalog::{RawMenuItem, RawRestaurant, convert_menu_item, convert_restaurant};
pub use orders::{
    CreateOrderRequest, CreatedOrder, ItemChoice, OrderItemPayload, PlacePayload,
    RawCreatedOrder, RawDeliveryOrder, RawOrder, convert_delivery_order, convert_order,
};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::debug;

/// IDs arrive as strings or as numbers depending on the table.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Signed(i64),
    Unsigned(u64),
}

impl From<RawId> for String {
    fn from(id: RawId) -> Self {
        match id {
            RawId::Text(s) => s,
            RawId::Signed(n) => n.to_string(),
            RawId::Unsigned(n) => n.to_string(),
        }
    }
}

pub(crate) fn de_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    RawId::deserialize(deserializer).map(String::from)
}

pub(crate) fn de_opt_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<RawId>::deserialize(deserializer)?.map(String::from))
}

/// Decode an embedded value, dropping it if it is not the expected shape.
pub(crate) fn lenient<T: DeserializeOwned>(value: Option<Value>, what: &str) -> Option<T> {
    let value = value.filter(|v| !v.is_null())?;
    match serde_json::from_value(value) {
        Ok(decoded) => Some(decoded),
        Err(e) => {
            debug!(error = %e, what, "Dropping undecodable value");
            None
        }
    }
}

/// First of `candidates` that is present and non-empty.
pub(crate) fn first_non_empty(candidates: [Option<String>; 2]) -> Option<String> {
    candidates
        .into_iter()
        .flatten()
        .find(|s| !s.trim().is_empty())
}
