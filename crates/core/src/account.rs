//! Account holders and their saved addresses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{AddressId, LatLng, UserId, UserRole};

/// An authenticated account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub name: String,
    pub phone: String,
    pub role: UserRole,
    pub avatar: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Whether this account uses the driver flow.
    #[must_use]
    pub const fn is_driver(&self) -> bool {
        matches!(self.role, UserRole::Delivery)
    }
}

/// A saved delivery (or pickup) address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub id: AddressId,
    /// Short name such as "Home" or "Office".
    pub label: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Free-text directions for the rider.
    pub instructions: Option<String>,
}

impl Address {
    /// Location of the address.
    #[must_use]
    pub const fn location(&self) -> LatLng {
        LatLng::new(self.latitude, self.longitude)
    }

    /// `label, street, city`, skipping empty parts.
    #[must_use]
    pub fn one_line(&self) -> String {
        [&self.label, &self.street, &self.city]
            .into_iter()
            .filter(|part| !part.is_empty())
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}
