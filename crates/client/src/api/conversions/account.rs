//! User and address conversion functions.

use bitebox_core::{Address, AddressId, User, UserId, UserRole};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::{de_id, de_opt_id, first_non_empty, lenient};

/// A user record from an auth response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawUser {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    #[serde(default)]
    pub email: String,
    pub name: Option<String>,
    pub phone: Option<String>,
    /// `driver` is accepted and normalised to `delivery`. Roles this client
    /// does not know decode as absent.
    #[serde(default, deserialize_with = "de_role")]
    pub role: Option<UserRole>,
    pub avatar: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

fn de_role<'de, D>(deserializer: D) -> Result<Option<UserRole>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient(Option::<Value>::deserialize(deserializer)?, "role"))
}

/// Convert a raw user, using `requested_role` when the backend omits one.
#[must_use]
pub fn convert_user(raw: RawUser, requested_role: Option<UserRole>) -> User {
    User {
        id: UserId::new(raw.id),
        email: raw.email,
        name: raw.name.unwrap_or_default(),
        phone: raw.phone.unwrap_or_default(),
        role: raw
            .role
            .or(requested_role)
            .unwrap_or(UserRole::Customer),
        avatar: raw.avatar.filter(|a| !a.is_empty()),
        created_at: raw.created_at.unwrap_or_else(Utc::now),
    }
}

/// An address in any of the shapes the backend uses.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAddress {
    #[serde(default, deserialize_with = "de_opt_id")]
    pub id: Option<String>,
    pub label: Option<String>,
    pub street: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub latitude: Option<f64>,
    pub lat: Option<f64>,
    pub longitude: Option<f64>,
    pub lng: Option<f64>,
    pub instructions: Option<String>,
}

/// Convert a raw address. Missing IDs get a timestamp-based placeholder.
#[must_use]
pub fn convert_address(raw: RawAddress) -> Address {
    Address {
        id: raw.id.map_or_else(
            || AddressId::new(format!("addr_{}", Utc::now().timestamp_millis())),
            AddressId::new,
        ),
        label: raw
            .label
            .filter(|l| !l.is_empty())
            .unwrap_or_else(|| "Delivery".to_string()),
        street: first_non_empty([raw.street, raw.address]).unwrap_or_default(),
        city: raw.city.unwrap_or_default(),
        state: raw.state.unwrap_or_default(),
        zip_code: raw.zip_code.unwrap_or_default(),
        latitude: raw.latitude.or(raw.lat).unwrap_or(0.0),
        longitude: raw.longitude.or(raw.lng).unwrap_or(0.0),
        instructions: raw.instructions.filter(|i| !i.is_empty()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_driver_role_is_normalised() {
        let raw: RawUser =
            serde_json::from_str(r#"{"id": "u1", "email": "kola@bitebox.ng", "role": "driver"}"#)
                .unwrap();
        let user = convert_user(raw, Some(UserRole::Customer));
        assert_eq!(user.role, UserRole::Delivery);
        assert_eq!(user.name, "");
    }

    #[test]
    fn test_missing_role_falls_back_to_requested() {
        let raw: RawUser = serde_json::from_str(r#"{"id": 9, "email": "a@b.ng"}"#).unwrap();
        assert_eq!(convert_user(raw, Some(UserRole::Delivery)).role, UserRole::Delivery);
    }

    #[test]
    fn test_unknown_role_falls_back_to_requested() {
        let raw: RawUser =
            serde_json::from_str(r#"{"id": "u2", "email": "ops@bitebox.ng", "role": "admin"}"#)
                .unwrap();
        assert!(raw.role.is_none());
        assert_eq!(convert_user(raw, Some(UserRole::Delivery)).role, UserRole::Delivery);

        let raw: RawUser =
            serde_json::from_str(r#"{"id": "u3", "email": "a@b.ng", "role": null}"#).unwrap();
        assert_eq!(convert_user(raw, None).role, UserRole::Customer);
    }

    #[test]
    fn test_address_shapes() {
        let raw: RawAddress = serde_json::from_str(
            r#"{"id": 3, "label": "Home", "address": "12 Admiralty Way", "city": "Lekki", "lat": 6.44, "lng": 3.47}"#,
        )
        .unwrap();
        let address = convert_address(raw);
        assert_eq!(address.id.as_str(), "3");
        assert_eq!(address.street, "12 Admiralty Way");
        assert!((address.latitude - 6.44).abs() < f64::EPSILON);
        assert_eq!(address.one_line(), "Home, 12 Admiralty Way, Lekki");

        let bare = convert_address(RawAddress::default());
        assert_eq!(bare.label, "Delivery");
        assert!(bare.id.as_str().starts_with("addr_"));
    }
}
