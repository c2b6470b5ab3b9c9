//! Saved address endpoints.

use bitebox_core::{Address, UserId};
use reqwest::Method;
use serde::Serialize;
use tracing::instrument;

use super::conversions::{RawAddress, convert_address};
use super::{ApiClient, segment};
use crate::error::ApiError;

/// Body of `POST /addresses`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAddress {
    pub user_id: UserId,
    pub label: String,
    pub street: String,
    pub city: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lng: Option<f64>,
}

impl ApiClient {
    /// Addresses saved by `user_id`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn addresses(&self, user_id: &UserId) -> Result<Vec<Address>, ApiError> {
        let path = format!("/addresses/{}", segment(user_id.as_str()));
        let raw: Option<Vec<RawAddress>> = self.fetch_optional(Method::GET, &path, None).await?;
        Ok(raw
            .unwrap_or_default()
            .into_iter()
            .map(convert_address)
            .collect())
    }

    /// Addresses of the stored session's user.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotSignedIn` if no user is stored.
    pub async fn my_addresses(&self) -> Result<Vec<Address>, ApiError> {
        let user = self.current_user()?;
        self.addresses(&user.id).await
    }

    /// Save a new address.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self, address), fields(user_id = %address.user_id))]
    pub async fn add_address(&self, address: &NewAddress) -> Result<Address, ApiError> {
        let body = serde_json::to_value(address)?;
        let raw: Option<RawAddress> = self
            .fetch_optional(Method::POST, "/addresses", Some(&body))
            .await?;
        // Empty body: echo back what was sent
        Ok(convert_address(raw.unwrap_or_else(|| RawAddress {
            label: Some(address.label.clone()),
            street: Some(address.street.clone()),
            city: Some(address.city.clone()),
            lat: address.lat,
            lng: address.lng,
            ..RawAddress::default()
        })))
    }
}
