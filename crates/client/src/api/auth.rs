//! Authentication endpoints.

use bitebox_core::{Email, OtpCode, User, UserRole};
use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;

use super::conversions::{RawUser, convert_user};
use super::{ApiClient, read_body};
use crate::error::ApiError;

/// Access and refresh tokens of a session.
#[derive(Debug, Clone)]
pub struct AuthTokens {
    pub access_token: SecretString,
    pub refresh_token: Option<SecretString>,
}

/// A signed-in user with their tokens.
#[derive(Debug, Clone)]
pub struct Session {
    pub user: User,
    pub tokens: AuthTokens,
}

/// Result of `POST /auth/signup`.
#[derive(Debug, Clone)]
pub enum SignupResponse {
    /// The account is usable immediately.
    Session(Session),
    /// A one-time code was sent; no session yet.
    VerificationRequired,
}

/// Credentials for `POST /auth/login`.
#[derive(Debug, Clone)]
pub struct LoginRequest {
    pub email: Email,
    pub password: SecretString,
    pub role: UserRole,
    pub push_token: Option<String>,
}

/// Details for `POST /auth/signup`.
#[derive(Debug, Clone)]
pub struct SignupRequest {
    pub email: Email,
    pub password: SecretString,
    pub name: String,
    pub phone: String,
    pub role: UserRole,
    pub push_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSession {
    user: RawUser,
    access_token: String,
    refresh_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSignup {
    #[serde(default)]
    requires_verification: bool,
    user: Option<RawUser>,
    access_token: Option<String>,
    refresh_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRefresh {
    access_token: String,
}

fn session_from(
    user: RawUser,
    access_token: String,
    refresh_token: Option<String>,
    requested_role: Option<UserRole>,
) -> Session {
    Session {
        user: convert_user(user, requested_role),
        tokens: AuthTokens {
            access_token: SecretString::from(access_token),
            refresh_token: refresh_token
                .filter(|t| !t.is_empty())
                .map(SecretString::from),
        },
    }
}

impl ApiClient {
    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Http` with status 401 for bad credentials.
    #[instrument(skip(self, request), fields(email = %request.email, role = %request.role))]
    pub async fn login(&self, request: &LoginRequest) -> Result<Session, ApiError> {
        let body = json!({
            "email": request.email.as_str(),
            "password": request.password.expose_secret(),
            "role": request.role,
            "pushToken": request.push_token,
        });
        let raw: RawSession = self
            .fetch(Method::POST, "/auth/login", Some(&body))
            .await?;
        Ok(session_from(
            raw.user,
            raw.access_token,
            raw.refresh_token,
            Some(request.role),
        ))
    }

    /// Create an account. Drivers are sent as role `driver`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Decode` if the backend neither asks for verification
    /// nor returns a session.
    #[instrument(skip(self, request), fields(email = %request.email, role = %request.role))]
    pub async fn signup(&self, request: &SignupRequest) -> Result<SignupResponse, ApiError> {
        let body = json!({
            "email": request.email.as_str(),
            "password": request.password.expose_secret(),
            "name": request.name,
            "phone": request.phone,
            "role": request.role.signup_name(),
            "pushToken": request.push_token,
        });
        let raw: RawSignup = self
            .fetch(Method::POST, "/auth/signup", Some(&body))
            .await?;

        if raw.requires_verification {
            return Ok(SignupResponse::VerificationRequired);
        }
        match (raw.user, raw.access_token) {
            (Some(user), Some(access_token)) => Ok(SignupResponse::Session(session_from(
                user,
                access_token,
                raw.refresh_token,
                Some(request.role),
            ))),
            _ => Err(ApiError::decode("signup returned neither a session nor a verification request")),
        }
    }

    /// Exchange a one-time code for a session.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Http` if the backend rejects the code.
    #[instrument(skip(self, code), fields(email = %email))]
    pub async fn verify_otp(&self, email: &Email, code: &OtpCode) -> Result<Session, ApiError> {
        let body = json!({ "email": email.as_str(), "otp": code.as_str() });
        let raw: RawSession = self
            .fetch(Method::POST, "/auth/verify-otp", Some(&body))
            .await?;
        Ok(session_from(raw.user, raw.access_token, raw.refresh_token, None))
    }

    /// Ask the backend to send a new one-time code.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self), fields(email = %email))]
    pub async fn resend_otp(&self, email: &Email) -> Result<(), ApiError> {
        let body = json!({ "email": email.as_str() });
        self.send(Method::POST, "/auth/resend-otp", Some(&body))
            .await
            .map(|_| ())
    }

    /// Exchange a refresh token for a new access token.
    ///
    /// Bypasses the refresh-and-replay pipeline so a rejected refresh token
    /// surfaces directly.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Http` if the refresh token is rejected.
    #[instrument(skip_all)]
    pub async fn refresh(&self, refresh_token: &SecretString) -> Result<SecretString, ApiError> {
        let body = json!({ "refreshToken": refresh_token.expose_secret() });
        let response = self
            .dispatch(&Method::POST, "/auth/refresh", Some(&body), None)
            .await?;
        let value = read_body(response)
            .await?
            .ok_or_else(|| ApiError::decode("empty refresh response"))?;
        let raw: RawRefresh = serde_json::from_value(value)?;
        Ok(SecretString::from(raw.access_token))
    }
}
