//! Sign in, sign out and identity.
//!
//! The session is kept in `BITEBOX_DATA_DIR` so later commands run as the
//! same user.

use bitebox_client::AppState;
use bitebox_core::UserRole;
use clap::ValueEnum;
use secrecy::SecretString;

use super::{CommandError, Output};

/// Which app to sign in to.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum RoleArg {
    Customer,
    Driver,
}

impl From<RoleArg> for UserRole {
    fn from(role: RoleArg) -> Self {
        match role {
            RoleArg::Customer => Self::Customer,
            RoleArg::Driver => Self::Delivery,
        }
    }
}

/// Sign in and persist the session.
pub async fn login(
    state: &mut AppState,
    out: Output,
    email: &str,
    password: Option<String>,
    role: RoleArg,
) -> Result<(), CommandError> {
    let password = password
        .or_else(|| std::env::var("BITEBOX_PASSWORD").ok())
        .filter(|p| !p.is_empty())
        .ok_or(CommandError::MissingPassword)?;

    let user = state
        .auth_mut()
        .login(email, SecretString::from(password), role.into())
        .await?;
    tracing::info!(user_id = %user.id, "Signed in");
    out.emit(user, || {
        vec![format!("Signed in as {} <{}> ({})", user.name, user.email, user.role)]
    })
}

pub fn logout(state: &mut AppState, out: Output) {
    state.auth_mut().logout();
    out.message("Signed out");
}

pub fn whoami(state: &AppState, out: Output) -> Result<(), CommandError> {
    let user = state.api().current_user()?;
    out.emit(&user, || {
        vec![
            format!("{} <{}>", user.name, user.email),
            format!("id:    {}", user.id),
            format!("role:  {}", user.role),
            format!("phone: {}", user.phone),
        ]
    })
}
