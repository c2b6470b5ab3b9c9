//! Subcommand implementations.

pub mod account;
pub mod catalog;
pub mod driver;
pub mod session;

use bitebox_client::{ApiError, AuthError, DeliveryError};
use serde::Serialize;
use thiserror::Error;

/// Errors surfaced by subcommands.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Delivery(#[from] DeliveryError),

    #[error("Failed to encode output: {0}")]
    Encode(#[from] serde_json::Error),

    /// Neither `--password` nor `BITEBOX_PASSWORD` was given.
    #[error("Password required: pass --password or set BITEBOX_PASSWORD")]
    MissingPassword,

    #[error("Could not load orders: {0}")]
    OrdersUnavailable(String),

    #[error("Sign in with --role driver to use driver commands")]
    NotDriver,
}

/// Where command results go.
#[derive(Debug, Clone, Copy)]
pub struct Output {
    json: bool,
}

impl Output {
    pub const fn new(json: bool) -> Self {
        Self { json }
    }

    /// Print `value` as JSON, or the lines produced by `text`.
    #[allow(clippy::print_stdout)]
    pub fn emit<T, F>(self, value: &T, text: F) -> Result<(), CommandError>
    where
        T: Serialize + ?Sized,
        F: FnOnce() -> Vec<String>,
    {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            for line in text() {
                println!("{line}");
            }
        }
        Ok(())
    }

    /// Print a status message; JSON mode wraps it as `{"message": ...}`.
    #[allow(clippy::print_stdout)]
    pub fn message(self, message: &str) {
        if self.json {
            println!("{}", serde_json::json!({ "message": message }));
        } else {
            println!("{message}");
        }
    }
}
