//! Subcommand implementations.
//!
//! Each command writes its output to the `out` it is given and returns a
//! [`CommandError`] on failure.

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod orders;

use bakery_core::IdError;
use bakery_storefront::api::ApiError;
use bakery_storefront::checkout::CheckoutError;
use bakery_storefront::error::StorefrontError;
use thiserror::Error;

/// Errors a command can end with.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Storefront(#[from] StorefrontError),

    /// Writing to the terminal failed.
    #[error("Output error: {0}")]
    Output(#[from] std::io::Error),
}

impl CommandError {
    /// Message for the terminal.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Storefront(err) => err.user_message(),
            Self::Output(err) => format!("No se pudo escribir la salida: {err}"),
        }
    }
}

impl From<ApiError> for CommandError {
    fn from(err: ApiError) -> Self {
        Self::Storefront(err.into())
    }
}

impl From<CheckoutError> for CommandError {
    fn from(err: CheckoutError) -> Self {
        Self::Storefront(err.into())
    }
}

impl From<IdError> for CommandError {
    fn from(err: IdError) -> Self {
        Self::Storefront(err.into())
    }
}
