//! Unified error handling with Sentry integration.
//!
//! Provides a unified `StorefrontError` type. Front ends call
//! [`StorefrontError::report`] before showing [`StorefrontError::user_message`]
//! so that failures on our side reach Sentry while shopper mistakes and
//! backend refusals do not.

use bakery_core::{AddressError, IdError};
use thiserror::Error;

use crate::api::ApiError;
use crate::cart::StorageError;
use crate::checkout::CheckoutError;
use crate::config::ConfigError;
use crate::payment::PaymentError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum StorefrontError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Backend operation failed.
    #[error("Backend error: {0}")]
    Api(#[from] ApiError),

    /// Payment operation failed.
    #[error("Payment error: {0}")]
    Payment(#[from] PaymentError),

    /// Checkout could not proceed.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Cart storage failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Address form is invalid.
    #[error("Invalid address: {0}")]
    Address(#[from] AddressError),

    /// Identifier is invalid.
    #[error("Invalid id: {0}")]
    Id(#[from] IdError),

    /// Bad input from the shopper.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl StorefrontError {
    /// Whether the failure is on our side (or a dependency's) rather than
    /// the shopper's.
    #[must_use]
    pub fn is_internal(&self) -> bool {
        match self {
            Self::Config(_) | Self::Storage(_) | Self::Internal(_) => true,
            Self::Api(err) => api_is_internal(err),
            Self::Payment(err) => payment_is_internal(err),
            Self::Checkout(CheckoutError::Payment(err)) => payment_is_internal(err),
            Self::Checkout(_) | Self::Address(_) | Self::Id(_) | Self::BadRequest(_) => false,
        }
    }

    /// Capture internal failures to Sentry and log them.
    ///
    /// Returns the Sentry event id when one was captured.
    pub fn report(&self) -> Option<sentry::types::Uuid> {
        if !self.is_internal() {
            tracing::debug!(error = %self, "Shopper-facing error");
            return None;
        }

        let event_id = sentry::capture_error(self);
        tracing::error!(
            error = %self,
            sentry_event_id = %event_id,
            "Storefront error"
        );
        Some(event_id)
    }

    /// Message to show the shopper.
    ///
    /// Internal details are never exposed; backend and processor messages
    /// are passed through unchanged.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Config(_) | Self::Storage(_) | Self::Internal(_) => {
                "Ocurrió un error interno. Intenta nuevamente.".to_string()
            }
            Self::Api(err) => match err {
                ApiError::NotFound(_) => "No encontramos lo que buscas.".to_string(),
                ApiError::Api { status, message, .. } if *status < 500 => message.clone(),
                _ => "No se pudo conectar con el servidor. Intenta más tarde.".to_string(),
            },
            Self::Payment(err) => err.user_message(),
            Self::Checkout(err) => err.user_message(),
            Self::Address(err) => err.to_string(),
            Self::Id(_) => "Identificador inválido.".to_string(),
            Self::BadRequest(msg) => msg.clone(),
        }
    }
}

const fn api_is_internal(err: &ApiError) -> bool {
    match err {
        ApiError::Http(_) | ApiError::Parse(_) | ApiError::Url(_) => true,
        ApiError::Api { status, .. } => *status >= 500,
        ApiError::NotFound(_) => false,
    }
}

const fn payment_is_internal(err: &PaymentError) -> bool {
    match err {
        PaymentError::Unavailable(inner) => api_is_internal(inner),
        PaymentError::Connection(_) | PaymentError::Parse(_) | PaymentError::NotConfigured => true,
        PaymentError::Declined(_)
        | PaymentError::UnsupportedMethod(_)
        | PaymentError::InvalidAmount(_) => false,
    }
}

/// Result type alias for `StorefrontError`.
pub type Result<T> = std::result::Result<T, StorefrontError>;

/// Add a breadcrumb for shopper actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added product", Some(&[("product_id", "123")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(status: u16, message: &str) -> ApiError {
        ApiError::Api {
            status,
            message: message.to_string(),
            code: None,
            body: String::new(),
        }
    }

    #[test]
    fn test_storefront_error_display() {
        let err = StorefrontError::BadRequest("quantity must be positive".to_string());
        assert_eq!(err.to_string(), "Bad request: quantity must be positive");

        let err = StorefrontError::Internal("boom".to_string());
        assert_eq!(err.to_string(), "Internal error: boom");
    }

    #[test]
    fn test_internal_details_are_hidden() {
        let err = StorefrontError::Internal("disk full at /var/lib".to_string());
        assert!(!err.user_message().contains("/var/lib"));

        let err = StorefrontError::from(api(502, "upstream stack trace"));
        assert!(!err.user_message().contains("stack trace"));
    }

    #[test]
    fn test_backend_refusals_pass_through() {
        let err = StorefrontError::from(api(400, "Producto no disponible"));
        assert_eq!(err.user_message(), "Producto no disponible");
        assert!(!err.is_internal());

        let err = StorefrontError::from(CheckoutError::OrderRejected("Pedido duplicado".to_string()));
        assert_eq!(err.user_message(), "Pedido duplicado");
    }

    #[test]
    fn test_classification() {
        assert!(StorefrontError::from(api(503, "down")).is_internal());
        assert!(!StorefrontError::from(PaymentError::Declined("card declined".to_string())).is_internal());
        assert!(StorefrontError::from(PaymentError::NotConfigured).is_internal());
        assert!(!StorefrontError::from(CheckoutError::EmptyCart).is_internal());
    }

    #[test]
    fn test_report_skips_shopper_errors() {
        let err = StorefrontError::from(CheckoutError::EmptyCart);
        assert!(err.report().is_none());
    }
}
