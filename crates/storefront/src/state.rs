//! Application state shared by front ends.

use std::sync::Arc;

use crate::api::ApiClient;
use crate::cart::{CartBus, CartStore, FileStorage};
use crate::config::StorefrontConfig;
use crate::error::StorefrontError;
use crate::payment::HostedCardProcessor;

/// Application state.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// backend client, the payment processor and the cart bus.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    api: ApiClient,
    payments: HostedCardProcessor,
    bus: CartBus,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: StorefrontConfig) -> Result<Self, StorefrontError> {
        let api = ApiClient::new(&config.api)?;
        let payments = HostedCardProcessor::new(&config.payments, api.clone());

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                api,
                payments,
                bus: CartBus::new(),
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the backend client.
    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    /// Get a reference to the card processor.
    #[must_use]
    pub fn payments(&self) -> &HostedCardProcessor {
        &self.inner.payments
    }

    /// Get a reference to the cart change bus.
    #[must_use]
    pub fn bus(&self) -> &CartBus {
        &self.inner.bus
    }

    /// Open the shopper's cart from the configured file.
    #[must_use]
    pub fn open_cart(&self) -> CartStore<FileStorage> {
        CartStore::open(
            FileStorage::new(&self.inner.config.cart_file),
            self.inner.bus.clone(),
        )
    }
}
