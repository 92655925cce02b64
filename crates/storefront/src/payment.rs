//! Card payment authorization.
//!
//! Card details never pass through this crate. The processor's hosted widget
//! turns them into a payment-method token; authorization here only creates a
//! payment intent on the backend and confirms it with that token.

use std::sync::Arc;

use async_trait::async_trait;
use bakery_core::{Money, PaymentMethod};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;
use tracing::instrument;
use url::Url;

use crate::api::{ApiClient, ApiError, envelope::error_details};
use crate::config::PaymentsConfig;

/// Shown when the processor declines without saying why.
const DEFAULT_DECLINE_MESSAGE: &str = "Error en el pago";

/// Errors that can occur while authorizing a payment.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// The processor refused the payment; the message is the processor's own.
    #[error("{0}")]
    Declined(String),

    /// The backend could not start the payment.
    #[error("Payment intent could not be created: {0}")]
    Unavailable(#[source] ApiError),

    /// The processor could not be reached.
    #[error("Payment processor unreachable: {0}")]
    Connection(#[from] reqwest::Error),

    /// The processor answered with something unexpected.
    #[error("Unexpected processor response: {0}")]
    Parse(#[from] serde_json::Error),

    /// This processor does not settle the requested method.
    #[error("Payment method not supported: {0}")]
    UnsupportedMethod(PaymentMethod),

    /// No publishable key is configured.
    #[error("Card payments are not configured")]
    NotConfigured,

    /// The amount cannot be charged.
    #[error("Invalid payment amount: {0}")]
    InvalidAmount(Money),
}

impl PaymentError {
    /// Message to show the shopper.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Declined(message) => message.clone(),
            Self::Unavailable(_) | Self::NotConfigured => {
                "No se pudo iniciar el pago. Intenta más tarde.".to_string()
            }
            Self::Connection(_) | Self::Parse(_) => {
                "No se pudo conectar con el servidor de pagos.".to_string()
            }
            Self::UnsupportedMethod(method) => {
                format!("El método de pago {} no está disponible.", method.label())
            }
            Self::InvalidAmount(_) => "El monto a pagar no es válido.".to_string(),
        }
    }
}

/// What to authorize.
#[derive(Clone)]
pub struct PaymentRequest {
    /// Amount to charge; the order total.
    pub amount: Money,
    pub method: PaymentMethod,
    /// Token from the processor's hosted widget.
    pub payment_method_token: SecretString,
}

impl std::fmt::Debug for PaymentRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentRequest")
            .field("amount", &self.amount)
            .field("method", &self.method)
            .field("payment_method_token", &"[REDACTED]")
            .finish()
    }
}

/// Proof of a successful authorization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentAuthorization {
    /// Processor reference sent with the order as `paymentIntentId`.
    pub reference: String,
}

/// Something that can authorize payments.
#[async_trait]
pub trait PaymentProcessor: Send + Sync {
    /// Authorize `request`.
    async fn authorize(&self, request: &PaymentRequest) -> Result<PaymentAuthorization, PaymentError>;
}

// =============================================================================
// HostedCardProcessor
// =============================================================================

/// Card processor driven by payment intents.
///
/// 1. The backend creates an intent for the amount (in cents).
/// 2. The intent is confirmed against the processor API with the widget token.
/// 3. Status `succeeded` yields the intent id as the reference.
#[derive(Clone)]
pub struct HostedCardProcessor {
    inner: Arc<HostedCardProcessorInner>,
}

struct HostedCardProcessorInner {
    backend: ApiClient,
    client: reqwest::Client,
    api_url: Url,
    publishable_key: Option<SecretString>,
}

#[derive(Debug, Deserialize)]
struct ConfirmedIntent {
    id: String,
    status: String,
    #[serde(default)]
    last_payment_error: Option<ProcessorMessage>,
}

#[derive(Debug, Deserialize)]
struct ProcessorMessage {
    #[serde(default)]
    message: Option<String>,
}

impl HostedCardProcessor {
    /// Create a processor that creates intents through `backend`.
    #[must_use]
    pub fn new(config: &PaymentsConfig, backend: ApiClient) -> Self {
        Self {
            inner: Arc::new(HostedCardProcessorInner {
                backend,
                client: reqwest::Client::new(),
                api_url: config.api_url.clone(),
                publishable_key: config.publishable_key.clone(),
            }),
        }
    }

    fn confirm_url(&self, intent_id: &str) -> Result<Url, PaymentError> {
        let mut url = self.inner.api_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                PaymentError::Unavailable(ApiError::Url(
                    url::ParseError::RelativeUrlWithCannotBeABaseBase,
                ))
            })?
            .pop_if_empty()
            .extend(["v1", "payment_intents", intent_id, "confirm"]);
        Ok(url)
    }

    async fn confirm(
        &self,
        key: &SecretString,
        client_secret: &str,
        intent_id: &str,
        token: &SecretString,
    ) -> Result<PaymentAuthorization, PaymentError> {
        let response = self
            .inner
            .client
            .post(self.confirm_url(intent_id)?)
            .bearer_auth(key.expose_secret())
            .form(&[
                ("client_secret", client_secret),
                ("payment_method", token.expose_secret()),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let details = error_details(status, &body);
            tracing::warn!(status = %status, message = %details.message, "Payment declined");
            return Err(PaymentError::Declined(details.message));
        }

        let intent: ConfirmedIntent = serde_json::from_str(&body)?;
        if intent.status == "succeeded" {
            tracing::info!(payment_intent = %intent.id, "Payment authorized");
            return Ok(PaymentAuthorization { reference: intent.id });
        }

        let message = intent
            .last_payment_error
            .and_then(|e| e.message)
            .unwrap_or_else(|| DEFAULT_DECLINE_MESSAGE.to_string());
        tracing::warn!(status = %intent.status, "Payment not completed");
        Err(PaymentError::Declined(message))
    }
}

#[async_trait]
impl PaymentProcessor for HostedCardProcessor {
    #[instrument(skip(self, request), fields(amount = %request.amount, method = %request.method))]
    async fn authorize(&self, request: &PaymentRequest) -> Result<PaymentAuthorization, PaymentError> {
        if !request.method.is_card() {
            return Err(PaymentError::UnsupportedMethod(request.method));
        }
        let key = self
            .inner
            .publishable_key
            .as_ref()
            .ok_or(PaymentError::NotConfigured)?;
        let amount_minor = request
            .amount
            .to_minor_units()
            .filter(|cents| *cents > 0)
            .ok_or(PaymentError::InvalidAmount(request.amount))?;

        let intent = self
            .inner
            .backend
            .create_payment_intent(amount_minor)
            .await
            .map_err(PaymentError::Unavailable)?;

        self.confirm(
            key,
            &intent.client_secret,
            intent.id(),
            &request.payment_method_token,
        )
        .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::{ApiConfig, parse_base_url};

    fn processor(key: Option<&str>) -> HostedCardProcessor {
        let backend = ApiClient::new(&ApiConfig {
            base_url: parse_base_url("http://127.0.0.1:9/api").unwrap(),
            token: None,
            timeout: None,
        })
        .unwrap();
        let config = PaymentsConfig {
            api_url: parse_base_url("https://api.stripe.com").unwrap(),
            publishable_key: key.map(SecretString::from),
        };
        HostedCardProcessor::new(&config, backend)
    }

    fn request(method: PaymentMethod, amount: Money) -> PaymentRequest {
        PaymentRequest {
            amount,
            method,
            payment_method_token: SecretString::from("pm_card_visa"),
        }
    }

    #[tokio::test]
    async fn test_rejects_non_card_methods() {
        let result = processor(Some("pk_test_51Hq8ZtK3mN9pQ7rT"))
            .authorize(&request(PaymentMethod::Cash, Money::from_major_units(10)))
            .await;
        assert!(matches!(result, Err(PaymentError::UnsupportedMethod(PaymentMethod::Cash))));
    }

    #[tokio::test]
    async fn test_requires_publishable_key() {
        let result = processor(None)
            .authorize(&request(PaymentMethod::Card, Money::from_major_units(10)))
            .await;
        assert!(matches!(result, Err(PaymentError::NotConfigured)));
    }

    #[tokio::test]
    async fn test_rejects_zero_amount() {
        let result = processor(Some("pk_test_51Hq8ZtK3mN9pQ7rT"))
            .authorize(&request(PaymentMethod::Stripe, Money::ZERO))
            .await;
        assert!(matches!(result, Err(PaymentError::InvalidAmount(_))));
    }

    #[test]
    fn test_confirm_url() {
        let url = processor(None).confirm_url("pi_123").unwrap();
        assert_eq!(url.as_str(), "https://api.stripe.com/v1/payment_intents/pi_123/confirm");
    }

    #[test]
    fn test_declined_message_is_verbatim() {
        let err = PaymentError::Declined("card declined".to_string());
        assert_eq!(err.to_string(), "card declined");
        assert_eq!(err.user_message(), "card declined");
    }

    #[test]
    fn test_request_debug_redacts_token() {
        let debug = format!("{:?}", request(PaymentMethod::Card, Money::ZERO));
        assert!(!debug.contains("pm_card_visa"));
    }
}
