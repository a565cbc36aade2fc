use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db_types::{Money, TransactionStatus};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayerInfo {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateIntentRequest {
    pub amount: Money,
    pub description: String,
    pub payer: PayerInfo,
    /// Our reference for the payment. The provider echoes it back when the payment is queried.
    pub external_reference: String,
    /// Guards against the same purchase being submitted twice.
    pub idempotency_key: String,
}

/// A payment that the player can now settle, plus whatever the client needs to present it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub external_id: String,
    pub qr_code: Option<String>,
    pub qr_code_base64: Option<String>,
    pub ticket_url: Option<String>,
}

/// The provider's authoritative view of a payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderPayment {
    pub external_id: String,
    pub status: TransactionStatus,
    pub amount: Money,
    pub external_reference: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaymentProviderError {
    #[error("The payment provider did not respond in time")]
    Timeout,
    #[error("The payment provider request failed: {0}")]
    RequestFailed(String),
    #[error("The payment provider has no payment with id {0}")]
    PaymentNotFound(String),
    #[error("The payment provider sent an unexpected response: {0}")]
    InvalidResponse(String),
}

/// The external real-money payment provider.
///
/// Webhook notifications from the provider are delivered at least once, possibly out of order and possibly
/// duplicated. Only [`PaymentProvider::fetch_payment`] is trusted for the state of a payment.
#[allow(async_fn_in_trait)]
pub trait PaymentProvider {
    async fn create_intent(&self, request: CreateIntentRequest) -> Result<PaymentIntent, PaymentProviderError>;

    async fn fetch_payment(&self, external_id: &str) -> Result<ProviderPayment, PaymentProviderError>;
}
