use thiserror::Error;

use crate::traits::{
    AccountApiError,
    DeckProviderError,
    DeckStoreError,
    MatchStoreError,
    PaymentLedgerError,
    PaymentProviderError,
};

#[derive(Debug, Clone, Error)]
pub enum PaymentFlowError {
    #[error("Invalid payment request: {0}")]
    ValidationError(String),
    #[error("Payment provider error: {0}")]
    ProviderError(#[from] PaymentProviderError),
    #[error("Payment ledger error: {0}")]
    LedgerError(#[from] PaymentLedgerError),
    #[error("Payment {0} was approved, but there is no local transaction to credit. Manual reconciliation required")]
    UntrackedApprovedPayment(String),
}

impl PaymentFlowError {
    /// True if the same request may succeed when delivered again. Webhook handlers answer these with a status code that
    /// makes the provider redeliver.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::ValidationError(_) => false,
            Self::ProviderError(PaymentProviderError::PaymentNotFound(_)) => false,
            Self::ProviderError(_) | Self::LedgerError(_) | Self::UntrackedApprovedPayment(_) => true,
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum MatchApiError {
    #[error("Invalid request: {0}")]
    ValidationError(String),
    #[error("{0}")]
    StoreError(#[from] MatchStoreError),
    #[error("{0}")]
    DeckError(#[from] DeckStoreError),
}

#[derive(Debug, Clone, Error)]
pub enum DeckApiError {
    #[error("Invalid request: {0}")]
    ValidationError(String),
    #[error("Deck provider error: {0}")]
    ProviderError(#[from] DeckProviderError),
    #[error("{0}")]
    StoreError(#[from] DeckStoreError),
}

impl DeckApiError {
    pub fn is_insufficient_funds(&self) -> bool {
        matches!(self, Self::StoreError(DeckStoreError::InsufficientFunds { .. }))
    }
}

#[derive(Debug, Clone, Error)]
pub enum AccountQueryError {
    #[error("Invalid request: {0}")]
    ValidationError(String),
    #[error("{0}")]
    StoreError(#[from] AccountApiError),
}
