use thiserror::Error;

use crate::{
    db_types::{Coins, NewTransaction, Transaction, TransactionStatus},
    traits::data_objects::{CreditResult, InsertTransactionResult},
};

#[derive(Debug, Clone, Error)]
pub enum PaymentLedgerError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Transaction {0} could not be updated: {1}")]
    TransactionUpdateError(String, String),
}

impl From<sqlx::Error> for PaymentLedgerError {
    fn from(e: sqlx::Error) -> Self {
        PaymentLedgerError::DatabaseError(e.to_string())
    }
}

/// The ledger of coin purchases.
///
/// Transactions are keyed by the payment provider's id. Status changes only ever move forward: once a transaction is
/// `approved`, no call on this trait will change it again, and it will never be credited twice.
#[allow(async_fn_in_trait)]
pub trait PaymentLedger {
    /// Stores a new transaction in the `pending` state. This call is idempotent: if a transaction with the same
    /// provider id already exists, it is returned unchanged.
    async fn insert_pending_transaction(
        &self,
        transaction: NewTransaction,
    ) -> Result<InsertTransactionResult, PaymentLedgerError>;

    /// Fetches the transaction for the given provider id. If no transaction exists, `None` is returned.
    async fn fetch_transaction(&self, provider_id: &str) -> Result<Option<Transaction>, PaymentLedgerError>;

    /// Mirrors a non-approving provider status onto the local record, for observability. Approved transactions are
    /// never touched. Returns the updated transaction, or `None` if nothing was updated.
    async fn mirror_transaction_status(
        &self,
        provider_id: &str,
        status: TransactionStatus,
    ) -> Result<Option<Transaction>, PaymentLedgerError>;

    /// In a single atomic transaction,
    /// * marks the transaction as `approved`, conditional on it not already being approved, and
    /// * if (and only if) that succeeded, increments the owner's balance by `coins`.
    ///
    /// Concurrent calls for the same provider id credit the balance at most once. The losers receive
    /// [`CreditResult::AlreadyApproved`].
    async fn credit_approved_transaction(
        &self,
        provider_id: &str,
        coins: Coins,
    ) -> Result<CreditResult, PaymentLedgerError>;
}
