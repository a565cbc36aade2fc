use log::*;
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewTransaction, Transaction, TransactionStatus},
    sqlite::db::is_unique_violation,
    traits::{InsertTransactionResult, PaymentLedgerError},
};

pub async fn idempotent_insert(
    transaction: NewTransaction,
    conn: &mut SqliteConnection,
) -> Result<InsertTransactionResult, PaymentLedgerError> {
    let provider_id = transaction.provider_id.clone();
    let result = sqlx::query_as(
        r#"
            INSERT INTO transactions (user_id, amount, coins, status, provider_id, qr_code, qr_code_base64)
            VALUES ($1, $2, $3, 'pending', $4, $5, $6)
            RETURNING *;
        "#,
    )
    .bind(transaction.user_id)
    .bind(transaction.amount)
    .bind(transaction.coins)
    .bind(transaction.provider_id)
    .bind(transaction.qr_code)
    .bind(transaction.qr_code_base64)
    .fetch_one(&mut *conn)
    .await;
    match result {
        Ok(t) => Ok(InsertTransactionResult::Inserted(t)),
        Err(e) if is_unique_violation(&e) => {
            debug!("🗃️ Transaction {provider_id} already exists");
            let existing = fetch_by_provider_id(&provider_id, conn).await?.ok_or_else(|| {
                PaymentLedgerError::TransactionUpdateError(provider_id, "vanished after a conflicting insert".into())
            })?;
            Ok(InsertTransactionResult::AlreadyExists(existing))
        },
        Err(e) => Err(e.into()),
    }
}

pub async fn fetch_by_provider_id(
    provider_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Transaction>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM transactions WHERE provider_id = $1").bind(provider_id).fetch_optional(conn).await
}

/// The compare-and-set at the heart of payment reconciliation. Only one caller can ever move a transaction to
/// `approved`; everyone else gets `None`.
pub async fn mark_approved(provider_id: &str, conn: &mut SqliteConnection) -> Result<Option<Transaction>, sqlx::Error> {
    sqlx::query_as(
        r#"
            UPDATE transactions SET status = 'approved', updated_at = CURRENT_TIMESTAMP
            WHERE provider_id = $1 AND status != 'approved'
            RETURNING *;
        "#,
    )
    .bind(provider_id)
    .fetch_optional(conn)
    .await
}

/// Sets a non-approved status. Approved transactions, and transactions already in the given status, are left alone.
pub async fn mirror_status(
    provider_id: &str,
    status: TransactionStatus,
    conn: &mut SqliteConnection,
) -> Result<Option<Transaction>, sqlx::Error> {
    sqlx::query_as(
        r#"
            UPDATE transactions SET status = $1, updated_at = CURRENT_TIMESTAMP
            WHERE provider_id = $2 AND status != 'approved' AND status != $1
            RETURNING *;
        "#,
    )
    .bind(status.to_string())
    .bind(provider_id)
    .fetch_optional(conn)
    .await
}
