use thiserror::Error;

use crate::db_types::{Coins, Profile};

#[derive(Debug, Clone, Error)]
pub enum AccountApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Invalid user id: {0}")]
    InvalidUserId(String),
}

impl From<sqlx::Error> for AccountApiError {
    fn from(e: sqlx::Error) -> Self {
        AccountApiError::DatabaseError(e.to_string())
    }
}

/// The `AccountManagement` trait defines behaviour for querying player coin balances.
///
/// Balances only change through the payment ledger and deck purchases. A profile is created lazily the first time a
/// player is credited. Players without a profile have a balance of zero.
#[allow(async_fn_in_trait)]
pub trait AccountManagement {
    /// Fetches the profile for the given user id. If no profile exists, `None` is returned.
    async fn fetch_profile(&self, user_id: &str) -> Result<Option<Profile>, AccountApiError>;

    /// The current coin balance for the user. Unknown users have a balance of zero.
    async fn fetch_balance(&self, user_id: &str) -> Result<Coins, AccountApiError>;
}
