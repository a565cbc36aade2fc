//! Read-only access to player balances.
use std::fmt::Debug;

use log::trace;

use crate::{
    db_types::{Coins, Profile},
    quiz_api::errors::AccountQueryError,
    traits::AccountManagement,
};

pub struct AccountApi<B> {
    db: B,
}

impl<B: Debug> Debug for AccountApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AccountApi ({:?})", self.db)
    }
}

impl<B> AccountApi<B>
where B: AccountManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// The player's coin balance. Players that have never been credited have a balance of zero.
    pub async fn balance(&self, user_id: &str) -> Result<Coins, AccountQueryError> {
        let user_id = user_id.trim();
        if user_id.is_empty() {
            return Err(AccountQueryError::ValidationError("A user id is required".into()));
        }
        let balance = self.db.fetch_balance(user_id).await?;
        trace!("🪙 Balance for {user_id}: {balance}");
        Ok(balance)
    }

    pub async fn profile(&self, user_id: &str) -> Result<Option<Profile>, AccountQueryError> {
        Ok(self.db.fetch_profile(user_id.trim()).await?)
    }
}
