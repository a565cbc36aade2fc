use serde::{Deserialize, Serialize};

use crate::db_types::{Challenge, Coins, Deck, MatchRecord, Transaction};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertTransactionResult {
    Inserted(Transaction),
    AlreadyExists(Transaction),
}

impl InsertTransactionResult {
    pub fn transaction(&self) -> &Transaction {
        match self {
            Self::Inserted(t) | Self::AlreadyExists(t) => t,
        }
    }
}

/// The result of attempting to credit an approved payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreditResult {
    /// This call won the compare-and-set. The balance was credited and the transaction is now approved.
    Credited { transaction: Transaction, coins: Coins, new_balance: Coins },
    /// The transaction had already been approved (and credited) before this call.
    AlreadyApproved,
    /// There is no local transaction for the provider id.
    TransactionNotFound,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinedChallenge {
    pub record: MatchRecord,
    /// True if the player had already joined (or played) the challenge before this call.
    pub existing: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeBoard {
    pub challenge: Challenge,
    pub deck: Option<Deck>,
    pub leaderboard: Vec<MatchRecord>,
}
