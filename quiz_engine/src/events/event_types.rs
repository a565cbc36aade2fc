use serde::{Deserialize, Serialize};

use crate::db_types::{Coins, MatchRecord, Transaction};

/// Emitted once per transaction, by whichever webhook delivery won the approval compare-and-set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentApprovedEvent {
    pub transaction: Transaction,
    pub coins_credited: Coins,
    pub new_balance: Coins,
}

impl PaymentApprovedEvent {
    pub fn new(transaction: Transaction, coins_credited: Coins, new_balance: Coins) -> Self {
        Self { transaction, coins_credited, new_balance }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecordedEvent {
    pub record: MatchRecord,
}

impl MatchRecordedEvent {
    pub fn new(record: MatchRecord) -> Self {
        Self { record }
    }
}
