use chrono::NaiveDate;
use thiserror::Error;

use crate::db_types::{Coins, Deck, DeckId, NewDeck};

#[derive(Debug, Clone, Error)]
pub enum DeckStoreError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Insufficient funds. The deck costs {required} but only {available} is available")]
    InsufficientFunds { required: Coins, available: Coins },
    #[error("Could not store deck: {0}")]
    InvalidDeck(String),
    #[error("A daily deck for {0} has already been stored")]
    DailyDeckExists(NaiveDate),
}

impl From<sqlx::Error> for DeckStoreError {
    fn from(e: sqlx::Error) -> Self {
        DeckStoreError::DatabaseError(e.to_string())
    }
}

impl From<serde_json::Error> for DeckStoreError {
    fn from(e: serde_json::Error) -> Self {
        DeckStoreError::InvalidDeck(e.to_string())
    }
}

#[allow(async_fn_in_trait)]
pub trait DeckManagement {
    async fn fetch_deck(&self, deck_id: DeckId) -> Result<Option<Deck>, DeckStoreError>;

    /// Fetches the shared deck for the given calendar day, if it has been created.
    async fn fetch_daily_deck(&self, date: NaiveDate) -> Result<Option<Deck>, DeckStoreError>;

    /// Stores the shared deck for a day. There is only ever one daily deck per day: if another deck for the day was
    /// stored first, that deck is returned instead and the given one is discarded.
    async fn insert_daily_deck(&self, deck: NewDeck) -> Result<Deck, DeckStoreError>;

    /// In a single atomic transaction,
    /// * debits `deck.cost` from the owner's balance, conditional on the balance covering it, and
    /// * stores the deck.
    ///
    /// If the balance does not cover the cost, nothing is changed and [`DeckStoreError::InsufficientFunds`] is
    /// returned. Returns the stored deck and the owner's remaining balance.
    async fn purchase_deck(&self, deck: NewDeck) -> Result<(Deck, Coins), DeckStoreError>;
}
