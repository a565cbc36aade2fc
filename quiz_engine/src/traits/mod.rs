//! # Behaviour contracts
//!
//! This module defines the traits that connect the quiz engine to the outside world.
//!
//! ## Storage backends
//! * [`AccountManagement`] queries player coin balances.
//! * [`PaymentLedger`] records coin purchases and credits approved payments exactly once.
//! * [`MatchManagement`] stores challenges and match results.
//! * [`DeckManagement`] stores decks, including paid decks and the shared daily deck.
//!
//! [`SqliteDatabase`](crate::SqliteDatabase) implements all of them.
//!
//! ## External collaborators
//! * [`PaymentProvider`] is the real-money payment provider.
//! * [`DeckProvider`] generates quiz questions.
mod account_management;
mod data_objects;
mod deck_management;
mod deck_provider;
mod match_management;
mod payment_ledger;
mod payment_provider;

pub use account_management::{AccountApiError, AccountManagement};
pub use data_objects::{ChallengeBoard, CreditResult, InsertTransactionResult, JoinedChallenge};
pub use deck_management::{DeckManagement, DeckStoreError};
pub use deck_provider::{
    DeckProvider,
    DeckProviderError,
    DeckRequest,
    GeneratedDeck,
    DAILY_DECK_SIZE,
    STANDARD_DECK_SIZE,
};
pub use match_management::{MatchManagement, MatchStoreError};
pub use payment_ledger::{PaymentLedger, PaymentLedgerError};
pub use payment_provider::{
    CreateIntentRequest,
    PayerInfo,
    PaymentIntent,
    PaymentProvider,
    PaymentProviderError,
    ProviderPayment,
};
