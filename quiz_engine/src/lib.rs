//! Quiz Engine
//!
//! The quiz engine is the core of a gamified quiz service. Players play matches on decks of multiple-choice
//! questions, compete in challenges, and buy coins with real money to spend on new decks.
//!
//! The library is divided into the following main sections:
//! 1. The match engine ([`mod@match_engine`]). A synchronous state machine that owns a single quiz attempt: scoring,
//!    lives, lifelines and the marathon refill policy. It has no I/O of its own.
//! 2. Database management and control ([`mod@traits`] and [`mod@sqlite`]). Backends implement the storage traits;
//!    SQLite is the supported backend. The data types used in the database are defined in [`mod@db_types`].
//! 3. The public API ([`mod@quiz_api`]). Payment reconciliation, match and challenge persistence, deck purchase and the
//!    daily deck. External systems (the payment provider and the deck generator) are reached through the traits in
//!    [`mod@traits`], so the engine stays provider-agnostic.
//!
//! The engine also provides a set of events that can be subscribed to. For example, when a payment is approved and
//! the player's coins are credited, a `PaymentApproved` event is emitted. A simple pub-sub framework is used so that
//! you can easily hook into these events and perform custom actions.
pub mod db_types;
pub mod events;
pub mod match_engine;
pub mod quiz_api;
pub mod traits;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use match_engine::{MatchEngine, MatchSession};
pub use quiz_api::{
    accounts_api::AccountApi,
    deck_api::{DeckApi, DeckApiOptions, DeckPurchase, PurchasedDeck},
    errors::{AccountQueryError, DeckApiError, MatchApiError, PaymentFlowError},
    match_api::MatchApi,
    payment_flow_api::PaymentFlowApi,
    payment_objects::{NotificationOutcome, PaymentRequest, PaymentResponse, ReconcilerOptions},
};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use traits::{
    AccountManagement,
    DeckManagement,
    DeckProvider,
    MatchManagement,
    PaymentLedger,
    PaymentProvider,
};
