//! # Quiz engine public API
//!
//! The `quiz_api` module exposes the programmatic API for the quiz engine. Each API covers one area of the game, so
//! that clients can pick the functionality they need.
//!
//! * [`payment_flow_api`] sells coins. It creates payment intents with the payment provider and reconciles the
//!   provider's webhook notifications into exactly-once balance credits.
//! * [`match_api`] stores match results and manages challenges and their leaderboards.
//! * [`deck_api`] generates paid decks and the shared daily deck.
//! * [`accounts_api`] answers balance queries.
//!
//! # API usage
//!
//! Every API is created by supplying a database backend that implements the backend traits it requires. APIs that
//! talk to an external system take that collaborator as well.
//!
//! ```rust,ignore
//! use quiz_engine::{AccountApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url(...).await?;
//! // SqliteDatabase implements AccountManagement
//! let api = AccountApi::new(db);
//! let coins = api.balance("alice").await?;
//! ```
pub mod accounts_api;
pub mod deck_api;
pub mod errors;
pub mod match_api;
pub mod payment_flow_api;
pub mod payment_objects;
