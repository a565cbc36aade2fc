use std::future::Future;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db_types::Question;

/// The number of questions in a purchased deck, and in each marathon refill.
pub const STANDARD_DECK_SIZE: usize = 10;
/// The number of questions in the shared daily deck.
pub const DAILY_DECK_SIZE: usize = 7;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckRequest {
    pub subject: String,
    pub grade: String,
    pub count: usize,
    /// Set when the deck is the shared deck for this day. The provider picks the day's topic.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily_date: Option<NaiveDate>,
}

impl DeckRequest {
    pub fn new(subject: impl Into<String>, grade: impl Into<String>, count: usize) -> Self {
        Self { subject: subject.into(), grade: grade.into(), count, daily_date: None }
    }

    pub fn daily(date: NaiveDate) -> Self {
        Self { subject: String::default(), grade: String::default(), count: DAILY_DECK_SIZE, daily_date: Some(date) }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedDeck {
    /// The topic the questions are about. For a regular deck this is usually the requested subject.
    pub topic: String,
    pub questions: Vec<Question>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeckProviderError {
    #[error("The deck generator did not respond in time")]
    Timeout,
    #[error("The deck generator request failed: {0}")]
    RequestFailed(String),
    #[error("The deck generator returned an unusable deck: {0}")]
    InvalidDeck(String),
}

/// A source of quiz questions.
///
/// The returned future must be `Send`, since marathon refills run on spawned tasks.
pub trait DeckProvider: Send + Sync + 'static {
    fn generate_deck(
        &self,
        request: DeckRequest,
    ) -> impl Future<Output = Result<GeneratedDeck, DeckProviderError>> + Send;
}
