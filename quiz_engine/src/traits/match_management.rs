use thiserror::Error;

use crate::{
    db_types::{Challenge, ChallengeId, DeckId, MatchRecord, NewMatchRecord},
    traits::data_objects::JoinedChallenge,
};

#[derive(Debug, Clone, Error)]
pub enum MatchStoreError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Challenge {0} does not exist")]
    ChallengeNotFound(ChallengeId),
    #[error("Deck {0} does not exist")]
    DeckNotFound(DeckId),
}

impl From<sqlx::Error> for MatchStoreError {
    fn from(e: sqlx::Error) -> Self {
        MatchStoreError::DatabaseError(e.to_string())
    }
}

/// Storage for challenges and match results.
///
/// Within a challenge, a player has at most one match record. The record may be created as a zero-score placeholder
/// when the player joins, and is then updated in place when the match ends.
#[allow(async_fn_in_trait)]
pub trait MatchManagement {
    /// Creates a challenge on an existing deck.
    async fn insert_challenge(&self, deck_id: DeckId, creator_id: &str) -> Result<Challenge, MatchStoreError>;

    async fn fetch_challenge(&self, challenge_id: ChallengeId) -> Result<Option<Challenge>, MatchStoreError>;

    /// Idempotently registers the player in the challenge. If the player already has a record in the challenge it is
    /// returned unchanged, otherwise a placeholder with a score of zero is created.
    async fn join_challenge(
        &self,
        challenge_id: ChallengeId,
        user_id: &str,
        deck_id: DeckId,
        max_score: i64,
    ) -> Result<JoinedChallenge, MatchStoreError>;

    /// Stores a finished match. When the record belongs to a challenge, an existing record for the same
    /// `(challenge_id, user_id)` is updated in place. Otherwise a new record is always inserted.
    async fn upsert_match(&self, record: NewMatchRecord) -> Result<MatchRecord, MatchStoreError>;

    /// The records for the challenge, best score first. Ties go to whoever got there first.
    async fn fetch_leaderboard(&self, challenge_id: ChallengeId) -> Result<Vec<MatchRecord>, MatchStoreError>;
}
