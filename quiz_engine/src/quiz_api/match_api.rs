use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{Challenge, ChallengeId, DeckId, MatchRecord, NewMatchRecord},
    events::{EventProducers, MatchRecordedEvent},
    match_engine::MatchOutcome,
    quiz_api::errors::MatchApiError,
    traits::{ChallengeBoard, DeckManagement, JoinedChallenge, MatchManagement},
};

/// `MatchApi` stores finished matches and manages challenges, where several players compete on the same deck.
pub struct MatchApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B: Debug> Debug for MatchApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MatchApi ({:?})", self.db)
    }
}

impl<B> MatchApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }
}

impl<B> MatchApi<B>
where B: MatchManagement
{
    pub async fn create_challenge(&self, deck_id: DeckId, creator_id: &str) -> Result<Challenge, MatchApiError> {
        let creator_id = require_user_id(creator_id)?;
        let challenge = self.db.insert_challenge(deck_id, creator_id).await?;
        info!("🎮️ {creator_id} created {} on {deck_id}", challenge.id);
        Ok(challenge)
    }

    /// Registers a player in a challenge, creating a zero-score placeholder record that will be updated once they
    /// finish the match. Joining more than once returns the existing record untouched.
    pub async fn join_challenge(
        &self,
        challenge_id: ChallengeId,
        user_id: &str,
        deck_id: DeckId,
        max_score: i64,
    ) -> Result<JoinedChallenge, MatchApiError> {
        let user_id = require_user_id(user_id)?;
        if max_score < 0 {
            return Err(MatchApiError::ValidationError(format!("{max_score} is not a valid maximum score")));
        }
        let joined = self.db.join_challenge(challenge_id, user_id, deck_id, max_score).await?;
        if joined.existing {
            debug!("🎮️ {user_id} rejoined {challenge_id}. Keeping match #{}", joined.record.id);
        } else {
            info!("🎮️ {user_id} joined {challenge_id}");
        }
        Ok(joined)
    }

    /// Stores the result of a finished match.
    ///
    /// For challenge matches, the player's existing record in the challenge (usually the placeholder from
    /// [`Self::join_challenge`]) is updated in place, so each player appears on the leaderboard once.
    pub async fn record_match(&self, record: NewMatchRecord) -> Result<MatchRecord, MatchApiError> {
        require_user_id(&record.user_id)?;
        if record.score < 0 || record.max_score < 0 {
            return Err(MatchApiError::ValidationError(format!(
                "Scores cannot be negative. score: {}, max score: {}",
                record.score, record.max_score
            )));
        }
        let saved = self.db.upsert_match(record).await?;
        info!("🎮️ Match #{} recorded for {}. Score: {}/{}", saved.id, saved.user_id, saved.score, saved.max_score);
        self.call_match_recorded_hook(&saved).await;
        Ok(saved)
    }

    /// Convenience wrapper around [`Self::record_match`] for the outcome of a [`MatchEngine`] match.
    ///
    /// [`MatchEngine`]: crate::match_engine::MatchEngine
    pub async fn record_outcome(&self, user_id: &str, outcome: MatchOutcome) -> Result<MatchRecord, MatchApiError> {
        self.record_match(outcome.into_record(user_id)).await
    }

    pub async fn leaderboard(&self, challenge_id: ChallengeId) -> Result<Vec<MatchRecord>, MatchApiError> {
        Ok(self.db.fetch_leaderboard(challenge_id).await?)
    }

    async fn call_match_recorded_hook(&self, record: &MatchRecord) {
        for emitter in &self.producers.match_recorded_producer {
            trace!("🎮️ Notifying match recorded hook subscribers");
            emitter.publish_event(MatchRecordedEvent::new(record.clone())).await;
        }
    }
}

impl<B> MatchApi<B>
where B: MatchManagement + DeckManagement
{
    /// The challenge, the deck it is played on and its leaderboard. Returns `None` if the challenge does not exist.
    pub async fn challenge_board(&self, challenge_id: ChallengeId) -> Result<Option<ChallengeBoard>, MatchApiError> {
        let Some(challenge) = self.db.fetch_challenge(challenge_id).await? else {
            return Ok(None);
        };
        let deck = self.db.fetch_deck(challenge.deck_id).await?;
        if deck.is_none() {
            warn!("🎮️ {challenge_id} refers to {}, which no longer exists", challenge.deck_id);
        }
        let leaderboard = self.db.fetch_leaderboard(challenge_id).await?;
        Ok(Some(ChallengeBoard { challenge, deck, leaderboard }))
    }
}

fn require_user_id(user_id: &str) -> Result<&str, MatchApiError> {
    let user_id = user_id.trim();
    if user_id.is_empty() {
        Err(MatchApiError::ValidationError("A user id is required".into()))
    } else {
        Ok(user_id)
    }
}
