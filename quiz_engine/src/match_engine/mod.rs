//! # Match engine
//!
//! The state machine that owns a single quiz attempt. A match moves `Idle -> Playing -> {Won | Lost}`. The only way
//! back out of a terminal state is an explicit [`MatchEngine::restart_game`] (replay the same deck) or
//! [`MatchEngine::reset_game`] (abandon the deck entirely).
//!
//! [`MatchEngine`] is synchronous and owns no I/O. Marathon matches need a steady supply of questions, which is
//! the job of [`MatchSession`]: it wraps an engine together with a [`DeckProvider`](crate::traits::DeckProvider)
//! and tops the deck up in the background as the player approaches the end of it.
//!
//! Persistence is not the engine's concern either. When a match ends, the caller collects the
//! [`MatchOutcome`] (exactly once via [`MatchSession::take_result`]) and hands it to
//! [`MatchApi::record_match`](crate::MatchApi::record_match).
mod engine;
mod errors;
mod refill;
mod session;

use std::fmt::Display;

pub use engine::MatchEngine;
pub use errors::MatchError;
pub use refill::{refill_trigger, RefillTrigger, REFILL_THRESHOLDS, REFILL_WINDOW};
use serde::{Deserialize, Serialize};
pub use session::{MatchSession, RefillOptions};

use crate::db_types::{ChallengeId, DeckId, NewMatchRecord, Question};

/// Points awarded for every correct answer.
pub const POINTS_PER_CORRECT_ANSWER: i64 = 100;
/// Bonus awarded for making it through a fixed-length deck.
pub const COMPLETION_BONUS: i64 = 1000;
/// Every match starts with this many lives.
pub const STARTING_LIVES: u8 = 3;

/// The best score achievable on a deck of `len` questions, excluding the completion bonus.
pub fn max_score_for(len: usize) -> i64 {
    i64::try_from(len).unwrap_or(i64::MAX).saturating_mul(POINTS_PER_CORRECT_ANSWER)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    #[default]
    Idle,
    Playing,
    Won,
    Lost,
}

impl MatchStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Won | Self::Lost)
    }
}

impl Display for MatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Playing => write!(f, "playing"),
            Self::Won => write!(f, "won"),
            Self::Lost => write!(f, "lost"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    #[default]
    Standard,
    /// Endless play. The deck is extended on demand and there is no completion bonus.
    Marathon,
    Daily,
}

impl MatchMode {
    pub fn is_marathon(&self) -> bool {
        matches!(self, Self::Marathon)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LifelineType {
    Skip,
    FiftyFifty,
}

impl Display for LifelineType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Skip => write!(f, "skip"),
            Self::FiftyFifty => write!(f, "fifty-fifty"),
        }
    }
}

/// Lifeline availability. A flag only ever goes from `true` to `false` within a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lifelines {
    pub skip: bool,
    pub fifty_fifty: bool,
}

impl Default for Lifelines {
    fn default() -> Self {
        Self { skip: true, fifty_fifty: true }
    }
}

impl Lifelines {
    pub fn is_available(&self, lifeline: LifelineType) -> bool {
        match lifeline {
            LifelineType::Skip => self.skip,
            LifelineType::FiftyFifty => self.fifty_fifty,
        }
    }

    fn consume(&mut self, lifeline: LifelineType) {
        match lifeline {
            LifelineType::Skip => self.skip = false,
            LifelineType::FiftyFifty => self.fifty_fifty = false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerOutcome {
    Correct,
    Wrong,
}

/// The result of asking the engine to move on to the next question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Advance {
    /// The index moved forward and a new question is current.
    Advanced,
    /// The last question of a fixed-length deck was passed. The completion bonus has been awarded.
    Won,
    /// Marathon mode ran out of questions. Nothing changed; try again once more questions have been appended.
    AwaitingQuestions,
    /// The match is not being played, so there is nothing to advance.
    Ignored,
}

/// Everything needed to start a match.
#[derive(Debug, Clone)]
pub struct MatchSetup {
    pub deck: Vec<Question>,
    pub deck_id: DeckId,
    pub mode: MatchMode,
    pub subject: String,
    pub grade: String,
    pub challenge_id: Option<ChallengeId>,
}

impl MatchSetup {
    pub fn new(deck: Vec<Question>, deck_id: DeckId) -> Self {
        Self {
            deck,
            deck_id,
            mode: MatchMode::default(),
            subject: String::default(),
            grade: String::default(),
            challenge_id: None,
        }
    }

    pub fn with_mode(mut self, mode: MatchMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_topic(mut self, subject: impl Into<String>, grade: impl Into<String>) -> Self {
        self.subject = subject.into();
        self.grade = grade.into();
        self
    }

    pub fn with_challenge(mut self, challenge_id: ChallengeId) -> Self {
        self.challenge_id = Some(challenge_id);
        self
    }
}

/// The final result of a match, ready to be handed to the match persistence layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchOutcome {
    pub deck_id: DeckId,
    pub challenge_id: Option<ChallengeId>,
    pub status: MatchStatus,
    pub mode: MatchMode,
    pub score: i64,
    pub max_score: i64,
}

impl MatchOutcome {
    pub fn into_record<S: Into<String>>(self, user_id: S) -> NewMatchRecord {
        NewMatchRecord {
            user_id: user_id.into(),
            deck_id: self.deck_id,
            challenge_id: self.challenge_id,
            score: self.score,
            max_score: self.max_score,
        }
    }
}

/// A read-only view of the engine, shaped for a presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchSnapshot {
    pub status: MatchStatus,
    pub mode: MatchMode,
    pub current_question_index: usize,
    pub question_count: usize,
    pub score: i64,
    pub lives: u8,
    pub lifelines: Lifelines,
    pub current_question: Option<Question>,
    pub awaiting_questions: bool,
    pub deck_id: Option<DeckId>,
    pub challenge_id: Option<ChallengeId>,
}
