use log::*;

use crate::{
    db_types::{ChallengeId, DeckId, Question},
    match_engine::{
        max_score_for,
        Advance,
        AnswerOutcome,
        LifelineType,
        Lifelines,
        MatchError,
        MatchMode,
        MatchOutcome,
        MatchSetup,
        MatchSnapshot,
        MatchStatus,
        COMPLETION_BONUS,
        POINTS_PER_CORRECT_ANSWER,
        STARTING_LIVES,
    },
};

/// The state of one quiz attempt, and the only place it may be mutated.
///
/// Invariants maintained by every transition:
/// * `0 <= current_question_index <= deck.len()`
/// * `lives <= STARTING_LIVES`, and `lives == 0` implies `status == Lost`
/// * once `Won` or `Lost`, nothing changes until [`Self::restart_game`] or [`Self::reset_game`]
#[derive(Debug, Clone)]
pub struct MatchEngine {
    status: MatchStatus,
    current_question_index: usize,
    score: i64,
    lives: u8,
    lifelines: Lifelines,
    deck: Vec<Question>,
    deck_id: Option<DeckId>,
    mode: MatchMode,
    subject: String,
    grade: String,
    challenge_id: Option<ChallengeId>,
    // The answer given to the current question, if any. Cleared whenever the index moves.
    answered: Option<AnswerOutcome>,
    // Set when a marathon skip moved past the last materialized question. The next appended question becomes
    // current without a further advance.
    parked_at_end: bool,
}

impl Default for MatchEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MatchEngine {
    pub fn new() -> Self {
        Self {
            status: MatchStatus::Idle,
            current_question_index: 0,
            score: 0,
            lives: STARTING_LIVES,
            lifelines: Lifelines::default(),
            deck: Vec::new(),
            deck_id: None,
            mode: MatchMode::default(),
            subject: String::new(),
            grade: String::new(),
            challenge_id: None,
            answered: None,
            parked_at_end: false,
        }
    }

    pub fn status(&self) -> MatchStatus {
        self.status
    }

    pub fn mode(&self) -> MatchMode {
        self.mode
    }

    pub fn score(&self) -> i64 {
        self.score
    }

    pub fn lives(&self) -> u8 {
        self.lives
    }

    pub fn lifelines(&self) -> Lifelines {
        self.lifelines
    }

    pub fn current_question_index(&self) -> usize {
        self.current_question_index
    }

    pub fn deck(&self) -> &[Question] {
        &self.deck
    }

    pub fn deck_id(&self) -> Option<DeckId> {
        self.deck_id
    }

    pub fn challenge_id(&self) -> Option<ChallengeId> {
        self.challenge_id
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn grade(&self) -> &str {
        &self.grade
    }

    pub fn last_answer(&self) -> Option<AnswerOutcome> {
        self.answered
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.deck.get(self.current_question_index)
    }

    /// Number of questions from the current one (inclusive) to the end of the materialized deck.
    pub fn remaining_questions(&self) -> usize {
        self.deck.len().saturating_sub(self.current_question_index)
    }

    pub fn max_score(&self) -> i64 {
        max_score_for(self.deck.len())
    }

    /// True when a marathon match has run out of materialized questions, i.e. [`Self::next_question`] would
    /// return [`Advance::AwaitingQuestions`].
    pub fn is_awaiting_questions(&self) -> bool {
        if self.status != MatchStatus::Playing || !self.mode.is_marathon() {
            return false;
        }
        if self.parked_at_end {
            self.current_question_index >= self.deck.len()
        } else {
            self.current_question_index + 1 >= self.deck.len()
        }
    }

    /// Begin a new match on the given deck. Any previous match state is discarded.
    pub fn start_game(&mut self, setup: MatchSetup) -> Result<(), MatchError> {
        if setup.deck.is_empty() {
            return Err(MatchError::EmptyDeck);
        }
        for question in &setup.deck {
            question.validate()?;
        }
        debug!(
            "🎮️ Starting {:?} match on {} with {} questions{}",
            setup.mode,
            setup.deck_id,
            setup.deck.len(),
            setup.challenge_id.map(|c| format!(" for {c}")).unwrap_or_default()
        );
        *self = Self {
            status: MatchStatus::Playing,
            deck: setup.deck,
            deck_id: Some(setup.deck_id),
            mode: setup.mode,
            subject: setup.subject,
            grade: setup.grade,
            challenge_id: setup.challenge_id,
            ..Self::new()
        };
        Ok(())
    }

    /// Submit an answer for the current question. The index is never moved here, so that the caller can show
    /// feedback before calling [`Self::next_question`].
    pub fn answer_question(&mut self, option: usize) -> Result<AnswerOutcome, MatchError> {
        self.ensure_playing()?;
        let question = self.current_question().ok_or(MatchError::NoCurrentQuestion)?;
        if option >= question.options.len() {
            return Err(MatchError::OptionOutOfRange { option, count: question.options.len() });
        }
        if self.answered.is_some() {
            return Err(MatchError::AlreadyAnswered);
        }
        let outcome = if question.is_correct(option) {
            self.score += POINTS_PER_CORRECT_ANSWER;
            AnswerOutcome::Correct
        } else {
            self.lives = self.lives.saturating_sub(1);
            if self.lives == 0 {
                debug!("🎮️ Out of lives on question {}. Final score: {}", self.current_question_index, self.score);
                self.status = MatchStatus::Lost;
            }
            AnswerOutcome::Wrong
        };
        trace!("🎮️ Question {} answered: {outcome:?}", self.current_question_index);
        self.answered = Some(outcome);
        Ok(outcome)
    }

    /// Move on to the next question.
    ///
    /// On the last question of a standard or daily deck, this completes the match and awards the completion bonus.
    /// In marathon mode the call stalls (returns [`Advance::AwaitingQuestions`]) until more questions have been
    /// appended.
    pub fn next_question(&mut self) -> Advance {
        if self.status != MatchStatus::Playing {
            return Advance::Ignored;
        }
        let len = self.deck.len();
        if self.parked_at_end {
            if self.current_question_index >= len {
                return Advance::AwaitingQuestions;
            }
            self.parked_at_end = false;
            // The refill already put a question under the index. Only move past it once it has been answered.
            if self.answered.is_none() {
                return Advance::Advanced;
            }
        }
        if self.current_question_index + 1 < len {
            self.move_to(self.current_question_index + 1);
            Advance::Advanced
        } else if self.mode.is_marathon() {
            trace!("🎮️ Marathon deck exhausted at question {}. Waiting for more", self.current_question_index);
            Advance::AwaitingQuestions
        } else {
            self.complete();
            Advance::Won
        }
    }

    /// Extend the deck. The current index and the score are untouched. Invalid questions are dropped.
    ///
    /// Returns the number of questions appended.
    pub fn append_questions(&mut self, more: Vec<Question>) -> usize {
        let before = self.deck.len();
        for question in more {
            match question.validate() {
                Ok(()) => self.deck.push(question),
                Err(e) => warn!("🎮️ Dropping invalid question from refill. {e}"),
            }
        }
        let added = self.deck.len() - before;
        trace!("🎮️ Appended {added} questions. Deck now has {}", self.deck.len());
        added
    }

    pub fn use_lifeline(&mut self, lifeline: LifelineType) -> Result<(), MatchError> {
        self.ensure_playing()?;
        if !self.lifelines.is_available(lifeline) {
            return Err(MatchError::LifelineUsed(lifeline));
        }
        if self.current_question().is_none() {
            return Err(MatchError::NoCurrentQuestion);
        }
        if self.answered.is_some() {
            return Err(MatchError::AlreadyAnswered);
        }
        self.lifelines.consume(lifeline);
        debug!("🎮️ {lifeline} lifeline used on question {}", self.current_question_index);
        if lifeline == LifelineType::Skip {
            let next = self.current_question_index + 1;
            if next < self.deck.len() {
                self.move_to(next);
            } else if self.mode.is_marathon() {
                self.move_to(next);
                self.parked_at_end = true;
            } else {
                self.complete();
            }
        }
        Ok(())
    }

    /// End the match as lost, e.g. because the player ran out of time.
    pub fn force_loss(&mut self) -> Result<(), MatchError> {
        self.ensure_playing()?;
        debug!("🎮️ Match forfeited on question {}. Final score: {}", self.current_question_index, self.score);
        self.status = MatchStatus::Lost;
        Ok(())
    }

    /// Abandon the match. The deck is cleared.
    pub fn reset_game(&mut self) {
        trace!("🎮️ Match reset");
        *self = Self::new();
    }

    /// Replay the loaded deck from the start. Score, lives and lifelines are reset.
    pub fn restart_game(&mut self) -> Result<(), MatchError> {
        if self.deck.is_empty() {
            return Err(MatchError::EmptyDeck);
        }
        debug!("🎮️ Restarting match on {:?}", self.deck_id);
        self.status = MatchStatus::Playing;
        self.current_question_index = 0;
        self.score = 0;
        self.lives = STARTING_LIVES;
        self.lifelines = Lifelines::default();
        self.answered = None;
        self.parked_at_end = false;
        Ok(())
    }

    /// The outcome of the match, once it has ended.
    pub fn result(&self) -> Option<MatchOutcome> {
        if !self.status.is_terminal() {
            return None;
        }
        let deck_id = self.deck_id?;
        Some(MatchOutcome {
            deck_id,
            challenge_id: self.challenge_id,
            status: self.status,
            mode: self.mode,
            score: self.score,
            max_score: self.max_score(),
        })
    }

    pub fn snapshot(&self) -> MatchSnapshot {
        MatchSnapshot {
            status: self.status,
            mode: self.mode,
            current_question_index: self.current_question_index,
            question_count: self.deck.len(),
            score: self.score,
            lives: self.lives,
            lifelines: self.lifelines,
            current_question: self.current_question().cloned(),
            awaiting_questions: self.is_awaiting_questions(),
            deck_id: self.deck_id,
            challenge_id: self.challenge_id,
        }
    }

    fn ensure_playing(&self) -> Result<(), MatchError> {
        match self.status {
            MatchStatus::Playing => Ok(()),
            s => Err(MatchError::NotPlaying(s)),
        }
    }

    fn move_to(&mut self, index: usize) {
        self.current_question_index = index;
        self.answered = None;
    }

    fn complete(&mut self) {
        self.move_to(self.deck.len());
        self.score += COMPLETION_BONUS;
        self.status = MatchStatus::Won;
        debug!("🎮️ Deck complete. Final score: {}", self.score);
    }
}
