use std::{fmt::Debug, sync::Arc, time::Duration};

use log::*;
use tokio::sync::oneshot::{self, error::TryRecvError};

use crate::{
    db_types::Question,
    match_engine::{
        refill_trigger,
        Advance,
        AnswerOutcome,
        LifelineType,
        MatchEngine,
        MatchError,
        MatchOutcome,
        MatchSetup,
        RefillTrigger,
    },
    traits::{DeckProvider, DeckProviderError, DeckRequest},
};

type RefillResult = Result<Vec<Question>, DeckProviderError>;

#[derive(Debug, Clone, Copy)]
pub struct RefillOptions {
    /// How many questions to ask the deck provider for on each refill.
    pub batch_size: usize,
    pub timeout: Duration,
}

impl Default for RefillOptions {
    fn default() -> Self {
        Self { batch_size: 10, timeout: Duration::from_secs(60) }
    }
}

/// A [`MatchEngine`] paired with a deck provider.
///
/// Every transition is forwarded to the engine, after which the session
/// * appends any refill batch that has arrived in the meantime, and
/// * starts a background refill if the match just crossed a refill threshold and no refill is in flight.
///
/// Refills run on spawned tokio tasks, so a session must be driven from within a tokio runtime. A failed refill
/// leaves the match untouched. The next threshold crossing, or an explicit [`Self::retry_refill`], tries again.
///
/// The session also guards the persistence hook: [`Self::take_result`] hands out the outcome of a finished match
/// exactly once.
pub struct MatchSession<P> {
    engine: MatchEngine,
    provider: Arc<P>,
    options: RefillOptions,
    in_flight: Option<oneshot::Receiver<RefillResult>>,
    last_trigger: Option<RefillTrigger>,
    refills_requested: usize,
    result_taken: bool,
}

impl<P> Debug for MatchSession<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MatchSession ({:?}, refilling: {})", self.engine.status(), self.in_flight.is_some())
    }
}

impl<P> MatchSession<P>
where P: DeckProvider
{
    pub fn new(provider: Arc<P>, options: RefillOptions) -> Self {
        Self {
            engine: MatchEngine::new(),
            provider,
            options,
            in_flight: None,
            last_trigger: None,
            refills_requested: 0,
            result_taken: false,
        }
    }

    pub fn engine(&self) -> &MatchEngine {
        &self.engine
    }

    pub fn is_refilling(&self) -> bool {
        self.in_flight.is_some()
    }

    /// The number of refill requests sent to the deck provider since the last start or reset.
    pub fn refills_requested(&self) -> usize {
        self.refills_requested
    }

    pub fn start_game(&mut self, setup: MatchSetup) -> Result<(), MatchError> {
        self.engine.start_game(setup)?;
        self.abandon_refill();
        self.refills_requested = 0;
        self.result_taken = false;
        self.sync_refill();
        Ok(())
    }

    pub fn answer_question(&mut self, option: usize) -> Result<AnswerOutcome, MatchError> {
        let result = self.engine.answer_question(option);
        self.sync_refill();
        result
    }

    pub fn next_question(&mut self) -> Advance {
        self.collect_refill();
        let advance = self.engine.next_question();
        self.sync_refill();
        advance
    }

    pub fn use_lifeline(&mut self, lifeline: LifelineType) -> Result<(), MatchError> {
        let result = self.engine.use_lifeline(lifeline);
        self.sync_refill();
        result
    }

    pub fn append_questions(&mut self, more: Vec<Question>) -> usize {
        let added = self.engine.append_questions(more);
        self.sync_refill();
        added
    }

    pub fn force_loss(&mut self) -> Result<(), MatchError> {
        self.engine.force_loss()
    }

    pub fn reset_game(&mut self) {
        self.engine.reset_game();
        self.abandon_refill();
        self.refills_requested = 0;
        self.result_taken = false;
    }

    /// Replays the same deck. A refill still in flight is kept, since it extends the same deck, but threshold
    /// crossings are tracked afresh for the replay.
    pub fn restart_game(&mut self) -> Result<(), MatchError> {
        self.engine.restart_game()?;
        self.last_trigger = None;
        self.result_taken = false;
        self.sync_refill();
        Ok(())
    }

    /// Returns the outcome of a finished match the first time it is called after the match ends, and `None`
    /// thereafter, until a new match is started or restarted.
    pub fn take_result(&mut self) -> Option<MatchOutcome> {
        if self.result_taken {
            return None;
        }
        let result = self.engine.result()?;
        self.result_taken = true;
        Some(result)
    }

    /// Appends a refill batch if one has arrived, without waiting. Returns the number of questions appended.
    pub fn poll_refill(&mut self) -> usize {
        let added = self.collect_refill();
        self.request_refill_if_due();
        added
    }

    /// Waits for the in-flight refill, if any, and appends its questions. Returns `None` if nothing was in flight.
    pub async fn wait_for_refill(&mut self) -> Option<usize> {
        let receiver = self.in_flight.take()?;
        let added = match receiver.await {
            Ok(result) => self.apply_refill(result),
            Err(_) => {
                warn!("🎮️ Refill task ended without a result");
                0
            },
        };
        self.request_refill_if_due();
        Some(added)
    }

    /// Requests a refill right away, regardless of thresholds, unless one is already in flight or the match is
    /// not a marathon in progress. Use this when the player is stalled after a failed refill.
    pub fn retry_refill(&mut self) -> bool {
        self.collect_refill();
        if self.in_flight.is_some() || !self.engine.mode().is_marathon() || self.engine.result().is_some() {
            return false;
        }
        if !self.engine.is_awaiting_questions() && self.engine.remaining_questions() > 0 {
            return false;
        }
        self.spawn_refill();
        true
    }

    fn sync_refill(&mut self) {
        self.collect_refill();
        self.request_refill_if_due();
    }

    fn collect_refill(&mut self) -> usize {
        let Some(receiver) = self.in_flight.as_mut() else {
            return 0;
        };
        match receiver.try_recv() {
            Ok(result) => {
                self.in_flight = None;
                self.apply_refill(result)
            },
            Err(TryRecvError::Empty) => 0,
            Err(TryRecvError::Closed) => {
                warn!("🎮️ Refill task ended without a result");
                self.in_flight = None;
                0
            },
        }
    }

    fn apply_refill(&mut self, result: RefillResult) -> usize {
        match result {
            Ok(questions) if self.engine.mode().is_marathon() => {
                let added = self.engine.append_questions(questions);
                debug!("🎮️ Marathon refill landed with {added} questions");
                added
            },
            Ok(_) => 0,
            Err(e) => {
                warn!("🎮️ Marathon refill failed. It will be retried at the next threshold. {e}");
                0
            },
        }
    }

    fn request_refill_if_due(&mut self) {
        if self.in_flight.is_some() {
            return;
        }
        let Some(trigger) = refill_trigger(&self.engine) else {
            return;
        };
        if self.last_trigger == Some(trigger) {
            return;
        }
        self.last_trigger = Some(trigger);
        trace!("🎮️ Refill threshold crossed: {trigger:?}");
        self.spawn_refill();
    }

    fn spawn_refill(&mut self) {
        let (sender, receiver) = oneshot::channel();
        let provider = Arc::clone(&self.provider);
        let request = DeckRequest::new(self.engine.subject(), self.engine.grade(), self.options.batch_size);
        let timeout = self.options.timeout;
        debug!("🎮️ Requesting {} more questions for the marathon", request.count);
        tokio::spawn(async move {
            let result = match tokio::time::timeout(timeout, provider.generate_deck(request)).await {
                Ok(Ok(deck)) => Ok(deck.questions),
                Ok(Err(e)) => Err(e),
                Err(_) => Err(DeckProviderError::Timeout),
            };
            // The session may have been reset in the meantime, in which case nobody is listening.
            let _ = sender.send(result);
        });
        self.in_flight = Some(receiver);
        self.refills_requested += 1;
    }

    fn abandon_refill(&mut self) {
        if self.in_flight.take().is_some() {
            debug!("🎮️ Discarding in-flight refill for the previous match");
        }
        self.last_trigger = None;
    }
}
