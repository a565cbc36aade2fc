use crate::match_engine::{MatchEngine, MatchStatus};

/// A marathon refill is requested when exactly this many questions remain (counting the current one).
pub const REFILL_THRESHOLDS: [usize; 2] = [3, 1];
/// Refills are only considered once the remaining question count is this low.
pub const REFILL_WINDOW: usize = 5;

/// Identifies one crossing of a refill threshold. The deck only ever grows, so the pair is unique per crossing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RefillTrigger {
    pub deck_len: usize,
    pub remaining: usize,
}

/// Returns the threshold crossing the engine is currently sitting on, if a refill is due.
pub fn refill_trigger(engine: &MatchEngine) -> Option<RefillTrigger> {
    if !engine.mode().is_marathon() || engine.status() != MatchStatus::Playing {
        return None;
    }
    let remaining = engine.remaining_questions();
    (remaining <= REFILL_WINDOW && REFILL_THRESHOLDS.contains(&remaining))
        .then(|| RefillTrigger { deck_len: engine.deck().len(), remaining })
}
