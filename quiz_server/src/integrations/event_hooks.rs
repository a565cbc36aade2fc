use std::{future::Future, pin::Pin};

use log::*;
use quiz_engine::events::{EventHandlers, EventHooks, MatchRecordedEvent, PaymentApprovedEvent};

pub const EVENT_BUFFER_SIZE: usize = 25;

/// The server's own event subscribers.
///
/// 1. PaymentApprovedEvent - Writes an audit line for every credited purchase, so that coin grants can be traced back
///    to the provider's payment id.
/// 2. MatchRecordedEvent - Notes finished challenge matches, which change a leaderboard.
pub fn create_event_handlers() -> EventHandlers {
    let mut hooks = EventHooks::default();
    hooks.on_payment_approved(|ev: PaymentApprovedEvent| {
        let PaymentApprovedEvent { transaction, coins_credited, new_balance } = ev;
        info!(
            "📬️ Payment {} approved. {} was credited {coins_credited} for {}. New balance: {new_balance}",
            transaction.provider_id, transaction.user_id, transaction.amount
        );
        no_op()
    });
    hooks.on_match_recorded(|ev: MatchRecordedEvent| {
        let record = ev.record;
        if let Some(challenge_id) = record.challenge_id {
            debug!(
                "📬️ {} scored {}/{} in {challenge_id}. The leaderboard has changed",
                record.user_id, record.score, record.max_score
            );
        }
        no_op()
    });
    EventHandlers::new(EVENT_BUFFER_SIZE, hooks)
}

fn no_op() -> Pin<Box<dyn Future<Output = ()> + Send>> {
    Box::pin(async {})
}
