use cucumber::{then, when};
use quiz_engine::{
    db_types::{Coins, Money, NewMatchRecord, TransactionStatus},
    test_utils::providers::provider_payment,
    AccountManagement,
    NotificationOutcome,
    PaymentLedger,
    PaymentRequest,
};

use crate::cucumber::QuizWorld;

//--------------------------------------       Payments       --------------------------------------------------------

#[when(expr = "'{word}' buys coins for {int} reais")]
async fn buy_coins(world: &mut QuizWorld, user: String, reais: i64) {
    let request = PaymentRequest::new(user, Money::from_reais(reais));
    let response = world.system().payments.create_payment_intent(request).await.expect("Error creating payment");
    world.system_mut().last_payment = Some(response.id);
}

#[when("the provider approves the last payment")]
async fn approve_last_payment(world: &mut QuizWorld) {
    let system = world.system();
    system.provider.approve(system.last_payment());
}

#[when(expr = "the provider marks the last payment as {string}")]
async fn mark_last_payment(world: &mut QuizWorld, status: String) {
    let status = status.parse::<TransactionStatus>().expect("Not a valid status");
    let system = world.system();
    system.provider.set_status(system.last_payment(), status);
}

#[when(expr = "the provider reports an approved payment {string} for {int} reais that we never recorded")]
async fn untracked_payment(world: &mut QuizWorld, id: String, reais: i64) {
    let payment = provider_payment(&id, Money::from_reais(reais), TransactionStatus::Approved);
    world.system().provider.insert_payment(payment);
}

#[when("the provider notifies us about the last payment")]
async fn notify_last_payment(world: &mut QuizWorld) {
    let id = world.system().last_payment().to_string();
    notify(world, &id).await;
}

#[when(expr = "the provider notifies us about the last payment {int} times")]
async fn notify_last_payment_repeatedly(world: &mut QuizWorld, times: usize) {
    let id = world.system().last_payment().to_string();
    for _ in 0..times {
        notify(world, &id).await;
    }
}

#[when(expr = "the provider notifies us about payment {string}")]
async fn notify_payment(world: &mut QuizWorld, id: String) {
    notify(world, &id).await;
}

async fn notify(world: &mut QuizWorld, id: &str) {
    let outcome = world.system().payments.handle_payment_notification(id).await;
    world.system_mut().last_outcome = Some(outcome);
}

#[then(expr = "the notification is handled as {string}")]
async fn check_outcome(world: &mut QuizWorld, expected: String) {
    let outcome = world.system().last_outcome.as_ref().expect("No notification has been handled");
    let outcome = outcome.as_ref().expect("The notification failed");
    let actual = match outcome {
        NotificationOutcome::Credited { .. } => "credited",
        NotificationOutcome::AlreadyProcessed => "already processed",
        NotificationOutcome::StatusMirrored(_) => "mirrored",
        NotificationOutcome::Unchanged => "unchanged",
    };
    assert_eq!(actual, expected, "Unexpected notification outcome");
}

#[then("the notification fails and asks for a retry")]
async fn check_retryable_failure(world: &mut QuizWorld) {
    let outcome = world.system().last_outcome.as_ref().expect("No notification has been handled");
    let err = outcome.as_ref().expect_err("The notification should have failed");
    assert!(err.is_retryable(), "{err} should be retryable");
}

#[then(expr = "'{word}' has a balance of {int} coins")]
async fn check_balance(world: &mut QuizWorld, user: String, coins: i64) {
    let balance = world.system().db.fetch_balance(&user).await.expect("Error fetching balance");
    assert_eq!(balance, Coins::from(coins), "Balance for {user} is incorrect");
}

#[then(expr = "a pending transaction for {int} coins exists for the last payment")]
async fn check_pending_transaction(world: &mut QuizWorld, coins: i64) {
    let system = world.system();
    let tx = system
        .db
        .fetch_transaction(system.last_payment())
        .await
        .expect("Error fetching transaction")
        .expect("No transaction was recorded");
    assert_eq!(tx.status, TransactionStatus::Pending);
    assert_eq!(tx.coins, Coins::from(coins));
}

#[then(expr = "the last payment has status {string}")]
async fn check_payment_status(world: &mut QuizWorld, status: String) {
    let expected = status.parse::<TransactionStatus>().expect("Not a valid status");
    let system = world.system();
    let tx = system
        .db
        .fetch_transaction(system.last_payment())
        .await
        .expect("Error fetching transaction")
        .expect("No transaction was recorded");
    assert_eq!(tx.status, expected);
}

//--------------------------------------      Challenges      --------------------------------------------------------

#[when(expr = "'{word}' creates a challenge on the deck")]
async fn create_challenge(world: &mut QuizWorld, creator: String) {
    let system = world.system();
    let deck = system.deck.as_ref().expect("No deck has been created");
    let challenge = system.matches.create_challenge(deck.id, &creator).await.expect("Error creating challenge");
    world.system_mut().challenge = Some(challenge);
}

#[when(expr = "'{word}' joins the challenge")]
async fn join_challenge(world: &mut QuizWorld, user: String) {
    let system = world.system();
    let deck = system.deck.as_ref().expect("No deck has been created");
    let challenge = system.challenge.as_ref().expect("No challenge has been created");
    system.matches.join_challenge(challenge.id, &user, deck.id, deck.max_score()).await.expect("Error joining");
}

#[when(expr = "'{word}' finishes the challenge with a score of {int}")]
async fn finish_challenge(world: &mut QuizWorld, user: String, score: i64) {
    let system = world.system();
    let deck = system.deck.as_ref().expect("No deck has been created");
    let challenge = system.challenge.as_ref().expect("No challenge has been created");
    let record = NewMatchRecord::new(user, deck.id, score, deck.max_score()).with_challenge(challenge.id);
    system.matches.record_match(record).await.expect("Error recording match");
}

#[then(expr = "the leaderboard has {int} record(s)")]
async fn check_leaderboard_size(world: &mut QuizWorld, count: usize) {
    let system = world.system();
    let challenge = system.challenge.as_ref().expect("No challenge has been created");
    let board = system.matches.leaderboard(challenge.id).await.expect("Error fetching leaderboard");
    assert_eq!(board.len(), count);
}

#[then(expr = "the leaderboard is {string}")]
async fn check_leaderboard(world: &mut QuizWorld, expected: String) {
    let system = world.system();
    let challenge = system.challenge.as_ref().expect("No challenge has been created");
    let board = system.matches.leaderboard(challenge.id).await.expect("Error fetching leaderboard");
    let actual = board.iter().map(|r| format!("{}:{}", r.user_id, r.score)).collect::<Vec<_>>().join(", ");
    assert_eq!(actual, expected);
}
