use cucumber::given;
use quiz_engine::{db_types::NewDeck, test_utils::providers::sample_questions, DeckManagement};

use crate::cucumber::{QuizSystem, QuizWorld};

#[given("a fresh install")]
async fn fresh_database(world: &mut QuizWorld) {
    let system = QuizSystem::new().await;
    world.system = Some(system);
}

#[given(expr = "'{word}' owns a deck of {int} questions")]
async fn owned_deck(world: &mut QuizWorld, owner: String, count: usize) {
    let deck = NewDeck::new("Cucumber deck", "Botany", "Any", sample_questions("cuke", count)).with_owner(owner);
    let (deck, _) = world.system().db.purchase_deck(deck).await.expect("Error storing deck");
    world.system_mut().deck = Some(deck);
}
