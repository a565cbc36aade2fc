use actix_web::{http::StatusCode, web, web::ServiceConfig};
use quiz_engine::{
    db_types::{Coins, Deck, NewDeck},
    test_utils::providers::{sample_questions, StaticDeckProvider},
    traits::DeckStoreError,
    DeckApi,
    DeckApiOptions,
};
use serde_json::Value;

use super::{
    helpers::{get_request, post_request, stored_deck},
    mocks::MockDeckStore,
};
use crate::routes::{DailyDeckRoute, DeckByIdRoute, GenerateDeckRoute};

fn configure(store: MockDeckStore, provider: StaticDeckProvider) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        let options = DeckApiOptions { deck_cost: Coins::from(50), ..Default::default() };
        let deck_api = DeckApi::new(store, provider).with_options(options);
        let scope = web::scope("/api")
            .service(GenerateDeckRoute::<MockDeckStore, StaticDeckProvider>::new())
            .service(DailyDeckRoute::<MockDeckStore, StaticDeckProvider>::new())
            .service(DeckByIdRoute::<MockDeckStore, StaticDeckProvider>::new());
        cfg.service(scope).app_data(web::Data::new(deck_api));
    }
}

#[actix_web::test]
async fn generate_deck() {
    let _ = env_logger::try_init().ok();
    let mut store = MockDeckStore::new();
    store.expect_purchase_deck().times(1).returning(|deck: NewDeck| {
        assert_eq!(deck.owner_id.as_deref(), Some("alice"));
        assert_eq!(deck.cost, Coins::from(50));
        assert_eq!(deck.title, "Chemistry (9th grade)");
        Ok((stored_deck(12, deck), Coins::from(250)))
    });
    let body = r#"{"userId":"alice","subject":"Chemistry","grade":"9th grade"}"#;
    let (status, body) = post_request("/api/generate-deck", body, &[], configure(store, StaticDeckProvider::new()))
        .await
        .expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let response: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(response["deckId"], 12);
    assert_eq!(response["balance"], 250);
    assert_eq!(response["deck"]["questions"].as_array().map(|q| q.len()), Some(10));
}

#[actix_web::test]
async fn generate_deck_without_funds() {
    let _ = env_logger::try_init().ok();
    let mut store = MockDeckStore::new();
    store.expect_purchase_deck().times(1).returning(|_| {
        Err(DeckStoreError::InsufficientFunds { required: Coins::from(50), available: Coins::from(20) })
    });
    let body = r#"{"userId":"bob"}"#;
    let (status, body) = post_request("/api/generate-deck", body, &[], configure(store, StaticDeckProvider::new()))
        .await
        .expect("Request failed");
    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
    assert!(body.contains("error"));
}

#[actix_web::test]
async fn generator_outage_charges_nothing() {
    let _ = env_logger::try_init().ok();
    let mut store = MockDeckStore::new();
    store.expect_purchase_deck().never();
    let provider = StaticDeckProvider::new();
    provider.set_failing(true);
    let body = r#"{"userId":"carol","subject":"History"}"#;
    let (status, _) =
        post_request("/api/generate-deck", body, &[], configure(store, provider)).await.expect("Request failed");
    assert_eq!(status, StatusCode::BAD_GATEWAY);
}

#[actix_web::test]
async fn existing_daily_deck_is_served() {
    let _ = env_logger::try_init().ok();
    let mut store = MockDeckStore::new();
    store.expect_fetch_daily_deck().times(1).returning(|date| {
        let deck = NewDeck::new("Daily Challenge", "Daily Challenge", "General", sample_questions("daily", 7)).for_day(date);
        Ok(Some(stored_deck(3, deck)))
    });
    store.expect_insert_daily_deck().never();
    let (status, body) = get_request("/api/daily-deck", configure(store, StaticDeckProvider::new()))
        .await
        .expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let deck: Deck = serde_json::from_str(&body).unwrap();
    assert!(deck.is_daily);
    assert_eq!(deck.questions.len(), 7);
    assert_eq!(deck.cost, Coins::default());
}

#[actix_web::test]
async fn first_daily_deck_request_generates_it() {
    let _ = env_logger::try_init().ok();
    let mut store = MockDeckStore::new();
    store.expect_fetch_daily_deck().times(1).returning(|_| Ok(None));
    store.expect_insert_daily_deck().times(1).returning(|deck| Ok(stored_deck(4, deck)));
    let (status, body) = get_request("/api/daily-deck", configure(store, StaticDeckProvider::new()))
        .await
        .expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let deck: Deck = serde_json::from_str(&body).unwrap();
    let date = deck.daily_date.expect("daily deck has no date");
    assert_eq!(deck.questions[0].id, format!("daily-{date}-0"));
    assert_eq!(deck.questions.len(), 7);
}

#[actix_web::test]
async fn unknown_deck() {
    let _ = env_logger::try_init().ok();
    let mut store = MockDeckStore::new();
    store.expect_fetch_deck().times(1).returning(|_| Ok(None));
    let (status, body) =
        get_request("/api/decks/99", configure(store, StaticDeckProvider::new())).await.expect("Request failed");
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, r#"{"error":"The data was not found. deck#99"}"#);
}
