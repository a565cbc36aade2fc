use actix_web::{http::StatusCode, web, web::ServiceConfig};
use chrono::{TimeZone, Utc};
use quiz_engine::{
    db_types::{Challenge, ChallengeId, DeckId, MatchRecord},
    events::EventProducers,
    traits::{ChallengeBoard, JoinedChallenge, MatchStoreError},
    MatchApi,
};
use serde_json::Value;

use super::{helpers::{get_request, post_request}, mocks::MockQuizStore};
use crate::{
    data_objects::{JoinChallengeResponse, JoinStatus},
    routes::{ChallengeByIdRoute, CreateChallengeRoute, JoinChallengeRoute, RecordMatchRoute},
};

fn configure(store: MockQuizStore) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        let match_api = MatchApi::new(store, EventProducers::default());
        let scope = web::scope("/api")
            .service(CreateChallengeRoute::<MockQuizStore>::new())
            .service(JoinChallengeRoute::<MockQuizStore>::new())
            .service(ChallengeByIdRoute::<MockQuizStore>::new())
            .service(RecordMatchRoute::<MockQuizStore>::new());
        cfg.service(scope).app_data(web::Data::new(match_api));
    }
}

fn challenge(id: i64, deck_id: i64) -> Challenge {
    Challenge {
        id: ChallengeId::from(id),
        deck_id: DeckId::from(deck_id),
        creator_id: "alice".into(),
        created_at: Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
    }
}

fn record(id: i64, user_id: &str, challenge_id: Option<i64>, score: i64) -> MatchRecord {
    let ts = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap() + chrono::Duration::seconds(id);
    MatchRecord {
        id,
        user_id: user_id.into(),
        deck_id: DeckId::from(5),
        challenge_id: challenge_id.map(ChallengeId::from),
        score,
        max_score: 1000,
        created_at: ts,
        updated_at: ts,
    }
}

#[actix_web::test]
async fn create_challenge() {
    let _ = env_logger::try_init().ok();
    let mut store = MockQuizStore::new();
    store
        .expect_insert_challenge()
        .withf(|deck_id, creator| *deck_id == DeckId::from(5) && creator == "alice")
        .times(1)
        .returning(|deck_id, _| Ok(challenge(7, deck_id.0)));
    let body = r#"{"deckId":5,"userId":"alice"}"#;
    let (status, body) =
        post_request("/api/challenge/create", body, &[], configure(store)).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let response: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(response["challengeId"], 7);
}

#[actix_web::test]
async fn create_challenge_on_missing_deck() {
    let _ = env_logger::try_init().ok();
    let mut store = MockQuizStore::new();
    store.expect_insert_challenge().returning(|deck_id, _| Err(MatchStoreError::DeckNotFound(deck_id)));
    let body = r#"{"deckId":404,"userId":"alice"}"#;
    let (status, _) = post_request("/api/challenge/create", body, &[], configure(store)).await.expect("Request failed");
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn join_challenge() {
    let _ = env_logger::try_init().ok();
    let mut store = MockQuizStore::new();
    store
        .expect_join_challenge()
        .withf(|challenge_id, user_id, deck_id, max_score| {
            *challenge_id == ChallengeId::from(7) && user_id == "bob" && *deck_id == DeckId::from(5) && *max_score == 1000
        })
        .times(1)
        .returning(|challenge_id, user_id, _, _| {
            Ok(JoinedChallenge { record: record(11, user_id, Some(challenge_id.0), 0), existing: false })
        });
    let body = r#"{"challengeId":7,"userId":"bob","deckId":5,"maxScore":1000}"#;
    let (status, body) = post_request("/api/challenge/join", body, &[], configure(store)).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let response: JoinChallengeResponse = serde_json::from_str(&body).unwrap();
    assert_eq!(response, JoinChallengeResponse { success: true, match_id: 11, status: JoinStatus::New });
}

#[actix_web::test]
async fn rejoining_keeps_the_existing_entry() {
    let _ = env_logger::try_init().ok();
    let mut store = MockQuizStore::new();
    store.expect_join_challenge().times(1).returning(|challenge_id, user_id, _, _| {
        Ok(JoinedChallenge { record: record(11, user_id, Some(challenge_id.0), 640), existing: true })
    });
    let body = r#"{"challengeId":7,"userId":"bob","deckId":5,"maxScore":1000}"#;
    let (status, body) = post_request("/api/challenge/join", body, &[], configure(store)).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let response: JoinChallengeResponse = serde_json::from_str(&body).unwrap();
    assert_eq!(response, JoinChallengeResponse { success: true, match_id: 11, status: JoinStatus::Existing });
}

#[actix_web::test]
async fn join_without_user() {
    let _ = env_logger::try_init().ok();
    let mut store = MockQuizStore::new();
    store.expect_join_challenge().never();
    let body = r#"{"challengeId":7,"deckId":5,"maxScore":1000}"#;
    let (status, _) = post_request("/api/challenge/join", body, &[], configure(store)).await.expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn challenge_with_leaderboard() {
    let _ = env_logger::try_init().ok();
    let mut store = MockQuizStore::new();
    store.expect_fetch_challenge().times(1).returning(|id| Ok(Some(challenge(id.0, 5))));
    store.expect_fetch_deck().times(1).returning(|_| Ok(None));
    store.expect_fetch_leaderboard().times(1).returning(|id| {
        Ok(vec![record(3, "carol", Some(id.0), 900), record(1, "alice", Some(id.0), 700), record(2, "bob", Some(id.0), 500)])
    });
    let (status, body) = get_request("/api/challenge/7", configure(store)).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let board: ChallengeBoard = serde_json::from_str(&body).unwrap();
    assert_eq!(board.challenge.id, ChallengeId::from(7));
    assert!(board.deck.is_none());
    let ranking = board.leaderboard.iter().map(|r| r.user_id.as_str()).collect::<Vec<_>>();
    assert_eq!(ranking, ["carol", "alice", "bob"]);
}

#[actix_web::test]
async fn unknown_challenge() {
    let _ = env_logger::try_init().ok();
    let mut store = MockQuizStore::new();
    store.expect_fetch_challenge().times(1).returning(|_| Ok(None));
    store.expect_fetch_leaderboard().never();
    let (status, body) = get_request("/api/challenge/99", configure(store)).await.expect("Request failed");
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, r#"{"error":"The data was not found. Challenge challenge#99 does not exist"}"#);
}

#[actix_web::test]
async fn record_match() {
    let _ = env_logger::try_init().ok();
    let mut store = MockQuizStore::new();
    store
        .expect_upsert_match()
        .withf(|r| r.user_id == "alice" && r.score == 730 && r.challenge_id == Some(ChallengeId::from(7)))
        .times(1)
        .returning(|r| Ok(record(21, &r.user_id, r.challenge_id.map(|c| c.0), r.score)));
    let body = r#"{"userId":"alice","deckId":5,"challengeId":7,"score":730,"maxScore":1000}"#;
    let (status, body) = post_request("/api/matches", body, &[], configure(store)).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let saved: MatchRecord = serde_json::from_str(&body).unwrap();
    assert_eq!(saved.id, 21);
    assert_eq!(saved.score, 730);
}

#[actix_web::test]
async fn negative_scores_are_rejected() {
    let _ = env_logger::try_init().ok();
    let mut store = MockQuizStore::new();
    store.expect_upsert_match().never();
    let body = r#"{"userId":"alice","deckId":5,"score":-10,"maxScore":1000}"#;
    let (status, _) = post_request("/api/matches", body, &[], configure(store)).await.expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
