use sqlx::SqliteConnection;

use crate::db_types::{Challenge, ChallengeId, DeckId};

pub async fn insert_challenge(
    deck_id: DeckId,
    creator_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Challenge, sqlx::Error> {
    sqlx::query_as("INSERT INTO challenges (deck_id, creator_id) VALUES ($1, $2) RETURNING *")
        .bind(deck_id)
        .bind(creator_id)
        .fetch_one(conn)
        .await
}

pub async fn fetch_challenge(
    challenge_id: ChallengeId,
    conn: &mut SqliteConnection,
) -> Result<Option<Challenge>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM challenges WHERE id = $1").bind(challenge_id).fetch_optional(conn).await
}
