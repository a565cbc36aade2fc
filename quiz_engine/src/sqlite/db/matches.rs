use sqlx::SqliteConnection;

use crate::db_types::{ChallengeId, MatchRecord, NewMatchRecord};

/// Inserts a new record. A second record for the same challenge and player violates the unique index, and the
/// error is passed back to the caller.
pub async fn insert_match(record: NewMatchRecord, conn: &mut SqliteConnection) -> Result<MatchRecord, sqlx::Error> {
    sqlx::query_as(
        r#"
            INSERT INTO matches (user_id, deck_id, challenge_id, score, max_score)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *;
        "#,
    )
    .bind(record.user_id)
    .bind(record.deck_id)
    .bind(record.challenge_id)
    .bind(record.score)
    .bind(record.max_score)
    .fetch_one(conn)
    .await
}

pub async fn fetch_challenge_match(
    challenge_id: ChallengeId,
    user_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<MatchRecord>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM matches WHERE challenge_id = $1 AND user_id = $2")
        .bind(challenge_id)
        .bind(user_id)
        .fetch_optional(conn)
        .await
}

/// Overwrites the result stored against `(challenge_id, user_id)`. Returns `None` if there is no such record.
pub async fn update_challenge_match(
    challenge_id: ChallengeId,
    record: &NewMatchRecord,
    conn: &mut SqliteConnection,
) -> Result<Option<MatchRecord>, sqlx::Error> {
    sqlx::query_as(
        r#"
            UPDATE matches SET score = $1, max_score = $2, updated_at = CURRENT_TIMESTAMP
            WHERE challenge_id = $3 AND user_id = $4
            RETURNING *;
        "#,
    )
    .bind(record.score)
    .bind(record.max_score)
    .bind(challenge_id)
    .bind(&record.user_id)
    .fetch_optional(conn)
    .await
}

pub async fn leaderboard(challenge_id: ChallengeId, conn: &mut SqliteConnection) -> Result<Vec<MatchRecord>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM matches WHERE challenge_id = $1 ORDER BY score DESC, created_at ASC, id ASC")
        .bind(challenge_id)
        .fetch_all(conn)
        .await
}
