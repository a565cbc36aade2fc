use sqlx::SqliteConnection;

use crate::db_types::{Coins, Profile};

pub async fn fetch_profile(user_id: &str, conn: &mut SqliteConnection) -> Result<Option<Profile>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM profiles WHERE user_id = $1").bind(user_id).fetch_optional(conn).await
}

pub async fn balance(user_id: &str, conn: &mut SqliteConnection) -> Result<Coins, sqlx::Error> {
    let coins = sqlx::query_scalar::<_, Coins>("SELECT coins FROM profiles WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(conn)
        .await?;
    Ok(coins.unwrap_or_default())
}

/// Increments the balance in place, creating the profile if it does not exist yet. Returns the new balance.
pub async fn credit(user_id: &str, coins: Coins, conn: &mut SqliteConnection) -> Result<Coins, sqlx::Error> {
    sqlx::query_scalar(
        r#"
            INSERT INTO profiles (user_id, coins) VALUES ($1, $2)
            ON CONFLICT (user_id) DO UPDATE SET coins = coins + excluded.coins, updated_at = CURRENT_TIMESTAMP
            RETURNING coins;
        "#,
    )
    .bind(user_id)
    .bind(coins)
    .fetch_one(conn)
    .await
}

/// Decrements the balance in place, but only if it covers `coins`. Returns the new balance, or `None` if the balance
/// was insufficient (or the profile does not exist).
pub async fn try_debit(user_id: &str, coins: Coins, conn: &mut SqliteConnection) -> Result<Option<Coins>, sqlx::Error> {
    sqlx::query_scalar(
        r#"
            UPDATE profiles SET coins = coins - $1, updated_at = CURRENT_TIMESTAMP
            WHERE user_id = $2 AND coins >= $1
            RETURNING coins;
        "#,
    )
    .bind(coins)
    .bind(user_id)
    .fetch_optional(conn)
    .await
}
