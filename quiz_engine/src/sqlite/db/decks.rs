use chrono::NaiveDate;
use sqlx::{sqlite::SqliteRow, FromRow, Row, SqliteConnection};

use super::is_unique_violation;
use crate::{
    db_types::{Deck, DeckId, NewDeck},
    traits::DeckStoreError,
};

impl FromRow<'_, SqliteRow> for Deck {
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        let questions: String = row.try_get("questions")?;
        let questions = serde_json::from_str(&questions)
            .map_err(|e| sqlx::Error::ColumnDecode { index: "questions".into(), source: Box::new(e) })?;
        Ok(Self {
            id: row.try_get("id")?,
            owner_id: row.try_get("owner_id")?,
            title: row.try_get("title")?,
            subject: row.try_get("subject")?,
            grade: row.try_get("grade")?,
            questions,
            is_daily: row.try_get("is_daily")?,
            daily_date: row.try_get("daily_date")?,
            cost: row.try_get("cost")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

pub async fn insert_deck(deck: NewDeck, conn: &mut SqliteConnection) -> Result<Deck, DeckStoreError> {
    let questions = serde_json::to_string(&deck.questions)?;
    let is_daily = deck.is_daily();
    let daily_date = deck.daily_date;
    let result: Result<Deck, sqlx::Error> = sqlx::query_as(
        r#"
            INSERT INTO decks (owner_id, title, subject, grade, questions, is_daily, daily_date, cost)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *;
        "#,
    )
    .bind(deck.owner_id)
    .bind(deck.title)
    .bind(deck.subject)
    .bind(deck.grade)
    .bind(questions)
    .bind(is_daily)
    .bind(deck.daily_date)
    .bind(deck.cost)
    .fetch_one(conn)
    .await;
    match (result, daily_date) {
        (Err(e), Some(date)) if is_unique_violation(&e) => Err(DeckStoreError::DailyDeckExists(date)),
        (result, _) => Ok(result?),
    }
}

pub async fn fetch_deck(deck_id: DeckId, conn: &mut SqliteConnection) -> Result<Option<Deck>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM decks WHERE id = $1").bind(deck_id).fetch_optional(conn).await
}

pub async fn fetch_daily_deck(date: NaiveDate, conn: &mut SqliteConnection) -> Result<Option<Deck>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM decks WHERE is_daily AND daily_date = $1").bind(date).fetch_optional(conn).await
}

pub async fn deck_exists(deck_id: DeckId, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM decks WHERE id = $1")
        .bind(deck_id)
        .fetch_one(conn)
        .await?;
    Ok(count > 0)
}
