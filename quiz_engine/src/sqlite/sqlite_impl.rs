//! `SqliteDatabase` is a concrete implementation of a quiz engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`traits`] module.
//!
//! [`traits`]: crate::traits
use std::fmt::Debug;

use chrono::NaiveDate;
use log::*;
use sqlx::{migrate, SqlitePool};

use super::db::{challenges, db_url, decks, is_unique_violation, matches, new_pool, profiles, transactions};
use crate::{
    db_types::{
        Challenge,
        ChallengeId,
        Coins,
        Deck,
        DeckId,
        MatchRecord,
        NewDeck,
        NewMatchRecord,
        NewTransaction,
        Profile,
        Transaction,
        TransactionStatus,
    },
    traits::{
        AccountApiError,
        AccountManagement,
        CreditResult,
        DeckManagement,
        DeckStoreError,
        InsertTransactionResult,
        JoinedChallenge,
        MatchManagement,
        MatchStoreError,
        PaymentLedger,
        PaymentLedgerError,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SqliteDatabase ({})", self.url)
    }
}

impl AccountManagement for SqliteDatabase {
    async fn fetch_profile(&self, user_id: &str) -> Result<Option<Profile>, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        let profile = profiles::fetch_profile(user_id, &mut conn).await?;
        Ok(profile)
    }

    async fn fetch_balance(&self, user_id: &str) -> Result<Coins, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        let balance = profiles::balance(user_id, &mut conn).await?;
        Ok(balance)
    }
}

impl PaymentLedger for SqliteDatabase {
    async fn insert_pending_transaction(
        &self,
        transaction: NewTransaction,
    ) -> Result<InsertTransactionResult, PaymentLedgerError> {
        let mut conn = self.pool.acquire().await?;
        let result = transactions::idempotent_insert(transaction, &mut conn).await?;
        if let InsertTransactionResult::Inserted(t) = &result {
            debug!("🗃️ Pending transaction {} for {} saved with id {}", t.provider_id, t.user_id, t.id);
        }
        Ok(result)
    }

    async fn fetch_transaction(&self, provider_id: &str) -> Result<Option<Transaction>, PaymentLedgerError> {
        let mut conn = self.pool.acquire().await?;
        let transaction = transactions::fetch_by_provider_id(provider_id, &mut conn).await?;
        Ok(transaction)
    }

    async fn mirror_transaction_status(
        &self,
        provider_id: &str,
        status: TransactionStatus,
    ) -> Result<Option<Transaction>, PaymentLedgerError> {
        if status.is_approved() {
            return Err(PaymentLedgerError::TransactionUpdateError(
                provider_id.to_string(),
                "approval must go through credit_approved_transaction".into(),
            ));
        }
        let mut conn = self.pool.acquire().await?;
        let updated = transactions::mirror_status(provider_id, status, &mut conn).await?;
        match &updated {
            Some(_) => debug!("🗃️ Transaction {provider_id} is now {status}"),
            None => trace!("🗃️ Transaction {provider_id} was not moved to {status}"),
        }
        Ok(updated)
    }

    async fn credit_approved_transaction(
        &self,
        provider_id: &str,
        coins: Coins,
    ) -> Result<CreditResult, PaymentLedgerError> {
        let mut tx = self.pool.begin().await?;
        // The write comes first so that this transaction takes the write lock immediately. A concurrent delivery for
        // the same payment blocks here until we commit, and then finds nothing left to approve.
        let Some(transaction) = transactions::mark_approved(provider_id, &mut tx).await? else {
            let existing = transactions::fetch_by_provider_id(provider_id, &mut tx).await?;
            tx.rollback().await?;
            return match existing {
                Some(_) => {
                    debug!("🗃️ Transaction {provider_id} was already approved. Nothing to credit");
                    Ok(CreditResult::AlreadyApproved)
                },
                None => Ok(CreditResult::TransactionNotFound),
            };
        };
        let new_balance = profiles::credit(&transaction.user_id, coins, &mut tx).await?;
        tx.commit().await?;
        info!(
            "🗃️ Transaction {provider_id} approved. {coins} credited to {}. New balance: {new_balance}",
            transaction.user_id
        );
        Ok(CreditResult::Credited { transaction, coins, new_balance })
    }
}

impl MatchManagement for SqliteDatabase {
    async fn insert_challenge(&self, deck_id: DeckId, creator_id: &str) -> Result<Challenge, MatchStoreError> {
        let mut tx = self.pool.begin().await?;
        if !decks::deck_exists(deck_id, &mut tx).await? {
            return Err(MatchStoreError::DeckNotFound(deck_id));
        }
        let challenge = challenges::insert_challenge(deck_id, creator_id, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ {} created on {deck_id} by {creator_id}", challenge.id);
        Ok(challenge)
    }

    async fn fetch_challenge(&self, challenge_id: ChallengeId) -> Result<Option<Challenge>, MatchStoreError> {
        let mut conn = self.pool.acquire().await?;
        let challenge = challenges::fetch_challenge(challenge_id, &mut conn).await?;
        Ok(challenge)
    }

    async fn join_challenge(
        &self,
        challenge_id: ChallengeId,
        user_id: &str,
        deck_id: DeckId,
        max_score: i64,
    ) -> Result<JoinedChallenge, MatchStoreError> {
        let mut conn = self.pool.acquire().await?;
        if challenges::fetch_challenge(challenge_id, &mut conn).await?.is_none() {
            return Err(MatchStoreError::ChallengeNotFound(challenge_id));
        }
        if let Some(record) = matches::fetch_challenge_match(challenge_id, user_id, &mut conn).await? {
            trace!("🗃️ {user_id} has already joined {challenge_id}");
            return Ok(JoinedChallenge { record, existing: true });
        }
        let placeholder = NewMatchRecord::new(user_id, deck_id, 0, max_score).with_challenge(challenge_id);
        match matches::insert_match(placeholder, &mut conn).await {
            Ok(record) => {
                debug!("🗃️ {user_id} joined {challenge_id}");
                Ok(JoinedChallenge { record, existing: false })
            },
            // Lost a race with a concurrent join for the same player
            Err(e) if is_unique_violation(&e) => {
                let record = matches::fetch_challenge_match(challenge_id, user_id, &mut conn)
                    .await?
                    .ok_or_else(|| MatchStoreError::DatabaseError(format!("Record for {user_id} vanished")))?;
                Ok(JoinedChallenge { record, existing: true })
            },
            Err(e) => Err(e.into()),
        }
    }

    async fn upsert_match(&self, record: NewMatchRecord) -> Result<MatchRecord, MatchStoreError> {
        let mut tx = self.pool.begin().await?;
        let Some(challenge_id) = record.challenge_id else {
            let saved = matches::insert_match(record, &mut tx).await?;
            tx.commit().await?;
            debug!("🗃️ Match #{} saved for {}", saved.id, saved.user_id);
            return Ok(saved);
        };
        if let Some(updated) = matches::update_challenge_match(challenge_id, &record, &mut tx).await? {
            tx.commit().await?;
            debug!("🗃️ Match #{} in {challenge_id} updated for {}", updated.id, updated.user_id);
            return Ok(updated);
        }
        if challenges::fetch_challenge(challenge_id, &mut tx).await?.is_none() {
            return Err(MatchStoreError::ChallengeNotFound(challenge_id));
        }
        let saved = matches::insert_match(record, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Match #{} in {challenge_id} saved for {}", saved.id, saved.user_id);
        Ok(saved)
    }

    async fn fetch_leaderboard(&self, challenge_id: ChallengeId) -> Result<Vec<MatchRecord>, MatchStoreError> {
        let mut conn = self.pool.acquire().await?;
        let records = matches::leaderboard(challenge_id, &mut conn).await?;
        Ok(records)
    }
}

impl DeckManagement for SqliteDatabase {
    async fn fetch_deck(&self, deck_id: DeckId) -> Result<Option<Deck>, DeckStoreError> {
        let mut conn = self.pool.acquire().await?;
        let deck = decks::fetch_deck(deck_id, &mut conn).await?;
        Ok(deck)
    }

    async fn fetch_daily_deck(&self, date: NaiveDate) -> Result<Option<Deck>, DeckStoreError> {
        let mut conn = self.pool.acquire().await?;
        let deck = decks::fetch_daily_deck(date, &mut conn).await?;
        Ok(deck)
    }

    async fn insert_daily_deck(&self, deck: NewDeck) -> Result<Deck, DeckStoreError> {
        let Some(date) = deck.daily_date else {
            return Err(DeckStoreError::InvalidDeck("a daily deck needs a date".into()));
        };
        let mut conn = self.pool.acquire().await?;
        match decks::insert_deck(deck, &mut conn).await {
            Ok(deck) => {
                debug!("🗃️ Daily deck for {date} saved as {}", deck.id);
                Ok(deck)
            },
            Err(DeckStoreError::DailyDeckExists(_)) => {
                debug!("🗃️ Another daily deck for {date} was stored first. Using that one instead");
                let existing = decks::fetch_daily_deck(date, &mut conn).await?;
                existing.ok_or_else(|| DeckStoreError::DatabaseError(format!("Could not store daily deck for {date}")))
            },
            Err(e) => Err(e),
        }
    }

    async fn purchase_deck(&self, deck: NewDeck) -> Result<(Deck, Coins), DeckStoreError> {
        let owner = deck
            .owner_id
            .clone()
            .ok_or_else(|| DeckStoreError::InvalidDeck("a purchased deck must have an owner".into()))?;
        let cost = deck.cost;
        let mut tx = self.pool.begin().await?;
        let balance = if cost.is_positive() {
            match profiles::try_debit(&owner, cost, &mut tx).await? {
                Some(balance) => balance,
                None => {
                    let available = profiles::balance(&owner, &mut tx).await?;
                    tx.rollback().await?;
                    return Err(DeckStoreError::InsufficientFunds { required: cost, available });
                },
            }
        } else {
            profiles::balance(&owner, &mut tx).await?
        };
        let deck = decks::insert_deck(deck, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ {owner} bought {} for {cost}. Remaining balance: {balance}", deck.id);
        Ok((deck, balance))
    }
}

impl SqliteDatabase {
    /// Creates a new database API object
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Brings the schema up to date. Safe to call on every start-up.
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        migrate!("./src/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }

    pub async fn close(&mut self) -> Result<(), sqlx::Error> {
        self.pool.close().await;
        Ok(())
    }
}
