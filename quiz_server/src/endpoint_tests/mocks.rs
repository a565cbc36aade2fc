use chrono::NaiveDate;
use mockall::mock;
use quiz_engine::{
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

mock! {
    pub AccountManager {}
    impl AccountManagement for AccountManager {
        async fn fetch_profile(&self, user_id: &str) -> Result<Option<Profile>, AccountApiError>;
        async fn fetch_balance(&self, user_id: &str) -> Result<Coins, AccountApiError>;
    }
}

mock! {
    pub Ledger {}
    impl PaymentLedger for Ledger {
        async fn insert_pending_transaction(&self, transaction: NewTransaction) -> Result<InsertTransactionResult, PaymentLedgerError>;
        async fn fetch_transaction(&self, provider_id: &str) -> Result<Option<Transaction>, PaymentLedgerError>;
        async fn mirror_transaction_status(&self, provider_id: &str, status: TransactionStatus) -> Result<Option<Transaction>, PaymentLedgerError>;
        async fn credit_approved_transaction(&self, provider_id: &str, coins: Coins) -> Result<CreditResult, PaymentLedgerError>;
    }
}

mock! {
    pub DeckStore {}
    impl DeckManagement for DeckStore {
        async fn fetch_deck(&self, deck_id: DeckId) -> Result<Option<Deck>, DeckStoreError>;
        async fn fetch_daily_deck(&self, date: NaiveDate) -> Result<Option<Deck>, DeckStoreError>;
        async fn insert_daily_deck(&self, deck: NewDeck) -> Result<Deck, DeckStoreError>;
        async fn purchase_deck(&self, deck: NewDeck) -> Result<(Deck, Coins), DeckStoreError>;
    }
}

mock! {
    pub QuizStore {}
    impl MatchManagement for QuizStore {
        async fn insert_challenge(&self, deck_id: DeckId, creator_id: &str) -> Result<Challenge, MatchStoreError>;
        async fn fetch_challenge(&self, challenge_id: ChallengeId) -> Result<Option<Challenge>, MatchStoreError>;
        async fn join_challenge(&self, challenge_id: ChallengeId, user_id: &str, deck_id: DeckId, max_score: i64) -> Result<JoinedChallenge, MatchStoreError>;
        async fn upsert_match(&self, record: NewMatchRecord) -> Result<MatchRecord, MatchStoreError>;
        async fn fetch_leaderboard(&self, challenge_id: ChallengeId) -> Result<Vec<MatchRecord>, MatchStoreError>;
    }
    impl DeckManagement for QuizStore {
        async fn fetch_deck(&self, deck_id: DeckId) -> Result<Option<Deck>, DeckStoreError>;
        async fn fetch_daily_deck(&self, date: NaiveDate) -> Result<Option<Deck>, DeckStoreError>;
        async fn insert_daily_deck(&self, deck: NewDeck) -> Result<Deck, DeckStoreError>;
        async fn purchase_deck(&self, deck: NewDeck) -> Result<(Deck, Coins), DeckStoreError>;
    }
}
