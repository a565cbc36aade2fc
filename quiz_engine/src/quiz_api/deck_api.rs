use std::{fmt::Debug, time::Duration};

use chrono::{NaiveDate, Utc};
use log::*;
use serde::{Deserialize, Serialize};

use crate::{
    db_types::{Coins, Deck, DeckId, NewDeck, Question},
    quiz_api::errors::DeckApiError,
    traits::{DeckManagement, DeckProvider, DeckProviderError, DeckRequest, GeneratedDeck, STANDARD_DECK_SIZE},
};

pub const DEFAULT_SUBJECT: &str = "General Knowledge";
pub const DEFAULT_GRADE: &str = "High School";
pub const DAILY_SUBJECT: &str = "Daily Challenge";
pub const DAILY_GRADE: &str = "General";

#[derive(Debug, Clone, Copy)]
pub struct DeckApiOptions {
    /// What a generated deck costs its owner.
    pub deck_cost: Coins,
    /// Upper bound on every call to the deck provider.
    pub provider_timeout: Duration,
}

impl Default for DeckApiOptions {
    fn default() -> Self {
        Self { deck_cost: Coins::from(50), provider_timeout: Duration::from_secs(60) }
    }
}

/// A request to generate a new deck and charge it to the player.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckPurchase {
    pub user_id: String,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub grade: Option<String>,
}

impl DeckPurchase {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self { user_id: user_id.into(), subject: None, grade: None }
    }

    pub fn with_topic(mut self, subject: impl Into<String>, grade: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self.grade = Some(grade.into());
        self
    }

    /// The requested subject, or the default if it is missing or blank.
    pub fn subject(&self) -> &str {
        non_blank(self.subject.as_deref()).unwrap_or(DEFAULT_SUBJECT)
    }

    /// The requested grade, or the default if it is missing or blank.
    pub fn grade(&self) -> &str {
        non_blank(self.grade.as_deref()).unwrap_or(DEFAULT_GRADE)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchasedDeck {
    pub deck: Deck,
    pub balance: Coins,
}

/// `DeckApi` hands out decks: the paid decks players generate for themselves, and the free daily deck everyone shares.
pub struct DeckApi<B, P> {
    db: B,
    provider: P,
    options: DeckApiOptions,
}

impl<B: Debug, P> Debug for DeckApi<B, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DeckApi ({:?}, {:?})", self.db, self.options)
    }
}

impl<B, P> DeckApi<B, P> {
    pub fn new(db: B, provider: P) -> Self {
        Self { db, provider, options: DeckApiOptions::default() }
    }

    pub fn with_options(mut self, options: DeckApiOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &DeckApiOptions {
        &self.options
    }
}

impl<B, P> DeckApi<B, P>
where
    B: DeckManagement,
    P: DeckProvider,
{
    pub async fn deck(&self, deck_id: DeckId) -> Result<Option<Deck>, DeckApiError> {
        Ok(self.db.fetch_deck(deck_id).await?)
    }

    /// Generates a new deck and charges its cost to the player.
    ///
    /// The deck is generated first, and then the charge and the deck are written in one database transaction. If the
    /// provider fails, or the player cannot afford the deck, the balance is left untouched and nothing is stored.
    pub async fn purchase_deck(&self, purchase: DeckPurchase) -> Result<PurchasedDeck, DeckApiError> {
        let user_id = purchase.user_id.trim();
        if user_id.is_empty() {
            return Err(DeckApiError::ValidationError("A user id is required".into()));
        }
        let (subject, grade) = (purchase.subject(), purchase.grade());
        let request = DeckRequest::new(subject, grade, STANDARD_DECK_SIZE);
        let generated = self.generate(request).await?;
        let stamp = Utc::now().timestamp_millis();
        let questions = prepare_questions(generated.questions, |i| format!("q-{i}-{stamp}"))?;
        let deck = NewDeck::new(format!("{subject} ({grade})"), subject, grade, questions)
            .with_owner(user_id)
            .with_cost(self.options.deck_cost);
        match self.db.purchase_deck(deck).await {
            Ok((deck, balance)) => {
                info!("🃏️ {user_id} bought {} ({}) for {}. Balance: {balance}", deck.id, deck.title, deck.cost);
                Ok(PurchasedDeck { deck, balance })
            },
            Err(e) => {
                warn!("🃏️ {user_id} could not buy a {subject} deck. {e}");
                Err(e.into())
            },
        }
    }

    /// The shared deck for `date`, generating and storing it on first request.
    ///
    /// If two requests generate the deck at the same time, the first one stored wins and both callers receive it.
    pub async fn daily_deck(&self, date: NaiveDate) -> Result<Deck, DeckApiError> {
        if let Some(deck) = self.db.fetch_daily_deck(date).await? {
            trace!("🃏️ Daily deck for {date} already exists");
            return Ok(deck);
        }
        debug!("🃏️ Generating the daily deck for {date}");
        let generated = self.generate(DeckRequest::daily(date)).await?;
        let topic = generated.topic.trim().to_string();
        // Daily question ids are always derived from the date, whatever the provider sent
        let questions = generated
            .questions
            .into_iter()
            .enumerate()
            .map(|(i, q)| Question { id: format!("daily-{date}-{i}"), ..q })
            .collect();
        let questions = prepare_questions(questions, |i| format!("daily-{date}-{i}"))?;
        let title = if topic.is_empty() { DAILY_SUBJECT.to_string() } else { format!("{DAILY_SUBJECT}: {topic}") };
        let deck = NewDeck::new(title, DAILY_SUBJECT, DAILY_GRADE, questions).for_day(date);
        let deck = self.db.insert_daily_deck(deck).await?;
        info!("🃏️ Daily deck for {date} is {} ({})", deck.id, deck.title);
        Ok(deck)
    }

    async fn generate(&self, request: DeckRequest) -> Result<GeneratedDeck, DeckApiError> {
        let subject = request.subject.clone();
        match tokio::time::timeout(self.options.provider_timeout, self.provider.generate_deck(request)).await {
            Ok(Ok(deck)) => Ok(deck),
            Ok(Err(e)) => {
                warn!("🃏️ Deck generation for '{subject}' failed. {e}");
                Err(e.into())
            },
            Err(_) => {
                warn!("🃏️ Deck generation for '{subject}' timed out after {:?}", self.options.provider_timeout);
                Err(DeckProviderError::Timeout.into())
            },
        }
    }
}

/// Checks every generated question and fills in missing ids. A single bad question rejects the whole deck, so that a
/// player is never charged for a short deck.
fn prepare_questions<F>(questions: Vec<Question>, make_id: F) -> Result<Vec<Question>, DeckApiError>
where F: Fn(usize) -> String {
    if questions.is_empty() {
        return Err(DeckProviderError::InvalidDeck("the deck has no questions".into()).into());
    }
    questions
        .into_iter()
        .enumerate()
        .map(|(i, mut q)| -> Result<Question, DeckApiError> {
            if q.id.trim().is_empty() {
                q.id = make_id(i);
            }
            q.validate().map_err(|e| DeckProviderError::InvalidDeck(e.to_string()))?;
            Ok(q)
        })
        .collect()
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}
