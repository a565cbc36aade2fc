use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, NaiveDate, Utc};
pub use quiz_common::{Coins, Money};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

/// Every question offers exactly this many options.
pub const OPTIONS_PER_QUESTION: usize = 4;

#[derive(Debug, Clone, Error)]
#[error("Conversion error: {0}")]
pub struct ConversionError(String);

//--------------------------------------       DeckId        ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct DeckId(pub i64);

impl From<i64> for DeckId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl Display for DeckId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "deck#{}", self.0)
    }
}

//--------------------------------------     ChallengeId     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct ChallengeId(pub i64);

impl From<i64> for ChallengeId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl Display for ChallengeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "challenge#{}", self.0)
    }
}

//--------------------------------------     Difficulty      ---------------------------------------------------------
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Difficulty::Easy => write!(f, "easy"),
            Difficulty::Medium => write!(f, "medium"),
            Difficulty::Hard => write!(f, "hard"),
        }
    }
}

impl FromStr for Difficulty {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "easy" => Ok(Self::Easy),
            "medium" => Ok(Self::Medium),
            "hard" => Ok(Self::Hard),
            s => Err(ConversionError(format!("Invalid difficulty: {s}"))),
        }
    }
}

//--------------------------------------      Question       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    #[serde(default)]
    pub id: String,
    pub text: String,
    pub options: Vec<String>,
    pub correct_index: usize,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuestionError {
    #[error("Question {0} has no text")]
    EmptyText(String),
    #[error("Question {id} has {count} options. Exactly {OPTIONS_PER_QUESTION} are required")]
    WrongOptionCount { id: String, count: usize },
    #[error("Question {id} marks option {index} as correct, but there are only {count} options")]
    CorrectIndexOutOfRange { id: String, index: usize, count: usize },
}

impl Question {
    pub fn new(
        id: impl Into<String>,
        text: impl Into<String>,
        options: [&str; OPTIONS_PER_QUESTION],
        correct_index: usize,
    ) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            options: options.iter().map(|o| o.to_string()).collect(),
            correct_index,
            difficulty: Difficulty::default(),
            explanation: None,
        }
    }

    pub fn with_difficulty(mut self, difficulty: Difficulty) -> Self {
        self.difficulty = difficulty;
        self
    }

    pub fn with_explanation<S: Into<String>>(mut self, explanation: S) -> Self {
        self.explanation = Some(explanation.into());
        self
    }

    pub fn is_correct(&self, option: usize) -> bool {
        self.correct_index == option
    }

    /// Checks the structural rules for a question: non-empty text, exactly four options, and a correct index that
    /// points at one of them.
    pub fn validate(&self) -> Result<(), QuestionError> {
        if self.text.trim().is_empty() {
            return Err(QuestionError::EmptyText(self.id.clone()));
        }
        let count = self.options.len();
        if count != OPTIONS_PER_QUESTION {
            return Err(QuestionError::WrongOptionCount { id: self.id.clone(), count });
        }
        if self.correct_index >= count {
            return Err(QuestionError::CorrectIndexOutOfRange { id: self.id.clone(), index: self.correct_index, count });
        }
        Ok(())
    }
}

//--------------------------------------        Deck         ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deck {
    pub id: DeckId,
    pub owner_id: Option<String>,
    pub title: String,
    pub subject: String,
    pub grade: String,
    pub questions: Vec<Question>,
    pub is_daily: bool,
    pub daily_date: Option<NaiveDate>,
    pub cost: Coins,
    pub created_at: DateTime<Utc>,
}

impl Deck {
    pub fn max_score(&self) -> i64 {
        crate::match_engine::max_score_for(self.questions.len())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDeck {
    pub owner_id: Option<String>,
    pub title: String,
    pub subject: String,
    pub grade: String,
    pub questions: Vec<Question>,
    pub daily_date: Option<NaiveDate>,
    pub cost: Coins,
}

impl NewDeck {
    pub fn new(
        title: impl Into<String>,
        subject: impl Into<String>,
        grade: impl Into<String>,
        questions: Vec<Question>,
    ) -> Self {
        Self {
            owner_id: None,
            title: title.into(),
            subject: subject.into(),
            grade: grade.into(),
            questions,
            daily_date: None,
            cost: Coins::default(),
        }
    }

    pub fn with_owner<S: Into<String>>(mut self, owner_id: S) -> Self {
        self.owner_id = Some(owner_id.into());
        self
    }

    pub fn with_cost(mut self, cost: Coins) -> Self {
        self.cost = cost;
        self
    }

    pub fn for_day(mut self, date: NaiveDate) -> Self {
        self.daily_date = Some(date);
        self
    }

    pub fn is_daily(&self) -> bool {
        self.daily_date.is_some()
    }
}

//--------------------------------------     Challenge       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Challenge {
    pub id: ChallengeId,
    pub deck_id: DeckId,
    pub creator_id: String,
    pub created_at: DateTime<Utc>,
}

//--------------------------------------     MatchRecord     ---------------------------------------------------------
/// The persisted outcome of a match. Within a challenge, there is at most one record per player.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRecord {
    pub id: i64,
    pub user_id: String,
    pub deck_id: DeckId,
    pub challenge_id: Option<ChallengeId>,
    pub score: i64,
    pub max_score: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMatchRecord {
    pub user_id: String,
    pub deck_id: DeckId,
    #[serde(default)]
    pub challenge_id: Option<ChallengeId>,
    pub score: i64,
    pub max_score: i64,
}

impl NewMatchRecord {
    pub fn new(user_id: impl Into<String>, deck_id: DeckId, score: i64, max_score: i64) -> Self {
        Self { user_id: user_id.into(), deck_id, challenge_id: None, score, max_score }
    }

    pub fn with_challenge(mut self, challenge_id: ChallengeId) -> Self {
        self.challenge_id = Some(challenge_id);
        self
    }
}

//--------------------------------------  TransactionStatus  ---------------------------------------------------------
/// The lifecycle of a coin purchase, mirrored from the payment provider. Only `Approved` ever results in coins
/// being credited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Pending,
    Approved,
    Authorized,
    InProcess,
    InMediation,
    Rejected,
    Cancelled,
    Refunded,
    ChargedBack,
    /// The provider reported a status this system does not know about.
    Unknown,
}

impl TransactionStatus {
    pub fn is_approved(&self) -> bool {
        matches!(self, Self::Approved)
    }

    /// No further transitions are expected from the provider once a payment reaches one of these states.
    pub fn is_final(&self) -> bool {
        matches!(self, Self::Approved | Self::Rejected | Self::Cancelled | Self::Refunded | Self::ChargedBack)
    }
}

impl Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Authorized => "authorized",
            Self::InProcess => "in_process",
            Self::InMediation => "in_mediation",
            Self::Rejected => "rejected",
            Self::Cancelled => "cancelled",
            Self::Refunded => "refunded",
            Self::ChargedBack => "charged_back",
            Self::Unknown => "unknown",
        };
        write!(f, "{s}")
    }
}

impl FromStr for TransactionStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "authorized" => Ok(Self::Authorized),
            "in_process" => Ok(Self::InProcess),
            "in_mediation" => Ok(Self::InMediation),
            "rejected" => Ok(Self::Rejected),
            "cancelled" => Ok(Self::Cancelled),
            "refunded" => Ok(Self::Refunded),
            "charged_back" => Ok(Self::ChargedBack),
            "unknown" => Ok(Self::Unknown),
            s => Err(ConversionError(format!("Invalid transaction status: {s}"))),
        }
    }
}

//--------------------------------------     Transaction     ---------------------------------------------------------
/// A local record of a coin purchase. `provider_id` is the payment provider's identifier and correlates webhook
/// notifications with this record.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: i64,
    pub user_id: String,
    pub amount: Money,
    pub coins: Coins,
    pub status: TransactionStatus,
    pub provider_id: String,
    pub qr_code: Option<String>,
    pub qr_code_base64: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTransaction {
    pub user_id: String,
    pub amount: Money,
    pub coins: Coins,
    pub provider_id: String,
    pub qr_code: Option<String>,
    pub qr_code_base64: Option<String>,
}

impl NewTransaction {
    pub fn new(user_id: impl Into<String>, amount: Money, coins: Coins, provider_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            amount,
            coins,
            provider_id: provider_id.into(),
            qr_code: None,
            qr_code_base64: None,
        }
    }

    pub fn with_qr_code(mut self, qr_code: Option<String>, qr_code_base64: Option<String>) -> Self {
        self.qr_code = qr_code;
        self.qr_code_base64 = qr_code_base64;
        self
    }
}

//--------------------------------------       Profile       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub user_id: String,
    pub coins: Coins,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
