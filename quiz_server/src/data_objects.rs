use std::fmt::Display;

use chrono::{DateTime, Utc};
use quiz_engine::{
    db_types::{ChallengeId, Coins, DeckId, Money, TransactionStatus},
    traits::{JoinedChallenge, PayerInfo},
    NotificationOutcome,
    PaymentRequest,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::ServerError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}

//--------------------------------------       Payments       --------------------------------------------------------

/// The body of a coin purchase request. `amount` is in reais, as shown to the player, e.g. `25` or `25.5`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentParams {
    #[serde(default)]
    pub package_id: Option<String>,
    pub amount: f64,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    /// Clients that retry a purchase should resend the same timestamp, so that the provider recognises the retry.
    #[serde(default)]
    pub requested_at: Option<DateTime<Utc>>,
}

impl TryFrom<CreatePaymentParams> for PaymentRequest {
    type Error = ServerError;

    fn try_from(params: CreatePaymentParams) -> Result<Self, Self::Error> {
        let amount = Money::try_from_decimal(params.amount).map_err(|e| ServerError::ValidationError(e.to_string()))?;
        let payer = PayerInfo { email: params.email, first_name: params.first_name };
        let mut request = PaymentRequest::new(params.user_id, amount).with_payer(payer);
        if let Some(package) = params.package_id {
            request = request.with_package(package);
        }
        if let Some(ts) = params.requested_at {
            request = request.requested_at(ts);
        }
        Ok(request)
    }
}

/// Query parameters of a payment notification. Depending on the notification style, the payment id arrives as `id`
/// or `data.id`, and the topic as `topic` or `type`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WebhookQuery {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, rename = "data.id")]
    pub data_id: Option<String>,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

impl WebhookQuery {
    pub fn payment_id(&self) -> Option<&str> {
        non_blank(self.id.as_deref()).or_else(|| non_blank(self.data_id.as_deref()))
    }

    pub fn topic(&self) -> Option<&str> {
        non_blank(self.topic.as_deref()).or_else(|| non_blank(self.kind.as_deref()))
    }

    /// True for topics that concern a payment we may need to credit.
    pub fn is_payment_topic(&self) -> bool {
        matches!(self.topic(), Some("payment") | Some("merchant_order"))
    }
}

/// The JSON body of a payment notification. Only `data.id` is used; the provider sends it as a number or a string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookBody {
    #[serde(default)]
    pub data: Option<WebhookData>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookData {
    #[serde(default)]
    pub id: Value,
}

impl WebhookBody {
    /// Reads the payment id from a raw notification body. Bodies that are empty or not JSON have no id.
    pub fn payment_id(raw: &[u8]) -> Option<String> {
        let body = serde_json::from_slice::<WebhookBody>(raw).ok()?;
        match body.data?.id {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookResponse {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TransactionStatus>,
}

impl WebhookResponse {
    pub fn new<S: Display>(message: S) -> Self {
        Self { message: message.to_string(), status: None }
    }

    pub fn with_status(mut self, status: TransactionStatus) -> Self {
        self.status = Some(status);
        self
    }
}

impl From<NotificationOutcome> for WebhookResponse {
    fn from(outcome: NotificationOutcome) -> Self {
        match outcome {
            NotificationOutcome::Credited { transaction, .. } => Self::new("OK").with_status(transaction.status),
            NotificationOutcome::AlreadyProcessed => Self::new("Already processed"),
            NotificationOutcome::StatusMirrored(transaction) => Self::new("OK").with_status(transaction.status),
            NotificationOutcome::Unchanged => Self::new("OK"),
        }
    }
}

//--------------------------------------       Balance        --------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceResponse {
    pub user_id: String,
    pub balance: Coins,
}

//--------------------------------------      Challenges      --------------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateChallengeParams {
    pub deck_id: DeckId,
    #[serde(default)]
    pub user_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinChallengeParams {
    pub challenge_id: ChallengeId,
    #[serde(default)]
    pub user_id: String,
    pub deck_id: DeckId,
    #[serde(default)]
    pub max_score: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinStatus {
    New,
    Existing,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinChallengeResponse {
    pub success: bool,
    pub match_id: i64,
    pub status: JoinStatus,
}

impl From<JoinedChallenge> for JoinChallengeResponse {
    fn from(joined: JoinedChallenge) -> Self {
        let status = if joined.existing { JoinStatus::Existing } else { JoinStatus::New };
        Self { success: true, match_id: joined.record.id, status }
    }
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}
