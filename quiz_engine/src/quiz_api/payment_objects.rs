use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    db_types::{Coins, Money, Transaction},
    traits::{PayerInfo, PaymentIntent},
};

/// The fixed coin packages on sale. Each entry is `(price, coins)`.
pub const COIN_PACKAGES: [(Money, Coins); 3] = [
    (Money::from_cents(1000), Coins::new(100)),
    (Money::from_cents(2500), Coins::new(300)),
    (Money::from_cents(5000), Coins::new(700)),
];

/// The number of coins a payment of `amount` buys.
///
/// Amounts matching a package get that package's coins. Anything else falls back to ten coins per whole real,
/// rounded down. This is only ever applied to payments the provider has confirmed.
pub fn coins_for_amount(amount: Money) -> Coins {
    COIN_PACKAGES
        .iter()
        .find(|(price, _)| *price == amount)
        .map(|(_, coins)| *coins)
        .unwrap_or_else(|| Coins::from(amount.cents().max(0) / 10))
}

/// A request to buy coins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    #[serde(default)]
    pub package_id: Option<String>,
    pub amount: Money,
    pub user_id: String,
    #[serde(flatten)]
    pub payer: PayerInfo,
    /// Used to derive the idempotency key. Client retries of the same purchase should reuse the same timestamp.
    #[serde(default = "Utc::now")]
    pub requested_at: DateTime<Utc>,
}

impl PaymentRequest {
    pub fn new(user_id: impl Into<String>, amount: Money) -> Self {
        Self {
            package_id: None,
            amount,
            user_id: user_id.into(),
            payer: PayerInfo::default(),
            requested_at: Utc::now(),
        }
    }

    pub fn with_package(mut self, package_id: impl Into<String>) -> Self {
        self.package_id = Some(package_id.into());
        self
    }

    pub fn with_payer(mut self, payer: PayerInfo) -> Self {
        self.payer = payer;
        self
    }

    pub fn requested_at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.requested_at = timestamp;
        self
    }

    pub fn idempotency_key(&self) -> String {
        format!("pay_{}_{}", self.user_id, self.requested_at.timestamp_millis())
    }

    pub fn description(&self) -> String {
        match &self.package_id {
            Some(package) => format!("Quiz Arena coins - Pack {package}"),
            None => "Quiz Arena coins".to_string(),
        }
    }
}

/// What the player needs to settle a payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentResponse {
    pub id: String,
    pub qr_code: Option<String>,
    pub qr_code_base64: Option<String>,
    pub ticket_url: Option<String>,
    /// The coins the player will receive once the payment is approved.
    pub coins: Coins,
}

impl PaymentResponse {
    pub fn new(intent: PaymentIntent, coins: Coins) -> Self {
        Self {
            id: intent.external_id,
            qr_code: intent.qr_code,
            qr_code_base64: intent.qr_code_base64,
            ticket_url: intent.ticket_url,
            coins,
        }
    }
}

/// What happened as a result of a payment notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationOutcome {
    /// This delivery approved the transaction and credited the player.
    Credited { transaction: Transaction, new_balance: Coins },
    /// The transaction had already been approved and credited. Nothing changed.
    AlreadyProcessed,
    /// The payment is not approved (yet). The local transaction status was brought into line with the provider.
    StatusMirrored(Transaction),
    /// The payment is not approved and there is no local record of it, or the record already had this status.
    Unchanged,
}

/// Tuning knobs for the payment reconciler.
#[derive(Debug, Clone, Copy)]
pub struct ReconcilerOptions {
    /// How many more times to look for the local transaction of an approved payment before giving up. The webhook can
    /// race the create flow, so a missing record is not immediately an anomaly.
    pub lookup_retries: u32,
    pub lookup_delay: Duration,
    /// Upper bound on every call to the payment provider.
    pub provider_timeout: Duration,
}

impl Default for ReconcilerOptions {
    fn default() -> Self {
        Self { lookup_retries: 3, lookup_delay: Duration::from_millis(500), provider_timeout: Duration::from_secs(10) }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn package_amounts_use_the_table() {
        assert_eq!(coins_for_amount(Money::from_reais(10)), Coins::from(100));
        assert_eq!(coins_for_amount(Money::from_reais(25)), Coins::from(300));
        assert_eq!(coins_for_amount(Money::from_reais(50)), Coins::from(700));
    }

    #[test]
    fn other_amounts_fall_back_to_ten_coins_per_real() {
        assert_eq!(coins_for_amount(Money::from_reais(37)), Coins::from(370));
        assert_eq!(coins_for_amount(Money::from_cents(1299)), Coins::from(129));
        assert_eq!(coins_for_amount(Money::from_cents(9)), Coins::from(0));
        assert_eq!(coins_for_amount(Money::from_cents(-500)), Coins::from(0));
    }

    #[test]
    fn idempotency_key_is_stable_for_the_same_request() {
        let at = DateTime::from_timestamp(1_717_243_200, 0).unwrap();
        let req = PaymentRequest::new("alice", Money::from_reais(25)).requested_at(at);
        assert_eq!(req.idempotency_key(), "pay_alice_1717243200000");
        assert_eq!(req.clone().idempotency_key(), req.idempotency_key());
    }

    #[test]
    fn payment_request_deserializes_flat_payer_fields() {
        let json = r#"{"packageId":"pro","amount":2500,"userId":"bob","email":"bob@example.com","firstName":"Bob"}"#;
        let req: PaymentRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.amount, Money::from_reais(25));
        assert_eq!(req.payer.email.as_deref(), Some("bob@example.com"));
        assert_eq!(req.payer.first_name.as_deref(), Some("Bob"));
        assert_eq!(req.description(), "Quiz Arena coins - Pack pro");
    }
}
