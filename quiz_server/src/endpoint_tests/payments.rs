use std::time::Duration;

use actix_web::{http::StatusCode, web, web::ServiceConfig};
use quiz_common::Secret;
use quiz_engine::{
    db_types::{Money, TransactionStatus},
    events::EventProducers,
    test_utils::providers::{provider_payment, MockPaymentProvider},
    traits::{CreditResult, InsertTransactionResult},
    PaymentFlowApi,
    PaymentResponse,
    ReconcilerOptions,
};

use super::{
    helpers::{post_request, transaction},
    mocks::MockLedger,
};
use crate::{
    data_objects::WebhookResponse,
    helpers::{calculate_hmac, signature_manifest},
    middleware::HmacMiddlewareFactory,
    routes::{CreatePaymentRoute, PaymentWebhookRoute},
};

const SECRET: &str = "webhook-test-secret";

fn options() -> ReconcilerOptions {
    ReconcilerOptions {
        lookup_retries: 0,
        lookup_delay: Duration::from_millis(1),
        provider_timeout: Duration::from_secs(1),
    }
}

fn webhook_config(
    ledger: MockLedger,
    provider: MockPaymentProvider,
    signature_checks: bool,
) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        let api = PaymentFlowApi::new(ledger, provider, EventProducers::default()).with_options(options());
        let scope = web::scope("/api/payment/webhook")
            .wrap(HmacMiddlewareFactory::new(Secret::new(SECRET.to_string()), signature_checks))
            .service(PaymentWebhookRoute::<MockLedger, MockPaymentProvider>::new());
        cfg.service(scope).app_data(web::Data::new(api));
    }
}

fn parse_response(body: &str) -> WebhookResponse {
    serde_json::from_str(body).expect("Not a webhook response")
}

#[actix_web::test]
async fn create_payment() {
    let _ = env_logger::try_init().ok();
    let mut ledger = MockLedger::new();
    ledger.expect_insert_pending_transaction().times(1).returning(|tx| {
        assert_eq!(tx.user_id, "alice");
        assert_eq!(tx.coins.value(), 300);
        let mut recorded = transaction(&tx.provider_id, &tx.user_id, 25, TransactionStatus::Pending);
        recorded.coins = tx.coins;
        Ok(InsertTransactionResult::Inserted(recorded))
    });
    let provider = MockPaymentProvider::new();
    let configure = move |cfg: &mut ServiceConfig| {
        let api = PaymentFlowApi::new(ledger, provider, EventProducers::default());
        cfg.service(web::scope("/api").service(CreatePaymentRoute::<MockLedger, MockPaymentProvider>::new()))
            .app_data(web::Data::new(api));
    };
    let body = r#"{"packageId":"popular","amount":25,"userId":"alice","email":"alice@example.com"}"#;
    let (status, body) = post_request("/api/payment/create", body, &[], configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let response: PaymentResponse = serde_json::from_str(&body).unwrap();
    assert_eq!(response.coins.value(), 300);
    assert!(response.qr_code.is_some());
}

#[actix_web::test]
async fn create_payment_rejects_bad_amounts() {
    let _ = env_logger::try_init().ok();
    let configure = move |cfg: &mut ServiceConfig| {
        let api = PaymentFlowApi::new(MockLedger::new(), MockPaymentProvider::new(), EventProducers::default());
        cfg.service(web::scope("/api").service(CreatePaymentRoute::<MockLedger, MockPaymentProvider>::new()))
            .app_data(web::Data::new(api));
    };
    let body = r#"{"amount":-5,"userId":"alice"}"#;
    let (status, body) = post_request("/api/payment/create", body, &[], configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("error"));
}

#[actix_web::test]
async fn webhook_without_id() {
    let _ = env_logger::try_init().ok();
    let configure = webhook_config(MockLedger::new(), MockPaymentProvider::new(), false);
    let (status, body) = post_request("/api/payment/webhook", "{}", &[], configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(parse_response(&body).message, "No ID found");
}

#[actix_web::test]
async fn webhook_ignores_other_topics() {
    let _ = env_logger::try_init().ok();
    let provider = MockPaymentProvider::new();
    let configure = webhook_config(MockLedger::new(), provider.clone(), false);
    let (status, body) = post_request("/api/payment/webhook?id=123&topic=chargebacks", "", &[], configure)
        .await
        .expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(parse_response(&body).message, "Ignored");
    assert_eq!(provider.fetch_count(), 0);
}

#[actix_web::test]
async fn webhook_credits_approved_payment() {
    let _ = env_logger::try_init().ok();
    let provider = MockPaymentProvider::new();
    provider.insert_payment(provider_payment("777", Money::from_reais(25), TransactionStatus::Approved));
    let mut ledger = MockLedger::new();
    ledger
        .expect_fetch_transaction()
        .withf(|id| id == "777")
        .returning(|id| Ok(Some(transaction(id, "alice", 25, TransactionStatus::Pending))));
    ledger.expect_credit_approved_transaction().times(1).returning(|id, coins| {
        Ok(CreditResult::Credited {
            transaction: transaction(id, "alice", 25, TransactionStatus::Approved),
            coins,
            new_balance: coins,
        })
    });
    let configure = webhook_config(ledger, provider, false);
    let (status, body) = post_request("/api/payment/webhook?data.id=777&type=payment", "", &[], configure)
        .await
        .expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let response = parse_response(&body);
    assert_eq!(response.message, "OK");
    assert_eq!(response.status, Some(TransactionStatus::Approved));
}

#[actix_web::test]
async fn webhook_reads_id_from_body() {
    let _ = env_logger::try_init().ok();
    let provider = MockPaymentProvider::new();
    provider.insert_payment(provider_payment("888", Money::from_reais(10), TransactionStatus::Approved));
    let mut ledger = MockLedger::new();
    ledger
        .expect_fetch_transaction()
        .withf(|id| id == "888")
        .returning(|id| Ok(Some(transaction(id, "bob", 10, TransactionStatus::Approved))));
    ledger.expect_credit_approved_transaction().times(1).returning(|_, _| Ok(CreditResult::AlreadyApproved));
    let configure = webhook_config(ledger, provider, false);
    let body = r#"{"action":"payment.updated","data":{"id":888}}"#;
    let (status, body) = post_request("/api/payment/webhook", body, &[], configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(parse_response(&body).message, "Already processed");
}

#[actix_web::test]
async fn webhook_asks_for_retry_when_transaction_is_missing() {
    let _ = env_logger::try_init().ok();
    let provider = MockPaymentProvider::new();
    provider.insert_payment(provider_payment("5555", Money::from_reais(25), TransactionStatus::Approved));
    let mut ledger = MockLedger::new();
    ledger.expect_fetch_transaction().returning(|_| Ok(None));
    ledger.expect_credit_approved_transaction().never();
    let configure = webhook_config(ledger, provider, false);
    let (status, body) = post_request("/api/payment/webhook?id=5555&topic=payment", "", &[], configure)
        .await
        .expect("Request failed");
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.contains("Manual reconciliation required"));
}

#[actix_web::test]
async fn webhook_acknowledges_unknown_payments() {
    let _ = env_logger::try_init().ok();
    let configure = webhook_config(MockLedger::new(), MockPaymentProvider::new(), false);
    let (status, body) = post_request("/api/payment/webhook?id=404&topic=payment", "", &[], configure)
        .await
        .expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert!(parse_response(&body).message.starts_with("Acknowledged."));
}

#[actix_web::test]
async fn webhook_without_signature_is_forbidden() {
    let _ = env_logger::try_init().ok();
    let configure = webhook_config(MockLedger::new(), MockPaymentProvider::new(), true);
    let err = post_request("/api/payment/webhook?id=555&topic=chargebacks", "", &[], configure)
        .await
        .expect_err("Expected error");
    assert_eq!(err, "No webhook signature found.");
}

#[actix_web::test]
async fn webhook_with_signature() {
    let _ = env_logger::try_init().ok();
    let manifest = signature_manifest(Some("555"), Some("req-42"), "1718000000");
    let signature = format!("ts=1718000000,v1={}", calculate_hmac(SECRET, manifest.as_bytes()));
    let headers = [("x-signature", signature.as_str()), ("x-request-id", "req-42")];
    let configure = webhook_config(MockLedger::new(), MockPaymentProvider::new(), true);
    let (status, body) = post_request("/api/payment/webhook?id=555&topic=chargebacks", "", &headers, configure)
        .await
        .expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(parse_response(&body).message, "Ignored");

    // Same signature, different request id
    let headers = [("x-signature", signature.as_str()), ("x-request-id", "req-43")];
    let configure = webhook_config(MockLedger::new(), MockPaymentProvider::new(), true);
    let err = post_request("/api/payment/webhook?id=555&topic=chargebacks", "", &headers, configure)
        .await
        .expect_err("Expected error");
    assert_eq!(err, "Invalid webhook signature.");
}

#[actix_web::test]
async fn signature_covers_the_reconciled_payment_id() {
    let _ = env_logger::try_init().ok();
    let query = "/api/payment/webhook?data.id=555&id=777&topic=chargebacks";
    // Signed for data.id, but the handler would act on id
    let manifest = signature_manifest(Some("555"), Some("req-42"), "1718000000");
    let signature = format!("ts=1718000000,v1={}", calculate_hmac(SECRET, manifest.as_bytes()));
    let headers = [("x-signature", signature.as_str()), ("x-request-id", "req-42")];
    let configure = webhook_config(MockLedger::new(), MockPaymentProvider::new(), true);
    let err = post_request(query, "", &headers, configure).await.expect_err("Expected error");
    assert_eq!(err, "Invalid webhook signature.");

    let manifest = signature_manifest(Some("777"), Some("req-42"), "1718000000");
    let signature = format!("ts=1718000000,v1={}", calculate_hmac(SECRET, manifest.as_bytes()));
    let headers = [("x-signature", signature.as_str()), ("x-request-id", "req-42")];
    let configure = webhook_config(MockLedger::new(), MockPaymentProvider::new(), true);
    let (status, body) = post_request(query, "", &headers, configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(parse_response(&body).message, "Ignored");
}
