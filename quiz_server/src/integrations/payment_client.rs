use std::sync::Arc;

use log::*;
use quiz_engine::{
    db_types::{Money, TransactionStatus},
    traits::{CreateIntentRequest, PaymentIntent, PaymentProvider, PaymentProviderError, ProviderPayment},
};
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client,
    Method,
    StatusCode,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

use crate::config::PaymentProviderConfig;

const PAYMENT_METHOD: &str = "pix";
const DEFAULT_PAYER_EMAIL: &str = "user@quizarena.app";
const DEFAULT_PAYER_NAME: &str = "User";

/// REST client for the payment provider. Cloning is cheap; clones share the connection pool.
#[derive(Clone)]
pub struct PaymentClient {
    config: PaymentProviderConfig,
    client: Arc<Client>,
}

impl PaymentClient {
    pub fn new(config: PaymentProviderConfig) -> Result<Self, PaymentProviderError> {
        let mut headers = HeaderMap::with_capacity(2);
        let token = format!("Bearer {}", config.access_token.reveal());
        let val = HeaderValue::from_str(&token).map_err(|e| PaymentProviderError::RequestFailed(e.to_string()))?;
        headers.insert(AUTHORIZATION, val);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| PaymentProviderError::RequestFailed(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.api_url)
    }

    async fn rest_query<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        headers: &[(&'static str, String)],
        body: Option<B>,
    ) -> Result<T, RestError> {
        let url = self.url(path);
        trace!("💳️ Sending REST query: {method} {url}");
        let mut req = self.client.request(method, url);
        for (name, value) in headers {
            req = req.header(*name, value);
        }
        if let Some(body) = body {
            req = req.json(&body);
        }
        let response = req.send().await.map_err(RestError::from)?;
        if response.status().is_success() {
            trace!("💳️ REST query successful. {}", response.status());
            response.json::<T>().await.map_err(|e| RestError::Json(e.to_string()))
        } else {
            let status = response.status();
            let message = response.text().await.unwrap_or_default();
            Err(RestError::Status { status, message })
        }
    }
}

impl PaymentProvider for PaymentClient {
    async fn create_intent(&self, request: CreateIntentRequest) -> Result<PaymentIntent, PaymentProviderError> {
        let body = CreatePaymentBody::new(&request, &self.config.notification_url);
        let headers = [("X-Idempotency-Key", request.idempotency_key.clone())];
        let response = self
            .rest_query::<CreatePaymentResponse, _>(Method::POST, "/v1/payments", &headers, Some(body))
            .await
            .map_err(|e| e.into_provider_error(&request.external_reference))?;
        let intent = response.into_intent()?;
        debug!("💳️ Payment {} created for {}", intent.external_id, request.external_reference);
        Ok(intent)
    }

    async fn fetch_payment(&self, external_id: &str) -> Result<ProviderPayment, PaymentProviderError> {
        let path = format!("/v1/payments/{external_id}");
        let response = self
            .rest_query::<PaymentDetails, ()>(Method::GET, &path, &[], None)
            .await
            .map_err(|e| e.into_provider_error(external_id))?;
        let payment = response.into_provider_payment()?;
        trace!("💳️ Provider reports payment {} as {}", payment.external_id, payment.status);
        Ok(payment)
    }
}

//--------------------------------------     REST errors      --------------------------------------------------------
#[derive(Debug)]
enum RestError {
    Timeout,
    Transport(String),
    Json(String),
    Status { status: StatusCode, message: String },
}

impl From<reqwest::Error> for RestError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else {
            Self::Transport(e.to_string())
        }
    }
}

impl RestError {
    fn into_provider_error(self, id: &str) -> PaymentProviderError {
        match self {
            Self::Timeout => PaymentProviderError::Timeout,
            Self::Transport(e) => PaymentProviderError::RequestFailed(e),
            Self::Json(e) => PaymentProviderError::InvalidResponse(e),
            Self::Status { status: StatusCode::NOT_FOUND, .. } => PaymentProviderError::PaymentNotFound(id.to_string()),
            Self::Status { status, message } => {
                warn!("💳️ Payment provider replied {status} for {id}. {message}");
                PaymentProviderError::RequestFailed(format!("{status}: {message}"))
            },
        }
    }
}

//--------------------------------------      Wire types      --------------------------------------------------------
#[derive(Debug, Serialize)]
struct CreatePaymentBody {
    transaction_amount: f64,
    description: String,
    payment_method_id: &'static str,
    payer: PayerBody,
    external_reference: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    notification_url: Option<String>,
}

#[derive(Debug, Serialize)]
struct PayerBody {
    email: String,
    first_name: String,
}

impl CreatePaymentBody {
    fn new(request: &CreateIntentRequest, notification_url: &str) -> Self {
        let email = request.payer.email.clone().filter(|s| !s.trim().is_empty());
        let first_name = request.payer.first_name.clone().filter(|s| !s.trim().is_empty());
        Self {
            transaction_amount: request.amount.as_decimal(),
            description: request.description.clone(),
            payment_method_id: PAYMENT_METHOD,
            payer: PayerBody {
                email: email.unwrap_or_else(|| DEFAULT_PAYER_EMAIL.to_string()),
                first_name: first_name.unwrap_or_else(|| DEFAULT_PAYER_NAME.to_string()),
            },
            external_reference: request.external_reference.clone(),
            notification_url: Some(notification_url.to_string()).filter(|s| !s.is_empty()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CreatePaymentResponse {
    id: Value,
    #[serde(default)]
    point_of_interaction: Option<PointOfInteraction>,
}

#[derive(Debug, Deserialize)]
struct PointOfInteraction {
    #[serde(default)]
    transaction_data: Option<TransactionData>,
}

#[derive(Debug, Default, Deserialize)]
struct TransactionData {
    #[serde(default)]
    qr_code: Option<String>,
    #[serde(default)]
    qr_code_base64: Option<String>,
    #[serde(default)]
    ticket_url: Option<String>,
}

impl CreatePaymentResponse {
    fn into_intent(self) -> Result<PaymentIntent, PaymentProviderError> {
        let external_id = id_to_string(&self.id)?;
        let data = self.point_of_interaction.and_then(|p| p.transaction_data).unwrap_or_default();
        Ok(PaymentIntent {
            external_id,
            qr_code: data.qr_code,
            qr_code_base64: data.qr_code_base64,
            ticket_url: data.ticket_url,
        })
    }
}

#[derive(Debug, Deserialize)]
struct PaymentDetails {
    id: Value,
    status: String,
    transaction_amount: f64,
    #[serde(default)]
    external_reference: Option<String>,
}

impl PaymentDetails {
    fn into_provider_payment(self) -> Result<ProviderPayment, PaymentProviderError> {
        let external_id = id_to_string(&self.id)?;
        let status = self.status.parse::<TransactionStatus>().unwrap_or_else(|_| {
            warn!("💳️ Payment {external_id} has unrecognised status '{}'", self.status);
            TransactionStatus::Unknown
        });
        let amount = Money::try_from_decimal(self.transaction_amount)
            .map_err(|e| PaymentProviderError::InvalidResponse(e.to_string()))?;
        let external_reference = self.external_reference.filter(|s| !s.is_empty());
        Ok(ProviderPayment { external_id, status, amount, external_reference })
    }
}

fn id_to_string(id: &Value) -> Result<String, PaymentProviderError> {
    match id {
        Value::Number(n) => Ok(n.to_string()),
        Value::String(s) if !s.is_empty() => Ok(s.clone()),
        v => Err(PaymentProviderError::InvalidResponse(format!("Payment id {v} is not usable"))),
    }
}

#[cfg(test)]
mod test {
    use quiz_engine::traits::PayerInfo;

    use super::*;

    #[test]
    fn create_body_fills_in_payer_defaults() {
        let request = CreateIntentRequest {
            amount: Money::from_cents(2550),
            description: "Quiz Arena coins".into(),
            payer: PayerInfo { email: None, first_name: Some(" ".into()) },
            external_reference: "alice".into(),
            idempotency_key: "pay_alice_1".into(),
        };
        let body = serde_json::to_value(CreatePaymentBody::new(&request, "")).unwrap();
        assert_eq!(body["transaction_amount"], 25.5);
        assert_eq!(body["payment_method_id"], "pix");
        assert_eq!(body["payer"]["email"], DEFAULT_PAYER_EMAIL);
        assert_eq!(body["payer"]["first_name"], DEFAULT_PAYER_NAME);
        assert_eq!(body["external_reference"], "alice");
        assert!(body.get("notification_url").is_none());
    }

    #[test]
    fn create_response_yields_qr_code() {
        let json = r#"{
            "id": 1319473563,
            "status": "pending",
            "point_of_interaction": {
                "type": "PIX",
                "transaction_data": {
                    "qr_code": "00020126580014br.gov.bcb.pix",
                    "qr_code_base64": "iVBORw0KGgo=",
                    "ticket_url": "https://pay.example.com/payments/1319473563/ticket"
                }
            }
        }"#;
        let response: CreatePaymentResponse = serde_json::from_str(json).unwrap();
        let intent = response.into_intent().unwrap();
        assert_eq!(intent.external_id, "1319473563");
        assert_eq!(intent.qr_code.as_deref(), Some("00020126580014br.gov.bcb.pix"));
        assert_eq!(intent.qr_code_base64.as_deref(), Some("iVBORw0KGgo="));

        let response: CreatePaymentResponse = serde_json::from_str(r#"{"id": "abc"}"#).unwrap();
        let intent = response.into_intent().unwrap();
        assert_eq!(intent.external_id, "abc");
        assert!(intent.ticket_url.is_none());
    }

    #[test]
    fn payment_details() {
        let json = r#"{"id": 42, "status": "approved", "transaction_amount": 25, "external_reference": "alice"}"#;
        let details: PaymentDetails = serde_json::from_str(json).unwrap();
        let payment = details.into_provider_payment().unwrap();
        assert_eq!(payment.external_id, "42");
        assert_eq!(payment.status, TransactionStatus::Approved);
        assert_eq!(payment.amount, Money::from_reais(25));
        assert_eq!(payment.external_reference.as_deref(), Some("alice"));

        let json = r#"{"id": 43, "status": "on_hold", "transaction_amount": 10.0}"#;
        let details: PaymentDetails = serde_json::from_str(json).unwrap();
        let payment = details.into_provider_payment().unwrap();
        assert_eq!(payment.status, TransactionStatus::Unknown);
        assert!(payment.external_reference.is_none());
    }

    #[test]
    fn not_found_maps_to_payment_not_found() {
        let e = RestError::Status { status: StatusCode::NOT_FOUND, message: "not found".into() };
        assert_eq!(e.into_provider_error("99"), PaymentProviderError::PaymentNotFound("99".into()));
        let e = RestError::Status { status: StatusCode::UNAUTHORIZED, message: "bad token".into() };
        assert!(matches!(e.into_provider_error("99"), PaymentProviderError::RequestFailed(_)));
    }
}
