use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use quiz_engine::{
    traits::{DeckProviderError, DeckStoreError, MatchStoreError, PaymentProviderError},
    AccountQueryError,
    DeckApiError,
    MatchApiError,
    PaymentFlowError,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("Could not read request path: {0}")]
    InvalidRequestPath(String),
    #[error("{0}")]
    ValidationError(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("{0}")]
    InsufficientFunds(String),
    #[error("An upstream service failed. {0}")]
    UpstreamError(String),
    #[error("An upstream service did not respond in time. {0}")]
    UpstreamTimeout(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::InvalidRequestPath(_) => StatusCode::BAD_REQUEST,
            Self::ValidationError(_) => StatusCode::BAD_REQUEST,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::InsufficientFunds(_) => StatusCode::PAYMENT_REQUIRED,
            Self::UpstreamError(_) => StatusCode::BAD_GATEWAY,
            Self::UpstreamTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

impl From<PaymentFlowError> for ServerError {
    fn from(e: PaymentFlowError) -> Self {
        match e {
            PaymentFlowError::ValidationError(s) => Self::ValidationError(s),
            PaymentFlowError::ProviderError(PaymentProviderError::Timeout) => Self::UpstreamTimeout(e.to_string()),
            PaymentFlowError::ProviderError(PaymentProviderError::PaymentNotFound(id)) => {
                Self::NoRecordFound(format!("Payment {id}"))
            },
            PaymentFlowError::ProviderError(_) => Self::UpstreamError(e.to_string()),
            PaymentFlowError::LedgerError(_) | PaymentFlowError::UntrackedApprovedPayment(_) => {
                Self::BackendError(e.to_string())
            },
        }
    }
}

impl From<DeckApiError> for ServerError {
    fn from(e: DeckApiError) -> Self {
        match e {
            DeckApiError::ValidationError(s) => Self::ValidationError(s),
            DeckApiError::ProviderError(DeckProviderError::Timeout) => Self::UpstreamTimeout(e.to_string()),
            DeckApiError::ProviderError(_) => Self::UpstreamError(e.to_string()),
            DeckApiError::StoreError(DeckStoreError::InsufficientFunds { .. }) => Self::InsufficientFunds(e.to_string()),
            DeckApiError::StoreError(DeckStoreError::InvalidDeck(s)) => Self::ValidationError(s),
            DeckApiError::StoreError(_) => Self::BackendError(e.to_string()),
        }
    }
}

impl From<MatchApiError> for ServerError {
    fn from(e: MatchApiError) -> Self {
        match e {
            MatchApiError::ValidationError(s) => Self::ValidationError(s),
            MatchApiError::StoreError(MatchStoreError::ChallengeNotFound(_)) => Self::NoRecordFound(e.to_string()),
            MatchApiError::StoreError(MatchStoreError::DeckNotFound(_)) => Self::NoRecordFound(e.to_string()),
            MatchApiError::StoreError(_) | MatchApiError::DeckError(_) => Self::BackendError(e.to_string()),
        }
    }
}

impl From<AccountQueryError> for ServerError {
    fn from(e: AccountQueryError) -> Self {
        match e {
            AccountQueryError::ValidationError(s) => Self::ValidationError(s),
            AccountQueryError::StoreError(_) => Self::BackendError(e.to_string()),
        }
    }
}
