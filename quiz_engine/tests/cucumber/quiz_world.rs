use std::time::Duration;

use cucumber::World;
use log::*;
use quiz_engine::{
    db_types::{Challenge, Deck},
    events::EventProducers,
    test_utils::{prepare_env::fresh_database, providers::MockPaymentProvider},
    MatchApi,
    NotificationOutcome,
    PaymentFlowApi,
    PaymentFlowError,
    ReconcilerOptions,
    SqliteDatabase,
};

#[derive(Default, Debug, World)]
pub struct QuizWorld {
    pub system: Option<QuizSystem>,
}

#[derive(Debug)]
pub struct QuizSystem {
    pub db_path: String,
    pub db: SqliteDatabase,
    pub provider: MockPaymentProvider,
    pub payments: PaymentFlowApi<SqliteDatabase, MockPaymentProvider>,
    pub matches: MatchApi<SqliteDatabase>,
    pub last_payment: Option<String>,
    pub last_outcome: Option<Result<NotificationOutcome, PaymentFlowError>>,
    pub deck: Option<Deck>,
    pub challenge: Option<Challenge>,
}

impl QuizWorld {
    pub fn system(&self) -> &QuizSystem {
        self.system.as_ref().expect("System not initialised")
    }

    pub fn system_mut(&mut self) -> &mut QuizSystem {
        self.system.as_mut().expect("System not initialised")
    }
}

impl QuizSystem {
    pub async fn new() -> Self {
        let (db, url) = fresh_database().await;
        debug!("🚀️ Created database: {url}");
        let provider = MockPaymentProvider::new();
        let options =
            ReconcilerOptions { lookup_retries: 1, lookup_delay: Duration::from_millis(10), ..Default::default() };
        let payments =
            PaymentFlowApi::new(db.clone(), provider.clone(), EventProducers::default()).with_options(options);
        let matches = MatchApi::new(db.clone(), EventProducers::default());
        Self {
            db_path: url,
            db,
            provider,
            payments,
            matches,
            last_payment: None,
            last_outcome: None,
            deck: None,
            challenge: None,
        }
    }

    pub fn last_payment(&self) -> &str {
        self.last_payment.as_deref().expect("No payment has been made")
    }
}

