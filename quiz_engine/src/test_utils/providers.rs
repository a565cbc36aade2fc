//! In-memory stand-ins for the external collaborators.
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc,
        Mutex,
        MutexGuard,
    },
    time::Duration,
};

use chrono::NaiveDate;

use crate::{
    db_types::{Money, Question, TransactionStatus},
    traits::{
        CreateIntentRequest,
        DeckProvider,
        DeckProviderError,
        DeckRequest,
        GeneratedDeck,
        PaymentIntent,
        PaymentProvider,
        PaymentProviderError,
        ProviderPayment,
    },
};

/// `count` valid questions. The correct answer to question `i` is option `i % 4`.
pub fn sample_questions(prefix: &str, count: usize) -> Vec<Question> {
    (0..count)
        .map(|i| {
            Question::new(format!("{prefix}-{i}"), format!("{prefix} question {i}?"), ["A", "B", "C", "D"], i % 4)
                .with_explanation(format!("Because option {} is right", i % 4))
        })
        .collect()
}

//--------------------------------------   StaticDeckProvider   ------------------------------------------------------
/// A deck provider that makes up questions locally. It can be switched into a failing mode.
#[derive(Debug, Default)]
pub struct StaticDeckProvider {
    calls: AtomicUsize,
    failing: AtomicBool,
    daily_topic: Option<String>,
}

impl StaticDeckProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_daily_topic(mut self, topic: impl Into<String>) -> Self {
        self.daily_topic = Some(topic.into());
        self
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn daily_topic(&self, date: NaiveDate) -> String {
        self.daily_topic.clone().unwrap_or_else(|| format!("On this day, {}", date.format("%B %-d")))
    }
}

impl DeckProvider for StaticDeckProvider {
    async fn generate_deck(&self, request: DeckRequest) -> Result<GeneratedDeck, DeckProviderError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(DeckProviderError::RequestFailed("the generator is offline".into()));
        }
        let topic = match request.daily_date {
            Some(date) => self.daily_topic(date),
            None => request.subject,
        };
        let questions = sample_questions(&format!("gen{call}"), request.count);
        Ok(GeneratedDeck { topic, questions })
    }
}

impl DeckProvider for Arc<StaticDeckProvider> {
    async fn generate_deck(&self, request: DeckRequest) -> Result<GeneratedDeck, DeckProviderError> {
        self.as_ref().generate_deck(request).await
    }
}

//--------------------------------------  MockPaymentProvider   ------------------------------------------------------
#[derive(Debug, Default)]
struct PaymentBook {
    payments: HashMap<String, ProviderPayment>,
    intents: HashMap<String, PaymentIntent>,
    next_id: u64,
    fail_create: bool,
    fetches: usize,
}

/// An in-memory payment provider. Payments are created as `pending`; tests then move them along with
/// [`MockPaymentProvider::set_status`]. Clones share the same state.
#[derive(Debug, Clone, Default)]
pub struct MockPaymentProvider {
    book: Arc<Mutex<PaymentBook>>,
    delay: Option<Duration>,
}

impl MockPaymentProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every call take at least `delay`.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    fn book(&self) -> MutexGuard<'_, PaymentBook> {
        self.book.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn set_create_failure(&self, fail: bool) {
        self.book().fail_create = fail;
    }

    /// Adds a payment that was not created through this provider instance.
    pub fn insert_payment(&self, payment: ProviderPayment) {
        self.book().payments.insert(payment.external_id.clone(), payment);
    }

    pub fn set_status(&self, external_id: &str, status: TransactionStatus) {
        if let Some(p) = self.book().payments.get_mut(external_id) {
            p.status = status;
        }
    }

    pub fn approve(&self, external_id: &str) {
        self.set_status(external_id, TransactionStatus::Approved);
    }

    pub fn payment(&self, external_id: &str) -> Option<ProviderPayment> {
        self.book().payments.get(external_id).cloned()
    }

    pub fn payment_count(&self) -> usize {
        self.book().payments.len()
    }

    pub fn fetch_count(&self) -> usize {
        self.book().fetches
    }

    async fn pause(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

impl PaymentProvider for MockPaymentProvider {
    async fn create_intent(&self, request: CreateIntentRequest) -> Result<PaymentIntent, PaymentProviderError> {
        self.pause().await;
        let mut book = self.book();
        if book.fail_create {
            return Err(PaymentProviderError::RequestFailed("the provider is unavailable".into()));
        }
        if let Some(intent) = book.intents.get(&request.idempotency_key) {
            return Ok(intent.clone());
        }
        book.next_id += 1;
        let external_id = format!("{}", 1000 + book.next_id);
        let intent = PaymentIntent {
            external_id: external_id.clone(),
            qr_code: Some(format!("pix-qr-{external_id}")),
            qr_code_base64: Some(format!("base64-qr-{external_id}")),
            ticket_url: Some(format!("https://pay.example.com/tickets/{external_id}")),
        };
        let payment = ProviderPayment {
            external_id: external_id.clone(),
            status: TransactionStatus::Pending,
            amount: request.amount,
            external_reference: Some(request.external_reference),
        };
        book.payments.insert(external_id, payment);
        book.intents.insert(request.idempotency_key, intent.clone());
        Ok(intent)
    }

    async fn fetch_payment(&self, external_id: &str) -> Result<ProviderPayment, PaymentProviderError> {
        self.pause().await;
        let mut book = self.book();
        book.fetches += 1;
        book.payments.get(external_id).cloned().ok_or_else(|| PaymentProviderError::PaymentNotFound(external_id.into()))
    }
}

/// A payment as the provider would report it, for tests that seed the provider directly.
pub fn provider_payment(external_id: &str, amount: Money, status: TransactionStatus) -> ProviderPayment {
    ProviderPayment { external_id: external_id.into(), status, amount, external_reference: None }
}
