use std::{fmt::Debug, future::Future};

use log::*;

use crate::{
    db_types::{Coins, NewTransaction, Transaction},
    events::{EventProducers, PaymentApprovedEvent},
    quiz_api::{
        errors::PaymentFlowError,
        payment_objects::{
            coins_for_amount,
            NotificationOutcome,
            PaymentRequest,
            PaymentResponse,
            ReconcilerOptions,
            COIN_PACKAGES,
        },
    },
    traits::{
        CreateIntentRequest,
        CreditResult,
        InsertTransactionResult,
        PaymentLedger,
        PaymentProvider,
        PaymentProviderError,
        ProviderPayment,
    },
};

/// `PaymentFlowApi` turns coin purchases into balance credits.
///
/// There are two entry points:
/// * [`Self::create_payment_intent`] is called when a player starts a purchase. It asks the payment provider for a
///   payment the player can settle and records a pending transaction against it.
/// * [`Self::handle_payment_notification`] is called for every webhook notification from the provider. The
///   notification itself is never trusted; the provider is queried for the real state of the payment, and approved
///   payments are credited exactly once, no matter how many times (or in what order) notifications arrive.
pub struct PaymentFlowApi<L, P> {
    ledger: L,
    provider: P,
    producers: EventProducers,
    options: ReconcilerOptions,
}

impl<L, P> Debug for PaymentFlowApi<L, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PaymentFlowApi ({:?})", self.options)
    }
}

impl<L, P> PaymentFlowApi<L, P> {
    pub fn new(ledger: L, provider: P, producers: EventProducers) -> Self {
        Self { ledger, provider, producers, options: ReconcilerOptions::default() }
    }

    pub fn with_options(mut self, options: ReconcilerOptions) -> Self {
        self.options = options;
        self
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }
}

impl<L, P> PaymentFlowApi<L, P>
where
    L: PaymentLedger,
    P: PaymentProvider,
{
    /// Starts a coin purchase.
    ///
    /// The pending transaction is only written once the provider has issued the payment, so a failed or timed-out
    /// provider call leaves nothing behind. If the write itself fails, the payment details are still returned to the
    /// player: they may well pay, and the missing record is logged so that the credit can be reconciled by hand.
    pub async fn create_payment_intent(&self, request: PaymentRequest) -> Result<PaymentResponse, PaymentFlowError> {
        let user_id = request.user_id.trim();
        if user_id.is_empty() {
            return Err(PaymentFlowError::ValidationError("A user id is required".into()));
        }
        if !request.amount.is_positive() {
            return Err(PaymentFlowError::ValidationError(format!("{} is not a valid amount", request.amount)));
        }
        let coins = coins_for_amount(request.amount);
        if !COIN_PACKAGES.iter().any(|(price, _)| *price == request.amount) {
            warn!(
                "💳️ {} is not the price of any coin package. {user_id} will receive {coins} if the payment is approved",
                request.amount
            );
        }
        let intent_request = CreateIntentRequest {
            amount: request.amount,
            description: request.description(),
            payer: request.payer.clone(),
            external_reference: user_id.to_string(),
            idempotency_key: request.idempotency_key(),
        };
        let intent = self.with_timeout(self.provider.create_intent(intent_request)).await?;
        info!("💳️ Payment {} created for {user_id}. {} for {coins}", intent.external_id, request.amount);
        let transaction = NewTransaction::new(user_id, request.amount, coins, &intent.external_id)
            .with_qr_code(intent.qr_code.clone(), intent.qr_code_base64.clone());
        match self.ledger.insert_pending_transaction(transaction).await {
            Ok(InsertTransactionResult::Inserted(tx)) => {
                debug!("💳️ Pending transaction #{} recorded for payment {}", tx.id, tx.provider_id);
            },
            Ok(InsertTransactionResult::AlreadyExists(tx)) => {
                debug!("💳️ Payment {} was already recorded as transaction #{}", tx.provider_id, tx.id);
            },
            Err(e) => {
                error!(
                    "💳️ Payment {} for {user_id} ({coins}) was created, but the pending transaction could not be \
                     saved. The player can still pay, but the credit will need manual reconciliation. {e}",
                    intent.external_id
                );
            },
        }
        Ok(PaymentResponse::new(intent, coins))
    }

    /// Reconciles a single payment after a webhook notification.
    ///
    /// Approved payments are credited through the ledger's compare-and-set, so redelivered or concurrent notifications
    /// for the same payment credit the player at most once. Any other status is mirrored onto the local record without
    /// crediting anything.
    ///
    /// An `Err` means that the notification could not be fully processed. If [`PaymentFlowError::is_retryable`] is
    /// true, the provider should be asked to deliver it again.
    pub async fn handle_payment_notification(&self, external_id: &str) -> Result<NotificationOutcome, PaymentFlowError> {
        let external_id = external_id.trim();
        if external_id.is_empty() {
            return Err(PaymentFlowError::ValidationError("A payment id is required".into()));
        }
        let payment = self.with_timeout(self.provider.fetch_payment(external_id)).await?;
        debug!("💳️ Provider reports payment {external_id} as {}", payment.status);
        if !payment.status.is_approved() {
            return self.mirror_status(&payment).await;
        }
        let transaction = self.find_transaction_for_approved_payment(external_id).await?;
        if transaction.amount != payment.amount {
            warn!(
                "💳️ Payment {external_id} was approved for {}, but {} was expected. Crediting the {} recorded at \
                 creation",
                payment.amount, transaction.amount, transaction.coins
            );
        }
        let result = self.ledger.credit_approved_transaction(external_id, transaction.coins).await.map_err(|e| {
            error!(
                "💳️ Payment {external_id} is approved, but {} could not be credited to {}. The provider must retry. {e}",
                transaction.coins, transaction.user_id
            );
            PaymentFlowError::from(e)
        })?;
        match result {
            CreditResult::Credited { transaction, coins, new_balance } => {
                info!("💳️ Payment {external_id} approved. {coins} credited to {}", transaction.user_id);
                self.call_payment_approved_hook(&transaction, coins, new_balance).await;
                Ok(NotificationOutcome::Credited { transaction, new_balance })
            },
            CreditResult::AlreadyApproved => {
                debug!("💳️ Payment {external_id} has already been credited. Ignoring the notification");
                Ok(NotificationOutcome::AlreadyProcessed)
            },
            CreditResult::TransactionNotFound => {
                error!("💳️ The transaction for approved payment {external_id} disappeared before it could be credited");
                Err(PaymentFlowError::UntrackedApprovedPayment(external_id.to_string()))
            },
        }
    }

    /// A transaction in a final state is never moved back to an open one. Concurrent deliveries can fetch the
    /// provider's status at different times, and the older answer may be the last to arrive here.
    async fn mirror_status(&self, payment: &ProviderPayment) -> Result<NotificationOutcome, PaymentFlowError> {
        let id = payment.external_id.as_str();
        let Some(local) = self.ledger.fetch_transaction(id).await? else {
            warn!("💳️ Received a notification for payment {id} ({}), which we have no record of", payment.status);
            return Ok(NotificationOutcome::Unchanged);
        };
        if local.status.is_final() && !payment.status.is_final() {
            warn!(
                "💳️ Payment {id} is reported as {}, but transaction #{} was already closed as {}. Keeping it closed",
                payment.status, local.id, local.status
            );
            return Ok(NotificationOutcome::Unchanged);
        }
        match self.ledger.mirror_transaction_status(id, payment.status).await? {
            Some(tx) if tx.status.is_final() => {
                info!("💳️ Transaction #{} for payment {id} closed as {}. No coins were credited", tx.id, tx.status);
                Ok(NotificationOutcome::StatusMirrored(tx))
            },
            Some(tx) => {
                debug!("💳️ Transaction #{} for payment {id} is now {}", tx.id, tx.status);
                Ok(NotificationOutcome::StatusMirrored(tx))
            },
            None => Ok(NotificationOutcome::Unchanged),
        }
    }

    /// The webhook can arrive before the create flow has written the pending transaction, so a missing record is
    /// retried a few times before it is treated as an anomaly.
    async fn find_transaction_for_approved_payment(&self, external_id: &str) -> Result<Transaction, PaymentFlowError> {
        let mut attempt = 0;
        loop {
            if let Some(tx) = self.ledger.fetch_transaction(external_id).await? {
                return Ok(tx);
            }
            if attempt >= self.options.lookup_retries {
                break;
            }
            attempt += 1;
            debug!(
                "💳️ No transaction for approved payment {external_id} yet. Retry {attempt} of {} in {:?}",
                self.options.lookup_retries, self.options.lookup_delay
            );
            tokio::time::sleep(self.options.lookup_delay).await;
        }
        error!(
            "💳️ Payment {external_id} was approved, but there is no transaction for it. No coins have been credited. \
             Manual reconciliation is required"
        );
        Err(PaymentFlowError::UntrackedApprovedPayment(external_id.to_string()))
    }

    async fn with_timeout<T, F>(&self, call: F) -> Result<T, PaymentProviderError>
    where F: Future<Output = Result<T, PaymentProviderError>> {
        match tokio::time::timeout(self.options.provider_timeout, call).await {
            Ok(result) => result,
            Err(_) => {
                warn!("💳️ The payment provider did not respond within {:?}", self.options.provider_timeout);
                Err(PaymentProviderError::Timeout)
            },
        }
    }

    async fn call_payment_approved_hook(&self, transaction: &Transaction, coins: Coins, balance: Coins) {
        for emitter in &self.producers.payment_approved_producer {
            debug!("💳️ Notifying payment approved hook subscribers");
            let event = PaymentApprovedEvent::new(transaction.clone(), coins, balance);
            emitter.publish_event(event).await;
        }
    }
}
