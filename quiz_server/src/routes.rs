//! Request handler definitions
//!
//! Define each route and it handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests:
//! ```nocompile
//!     fn my_handler() -> impl Responder {
//!         std::thread::sleep(Duration::from_secs(5)); // <-- Bad practice! Will cause the current worker thread to
//! hang!
//!     }
//! ```
//! For this reason, any long, non-cpu-bound operation (e.g. I/O, database operations, etc.) should be expressed as
//! futures or asynchronous functions. Async handlers get executed concurrently by worker threads and thus don’t block
//! execution:
//!
//! ```nocompile
//!     async fn my_handler() -> impl Responder {
//!         tokio::time::sleep(Duration::from_secs(5)).await; // <-- Ok. Worker thread will handle other requests here
//!     }
//! ```
use actix_web::{get, web, HttpResponse, Responder};
use chrono::Utc;
use log::*;
use quiz_engine::{
    db_types::{ChallengeId, DeckId, NewMatchRecord},
    traits::{AccountManagement, DeckManagement, DeckProvider, MatchManagement, PaymentLedger, PaymentProvider},
    AccountApi,
    DeckApi,
    DeckPurchase,
    MatchApi,
    PaymentFlowApi,
    PaymentRequest,
};
use serde_json::json;

use crate::{
    data_objects::{
        BalanceResponse,
        CreateChallengeParams,
        CreatePaymentParams,
        JoinChallengeParams,
        JoinChallengeResponse,
        WebhookBody,
        WebhookQuery,
        WebhookResponse,
    },
    errors::ServerError,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };

    // A single backend type that implements every listed trait
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+ as one) => {
        paste::paste! { pub struct [<$name:camel Route>]<A>(core::marker::PhantomData<fn() -> A>);}
        paste::paste! { impl<A> [<$name:camel Route>]<A> {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self(core::marker::PhantomData::<fn() -> A>)
            }
        }}
        paste::paste! { impl<A> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<A>
        where
            A: $($bounds +)+ 'static,
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::<A>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Payments  ----------------------------------------------------
route!(create_payment => Post "/payment/create" impl PaymentLedger, PaymentProvider);
/// Starts a coin purchase. The response carries the PIX QR code the player pays with, and the coins they will receive
/// once the provider approves the payment.
pub async fn create_payment<L, P>(
    body: web::Json<CreatePaymentParams>,
    api: web::Data<PaymentFlowApi<L, P>>,
) -> Result<HttpResponse, ServerError>
where
    L: PaymentLedger,
    P: PaymentProvider,
{
    let params = body.into_inner();
    debug!("💻️ Payment request from {} for R$ {}", params.user_id, params.amount);
    let request = PaymentRequest::try_from(params)?;
    let response = api.create_payment_intent(request).await?;
    Ok(HttpResponse::Ok().json(response))
}

route!(payment_webhook => Post "" impl PaymentLedger, PaymentProvider);
/// Receives payment notifications from the provider.
///
/// The notification only tells us *which* payment changed. The payment's status is always fetched from the provider
/// before anything is credited, so a forged or replayed notification cannot mint coins.
///
/// Status codes tell the provider whether to deliver the notification again:
/// * 200: the notification was handled, or there is nothing to do with it.
/// * 500: a transient failure. The provider should retry.
pub async fn payment_webhook<L, P>(
    query: web::Query<WebhookQuery>,
    body: web::Bytes,
    api: web::Data<PaymentFlowApi<L, P>>,
) -> HttpResponse
where
    L: PaymentLedger,
    P: PaymentProvider,
{
    let query = query.into_inner();
    let payment_id = match query.payment_id() {
        Some(id) if query.is_payment_topic() => id.to_string(),
        Some(id) => {
            debug!("💻️ Ignoring notification for {id} with topic {:?}", query.topic());
            return HttpResponse::Ok().json(WebhookResponse::new("Ignored"));
        },
        None => match WebhookBody::payment_id(&body) {
            Some(id) => id,
            None => {
                debug!("💻️ Payment notification carried no payment id");
                return HttpResponse::Ok().json(WebhookResponse::new("No ID found"));
            },
        },
    };
    info!("💻️ Payment notification received for {payment_id}");
    match api.handle_payment_notification(&payment_id).await {
        Ok(outcome) => HttpResponse::Ok().json(WebhookResponse::from(outcome)),
        Err(e) if e.is_retryable() => {
            warn!("💻️ Payment notification for {payment_id} failed and should be retried. {e}");
            HttpResponse::InternalServerError().json(json!({ "error": e.to_string() }))
        },
        Err(e) => {
            error!("💻️ Payment notification for {payment_id} cannot be processed. {e}");
            HttpResponse::Ok().json(WebhookResponse::new(format!("Acknowledged. {e}")))
        },
    }
}

//----------------------------------------------   Balance  ----------------------------------------------------
route!(balance => Get "/balance/{user_id}" impl AccountManagement);
pub async fn balance<B: AccountManagement>(
    path: web::Path<String>,
    api: web::Data<AccountApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let user_id = path.into_inner();
    trace!("💻️ Balance request for {user_id}");
    let balance = api.balance(&user_id).await?;
    Ok(HttpResponse::Ok().json(BalanceResponse { user_id, balance }))
}

//----------------------------------------------   Decks  ----------------------------------------------------
route!(generate_deck => Post "/generate-deck" impl DeckManagement, DeckProvider);
/// Generates a new deck for the player and charges it to their balance. Replies 402 if they cannot afford it.
pub async fn generate_deck<B, P>(
    body: web::Json<DeckPurchase>,
    api: web::Data<DeckApi<B, P>>,
) -> Result<HttpResponse, ServerError>
where
    B: DeckManagement,
    P: DeckProvider,
{
    let purchase = body.into_inner();
    debug!("💻️ Deck purchase request from {} ({} / {})", purchase.user_id, purchase.subject(), purchase.grade());
    let purchased = api.purchase_deck(purchase).await?;
    Ok(HttpResponse::Ok().json(json!({
        "deck": purchased.deck,
        "deckId": purchased.deck.id,
        "balance": purchased.balance,
        "message": "Deck purchased and created!",
    })))
}

route!(daily_deck => Get "/daily-deck" impl DeckManagement, DeckProvider);
pub async fn daily_deck<B, P>(api: web::Data<DeckApi<B, P>>) -> Result<HttpResponse, ServerError>
where
    B: DeckManagement,
    P: DeckProvider,
{
    let today = Utc::now().date_naive();
    trace!("💻️ Daily deck request for {today}");
    let deck = api.daily_deck(today).await?;
    Ok(HttpResponse::Ok().json(deck))
}

route!(deck_by_id => Get "/decks/{deck_id}" impl DeckManagement, DeckProvider);
pub async fn deck_by_id<B, P>(
    path: web::Path<i64>,
    api: web::Data<DeckApi<B, P>>,
) -> Result<HttpResponse, ServerError>
where
    B: DeckManagement,
    P: DeckProvider,
{
    let deck_id = DeckId::from(path.into_inner());
    let deck = api.deck(deck_id).await?.ok_or_else(|| ServerError::NoRecordFound(format!("{deck_id}")))?;
    Ok(HttpResponse::Ok().json(deck))
}

//----------------------------------------------   Challenges  ----------------------------------------------------
route!(create_challenge => Post "/challenge/create" impl MatchManagement);
pub async fn create_challenge<B: MatchManagement>(
    body: web::Json<CreateChallengeParams>,
    api: web::Data<MatchApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let CreateChallengeParams { deck_id, user_id } = body.into_inner();
    let challenge = api.create_challenge(deck_id, &user_id).await?;
    Ok(HttpResponse::Ok().json(json!({ "challengeId": challenge.id, "challenge": challenge })))
}

route!(join_challenge => Post "/challenge/join" impl MatchManagement);
/// Registers the player in a challenge. Joining twice is harmless: the existing entry is returned with status
/// `existing`.
pub async fn join_challenge<B: MatchManagement>(
    body: web::Json<JoinChallengeParams>,
    api: web::Data<MatchApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let JoinChallengeParams { challenge_id, user_id, deck_id, max_score } = body.into_inner();
    let joined = api.join_challenge(challenge_id, &user_id, deck_id, max_score).await?;
    Ok(HttpResponse::Ok().json(JoinChallengeResponse::from(joined)))
}

route!(challenge_by_id => Get "/challenge/{challenge_id}" impl MatchManagement, DeckManagement as one);
/// The challenge, its deck and the leaderboard, best score first.
pub async fn challenge_by_id<B>(path: web::Path<i64>, api: web::Data<MatchApi<B>>) -> Result<HttpResponse, ServerError>
where B: MatchManagement + DeckManagement {
    let challenge_id = ChallengeId::from(path.into_inner());
    let board = api
        .challenge_board(challenge_id)
        .await?
        .ok_or_else(|| ServerError::NoRecordFound(format!("Challenge {challenge_id} does not exist")))?;
    Ok(HttpResponse::Ok().json(board))
}

//----------------------------------------------   Matches  ----------------------------------------------------
route!(record_match => Post "/matches" impl MatchManagement);
/// Stores the result of a finished match. Challenge matches replace the player's existing entry in the challenge.
pub async fn record_match<B: MatchManagement>(
    body: web::Json<NewMatchRecord>,
    api: web::Data<MatchApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let record = api.record_match(body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(record))
}
