use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use log::*;
use quiz_engine::{events::EventProducers, AccountApi, DeckApi, MatchApi, PaymentFlowApi, SqliteDatabase};

use crate::{
    config::ServerConfig,
    errors::ServerError,
    integrations::{create_event_handlers, DeckGeneratorClient, PaymentClient},
    middleware::HmacMiddlewareFactory,
    routes::{
        health,
        BalanceRoute,
        ChallengeByIdRoute,
        CreateChallengeRoute,
        CreatePaymentRoute,
        DailyDeckRoute,
        DeckByIdRoute,
        GenerateDeckRoute,
        JoinChallengeRoute,
        PaymentWebhookRoute,
        RecordMatchRoute,
    },
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.migrate().await.map_err(|e| ServerError::InitializeError(format!("Database migration failed. {e}")))?;
    info!("🗃️ Database migrations are up to date");
    let payment_client =
        PaymentClient::new(config.payment.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let deck_client = DeckGeneratorClient::new(config.deck_generator.clone())
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let handlers = create_event_handlers();
    let producers = handlers.producers();
    handlers.start_handlers().await;
    let srv = create_server_instance(config, db, payment_client, deck_client, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    payment_client: PaymentClient,
    deck_client: DeckGeneratorClient,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let bind_addr = (config.host.clone(), config.port);
    let srv = HttpServer::new(move || {
        let payments_api = PaymentFlowApi::new(db.clone(), payment_client.clone(), producers.clone())
            .with_options(config.reconciler_options());
        let match_api = MatchApi::new(db.clone(), producers.clone());
        let deck_api = DeckApi::new(db.clone(), deck_client.clone()).with_options(config.deck_options());
        let accounts_api = AccountApi::new(db.clone());
        let app = App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("quiz::access_log"))
            .app_data(web::Data::new(payments_api))
            .app_data(web::Data::new(match_api))
            .app_data(web::Data::new(deck_api))
            .app_data(web::Data::new(accounts_api));
        // Payment notifications must carry a valid provider signature
        let webhook_scope = web::scope("/api/payment/webhook")
            .wrap(HmacMiddlewareFactory::new(
                config.payment.webhook_secret.clone(),
                config.payment.signature_checks,
            ))
            .service(PaymentWebhookRoute::<SqliteDatabase, PaymentClient>::new());
        let api_scope = web::scope("/api")
            .service(CreatePaymentRoute::<SqliteDatabase, PaymentClient>::new())
            .service(BalanceRoute::<SqliteDatabase>::new())
            .service(GenerateDeckRoute::<SqliteDatabase, DeckGeneratorClient>::new())
            .service(DailyDeckRoute::<SqliteDatabase, DeckGeneratorClient>::new())
            .service(DeckByIdRoute::<SqliteDatabase, DeckGeneratorClient>::new())
            .service(CreateChallengeRoute::<SqliteDatabase>::new())
            .service(JoinChallengeRoute::<SqliteDatabase>::new())
            .service(ChallengeByIdRoute::<SqliteDatabase>::new())
            .service(RecordMatchRoute::<SqliteDatabase>::new());
        // The webhook scope must be registered before "/api", which would otherwise claim its requests
        app.service(health).service(webhook_scope).service(api_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind(bind_addr)?
    .run();
    Ok(srv)
}
