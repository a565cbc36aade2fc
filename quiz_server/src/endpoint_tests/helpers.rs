use actix_web::{
    http::StatusCode,
    test,
    test::TestRequest,
    web::ServiceConfig,
    App,
};
use chrono::{TimeZone, Utc};
use log::debug;
use quiz_engine::db_types::{Coins, Deck, DeckId, Money, NewDeck, Transaction, TransactionStatus};

pub async fn get_request<F>(path: &str, configure: F) -> Result<(StatusCode, String), String>
where F: FnOnce(&mut ServiceConfig) {
    let req = TestRequest::get().uri(path);
    send(req, configure).await
}

pub async fn post_request<F>(
    path: &str,
    body: &str,
    headers: &[(&str, &str)],
    configure: F,
) -> Result<(StatusCode, String), String>
where
    F: FnOnce(&mut ServiceConfig),
{
    let mut req = TestRequest::post().uri(path).insert_header(("Content-Type", "application/json"));
    for (name, value) in headers {
        req = req.insert_header((*name, *value));
    }
    send(req.set_payload(body.to_string()), configure).await
}

async fn send<F>(req: TestRequest, configure: F) -> Result<(StatusCode, String), String>
where F: FnOnce(&mut ServiceConfig) {
    let app = App::new().configure(configure);
    let service = test::init_service(app).await;
    debug!("Making request");
    let res = test::try_call_service(&service, req.to_request()).await.map_err(|e| e.to_string())?;
    let status = res.status();
    let body = String::from_utf8_lossy(&test::read_body(res).await).into_owned();
    Ok((status, body))
}

pub fn transaction(provider_id: &str, user_id: &str, reais: i64, status: TransactionStatus) -> Transaction {
    let ts = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
    Transaction {
        id: 1,
        user_id: user_id.to_string(),
        amount: Money::from_reais(reais),
        coins: Coins::from(reais * 10),
        status,
        provider_id: provider_id.to_string(),
        qr_code: None,
        qr_code_base64: None,
        created_at: ts,
        updated_at: ts,
    }
}

pub fn stored_deck(id: i64, new_deck: NewDeck) -> Deck {
    Deck {
        id: DeckId::from(id),
        owner_id: new_deck.owner_id,
        title: new_deck.title,
        subject: new_deck.subject,
        grade: new_deck.grade,
        questions: new_deck.questions,
        is_daily: new_deck.daily_date.is_some(),
        daily_date: new_deck.daily_date,
        cost: new_deck.cost,
        created_at: Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
    }
}
