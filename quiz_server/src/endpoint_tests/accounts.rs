use actix_web::{http::StatusCode, web, web::ServiceConfig};
use quiz_engine::{db_types::Coins, AccountApi};

use super::{helpers::get_request, mocks::MockAccountManager};
use crate::{data_objects::BalanceResponse, routes::BalanceRoute};

fn configure(accounts: MockAccountManager) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        let accounts_api = AccountApi::new(accounts);
        cfg.service(web::scope("/api").service(BalanceRoute::<MockAccountManager>::new()))
            .app_data(web::Data::new(accounts_api));
    }
}

#[actix_web::test]
async fn fetch_balance() {
    let _ = env_logger::try_init().ok();
    let mut accounts = MockAccountManager::new();
    accounts.expect_fetch_balance().withf(|id| id == "alice").times(1).returning(|_| Ok(Coins::from(350)));
    let (status, body) = get_request("/api/balance/alice", configure(accounts)).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let balance: BalanceResponse = serde_json::from_str(&body).unwrap();
    assert_eq!(balance, BalanceResponse { user_id: "alice".into(), balance: Coins::from(350) });
}

#[actix_web::test]
async fn unknown_players_have_nothing() {
    let _ = env_logger::try_init().ok();
    let mut accounts = MockAccountManager::new();
    accounts.expect_fetch_balance().returning(|_| Ok(Coins::default()));
    let (status, body) = get_request("/api/balance/nobody", configure(accounts)).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"userId":"nobody","balance":0}"#);
}

#[actix_web::test]
async fn blank_user_id_is_rejected() {
    let _ = env_logger::try_init().ok();
    let mut accounts = MockAccountManager::new();
    accounts.expect_fetch_balance().never();
    let (status, body) = get_request("/api/balance/%20", configure(accounts)).await.expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"error":"A user id is required"}"#);
}
