use actix_web::{http::StatusCode, test::TestRequest};
use serde_json::{json, Value};
use settle_common::MinorUnits;
use settlement_engine::{
    db_types::{ActorType, NewTransaction, TransactionStatus, WalletBalance},
    payment_objects::WithdrawalReceipt,
    test_utils::prepare_env::prepare_test_env,
    traits::{BankInfo, TransferReceipt, WalletLedger},
    SqliteDatabase,
};

use super::{
    helpers::{bearer, context, send},
    mocks::MockGateway,
};
use crate::{auth::Role, data_objects::TransactionPage};

async fn credit(db: &SqliteDatabase, actor_id: i64, actor_type: ActorType, amount: i64) {
    let tx = NewTransaction::credit(actor_id, actor_type, MinorUnits::from(amount), "Order earnings");
    db.add_transaction(tx).await.expect("Error crediting wallet");
}

fn get(uri: &str, header: (&'static str, String)) -> actix_http::Request {
    TestRequest::get().uri(uri).insert_header(header).to_request()
}

#[actix_web::test]
async fn restaurant_balance() {
    let store = prepare_test_env().await;
    let db = store.db();
    credit(&db, 7, ActorType::Restaurant, 9000).await;
    let req = get("/wallet/restaurant/balance", bearer(7, Role::Restaurant));
    let (status, body) = send(context(db, MockGateway::new()), req).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let balance: WalletBalance = serde_json::from_str(&body).unwrap();
    assert_eq!(balance.balance, MinorUnits::from(9000));
    assert_eq!(balance.available, MinorUnits::from(9000));
    assert_eq!(balance.pending, MinorUnits::from(0));
}

#[actix_web::test]
async fn new_wallets_are_empty() {
    let store = prepare_test_env().await;
    let req = get("/wallet/rider/balance", bearer(3, Role::Rider));
    let (status, body) = send(context(store.db(), MockGateway::new()), req).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let balance: WalletBalance = serde_json::from_str(&body).unwrap();
    assert_eq!(balance.balance, MinorUnits::from(0));
}

#[actix_web::test]
async fn riders_cannot_read_restaurant_wallets() {
    let store = prepare_test_env().await;
    let db = store.db();
    credit(&db, 7, ActorType::Restaurant, 9000).await;
    let (status, body) =
        send(context(db, MockGateway::new()), get("/wallet/restaurant/balance", bearer(7, Role::Rider))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(!body.contains("9000"), "{body}");
}

#[actix_web::test]
async fn customers_have_no_wallet() {
    let store = prepare_test_env().await;
    let req = get("/wallet/rider/balance", bearer(1, Role::User));
    let (status, _) = send(context(store.db(), MockGateway::new()), req).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn unknown_wallet_types() {
    let store = prepare_test_env().await;
    let req = get("/wallet/chef/balance", bearer(7, Role::Restaurant));
    let (status, _) = send(context(store.db(), MockGateway::new()), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn balance_without_a_token() {
    let store = prepare_test_env().await;
    let req = TestRequest::get().uri("/wallet/rider/balance").to_request();
    let (status, _) = send(context(store.db(), MockGateway::new()), req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn transactions_are_paged() {
    let store = prepare_test_env().await;
    let db = store.db();
    for amount in [100, 200, 300] {
        credit(&db, 3, ActorType::Rider, amount).await;
    }
    let ctx = || context(db.clone(), MockGateway::new());
    let (status, body) = send(ctx(), get("/wallet/rider/transactions?page=1&limit=2", bearer(3, Role::Rider))).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let page: TransactionPage = serde_json::from_str(&body).unwrap();
    assert_eq!(page.page, 1);
    assert_eq!(page.limit, 2);
    assert_eq!(page.transactions.len(), 2);
    // Newest first
    assert_eq!(page.transactions[0].amount, MinorUnits::from(300));

    let (_, body) = send(ctx(), get("/wallet/rider/transactions?page=2&limit=2", bearer(3, Role::Rider))).await;
    let page: TransactionPage = serde_json::from_str(&body).unwrap();
    assert_eq!(page.transactions.len(), 1);
    assert_eq!(page.transactions[0].amount, MinorUnits::from(100));

    let (status, _) = send(ctx(), get("/wallet/rider/transactions?page=abc", bearer(3, Role::Rider))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

fn transfer_gateway() -> MockGateway {
    let mut gateway = MockGateway::new();
    gateway
        .expect_list_banks()
        .returning(|| Ok(vec![BankInfo { code: "058".into(), name: "Guaranty Trust Bank".into() }]));
    gateway.expect_resolve_account().returning(|_, _| Ok("BAYO RIDER".to_string()));
    gateway.expect_create_transfer_recipient().returning(|_| Ok("RCP_test".to_string()));
    gateway
        .expect_initiate_transfer()
        .returning(|_, _, _| Ok(TransferReceipt { status: "pending".into(), transfer_code: "TRF_test".into() }));
    gateway
}

fn withdrawal(amount: i64) -> Value {
    json!({"amount": amount, "bank_code": "058", "account_number": "0123456789", "account_name": "Bayo Rider"})
}

#[actix_web::test]
async fn withdrawals_hold_the_amount() {
    let store = prepare_test_env().await;
    let db = store.db();
    credit(&db, 3, ActorType::Rider, 5000).await;
    let req = TestRequest::post()
        .uri("/wallet/rider/withdraw")
        .insert_header(bearer(3, Role::Rider))
        .set_json(withdrawal(2000))
        .to_request();
    let (status, body) = send(context(db.clone(), transfer_gateway()), req).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let receipt: WithdrawalReceipt = serde_json::from_str(&body).unwrap();
    assert_eq!(receipt.status, TransactionStatus::Pending);
    assert_eq!(receipt.transfer_code, "TRF_test");
    assert_eq!(receipt.amount, MinorUnits::from(2000));

    let balance = db.wallet_balance(3, ActorType::Rider).await.unwrap();
    assert_eq!(balance.balance, MinorUnits::from(5000));
    assert_eq!(balance.pending, MinorUnits::from(2000));
    assert_eq!(balance.available, MinorUnits::from(3000));
}

#[actix_web::test]
async fn withdrawals_cannot_exceed_the_available_balance() {
    let store = prepare_test_env().await;
    let db = store.db();
    credit(&db, 3, ActorType::Rider, 1000).await;
    // The gateway is never reached
    let req = TestRequest::post()
        .uri("/wallet/rider/withdraw")
        .insert_header(bearer(3, Role::Rider))
        .set_json(withdrawal(1001))
        .to_request();
    let (status, body) = send(context(db, MockGateway::new()), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["success"], json!(false));
}

#[actix_web::test]
async fn withdrawals_need_matching_account_names() {
    let store = prepare_test_env().await;
    let db = store.db();
    credit(&db, 3, ActorType::Rider, 5000).await;
    let mut gateway = MockGateway::new();
    gateway
        .expect_list_banks()
        .returning(|| Ok(vec![BankInfo { code: "058".into(), name: "Guaranty Trust Bank".into() }]));
    gateway.expect_resolve_account().returning(|_, _| Ok("SOMEONE ELSE".to_string()));
    let req = TestRequest::post()
        .uri("/wallet/rider/withdraw")
        .insert_header(bearer(3, Role::Rider))
        .set_json(withdrawal(2000))
        .to_request();
    let (status, _) = send(context(db.clone(), gateway), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let balance = db.wallet_balance(3, ActorType::Rider).await.unwrap();
    assert_eq!(balance.pending, MinorUnits::from(0));
}
