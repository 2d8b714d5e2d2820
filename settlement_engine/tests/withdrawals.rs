use std::time::Duration;

use futures_util::FutureExt;
use mockall::mock;
use serde_json::json;
use settle_common::MinorUnits;
use settlement_engine::{
    db_types::{ActorType, NewTransaction, TransactionStatus, Wallet, WalletBalance, WalletTransaction},
    events::{EventHandlers, EventHooks},
    payment_objects::{DispatchOutcome, WithdrawalRequest},
    traits::{BankDetails, FinalizedWithdrawal, GatewayError, LedgerError, WalletLedger, WithdrawalOutcome},
    webhook_objects::WebhookPayload,
    SettlementError,
    WebhookApi,
    WithdrawalApi,
};

mod support;

use support::{bank_details, banks, prepare_test_env, transfer_gateway, MockGateway};

const RESTAURANT: i64 = 5;

mock! {
    pub Ledger {}
    impl WalletLedger for Ledger {
        async fn fetch_or_create_wallet(&self, actor_id: i64, actor_type: ActorType) -> Result<Wallet, LedgerError>;
        async fn add_transaction(&self, tx: NewTransaction) -> Result<Wallet, LedgerError>;
        async fn fetch_transaction_by_reference(&self, reference: &str) -> Result<Option<WalletTransaction>, LedgerError>;
        async fn wallet_balance(&self, actor_id: i64, actor_type: ActorType) -> Result<WalletBalance, LedgerError>;
        async fn record_pending_withdrawal(&self, actor_id: i64, actor_type: ActorType, amount: MinorUnits, reference: &str, description: &str) -> Result<WalletTransaction, LedgerError>;
        async fn finalize_withdrawal(&self, reference: &str, outcome: WithdrawalOutcome) -> Result<FinalizedWithdrawal, LedgerError>;
        async fn fetch_transactions(&self, actor_id: i64, actor_type: ActorType, page: u32, limit: u32) -> Result<Vec<WalletTransaction>, LedgerError>;
    }
}

async fn fund(db: &settlement_engine::SqliteDatabase, amount: i64) {
    let tx = NewTransaction::credit(RESTAURANT, ActorType::Restaurant, MinorUnits::from(amount), "commission")
        .with_reference(format!("seed-{amount}"));
    db.add_transaction(tx).await.unwrap();
}

fn request(amount: i64) -> WithdrawalRequest {
    WithdrawalRequest { amount: MinorUnits::from(amount), bank: bank_details() }
}

fn transfer_event(event: &str, reference: &str) -> WebhookPayload {
    serde_json::from_value(json!({
        "event": event,
        "data": { "reference": reference, "amount": 400, "transfer_code": "TRF_test" }
    }))
    .unwrap()
}

#[tokio::test]
async fn withdrawal_round_trip() {
    let env = prepare_test_env().await;
    let db = env.db.clone();
    fund(&db, 1000).await;
    let api = WithdrawalApi::new(db.clone(), transfer_gateway(), Default::default());
    let receipt = api.process_withdrawal(RESTAURANT, ActorType::Restaurant, request(400)).await.unwrap();
    assert_eq!(receipt.status, TransactionStatus::Pending);
    assert_eq!(receipt.transfer_code, "TRF_test");
    assert!(receipt.reference.starts_with(&format!("wd-restaurant-{RESTAURANT}-")));

    let balance = db.wallet_balance(RESTAURANT, ActorType::Restaurant).await.unwrap();
    assert_eq!(balance.balance, MinorUnits::from(1000));
    assert_eq!(balance.available, MinorUnits::from(600));

    let webhooks = WebhookApi::new(db.clone(), MockGateway::new(), Default::default());
    let outcome = webhooks.dispatch(transfer_event("transfer.success", &receipt.reference)).await.unwrap();
    assert!(matches!(outcome, DispatchOutcome::Accepted(_)));
    let balance = db.wallet_balance(RESTAURANT, ActorType::Restaurant).await.unwrap();
    assert_eq!(balance.balance, MinorUnits::from(600));
    assert_eq!(balance.pending, MinorUnits::ZERO);

    // A duplicate delivery is acknowledged, and debits nothing
    let outcome = webhooks.dispatch(transfer_event("transfer.success", &receipt.reference)).await.unwrap();
    assert!(matches!(outcome, DispatchOutcome::Ignored(_)));
    let balance = db.wallet_balance(RESTAURANT, ActorType::Restaurant).await.unwrap();
    assert_eq!(balance.balance, MinorUnits::from(600));
}

#[tokio::test]
async fn failed_transfers_release_the_funds() {
    let env = prepare_test_env().await;
    let db = env.db.clone();
    fund(&db, 1000).await;
    let api = WithdrawalApi::new(db.clone(), transfer_gateway(), Default::default());
    let receipt = api.process_withdrawal(RESTAURANT, ActorType::Restaurant, request(400)).await.unwrap();
    let webhooks = WebhookApi::new(db.clone(), MockGateway::new(), Default::default());
    let outcome = webhooks.dispatch(transfer_event("transfer.reversed", &receipt.reference)).await.unwrap();
    assert!(matches!(outcome, DispatchOutcome::Accepted(_)));
    let tx = db.fetch_transaction_by_reference(&receipt.reference).await.unwrap().unwrap();
    assert_eq!(tx.status, TransactionStatus::Failed);
    let balance = db.wallet_balance(RESTAURANT, ActorType::Restaurant).await.unwrap();
    assert_eq!(balance.balance, MinorUnits::from(1000));
    assert_eq!(balance.available, MinorUnits::from(1000));
}

#[tokio::test]
async fn withdrawals_need_available_funds() {
    let env = prepare_test_env().await;
    let db = env.db.clone();
    fund(&db, 1000).await;
    db.record_pending_withdrawal(RESTAURANT, ActorType::Restaurant, MinorUnits::from(400), "wd-earlier", "earlier")
        .await
        .unwrap();
    // The balance check happens before any gateway call
    let api = WithdrawalApi::new(db.clone(), MockGateway::new(), Default::default());
    let err = api.process_withdrawal(RESTAURANT, ActorType::Restaurant, request(700)).await.unwrap_err();
    assert!(matches!(err, SettlementError::InsufficientAvailableBalance { .. }));
    let err = api.process_withdrawal(RESTAURANT, ActorType::Restaurant, request(0)).await.unwrap_err();
    assert!(matches!(err, SettlementError::InvalidAmount(_)));

    let api = WithdrawalApi::new(db.clone(), transfer_gateway(), Default::default());
    api.process_withdrawal(RESTAURANT, ActorType::Restaurant, request(600)).await.unwrap();
    let balance = db.wallet_balance(RESTAURANT, ActorType::Restaurant).await.unwrap();
    assert_eq!(balance.available, MinorUnits::ZERO);
}

#[tokio::test]
async fn unsupported_banks_are_rejected() {
    let env = prepare_test_env().await;
    let db = env.db.clone();
    fund(&db, 1000).await;
    let mut gateway = MockGateway::new();
    gateway.expect_list_banks().returning(|| Ok(banks()));
    let api = WithdrawalApi::new(db.clone(), gateway, Default::default());
    let mut req = request(100);
    req.bank = BankDetails { bank_code: "999".into(), ..bank_details() };
    let err = api.process_withdrawal(RESTAURANT, ActorType::Restaurant, req).await.unwrap_err();
    assert!(matches!(err, SettlementError::InvalidBankCode(code) if code == "999"));
}

#[tokio::test]
async fn account_names_must_match() {
    let env = prepare_test_env().await;
    let db = env.db.clone();
    fund(&db, 1000).await;
    let mut gateway = MockGateway::new();
    gateway.expect_list_banks().returning(|| Ok(banks()));
    gateway.expect_resolve_account().returning(|_, _| Ok("SOMEONE ELSE".to_string()));
    gateway.expect_create_transfer_recipient().never();
    let api = WithdrawalApi::new(db.clone(), gateway, Default::default());
    let err = api.process_withdrawal(RESTAURANT, ActorType::Restaurant, request(100)).await.unwrap_err();
    assert!(matches!(err, SettlementError::AccountNameMismatch));
}

#[tokio::test]
async fn gateway_failures_leave_the_ledger_alone() {
    let env = prepare_test_env().await;
    let db = env.db.clone();
    fund(&db, 1000).await;
    let mut gateway = MockGateway::new();
    gateway.expect_list_banks().returning(|| Ok(banks()));
    gateway.expect_resolve_account().returning(|_, _| Ok("Mama Put Kitchen".to_string()));
    gateway.expect_create_transfer_recipient().returning(|_| Ok("RCP_test".to_string()));
    gateway.expect_initiate_transfer().returning(|_, _, _| Err(GatewayError::Unavailable("502 Bad Gateway".into())));
    let api = WithdrawalApi::new(db.clone(), gateway, Default::default());
    let err = api.process_withdrawal(RESTAURANT, ActorType::Restaurant, request(100)).await.unwrap_err();
    assert!(matches!(err, SettlementError::GatewayUnavailable(_)));

    let mut gateway = MockGateway::new();
    gateway.expect_list_banks().returning(|| Ok(banks()));
    gateway.expect_resolve_account().returning(|_, _| Ok("Mama Put Kitchen".to_string()));
    gateway.expect_create_transfer_recipient().returning(|_| Err(GatewayError::Rejected("Invalid account".into())));
    let api = WithdrawalApi::new(db.clone(), gateway, Default::default());
    let err = api.process_withdrawal(RESTAURANT, ActorType::Restaurant, request(100)).await.unwrap_err();
    assert!(matches!(err, SettlementError::GatewayRejected(_)));

    let balance = db.wallet_balance(RESTAURANT, ActorType::Restaurant).await.unwrap();
    assert_eq!(balance.balance, MinorUnits::from(1000));
    assert_eq!(balance.pending, MinorUnits::ZERO);
}

#[tokio::test]
async fn accepted_transfers_that_cannot_be_recorded_are_reported() {
    let _ = env_logger::try_init();
    // The funds are there when the withdrawal starts, and gone by the time the debit is written
    let mut ledger = MockLedger::new();
    ledger
        .expect_wallet_balance()
        .returning(|_, _| Ok(WalletBalance::new(MinorUnits::from(1000), MinorUnits::ZERO)));
    ledger.expect_record_pending_withdrawal().times(1).returning(|_, _, amount, _, _| {
        Err(LedgerError::InsufficientAvailableBalance { requested: amount, available: MinorUnits::from(200) })
    });
    let (sender, mut unrecorded) = tokio::sync::mpsc::channel(4);
    let mut hooks = EventHooks::default();
    hooks.on_withdrawal_unrecorded(move |ev| {
        let sender = sender.clone();
        async move {
            sender.send(ev).await.unwrap();
        }
        .boxed()
    });
    let handlers = EventHandlers::new(4, hooks);
    let producers = handlers.producers();
    tokio::spawn(handlers.start_handlers());

    let api = WithdrawalApi::new(ledger, transfer_gateway(), producers);
    let err = api.process_withdrawal(RESTAURANT, ActorType::Restaurant, request(600)).await.unwrap_err();
    assert!(matches!(err, SettlementError::InsufficientAvailableBalance { .. }), "{err:?}");

    let ev = tokio::time::timeout(Duration::from_secs(2), unrecorded.recv()).await.unwrap().unwrap();
    assert_eq!(ev.actor_id, RESTAURANT);
    assert_eq!(ev.actor_type, ActorType::Restaurant);
    assert_eq!(ev.amount, MinorUnits::from(600));
    assert_eq!(ev.transfer_code, "TRF_test");
    assert!(ev.reference.starts_with(&format!("wd-restaurant-{RESTAURANT}-")));
    assert!(ev.reason.contains("Insufficient available balance"), "{}", ev.reason);
}
