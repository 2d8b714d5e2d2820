#![allow(dead_code)]
use chrono::{Duration, Utc};
use mockall::mock;
use settle_common::MinorUnits;
use settlement_engine::{
    db_types::{NewOrder, NewPayment, Order, OrderStatusType, PaymentMethod, PaymentStatus, SettlementSettings},
    traits::{
        ActorDirectory,
        BankDetails,
        BankInfo,
        ChargeInitialized,
        ChargeRequest,
        GatewayError,
        OrderManagement,
        PaymentGateway,
        PaymentManagement,
        SettingsStore,
        TransferReceipt,
    },
    SqliteDatabase,
};
use tempfile::TempDir;

mock! {
    pub Gateway {}
    impl PaymentGateway for Gateway {
        async fn initialize_charge(&self, request: ChargeRequest) -> Result<ChargeInitialized, GatewayError>;
        async fn verify_charge(&self, reference: &str, expected_amount: Option<MinorUnits>) -> Result<bool, GatewayError>;
        async fn create_transfer_recipient(&self, bank: &BankDetails) -> Result<String, GatewayError>;
        async fn initiate_transfer(&self, recipient_code: &str, amount: MinorUnits, reference: &str) -> Result<TransferReceipt, GatewayError>;
        async fn resolve_account(&self, bank_code: &str, account_number: &str) -> Result<String, GatewayError>;
        async fn list_banks(&self) -> Result<Vec<BankInfo>, GatewayError>;
    }
}

/// Keeps the temporary directory alive for as long as the test needs the database.
pub struct TestDb {
    pub db: SqliteDatabase,
    _dir: TempDir,
}

pub async fn prepare_test_env() -> TestDb {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    let dir = tempfile::tempdir().expect("Error creating temporary directory");
    let url = format!("sqlite://{}", dir.path().join("settlement.db").display());
    let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database");
    db.run_migrations().await.expect("Error running migrations");
    TestDb { db, _dir: dir }
}

pub async fn seed_settings(db: &SqliteDatabase, restaurant_rate: f64, rider_rate: f64, window_hours: i64) {
    let settings = SettlementSettings {
        restaurant_commission_rate: restaurant_rate,
        rider_commission_rate: rider_rate,
        dispute_window_hours: window_hours,
    };
    db.save_settings(settings).await.expect("Error saving settings");
}

pub async fn seed_user(db: &SqliteDatabase, id: i64) {
    db.upsert_user(id, "Ada", &format!("user{id}@example.com")).await.expect("Error seeding user");
}

pub async fn seed_rider(db: &SqliteDatabase, id: i64) {
    db.upsert_rider(id, "Bayo", &format!("rider{id}@example.com")).await.expect("Error seeding rider");
}

pub fn new_order(restaurant_id: i64, rider_id: Option<i64>, total: i64, method: PaymentMethod) -> NewOrder {
    NewOrder {
        order_number: None,
        restaurant_id,
        rider_id,
        total_price: MinorUnits::from(total),
        payment_method: method,
        estimated_delivery_time: Some(Utc::now() - Duration::hours(3)),
    }
}

/// Settles a pending order in cash and walks it along the delivery path to `delivered`.
pub async fn deliver(db: &SqliteDatabase, order: &Order) -> Order {
    let payment = NewPayment {
        order_id: order.id,
        user_id: order.user_id,
        amount: order.total_price,
        method: PaymentMethod::Cash,
        reference: None,
    };
    let payment = db.insert_payment(payment).await.expect("Error saving payment");
    db.transition_payment_status(payment.id, PaymentStatus::Processing, PaymentStatus::Completed)
        .await
        .expect("Error completing payment");
    walk(db, order.id, &[OrderStatusType::Pending, OrderStatusType::Processing]).await;
    walk(db, order.id, &DELIVERY_PATH).await
}

pub const DELIVERY_PATH: [OrderStatusType; 4] = [
    OrderStatusType::Processing,
    OrderStatusType::ReadyForPickup,
    OrderStatusType::Shipped,
    OrderStatusType::Delivered,
];

/// Moves the order through each consecutive pair in `path` using the store's conditional write.
pub async fn walk(db: &SqliteDatabase, order_id: i64, path: &[OrderStatusType]) -> Order {
    let mut order = None;
    for step in path.windows(2) {
        order = db.transition_order_status(order_id, step[0], step[1]).await.expect("Error updating order status");
        assert!(order.is_some(), "order #{order_id} was not {}", step[0]);
    }
    order.expect("path needs at least two statuses")
}

pub fn banks() -> Vec<BankInfo> {
    vec![
        BankInfo { code: "058".into(), name: "Guaranty Trust Bank".into() },
        BankInfo { code: "044".into(), name: "Access Bank".into() },
    ]
}

pub fn bank_details() -> BankDetails {
    BankDetails { bank_code: "058".into(), account_number: "0123456789".into(), account_name: "Mama Put Kitchen".into() }
}

/// A gateway that accepts every withdrawal step.
pub fn transfer_gateway() -> MockGateway {
    let mut gateway = MockGateway::new();
    gateway.expect_list_banks().returning(|| Ok(banks()));
    gateway.expect_resolve_account().returning(|_, _| Ok("MAMA PUT  KITCHEN".to_string()));
    gateway.expect_create_transfer_recipient().returning(|_| Ok("RCP_test".to_string()));
    gateway
        .expect_initiate_transfer()
        .returning(|_, _, _| Ok(TransferReceipt { status: "pending".into(), transfer_code: "TRF_test".into() }));
    gateway
}
