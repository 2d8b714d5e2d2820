use actix_web::{http::StatusCode, test::TestRequest};
use serde_json::{json, Value};
use settle_common::MinorUnits;
use settlement_engine::{
    db_types::{PaymentMethod, PaymentStatus},
    payment_objects::PaymentInitialized,
    queue::QueueName,
    test_utils::{
        prepare_env::prepare_test_env,
        seed::{new_order, seed_user},
    },
    traits::{ChargeInitialized, GatewayError, MessageQueue, OrderManagement, PaymentManagement},
    webhook_objects::ChargeData,
    SqliteDatabase,
};

use super::{
    helpers::{bearer, context, send, signed_webhook, webhook_request, WEBHOOK_SECRET},
    mocks::MockGateway,
};
use crate::{auth::Role, helpers::calculate_hmac};

fn charge_success(reference: &str, amount: i64) -> String {
    json!({"event": "charge.success", "data": {"reference": reference, "amount": amount}}).to_string()
}

#[actix_web::test]
async fn missing_signature() {
    let store = prepare_test_env().await;
    let req = webhook_request(&charge_success("ref_1", 5000), None);
    let (status, body) = send(context(store.db(), MockGateway::new()), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["success"], json!(false));
}

#[actix_web::test]
async fn tampered_payload() {
    let store = prepare_test_env().await;
    let signed = calculate_hmac(WEBHOOK_SECRET, charge_success("ref_1", 5000).as_bytes());
    let req = webhook_request(&charge_success("ref_1", 500000), Some(signed));
    let (status, body) = send(context(store.db(), MockGateway::new()), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("\"success\":false"), "{body}");
}

#[actix_web::test]
async fn unknown_charges_are_acknowledged() {
    let store = prepare_test_env().await;
    // No expectations: the gateway must not be asked about a payment we never started
    let gateway = MockGateway::new();
    let (status, body) = send(context(store.db(), gateway), signed_webhook(&charge_success("ref_nope", 100))).await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["message"], json!("No payment with reference ref_nope"));
}

#[actix_web::test]
async fn health_needs_neither_token_nor_signature() {
    let store = prepare_test_env().await;
    let (status, _) = send(context(store.db(), MockGateway::new()), TestRequest::get().uri("/health").to_request()).await;
    assert_eq!(status, StatusCode::OK);
}

#[actix_web::test]
async fn unknown_events_are_acknowledged() {
    let store = prepare_test_env().await;
    let payload = json!({"event": "subscription.create", "data": {}}).to_string();
    let (status, body) = send(context(store.db(), MockGateway::new()), signed_webhook(&payload)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
}

#[actix_web::test]
async fn malformed_json_is_a_bad_request() {
    let store = prepare_test_env().await;
    let (status, body) = send(context(store.db(), MockGateway::new()), signed_webhook("{\"event\": ")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("\"success\":false"), "{body}");
}

/// Starts a 5000 gateway payment for user 1 through the API and returns its reference.
async fn start_gateway_payment(db: &SqliteDatabase) -> String {
    seed_user(db, 1).await;
    let order = db.place_order(1, new_order(2, Some(3), 5000, PaymentMethod::Gateway)).await.unwrap();
    let mut gateway = MockGateway::new();
    gateway
        .expect_initialize_charge()
        .withf(|req| req.amount == MinorUnits::from(5000) && req.email == "user1@example.com")
        .times(1)
        .returning(|req| {
            Ok(ChargeInitialized { authorization_url: "https://checkout.example.com/abc".into(), reference: req.reference })
        });
    let req = TestRequest::post()
        .uri("/payments/initialize")
        .insert_header(bearer(1, Role::User))
        .set_json(json!({"order_id": order.id, "payment_method": "gateway"}))
        .to_request();
    let (status, body) = send(context(db.clone(), gateway), req).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let started: PaymentInitialized = serde_json::from_str(&body).unwrap();
    assert_eq!(started.status, PaymentStatus::Processing);
    assert_eq!(started.authorization_url.as_deref(), Some("https://checkout.example.com/abc"));
    started.reference.expect("Gateway payments have a reference")
}

#[actix_web::test]
async fn verified_charge_is_queued() {
    let store = prepare_test_env().await;
    let db = store.db();
    let reference = start_gateway_payment(&db).await;

    let mut gateway = MockGateway::new();
    gateway
        .expect_verify_charge()
        .withf(|_, amount| *amount == Some(MinorUnits::from(5000)))
        .times(1)
        .returning(|_, _| Ok(true));
    let (status, body) = send(context(db.clone(), gateway), signed_webhook(&charge_success(&reference, 5000))).await;
    assert_eq!(status, StatusCode::OK, "{body}");

    let messages = db.reserve(QueueName::PaymentSuccess, 10).await.unwrap();
    assert_eq!(messages.len(), 1);
    let queued: ChargeData = serde_json::from_str(&messages[0].payload).unwrap();
    assert_eq!(queued.reference, reference);
}

#[actix_web::test]
async fn unverified_charge_is_rejected() {
    let store = prepare_test_env().await;
    let db = store.db();
    let reference = start_gateway_payment(&db).await;

    let mut gateway = MockGateway::new();
    gateway.expect_verify_charge().returning(|_, _| Ok(false));
    let (status, body) = send(context(db.clone(), gateway), signed_webhook(&charge_success(&reference, 5000))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["success"], json!(false));
    let payment = db.fetch_payment_by_reference(&reference).await.unwrap().unwrap();
    assert_eq!(payment.status, PaymentStatus::Failed);
}

#[actix_web::test]
async fn gateway_outage_asks_for_a_retry() {
    let store = prepare_test_env().await;
    let db = store.db();
    let reference = start_gateway_payment(&db).await;

    let mut gateway = MockGateway::new();
    gateway.expect_verify_charge().returning(|_, _| Err(GatewayError::Unavailable("connection refused".into())));
    let (status, body) = send(context(db.clone(), gateway), signed_webhook(&charge_success(&reference, 5000))).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(!body.contains("connection refused"), "{body}");
    let payment = db.fetch_payment_by_reference(&reference).await.unwrap().unwrap();
    assert_eq!(payment.status, PaymentStatus::Processing);
}
