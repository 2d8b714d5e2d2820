use actix_web::{http::StatusCode, test::TestRequest};
use serde_json::{json, Value};
use settle_common::MinorUnits;
use settlement_engine::{
    db_types::{Order, OrderStatusType, PaymentMethod, PaymentStatus},
    payment_objects::PaymentInitialized,
    queue::{OrderCreateMessage, QueueName, RiderPaymentMessage},
    test_utils::{
        prepare_env::prepare_test_env,
        seed::{advance_order, new_order, pay_in_cash, seed_user},
    },
    traits::{MessageQueue, OrderManagement},
    SqliteDatabase,
};

use super::{
    helpers::{bearer, context, send},
    mocks::MockGateway,
};
use crate::{auth::Role, data_objects::OrderAccepted};

fn order_json(total: i64) -> Value {
    json!({"restaurant_id": 2, "rider_id": 3, "total_price": total, "payment_method": "cash"})
}

async fn place_cash_order(db: &SqliteDatabase, user_id: i64) -> Order {
    seed_user(db, user_id).await;
    db.place_order(user_id, new_order(2, Some(3), 4000, PaymentMethod::Cash)).await.unwrap()
}

#[actix_web::test]
async fn create_order_without_a_token() {
    let store = prepare_test_env().await;
    let req = TestRequest::post().uri("/orders").set_json(order_json(1000)).to_request();
    let (status, body) = send(context(store.db(), MockGateway::new()), req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.contains("\"success\":false"), "{body}");
}

#[actix_web::test]
async fn create_order_with_a_forged_token() {
    let store = prepare_test_env().await;
    let (name, mut token) = bearer(1, Role::User);
    token.truncate(token.len() - 4);
    token.push_str("AAAA");
    let req = TestRequest::post().uri("/orders").insert_header((name, token)).set_json(order_json(1000)).to_request();
    let (status, _) = send(context(store.db(), MockGateway::new()), req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn riders_cannot_create_orders() {
    let store = prepare_test_env().await;
    let req = TestRequest::post()
        .uri("/orders")
        .insert_header(bearer(3, Role::Rider))
        .set_json(order_json(1000))
        .to_request();
    let (status, _) = send(context(store.db(), MockGateway::new()), req).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn create_order_is_queued() {
    let store = prepare_test_env().await;
    let db = store.db();
    let req = TestRequest::post()
        .uri("/orders")
        .insert_header(bearer(1, Role::User))
        .set_json(order_json(2500))
        .to_request();
    let (status, body) = send(context(db.clone(), MockGateway::new()), req).await;
    assert_eq!(status, StatusCode::ACCEPTED, "{body}");
    let accepted: OrderAccepted = serde_json::from_str(&body).unwrap();
    assert!(accepted.success);

    let messages = db.reserve(QueueName::OrderCreate, 10).await.unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].id, accepted.message_id);
    let queued: OrderCreateMessage = serde_json::from_str(&messages[0].payload).unwrap();
    assert_eq!(queued.user_id, 1);
    assert_eq!(queued.order.total_price, MinorUnits::from(2500));
    assert_eq!(queued.order.payment_method, PaymentMethod::Cash);
}

#[actix_web::test]
async fn orders_must_have_a_positive_total() {
    let store = prepare_test_env().await;
    let db = store.db();
    let req =
        TestRequest::post().uri("/orders").insert_header(bearer(1, Role::User)).set_json(order_json(0)).to_request();
    let (status, _) = send(context(db.clone(), MockGateway::new()), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(db.reserve(QueueName::OrderCreate, 10).await.unwrap().is_empty());
}

#[actix_web::test]
async fn malformed_orders_are_a_bad_request() {
    let store = prepare_test_env().await;
    let req = TestRequest::post()
        .uri("/orders")
        .insert_header(bearer(1, Role::User))
        .set_json(json!({"restaurant_id": "two"}))
        .to_request();
    let (status, body) = send(context(store.db(), MockGateway::new()), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("\"success\":false"), "{body}");
}

#[actix_web::test]
async fn cash_payments_complete_immediately() {
    let store = prepare_test_env().await;
    let db = store.db();
    let order = place_cash_order(&db, 1).await;
    let req = TestRequest::post()
        .uri("/payments/initialize")
        .insert_header(bearer(1, Role::User))
        .set_json(json!({"order_id": order.id, "payment_method": "cash"}))
        .to_request();
    let (status, body) = send(context(db.clone(), MockGateway::new()), req).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let paid: PaymentInitialized = serde_json::from_str(&body).unwrap();
    assert_eq!(paid.status, PaymentStatus::Completed);
    assert!(paid.authorization_url.is_none());
    let order = db.fetch_order(order.id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatusType::Processing);
}

#[actix_web::test]
async fn payments_are_guarded_by_a_token_not_a_signature() {
    let store = prepare_test_env().await;
    let db = store.db();
    let order = place_cash_order(&db, 1).await;
    let body = json!({"order_id": order.id, "payment_method": "cash"});
    let req = TestRequest::post().uri("/payments/initialize").set_json(&body).to_request();
    let (status, body_text) = send(context(db.clone(), MockGateway::new()), req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED, "{body_text}");

    // A bearer token alone is enough. No webhook signature is needed next to the webhook route.
    let req = TestRequest::post().uri("/payments/initialize").insert_header(bearer(1, Role::User)).set_json(&body).to_request();
    let (status, body_text) = send(context(db.clone(), MockGateway::new()), req).await;
    assert_eq!(status, StatusCode::OK, "{body_text}");
}

#[actix_web::test]
async fn paying_for_someone_elses_order() {
    let store = prepare_test_env().await;
    let db = store.db();
    let order = place_cash_order(&db, 1).await;
    let req = TestRequest::post()
        .uri("/payments/initialize")
        .insert_header(bearer(9, Role::User))
        .set_json(json!({"order_id": order.id, "payment_method": "cash"}))
        .to_request();
    let (status, _) = send(context(db, MockGateway::new()), req).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn paying_for_a_missing_order() {
    let store = prepare_test_env().await;
    let req = TestRequest::post()
        .uri("/payments/initialize")
        .insert_header(bearer(1, Role::User))
        .set_json(json!({"order_id": 404, "payment_method": "cash"}))
        .to_request();
    let (status, _) = send(context(store.db(), MockGateway::new()), req).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

fn status_update(order_id: i64, status: &str, header: (&'static str, String)) -> actix_http::Request {
    TestRequest::patch()
        .uri(&format!("/orders/{order_id}/status"))
        .insert_header(header)
        .set_json(json!({ "status": status }))
        .to_request()
}

#[actix_web::test]
async fn restaurants_only_update_their_own_orders() {
    let store = prepare_test_env().await;
    let db = store.db();
    let order = place_cash_order(&db, 1).await;
    pay_in_cash(&db, &order).await;
    let req = status_update(order.id, "ready_for_pickup", bearer(5, Role::Restaurant));
    let (status, _) = send(context(db.clone(), MockGateway::new()), req).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let req = status_update(order.id, "ready_for_pickup", bearer(2, Role::Restaurant));
    let (status, body) = send(context(db.clone(), MockGateway::new()), req).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let order = db.fetch_order(order.id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatusType::ReadyForPickup);
}

#[actix_web::test]
async fn customers_cannot_update_orders() {
    let store = prepare_test_env().await;
    let db = store.db();
    let order = place_cash_order(&db, 1).await;
    let (status, _) = send(context(db, MockGateway::new()), status_update(order.id, "cancelled", bearer(1, Role::User))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn updating_a_missing_order() {
    let store = prepare_test_env().await;
    let req = status_update(404, "shipped", bearer(1, Role::Admin));
    let (status, _) = send(context(store.db(), MockGateway::new()), req).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn delivery_queues_the_rider_payout() {
    let store = prepare_test_env().await;
    let db = store.db();
    let order = place_cash_order(&db, 1).await;
    pay_in_cash(&db, &order).await;
    advance_order(&db, order.id, OrderStatusType::Shipped).await;
    let (status, _) = send(context(db.clone(), MockGateway::new()), status_update(order.id, "delivered", bearer(4, Role::Rider))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(context(db.clone(), MockGateway::new()), status_update(order.id, "delivered", bearer(3, Role::Rider))).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let updated: Order = serde_json::from_str(&body).unwrap();
    assert_eq!(updated.status, OrderStatusType::Delivered);

    let messages = db.reserve(QueueName::RiderPayment, 10).await.unwrap();
    assert_eq!(messages.len(), 1);
    let queued: RiderPaymentMessage = serde_json::from_str(&messages[0].payload).unwrap();
    assert_eq!(queued.order.id, order.id);
}

#[actix_web::test]
async fn unpaid_orders_cannot_be_marked_delivered() {
    let store = prepare_test_env().await;
    let db = store.db();
    let order = place_cash_order(&db, 1).await;
    let (status, body) = send(context(db.clone(), MockGateway::new()), status_update(order.id, "delivered", bearer(3, Role::Rider))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
    assert!(body.contains("cannot move from pending to delivered"), "{body}");

    // Cancelled orders stay cancelled
    let (status, _) = send(context(db.clone(), MockGateway::new()), status_update(order.id, "cancelled", bearer(2, Role::Restaurant))).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(context(db.clone(), MockGateway::new()), status_update(order.id, "delivered", bearer(3, Role::Rider))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let order = db.fetch_order(order.id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatusType::Cancelled);
    assert!(db.reserve(QueueName::RiderPayment, 10).await.unwrap().is_empty());
}
