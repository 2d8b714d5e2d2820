use chrono::{Duration, Utc};
use settle_common::MinorUnits;

use crate::{
    db_types::{
        NewOrder,
        NewPayment,
        Order,
        OrderStatusType,
        Payment,
        PaymentMethod,
        PaymentStatus,
        Rider,
        SettlementSettings,
        User,
    },
    traits::{ActorDirectory, OrderManagement, PaymentManagement, SettingsStore},
    SqliteDatabase,
};

pub async fn seed_user(db: &SqliteDatabase, id: i64) -> User {
    db.upsert_user(id, &format!("User {id}"), &format!("user{id}@example.com")).await.expect("Error seeding user")
}

pub async fn seed_rider(db: &SqliteDatabase, id: i64) -> Rider {
    db.upsert_rider(id, &format!("Rider {id}"), &format!("rider{id}@example.com")).await.expect("Error seeding rider")
}

pub async fn seed_settings(db: &SqliteDatabase, restaurant_rate: f64, rider_rate: f64, window_hours: i64) {
    let settings = SettlementSettings {
        restaurant_commission_rate: restaurant_rate,
        rider_commission_rate: rider_rate,
        dispute_window_hours: window_hours,
    };
    db.save_settings(settings).await.expect("Error seeding settings");
}

pub fn new_order(restaurant_id: i64, rider_id: Option<i64>, total: i64, method: PaymentMethod) -> NewOrder {
    NewOrder {
        order_number: None,
        restaurant_id,
        rider_id,
        total_price: MinorUnits::from(total),
        payment_method: method,
        estimated_delivery_time: Some(Utc::now() + Duration::minutes(30)),
    }
}

/// Records a completed cash payment for a pending order and moves the order to `processing`.
pub async fn pay_in_cash(db: &SqliteDatabase, order: &Order) -> Payment {
    let payment = NewPayment {
        order_id: order.id,
        user_id: order.user_id,
        amount: order.total_price,
        method: PaymentMethod::Cash,
        reference: None,
    };
    let payment = db.insert_payment(payment).await.expect("Error seeding payment");
    let payment = db
        .transition_payment_status(payment.id, PaymentStatus::Processing, PaymentStatus::Completed)
        .await
        .expect("Error completing payment")
        .expect("Payment was not processing");
    db.transition_order_status(order.id, OrderStatusType::Pending, OrderStatusType::Processing)
        .await
        .expect("Error advancing order")
        .expect("Order was not pending");
    payment
}

/// Walks a paid order along the delivery path, one step at a time, until it reaches `target`.
pub async fn advance_order(db: &SqliteDatabase, order_id: i64, target: OrderStatusType) -> Order {
    use OrderStatusType::*;
    let mut order = db.fetch_order(order_id).await.expect("Error fetching order").expect("Order does not exist");
    while order.status != target {
        let next = match order.status {
            Processing => ReadyForPickup,
            ReadyForPickup => Shipped,
            Shipped => Delivered,
            other => panic!("Cannot advance an order that is {other}"),
        };
        order = db
            .transition_order_status(order_id, order.status, next)
            .await
            .expect("Error advancing order")
            .expect("Order status changed underneath the seed");
    }
    order
}
