//! Idempotency keys and business identifiers.
//!
//! Commission references are derived from the order number, so that every path that tries to pay the same
//! commission (webhook redelivery, queue redelivery, the settlement sweep) collides on the same key. Everything else
//! gets a fresh, unique reference.
use chrono::Utc;
use rand::{distributions::Alphanumeric, Rng};

use crate::db_types::ActorType;

fn random_suffix(len: usize) -> String {
    rand::thread_rng().sample_iter(&Alphanumeric).take(len).map(char::from).collect::<String>().to_lowercase()
}

pub fn restaurant_commission_reference(order_number: &str) -> String {
    format!("restaurant-commission-{order_number}")
}

pub fn rider_commission_reference(order_number: &str) -> String {
    format!("rider-commission-{order_number}")
}

/// `wd-<actor type>-<actor id>-<unix millis>-<random>`
pub fn generate_withdrawal_reference(actor_id: i64, actor_type: ActorType) -> String {
    format!("wd-{actor_type}-{actor_id}-{}-{}", Utc::now().timestamp_millis(), random_suffix(6))
}

/// The reference handed to the gateway when a charge is initialized.
pub fn generate_payment_reference(order_number: &str) -> String {
    format!("pay-{order_number}-{}-{}", Utc::now().timestamp_millis(), random_suffix(6))
}

/// Used for ledger entries that were not given an explicit reference by the caller.
pub fn generate_transaction_reference() -> String {
    format!("tx-{}-{}", Utc::now().timestamp_millis(), random_suffix(10))
}

pub fn generate_order_number() -> String {
    format!("ORD-{}-{}", Utc::now().format("%Y%m%d"), random_suffix(8).to_uppercase())
}
