use serde::{Deserialize, Serialize};
use settle_common::MinorUnits;

use crate::db_types::{ActorType, Order, Payment, WalletTransaction};

/// A payment for an order has been confirmed, by the gateway or as a cash order. This is the cue for the
/// confirmation email.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentConfirmedEvent {
    pub order: Order,
    pub payment: Payment,
}

impl PaymentConfirmedEvent {
    pub fn new(order: Order, payment: Payment) -> Self {
        Self { order, payment }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiderPaidEvent {
    pub order: Order,
    pub rider_id: i64,
    pub amount: MinorUnits,
}

/// A withdrawal reached a terminal state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WithdrawalSettledEvent {
    pub transaction: WalletTransaction,
}

/// The gateway accepted a transfer, but its pending debit could not be written to the ledger. The money has left, so
/// the transfer has to be reconciled by hand.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WithdrawalUnrecordedEvent {
    pub actor_id: i64,
    pub actor_type: ActorType,
    pub amount: MinorUnits,
    pub reference: String,
    pub transfer_code: String,
    pub reason: String,
}
