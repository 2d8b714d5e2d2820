//! Durable work queues between the webhook, the HTTP surface and the settlement workers.
//!
//! Three queues exist. Each has its own payload type:
//! * [`QueueName::OrderCreate`]: [`OrderCreateMessage`]
//! * [`QueueName::PaymentSuccess`]: [`crate::webhook_objects::ChargeData`]
//! * [`QueueName::RiderPayment`]: [`RiderPaymentMessage`]
//!
//! Delivery is at-least-once. Handlers lean on the ledger's idempotency keys, not on the queue, for exactly-once
//! effects.
mod consumer;
mod messages;

use std::fmt::Display;

pub use consumer::{typed_handler, ConsumerConfig, DrainSummary, MessageHandler, MessageOutcome, QueueConsumer};
pub use messages::{publish_json, OrderCreateMessage, RiderPaymentMessage};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QueueName {
    #[serde(rename = "order.create")]
    OrderCreate,
    #[serde(rename = "payment.success")]
    PaymentSuccess,
    #[serde(rename = "rider.payment")]
    RiderPayment,
}

impl QueueName {
    pub const ALL: [QueueName; 3] = [QueueName::OrderCreate, QueueName::PaymentSuccess, QueueName::RiderPayment];

    pub fn as_str(&self) -> &'static str {
        match self {
            QueueName::OrderCreate => "order.create",
            QueueName::PaymentSuccess => "payment.success",
            QueueName::RiderPayment => "rider.payment",
        }
    }
}

impl Display for QueueName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
