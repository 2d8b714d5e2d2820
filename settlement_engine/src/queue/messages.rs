use serde::{Deserialize, Serialize};

use crate::{
    db_types::{NewOrder, Order},
    queue::QueueName,
    traits::{MessageQueue, QueueError},
};

/// An order submitted through the API, waiting to be placed and paid for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCreateMessage {
    pub user_id: i64,
    pub order: NewOrder,
}

/// A snapshot of an order that has just been delivered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiderPaymentMessage {
    pub order: Order,
}

pub async fn publish_json<Q, T>(queue: &Q, name: QueueName, payload: &T) -> Result<i64, QueueError>
where
    Q: MessageQueue,
    T: Serialize,
{
    let payload = serde_json::to_string(payload)?;
    queue.publish(name, payload).await
}
