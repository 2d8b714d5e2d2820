use std::future::Future;

use thiserror::Error;

use crate::{db_types::QueueMessage, queue::QueueName};

/// A durable, at-least-once message queue with manual acknowledgement.
///
/// The futures are `Send` so that consumers can hand each message to its own task.
pub trait MessageQueue {
    /// Appends a message to the queue and returns its id.
    fn publish(&self, queue: QueueName, payload: String) -> impl Future<Output = Result<i64, QueueError>> + Send;

    /// Atomically marks up to `limit` ready messages as in flight and returns them, oldest first.
    fn reserve(
        &self,
        queue: QueueName,
        limit: u32,
    ) -> impl Future<Output = Result<Vec<QueueMessage>, QueueError>> + Send;

    fn ack(&self, message_id: i64) -> impl Future<Output = Result<(), QueueError>> + Send;

    /// Negative acknowledgement. With `requeue == false` the message is dead-lettered and never delivered again.
    fn nack(
        &self,
        message_id: i64,
        requeue: bool,
        reason: &str,
    ) -> impl Future<Output = Result<(), QueueError>> + Send;

    /// Returns messages left in flight by a consumer that went away to the ready state. Called once on start-up.
    fn recover_in_flight(&self, queue: QueueName) -> impl Future<Output = Result<u64, QueueError>> + Send;

    fn fetch_message(&self, message_id: i64) -> impl Future<Output = Result<Option<QueueMessage>, QueueError>> + Send;
}

#[derive(Debug, Clone, Error)]
pub enum QueueError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Could not serialize message: {0}")]
    SerializationError(String),
    #[error("Message {0} is not in flight")]
    NotInFlight(i64),
}

impl From<sqlx::Error> for QueueError {
    fn from(e: sqlx::Error) -> Self {
        QueueError::DatabaseError(e.to_string())
    }
}

impl From<serde_json::Error> for QueueError {
    fn from(e: serde_json::Error) -> Self {
        QueueError::SerializationError(e.to_string())
    }
}
