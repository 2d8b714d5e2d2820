use std::{future::Future, pin::Pin, sync::Arc, time::Duration};

use log::*;
use tokio::sync::Semaphore;

use crate::{
    db_types::QueueMessage,
    queue::QueueName,
    traits::{MessageQueue, QueueError},
};

/// Runs the business logic for one message. `Err` carries a printable reason and dead-letters the message.
pub type MessageHandler =
    Arc<dyn Fn(QueueMessage) -> Pin<Box<dyn Future<Output = Result<(), String>> + Send>> + Send + Sync>;

#[derive(Debug, Clone, Copy)]
pub struct ConsumerConfig {
    /// The maximum number of messages in flight at once
    pub prefetch: usize,
    /// How long to wait before polling again when the queue is empty
    pub poll_interval: Duration,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self { prefetch: 10, poll_interval: Duration::from_millis(500) }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageOutcome {
    Acked,
    DeadLettered,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainSummary {
    pub acked: usize,
    pub dead_lettered: usize,
}

impl DrainSummary {
    pub fn total(&self) -> usize {
        self.acked + self.dead_lettered
    }
}

/// Consumes a single queue with manual acknowledgement.
///
/// Successful messages are acked. Failed messages are nacked *without* requeue: the handlers in this service are
/// only safe to re-run through their own retry surfaces (webhook redelivery, the settlement sweep), and a requeue
/// loop on a permanent error would never end.
pub struct QueueConsumer<Q> {
    queue: Q,
    name: QueueName,
    config: ConsumerConfig,
}

impl<Q> QueueConsumer<Q>
where Q: MessageQueue + Clone + Send + Sync + 'static
{
    pub fn new(queue: Q, name: QueueName, config: ConsumerConfig) -> Self {
        let config = ConsumerConfig { prefetch: config.prefetch.max(1), ..config };
        Self { queue, name, config }
    }

    pub fn name(&self) -> QueueName {
        self.name
    }

    /// Runs forever. Messages orphaned in flight by a previous process are made ready again first.
    pub async fn run(self, handler: MessageHandler) {
        match self.queue.recover_in_flight(self.name).await {
            Ok(0) => {},
            Ok(n) => info!("📬️ {n} unacknowledged messages on {} returned to the queue", self.name),
            Err(e) => error!("📬️ Could not recover in-flight messages on {}: {e}", self.name),
        }
        info!("📬️ Consumer for {} started (prefetch {})", self.name, self.config.prefetch);
        let slots = Arc::new(Semaphore::new(self.config.prefetch));
        loop {
            let free = slots.available_permits();
            if free == 0 {
                // Wait for any in-flight message to finish
                match slots.acquire().await {
                    Ok(permit) => drop(permit),
                    Err(_) => break,
                }
                continue;
            }
            let batch = match self.queue.reserve(self.name, free as u32).await {
                Ok(batch) => batch,
                Err(e) => {
                    error!("📬️ Could not reserve messages on {}: {e}", self.name);
                    tokio::time::sleep(self.config.poll_interval).await;
                    continue;
                },
            };
            if batch.is_empty() {
                tokio::time::sleep(self.config.poll_interval).await;
                continue;
            }
            for message in batch {
                let Ok(permit) = Arc::clone(&slots).acquire_owned().await else {
                    break;
                };
                let queue = self.queue.clone();
                let handler = Arc::clone(&handler);
                let name = self.name;
                tokio::spawn(async move {
                    handle_message(queue, name, handler, message).await;
                    drop(permit);
                });
            }
        }
        warn!("📬️ Consumer for {} has stopped", self.name);
    }

    /// Handles ready messages, `prefetch` at a time, until none are left.
    pub async fn drain(&self, handler: &MessageHandler) -> Result<DrainSummary, QueueError> {
        let mut summary = DrainSummary::default();
        loop {
            let batch = self.queue.reserve(self.name, self.config.prefetch as u32).await?;
            if batch.is_empty() {
                return Ok(summary);
            }
            let jobs = batch
                .into_iter()
                .map(|message| {
                    let queue = self.queue.clone();
                    tokio::spawn(handle_message(queue, self.name, Arc::clone(handler), message))
                })
                .collect::<Vec<_>>();
            for job in jobs {
                match job.await {
                    Ok(MessageOutcome::Acked) => summary.acked += 1,
                    Ok(MessageOutcome::DeadLettered) => summary.dead_lettered += 1,
                    Err(e) => error!("📬️ Message handler on {} panicked: {e}", self.name),
                }
            }
        }
    }
}

async fn handle_message<Q: MessageQueue>(
    queue: Q,
    name: QueueName,
    handler: MessageHandler,
    message: QueueMessage,
) -> MessageOutcome {
    let id = message.id;
    trace!("📬️ Handling message #{id} on {name} (delivery {})", message.deliveries);
    match (handler)(message).await {
        Ok(()) => {
            if let Err(e) = queue.ack(id).await {
                error!("📬️ Message #{id} on {name} was handled but could not be acked: {e}");
            }
            debug!("📬️ Message #{id} on {name} acked");
            MessageOutcome::Acked
        },
        Err(reason) => {
            warn!("📬️ Message #{id} on {name} failed and will be dead-lettered. {reason}");
            if let Err(e) = queue.nack(id, false, &reason).await {
                error!("📬️ Could not nack message #{id} on {name}: {e}");
            }
            MessageOutcome::DeadLettered
        },
    }
}

/// Wraps a typed async handler into a [`MessageHandler`] that deserializes the payload first. Payloads that do not
/// parse are dead-lettered.
pub fn typed_handler<T, F, Fut>(f: F) -> MessageHandler
where
    T: serde::de::DeserializeOwned + Send + 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), String>> + Send + 'static,
{
    let f = Arc::new(f);
    Arc::new(move |message: QueueMessage| {
        let f = Arc::clone(&f);
        Box::pin(async move {
            let payload = serde_json::from_str::<T>(&message.payload)
                .map_err(|e| format!("Malformed payload in message #{}: {e}", message.id))?;
            (f)(payload).await
        }) as Pin<Box<dyn Future<Output = Result<(), String>> + Send>>
    })
}
