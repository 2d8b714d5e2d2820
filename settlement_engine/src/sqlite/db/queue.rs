use sqlx::SqliteConnection;

use crate::{db_types::QueueMessage, queue::QueueName, traits::QueueError};

pub async fn publish(queue: QueueName, payload: &str, conn: &mut SqliteConnection) -> Result<i64, QueueError> {
    let id = sqlx::query_scalar("INSERT INTO queue_messages (queue, payload) VALUES ($1, $2) RETURNING id")
        .bind(queue.as_str())
        .bind(payload)
        .fetch_one(conn)
        .await?;
    Ok(id)
}

/// Claims up to `limit` ready messages in one statement, so two consumers can never reserve the same message.
pub async fn reserve(queue: QueueName, limit: u32, conn: &mut SqliteConnection) -> Result<Vec<QueueMessage>, QueueError> {
    let mut messages: Vec<QueueMessage> = sqlx::query_as(
        r#"
            UPDATE queue_messages SET status = 'in_flight', deliveries = deliveries + 1, updated_at = CURRENT_TIMESTAMP
            WHERE id IN (
                SELECT id FROM queue_messages WHERE queue = $1 AND status = 'ready' ORDER BY id LIMIT $2
            )
            RETURNING *;
        "#,
    )
    .bind(queue.as_str())
    .bind(i64::from(limit))
    .fetch_all(conn)
    .await?;
    // RETURNING does not guarantee any particular order
    messages.sort_by_key(|m| m.id);
    Ok(messages)
}

pub async fn ack(message_id: i64, conn: &mut SqliteConnection) -> Result<(), QueueError> {
    let result = sqlx::query(
        r#"
            UPDATE queue_messages SET status = 'acked', updated_at = CURRENT_TIMESTAMP
            WHERE id = $1 AND status = 'in_flight';
        "#,
    )
    .bind(message_id)
    .execute(conn)
    .await?;
    if result.rows_affected() == 0 {
        return Err(QueueError::NotInFlight(message_id));
    }
    Ok(())
}

pub async fn nack(message_id: i64, requeue: bool, reason: &str, conn: &mut SqliteConnection) -> Result<(), QueueError> {
    let status = if requeue { "ready" } else { "dead" };
    let result = sqlx::query(
        r#"
            UPDATE queue_messages SET status = $1, last_error = $2, updated_at = CURRENT_TIMESTAMP
            WHERE id = $3 AND status = 'in_flight';
        "#,
    )
    .bind(status)
    .bind(reason)
    .bind(message_id)
    .execute(conn)
    .await?;
    if result.rows_affected() == 0 {
        return Err(QueueError::NotInFlight(message_id));
    }
    Ok(())
}

pub async fn recover_in_flight(queue: QueueName, conn: &mut SqliteConnection) -> Result<u64, QueueError> {
    let result = sqlx::query(
        r#"
            UPDATE queue_messages SET status = 'ready', updated_at = CURRENT_TIMESTAMP
            WHERE queue = $1 AND status = 'in_flight';
        "#,
    )
    .bind(queue.as_str())
    .execute(conn)
    .await?;
    Ok(result.rows_affected())
}

pub async fn fetch_message(message_id: i64, conn: &mut SqliteConnection) -> Result<Option<QueueMessage>, QueueError> {
    let message =
        sqlx::query_as("SELECT * FROM queue_messages WHERE id = $1").bind(message_id).fetch_optional(conn).await?;
    Ok(message)
}
