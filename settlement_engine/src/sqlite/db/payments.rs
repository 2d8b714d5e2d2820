use sqlx::SqliteConnection;

use super::is_unique_violation;
use crate::{
    db_types::{NewPayment, Payment, PaymentStatus},
    traits::StoreError,
};

pub async fn insert_payment(payment: NewPayment, conn: &mut SqliteConnection) -> Result<Payment, StoreError> {
    let order_id = payment.order_id;
    let payment = sqlx::query_as(
        r#"
            INSERT INTO payments (order_id, user_id, amount, method, reference) VALUES ($1, $2, $3, $4, $5)
            RETURNING *;
        "#,
    )
    .bind(payment.order_id)
    .bind(payment.user_id)
    .bind(payment.amount)
    .bind(payment.method)
    .bind(payment.reference)
    .fetch_one(conn)
    .await
    .map_err(|e| if is_unique_violation(&e) { StoreError::PaymentAlreadyExists(order_id) } else { e.into() })?;
    Ok(payment)
}

pub async fn fetch_payment(id: i64, conn: &mut SqliteConnection) -> Result<Option<Payment>, StoreError> {
    let payment = sqlx::query_as("SELECT * FROM payments WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(payment)
}

pub async fn fetch_payment_by_reference(
    reference: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Payment>, StoreError> {
    let payment =
        sqlx::query_as("SELECT * FROM payments WHERE reference = $1").bind(reference).fetch_optional(conn).await?;
    Ok(payment)
}

pub async fn fetch_live_payment_for_order(
    order_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<Payment>, StoreError> {
    let payment =
        sqlx::query_as("SELECT * FROM payments WHERE order_id = $1 AND status != 'failed' ORDER BY id DESC LIMIT 1")
            .bind(order_id)
            .fetch_optional(conn)
            .await?;
    Ok(payment)
}

pub async fn set_authorization_url(
    payment_id: i64,
    url: &str,
    conn: &mut SqliteConnection,
) -> Result<Payment, StoreError> {
    let payment = sqlx::query_as(
        "UPDATE payments SET authorization_url = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 RETURNING *",
    )
    .bind(url)
    .bind(payment_id)
    .fetch_optional(conn)
    .await?
    .ok_or(StoreError::PaymentNotFound(payment_id))?;
    Ok(payment)
}

pub async fn transition_status(
    payment_id: i64,
    from: PaymentStatus,
    to: PaymentStatus,
    conn: &mut SqliteConnection,
) -> Result<Option<Payment>, StoreError> {
    let payment = sqlx::query_as(
        r#"
            UPDATE payments SET status = $1, updated_at = CURRENT_TIMESTAMP
            WHERE id = $2 AND status = $3
            RETURNING *;
        "#,
    )
    .bind(to)
    .bind(payment_id)
    .bind(from)
    .fetch_optional(conn)
    .await?;
    Ok(payment)
}
