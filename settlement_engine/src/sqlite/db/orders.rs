use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;

use super::is_unique_violation;
use crate::{
    db_types::{NewOrder, Order, OrderStatusType},
    helpers::generate_order_number,
    traits::StoreError,
};

pub async fn insert_order(user_id: i64, order: NewOrder, conn: &mut SqliteConnection) -> Result<Order, StoreError> {
    let order_number = order.order_number.unwrap_or_else(generate_order_number);
    let result = sqlx::query_as(
        r#"
            INSERT INTO orders (order_number, user_id, restaurant_id, rider_id, total_price, payment_method,
                estimated_delivery_time)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *;
        "#,
    )
    .bind(order_number.as_str())
    .bind(user_id)
    .bind(order.restaurant_id)
    .bind(order.rider_id)
    .bind(order.total_price)
    .bind(order.payment_method)
    .bind(order.estimated_delivery_time)
    .fetch_one(conn)
    .await
    .map_err(|e| if is_unique_violation(&e) { StoreError::OrderAlreadyExists(order_number.clone()) } else { e.into() })?;
    Ok(result)
}

pub async fn fetch_order(order_id: i64, conn: &mut SqliteConnection) -> Result<Option<Order>, StoreError> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE id = $1").bind(order_id).fetch_optional(conn).await?;
    Ok(order)
}

pub async fn fetch_order_by_number(
    order_number: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, StoreError> {
    let order =
        sqlx::query_as("SELECT * FROM orders WHERE order_number = $1").bind(order_number).fetch_optional(conn).await?;
    Ok(order)
}

pub async fn transition_status(
    order_id: i64,
    from: OrderStatusType,
    to: OrderStatusType,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, StoreError> {
    let order = sqlx::query_as(
        r#"
            UPDATE orders SET status = $1, updated_at = CURRENT_TIMESTAMP
            WHERE id = $2 AND status = $3
            RETURNING *;
        "#,
    )
    .bind(to)
    .bind(order_id)
    .bind(from)
    .fetch_optional(conn)
    .await?;
    Ok(order)
}

pub async fn assign_rider(order_id: i64, rider_id: i64, conn: &mut SqliteConnection) -> Result<Order, StoreError> {
    let order =
        sqlx::query_as("UPDATE orders SET rider_id = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 RETURNING *")
            .bind(rider_id)
            .bind(order_id)
            .fetch_optional(conn)
            .await?
            .ok_or(StoreError::OrderNotFound(order_id))?;
    Ok(order)
}

pub async fn mark_delivery_confirmed(order_id: i64, conn: &mut SqliteConnection) -> Result<bool, StoreError> {
    let result = sqlx::query(
        r#"
            UPDATE orders SET delivery_confirmed = TRUE, updated_at = CURRENT_TIMESTAMP
            WHERE id = $1 AND delivery_confirmed = FALSE;
        "#,
    )
    .bind(order_id)
    .execute(&mut *conn)
    .await?;
    if result.rows_affected() > 0 {
        return Ok(true);
    }
    match fetch_order(order_id, conn).await? {
        Some(_) => Ok(false),
        None => Err(StoreError::OrderNotFound(order_id)),
    }
}

pub async fn fetch_unsettled_deliveries(
    cutoff: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Vec<Order>, StoreError> {
    let orders = sqlx::query_as(
        r#"
            SELECT * FROM orders
            WHERE status = 'delivered'
              AND delivery_confirmed = FALSE
              AND rider_id IS NOT NULL
              AND estimated_delivery_time IS NOT NULL
              AND datetime(estimated_delivery_time) < datetime($1)
            ORDER BY id;
        "#,
    )
    .bind(cutoff)
    .fetch_all(conn)
    .await?;
    Ok(orders)
}
