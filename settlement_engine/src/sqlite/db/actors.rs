use sqlx::SqliteConnection;

use crate::{
    db_types::{Rider, RiderAvailability, User},
    traits::StoreError,
};

pub async fn fetch_user(user_id: i64, conn: &mut SqliteConnection) -> Result<Option<User>, StoreError> {
    let user = sqlx::query_as("SELECT * FROM users WHERE id = $1").bind(user_id).fetch_optional(conn).await?;
    Ok(user)
}

pub async fn fetch_rider(rider_id: i64, conn: &mut SqliteConnection) -> Result<Option<Rider>, StoreError> {
    let rider = sqlx::query_as("SELECT * FROM riders WHERE id = $1").bind(rider_id).fetch_optional(conn).await?;
    Ok(rider)
}

pub async fn set_rider_availability(
    rider_id: i64,
    availability: RiderAvailability,
    conn: &mut SqliteConnection,
) -> Result<Rider, StoreError> {
    let rider = sqlx::query_as("UPDATE riders SET availability = $1 WHERE id = $2 RETURNING *")
        .bind(availability)
        .bind(rider_id)
        .fetch_optional(conn)
        .await?
        .ok_or(StoreError::RiderNotFound(rider_id))?;
    Ok(rider)
}

pub async fn upsert_user(id: i64, name: &str, email: &str, conn: &mut SqliteConnection) -> Result<User, StoreError> {
    let user = sqlx::query_as(
        r#"
            INSERT INTO users (id, name, email) VALUES ($1, $2, $3)
            ON CONFLICT (id) DO UPDATE SET name = excluded.name, email = excluded.email
            RETURNING *;
        "#,
    )
    .bind(id)
    .bind(name)
    .bind(email)
    .fetch_one(conn)
    .await?;
    Ok(user)
}

pub async fn upsert_rider(id: i64, name: &str, email: &str, conn: &mut SqliteConnection) -> Result<Rider, StoreError> {
    let rider = sqlx::query_as(
        r#"
            INSERT INTO riders (id, name, email) VALUES ($1, $2, $3)
            ON CONFLICT (id) DO UPDATE SET name = excluded.name, email = excluded.email
            RETURNING *;
        "#,
    )
    .bind(id)
    .bind(name)
    .bind(email)
    .fetch_one(conn)
    .await?;
    Ok(rider)
}
