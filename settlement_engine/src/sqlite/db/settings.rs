use sqlx::SqliteConnection;

use crate::{db_types::SettlementSettings, traits::StoreError};

pub async fn fetch_settings(conn: &mut SqliteConnection) -> Result<Option<SettlementSettings>, StoreError> {
    let settings = sqlx::query_as(
        "SELECT restaurant_commission_rate, rider_commission_rate, dispute_window_hours FROM settings WHERE id = 1",
    )
    .fetch_optional(conn)
    .await?;
    Ok(settings)
}

pub async fn save_settings(
    settings: SettlementSettings,
    conn: &mut SqliteConnection,
) -> Result<SettlementSettings, StoreError> {
    let settings = sqlx::query_as(
        r#"
            INSERT INTO settings (id, restaurant_commission_rate, rider_commission_rate, dispute_window_hours)
            VALUES (1, $1, $2, $3)
            ON CONFLICT (id) DO UPDATE SET
                restaurant_commission_rate = excluded.restaurant_commission_rate,
                rider_commission_rate = excluded.rider_commission_rate,
                dispute_window_hours = excluded.dispute_window_hours,
                updated_at = CURRENT_TIMESTAMP
            RETURNING restaurant_commission_rate, rider_commission_rate, dispute_window_hours;
        "#,
    )
    .bind(settings.restaurant_commission_rate)
    .bind(settings.rider_commission_rate)
    .bind(settings.dispute_window_hours)
    .fetch_one(conn)
    .await?;
    Ok(settings)
}
