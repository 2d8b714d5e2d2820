use chrono::{DateTime, Utc};

use crate::{
    db_types::{NewOrder, Order, OrderStatusType},
    traits::StoreError,
};

/// The slice of the order service that settlement depends on.
#[allow(async_fn_in_trait)]
pub trait OrderManagement {
    async fn place_order(&self, user_id: i64, order: NewOrder) -> Result<Order, StoreError>;

    async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, StoreError>;

    async fn fetch_order_by_number(&self, order_number: &str) -> Result<Option<Order>, StoreError>;

    /// Conditional status change. Returns `None` if the order was not in the `from` state. Callers are responsible for
    /// checking that `from -> to` is a valid step in the order lifecycle.
    async fn transition_order_status(
        &self,
        order_id: i64,
        from: OrderStatusType,
        to: OrderStatusType,
    ) -> Result<Option<Order>, StoreError>;

    async fn assign_rider(&self, order_id: i64, rider_id: i64) -> Result<Order, StoreError>;

    /// Sets `delivery_confirmed`. Returns true if the flag changed.
    async fn mark_delivery_confirmed(&self, order_id: i64) -> Result<bool, StoreError>;

    /// Delivered orders with a rider, not yet confirmed, whose estimated delivery time is before `cutoff`.
    async fn fetch_unsettled_deliveries(&self, cutoff: DateTime<Utc>) -> Result<Vec<Order>, StoreError>;
}
