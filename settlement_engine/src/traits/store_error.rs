use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Order {0} does not exist")]
    OrderNotFound(i64),
    #[error("An order with number {0} already exists")]
    OrderAlreadyExists(String),
    #[error("Payment {0} does not exist")]
    PaymentNotFound(i64),
    #[error("Order {0} already has a live payment")]
    PaymentAlreadyExists(i64),
    #[error("Rider {0} does not exist")]
    RiderNotFound(i64),
    #[error("Invalid data in the store: {0}")]
    InvalidData(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::DatabaseError(e.to_string())
    }
}
