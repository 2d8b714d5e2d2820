use settle_common::MinorUnits;
use thiserror::Error;

use crate::{
    db_types::OrderStatusType,
    traits::{GatewayError, LedgerError, QueueError, StoreError},
};

#[derive(Debug, Clone, Error)]
pub enum SettlementError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Order {0} does not exist")]
    OrderNotFound(i64),
    #[error("User {0} does not exist")]
    UserNotFound(i64),
    #[error("No payment exists with reference {0}")]
    PaymentNotFound(String),
    #[error("No transaction exists with reference {0}")]
    TransactionNotFound(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Order {0} has already been paid for")]
    OrderAlreadyPaid(i64),
    #[error("Order {order_id} cannot be paid for while it is {status}")]
    OrderNotPayable { order_id: i64, status: OrderStatusType },
    #[error("Order {order_id} cannot move from {from} to {to}")]
    InvalidStatusTransition { order_id: i64, from: OrderStatusType, to: OrderStatusType },
    #[error("A payment for order {0} is already in progress")]
    PaymentInProgress(i64),
    #[error("An order with number {0} already exists")]
    OrderAlreadyExists(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Insufficient balance to debit {requested}")]
    InsufficientBalance { requested: MinorUnits },
    #[error("Insufficient available balance. Requested {requested}, available {available}")]
    InsufficientAvailableBalance { requested: MinorUnits, available: MinorUnits },
    #[error("Bank code {0} is not supported")]
    InvalidBankCode(String),
    #[error("The account name does not match the name registered with the bank")]
    AccountNameMismatch,
    #[error("Invalid webhook payload: {0}")]
    InvalidWebhookPayload(String),
    #[error("The payment gateway is unavailable. Please try again later.")]
    GatewayUnavailable(String),
    #[error("The payment gateway declined the request: {0}")]
    GatewayRejected(String),
    #[error("Queue error: {0}")]
    QueueError(String),
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<LedgerError> for SettlementError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::DatabaseError(s) => Self::DatabaseError(s),
            LedgerError::InvalidAmount(a) => Self::InvalidAmount(format!("transaction amounts must be positive, not {a}")),
            LedgerError::InsufficientBalance { requested } => Self::InsufficientBalance { requested },
            LedgerError::InsufficientAvailableBalance { requested, available } => {
                Self::InsufficientAvailableBalance { requested, available }
            },
            LedgerError::TransactionNotFound(r) => Self::TransactionNotFound(r),
            LedgerError::NotAWithdrawal(r) => Self::InvalidWebhookPayload(format!("{r} is not a withdrawal")),
        }
    }
}

impl From<StoreError> for SettlementError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::DatabaseError(s) => Self::DatabaseError(s),
            StoreError::OrderNotFound(id) => Self::OrderNotFound(id),
            StoreError::OrderAlreadyExists(n) => Self::OrderAlreadyExists(n),
            StoreError::PaymentNotFound(id) => Self::PaymentNotFound(format!("#{id}")),
            StoreError::PaymentAlreadyExists(order_id) => Self::PaymentInProgress(order_id),
            StoreError::RiderNotFound(id) => Self::InternalError(format!("rider {id} does not exist")),
            StoreError::InvalidData(s) => Self::InternalError(s),
        }
    }
}

impl From<GatewayError> for SettlementError {
    fn from(e: GatewayError) -> Self {
        match e {
            GatewayError::Unavailable(s) | GatewayError::InvalidResponse(s) => Self::GatewayUnavailable(s),
            GatewayError::Rejected(s) => Self::GatewayRejected(s),
        }
    }
}

impl From<QueueError> for SettlementError {
    fn from(e: QueueError) -> Self {
        Self::QueueError(e.to_string())
    }
}

impl From<sqlx::Error> for SettlementError {
    fn from(e: sqlx::Error) -> Self {
        Self::DatabaseError(e.to_string())
    }
}
