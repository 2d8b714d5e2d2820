use settle_common::MinorUnits;
use thiserror::Error;

use crate::{
    db_types::{ActorType, NewTransaction, Wallet, WalletBalance, WalletTransaction},
    traits::data_objects::{FinalizedWithdrawal, WithdrawalOutcome},
};

/// The durable, per-actor ledger.
///
/// Every mutation is a single atomic unit at the storage layer. Implementations must not rely on in-process locks:
/// several workers (and several processes) may call into the same ledger concurrently.
#[allow(async_fn_in_trait)]
pub trait WalletLedger {
    /// Returns the wallet for the actor, creating an empty one if it does not exist yet. Safe under concurrent first
    /// access.
    async fn fetch_or_create_wallet(&self, actor_id: i64, actor_type: ActorType) -> Result<Wallet, LedgerError>;

    /// Appends a transaction and applies it to the balance in one atomic step.
    ///
    /// The transaction reference is the idempotency key. If a transaction with the same reference already exists,
    /// nothing is written and the current wallet is returned. Debits fail with [`LedgerError::InsufficientBalance`]
    /// if they would take the balance below zero.
    async fn add_transaction(&self, tx: NewTransaction) -> Result<Wallet, LedgerError>;

    async fn fetch_transaction_by_reference(&self, reference: &str)
        -> Result<Option<WalletTransaction>, LedgerError>;

    async fn wallet_balance(&self, actor_id: i64, actor_type: ActorType) -> Result<WalletBalance, LedgerError>;

    /// Appends a `pending` debit, provided that the available balance (balance less all pending debits) still covers
    /// `amount`. The check and the insert are one statement. The balance itself is untouched.
    async fn record_pending_withdrawal(
        &self,
        actor_id: i64,
        actor_type: ActorType,
        amount: MinorUnits,
        reference: &str,
        description: &str,
    ) -> Result<WalletTransaction, LedgerError>;

    /// Moves a pending debit into a terminal state. A successful withdrawal decrements the balance. Calling this on a
    /// transaction that is already terminal changes nothing.
    async fn finalize_withdrawal(
        &self,
        reference: &str,
        outcome: WithdrawalOutcome,
    ) -> Result<FinalizedWithdrawal, LedgerError>;

    /// Transactions for the actor, newest first. `page` is 1-based.
    async fn fetch_transactions(
        &self,
        actor_id: i64,
        actor_type: ActorType,
        page: u32,
        limit: u32,
    ) -> Result<Vec<WalletTransaction>, LedgerError>;
}

#[derive(Debug, Clone, Error)]
pub enum LedgerError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Transaction amounts must be positive. Got {0}")]
    InvalidAmount(MinorUnits),
    #[error("Insufficient balance to debit {requested}")]
    InsufficientBalance { requested: MinorUnits },
    #[error("Insufficient available balance. Requested {requested}, available {available}")]
    InsufficientAvailableBalance { requested: MinorUnits, available: MinorUnits },
    #[error("No transaction exists with reference {0}")]
    TransactionNotFound(String),
    #[error("Transaction {0} is not a withdrawal")]
    NotAWithdrawal(String),
}

impl From<sqlx::Error> for LedgerError {
    fn from(e: sqlx::Error) -> Self {
        LedgerError::DatabaseError(e.to_string())
    }
}
