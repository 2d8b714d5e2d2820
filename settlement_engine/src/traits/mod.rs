//! # Backend contracts
//!
//! The settlement flows only talk to storage and to the payment processor through these traits.
//!
//! * [`WalletLedger`] is the durable per-actor ledger. All idempotency and balance rules live here.
//! * [`PaymentManagement`], [`OrderManagement`], [`ActorDirectory`] and [`SettingsStore`] cover the records owned
//!   by neighbouring services that settlement reads, and occasionally conditionally writes.
//! * [`MessageQueue`] is the durable at-least-once queue between the webhook and the workers.
//! * [`PaymentGateway`] is the external processor.
//! * [`SettlementDatabase`] bundles the storage traits for backends that implement all of them.
mod actor_directory;
mod data_objects;
mod message_queue;
mod order_management;
mod payment_gateway;
mod payment_management;
mod settings_store;
mod settlement_database;
mod store_error;
mod wallet_ledger;

pub use actor_directory::ActorDirectory;
pub use data_objects::{
    BankDetails,
    BankInfo,
    ChargeInitialized,
    ChargeRequest,
    FinalizedWithdrawal,
    TransferReceipt,
    WithdrawalOutcome,
};
pub use message_queue::{MessageQueue, QueueError};
pub use order_management::OrderManagement;
pub use payment_gateway::{GatewayError, PaymentGateway};
pub use payment_management::PaymentManagement;
pub use settings_store::SettingsStore;
pub use settlement_database::SettlementDatabase;
pub use store_error::StoreError;
pub use wallet_ledger::{LedgerError, WalletLedger};
