//! Settlement Engine
//!
//! The settlement engine is the money-handling core of the food delivery service. It takes an order from payment
//! through to the commissions credited to restaurant and rider wallets, and from there out to their bank accounts.
//!
//! The library is divided into these sections:
//! 1. Backend contracts ([`mod@traits`]) and a SQLite implementation of all of them ([`SqliteDatabase`]). You should
//!    never need to query the database directly. The record types are public, and live in [`mod@db_types`].
//! 2. The public API ([`mod@settle_api`]): payment flows, webhook dispatch, wallets and withdrawals.
//! 3. Durable work queues ([`mod@queue`]) and the consumer that drains them.
//!
//! The engine also emits events when payments are confirmed, riders are paid and withdrawals settle. Hook into them
//! with [`events::EventHooks`] to send notifications.
pub mod db_types;
pub mod events;
pub mod helpers;
pub mod queue;
mod settle_api;
pub mod traits;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use settle_api::{
    errors::SettlementError,
    payment_flow_api::PaymentFlowApi,
    payment_objects,
    wallet_api::{WalletApi, MAX_PAGE_SIZE},
    webhook_api::WebhookApi,
    webhook_objects,
    withdrawal_api::WithdrawalApi,
};
