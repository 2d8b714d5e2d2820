//! # Settlement engine public API
//!
//! The `settle_api` module exposes the programmatic API for the settlement engine. Each API covers one part of the
//! pipeline, so a service can wire up only the parts it needs:
//!
//! * [`payment_flow_api`] takes an order from payment initialization through the charge webhook to the restaurant and
//!   rider commission payouts. It also runs the settlement sweep.
//! * [`webhook_api`] classifies verified gateway webhooks and routes them.
//! * [`wallet_api`] reads balances and histories, and finalizes withdrawals.
//! * [`withdrawal_api`] moves wallet funds out to a bank account.
//!
//! # API usage
//!
//! Every API is created by handing it a backend that implements the traits it needs (and a gateway, where one is
//! used):
//!
//! ```rust,ignore
//! use settlement_engine::{events::EventProducers, SqliteDatabase, WalletApi};
//! let db = SqliteDatabase::new_with_url("sqlite://data/settlement.db", 5).await?;
//! let api = WalletApi::new(db, EventProducers::default());
//! let balance = api.balance(42, ActorType::Rider).await?;
//! ```

pub mod errors;
pub mod payment_flow_api;
pub mod payment_objects;
pub mod wallet_api;
pub mod webhook_api;
pub mod webhook_objects;
pub mod withdrawal_api;
