//! # Paystack tools
//!
//! A thin, typed client for the parts of the Paystack API the settlement service relies on:
//! * charges: [`PaystackApi::initialize_transaction`], [`PaystackApi::verify_transaction`]
//! * payouts: [`PaystackApi::create_transfer_recipient`], [`PaystackApi::initiate_transfer`]
//! * banks: [`PaystackApi::resolve_account`], [`PaystackApi::list_banks`] (cached for 24 hours)
//!
//! All amounts are integer minor units. Requests that fail with HTTP 429 or 5xx are retried a bounded number of
//! times with a linear backoff. Everything else fails immediately.
mod api;
mod config;
mod error;
mod helpers;

mod data_objects;

pub use api::PaystackApi;
pub use config::PaystackConfig;
pub use data_objects::{
    Bank,
    InitializedTransaction,
    NewTransaction,
    NewTransferRecipient,
    PaystackResponse,
    ResolvedAccount,
    TransactionVerification,
    TransferInitiated,
    TransferRecipient,
};
pub use error::PaystackApiError;
pub use helpers::{backoff_delay, is_retryable_status};
