//! # Settlement server
//! This crate hosts the HTTP surface and the background workers of the settlement service. It is responsible for:
//! * Receiving Paystack webhooks, checking their signatures, and handing them to the settlement engine.
//! * Starting payments for orders, and queueing new orders and order status changes.
//! * Serving wallet balances and transaction history to restaurants and riders, and paying out withdrawals.
//! * Running the queue consumers and the periodic rider settlement sweep.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/payments/webhook`: Paystack webhooks. Signed with HMAC-SHA512. No bearer token.
//! * `/payments/initialize`, `/orders`, `/orders/{id}/status`: Orders and payments. Bearer token required.
//! * `/wallet/{actor}/balance|transactions|withdraw`: Wallets. Bearer token required.

pub mod auth;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod helpers;
pub mod integrations;
pub mod middleware;
pub mod queue_workers;
pub mod routes;
pub mod server;
pub mod settlement_worker;

#[cfg(test)]
mod endpoint_tests;
