mod helpers;
mod mocks;

mod orders;
mod wallets;
mod webhooks;
