use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{ActorType, NewTransaction, Wallet, WalletBalance, WalletTransaction},
    events::{EventProducers, WithdrawalSettledEvent},
    settle_api::errors::SettlementError,
    traits::{FinalizedWithdrawal, WalletLedger, WithdrawalOutcome},
};

pub const MAX_PAGE_SIZE: u32 = 100;

/// Read and write access to actor wallets. All the balance rules are enforced by the [`WalletLedger`] backend; this
/// API adds pagination limits, logging and events.
#[derive(Clone)]
pub struct WalletApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B: Debug> Debug for WalletApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "WalletApi ({:?})", self.db)
    }
}

impl<B> WalletApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> WalletApi<B>
where B: WalletLedger
{
    pub async fn get_or_create(&self, actor_id: i64, actor_type: ActorType) -> Result<Wallet, SettlementError> {
        let wallet = self.db.fetch_or_create_wallet(actor_id, actor_type).await?;
        Ok(wallet)
    }

    /// Applies the transaction at most once per reference. See [`WalletLedger::add_transaction`].
    pub async fn add_transaction(&self, tx: NewTransaction) -> Result<Wallet, SettlementError> {
        let wallet = self.db.add_transaction(tx).await?;
        Ok(wallet)
    }

    pub async fn find_transaction_by_reference(
        &self,
        reference: &str,
    ) -> Result<Option<WalletTransaction>, SettlementError> {
        let tx = self.db.fetch_transaction_by_reference(reference).await?;
        Ok(tx)
    }

    pub async fn balance(&self, actor_id: i64, actor_type: ActorType) -> Result<WalletBalance, SettlementError> {
        let balance = self.db.wallet_balance(actor_id, actor_type).await?;
        Ok(balance)
    }

    /// Newest first. `page` starts at 1 and `limit` is capped at [`MAX_PAGE_SIZE`].
    pub async fn transactions(
        &self,
        actor_id: i64,
        actor_type: ActorType,
        page: u32,
        limit: u32,
    ) -> Result<Vec<WalletTransaction>, SettlementError> {
        let page = page.max(1);
        let limit = limit.clamp(1, MAX_PAGE_SIZE);
        let txs = self.db.fetch_transactions(actor_id, actor_type, page, limit).await?;
        Ok(txs)
    }

    /// Records the gateway's verdict on a withdrawal. Redelivered verdicts are harmless no-ops.
    pub async fn finalize_withdrawal(
        &self,
        reference: &str,
        outcome: WithdrawalOutcome,
    ) -> Result<FinalizedWithdrawal, SettlementError> {
        let result = self.db.finalize_withdrawal(reference, outcome).await?;
        match &result {
            FinalizedWithdrawal::Finalized(tx) => {
                info!("💸️ Withdrawal {reference} of {} finalized as {}", tx.amount, tx.status);
                self.producers.withdrawal_settled(WithdrawalSettledEvent { transaction: tx.clone() }).await;
            },
            FinalizedWithdrawal::AlreadyFinal(tx) => {
                info!("💸️ Withdrawal {reference} was already {}. Ignoring {outcome:?}", tx.status);
            },
        }
        Ok(result)
    }
}
