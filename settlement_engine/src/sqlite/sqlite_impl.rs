//! `SqliteDatabase` is a concrete implementation of a settlement engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`crate::traits`]
//! module.
use std::fmt::Debug;

use chrono::{DateTime, Utc};
use log::*;
use settle_common::MinorUnits;
use sqlx::{migrate, SqlitePool};

use super::db::{actors, db_url, new_pool, orders, payments, queue as messages, settings, wallets};
use crate::{
    db_types::{
        ActorType,
        NewOrder,
        NewPayment,
        NewTransaction,
        Order,
        OrderStatusType,
        Payment,
        PaymentStatus,
        QueueMessage,
        Rider,
        RiderAvailability,
        SettlementSettings,
        TransactionStatus,
        TransactionType,
        User,
        Wallet,
        WalletBalance,
        WalletTransaction,
    },
    helpers::generate_transaction_reference,
    queue::QueueName,
    traits::{
        ActorDirectory,
        FinalizedWithdrawal,
        LedgerError,
        MessageQueue,
        OrderManagement,
        PaymentManagement,
        QueueError,
        SettingsStore,
        SettlementDatabase,
        StoreError,
        WalletLedger,
        WithdrawalOutcome,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object using `TSS_DATABASE_URL`
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        migrate!("./src/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }

    pub async fn close(&mut self) -> Result<(), sqlx::Error> {
        self.pool.close().await;
        Ok(())
    }
}

impl SettlementDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }
}

impl WalletLedger for SqliteDatabase {
    async fn fetch_or_create_wallet(&self, actor_id: i64, actor_type: ActorType) -> Result<Wallet, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        wallets::upsert_wallet(actor_id, actor_type, &mut conn).await
    }

    /// In a single atomic transaction:
    /// * the wallet is created if it does not exist yet,
    /// * the ledger row is inserted, unless its reference is already taken (in which case we stop here),
    /// * the balance is credited, or conditionally debited.
    async fn add_transaction(&self, tx: NewTransaction) -> Result<Wallet, LedgerError> {
        if !tx.amount.is_positive() {
            return Err(LedgerError::InvalidAmount(tx.amount));
        }
        let reference = tx.reference.unwrap_or_else(generate_transaction_reference);
        let mut db_tx = self.pool.begin().await?;
        let wallet = wallets::upsert_wallet(tx.actor_id, tx.actor_type, &mut db_tx).await?;
        let inserted = wallets::insert_transaction(
            wallet.id,
            tx.amount,
            tx.tx_type,
            &tx.description,
            &reference,
            TransactionStatus::Completed,
            &mut db_tx,
        )
        .await?;
        if inserted.is_none() {
            db_tx.commit().await?;
            debug!("🗃️ Transaction {reference} has already been applied. Nothing to do.");
            return Ok(wallet);
        }
        let wallet = match tx.tx_type {
            TransactionType::Credit => wallets::credit_balance(wallet.id, tx.amount, &mut db_tx).await?,
            TransactionType::Debit => wallets::debit_balance(wallet.id, tx.amount, &mut db_tx)
                .await?
                .ok_or(LedgerError::InsufficientBalance { requested: tx.amount })?,
        };
        db_tx.commit().await?;
        debug!(
            "🗃️ {} of {} applied to {} wallet #{} ({reference}). Balance is now {}",
            tx.tx_type, tx.amount, tx.actor_type, tx.actor_id, wallet.balance
        );
        Ok(wallet)
    }

    async fn fetch_transaction_by_reference(
        &self,
        reference: &str,
    ) -> Result<Option<WalletTransaction>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        wallets::fetch_transaction_by_reference(reference, &mut conn).await
    }

    async fn wallet_balance(&self, actor_id: i64, actor_type: ActorType) -> Result<WalletBalance, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        wallets::wallet_balance(actor_id, actor_type, &mut conn).await
    }

    async fn record_pending_withdrawal(
        &self,
        actor_id: i64,
        actor_type: ActorType,
        amount: MinorUnits,
        reference: &str,
        description: &str,
    ) -> Result<WalletTransaction, LedgerError> {
        if !amount.is_positive() {
            return Err(LedgerError::InvalidAmount(amount));
        }
        let mut db_tx = self.pool.begin().await?;
        let wallet = wallets::upsert_wallet(actor_id, actor_type, &mut db_tx).await?;
        match wallets::insert_pending_debit(wallet.id, amount, description, reference, &mut db_tx).await? {
            Some(tx) => {
                db_tx.commit().await?;
                debug!("🗃️ Pending withdrawal {reference} of {amount} recorded for {actor_type} #{actor_id}");
                Ok(tx)
            },
            None => {
                let available = wallets::wallet_balance(actor_id, actor_type, &mut db_tx).await?.available;
                Err(LedgerError::InsufficientAvailableBalance { requested: amount, available })
            },
        }
    }

    async fn finalize_withdrawal(
        &self,
        reference: &str,
        outcome: WithdrawalOutcome,
    ) -> Result<FinalizedWithdrawal, LedgerError> {
        let status = match outcome {
            WithdrawalOutcome::Succeeded => TransactionStatus::Completed,
            WithdrawalOutcome::Failed => TransactionStatus::Failed,
        };
        let mut db_tx = self.pool.begin().await?;
        if let Some(tx) = wallets::settle_pending_debit(reference, status, &mut db_tx).await? {
            if outcome == WithdrawalOutcome::Succeeded {
                wallets::debit_balance(tx.wallet_id, tx.amount, &mut db_tx)
                    .await?
                    .ok_or(LedgerError::InsufficientBalance { requested: tx.amount })?;
            }
            db_tx.commit().await?;
            debug!("🗃️ Withdrawal {reference} is now {status}");
            return Ok(FinalizedWithdrawal::Finalized(tx));
        }
        let existing = wallets::fetch_transaction_by_reference(reference, &mut db_tx).await?;
        db_tx.rollback().await?;
        match existing {
            Some(tx) if tx.tx_type == TransactionType::Debit => {
                debug!("🗃️ Withdrawal {reference} is already {}. Nothing to do.", tx.status);
                Ok(FinalizedWithdrawal::AlreadyFinal(tx))
            },
            Some(_) => Err(LedgerError::NotAWithdrawal(reference.to_string())),
            None => Err(LedgerError::TransactionNotFound(reference.to_string())),
        }
    }

    async fn fetch_transactions(
        &self,
        actor_id: i64,
        actor_type: ActorType,
        page: u32,
        limit: u32,
    ) -> Result<Vec<WalletTransaction>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let Some(wallet) = wallets::fetch_wallet(actor_id, actor_type, &mut conn).await? else {
            return Ok(Vec::new());
        };
        let offset = u64::from(page.saturating_sub(1)) * u64::from(limit);
        wallets::fetch_transactions(wallet.id, limit, offset, &mut conn).await
    }
}

impl PaymentManagement for SqliteDatabase {
    async fn insert_payment(&self, payment: NewPayment) -> Result<Payment, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let payment = payments::insert_payment(payment, &mut conn).await?;
        debug!("🗃️ Payment #{} ({}) created for order #{}", payment.id, payment.method, payment.order_id);
        Ok(payment)
    }

    async fn fetch_payment(&self, id: i64) -> Result<Option<Payment>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        payments::fetch_payment(id, &mut conn).await
    }

    async fn fetch_payment_by_reference(&self, reference: &str) -> Result<Option<Payment>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        payments::fetch_payment_by_reference(reference, &mut conn).await
    }

    async fn fetch_live_payment_for_order(&self, order_id: i64) -> Result<Option<Payment>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        payments::fetch_live_payment_for_order(order_id, &mut conn).await
    }

    async fn set_authorization_url(&self, payment_id: i64, url: &str) -> Result<Payment, StoreError> {
        let mut conn = self.pool.acquire().await?;
        payments::set_authorization_url(payment_id, url, &mut conn).await
    }

    async fn transition_payment_status(
        &self,
        payment_id: i64,
        from: PaymentStatus,
        to: PaymentStatus,
    ) -> Result<Option<Payment>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let result = payments::transition_status(payment_id, from, to, &mut conn).await?;
        match &result {
            Some(_) => debug!("🗃️ Payment #{payment_id} moved from {from} to {to}"),
            None => trace!("🗃️ Payment #{payment_id} was not {from}. Left unchanged"),
        }
        Ok(result)
    }
}

impl OrderManagement for SqliteDatabase {
    async fn place_order(&self, user_id: i64, order: NewOrder) -> Result<Order, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::insert_order(user_id, order, &mut conn).await?;
        debug!("🗃️ Order {} (#{}) saved for user #{user_id}", order.order_number, order.id);
        Ok(order)
    }

    async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_order(order_id, &mut conn).await
    }

    async fn fetch_order_by_number(&self, order_number: &str) -> Result<Option<Order>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_order_by_number(order_number, &mut conn).await
    }

    async fn transition_order_status(
        &self,
        order_id: i64,
        from: OrderStatusType,
        to: OrderStatusType,
    ) -> Result<Option<Order>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        orders::transition_status(order_id, from, to, &mut conn).await
    }

    async fn assign_rider(&self, order_id: i64, rider_id: i64) -> Result<Order, StoreError> {
        let mut conn = self.pool.acquire().await?;
        orders::assign_rider(order_id, rider_id, &mut conn).await
    }

    async fn mark_delivery_confirmed(&self, order_id: i64) -> Result<bool, StoreError> {
        let mut conn = self.pool.acquire().await?;
        orders::mark_delivery_confirmed(order_id, &mut conn).await
    }

    async fn fetch_unsettled_deliveries(&self, cutoff: DateTime<Utc>) -> Result<Vec<Order>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_unsettled_deliveries(cutoff, &mut conn).await
    }
}

impl ActorDirectory for SqliteDatabase {
    async fn fetch_user(&self, user_id: i64) -> Result<Option<User>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        actors::fetch_user(user_id, &mut conn).await
    }

    async fn fetch_rider(&self, rider_id: i64) -> Result<Option<Rider>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        actors::fetch_rider(rider_id, &mut conn).await
    }

    async fn set_rider_availability(
        &self,
        rider_id: i64,
        availability: RiderAvailability,
    ) -> Result<Rider, StoreError> {
        let mut conn = self.pool.acquire().await?;
        actors::set_rider_availability(rider_id, availability, &mut conn).await
    }

    async fn upsert_user(&self, id: i64, name: &str, email: &str) -> Result<User, StoreError> {
        let mut conn = self.pool.acquire().await?;
        actors::upsert_user(id, name, email, &mut conn).await
    }

    async fn upsert_rider(&self, id: i64, name: &str, email: &str) -> Result<Rider, StoreError> {
        let mut conn = self.pool.acquire().await?;
        actors::upsert_rider(id, name, email, &mut conn).await
    }
}

impl SettingsStore for SqliteDatabase {
    async fn fetch_settings(&self) -> Result<SettlementSettings, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let settings = settings::fetch_settings(&mut conn).await?.unwrap_or_else(|| {
            trace!("🗃️ No settlement settings saved. Using defaults");
            SettlementSettings::default()
        });
        Ok(settings)
    }

    async fn save_settings(&self, settings: SettlementSettings) -> Result<SettlementSettings, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let settings = settings::save_settings(settings, &mut conn).await?;
        info!("🗃️ Settlement settings updated: {settings:?}");
        Ok(settings)
    }
}

impl MessageQueue for SqliteDatabase {
    async fn publish(&self, queue: QueueName, payload: String) -> Result<i64, QueueError> {
        let mut conn = self.pool.acquire().await?;
        let id = messages::publish(queue, &payload, &mut conn).await?;
        trace!("📬️ Message #{id} published on {queue}");
        Ok(id)
    }

    async fn reserve(&self, queue: QueueName, limit: u32) -> Result<Vec<QueueMessage>, QueueError> {
        let mut conn = self.pool.acquire().await?;
        messages::reserve(queue, limit, &mut conn).await
    }

    async fn ack(&self, message_id: i64) -> Result<(), QueueError> {
        let mut conn = self.pool.acquire().await?;
        messages::ack(message_id, &mut conn).await
    }

    async fn nack(&self, message_id: i64, requeue: bool, reason: &str) -> Result<(), QueueError> {
        let mut conn = self.pool.acquire().await?;
        messages::nack(message_id, requeue, reason, &mut conn).await
    }

    async fn recover_in_flight(&self, queue: QueueName) -> Result<u64, QueueError> {
        let mut conn = self.pool.acquire().await?;
        messages::recover_in_flight(queue, &mut conn).await
    }

    async fn fetch_message(&self, message_id: i64) -> Result<Option<QueueMessage>, QueueError> {
        let mut conn = self.pool.acquire().await?;
        messages::fetch_message(message_id, &mut conn).await
    }
}
