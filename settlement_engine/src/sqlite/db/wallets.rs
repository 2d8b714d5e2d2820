use settle_common::MinorUnits;
use sqlx::SqliteConnection;

use crate::{
    db_types::{ActorType, TransactionStatus, TransactionType, Wallet, WalletBalance, WalletTransaction},
    traits::LedgerError,
};

/// Returns the wallet for the actor, creating it if necessary, in a single statement. The no-op `DO UPDATE` makes
/// `RETURNING` yield the existing row on conflict.
pub async fn upsert_wallet(
    actor_id: i64,
    actor_type: ActorType,
    conn: &mut SqliteConnection,
) -> Result<Wallet, LedgerError> {
    let wallet = sqlx::query_as(
        r#"
            INSERT INTO wallets (actor_id, actor_type) VALUES ($1, $2)
            ON CONFLICT (actor_id, actor_type) DO UPDATE SET actor_id = excluded.actor_id
            RETURNING *;
        "#,
    )
    .bind(actor_id)
    .bind(actor_type)
    .fetch_one(conn)
    .await?;
    Ok(wallet)
}

pub async fn fetch_wallet(
    actor_id: i64,
    actor_type: ActorType,
    conn: &mut SqliteConnection,
) -> Result<Option<Wallet>, LedgerError> {
    let wallet = sqlx::query_as("SELECT * FROM wallets WHERE actor_id = $1 AND actor_type = $2")
        .bind(actor_id)
        .bind(actor_type)
        .fetch_optional(conn)
        .await?;
    Ok(wallet)
}

/// Inserts a ledger row. Returns `None` if a row with the same reference already exists, in which case nothing was
/// written.
pub async fn insert_transaction(
    wallet_id: i64,
    amount: MinorUnits,
    tx_type: TransactionType,
    description: &str,
    reference: &str,
    status: TransactionStatus,
    conn: &mut SqliteConnection,
) -> Result<Option<WalletTransaction>, LedgerError> {
    let tx = sqlx::query_as(
        r#"
            INSERT INTO wallet_transactions (wallet_id, amount, type, description, reference, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (reference) DO NOTHING
            RETURNING *;
        "#,
    )
    .bind(wallet_id)
    .bind(amount)
    .bind(tx_type)
    .bind(description)
    .bind(reference)
    .bind(status)
    .fetch_optional(conn)
    .await?;
    Ok(tx)
}

pub async fn credit_balance(
    wallet_id: i64,
    amount: MinorUnits,
    conn: &mut SqliteConnection,
) -> Result<Wallet, LedgerError> {
    let wallet = sqlx::query_as(
        "UPDATE wallets SET balance = balance + $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 RETURNING *",
    )
    .bind(amount)
    .bind(wallet_id)
    .fetch_one(conn)
    .await?;
    Ok(wallet)
}

/// The balance check and the decrement are one conditional write. Returns `None` if the balance does not cover
/// `amount`.
pub async fn debit_balance(
    wallet_id: i64,
    amount: MinorUnits,
    conn: &mut SqliteConnection,
) -> Result<Option<Wallet>, LedgerError> {
    let wallet = sqlx::query_as(
        r#"
            UPDATE wallets SET balance = balance - $1, updated_at = CURRENT_TIMESTAMP
            WHERE id = $2 AND balance >= $1
            RETURNING *;
        "#,
    )
    .bind(amount)
    .bind(wallet_id)
    .fetch_optional(conn)
    .await?;
    Ok(wallet)
}

/// Appends a pending withdrawal debit only if `balance - pending debits >= amount`. Returns `None` if the available
/// balance is too low.
pub async fn insert_pending_debit(
    wallet_id: i64,
    amount: MinorUnits,
    description: &str,
    reference: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<WalletTransaction>, LedgerError> {
    let tx = sqlx::query_as(
        r#"
            INSERT INTO wallet_transactions (wallet_id, amount, type, description, reference, status)
            SELECT w.id, $2, 'debit', $3, $4, 'pending' FROM wallets w
            WHERE w.id = $1 AND w.balance - (
                SELECT COALESCE(SUM(t.amount), 0) FROM wallet_transactions t
                WHERE t.wallet_id = w.id AND t.type = 'debit' AND t.status = 'pending'
            ) >= $2
            RETURNING *;
        "#,
    )
    .bind(wallet_id)
    .bind(amount)
    .bind(description)
    .bind(reference)
    .fetch_optional(conn)
    .await?;
    Ok(tx)
}

/// Moves a pending debit to `status`. Returns `None` if there is no pending debit with this reference.
pub async fn settle_pending_debit(
    reference: &str,
    status: TransactionStatus,
    conn: &mut SqliteConnection,
) -> Result<Option<WalletTransaction>, LedgerError> {
    let tx = sqlx::query_as(
        r#"
            UPDATE wallet_transactions SET status = $1, updated_at = CURRENT_TIMESTAMP
            WHERE reference = $2 AND type = 'debit' AND status = 'pending'
            RETURNING *;
        "#,
    )
    .bind(status)
    .bind(reference)
    .fetch_optional(conn)
    .await?;
    Ok(tx)
}

pub async fn fetch_transaction_by_reference(
    reference: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<WalletTransaction>, LedgerError> {
    let tx = sqlx::query_as("SELECT * FROM wallet_transactions WHERE reference = $1")
        .bind(reference)
        .fetch_optional(conn)
        .await?;
    Ok(tx)
}

/// Balance and pending debits, read in one statement so that they are consistent with each other.
pub async fn wallet_balance(
    actor_id: i64,
    actor_type: ActorType,
    conn: &mut SqliteConnection,
) -> Result<WalletBalance, LedgerError> {
    let row: Option<(i64, i64)> = sqlx::query_as(
        r#"
            SELECT w.balance, (
                SELECT COALESCE(SUM(t.amount), 0) FROM wallet_transactions t
                WHERE t.wallet_id = w.id AND t.type = 'debit' AND t.status = 'pending'
            ) AS pending
            FROM wallets w WHERE w.actor_id = $1 AND w.actor_type = $2;
        "#,
    )
    .bind(actor_id)
    .bind(actor_type)
    .fetch_optional(conn)
    .await?;
    let (balance, pending) = row.unwrap_or_default();
    Ok(WalletBalance::new(MinorUnits::from(balance), MinorUnits::from(pending)))
}

pub async fn fetch_transactions(
    wallet_id: i64,
    limit: u32,
    offset: u64,
    conn: &mut SqliteConnection,
) -> Result<Vec<WalletTransaction>, LedgerError> {
    let offset = i64::try_from(offset).unwrap_or(i64::MAX);
    let txs = sqlx::query_as(
        "SELECT * FROM wallet_transactions WHERE wallet_id = $1 ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3",
    )
    .bind(wallet_id)
    .bind(i64::from(limit))
    .bind(offset)
    .fetch_all(conn)
    .await?;
    Ok(txs)
}
