//! Data types that are stored in, and read from, the settlement database.
//!
//! Money is always [`MinorUnits`]. Enumerations are stored as lower-case text.
use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
pub use settle_common::MinorUnits;
use sqlx::{FromRow, Type};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Invalid value for {kind}: {value}")]
pub struct ConversionError {
    kind: &'static str,
    value: String,
}

impl ConversionError {
    pub fn new(kind: &'static str, value: &str) -> Self {
        Self { kind, value: value.to_string() }
    }
}

/// Implements `Display` and `FromStr` for a text-backed enum, using the same lower-case names as the database.
macro_rules! text_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ConversionError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    _ => Err(ConversionError::new(stringify!($name), s)),
                }
            }
        }
    };
}

//--------------------------------------      ActorType      ---------------------------------------------------------
/// The two kinds of actor that own a wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ActorType {
    Restaurant,
    Rider,
}

text_enum!(ActorType { Restaurant => "restaurant", Rider => "rider" });

//--------------------------------------   TransactionType   ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Credit,
    Debit,
}

text_enum!(TransactionType { Credit => "credit", Debit => "debit" });

//--------------------------------------  TransactionStatus  ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    /// Withdrawal debits wait here until the gateway reports the outcome of the transfer
    Pending,
    Completed,
    Failed,
}

text_enum!(TransactionStatus { Pending => "pending", Completed => "completed", Failed => "failed" });

impl TransactionStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TransactionStatus::Pending)
    }
}

//--------------------------------------        Wallet       ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Wallet {
    pub id: i64,
    pub actor_id: i64,
    pub actor_type: ActorType,
    pub balance: MinorUnits,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct WalletTransaction {
    pub id: i64,
    pub wallet_id: i64,
    pub amount: MinorUnits,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub tx_type: TransactionType,
    pub description: String,
    pub reference: String,
    pub status: TransactionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A request to append a transaction to an actor's wallet. If `reference` is `None`, a unique one is generated.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub actor_id: i64,
    pub actor_type: ActorType,
    pub amount: MinorUnits,
    pub tx_type: TransactionType,
    pub description: String,
    pub reference: Option<String>,
}

impl NewTransaction {
    pub fn credit(actor_id: i64, actor_type: ActorType, amount: MinorUnits, description: &str) -> Self {
        Self {
            actor_id,
            actor_type,
            amount,
            tx_type: TransactionType::Credit,
            description: description.to_string(),
            reference: None,
        }
    }

    pub fn debit(actor_id: i64, actor_type: ActorType, amount: MinorUnits, description: &str) -> Self {
        Self { tx_type: TransactionType::Debit, ..Self::credit(actor_id, actor_type, amount, description) }
    }

    pub fn with_reference<S: Into<String>>(mut self, reference: S) -> Self {
        self.reference = Some(reference.into());
        self
    }
}

/// The balance breakdown for a wallet. `available` is what a new withdrawal may draw on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletBalance {
    pub balance: MinorUnits,
    pub pending: MinorUnits,
    pub available: MinorUnits,
}

impl WalletBalance {
    pub fn new(balance: MinorUnits, pending: MinorUnits) -> Self {
        Self { balance, pending, available: balance - pending }
    }
}

//--------------------------------------      Payments       ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Collected through the hosted checkout of the external gateway
    Gateway,
    Cash,
}

text_enum!(PaymentMethod { Gateway => "gateway", Cash => "cash" });

#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Processing,
    Completed,
    Failed,
}

text_enum!(PaymentStatus { Processing => "processing", Completed => "completed", Failed => "failed" });

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Payment {
    pub id: i64,
    pub order_id: i64,
    pub user_id: i64,
    pub amount: MinorUnits,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    pub reference: Option<String>,
    pub authorization_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPayment {
    pub order_id: i64,
    pub user_id: i64,
    pub amount: MinorUnits,
    pub method: PaymentMethod,
    pub reference: Option<String>,
}

//--------------------------------------        Orders       ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatusType {
    Pending,
    Processing,
    ReadyForPickup,
    Shipped,
    Delivered,
    Cancelled,
}

text_enum!(OrderStatusType {
    Pending => "pending",
    Processing => "processing",
    ReadyForPickup => "ready_for_pickup",
    Shipped => "shipped",
    Delivered => "delivered",
    Cancelled => "cancelled",
});

impl OrderStatusType {
    /// Whether a restaurant, rider or admin may move an order from this status to `next`. Orders only leave `pending`
    /// when their payment completes, and delivered orders can no longer be cancelled.
    pub fn can_update_to(self, next: OrderStatusType) -> bool {
        use OrderStatusType::*;
        matches!(
            (self, next),
            (Processing, ReadyForPickup)
                | (ReadyForPickup, Shipped)
                | (Shipped, Delivered)
                | (Pending | Processing | ReadyForPickup | Shipped, Cancelled)
        )
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
pub struct Order {
    pub id: i64,
    pub order_number: String,
    pub user_id: i64,
    pub restaurant_id: i64,
    pub rider_id: Option<i64>,
    pub total_price: MinorUnits,
    pub payment_method: PaymentMethod,
    pub status: OrderStatusType,
    pub delivery_confirmed: bool,
    pub estimated_delivery_time: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrder {
    /// Generated when absent
    #[serde(default)]
    pub order_number: Option<String>,
    pub restaurant_id: i64,
    #[serde(default)]
    pub rider_id: Option<i64>,
    pub total_price: MinorUnits,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub estimated_delivery_time: Option<DateTime<Utc>>,
}

//--------------------------------------    Users & riders   ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RiderAvailability {
    Available,
    Busy,
    Offline,
}

text_enum!(RiderAvailability { Available => "available", Busy => "busy", Offline => "offline" });

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Rider {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub availability: RiderAvailability,
    pub created_at: DateTime<Utc>,
}

//--------------------------------------       Settings      ---------------------------------------------------------
/// Global commission configuration. Rates are fractions of the order total.
#[derive(Debug, Clone, Copy, PartialEq, FromRow, Serialize, Deserialize)]
pub struct SettlementSettings {
    pub restaurant_commission_rate: f64,
    pub rider_commission_rate: f64,
    pub dispute_window_hours: i64,
}

impl Default for SettlementSettings {
    fn default() -> Self {
        Self { restaurant_commission_rate: 0.10, rider_commission_rate: 0.05, dispute_window_hours: 2 }
    }
}

impl SettlementSettings {
    pub fn dispute_window(&self) -> chrono::Duration {
        chrono::Duration::hours(self.dispute_window_hours.max(0))
    }
}

//--------------------------------------    Queue messages   ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MessageStatus {
    Ready,
    InFlight,
    Acked,
    /// Rejected without requeue. Kept for inspection.
    Dead,
}

text_enum!(MessageStatus { Ready => "ready", InFlight => "in_flight", Acked => "acked", Dead => "dead" });

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct QueueMessage {
    pub id: i64,
    pub queue: String,
    pub payload: String,
    pub status: MessageStatus,
    pub deliveries: i64,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
