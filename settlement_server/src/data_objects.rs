use std::fmt::Display;

use serde::{Deserialize, Serialize};
use settlement_engine::db_types::{OrderStatusType, PaymentMethod, WalletTransaction};

/// The envelope for every webhook response and every error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitializePaymentParams {
    pub order_id: i64,
    pub payment_method: PaymentMethod,
    /// Overrides the e-mail address on file for the gateway receipt
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderAccepted {
    pub success: bool,
    pub message: String,
    /// The id of the `order.create` queue message carrying the order
    pub message_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateOrderStatusParams {
    pub status: OrderStatusType,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Pagination {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl Pagination {
    pub const DEFAULT_LIMIT: u32 = 20;

    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn limit(&self) -> u32 {
        self.limit.unwrap_or(Self::DEFAULT_LIMIT)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionPage {
    pub page: u32,
    pub limit: u32,
    pub transactions: Vec<WalletTransaction>,
}
