use serde::{Deserialize, Serialize};
use settle_common::MinorUnits;

use crate::{
    db_types::{Payment, PaymentMethod, PaymentStatus, TransactionStatus},
    traits::BankDetails,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub user_id: i64,
    pub order_id: i64,
    pub method: PaymentMethod,
    /// Where the gateway sends the receipt. Looked up in the user directory when absent.
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentInitialized {
    pub payment_id: i64,
    pub status: PaymentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorization_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

impl From<&Payment> for PaymentInitialized {
    fn from(p: &Payment) -> Self {
        Self {
            payment_id: p.id,
            status: p.status,
            authorization_url: p.authorization_url.clone(),
            reference: p.reference.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SuccessfulPaymentOutcome {
    pub payment: Payment,
    /// True if this call moved the payment to `completed`. False on redelivery.
    pub payment_completed: bool,
    /// True if this call moved the order from `pending` to `processing`
    pub order_advanced: bool,
    /// The commission credited to the restaurant, if any was due
    pub restaurant_commission: Option<MinorUnits>,
}

/// Which branch `process_rider_payment` took.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum RiderPaymentOutcome {
    NotDelivered,
    AlreadyConfirmed,
    NoRiderAssigned,
    /// The order has no completed payment, so nothing is paid out and the delivery stays unconfirmed.
    Unpaid,
    /// The commission had already been credited. The order was only marked as confirmed.
    AlreadyPaid,
    /// The rate rounded the commission down to nothing. The order was marked as confirmed.
    NothingDue,
    Paid { rider_id: i64, amount: MinorUnits },
}

impl RiderPaymentOutcome {
    pub fn is_paid(&self) -> bool {
        matches!(self, Self::Paid { .. })
    }
}

#[derive(Debug, Clone, Default)]
pub struct SweepResult {
    pub processed: Vec<(i64, RiderPaymentOutcome)>,
    pub failed: Vec<(i64, String)>,
}

impl SweepResult {
    pub fn processed_count(&self) -> usize {
        self.processed.len()
    }

    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }

    pub fn paid_count(&self) -> usize {
        self.processed.iter().filter(|(_, o)| o.is_paid()).count()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WithdrawalRequest {
    pub amount: MinorUnits,
    #[serde(flatten)]
    pub bank: BankDetails,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalReceipt {
    pub reference: String,
    pub status: TransactionStatus,
    pub transfer_code: String,
    pub amount: MinorUnits,
}

/// What the webhook dispatcher did with an event. All three are reported back to the gateway as
/// `{success, message}`. Only `Rejected` is a non-200.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Accepted(String),
    Ignored(String),
    Rejected(String),
}

impl DispatchOutcome {
    pub fn message(&self) -> &str {
        match self {
            Self::Accepted(m) | Self::Ignored(m) | Self::Rejected(m) => m.as_str(),
        }
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }
}
