use serde::{Deserialize, Serialize};
use serde_json::Value;
use settle_common::MinorUnits;

use crate::db_types::WalletTransaction;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WithdrawalOutcome {
    Succeeded,
    Failed,
}

#[derive(Debug, Clone)]
pub enum FinalizedWithdrawal {
    /// The pending debit moved into its terminal state just now
    Finalized(WalletTransaction),
    /// The debit was already terminal. Nothing changed.
    AlreadyFinal(WalletTransaction),
}

impl FinalizedWithdrawal {
    pub fn transaction(&self) -> &WalletTransaction {
        match self {
            Self::Finalized(tx) | Self::AlreadyFinal(tx) => tx,
        }
    }

    pub fn changed(&self) -> bool {
        matches!(self, Self::Finalized(_))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChargeRequest {
    pub amount: MinorUnits,
    pub email: String,
    pub reference: String,
    pub metadata: Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChargeInitialized {
    pub authorization_url: String,
    pub reference: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankDetails {
    pub bank_code: String,
    pub account_number: String,
    pub account_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankInfo {
    pub code: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferReceipt {
    pub status: String,
    pub transfer_code: String,
}
