use settle_common::MinorUnits;
use thiserror::Error;

use crate::traits::data_objects::{BankDetails, BankInfo, ChargeInitialized, ChargeRequest, TransferReceipt};

/// The operations settlement needs from the external payment processor. Amounts are always minor units.
#[allow(async_fn_in_trait)]
pub trait PaymentGateway {
    /// Starts a hosted checkout for the charge. The request carries our own reference, so a retried call cannot
    /// create a second, unrelated charge.
    async fn initialize_charge(&self, request: ChargeRequest) -> Result<ChargeInitialized, GatewayError>;

    /// True only if the gateway reports the charge as successful and, when `expected_amount` is given, the charged
    /// amount matches it.
    async fn verify_charge(&self, reference: &str, expected_amount: Option<MinorUnits>)
        -> Result<bool, GatewayError>;

    /// Returns the recipient code for the bank account.
    async fn create_transfer_recipient(&self, bank: &BankDetails) -> Result<String, GatewayError>;

    async fn initiate_transfer(
        &self,
        recipient_code: &str,
        amount: MinorUnits,
        reference: &str,
    ) -> Result<TransferReceipt, GatewayError>;

    /// Returns the account holder's name as the bank knows it.
    async fn resolve_account(&self, bank_code: &str, account_number: &str) -> Result<String, GatewayError>;

    async fn list_banks(&self) -> Result<Vec<BankInfo>, GatewayError>;
}

#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    /// The gateway could not be reached, or kept failing with 429/5xx after the retry budget was spent.
    #[error("Payment gateway unavailable: {0}")]
    Unavailable(String),
    /// The gateway understood the request and refused it.
    #[error("Payment gateway rejected the request: {0}")]
    Rejected(String),
    #[error("Unexpected response from the payment gateway: {0}")]
    InvalidResponse(String),
}
