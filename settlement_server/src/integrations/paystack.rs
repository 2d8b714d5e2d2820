//! Connects the settlement engine to Paystack.
//!
//! [`PaystackGateway`] implements the engine's [`PaymentGateway`] contract on top of the `paystack_tools` client and
//! translates its errors into the three outcomes the engine cares about: try again later, refused, or garbled.
use log::*;
use paystack_tools::{NewTransaction, PaystackApi, PaystackApiError, PaystackConfig};
use settle_common::MinorUnits;
use settlement_engine::traits::{
    BankDetails,
    BankInfo,
    ChargeInitialized,
    ChargeRequest,
    GatewayError,
    PaymentGateway,
    TransferReceipt,
};

use crate::errors::ServerError;

const TRANSFER_REASON: &str = "Wallet withdrawal";

#[derive(Clone)]
pub struct PaystackGateway {
    api: PaystackApi,
}

impl PaystackGateway {
    pub fn new(api: PaystackApi) -> Self {
        Self { api }
    }

    pub fn from_config(config: PaystackConfig) -> Result<Self, ServerError> {
        let api = PaystackApi::new(config).map_err(|e| ServerError::InitializeError(e.to_string()))?;
        Ok(Self::new(api))
    }
}

impl PaymentGateway for PaystackGateway {
    async fn initialize_charge(&self, request: ChargeRequest) -> Result<ChargeInitialized, GatewayError> {
        let tx = NewTransaction {
            email: request.email,
            amount: request.amount,
            reference: request.reference,
            callback_url: None,
            metadata: Some(request.metadata),
        };
        let result = self.api.initialize_transaction(tx).await.map_err(|e| to_gateway_error("initialize charge", e))?;
        Ok(ChargeInitialized { authorization_url: result.authorization_url, reference: result.reference })
    }

    async fn verify_charge(
        &self,
        reference: &str,
        expected_amount: Option<MinorUnits>,
    ) -> Result<bool, GatewayError> {
        let verification =
            self.api.verify_transaction(reference).await.map_err(|e| to_gateway_error("verify charge", e))?;
        if !verification.is_successful() {
            info!("🪝️ Paystack reports charge {reference} as {}", verification.status);
            return Ok(false);
        }
        match expected_amount {
            Some(expected) if expected != verification.amount => {
                warn!(
                    "🪝️ Charge {reference} succeeded for {}, but {expected} was expected. Treating it as unverified.",
                    verification.amount
                );
                Ok(false)
            },
            _ => Ok(true),
        }
    }

    async fn create_transfer_recipient(&self, bank: &BankDetails) -> Result<String, GatewayError> {
        let recipient = self
            .api
            .create_transfer_recipient(&bank.account_name, &bank.account_number, &bank.bank_code)
            .await
            .map_err(|e| to_gateway_error("create transfer recipient", e))?;
        Ok(recipient.recipient_code)
    }

    async fn initiate_transfer(
        &self,
        recipient_code: &str,
        amount: MinorUnits,
        reference: &str,
    ) -> Result<TransferReceipt, GatewayError> {
        let transfer = self
            .api
            .initiate_transfer(amount, recipient_code, reference, TRANSFER_REASON)
            .await
            .map_err(|e| to_gateway_error("initiate transfer", e))?;
        Ok(TransferReceipt { status: transfer.status, transfer_code: transfer.transfer_code })
    }

    async fn resolve_account(&self, bank_code: &str, account_number: &str) -> Result<String, GatewayError> {
        let account = self
            .api
            .resolve_account(account_number, bank_code)
            .await
            .map_err(|e| to_gateway_error("resolve account", e))?;
        Ok(account.account_name)
    }

    async fn list_banks(&self) -> Result<Vec<BankInfo>, GatewayError> {
        let banks = self.api.list_banks().await.map_err(|e| to_gateway_error("list banks", e))?;
        Ok(banks.into_iter().map(|b| BankInfo { code: b.code, name: b.name }).collect())
    }
}

/// The full error goes to the log. Only its category travels on.
fn to_gateway_error(action: &str, e: PaystackApiError) -> GatewayError {
    if e.is_transient() {
        error!("💸️ Paystack is unavailable. Could not {action}. {e}");
        return GatewayError::Unavailable(format!("Could not {action}"));
    }
    match e {
        PaystackApiError::Declined(msg) => {
            warn!("💸️ Paystack declined to {action}. {msg}");
            GatewayError::Rejected(msg)
        },
        PaystackApiError::QueryError { status, message } => {
            warn!("💸️ Paystack refused to {action} with status {status}. {message}");
            GatewayError::Rejected(message)
        },
        PaystackApiError::Initialization(msg) => {
            error!("💸️ The Paystack client is misconfigured. Could not {action}. {msg}");
            GatewayError::Unavailable(format!("Could not {action}"))
        },
        e => {
            error!("💸️ Could not make sense of Paystack's response when trying to {action}. {e}");
            GatewayError::InvalidResponse(format!("Could not {action}"))
        },
    }
}
