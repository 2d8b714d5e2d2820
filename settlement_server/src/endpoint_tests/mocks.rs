use std::sync::Arc;

use mockall::mock;
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

mock! {
    pub Gateway {}
    impl PaymentGateway for Gateway {
        async fn initialize_charge(&self, request: ChargeRequest) -> Result<ChargeInitialized, GatewayError>;
        async fn verify_charge(&self, reference: &str, expected_amount: Option<MinorUnits>) -> Result<bool, GatewayError>;
        async fn create_transfer_recipient(&self, bank: &BankDetails) -> Result<String, GatewayError>;
        async fn initiate_transfer(&self, recipient_code: &str, amount: MinorUnits, reference: &str) -> Result<TransferReceipt, GatewayError>;
        async fn resolve_account(&self, bank_code: &str, account_number: &str) -> Result<String, GatewayError>;
        async fn list_banks(&self) -> Result<Vec<BankInfo>, GatewayError>;
    }
}

/// The server clones its gateway into every API. Mocks can't be cloned, so the tests share one behind an `Arc`.
#[derive(Clone)]
pub struct SharedGateway(Arc<MockGateway>);

impl SharedGateway {
    pub fn new(gateway: MockGateway) -> Self {
        Self(Arc::new(gateway))
    }
}

impl PaymentGateway for SharedGateway {
    async fn initialize_charge(&self, request: ChargeRequest) -> Result<ChargeInitialized, GatewayError> {
        self.0.initialize_charge(request).await
    }

    async fn verify_charge(&self, reference: &str, expected_amount: Option<MinorUnits>) -> Result<bool, GatewayError> {
        self.0.verify_charge(reference, expected_amount).await
    }

    async fn create_transfer_recipient(&self, bank: &BankDetails) -> Result<String, GatewayError> {
        self.0.create_transfer_recipient(bank).await
    }

    async fn initiate_transfer(
        &self,
        recipient_code: &str,
        amount: MinorUnits,
        reference: &str,
    ) -> Result<TransferReceipt, GatewayError> {
        self.0.initiate_transfer(recipient_code, amount, reference).await
    }

    async fn resolve_account(&self, bank_code: &str, account_number: &str) -> Result<String, GatewayError> {
        self.0.resolve_account(bank_code, account_number).await
    }

    async fn list_banks(&self) -> Result<Vec<BankInfo>, GatewayError> {
        self.0.list_banks().await
    }
}
