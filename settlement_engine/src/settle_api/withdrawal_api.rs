use std::fmt::Debug;

use log::*;

use crate::{
    db_types::ActorType,
    events::{EventProducers, WithdrawalUnrecordedEvent},
    helpers::{account_names_match, generate_withdrawal_reference},
    settle_api::{
        errors::SettlementError,
        payment_objects::{WithdrawalReceipt, WithdrawalRequest},
    },
    traits::{GatewayError, PaymentGateway, WalletLedger},
};

/// Pays out wallet funds to a bank account through the gateway.
///
/// The ledger is only written once the gateway has accepted the transfer. Until the transfer webhook arrives, the
/// withdrawal is a `pending` debit: it reduces the available balance but not the balance.
#[derive(Clone)]
pub struct WithdrawalApi<B, G> {
    db: B,
    gateway: G,
    producers: EventProducers,
}

impl<B: Debug, G> Debug for WithdrawalApi<B, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "WithdrawalApi ({:?})", self.db)
    }
}

impl<B, G> WithdrawalApi<B, G> {
    pub fn new(db: B, gateway: G, producers: EventProducers) -> Self {
        Self { db, gateway, producers }
    }
}

impl<B, G> WithdrawalApi<B, G>
where
    B: WalletLedger,
    G: PaymentGateway,
{
    /// 1. The amount must be positive and covered by the available balance.
    /// 2. The bank must be one the gateway supports, and the account name must match the one the bank has on record.
    /// 3. A transfer recipient is created and the transfer initiated, with a fresh reference.
    /// 4. Only then is the pending debit recorded, re-checking the available balance in the same statement.
    ///
    /// A failure at any gateway step leaves the ledger untouched. If the transfer is accepted but the debit cannot be
    /// recorded (the balance was spent in the meantime, say), a [`WithdrawalUnrecordedEvent`] is published for
    /// reconciliation and the error is returned.
    pub async fn process_withdrawal(
        &self,
        actor_id: i64,
        actor_type: ActorType,
        request: WithdrawalRequest,
    ) -> Result<WithdrawalReceipt, SettlementError> {
        let amount = request.amount;
        let bank = request.bank;
        if !amount.is_positive() {
            return Err(SettlementError::InvalidAmount(format!("withdrawal amounts must be positive, not {amount}")));
        }
        let balance = self.db.wallet_balance(actor_id, actor_type).await?;
        if balance.available < amount {
            debug!("💸️ {actor_type} #{actor_id} asked to withdraw {amount} but only has {} available", balance.available);
            return Err(SettlementError::InsufficientAvailableBalance { requested: amount, available: balance.available });
        }
        let banks = self.gateway.list_banks().await.map_err(|e| gateway_failure("list banks", e))?;
        if !banks.iter().any(|b| b.code == bank.bank_code) {
            return Err(SettlementError::InvalidBankCode(bank.bank_code));
        }
        let resolved_name = self
            .gateway
            .resolve_account(&bank.bank_code, &bank.account_number)
            .await
            .map_err(|e| gateway_failure("resolve account", e))?;
        if !account_names_match(&bank.account_name, &resolved_name) {
            debug!("💸️ Account name supplied by {actor_type} #{actor_id} does not match the bank's records");
            return Err(SettlementError::AccountNameMismatch);
        }
        let recipient = self
            .gateway
            .create_transfer_recipient(&bank)
            .await
            .map_err(|e| gateway_failure("create transfer recipient", e))?;
        let reference = generate_withdrawal_reference(actor_id, actor_type);
        let receipt = self
            .gateway
            .initiate_transfer(&recipient, amount, &reference)
            .await
            .map_err(|e| gateway_failure("initiate transfer", e))?;
        info!("💸️ Transfer {reference} of {amount} to {actor_type} #{actor_id} accepted ({})", receipt.status);
        let description = format!("Withdrawal to {} at bank {}", mask_account(&bank.account_number), bank.bank_code);
        let recorded = self.db.record_pending_withdrawal(actor_id, actor_type, amount, &reference, &description).await;
        let tx = match recorded {
            Ok(tx) => tx,
            Err(e) => {
                error!(
                    "💸️ Transfer {reference} ({}) was accepted by the gateway but could not be recorded in the \
                     ledger: {e}. This needs manual reconciliation.",
                    receipt.transfer_code
                );
                let event = WithdrawalUnrecordedEvent {
                    actor_id,
                    actor_type,
                    amount,
                    reference,
                    transfer_code: receipt.transfer_code,
                    reason: e.to_string(),
                };
                self.producers.withdrawal_unrecorded(event).await;
                return Err(e.into());
            },
        };
        Ok(WithdrawalReceipt { reference, status: tx.status, transfer_code: receipt.transfer_code, amount })
    }
}

fn gateway_failure(step: &str, e: GatewayError) -> SettlementError {
    warn!("💸️ Payment gateway failed to {step}: {e}");
    SettlementError::from(e)
}

/// Keeps only the last four digits
fn mask_account(account_number: &str) -> String {
    let digits = account_number.chars().count();
    let tail = account_number.chars().skip(digits.saturating_sub(4)).collect::<String>();
    format!("****{tail}")
}

#[cfg(test)]
mod test {
    use super::mask_account;

    #[test]
    fn account_numbers_are_masked() {
        assert_eq!(mask_account("0123456789"), "****6789");
        assert_eq!(mask_account("12"), "****12");
    }
}
