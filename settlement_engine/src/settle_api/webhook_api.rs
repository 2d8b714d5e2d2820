use std::fmt::Debug;

use log::*;

use crate::{
    events::EventProducers,
    queue::{publish_json, QueueName},
    settle_api::{
        errors::SettlementError,
        payment_flow_api::PaymentFlowApi,
        payment_objects::DispatchOutcome,
        wallet_api::WalletApi,
        webhook_objects::{ChargeData, ChargeEventKind, GatewayEvent, TransferData, TransferEventKind, WebhookPayload},
    },
    traits::{PaymentGateway, SettlementDatabase, WithdrawalOutcome},
};

/// Routes verified gateway webhooks.
///
/// The signature has already been checked by the time an event gets here. Successful charges are re-verified with the
/// gateway and handed to the `payment.success` queue; everything else is handled inline.
///
/// `Err` is reserved for failures on our side (database, gateway unreachable), which should make the gateway try
/// again. Events we will never be able to process are reported as [`DispatchOutcome::Rejected`] or
/// [`DispatchOutcome::Ignored`] instead.
pub struct WebhookApi<B, G> {
    db: B,
    flow: PaymentFlowApi<B, G>,
    wallets: WalletApi<B>,
}

impl<B: Debug, G> Debug for WebhookApi<B, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "WebhookApi ({:?})", self.db)
    }
}

impl<B: Clone, G> WebhookApi<B, G> {
    pub fn new(db: B, gateway: G, producers: EventProducers) -> Self {
        let flow = PaymentFlowApi::new(db.clone(), gateway, producers.clone());
        let wallets = WalletApi::new(db.clone(), producers);
        Self { db, flow, wallets }
    }
}

impl<B, G> WebhookApi<B, G>
where
    B: SettlementDatabase,
    G: PaymentGateway,
{
    pub async fn dispatch(&self, payload: WebhookPayload) -> Result<DispatchOutcome, SettlementError> {
        let event_name = payload.event.clone();
        let event = match GatewayEvent::try_from(payload) {
            Ok(event) => event,
            Err(e) => {
                warn!("🪝️ Rejecting malformed {event_name} webhook: {e}");
                return Ok(DispatchOutcome::Rejected(e.to_string()));
            },
        };
        debug!("🪝️ Dispatching {} webhook", event.name());
        match event {
            GatewayEvent::Charge { kind: ChargeEventKind::Success, data } => self.on_charge_success(data).await,
            GatewayEvent::Charge { kind, data } => self.on_charge_failure(&kind, &data).await,
            GatewayEvent::Transfer { kind, data } => self.on_transfer(kind, &data).await,
            GatewayEvent::Unknown(name) => {
                debug!("🪝️ Ignoring unhandled event type {name}");
                Ok(DispatchOutcome::Ignored(format!("Event {name} is not handled")))
            },
        }
    }

    async fn on_charge_success(&self, data: ChargeData) -> Result<DispatchOutcome, SettlementError> {
        let reference = data.reference.clone();
        let Some(payment) = self.db.fetch_payment_by_reference(&reference).await? else {
            warn!("🪝️ charge.success for unknown payment {reference}. Ignoring.");
            return Ok(DispatchOutcome::Ignored(format!("No payment with reference {reference}")));
        };
        let verified = self.flow.gateway().verify_charge(&reference, Some(payment.amount)).await.map_err(|e| {
            error!("🪝️ Could not verify charge {reference} with the gateway: {e}");
            SettlementError::from(e)
        })?;
        if !verified {
            warn!("🪝️ Gateway did not confirm charge {reference} for {}. Marking the payment as failed.", payment.amount);
            self.flow.fail_payment(&reference).await?;
            return Ok(DispatchOutcome::Rejected(format!("Charge {reference} could not be verified")));
        }
        let id = publish_json(&self.db, QueueName::PaymentSuccess, &data).await?;
        info!("🪝️ Charge {reference} verified and queued as message #{id}");
        Ok(DispatchOutcome::Accepted(format!("Charge {reference} accepted")))
    }

    async fn on_charge_failure(
        &self,
        kind: &ChargeEventKind,
        data: &ChargeData,
    ) -> Result<DispatchOutcome, SettlementError> {
        let reference = &data.reference;
        match self.flow.fail_payment(reference).await? {
            Some(_) => info!("🪝️ Payment {reference} marked as failed ({kind:?})"),
            None => debug!("🪝️ Payment {reference} is unknown or no longer processing. Nothing to fail."),
        }
        Ok(DispatchOutcome::Accepted(format!("Charge {reference} recorded as failed")))
    }

    async fn on_transfer(
        &self,
        kind: TransferEventKind,
        data: &TransferData,
    ) -> Result<DispatchOutcome, SettlementError> {
        let reference = &data.reference;
        let outcome = match kind {
            TransferEventKind::Success => WithdrawalOutcome::Succeeded,
            TransferEventKind::Failed | TransferEventKind::Reversed => WithdrawalOutcome::Failed,
            TransferEventKind::Other(name) => {
                debug!("🪝️ Ignoring transfer.{name} for {reference}");
                return Ok(DispatchOutcome::Ignored(format!("Event transfer.{name} is not handled")));
            },
        };
        match self.wallets.finalize_withdrawal(reference, outcome).await {
            Ok(result) if result.changed() => {
                Ok(DispatchOutcome::Accepted(format!("Withdrawal {reference} is {}", result.transaction().status)))
            },
            Ok(result) => Ok(DispatchOutcome::Ignored(format!(
                "Withdrawal {reference} was already {}",
                result.transaction().status
            ))),
            Err(SettlementError::TransactionNotFound(_)) => {
                warn!("🪝️ Transfer webhook for {reference}, which is not in the ledger. Ignoring.");
                Ok(DispatchOutcome::Ignored(format!("No withdrawal with reference {reference}")))
            },
            Err(SettlementError::InvalidWebhookPayload(msg)) => {
                warn!("🪝️ Transfer webhook for {reference} rejected: {msg}");
                Ok(DispatchOutcome::Rejected(msg))
            },
            Err(e) => Err(e),
        }
    }
}
