use std::fmt::Debug;

use chrono::{DateTime, Utc};
use log::*;
use serde_json::json;
use settle_common::MinorUnits;

use crate::{
    db_types::{
        ActorType,
        NewOrder,
        NewPayment,
        NewTransaction,
        Order,
        OrderStatusType,
        Payment,
        PaymentMethod,
        PaymentStatus,
        RiderAvailability,
    },
    events::{EventProducers, PaymentConfirmedEvent, RiderPaidEvent},
    helpers::{generate_payment_reference, restaurant_commission_reference, rider_commission_reference},
    queue::{publish_json, QueueName, RiderPaymentMessage},
    settle_api::{
        errors::SettlementError,
        payment_objects::{PaymentInitialized, PaymentRequest, RiderPaymentOutcome, SuccessfulPaymentOutcome, SweepResult},
        webhook_objects::ChargeData,
    },
    traits::{ChargeRequest, PaymentGateway, SettlementDatabase, StoreError},
};

/// `PaymentFlowApi` drives an order from payment through to commission payouts.
///
/// Every state change it makes is a conditional write, so each method can be called again with the same input (a
/// redelivered webhook, a retried queue message, an overlapping sweep) without paying anyone twice.
#[derive(Clone)]
pub struct PaymentFlowApi<B, G> {
    db: B,
    gateway: G,
    producers: EventProducers,
}

impl<B: Debug, G> Debug for PaymentFlowApi<B, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PaymentFlowApi ({:?})", self.db)
    }
}

impl<B, G> PaymentFlowApi<B, G> {
    pub fn new(db: B, gateway: G, producers: EventProducers) -> Self {
        Self { db, gateway, producers }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }
}

impl<B, G> PaymentFlowApi<B, G>
where
    B: SettlementDatabase,
    G: PaymentGateway,
{
    pub async fn place_order(&self, user_id: i64, order: NewOrder) -> Result<Order, SettlementError> {
        if !order.total_price.is_positive() {
            return Err(SettlementError::InvalidAmount(format!("order totals must be positive, not {}", order.total_price)));
        }
        let order = self.db.place_order(user_id, order).await?;
        info!("🔄️📦️ Order {} placed for user #{user_id}. Total {}", order.order_number, order.total_price);
        Ok(order)
    }

    /// Starts paying for an order.
    ///
    /// Cash payments complete immediately. Gateway payments return the checkout URL; the payment completes later, when
    /// the charge webhook arrives. Asking again for a gateway payment that is still waiting on the customer returns the
    /// same checkout URL.
    pub async fn process_payment(&self, request: PaymentRequest) -> Result<PaymentInitialized, SettlementError> {
        let order = self.db.fetch_order(request.order_id).await?.ok_or(SettlementError::OrderNotFound(request.order_id))?;
        if order.user_id != request.user_id {
            warn!("🔄️💰️ User #{} tried to pay for order {}, which is not theirs", request.user_id, order.order_number);
            return Err(SettlementError::Forbidden(format!("Order {} does not belong to you", order.id)));
        }
        if let Some(existing) = self.db.fetch_live_payment_for_order(order.id).await? {
            match existing.status {
                PaymentStatus::Completed => return Err(SettlementError::OrderAlreadyPaid(order.id)),
                PaymentStatus::Processing
                    if existing.method == PaymentMethod::Gateway && existing.authorization_url.is_some() =>
                {
                    debug!("🔄️💰️ Returning the existing checkout for order {}", order.order_number);
                    return Ok(PaymentInitialized::from(&existing));
                },
                _ => return Err(SettlementError::PaymentInProgress(order.id)),
            }
        }
        if order.status != OrderStatusType::Pending {
            return Err(SettlementError::OrderNotPayable { order_id: order.id, status: order.status });
        }
        match request.method {
            PaymentMethod::Cash => self.pay_with_cash(&order).await,
            PaymentMethod::Gateway => self.pay_with_gateway(&order, request.email).await,
        }
    }

    async fn pay_with_cash(&self, order: &Order) -> Result<PaymentInitialized, SettlementError> {
        let new_payment = NewPayment {
            order_id: order.id,
            user_id: order.user_id,
            amount: order.total_price,
            method: PaymentMethod::Cash,
            reference: None,
        };
        let payment = self.db.insert_payment(new_payment).await?;
        let payment = self
            .db
            .transition_payment_status(payment.id, PaymentStatus::Processing, PaymentStatus::Completed)
            .await?
            .unwrap_or(payment);
        if let Some(order) =
            self.db.transition_order_status(order.id, OrderStatusType::Pending, OrderStatusType::Processing).await?
        {
            info!("🔄️💰️ Order {} will be paid in cash on delivery", order.order_number);
            self.producers.payment_confirmed(PaymentConfirmedEvent::new(order, payment.clone())).await;
        }
        Ok(PaymentInitialized::from(&payment))
    }

    async fn pay_with_gateway(
        &self,
        order: &Order,
        email: Option<String>,
    ) -> Result<PaymentInitialized, SettlementError> {
        let email = match email.filter(|e| !e.trim().is_empty()) {
            Some(email) => email,
            None => {
                self.db.fetch_user(order.user_id).await?.ok_or(SettlementError::UserNotFound(order.user_id))?.email
            },
        };
        let reference = generate_payment_reference(&order.order_number);
        let new_payment = NewPayment {
            order_id: order.id,
            user_id: order.user_id,
            amount: order.total_price,
            method: PaymentMethod::Gateway,
            reference: Some(reference.clone()),
        };
        let payment = self.db.insert_payment(new_payment).await?;
        let request = ChargeRequest {
            amount: payment.amount,
            email,
            reference,
            metadata: json!({
                "order_id": order.id,
                "order_number": order.order_number,
                "user_id": order.user_id,
                "payment_id": payment.id,
            }),
        };
        let charge = match self.gateway.initialize_charge(request).await {
            Ok(charge) => charge,
            Err(e) => {
                error!("🔄️💰️ Could not start a gateway charge for order {}: {e}", order.order_number);
                self.db.transition_payment_status(payment.id, PaymentStatus::Processing, PaymentStatus::Failed).await?;
                return Err(e.into());
            },
        };
        let payment = self.db.set_authorization_url(payment.id, &charge.authorization_url).await?;
        info!("🔄️💰️ Gateway charge {} started for order {}", charge.reference, order.order_number);
        Ok(PaymentInitialized::from(&payment))
    }

    /// Completes a payment whose charge the gateway has confirmed, moves the order on, and credits the restaurant.
    ///
    /// Safe to call any number of times for the same charge. Only the first call changes anything.
    pub async fn process_successful_payment(
        &self,
        charge: &ChargeData,
    ) -> Result<SuccessfulPaymentOutcome, SettlementError> {
        let payment = self
            .db
            .fetch_payment_by_reference(&charge.reference)
            .await?
            .ok_or_else(|| SettlementError::PaymentNotFound(charge.reference.clone()))?;
        let completed =
            self.db.transition_payment_status(payment.id, PaymentStatus::Processing, PaymentStatus::Completed).await?;
        let payment_completed = completed.is_some();
        let payment = completed.unwrap_or(payment);
        if payment.status != PaymentStatus::Completed {
            warn!(
                "🔄️💰️ Payment {} was confirmed by the gateway but is already {}. Leaving it alone.",
                charge.reference, payment.status
            );
            return Ok(SuccessfulPaymentOutcome {
                payment,
                payment_completed: false,
                order_advanced: false,
                restaurant_commission: None,
            });
        }
        let order = self.db.fetch_order(payment.order_id).await?.ok_or(SettlementError::OrderNotFound(payment.order_id))?;
        let advanced =
            self.db.transition_order_status(order.id, OrderStatusType::Pending, OrderStatusType::Processing).await?;
        let order_advanced = advanced.is_some();
        if let Some(order) = advanced {
            info!("🔄️💰️ Order {} is paid and now processing", order.order_number);
            self.producers.payment_confirmed(PaymentConfirmedEvent::new(order, payment.clone())).await;
        } else {
            debug!("🔄️💰️ Order {} was already past pending ({})", order.order_number, order.status);
        }
        let settings = self.db.fetch_settings().await?;
        let commission = commission(order.total_price, settings.restaurant_commission_rate)?;
        let restaurant_commission = if commission.is_positive() {
            let tx = NewTransaction::credit(
                order.restaurant_id,
                ActorType::Restaurant,
                commission,
                &format!("Commission for order {}", order.order_number),
            )
            .with_reference(restaurant_commission_reference(&order.order_number));
            self.db.add_transaction(tx).await?;
            debug!("🔄️💸️ Restaurant #{} credited {commission} for order {}", order.restaurant_id, order.order_number);
            Some(commission)
        } else {
            None
        };
        Ok(SuccessfulPaymentOutcome { payment, payment_completed, order_advanced, restaurant_commission })
    }

    /// Marks a payment as failed, if it is still processing. Returns the failed payment, or `None` if there is no such
    /// payment or it had already left the processing state.
    pub async fn fail_payment(&self, reference: &str) -> Result<Option<Payment>, SettlementError> {
        let Some(payment) = self.db.fetch_payment_by_reference(reference).await? else {
            return Ok(None);
        };
        let failed =
            self.db.transition_payment_status(payment.id, PaymentStatus::Processing, PaymentStatus::Failed).await?;
        if failed.is_some() {
            info!("🔄️💰️ Payment {reference} for order #{} failed", payment.order_id);
        }
        Ok(failed)
    }

    /// Moves the order to `status`, if the order lifecycle allows it (see [`OrderStatusType::can_update_to`]). The write
    /// is conditional on the status that was checked, so a concurrent update makes this call fail rather than skip a
    /// step. When the order is delivered, a snapshot is queued for the rider payout worker.
    ///
    /// A failure to queue the snapshot is logged but not returned: the settlement sweep picks up delivered orders that
    /// were never paid out.
    pub async fn update_order_status(&self, order_id: i64, status: OrderStatusType) -> Result<Order, SettlementError> {
        let current = self.db.fetch_order(order_id).await?.ok_or(SettlementError::OrderNotFound(order_id))?;
        let invalid = SettlementError::InvalidStatusTransition { order_id, from: current.status, to: status };
        if !current.status.can_update_to(status) {
            debug!("🔄️📦️ Refusing to move order {} from {} to {status}", current.order_number, current.status);
            return Err(invalid);
        }
        let order = self.db.transition_order_status(order_id, current.status, status).await?.ok_or_else(|| {
            warn!("🔄️📦️ Order {} changed status while it was being updated to {status}", current.order_number);
            invalid
        })?;
        debug!("🔄️📦️ Order {} is now {status}", order.order_number);
        if status == OrderStatusType::Delivered {
            let message = RiderPaymentMessage { order: order.clone() };
            match publish_json(&self.db, QueueName::RiderPayment, &message).await {
                Ok(id) => debug!("📬️ Queued rider payout for order {} as message #{id}", order.order_number),
                Err(e) => warn!("📬️ Could not queue the rider payout for order {}: {e}", order.order_number),
            }
        }
        Ok(order)
    }

    /// Pays the rider their commission for a delivered order and confirms the delivery.
    ///
    /// The order is re-read from the store, so a stale snapshot cannot cause a second payout. The checks run in order:
    /// the order must be delivered, not yet confirmed, have a rider and have a completed payment. If the commission was
    /// already credited, the delivery is just confirmed.
    pub async fn process_rider_payment(&self, order: &Order) -> Result<RiderPaymentOutcome, SettlementError> {
        let order = self.db.fetch_order(order.id).await?.ok_or(SettlementError::OrderNotFound(order.id))?;
        if order.status != OrderStatusType::Delivered {
            trace!("🔄️🛵️ Order {} is {}, not delivered", order.order_number, order.status);
            return Ok(RiderPaymentOutcome::NotDelivered);
        }
        if order.delivery_confirmed {
            trace!("🔄️🛵️ Delivery of order {} is already confirmed", order.order_number);
            return Ok(RiderPaymentOutcome::AlreadyConfirmed);
        }
        let Some(rider_id) = order.rider_id else {
            warn!("🔄️🛵️ Order {} was delivered without a rider", order.order_number);
            return Ok(RiderPaymentOutcome::NoRiderAssigned);
        };
        let paid = self.db.fetch_live_payment_for_order(order.id).await?;
        if !paid.is_some_and(|p| p.status == PaymentStatus::Completed) {
            warn!("🔄️🛵️ Order {} was delivered but has no completed payment. The rider is not paid.", order.order_number);
            return Ok(RiderPaymentOutcome::Unpaid);
        }
        let reference = rider_commission_reference(&order.order_number);
        if self.db.fetch_transaction_by_reference(&reference).await?.is_some() {
            self.db.mark_delivery_confirmed(order.id).await?;
            debug!("🔄️🛵️ Rider for order {} was already paid. Delivery confirmed.", order.order_number);
            return Ok(RiderPaymentOutcome::AlreadyPaid);
        }
        let settings = self.db.fetch_settings().await?;
        let amount = commission(order.total_price, settings.rider_commission_rate)?;
        if !amount.is_positive() {
            self.db.mark_delivery_confirmed(order.id).await?;
            debug!("🔄️🛵️ No rider commission is due on order {}", order.order_number);
            return Ok(RiderPaymentOutcome::NothingDue);
        }
        let tx = NewTransaction::credit(
            rider_id,
            ActorType::Rider,
            amount,
            &format!("Delivery commission for order {}", order.order_number),
        )
        .with_reference(reference);
        self.db.add_transaction(tx).await?;
        match self.db.set_rider_availability(rider_id, RiderAvailability::Available).await {
            Ok(_) => {},
            Err(StoreError::RiderNotFound(id)) => warn!("🔄️🛵️ Rider #{id} is not in the directory"),
            Err(e) => return Err(e.into()),
        }
        self.db.mark_delivery_confirmed(order.id).await?;
        info!("🔄️🛵️ Rider #{rider_id} paid {amount} for order {}", order.order_number);
        self.producers.rider_paid(RiderPaidEvent { order, rider_id, amount }).await;
        Ok(RiderPaymentOutcome::Paid { rider_id, amount })
    }

    /// Pays out every delivered order whose dispute window closed before `now`. Failures are logged and collected, and
    /// never stop the sweep.
    pub async fn settle_delivered_orders(&self, now: DateTime<Utc>) -> Result<SweepResult, SettlementError> {
        let settings = self.db.fetch_settings().await?;
        let cutoff = now - settings.dispute_window();
        let orders = self.db.fetch_unsettled_deliveries(cutoff).await?;
        debug!("🕰️ {} delivered orders are past the dispute window (cutoff {cutoff})", orders.len());
        let mut result = SweepResult::default();
        for order in orders {
            match self.process_rider_payment(&order).await {
                Ok(outcome) => result.processed.push((order.id, outcome)),
                Err(e) => {
                    error!("🕰️ Could not settle order {}: {e}", order.order_number);
                    result.failed.push((order.id, e.to_string()));
                },
            }
        }
        info!(
            "🕰️ Settlement sweep complete. {} processed ({} paid), {} failed",
            result.processed_count(),
            result.paid_count(),
            result.failed_count()
        );
        Ok(result)
    }
}

fn commission(total: MinorUnits, rate: f64) -> Result<MinorUnits, SettlementError> {
    total.apply_rate(rate).map_err(|e| SettlementError::InternalError(e.to_string()))
}
