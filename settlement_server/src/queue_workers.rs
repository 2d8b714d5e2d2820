//! Consumers for the three work queues.
//!
//! Each queue gets its own [`QueueConsumer`], all sharing the one database pool. Handlers return `Err` to dead-letter
//! a message; everything they do is safe to run twice, so redelivery after a crash is harmless.
use log::*;
use settlement_engine::{
    payment_objects::PaymentRequest,
    queue::{typed_handler, ConsumerConfig, MessageHandler, OrderCreateMessage, QueueConsumer, QueueName, RiderPaymentMessage},
    webhook_objects::ChargeData,
    PaymentFlowApi,
    SqliteDatabase,
};
use tokio::task::JoinHandle;

use crate::integrations::paystack::PaystackGateway;

pub type FlowApi = PaymentFlowApi<SqliteDatabase, PaystackGateway>;

/// Starts one consumer per queue. Do not await the returned JoinHandles, as they run indefinitely.
pub fn start_queue_workers(db: SqliteDatabase, api: FlowApi, config: ConsumerConfig) -> Vec<JoinHandle<()>> {
    QueueName::ALL
        .into_iter()
        .map(|name| {
            let handler = handler_for(name, api.clone());
            let consumer = QueueConsumer::new(db.clone(), name, config);
            tokio::spawn(consumer.run(handler))
        })
        .collect()
}

pub fn handler_for(name: QueueName, api: FlowApi) -> MessageHandler {
    match name {
        QueueName::OrderCreate => order_create_handler(api),
        QueueName::PaymentSuccess => payment_success_handler(api),
        QueueName::RiderPayment => rider_payment_handler(api),
    }
}

/// Places the order, then starts paying for it with the method the customer chose.
pub fn order_create_handler(api: FlowApi) -> MessageHandler {
    typed_handler(move |message: OrderCreateMessage| {
        let api = api.clone();
        async move {
            let user_id = message.user_id;
            let method = message.order.payment_method;
            let order = api.place_order(user_id, message.order).await.map_err(|e| {
                warn!("📬️ Could not place order for user #{user_id}. {e}");
                e.to_string()
            })?;
            let request = PaymentRequest { user_id, order_id: order.id, method, email: None };
            let payment = api.process_payment(request).await.map_err(|e| {
                warn!("📬️ Order {} was placed, but payment could not be started. {e}", order.order_number);
                e.to_string()
            })?;
            info!("📬️ Order {} placed. Payment #{} is {}", order.order_number, payment.payment_id, payment.status);
            Ok(())
        }
    })
}

pub fn payment_success_handler(api: FlowApi) -> MessageHandler {
    typed_handler(move |charge: ChargeData| {
        let api = api.clone();
        async move {
            let outcome = api.process_successful_payment(&charge).await.map_err(|e| {
                warn!("📬️ Could not complete payment {}. {e}", charge.reference);
                e.to_string()
            })?;
            if let Some(amount) = outcome.restaurant_commission {
                debug!("📬️ Payment {} settled. Restaurant commission {amount}", charge.reference);
            }
            Ok(())
        }
    })
}

pub fn rider_payment_handler(api: FlowApi) -> MessageHandler {
    typed_handler(move |message: RiderPaymentMessage| {
        let api = api.clone();
        async move {
            let order_number = message.order.order_number.clone();
            let outcome = api.process_rider_payment(&message.order).await.map_err(|e| {
                warn!("📬️ Could not pay the rider for order {order_number}. {e}");
                e.to_string()
            })?;
            debug!("📬️ Rider payment for order {order_number}: {outcome:?}");
            Ok(())
        }
    })
}
