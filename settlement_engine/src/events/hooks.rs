use std::{future::Future, pin::Pin, sync::Arc};

use crate::events::{
    EventHandler,
    EventProducer,
    Handler,
    PaymentConfirmedEvent,
    RiderPaidEvent,
    WithdrawalSettledEvent,
    WithdrawalUnrecordedEvent,
};

#[derive(Default, Clone)]
pub struct EventProducers {
    pub payment_confirmed_producer: Vec<EventProducer<PaymentConfirmedEvent>>,
    pub rider_paid_producer: Vec<EventProducer<RiderPaidEvent>>,
    pub withdrawal_settled_producer: Vec<EventProducer<WithdrawalSettledEvent>>,
    pub withdrawal_unrecorded_producer: Vec<EventProducer<WithdrawalUnrecordedEvent>>,
}

impl EventProducers {
    pub async fn payment_confirmed(&self, event: PaymentConfirmedEvent) {
        for producer in &self.payment_confirmed_producer {
            producer.publish_event(event.clone()).await;
        }
    }

    pub async fn rider_paid(&self, event: RiderPaidEvent) {
        for producer in &self.rider_paid_producer {
            producer.publish_event(event.clone()).await;
        }
    }

    pub async fn withdrawal_settled(&self, event: WithdrawalSettledEvent) {
        for producer in &self.withdrawal_settled_producer {
            producer.publish_event(event.clone()).await;
        }
    }

    pub async fn withdrawal_unrecorded(&self, event: WithdrawalUnrecordedEvent) {
        for producer in &self.withdrawal_unrecorded_producer {
            producer.publish_event(event.clone()).await;
        }
    }
}

pub struct EventHandlers {
    pub on_payment_confirmed: Option<EventHandler<PaymentConfirmedEvent>>,
    pub on_rider_paid: Option<EventHandler<RiderPaidEvent>>,
    pub on_withdrawal_settled: Option<EventHandler<WithdrawalSettledEvent>>,
    pub on_withdrawal_unrecorded: Option<EventHandler<WithdrawalUnrecordedEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_payment_confirmed = hooks.on_payment_confirmed.map(|f| EventHandler::new(buffer_size, f));
        let on_rider_paid = hooks.on_rider_paid.map(|f| EventHandler::new(buffer_size, f));
        let on_withdrawal_settled = hooks.on_withdrawal_settled.map(|f| EventHandler::new(buffer_size, f));
        let on_withdrawal_unrecorded = hooks.on_withdrawal_unrecorded.map(|f| EventHandler::new(buffer_size, f));
        Self { on_payment_confirmed, on_rider_paid, on_withdrawal_settled, on_withdrawal_unrecorded }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_payment_confirmed {
            result.payment_confirmed_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_rider_paid {
            result.rider_paid_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_withdrawal_settled {
            result.withdrawal_settled_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_withdrawal_unrecorded {
            result.withdrawal_unrecorded_producer.push(handler.subscribe());
        }
        result
    }

    pub async fn start_handlers(self) {
        if let Some(handler) = self.on_payment_confirmed {
            tokio::spawn(handler.start_handler());
        }
        if let Some(handler) = self.on_rider_paid {
            tokio::spawn(handler.start_handler());
        }
        if let Some(handler) = self.on_withdrawal_settled {
            tokio::spawn(handler.start_handler());
        }
        if let Some(handler) = self.on_withdrawal_unrecorded {
            tokio::spawn(handler.start_handler());
        }
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_payment_confirmed: Option<Handler<PaymentConfirmedEvent>>,
    pub on_rider_paid: Option<Handler<RiderPaidEvent>>,
    pub on_withdrawal_settled: Option<Handler<WithdrawalSettledEvent>>,
    pub on_withdrawal_unrecorded: Option<Handler<WithdrawalUnrecordedEvent>>,
}

impl EventHooks {
    pub fn on_payment_confirmed<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(PaymentConfirmedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_payment_confirmed = Some(Arc::new(f));
        self
    }

    pub fn on_rider_paid<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(RiderPaidEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_rider_paid = Some(Arc::new(f));
        self
    }

    pub fn on_withdrawal_settled<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(WithdrawalSettledEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_withdrawal_settled = Some(Arc::new(f));
        self
    }

    pub fn on_withdrawal_unrecorded<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(WithdrawalUnrecordedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_withdrawal_unrecorded = Some(Arc::new(f));
        self
    }
}
