use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use futures::FutureExt;
use log::*;
use settle_common::Secret;
use settlement_engine::{
    events::{EventHandlers, EventHooks, EventProducers},
    traits::{PaymentGateway, SettlementDatabase},
    PaymentFlowApi,
    SqliteDatabase,
    WalletApi,
    WebhookApi,
    WithdrawalApi,
};

use crate::{
    auth::TokenVerifier,
    config::ServerConfig,
    errors::ServerError,
    integrations::paystack::PaystackGateway,
    middleware::{HmacMiddlewareFactory, JwtMiddlewareFactory},
    queue_workers::start_queue_workers,
    routes::{
        health,
        CreateOrderRoute,
        InitializePaymentRoute,
        PaymentWebhookRoute,
        UpdateOrderStatusRoute,
        WalletBalanceRoute,
        WalletTransactionsRoute,
        WithdrawRoute,
    },
    settlement_worker::start_settlement_worker,
};

pub const SIGNATURE_HEADER: &str = "x-paystack-signature";
const EVENT_BUFFER_SIZE: usize = 256;

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, config.db_max_connections)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    if config.run_migrations {
        db.run_migrations().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
        info!("🗃️ Database migrations are up to date");
    }
    let gateway = PaystackGateway::from_config(config.paystack.clone())?;
    let handlers = EventHandlers::new(EVENT_BUFFER_SIZE, notification_hooks());
    let producers = handlers.producers();
    tokio::spawn(handlers.start_handlers());

    let flow_api = PaymentFlowApi::new(db.clone(), gateway.clone(), producers.clone());
    let _workers = start_queue_workers(db.clone(), flow_api.clone(), config.queue);
    let _settlement = start_settlement_worker(flow_api, config.settlement_interval);

    let srv = create_server_instance(config, db, gateway, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

/// Everything a worker needs to serve requests. Cloned into each actix worker.
#[derive(Clone)]
pub struct ServerContext<B, G> {
    pub db: B,
    pub gateway: G,
    pub producers: EventProducers,
    pub verifier: TokenVerifier,
    pub webhook_secret: Secret<String>,
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    gateway: PaystackGateway,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let context = ServerContext {
        db,
        gateway,
        producers,
        verifier: TokenVerifier::new(&config.auth),
        webhook_secret: config.webhook_secret.clone(),
    };
    let srv = HttpServer::new(move || {
        let context = context.clone();
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("tss::access_log"))
            .configure(move |cfg| configure_services(cfg, context))
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}

/// Registers the APIs and every route on an app. Split out from [`create_server_instance`] so that tests can run the
/// same app against other backends.
pub fn configure_services<B, G>(cfg: &mut web::ServiceConfig, context: ServerContext<B, G>)
where
    B: SettlementDatabase + 'static,
    G: PaymentGateway + Clone + 'static,
{
    let ServerContext { db, gateway, producers, verifier, webhook_secret } = context;
    let flow_api = PaymentFlowApi::new(db.clone(), gateway.clone(), producers.clone());
    let webhook_api = WebhookApi::new(db.clone(), gateway.clone(), producers.clone());
    let wallet_api = WalletApi::new(db.clone(), producers.clone());
    let withdrawal_api = WithdrawalApi::new(db.clone(), gateway, producers);
    // The webhook is the only resource under its scope, so the signature check never sees the user-facing routes
    let webhook_scope = web::scope("/payments/webhook")
        .wrap(HmacMiddlewareFactory::new(SIGNATURE_HEADER, webhook_secret))
        .service(PaymentWebhookRoute::<B, G>::new());
    // Catches every other path, so it must be registered last
    let api_scope = web::scope("")
        .wrap(JwtMiddlewareFactory::new(verifier))
        .service(InitializePaymentRoute::<B, G>::new())
        .service(CreateOrderRoute::<B>::new())
        .service(UpdateOrderStatusRoute::<B, G>::new())
        .service(WalletBalanceRoute::<B>::new())
        .service(WalletTransactionsRoute::<B>::new())
        .service(WithdrawRoute::<B, G>::new());
    cfg.app_data(web::Data::new(flow_api))
        .app_data(web::Data::new(webhook_api))
        .app_data(web::Data::new(wallet_api))
        .app_data(web::Data::new(withdrawal_api))
        .app_data(web::Data::new(db))
        .app_data(web::JsonConfig::default().error_handler(|err, _req| {
            ServerError::CouldNotDeserializePayload(err.to_string()).into()
        }))
        .app_data(web::QueryConfig::default().error_handler(|err, _req| {
            ServerError::InvalidRequest(err.to_string()).into()
        }))
        .app_data(web::PathConfig::default().error_handler(|err, _req| {
            ServerError::InvalidRequestPath(err.to_string()).into()
        }))
        .service(health)
        .service(webhook_scope)
        .service(api_scope);
}

/// E-mail and push delivery belong to the notification service. Until it subscribes, the events are logged.
fn notification_hooks() -> EventHooks {
    let mut hooks = EventHooks::default();
    hooks
        .on_payment_confirmed(|ev| {
            async move {
                info!("📧️ Payment confirmed for order {} (payment #{})", ev.order.order_number, ev.payment.id);
            }
            .boxed()
        })
        .on_rider_paid(|ev| {
            async move {
                info!("📧️ Rider #{} was paid {} for order {}", ev.rider_id, ev.amount, ev.order.order_number);
            }
            .boxed()
        })
        .on_withdrawal_settled(|ev| {
            async move {
                info!("📧️ Withdrawal {} is now {}", ev.transaction.reference, ev.transaction.status);
            }
            .boxed()
        })
        .on_withdrawal_unrecorded(|ev| {
            async move {
                error!(
                    "🚨️ RECONCILE: transfer {} ({}) paid {} to {} #{} with no ledger debit. {}",
                    ev.reference, ev.transfer_code, ev.amount, ev.actor_type, ev.actor_id, ev.reason
                );
            }
            .boxed()
        });
    hooks
}
