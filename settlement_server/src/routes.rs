//! Request handler definitions
//!
//! Define each route and its handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests. Every database and gateway call in here is async, and anything
//! slow (placing and paying for new orders, paying riders) goes through the work queues instead.
use actix_web::{get, web, HttpResponse, Responder};
use log::*;
use settlement_engine::{
    db_types::{ActorType, NewOrder, Order},
    payment_objects::{DispatchOutcome, PaymentRequest, WithdrawalRequest},
    queue::{publish_json, OrderCreateMessage, QueueName},
    traits::{MessageQueue, OrderManagement, PaymentGateway, SettlementDatabase, WalletLedger},
    webhook_objects::WebhookPayload,
    PaymentFlowApi,
    SettlementError,
    WalletApi,
    WebhookApi,
    WithdrawalApi,
};

use crate::{
    auth::{JwtClaims, Role},
    data_objects::{
        InitializePaymentParams,
        JsonResponse,
        OrderAccepted,
        Pagination,
        TransactionPage,
        UpdateOrderStatusParams,
    },
    errors::ServerError,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ident),+ where requires [$($roles:expr),+]) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>)
                    .wrap($crate::middleware::AclMiddlewareFactory::new(&[$($roles),+]));
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };

    ($name:ident => $method:ident $path:literal impl $($bounds:ident),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Webhook  ----------------------------------------------------
route!(payment_webhook => Post "" impl SettlementDatabase, PaymentGateway);
/// Route handler for Paystack webhooks.
///
/// By the time the request gets here, the HMAC middleware has checked the `x-paystack-signature` header against the
/// raw body. The response is always a [`JsonResponse`]:
/// * 200 when the event was accepted, or ignored because there is nothing for us to do with it,
/// * 400 when the event was rejected and Paystack should not send it again,
/// * 5xx when something on our side failed, and Paystack should retry.
pub async fn payment_webhook<B, G>(
    body: web::Bytes,
    api: web::Data<WebhookApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: SettlementDatabase,
    G: PaymentGateway,
{
    let payload = serde_json::from_slice::<WebhookPayload>(&body).map_err(|e| {
        warn!("💻️ Could not deserialize webhook payload. {e}");
        ServerError::CouldNotDeserializePayload(e.to_string())
    })?;
    debug!("💻️ Received {} webhook", payload.event);
    let response = match api.dispatch(payload).await? {
        DispatchOutcome::Rejected(msg) => HttpResponse::BadRequest().json(JsonResponse::failure(msg)),
        outcome => HttpResponse::Ok().json(JsonResponse::success(outcome.message())),
    };
    Ok(response)
}

//----------------------------------------------   Payments  ----------------------------------------------------
route!(initialize_payment => Post "/payments/initialize" impl SettlementDatabase, PaymentGateway where requires [Role::User]);
/// Starts paying for one of the caller's orders. Cash payments complete immediately. Gateway payments return the
/// checkout URL to send the customer to.
pub async fn initialize_payment<B, G>(
    claims: JwtClaims,
    body: web::Json<InitializePaymentParams>,
    api: web::Data<PaymentFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: SettlementDatabase,
    G: PaymentGateway,
{
    let params = body.into_inner();
    debug!("💻️ POST initialize payment for order #{} by user #{}", params.order_id, claims.sub);
    let request = PaymentRequest {
        user_id: claims.sub,
        order_id: params.order_id,
        method: params.payment_method,
        email: params.email,
    };
    let result = api.process_payment(request).await?;
    Ok(HttpResponse::Ok().json(result))
}

//----------------------------------------------   Orders  ----------------------------------------------------
route!(create_order => Post "/orders" impl MessageQueue where requires [Role::User]);
/// Queues a new order on `order.create`. The order is placed, and paid for by the declared method, by the queue
/// worker, so the response is a 202.
pub async fn create_order<Q: MessageQueue>(
    claims: JwtClaims,
    body: web::Json<NewOrder>,
    queue: web::Data<Q>,
) -> Result<HttpResponse, ServerError> {
    let order = body.into_inner();
    if !order.total_price.is_positive() {
        return Err(ServerError::InvalidRequest(format!("Order totals must be positive, not {}", order.total_price)));
    }
    let message = OrderCreateMessage { user_id: claims.sub, order };
    let message_id =
        publish_json(queue.get_ref(), QueueName::OrderCreate, &message).await.map_err(SettlementError::from)?;
    info!("💻️ Order from user #{} queued as message #{message_id}", claims.sub);
    let accepted =
        OrderAccepted { success: true, message: "Order accepted for processing".to_string(), message_id };
    Ok(HttpResponse::Accepted().json(accepted))
}

route!(update_order_status => Patch "/orders/{id}/status" impl SettlementDatabase, PaymentGateway where requires [Role::Restaurant, Role::Rider, Role::Admin]);
/// Moves an order one step along its lifecycle, or cancels it. Restaurants may only touch their own orders, and riders
/// the orders assigned to them. Marking an order as delivered queues the rider's payment.
pub async fn update_order_status<B, G>(
    claims: JwtClaims,
    path: web::Path<i64>,
    body: web::Json<UpdateOrderStatusParams>,
    api: web::Data<PaymentFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: SettlementDatabase,
    G: PaymentGateway,
{
    let order_id = path.into_inner();
    let status = body.into_inner().status;
    debug!("💻️ PATCH order #{order_id} to {status} by {} #{}", claims.role, claims.sub);
    let order = api
        .db()
        .fetch_order(order_id)
        .await
        .map_err(SettlementError::from)?
        .ok_or_else(|| ServerError::NoRecordFound(format!("Order {order_id} does not exist")))?;
    check_order_access(&claims, &order)?;
    let order = api.update_order_status(order_id, status).await?;
    Ok(HttpResponse::Ok().json(order))
}

fn check_order_access(claims: &JwtClaims, order: &Order) -> Result<(), ServerError> {
    let allowed = match claims.role {
        Role::Admin => true,
        Role::Restaurant => order.restaurant_id == claims.sub,
        Role::Rider => order.rider_id == Some(claims.sub),
        Role::User => false,
    };
    if allowed {
        Ok(())
    } else {
        warn!("💻️ {} #{} tried to update order #{} without access to it", claims.role, claims.sub, order.id);
        Err(ServerError::InsufficientPermissions(format!("Order {} does not belong to you", order.id)))
    }
}

//----------------------------------------------   Wallets  ----------------------------------------------------
route!(wallet_balance => Get "/wallet/{actor}/balance" impl WalletLedger where requires [Role::Restaurant, Role::Rider]);
pub async fn wallet_balance<B: WalletLedger>(
    claims: JwtClaims,
    path: web::Path<String>,
    api: web::Data<WalletApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let actor_type = wallet_owner(&claims, &path)?;
    debug!("💻️ GET {actor_type} balance for #{}", claims.sub);
    let balance = api.balance(claims.sub, actor_type).await?;
    Ok(HttpResponse::Ok().json(balance))
}

route!(wallet_transactions => Get "/wallet/{actor}/transactions" impl WalletLedger where requires [Role::Restaurant, Role::Rider]);
/// Newest first. `page` starts at 1; `limit` defaults to 20 and is capped by the wallet API.
pub async fn wallet_transactions<B: WalletLedger>(
    claims: JwtClaims,
    path: web::Path<String>,
    query: web::Query<Pagination>,
    api: web::Data<WalletApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let actor_type = wallet_owner(&claims, &path)?;
    let (page, limit) = (query.page(), query.limit());
    debug!("💻️ GET {actor_type} transactions for #{} (page {page}, limit {limit})", claims.sub);
    let transactions = api.transactions(claims.sub, actor_type, page, limit).await?;
    Ok(HttpResponse::Ok().json(TransactionPage { page, limit, transactions }))
}

route!(withdraw => Post "/wallet/{actor}/withdraw" impl WalletLedger, PaymentGateway where requires [Role::Restaurant, Role::Rider]);
/// Pays part of the caller's available balance out to their bank account. The transfer is settled later, by webhook.
pub async fn withdraw<B, G>(
    claims: JwtClaims,
    path: web::Path<String>,
    body: web::Json<WithdrawalRequest>,
    api: web::Data<WithdrawalApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: WalletLedger,
    G: PaymentGateway,
{
    let actor_type = wallet_owner(&claims, &path)?;
    let request = body.into_inner();
    info!("💻️ POST withdrawal of {} for {actor_type} #{}", request.amount, claims.sub);
    let receipt = api.process_withdrawal(claims.sub, actor_type, request).await?;
    Ok(HttpResponse::Ok().json(receipt))
}

/// The wallet in the path must be the caller's own: a rider cannot read a restaurant wallet with the same id.
fn wallet_owner(claims: &JwtClaims, actor: &str) -> Result<ActorType, ServerError> {
    let actor_type = actor.parse::<ActorType>().map_err(|e| ServerError::InvalidRequestPath(e.to_string()))?;
    if claims.role.actor_type() == Some(actor_type) {
        Ok(actor_type)
    } else {
        Err(ServerError::InsufficientPermissions(format!("A {} cannot access {actor_type} wallets", claims.role)))
    }
}
