//! Request handler definitions
//!
//! Define each route and it handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests. Any long, non-cpu-bound operation (e.g. the call to the payment
//! gateway, or database operations) must be expressed as futures or asynchronous functions.
use actix_web::{get, web, HttpRequest, HttpResponse, Responder};
use log::*;
use payment_order_engine::{
    order_objects::{Acknowledgement, InitiationRequest, ProcessedOutcome},
    traits::{EntitlementHook, EntitlementStore, PaymentGateway, PaymentOrderStore},
    EntitlementLedger,
    NotificationApi,
    OrderStatusApi,
    PaymentInitiationApi,
};
use serde_json::json;

use crate::{
    auth::AuthenticatedPrincipal,
    config::ProxyConfig,
    data_objects::{FinishParams, InitiationResponse},
    errors::ServerError,
    helpers::customer_ip,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
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

//----------------------------------------------   Initiate  ----------------------------------------------------
route!(initiate_payment => Post "/payments/initiate" impl PaymentOrderStore, PaymentGateway);
/// Route handler for starting a card payment.
///
/// The caller must be authenticated. The body is `{"amount": <minor units>, "description": "..."}`. On success the
/// response carries the gateway URL the buyer must be sent to:
/// `{"message", "redirectUri", "internalOrderId", "gatewayOrderId"}`.
///
/// Failures:
/// * 400 for invalid amounts or descriptions. No order is created.
/// * 401 if the caller is not authenticated.
/// * 502 if the gateway did not accept the order. The order is kept, marked as failed.
/// * 500 for configuration and storage problems.
pub async fn initiate_payment<B, G>(
    req: HttpRequest,
    principal: AuthenticatedPrincipal,
    config: web::Data<ProxyConfig>,
    api: web::Data<PaymentInitiationApi<B, G>>,
    body: web::Json<InitiationRequest>,
) -> Result<HttpResponse, ServerError>
where
    B: PaymentOrderStore,
    G: PaymentGateway,
{
    trace!("💻️ Received payment initiation request from {}", principal.email);
    let ip = customer_ip(&req, config.use_x_forwarded_for, config.use_forwarded);
    let result = api.initiate(&principal, body.into_inner(), &ip).await.map_err(|e| {
        warn!("💻️ Payment initiation failed for {}. {e}", principal.email);
        ServerError::from(e)
    })?;
    info!("💻️ Payment initiated for {}. Order {}", principal.email, result.internal_order_id);
    Ok(HttpResponse::Ok().json(InitiationResponse::from(result)))
}

//----------------------------------------------   Notify  ----------------------------------------------------
route!(payment_notification => Post "/payments/notify" impl PaymentOrderStore, EntitlementHook);
/// Route handler for the gateway's status notifications.
///
/// The body is read raw, since the signature covers the exact bytes that were sent. Responses:
/// * 200 once the notification has been processed, including when the order is unknown, so that the gateway stops
///   retrying.
/// * 400 if the signature is missing or wrong, or the payload is malformed. Nothing is changed.
/// * 500 if the notification could not be applied. The gateway will retry.
pub async fn payment_notification<B, H>(
    req: HttpRequest,
    body: web::Bytes,
    config: web::Data<ProxyConfig>,
    api: web::Data<NotificationApi<B, H>>,
) -> Result<HttpResponse, ServerError>
where
    B: PaymentOrderStore,
    H: EntitlementHook,
{
    trace!("💻️ Received a payment notification");
    let signature = req.headers().get(config.signature_header.as_str()).and_then(|v| v.to_str().ok());
    match api.receive(&body, signature).await? {
        Acknowledgement::Processed(ProcessedOutcome::OrderNotFound) => {
            Ok(HttpResponse::Ok().body("Order not found, acknowledged."))
        },
        Acknowledgement::Processed(_) => Ok(HttpResponse::Ok().body("Notification processed.")),
        Acknowledgement::Rejected(reason) => {
            let peer = req.peer_addr().map(|a| a.ip().to_string()).unwrap_or_default();
            warn!("💻️ Rejected a payment notification from {peer}. {reason}");
            Err(ServerError::NotificationRejected(reason.to_string()))
        },
    }
}

//----------------------------------------------   Finish  ----------------------------------------------------
route!(payment_finish => Get "/payments/finish" impl PaymentOrderStore);
/// The gateway sends the buyer here once they are done on the payment page.
///
/// Query parameters: `internal_order_id` (added by us to the continue URL) and `error` (added by the gateway when the
/// payment flow broke). Always answers 200 with `{"message", "isError", "order"}`; if the caller is authenticated, the
/// orders of other buyers are not shown.
pub async fn payment_finish<B>(
    principal: Option<AuthenticatedPrincipal>,
    params: web::Query<FinishParams>,
    api: web::Data<OrderStatusApi<B>>,
) -> HttpResponse
where
    B: PaymentOrderStore,
{
    let FinishParams { internal_order_id, error } = params.into_inner();
    trace!("💻️ Buyer returned for order {internal_order_id:?}");
    let email = principal.as_ref().map(|p| p.email.as_str());
    let summary = api.order_status(internal_order_id.as_deref(), email, error.as_deref()).await;
    HttpResponse::Ok().json(summary)
}

//----------------------------------------------   History  ----------------------------------------------------
route!(my_orders => Get "/payments/orders" impl PaymentOrderStore);
/// The authenticated buyer's orders, newest first.
pub async fn my_orders<B>(
    principal: AuthenticatedPrincipal,
    api: web::Data<OrderStatusApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: PaymentOrderStore,
{
    trace!("💻️ Fetching orders for {}", principal.email);
    let orders = api.orders_for_buyer(&principal.email).await.map_err(|e| {
        debug!("💻️ Could not fetch orders. {e}");
        ServerError::BackendError(e.to_string())
    })?;
    Ok(HttpResponse::Ok().json(orders))
}

route!(my_entitlement => Get "/payments/entitlement" impl EntitlementStore);
/// The item the authenticated buyer most recently paid for, or `null`.
pub async fn my_entitlement<S>(
    principal: AuthenticatedPrincipal,
    ledger: web::Data<EntitlementLedger<S>>,
) -> Result<HttpResponse, ServerError>
where
    S: EntitlementStore,
{
    let grant = ledger.active_entitlement(&principal.email).await.map_err(|e| {
        debug!("💻️ Could not fetch the entitlement for {}. {e}", principal.email);
        ServerError::BackendError(e.to_string())
    })?;
    Ok(HttpResponse::Ok().json(json!({ "entitlement": grant })))
}
