use std::{sync::Arc, time::Duration};

use actix_web::{dev::Server, error::JsonPayloadError, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use gateway_client::{GatewayClient, TokenCache};
use log::*;
use payment_order_engine::{
    EntitlementLedger,
    NotificationApi,
    OrderStatusApi,
    PaymentInitiationApi,
    SqliteDatabase,
};

use crate::{
    config::{ProxyConfig, ServerConfig},
    errors::ServerError,
    middleware::IdentityHeadersFactory,
    routes::{
        health,
        InitiatePaymentRoute,
        MyEntitlementRoute,
        MyOrdersRoute,
        PaymentFinishRoute,
        PaymentNotificationRoute,
    },
};

type Ledger = EntitlementLedger<SqliteDatabase>;

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.migrate().await.map_err(|e| ServerError::InitializeError(format!("Could not migrate the database. {e}")))?;
    let tokens = TokenCache::new(&config.gateway).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let gateway = GatewayClient::new(&config.gateway, Arc::new(tokens))
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let srv = create_server_instance(config, db, gateway)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    gateway: GatewayClient,
) -> Result<Server, ServerError> {
    if config.gateway.signature_key.is_blank() {
        warn!("🪛️ POB_GATEWAY_SIGNATURE_KEY is not set. Every payment notification will be refused.");
    }
    let settings = config.order_flow_settings();
    let proxy_config = ProxyConfig::from_config(&config);
    let signature_key = config.gateway.signature_key.clone();
    let trust_identity_headers = config.trust_identity_headers;
    let srv = HttpServer::new(move || {
        let initiation_api = PaymentInitiationApi::new(db.clone(), gateway.clone(), settings.clone());
        let ledger = EntitlementLedger::new(db.clone());
        let notification_api = NotificationApi::new(db.clone(), ledger.clone(), signature_key.clone());
        let status_api = OrderStatusApi::new(db.clone());
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("pob::access_log"))
            .wrap(IdentityHeadersFactory::new(trust_identity_headers))
            .app_data(json_config())
            .app_data(web::Data::new(proxy_config.clone()))
            .app_data(web::Data::new(initiation_api))
            .app_data(web::Data::new(notification_api))
            .app_data(web::Data::new(status_api))
            .app_data(web::Data::new(ledger))
            .service(health)
            .service(InitiatePaymentRoute::<SqliteDatabase, GatewayClient>::new())
            .service(PaymentNotificationRoute::<SqliteDatabase, Ledger>::new())
            .service(PaymentFinishRoute::<SqliteDatabase>::new())
            .service(MyOrdersRoute::<SqliteDatabase>::new())
            .service(MyEntitlementRoute::<SqliteDatabase>::new())
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}

/// Reports unreadable JSON bodies in the same format as every other error.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err: JsonPayloadError, _req| {
        debug!("💻️ Could not read the request body. {err}");
        ServerError::InvalidRequestBody(err.to_string()).into()
    })
}
