use std::env;

use gateway_client::GatewayConfig;
use log::*;
use payment_order_engine::order_objects::OrderFlowSettings;
use pob_common::{parse_boolean_flag, DEFAULT_CURRENCY_CODE};

const DEFAULT_POB_HOST: &str = "127.0.0.1";
const DEFAULT_POB_PORT: u16 = 8360;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/payment_orders.db";
const DEFAULT_BUYER_LANGUAGE: &str = "pl";
pub const DEFAULT_SIGNATURE_HEADER: &str = "OpenPayU-Signature";

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// The public base URL of this service, used to build the notify and continue URLs sent to the gateway.
    pub app_base_url: String,
    pub currency: String,
    pub buyer_language: String,
    /// The name of the header carrying the signature of gateway notifications.
    pub signature_header: String,
    /// If true, the X-Forwarded-For header will be used to determine the client's IP address, rather than the
    /// connection's remote address.
    pub use_x_forwarded_for: bool,
    /// If true, the Forwarded header will be used to determine the client's IP address.
    pub use_forwarded: bool,
    /// If true, the `X-Authenticated-*` headers set by an upstream proxy are trusted to identify the buyer.
    /// **DANGER**: only enable this behind a proxy that strips these headers from client requests.
    pub trust_identity_headers: bool,
    pub gateway: GatewayConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_POB_HOST.to_string(),
            port: DEFAULT_POB_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            app_base_url: String::default(),
            currency: DEFAULT_CURRENCY_CODE.to_string(),
            buyer_language: DEFAULT_BUYER_LANGUAGE.to_string(),
            signature_header: DEFAULT_SIGNATURE_HEADER.to_string(),
            use_x_forwarded_for: false,
            use_forwarded: false,
            trust_identity_headers: false,
            gateway: GatewayConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("POB_HOST").ok().unwrap_or_else(|| DEFAULT_POB_HOST.into());
        let port = env::var("POB_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for POB_PORT. {e} Using the default, {DEFAULT_POB_PORT}, instead."
                    );
                    DEFAULT_POB_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_POB_PORT);
        let database_url = env::var("POB_DATABASE_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ POB_DATABASE_URL is not set. Using {DEFAULT_DATABASE_URL}.");
            DEFAULT_DATABASE_URL.to_string()
        });
        let app_base_url = env::var("POB_APP_BASE_URL").ok().unwrap_or_else(|| {
            error!(
                "🪛️ POB_APP_BASE_URL is not set. Payments cannot be initiated until it is set to the public URL of this \
                 server."
            );
            String::default()
        });
        let currency = env::var("POB_CURRENCY").ok().unwrap_or_else(|| DEFAULT_CURRENCY_CODE.into());
        let buyer_language = env::var("POB_BUYER_LANGUAGE").ok().unwrap_or_else(|| DEFAULT_BUYER_LANGUAGE.into());
        let signature_header = env::var("POB_SIGNATURE_HEADER")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SIGNATURE_HEADER.into());
        let use_x_forwarded_for = parse_boolean_flag(env::var("POB_USE_X_FORWARDED_FOR").ok(), false);
        let use_forwarded = parse_boolean_flag(env::var("POB_USE_FORWARDED").ok(), false);
        let trust_identity_headers = parse_boolean_flag(env::var("POB_TRUST_IDENTITY_HEADERS").ok(), false);
        if trust_identity_headers {
            warn!("🚨️ Identity headers are trusted. Make sure that a proxy strips X-Authenticated-* from client requests.");
        }
        let gateway = GatewayConfig::new_from_env_or_default();
        Self {
            host,
            port,
            database_url,
            app_base_url,
            currency,
            buyer_language,
            signature_header,
            use_x_forwarded_for,
            use_forwarded,
            trust_identity_headers,
            gateway,
        }
    }

    pub fn order_flow_settings(&self) -> OrderFlowSettings {
        OrderFlowSettings {
            app_base_url: self.app_base_url.clone(),
            currency: self.currency.clone(),
            buyer_language: self.buyer_language.clone(),
            merchant_pos_id: self.gateway.merchant_pos_id.clone(),
        }
    }
}

//-------------------------------------------------  ProxyConfig  ------------------------------------------------------
/// The subset of the configuration that request handlers need. It carries no secrets.
#[derive(Clone, Debug)]
pub struct ProxyConfig {
    pub use_x_forwarded_for: bool,
    pub use_forwarded: bool,
    pub signature_header: String,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self { use_x_forwarded_for: false, use_forwarded: false, signature_header: DEFAULT_SIGNATURE_HEADER.into() }
    }
}

impl ProxyConfig {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            use_x_forwarded_for: config.use_x_forwarded_for,
            use_forwarded: config.use_forwarded,
            signature_header: config.signature_header.clone(),
        }
    }
}
