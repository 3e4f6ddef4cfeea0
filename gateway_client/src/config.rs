use std::time::Duration;

use log::*;
use pob_common::{parse_seconds, Secret};

use crate::GatewayApiError;

pub const DEFAULT_OAUTH_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_ORDER_TIMEOUT: Duration = Duration::from_secs(15);
pub const DEFAULT_TOKEN_SAFETY_MARGIN: Duration = Duration::from_secs(300);

/// Credentials and endpoints for the card gateway.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// The OAuth endpoint used for the client-credentials grant.
    pub oauth_url: String,
    /// The order-create endpoint.
    pub order_url: String,
    pub client_id: String,
    pub client_secret: Secret<String>,
    /// The merchant point-of-sale id that is sent with every order.
    pub merchant_pos_id: String,
    /// Shared secret used to sign status notifications sent by the gateway.
    pub signature_key: Secret<String>,
    pub oauth_timeout: Duration,
    pub order_timeout: Duration,
    /// Subtracted from the token lifetime reported by the gateway, so that a token is never used right at its expiry.
    pub token_safety_margin: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            oauth_url: String::default(),
            order_url: String::default(),
            client_id: String::default(),
            client_secret: Secret::default(),
            merchant_pos_id: String::default(),
            signature_key: Secret::default(),
            oauth_timeout: DEFAULT_OAUTH_TIMEOUT,
            order_timeout: DEFAULT_ORDER_TIMEOUT,
            token_safety_margin: DEFAULT_TOKEN_SAFETY_MARGIN,
        }
    }
}

impl GatewayConfig {
    pub fn new_from_env_or_default() -> Self {
        let oauth_url = env_or_warn("POB_GATEWAY_OAUTH_URL");
        let order_url = env_or_warn("POB_GATEWAY_ORDER_URL");
        let client_id = env_or_warn("POB_GATEWAY_CLIENT_ID");
        let merchant_pos_id = env_or_warn("POB_GATEWAY_MERCHANT_POS_ID");
        let client_secret = Secret::new(env_or_warn("POB_GATEWAY_CLIENT_SECRET"));
        let signature_key = Secret::new(env_or_warn("POB_GATEWAY_SIGNATURE_KEY"));
        let oauth_timeout = duration_from_env("POB_GATEWAY_OAUTH_TIMEOUT", DEFAULT_OAUTH_TIMEOUT);
        let order_timeout = duration_from_env("POB_GATEWAY_ORDER_TIMEOUT", DEFAULT_ORDER_TIMEOUT);
        let token_safety_margin = duration_from_env("POB_TOKEN_SAFETY_MARGIN", DEFAULT_TOKEN_SAFETY_MARGIN);
        Self {
            oauth_url,
            order_url,
            client_id,
            client_secret,
            merchant_pos_id,
            signature_key,
            oauth_timeout,
            order_timeout,
            token_safety_margin,
        }
    }

    /// Checks that everything needed to obtain an access token has been configured.
    pub fn check_oauth_settings(&self) -> Result<(), GatewayApiError> {
        let mut missing = vec![];
        if self.oauth_url.trim().is_empty() {
            missing.push("oauth url");
        }
        if self.client_id.trim().is_empty() {
            missing.push("client id");
        }
        if self.client_secret.is_blank() {
            missing.push("client secret");
        }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(GatewayApiError::Configuration(format!("Missing gateway OAuth settings: {}", missing.join(", "))))
        }
    }
}

fn env_or_warn(name: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| {
        warn!("🪛️ {name} is not set. Gateway calls that need it will fail.");
        String::default()
    })
}

fn duration_from_env(name: &str, default: Duration) -> Duration {
    match std::env::var(name) {
        Ok(s) => parse_seconds(&s).unwrap_or_else(|| {
            warn!("🪛️ {s} is not a valid number of seconds for {name}. Using {}s instead.", default.as_secs());
            default
        }),
        Err(_) => {
            debug!("🪛️ {name} is not set. Using the default of {}s.", default.as_secs());
            default
        },
    }
}
