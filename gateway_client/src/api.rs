use std::sync::Arc;

use log::*;
use reqwest::{header::LOCATION, redirect::Policy, Client, Response, StatusCode};
use serde_json::Value;

use crate::{
    config::GatewayConfig,
    data_objects::{GatewayOrderResult, GatewayResponse, OrderCreateRequest, TransportErrorKind, TransportFailure},
    helpers::snippet,
    GatewayApiError,
    TokenCache,
};

/// Client for the gateway's order API.
///
/// Redirects are never followed: a `302` from the order endpoint *is* the answer, with the payment page in its
/// `Location` header.
#[derive(Clone)]
pub struct GatewayClient {
    order_url: String,
    client: Arc<Client>,
    tokens: Arc<TokenCache>,
}

impl GatewayClient {
    pub fn new(config: &GatewayConfig, tokens: Arc<TokenCache>) -> Result<Self, GatewayApiError> {
        let client = Client::builder()
            .redirect(Policy::none())
            .timeout(config.order_timeout)
            .build()
            .map_err(|e| GatewayApiError::Initialization(e.to_string()))?;
        Ok(Self { order_url: config.order_url.clone(), client: Arc::new(client), tokens })
    }

    pub fn token_cache(&self) -> &TokenCache {
        &self.tokens
    }

    /// Sends exactly one order-create request. Whatever happens is reported in the returned value; this method does
    /// not fail and does not retry.
    pub async fn create_order(&self, order: &OrderCreateRequest) -> GatewayOrderResult {
        let Some(token) = self.tokens.access_token().await else {
            error!("💳️ Cannot create order {} with the gateway. No access token is available.", order.ext_order_id);
            return GatewayOrderResult::NoToken;
        };
        if self.order_url.trim().is_empty() {
            error!("💳️ The gateway order URL is not configured.");
            return GatewayOrderResult::TransportFailure(TransportFailure::new(
                TransportErrorKind::Configuration,
                "The gateway order URL is not set.",
            ));
        }
        debug!("💳️ Creating order {} with the gateway at {}", order.ext_order_id, self.order_url);
        let response = match self.client.post(&self.order_url).bearer_auth(token.reveal()).json(order).send().await {
            Ok(r) => r,
            Err(e) => {
                let failure = TransportFailure::from(&e);
                warn!("💳️ Order {} could not be sent to the gateway ({}). {e}", order.ext_order_id, failure.kind);
                return GatewayOrderResult::TransportFailure(failure);
            },
        };
        if response.status() == StatusCode::UNAUTHORIZED {
            info!("💳️ The gateway did not accept our access token. It will be refreshed on the next call.");
            self.tokens.invalidate();
        }
        let raw = match read_response(response).await {
            Ok(raw) => raw,
            Err(failure) => {
                warn!("💳️ Could not read the gateway response for order {}. {}", order.ext_order_id, failure.details);
                return GatewayOrderResult::TransportFailure(failure);
            },
        };
        info!("💳️ Received response from the gateway for order {}. Status: {}", order.ext_order_id, raw.status());
        let result = raw.normalize();
        if !result.is_created() {
            warn!("💳️ Order {} was not created. {result}", order.ext_order_id);
        }
        result
    }
}

async fn read_response(response: Response) -> Result<GatewayResponse, TransportFailure> {
    let status = response.status().as_u16();
    let location = response.headers().get(LOCATION).and_then(|v| v.to_str().ok()).map(String::from);
    let text = response.text().await.map_err(|e| TransportFailure::from(&e))?;
    let body = serde_json::from_str::<Value>(&text).ok();
    let raw = match (status, location, body) {
        (302, Some(location), body) => GatewayResponse::Redirect { location, body },
        (status, _, Some(body)) => GatewayResponse::Json { status, body },
        (status, _, None) => GatewayResponse::Unparseable { status, snippet: snippet(&text) },
    };
    Ok(raw)
}
