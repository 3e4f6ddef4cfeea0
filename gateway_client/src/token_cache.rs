//! OAuth access token cache.
//!
//! A single slot holding the gateway's client-credentials token. A `TokenCache` is created once and shared (via
//! `Arc`) with every [`crate::GatewayClient`] that needs it.
//!
//! The lock only guards reads and writes of the slot, never the network call. Two callers that find the token expired
//! at the same time will both fetch a new one and the last write wins. The grant is idempotent, so that is harmless.
use std::{sync::RwLock, time::Duration};

use chrono::{DateTime, Utc};
use log::*;
use pob_common::Secret;
use reqwest::Client;

use crate::{
    config::GatewayConfig,
    data_objects::{OAuthTokenResponse, DEFAULT_TOKEN_TTL_SECS},
    helpers::snippet,
    GatewayApiError,
};

#[derive(Clone, Debug)]
pub struct CachedToken {
    token: Secret<String>,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    pub fn new(token: Secret<String>, expires_at: DateTime<Utc>) -> Self {
        Self { token, expires_at }
    }

    pub fn is_fresh_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }
}

pub struct TokenCache {
    oauth_url: String,
    client_id: String,
    client_secret: Secret<String>,
    safety_margin: Duration,
    settings: Result<(), String>,
    client: Client,
    slot: RwLock<Option<CachedToken>>,
}

impl TokenCache {
    pub fn new(config: &GatewayConfig) -> Result<Self, GatewayApiError> {
        let client = Client::builder()
            .timeout(config.oauth_timeout)
            .build()
            .map_err(|e| GatewayApiError::Initialization(e.to_string()))?;
        let settings = config.check_oauth_settings().map_err(|e| e.to_string());
        Ok(Self {
            oauth_url: config.oauth_url.clone(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            safety_margin: config.token_safety_margin,
            settings,
            client,
            slot: RwLock::new(None),
        })
    }

    /// Returns a valid access token, fetching a new one if the cached token has expired.
    ///
    /// `None` means no token could be obtained. The reason has been logged; nothing else is reported to the caller.
    pub async fn access_token(&self) -> Option<Secret<String>> {
        if let Some(token) = self.cached_token() {
            trace!("🔑️ Using cached gateway access token");
            return Some(token);
        }
        let fresh = self.fetch_token().await?;
        let token = fresh.token.clone();
        self.store(fresh);
        Some(token)
    }

    /// Drops the cached token, so that the next call to [`Self::access_token`] fetches a new one.
    pub fn invalidate(&self) {
        let mut slot = self.slot.write().unwrap_or_else(|e| e.into_inner());
        *slot = None;
    }

    /// The cached entry, if any, regardless of whether it is still fresh.
    pub fn cached_entry(&self) -> Option<CachedToken> {
        self.slot.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn cached_token(&self) -> Option<Secret<String>> {
        let now = Utc::now();
        self.cached_entry().filter(|t| t.is_fresh_at(now)).map(|t| t.token)
    }

    fn store(&self, token: CachedToken) {
        let mut slot = self.slot.write().unwrap_or_else(|e| e.into_inner());
        *slot = Some(token);
    }

    async fn fetch_token(&self) -> Option<CachedToken> {
        if let Err(e) = &self.settings {
            error!("🔑️ Cannot request a gateway access token. {e}");
            return None;
        }
        info!("🔑️ Requesting new OAuth token from {}", self.oauth_url);
        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.reveal().as_str()),
        ];
        let response = match self.client.post(&self.oauth_url).form(&form).send().await {
            Ok(r) => r,
            Err(e) => {
                error!("🔑️ OAuth token request failed. {e}");
                return None;
            },
        };
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            error!("🔑️ OAuth token request was refused. HTTP {status}. {}", snippet(&text));
            return None;
        }
        let body = match response.json::<OAuthTokenResponse>().await {
            Ok(b) => b,
            Err(e) => {
                error!("🔑️ Could not parse the OAuth token response. {e}");
                return None;
            },
        };
        let Some(access_token) = body.access_token.filter(|t| !t.is_empty()) else {
            error!("🔑️ 'access_token' was not found in the OAuth response.");
            return None;
        };
        let ttl = body.expires_in.unwrap_or(DEFAULT_TOKEN_TTL_SECS);
        let lifetime = token_lifetime(ttl, self.safety_margin);
        let expires_at = Utc::now() + lifetime;
        info!("🔑️ Fetched and cached a gateway access token. Expires in {}s", lifetime.num_seconds());
        Some(CachedToken::new(Secret::new(access_token), expires_at))
    }
}

/// How long a token is kept: the issued lifetime less the safety margin, but never negative.
fn token_lifetime(ttl_secs: i64, margin: Duration) -> chrono::Duration {
    #[allow(clippy::cast_possible_wrap)]
    let margin = margin.as_secs().min(i64::MAX as u64) as i64;
    chrono::Duration::seconds(ttl_secs.saturating_sub(margin).max(0))
}
