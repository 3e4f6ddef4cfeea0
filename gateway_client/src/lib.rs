//! Client side of the card gateway integration.
//!
//! * [`TokenCache`] obtains and caches the OAuth client-credentials token.
//! * [`GatewayClient`] creates orders and normalizes the gateway's answer into a [`GatewayOrderResult`].
//! * [`signature`] verifies the signature on inbound status notifications.
mod api;
mod config;
mod error;
mod token_cache;

pub mod data_objects;
pub mod helpers;
pub mod signature;

pub use api::GatewayClient;
pub use config::{GatewayConfig, DEFAULT_OAUTH_TIMEOUT, DEFAULT_ORDER_TIMEOUT, DEFAULT_TOKEN_SAFETY_MARGIN};
pub use data_objects::{
    Buyer,
    CreatedOrder,
    GatewayOrderResult,
    GatewayOrderStatus,
    GatewayRejection,
    OrderCreateRequest,
    OrderNotification,
    Product,
    TransportErrorKind,
    TransportFailure,
};
pub use error::{GatewayApiError, SignatureError};
pub use token_cache::{CachedToken, TokenCache};
