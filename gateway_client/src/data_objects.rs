use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::helpers::order_id_from_location;

//--------------------------------------     OAuth      ---------------------------------------------------------------
/// Lifetime assumed for a token when the gateway does not report one.
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 3600;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OAuthTokenResponse {
    pub access_token: Option<String>,
    pub expires_in: Option<i64>,
}

//--------------------------------------  Order create  ---------------------------------------------------------------
/// The order-create payload, in the gateway's wire format. Amounts and quantities are decimal strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCreateRequest {
    pub notify_url: String,
    pub continue_url: String,
    pub customer_ip: String,
    pub merchant_pos_id: String,
    pub description: String,
    pub currency_code: String,
    pub total_amount: String,
    pub ext_order_id: String,
    pub buyer: Buyer,
    pub products: Vec<Product>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Buyer {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub language: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub name: String,
    pub unit_price: String,
    pub quantity: String,
}

/// What came back over the wire, before any interpretation. The gateway signals success either with a JSON body or
/// with a `302` whose `Location` header is the payment page.
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayResponse {
    Json { status: u16, body: Value },
    Redirect { location: String, body: Option<Value> },
    Unparseable { status: u16, snippet: String },
}

impl GatewayResponse {
    pub fn status(&self) -> u16 {
        match self {
            Self::Json { status, .. } | Self::Unparseable { status, .. } => *status,
            Self::Redirect { .. } => 302,
        }
    }

    /// Resolves the raw response into the single result type that the order flow acts on.
    pub fn normalize(self) -> GatewayOrderResult {
        match self {
            Self::Redirect { location, body } => {
                let gateway_order_id =
                    body.as_ref().and_then(order_id_from_body).or_else(|| order_id_from_location(&location));
                GatewayOrderResult::Created(CreatedOrder { redirect_uri: location, gateway_order_id })
            },
            Self::Json { status, body } if is_accepted_status(status) => match body["redirectUri"].as_str() {
                Some(uri) if !uri.trim().is_empty() => {
                    let gateway_order_id = order_id_from_body(&body).or_else(|| order_id_from_location(uri));
                    GatewayOrderResult::Created(CreatedOrder { redirect_uri: uri.to_string(), gateway_order_id })
                },
                _ => GatewayOrderResult::TransportFailure(TransportFailure::new(
                    TransportErrorKind::MalformedResponse,
                    format!("The gateway accepted the order but did not return a redirect URI. Response: {body}"),
                )),
            },
            Self::Json { status, body } => {
                GatewayOrderResult::Rejected(GatewayRejection { http_status: status, details: body })
            },
            Self::Unparseable { status, snippet } if is_accepted_status(status) => {
                GatewayOrderResult::TransportFailure(TransportFailure::new(
                    TransportErrorKind::MalformedResponse,
                    format!("The gateway returned HTTP {status} with a body that is not JSON: {snippet}"),
                ))
            },
            Self::Unparseable { status, snippet } => {
                GatewayOrderResult::Rejected(GatewayRejection { http_status: status, details: Value::String(snippet) })
            },
        }
    }
}

fn is_accepted_status(status: u16) -> bool {
    matches!(status, 200 | 201 | 302)
}

fn order_id_from_body(body: &Value) -> Option<String> {
    body["orderId"].as_str().filter(|s| !s.is_empty()).map(String::from)
}

/// The normalized outcome of an order-create call. Every variant is plain data, so the caller can decide the next
/// order state from this value alone.
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayOrderResult {
    Created(CreatedOrder),
    Rejected(GatewayRejection),
    TransportFailure(TransportFailure),
    NoToken,
}

impl GatewayOrderResult {
    pub fn is_created(&self) -> bool {
        matches!(self, Self::Created(_))
    }
}

impl Display for GatewayOrderResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Created(o) => {
                write!(f, "Order created ({}). Redirect to {}", o.gateway_order_id.as_deref().unwrap_or("no id"), o.redirect_uri)
            },
            Self::Rejected(r) => write!(f, "Gateway refused the order with HTTP {}: {}", r.http_status, r.details),
            Self::TransportFailure(t) => write!(f, "Gateway could not be reached ({}): {}", t.kind, t.details),
            Self::NoToken => write!(f, "No access token is available for the gateway"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedOrder {
    pub redirect_uri: String,
    pub gateway_order_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GatewayRejection {
    pub http_status: u16,
    /// The gateway's business error, as JSON if it sent JSON, otherwise a string snippet of the body.
    pub details: Value,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportFailure {
    pub kind: TransportErrorKind,
    pub details: String,
}

impl TransportFailure {
    pub fn new<S: Into<String>>(kind: TransportErrorKind, details: S) -> Self {
        Self { kind, details: details.into() }
    }
}

impl From<&reqwest::Error> for TransportFailure {
    fn from(e: &reqwest::Error) -> Self {
        let kind = if e.is_timeout() {
            TransportErrorKind::Timeout
        } else if e.is_connect() {
            TransportErrorKind::Connect
        } else if e.is_decode() || e.is_body() {
            TransportErrorKind::MalformedResponse
        } else {
            TransportErrorKind::Request
        };
        Self { kind, details: e.to_string() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportErrorKind {
    Timeout,
    Connect,
    MalformedResponse,
    Request,
    Configuration,
}

impl Display for TransportErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Timeout => write!(f, "timeout"),
            Self::Connect => write!(f, "connection failed"),
            Self::MalformedResponse => write!(f, "malformed response"),
            Self::Request => write!(f, "request error"),
            Self::Configuration => write!(f, "configuration"),
        }
    }
}

//--------------------------------------  Notifications  --------------------------------------------------------------
/// The envelope of a status notification. Only the fields the order flow needs are typed; the rest are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderNotification {
    pub order: NotifiedOrder,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotifiedOrder {
    #[serde(default)]
    pub order_id: Option<String>,
    #[serde(default)]
    pub ext_order_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub total_amount: Option<String>,
    #[serde(default)]
    pub currency_code: Option<String>,
    #[serde(default)]
    pub buyer: Option<Value>,
}

impl NotifiedOrder {
    pub fn ext_order_id(&self) -> Option<&str> {
        self.ext_order_id.as_deref().filter(|s| !s.is_empty())
    }

    pub fn gateway_order_id(&self) -> Option<&str> {
        self.order_id.as_deref().filter(|s| !s.is_empty())
    }

    /// A notification without a status is treated like any other unrecognised status.
    pub fn gateway_status(&self) -> GatewayOrderStatus {
        match self.status.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            // Infallible
            Some(s) => s.parse().unwrap_or_else(|_| GatewayOrderStatus::Other(s.to_string())),
            None => GatewayOrderStatus::Missing,
        }
    }
}

/// Order status as reported by the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayOrderStatus {
    Completed,
    Canceled,
    Pending,
    WaitingForConfirmation,
    Other(String),
    Missing,
}

impl FromStr for GatewayOrderStatus {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "COMPLETED" => Self::Completed,
            "CANCELED" => Self::Canceled,
            "PENDING" => Self::Pending,
            "WAITING_FOR_CONFIRMATION" => Self::WaitingForConfirmation,
            other => Self::Other(other.to_string()),
        })
    }
}

impl Display for GatewayOrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Completed => write!(f, "COMPLETED"),
            Self::Canceled => write!(f, "CANCELED"),
            Self::Pending => write!(f, "PENDING"),
            Self::WaitingForConfirmation => write!(f, "WAITING_FOR_CONFIRMATION"),
            Self::Other(s) => write!(f, "{s}"),
            Self::Missing => write!(f, "(none)"),
        }
    }
}
