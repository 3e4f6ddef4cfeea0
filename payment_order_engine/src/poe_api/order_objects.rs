use gateway_client::{GatewayRejection, SignatureError, TransportFailure};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::db_types::{OrderId, OrderStatusType, PaymentOrder};

/// Settings the initiation flow needs that are not part of the order itself.
#[derive(Debug, Clone)]
pub struct OrderFlowSettings {
    /// The public base URL of this service. The gateway calls back to `{app_base_url}/payments/notify` and sends the
    /// buyer back to `{app_base_url}/payments/finish`.
    pub app_base_url: String,
    pub currency: String,
    pub buyer_language: String,
    pub merchant_pos_id: String,
}

impl Default for OrderFlowSettings {
    fn default() -> Self {
        Self {
            app_base_url: String::default(),
            currency: pob_common::DEFAULT_CURRENCY_CODE.to_string(),
            buyer_language: "pl".to_string(),
            merchant_pos_id: String::default(),
        }
    }
}

impl OrderFlowSettings {
    fn base(&self) -> &str {
        self.app_base_url.trim().trim_end_matches('/')
    }

    pub fn notify_url(&self) -> String {
        format!("{}/payments/notify", self.base())
    }

    pub fn continue_url(&self, order_id: &OrderId) -> String {
        format!("{}/payments/finish?internal_order_id={}", self.base(), order_id.as_str())
    }
}

//--------------------------------------      Initiation       ---------------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitiationRequest {
    /// Minor currency units.
    pub amount: i64,
    pub description: String,
}

impl InitiationRequest {
    pub fn new<S: Into<String>>(amount: i64, description: S) -> Self {
        Self { amount, description: description.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiationResult {
    pub redirect_uri: String,
    pub internal_order_id: OrderId,
    pub gateway_order_id: Option<String>,
}

/// Why the gateway did not create an order.
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayFailure {
    Rejected(GatewayRejection),
    Transport(TransportFailure),
    NoToken,
}

impl GatewayFailure {
    /// Upstream details, suitable for passing back to the caller.
    pub fn details(&self) -> Value {
        match self {
            Self::Rejected(r) => json!({"httpStatus": r.http_status, "response": r.details}),
            Self::Transport(t) => json!({"kind": t.kind, "message": t.details}),
            Self::NoToken => json!({"message": "Could not authenticate with the payment gateway"}),
        }
    }
}

impl std::fmt::Display for GatewayFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rejected(r) => write!(f, "the gateway refused the order (HTTP {})", r.http_status),
            Self::Transport(t) => write!(f, "the gateway could not be reached ({}): {}", t.kind, t.details),
            Self::NoToken => write!(f, "no access token for the gateway"),
        }
    }
}

//--------------------------------------     Notifications     ---------------------------------------------------------
/// The answer to a status notification. Both variants are normal outcomes; the HTTP layer maps them to 200 and 400.
#[derive(Debug, Clone, PartialEq)]
pub enum Acknowledgement {
    Processed(ProcessedOutcome),
    Rejected(RejectionReason),
}

impl Acknowledgement {
    pub fn is_processed(&self) -> bool {
        matches!(self, Self::Processed(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProcessedOutcome {
    /// The order moved from one status to another (or only had its gateway order id filled in).
    Applied { order_id: OrderId, from: OrderStatusType, to: OrderStatusType },
    /// The notification did not change anything, e.g. a redelivery, or a late notification for a terminal order.
    Unchanged { order_id: OrderId, status: OrderStatusType },
    /// No order matches the notification. Nothing was changed.
    OrderNotFound,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RejectionReason {
    Signature(SignatureError),
    MalformedPayload(String),
}

impl std::fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Signature(e) => write!(f, "{e}"),
            Self::MalformedPayload(s) => write!(f, "Malformed notification. {s}"),
        }
    }
}

//--------------------------------------     Order status      ---------------------------------------------------------
/// What the buyer is told when the gateway sends them back to us.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStatusSummary {
    pub message: String,
    pub is_error: bool,
    pub order: Option<PaymentOrder>,
}
