use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use gateway_client::GatewayOrderStatus;
use log::*;
use pob_common::MinorUnits;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;
use uuid::Uuid;

//--------------------------------------   OrderStatusType     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatusType {
    /// The order has been created locally and is waiting on the gateway.
    Pending,
    /// The gateway has the order and the buyer is somewhere in the payment flow.
    Processing,
    /// The payment has been captured. Terminal.
    Completed,
    /// The gateway cancelled the order. Terminal.
    Canceled,
    /// The gateway refused the order, could not be reached, or reported a status we do not recognise.
    Failed,
}

impl OrderStatusType {
    /// Terminal orders never change status again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Canceled)
    }

    /// The local status that a gateway status maps to, or `None` if the order must be left as it is.
    pub fn transition_for(&self, gateway_status: &GatewayOrderStatus) -> Option<Self> {
        if self.is_terminal() {
            return None;
        }
        let next = match gateway_status {
            GatewayOrderStatus::Completed => Self::Completed,
            GatewayOrderStatus::Canceled => Self::Canceled,
            GatewayOrderStatus::Pending | GatewayOrderStatus::WaitingForConfirmation => Self::Processing,
            GatewayOrderStatus::Other(_) | GatewayOrderStatus::Missing => Self::Failed,
        };
        Some(next)
    }
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatusType::Pending => write!(f, "PENDING"),
            OrderStatusType::Processing => write!(f, "PROCESSING"),
            OrderStatusType::Completed => write!(f, "COMPLETED"),
            OrderStatusType::Canceled => write!(f, "CANCELED"),
            OrderStatusType::Failed => write!(f, "FAILED"),
        }
    }
}

impl From<String> for OrderStatusType {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid order status: {value}. But this conversion cannot fail. Defaulting to FAILED");
            OrderStatusType::Failed
        })
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid order status: {0}")]
pub struct ConversionError(String);

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "PROCESSING" => Ok(Self::Processing),
            "COMPLETED" => Ok(Self::Completed),
            "CANCELED" => Ok(Self::Canceled),
            "FAILED" => Ok(Self::Failed),
            s => Err(ConversionError(s.to_string())),
        }
    }
}

//--------------------------------------        OrderId        ---------------------------------------------------------
/// The internal, immutable identifier of a payment order. Always a UUID v4 string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct OrderId(pub String);

impl OrderId {
    pub fn random() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for OrderId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for OrderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

//--------------------------------------     PaymentOrder      ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct PaymentOrder {
    pub id: OrderId,
    /// The correlation key sent to the gateway as `extOrderId`.
    pub ext_order_id: String,
    /// Assigned by the gateway. Once set, it never changes.
    pub gateway_order_id: Option<String>,
    pub status: OrderStatusType,
    pub amount: MinorUnits,
    pub currency: String,
    pub description: String,
    pub buyer_email: String,
    pub buyer_first_name: String,
    pub buyer_last_name: String,
    pub redirect_uri: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------    NewPaymentOrder    ---------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewPaymentOrder {
    pub id: OrderId,
    pub ext_order_id: String,
    pub amount: MinorUnits,
    pub currency: String,
    pub description: String,
    pub buyer: BuyerSnapshot,
    pub created_at: DateTime<Utc>,
}

impl NewPaymentOrder {
    /// A new order with a fresh internal id. The external correlation key is the internal id.
    pub fn new(amount: MinorUnits, currency: &str, description: &str, buyer: BuyerSnapshot) -> Self {
        let id = OrderId::random();
        Self {
            ext_order_id: id.as_str().to_string(),
            id,
            amount,
            currency: currency.to_string(),
            description: description.to_string(),
            buyer,
            created_at: Utc::now(),
        }
    }
}

//--------------------------------------     BuyerSnapshot     ---------------------------------------------------------
/// The buyer's identity, copied onto the order when it is created.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuyerSnapshot {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

//--------------------------------------       Principal       ---------------------------------------------------------
/// An authenticated user, as handed to us by whatever identity layer sits in front of the engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub email: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
}

impl Principal {
    pub fn new<S: Into<String>>(email: S) -> Self {
        Self { email: email.into(), ..Default::default() }
    }

    pub fn with_names(mut self, first_name: &str, last_name: &str) -> Self {
        self.first_name = Some(first_name.to_string());
        self.last_name = Some(last_name.to_string());
        self
    }

    pub fn with_display_name(mut self, display_name: &str) -> Self {
        self.display_name = Some(display_name.to_string());
        self
    }

    /// Copies the principal's identity for storage on an order.
    ///
    /// If neither a first nor a last name is known, the display name is split at its first space.
    pub fn buyer_snapshot(&self) -> BuyerSnapshot {
        let clean = |s: &Option<String>| s.as_deref().map(str::trim).unwrap_or_default().to_string();
        let mut first_name = clean(&self.first_name);
        let mut last_name = clean(&self.last_name);
        if first_name.is_empty() && last_name.is_empty() {
            let display_name = clean(&self.display_name);
            match display_name.split_once(' ') {
                Some((first, last)) => {
                    first_name = first.trim().to_string();
                    last_name = last.trim().to_string();
                },
                None => first_name = display_name,
            }
        }
        BuyerSnapshot { email: self.email.trim().to_string(), first_name, last_name }
    }
}

//--------------------------------------   EntitlementGrant    ---------------------------------------------------------
/// A record that the buyer of an order has been given what they paid for.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct EntitlementGrant {
    pub order_id: OrderId,
    pub buyer_email: String,
    pub item: String,
    pub granted_at: DateTime<Utc>,
}
