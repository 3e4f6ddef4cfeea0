use thiserror::Error;

use crate::{
    db_types::{OrderId, OrderStatusType},
    poe_api::order_objects::GatewayFailure,
    traits::PaymentOrderStoreError,
};

#[derive(Debug, Clone, Error)]
pub enum InitiationError {
    #[error("Invalid {field}. {reason}")]
    Validation { field: &'static str, reason: String },
    #[error("The payment service is not configured correctly. {0}")]
    Configuration(String),
    #[error("Failed to initiate payment for order {order_id}: {failure}")]
    Gateway { order_id: OrderId, failure: GatewayFailure },
    #[error("Could not save the payment order. {0}")]
    Persistence(#[from] PaymentOrderStoreError),
    #[error("Order {order_id} was already {status} when the gateway accepted it")]
    OrderClosed { order_id: OrderId, status: OrderStatusType },
}

impl InitiationError {
    pub fn validation<S: Into<String>>(field: &'static str, reason: S) -> Self {
        Self::Validation { field, reason: reason.into() }
    }
}

#[derive(Debug, Clone, Error)]
pub enum NotificationError {
    #[error("Notifications cannot be processed. {0}")]
    Configuration(String),
    #[error("Could not apply the notification. {0}")]
    Persistence(#[from] PaymentOrderStoreError),
    #[error("Order {0} kept changing while the notification was being applied")]
    Contention(OrderId),
}
