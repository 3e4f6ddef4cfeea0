use thiserror::Error;

use crate::db_types::{NewPaymentOrder, OrderId, OrderStatusType, PaymentOrder};

/// Persistence for payment orders.
///
/// Orders are never deleted. Every status change goes through [`Self::compare_and_set_status`] or
/// [`Self::mark_failed_if_pending`], both of which only write if the order is still in the status the caller last saw.
#[allow(async_fn_in_trait)]
pub trait PaymentOrderStore: Clone {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Stores a brand-new order in `PENDING` status and returns the stored record.
    async fn insert_order(&self, order: NewPaymentOrder) -> Result<PaymentOrder, PaymentOrderStoreError>;

    async fn fetch_order(&self, id: &OrderId) -> Result<Option<PaymentOrder>, PaymentOrderStoreError>;

    async fn fetch_order_by_ext_id(&self, ext_order_id: &str) -> Result<Option<PaymentOrder>, PaymentOrderStoreError>;

    async fn fetch_order_by_gateway_id(
        &self,
        gateway_order_id: &str,
    ) -> Result<Option<PaymentOrder>, PaymentOrderStoreError>;

    /// Records the gateway's answer to a successful order-create call.
    ///
    /// The redirect URI is stored unconditionally. The gateway order id is only stored if the order does not already
    /// have one, so an id learnt from an early notification is never overwritten.
    async fn record_gateway_acceptance(
        &self,
        id: &OrderId,
        gateway_order_id: Option<&str>,
        redirect_uri: &str,
    ) -> Result<PaymentOrder, PaymentOrderStoreError>;

    /// Moves the order to `FAILED`, but only if it is still `PENDING`.
    ///
    /// Returns the updated order, or `None` if the order had already moved on (e.g. a notification overtook the
    /// gateway response).
    async fn mark_failed_if_pending(&self, id: &OrderId) -> Result<Option<PaymentOrder>, PaymentOrderStoreError>;

    /// Atomically sets the order's status to `new_status` if, and only if, it is currently `expected`.
    ///
    /// If `gateway_order_id` is given and the order does not yet have one, it is backfilled in the same write.
    ///
    /// Returns the updated order if the swap happened, or `None` if the order's status was no longer `expected`.
    async fn compare_and_set_status(
        &self,
        id: &OrderId,
        expected: OrderStatusType,
        new_status: OrderStatusType,
        gateway_order_id: Option<&str>,
    ) -> Result<Option<PaymentOrder>, PaymentOrderStoreError>;

    /// All orders placed by the given buyer, newest first.
    async fn orders_for_buyer(&self, email: &str) -> Result<Vec<PaymentOrder>, PaymentOrderStoreError>;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), PaymentOrderStoreError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Error)]
pub enum PaymentOrderStoreError {
    #[error("We have an internal database engine (configuration/uptime etc.) : {0}")]
    DatabaseError(String),
    #[error("The requested order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("Cannot save order. {0}")]
    ConstraintViolation(String),
}

impl From<sqlx::Error> for PaymentOrderStoreError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() || db.is_check_violation() => {
                PaymentOrderStoreError::ConstraintViolation(db.message().to_string())
            },
            _ => PaymentOrderStoreError::DatabaseError(e.to_string()),
        }
    }
}
